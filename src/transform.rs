//! Flattens a parsed table into editable column rows.

use crate::ast::{ColumnDefinition, GeneratedKind, KeyKind, ParsedTable};
use crate::sql::supports_charset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Collations known for one character set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharsetInfo {
    pub default_collation: String,
    #[serde(default)]
    pub collations: Vec<String>,
}

/// Charset name to its collations.
pub type CharsetCollationMap = BTreeMap<String, CharsetInfo>;

fn default_collation<'a>(charsets: &'a CharsetCollationMap, charset: &str) -> Option<&'a str> {
    charsets
        .get(charset)
        .map(|info| info.default_collation.as_str())
        .filter(|c| !c.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableTable {
    pub options: EditableTableOptions,
    pub rows: Vec<ColumnRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableTableOptions {
    pub schema: String,
    pub name: String,
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub extra: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRow {
    pub name: String,
    /// Type with its size qualifier, e.g. `varchar(255)`.
    pub data_type: String,
    pub primary_key: bool,
    pub not_null: bool,
    pub unsigned: bool,
    /// Name of the unique key the column belongs to.
    pub unique: Option<String>,
    pub zero_fill: bool,
    pub auto_increment: bool,
    pub generated: Option<GeneratedKind>,
    /// Generation expression for generated columns, default value otherwise.
    pub default_or_expression: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
}

/// Resolve one row per column plus the table-level options.
pub fn to_editable_rows(
    schema: &str,
    table: &ParsedTable,
    charsets: &CharsetCollationMap,
) -> EditableTable {
    let charset = table.options.charset.clone();
    let collation = table.options.collation.clone().or_else(|| {
        charset
            .as_deref()
            .and_then(|cs| default_collation(charsets, cs))
            .map(str::to_string)
    });

    let rows = table
        .columns
        .iter()
        .map(|col| column_row(table, col, charset.as_deref(), collation.as_deref(), charsets))
        .collect();

    EditableTable {
        options: EditableTableOptions {
            schema: schema.to_string(),
            name: table.name.clone(),
            engine: table.options.engine.clone(),
            charset,
            collation,
            comment: table.options.comment.clone(),
            extra: table.options.extra.clone(),
        },
        rows,
    }
}

fn column_row(
    table: &ParsedTable,
    col: &ColumnDefinition,
    table_charset: Option<&str>,
    table_collation: Option<&str>,
    charsets: &CharsetCollationMap,
) -> ColumnRow {
    let key_kind = table.key_kind_of_column(&col.name);
    let unique = match key_kind {
        Some(KeyKind::Unique) => table
            .key_name_for_column(KeyKind::Unique, &col.name)
            .map(str::to_string),
        _ => None,
    };

    let (charset, collation) = if supports_charset(&col.data_type) {
        let charset = col.charset.as_deref().or(table_charset);
        let collation = match (&col.collation, &col.charset) {
            (Some(explicit), _) => Some(explicit.as_str()),
            (None, Some(own)) => default_collation(charsets, own),
            (None, None) => table_collation,
        };
        (charset.map(str::to_string), collation.map(str::to_string))
    } else {
        (None, None)
    };

    ColumnRow {
        name: col.name.clone(),
        data_type: col.display_type(),
        primary_key: key_kind == Some(KeyKind::Primary),
        not_null: col.not_null,
        unsigned: col.unsigned,
        unique,
        zero_fill: col.zero_fill,
        auto_increment: col.auto_increment,
        generated: col.generated,
        default_or_expression: col
            .generated_expression
            .clone()
            .or_else(|| col.default_expression.clone()),
        charset,
        collation,
        comment: col.comment.clone(),
    }
}
