//! Structured description of one parsed `CREATE TABLE` statement.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTable {
    /// Empty when the statement did not match the `CREATE TABLE` shape.
    pub name: String,
    pub options: TableOptions,
    pub columns: Vec<ColumnDefinition>,
    pub keys: BTreeMap<KeyKind, Vec<KeyDefinition>>,
    /// Definition lines that matched neither a column nor a key, kept verbatim.
    pub unparsed: Vec<String>,
}

impl ParsedTable {
    pub fn is_parsed(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn keys(&self, kind: KeyKind) -> &[KeyDefinition] {
        self.keys.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn foreign_keys(&self) -> &[KeyDefinition] {
        self.keys(KeyKind::Foreign)
    }

    /// First of primary, unique, plain index whose keys cover `column`.
    pub fn key_kind_of_column(&self, column: &str) -> Option<KeyKind> {
        [KeyKind::Primary, KeyKind::Unique, KeyKind::Index]
            .into_iter()
            .find(|&kind| self.keys(kind).iter().any(|k| k.covers(column)))
    }

    pub fn key_name_for_column(&self, kind: KeyKind, column: &str) -> Option<&str> {
        self.keys(kind)
            .iter()
            .find(|k| k.covers(column))
            .map(|k| k.name.as_str())
    }

    pub(crate) fn push_key(&mut self, key: KeyDefinition) {
        self.keys.entry(key.kind).or_default().push(key);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOptions {
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    /// Remaining `key=value` pairs, lowercased keys, in source order.
    pub extra: Vec<(String, String)>,
}

impl TableOptions {
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "engine" => self.engine.as_deref(),
            "charset" => self.charset.as_deref(),
            "collation" => self.collation.as_deref(),
            "comment" => self.comment.as_deref(),
            _ => self
                .extra
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
        }
    }

    pub(crate) fn insert(&mut self, key: String, value: String) {
        match key.as_str() {
            "engine" => self.engine = Some(value),
            "charset" => self.charset = Some(value),
            "collation" => self.collation = Some(value),
            "comment" => self.comment = Some(value),
            _ => self.extra.push((key, value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: String,
    /// Raw text between the type's parentheses, e.g. `10,2` or `'a','b'`.
    pub data_type_size: Option<String>,
    pub not_null: bool,
    pub unsigned: bool,
    pub zero_fill: bool,
    pub auto_increment: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub generated_expression: Option<String>,
    pub generated: Option<GeneratedKind>,
    pub default_expression: Option<String>,
    pub on_update: Option<String>,
    pub invisible: bool,
    pub comment: Option<String>,
}

impl ColumnDefinition {
    /// Base type plus its size qualifier, e.g. `varchar(255)`.
    pub fn display_type(&self) -> String {
        match &self.data_type_size {
            Some(size) => format!("{}({})", self.data_type, size),
            None => self.data_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GeneratedKind {
    Virtual,
    Stored,
    /// `AS ROW START` of a system-versioned table.
    #[serde(rename = "ROW START")]
    RowStart,
    #[serde(rename = "ROW END")]
    RowEnd,
}

impl fmt::Display for GeneratedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Virtual => f.write_str("VIRTUAL"),
            Self::Stored => f.write_str("STORED"),
            Self::RowStart => f.write_str("ROW START"),
            Self::RowEnd => f.write_str("ROW END"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyKind {
    Primary,
    Unique,
    Foreign,
    Index,
    Fulltext,
    Spatial,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Primary => "PRIMARY KEY",
            Self::Unique => "UNIQUE KEY",
            Self::Foreign => "FOREIGN KEY",
            Self::Index => "KEY",
            Self::Fulltext => "FULLTEXT KEY",
            Self::Spatial => "SPATIAL KEY",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyDefinition {
    pub name: String,
    pub kind: KeyKind,
    pub columns: Vec<IndexColumn>,
    pub reference: Option<ForeignReference>,
}

impl KeyDefinition {
    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c.name == column)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Target side of a foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignReference {
    /// `None` means the schema of the table owning the key.
    pub schema: Option<String>,
    pub table: String,
    /// Positionally paired with the key's own columns.
    pub columns: Vec<IndexColumn>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    pub name: String,
    pub length: Option<u32>,
    pub order: Option<IndexOrder>,
}

impl IndexColumn {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            length: None,
            order: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    #[serde(rename = "SET NULL")]
    SetNull,
    #[serde(rename = "SET DEFAULT")]
    SetDefault,
    #[serde(rename = "NO ACTION")]
    NoAction,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::NoAction => "NO ACTION",
        };
        f.write_str(s)
    }
}
