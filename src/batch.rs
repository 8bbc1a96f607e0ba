//! Aggregation of a batch of fetched `SHOW CREATE TABLE` results.
//!
//! Fetching happens elsewhere. This module builds the combined script to
//! send, and turns per-table outcomes into parsed schemas plus an error list
//! without aborting on partial failure.

use crate::ast::ParsedTable;
use crate::sql::parse;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("Failed to fetch DDL for `{schema}`.`{table}`: {message}")]
    Fetch {
        schema: String,
        table: String,
        message: String,
    },
    #[error("Unparseable DDL for `{schema}`.`{table}`")]
    Unparseable { schema: String, table: String },
}

/// Outcome of fetching one table's DDL.
#[derive(Debug, Clone)]
pub struct FetchedDdl {
    pub schema: String,
    pub table: String,
    pub result: Result<String, String>,
}

/// Parsed tables grouped by schema, schemas in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSchemas {
    schemas: Vec<(String, Vec<ParsedTable>)>,
}

impl ParsedSchemas {
    pub fn push(&mut self, schema: &str, table: ParsedTable) {
        match self.schemas.iter_mut().find(|(name, _)| name == schema) {
            Some((_, tables)) => tables.push(table),
            None => self.schemas.push((schema.to_string(), vec![table])),
        }
    }

    pub fn get(&self, schema: &str) -> Option<&[ParsedTable]> {
        self.schemas
            .iter()
            .find(|(name, _)| name == schema)
            .map(|(_, tables)| tables.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ParsedTable])> {
        self.schemas
            .iter()
            .map(|(name, tables)| (name.as_str(), tables.as_slice()))
    }

    pub fn table_count(&self) -> usize {
        self.schemas.iter().map(|(_, tables)| tables.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.table_count() == 0
    }
}

impl IntoIterator for ParsedSchemas {
    type Item = (String, Vec<ParsedTable>);
    type IntoIter = std::vec::IntoIter<(String, Vec<ParsedTable>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.schemas.into_iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub parsed: ParsedSchemas,
    pub errors: Vec<BatchError>,
}

impl BatchOutcome {
    /// Whether every requested table made it into `parsed`.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse every successfully fetched DDL; collect the rest as errors.
pub fn collect_batch<I>(results: I) -> BatchOutcome
where
    I: IntoIterator<Item = FetchedDdl>,
{
    let mut outcome = BatchOutcome::default();

    for FetchedDdl {
        schema,
        table,
        result,
    } in results
    {
        let ddl = match result {
            Ok(ddl) => ddl,
            Err(message) => {
                outcome.errors.push(BatchError::Fetch {
                    schema,
                    table,
                    message,
                });
                continue;
            }
        };

        let parsed = parse(&ddl);
        if !parsed.is_parsed() {
            #[cfg(feature = "tracing")]
            warn!(%schema, %table, "dropping unparseable DDL");
            outcome.errors.push(BatchError::Unparseable { schema, table });
            continue;
        }
        outcome.parsed.push(&schema, parsed);
    }

    outcome
}

/// Backtick-quote an identifier, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// One `SHOW CREATE TABLE` per table, newline separated.
pub fn show_create_script<'a, I>(tables: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    tables
        .into_iter()
        .map(|(schema, table)| {
            format!(
                "SHOW CREATE TABLE {}.{};",
                quote_identifier(schema),
                quote_identifier(table)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
