//! `SHOW CREATE TABLE` parsing.

mod lexer;
mod parser;
mod tokenizer;
mod types;

pub use parser::{parse, parse_column_definition, parse_key_definition, parse_table_options};
pub use tokenizer::{definition_lines, match_create_table, split_statements, TableSkeleton};
pub use types::{categorize, supports_charset, TypeCategory};
