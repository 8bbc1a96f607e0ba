//! Statement parser for `SHOW CREATE TABLE` output.
//!
//! Parsing degrades instead of failing: a statement that is not a
//! `CREATE TABLE` yields an unnamed table, and definition lines that are
//! neither columns nor keys are kept verbatim in [`ParsedTable::unparsed`].

use super::lexer::{Keyword, Token};
use super::tokenizer::{definition_lines, match_create_table, Cursor, TableOptionPairs};
use crate::ast::{
    ColumnDefinition, ForeignReference, GeneratedKind, IndexColumn, IndexOrder, KeyDefinition,
    KeyKind, ParsedTable, ReferentialAction, TableOptions,
};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Parse one `CREATE TABLE` statement.
pub fn parse(ddl: &str) -> ParsedTable {
    let Some(skeleton) = match_create_table(ddl) else {
        #[cfg(feature = "tracing")]
        debug!(len = ddl.len(), "statement is not a CREATE TABLE");
        return ParsedTable::default();
    };

    let mut table = ParsedTable {
        name: skeleton.name,
        options: parse_table_options(skeleton.options),
        ..Default::default()
    };

    for line in definition_lines(skeleton.definitions) {
        match parse_definition(line) {
            Some(Definition::Column(column, inline_keys)) => {
                table.columns.push(column);
                for key in inline_keys {
                    table.push_key(key);
                }
            }
            Some(Definition::Key(key)) => table.push_key(key),
            None => {
                #[cfg(feature = "tracing")]
                debug!(table = %table.name, line, "keeping unrecognized definition");
                table.unparsed.push(line.to_string());
            }
        }
    }

    table
}

/// Parse the trailing `key=value` options of a table.
pub fn parse_table_options(options: &str) -> TableOptions {
    let mut opts = TableOptions::default();
    for (key, value) in TableOptionPairs::new(options) {
        opts.insert(normalize_option_key(&key), value);
    }
    opts
}

fn normalize_option_key(key: &str) -> String {
    let joined = key
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let key = joined.strip_prefix("default ").unwrap_or(&joined);
    match key {
        "charset" | "character set" => "charset".to_string(),
        "collate" => "collation".to_string(),
        other => other.to_string(),
    }
}

enum Definition {
    /// A column plus keys declared inline on it.
    Column(ColumnDefinition, Vec<KeyDefinition>),
    Key(KeyDefinition),
}

fn parse_definition(line: &str) -> Option<Definition> {
    let mut cur = Cursor::new(line);
    match cur.peek() {
        Token::Ident(_) => {
            parse_column(&mut cur).map(|(column, keys)| Definition::Column(column, keys))
        }
        _ => parse_key(&mut cur).map(Definition::Key),
    }
}

/// Parse a column definition line.
pub fn parse_column_definition(line: &str) -> Option<ColumnDefinition> {
    parse_column(&mut Cursor::new(line)).map(|(column, _)| column)
}

/// Parse a key definition line.
pub fn parse_key_definition(line: &str) -> Option<KeyDefinition> {
    parse_key(&mut Cursor::new(line))
}

fn parse_column(cur: &mut Cursor<'_>) -> Option<(ColumnDefinition, Vec<KeyDefinition>)> {
    let name = cur.eat_ident().filter(|n| !n.is_empty())?;
    let data_type = cur.eat_word()?.to_string();

    let mut column = ColumnDefinition {
        name,
        data_type,
        ..Default::default()
    };

    if *cur.peek() == Token::LParen {
        let size = cur.eat_group()?;
        column.data_type_size = Some(cur.text(size).to_string());
    }

    let mut inline_keys = Vec::new();

    loop {
        match cur.advance() {
            Token::Eof => break,
            Token::Keyword(Keyword::Unsigned) => column.unsigned = true,
            Token::Keyword(Keyword::Zerofill) => column.zero_fill = true,
            Token::Keyword(Keyword::Character) => {
                if cur.eat(Keyword::Set) {
                    column.charset = cur.eat_word().map(str::to_string);
                }
            }
            Token::Keyword(Keyword::Charset) => {
                column.charset = cur.eat_word().map(str::to_string);
            }
            Token::Keyword(Keyword::Collate) => {
                column.collation = cur.eat_word().map(str::to_string);
            }
            Token::Keyword(Keyword::Not) => {
                if cur.eat(Keyword::Null) {
                    column.not_null = true;
                }
            }
            Token::Keyword(Keyword::Null) => column.not_null = false,
            Token::Keyword(Keyword::AutoIncrement) => column.auto_increment = true,
            Token::Keyword(Keyword::Default) => {
                column.default_expression = expression_until_clause(cur);
            }
            Token::Keyword(Keyword::On) => {
                if cur.eat(Keyword::Update) {
                    column.on_update = expression_until_clause(cur);
                }
            }
            Token::Keyword(Keyword::Generated) => {
                if !cur.eat_all(&[Keyword::Always, Keyword::As]) {
                    return None;
                }
                parse_generated(cur, &mut column)?;
            }
            Token::Keyword(Keyword::As) => parse_generated(cur, &mut column)?,
            Token::Keyword(Keyword::Comment) => column.comment = cur.eat_str(),
            Token::Keyword(Keyword::Invisible) => column.invisible = true,
            Token::Keyword(Keyword::Check) => {
                cur.eat_group();
            }
            Token::Keyword(Keyword::Primary) => {
                cur.eat(Keyword::Key);
                inline_keys.push(inline_key(KeyKind::Primary, "PRIMARY", &column.name));
            }
            Token::Keyword(Keyword::Unique) => {
                cur.eat(Keyword::Key);
                inline_keys.push(inline_key(KeyKind::Unique, &column.name, &column.name));
            }
            Token::Keyword(Keyword::References) => {
                let reference = parse_reference(cur)?;
                if reference.columns.len() != 1 {
                    return None;
                }
                let mut key = inline_key(KeyKind::Foreign, "", &column.name);
                key.reference = Some(reference);
                inline_keys.push(key);
            }
            _ => {}
        }
    }

    if column.generated_expression.is_some() {
        column.default_expression = None;
    }

    Some((column, inline_keys))
}

fn inline_key(kind: KeyKind, name: &str, column: &str) -> KeyDefinition {
    KeyDefinition {
        name: name.to_string(),
        kind,
        columns: vec![IndexColumn::named(column)],
        reference: None,
    }
}

/// `(expr) [VIRTUAL | STORED | PERSISTENT]` or `ROW START | ROW END`, after `AS`.
fn parse_generated(cur: &mut Cursor<'_>, column: &mut ColumnDefinition) -> Option<()> {
    if let Some(kind) = row_period(cur) {
        column.generated = Some(kind);
        return Some(());
    }

    let expr = cur.eat_group()?;
    column.generated_expression = Some(cur.text(expr).to_string());
    column.generated = Some(if cur.eat_any(&[Keyword::Stored, Keyword::Persistent]) {
        GeneratedKind::Stored
    } else {
        cur.eat(Keyword::Virtual);
        GeneratedKind::Virtual
    });
    Some(())
}

fn is_word(token: &Token, word: &str) -> bool {
    matches!(token, Token::Word(w) if w.eq_ignore_ascii_case(word))
}

fn row_period(cur: &mut Cursor<'_>) -> Option<GeneratedKind> {
    if !is_word(cur.peek(), "ROW") {
        return None;
    }
    let kind = if is_word(cur.peek_at(1), "START") {
        GeneratedKind::RowStart
    } else if is_word(cur.peek_at(1), "END") {
        GeneratedKind::RowEnd
    } else {
        return None;
    };
    cur.advance();
    cur.advance();
    Some(kind)
}

/// Raw text of an expression up to the next column attribute keyword.
fn expression_until_clause(cur: &mut Cursor<'_>) -> Option<String> {
    let start = cur.position();
    loop {
        match cur.peek() {
            Token::Eof => break,
            Token::Keyword(kw) if cur.position() > start && is_column_clause(*kw) => break,
            Token::LParen => {
                if cur.eat_group().is_none() {
                    break;
                }
            }
            _ => {
                cur.advance();
            }
        }
    }
    let text = cur.slice(start, cur.position()).trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn is_column_clause(kw: Keyword) -> bool {
    matches!(
        kw,
        Keyword::On
            | Keyword::Comment
            | Keyword::Invisible
            | Keyword::Check
            | Keyword::Collate
            | Keyword::Character
            | Keyword::Charset
            | Keyword::Not
            | Keyword::AutoIncrement
            | Keyword::References
            | Keyword::Generated
            | Keyword::Primary
            | Keyword::Unique
    )
}

fn parse_key(cur: &mut Cursor<'_>) -> Option<KeyDefinition> {
    let constraint_name = if cur.eat(Keyword::Constraint) {
        cur.eat_ident()
    } else {
        None
    };

    let kind = match cur.advance() {
        Token::Keyword(Keyword::Primary) => {
            if !cur.eat(Keyword::Key) {
                return None;
            }
            KeyKind::Primary
        }
        Token::Keyword(Keyword::Foreign) => {
            if !cur.eat(Keyword::Key) {
                return None;
            }
            KeyKind::Foreign
        }
        Token::Keyword(Keyword::Unique) => {
            cur.eat_any(&[Keyword::Key, Keyword::Index]);
            KeyKind::Unique
        }
        Token::Keyword(Keyword::Fulltext) => {
            cur.eat_any(&[Keyword::Key, Keyword::Index]);
            KeyKind::Fulltext
        }
        Token::Keyword(Keyword::Spatial) => {
            cur.eat_any(&[Keyword::Key, Keyword::Index]);
            KeyKind::Spatial
        }
        Token::Keyword(Keyword::Key | Keyword::Index) => KeyKind::Index,
        _ => return None,
    };

    let index_name = cur.eat_ident();
    skip_index_type(cur);
    let columns = parse_index_columns(cur)?;

    let reference = if kind == KeyKind::Foreign {
        if !cur.eat(Keyword::References) {
            return None;
        }
        let reference = parse_reference(cur)?;
        if reference.columns.len() != columns.len() {
            return None;
        }
        Some(reference)
    } else {
        None
    };

    let name = match kind {
        KeyKind::Primary => "PRIMARY".to_string(),
        _ => constraint_name.or(index_name).unwrap_or_default(),
    };

    Some(KeyDefinition {
        name,
        kind,
        columns,
        reference,
    })
}

/// `USING BTREE|HASH|RTREE` may sit between the index name and its columns.
fn skip_index_type(cur: &mut Cursor<'_>) {
    if is_word(cur.peek(), "USING") {
        cur.advance();
        cur.eat_word();
    }
}

/// `(`col`[(len)] [ASC|DESC], ...)`
fn parse_index_columns(cur: &mut Cursor<'_>) -> Option<Vec<IndexColumn>> {
    if !cur.eat_token(&Token::LParen) {
        return None;
    }

    let mut columns = Vec::new();
    loop {
        let mut column = IndexColumn::named(cur.eat_ident()?);

        if cur.eat_token(&Token::LParen) {
            match cur.advance() {
                Token::Num(n) => column.length = n.parse().ok(),
                _ => return None,
            }
            if !cur.eat_token(&Token::RParen) {
                return None;
            }
        }

        if cur.eat(Keyword::Asc) {
            column.order = Some(IndexOrder::Asc);
        } else if cur.eat(Keyword::Desc) {
            column.order = Some(IndexOrder::Desc);
        }

        columns.push(column);

        if cur.eat_token(&Token::Comma) {
            continue;
        }
        if cur.eat_token(&Token::RParen) {
            break;
        }
        return None;
    }

    Some(columns)
}

/// `[`schema`.]`table` (cols) [ON DELETE action] [ON UPDATE action]`, after `REFERENCES`.
fn parse_reference(cur: &mut Cursor<'_>) -> Option<ForeignReference> {
    let first = cur.eat_ident()?;
    let (schema, table) = if cur.eat_token(&Token::Dot) {
        (Some(first), cur.eat_ident()?)
    } else {
        (None, first)
    };

    let columns = parse_index_columns(cur)?;

    let mut reference = ForeignReference {
        schema,
        table,
        columns,
        on_delete: None,
        on_update: None,
    };

    while cur.check(Keyword::On) && starts_action(cur.peek_at(2)) {
        cur.advance();
        match cur.advance() {
            Token::Keyword(Keyword::Delete) => reference.on_delete = Some(parse_action(cur)?),
            Token::Keyword(Keyword::Update) => reference.on_update = Some(parse_action(cur)?),
            _ => return None,
        }
    }

    Some(reference)
}

fn starts_action(token: &Token) -> bool {
    matches!(
        token,
        Token::Keyword(Keyword::Cascade | Keyword::Restrict | Keyword::Set | Keyword::No)
    )
}

fn parse_action(cur: &mut Cursor<'_>) -> Option<ReferentialAction> {
    let action = match cur.advance() {
        Token::Keyword(Keyword::Cascade) => ReferentialAction::Cascade,
        Token::Keyword(Keyword::Restrict) => ReferentialAction::Restrict,
        Token::Keyword(Keyword::Set) => match cur.advance() {
            Token::Keyword(Keyword::Null) => ReferentialAction::SetNull,
            Token::Keyword(Keyword::Default) => ReferentialAction::SetDefault,
            _ => return None,
        },
        Token::Keyword(Keyword::No) => {
            if !cur.eat(Keyword::Action) {
                return None;
            }
            ReferentialAction::NoAction
        }
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS: &str = "CREATE TABLE `orders` (
  `id` int(11) unsigned NOT NULL AUTO_INCREMENT,
  `customer_id` int(11) NOT NULL,
  `note` varchar(255) CHARACTER SET latin1 COLLATE latin1_bin DEFAULT NULL COMMENT 'free, text',
  `total` decimal(10,2) unsigned zerofill DEFAULT 0.00,
  `status` enum('new','paid') NOT NULL DEFAULT 'new',
  `label` varchar(64) GENERATED ALWAYS AS (concat(`status`,' ',`id`)) VIRTUAL,
  `created` timestamp NOT NULL DEFAULT current_timestamp() ON UPDATE current_timestamp(),
  PRIMARY KEY (`id`),
  UNIQUE KEY `uq_note` (`note`(10),`status`),
  KEY `idx_created` (`created` DESC),
  CONSTRAINT `fk_customer` FOREIGN KEY (`customer_id`) REFERENCES `shop`.`customers` (`id`) ON DELETE CASCADE ON UPDATE NO ACTION,
  CONSTRAINT `chk_total` CHECK (`total` >= 0)
) ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_general_ci COMMENT='all orders, a=b'";

    #[test]
    fn test_parse_table_header_and_options() {
        let table = parse(ORDERS);

        assert_eq!(table.name, "orders");
        assert_eq!(table.options.engine.as_deref(), Some("InnoDB"));
        assert_eq!(table.options.charset.as_deref(), Some("utf8mb4"));
        assert_eq!(table.options.collation.as_deref(), Some("utf8mb4_general_ci"));
        assert_eq!(table.options.comment.as_deref(), Some("all orders, a=b"));
        assert_eq!(table.options.get("auto_increment"), Some("42"));
    }

    #[test]
    fn test_parse_columns_in_order() {
        let table = parse(ORDERS);
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(
            names,
            vec!["id", "customer_id", "note", "total", "status", "label", "created"]
        );
    }

    #[test]
    fn test_parse_column_attributes() {
        let table = parse(ORDERS);

        let id = table.column("id").unwrap();
        assert_eq!(id.data_type, "int");
        assert_eq!(id.data_type_size.as_deref(), Some("11"));
        assert!(id.unsigned && id.not_null && id.auto_increment);
        assert!(!id.zero_fill);

        let note = table.column("note").unwrap();
        assert_eq!(note.charset.as_deref(), Some("latin1"));
        assert_eq!(note.collation.as_deref(), Some("latin1_bin"));
        assert_eq!(note.default_expression.as_deref(), Some("NULL"));
        assert_eq!(note.comment.as_deref(), Some("free, text"));
        assert!(!note.not_null);

        let total = table.column("total").unwrap();
        assert_eq!(total.data_type_size.as_deref(), Some("10,2"));
        assert!(total.unsigned && total.zero_fill);
        assert_eq!(total.default_expression.as_deref(), Some("0.00"));

        let status = table.column("status").unwrap();
        assert_eq!(status.data_type_size.as_deref(), Some("'new','paid'"));
        assert_eq!(status.default_expression.as_deref(), Some("'new'"));

        let label = table.column("label").unwrap();
        assert_eq!(
            label.generated_expression.as_deref(),
            Some("concat(`status`,' ',`id`)")
        );
        assert_eq!(label.generated, Some(GeneratedKind::Virtual));
        assert_eq!(label.default_expression, None);

        let created = table.column("created").unwrap();
        assert_eq!(created.default_expression.as_deref(), Some("current_timestamp()"));
        assert_eq!(created.on_update.as_deref(), Some("current_timestamp()"));
    }

    #[test]
    fn test_parse_keys() {
        let table = parse(ORDERS);

        let pk = &table.keys(KeyKind::Primary)[0];
        assert_eq!(pk.name, "PRIMARY");
        assert_eq!(pk.column_names().collect::<Vec<_>>(), vec!["id"]);

        let uq = &table.keys(KeyKind::Unique)[0];
        assert_eq!(uq.name, "uq_note");
        assert_eq!(uq.columns[0].length, Some(10));
        assert_eq!(uq.columns[1].name, "status");

        let idx = &table.keys(KeyKind::Index)[0];
        assert_eq!(idx.columns[0].order, Some(IndexOrder::Desc));

        let fk = &table.foreign_keys()[0];
        assert_eq!(fk.name, "fk_customer");
        let reference = fk.reference.as_ref().unwrap();
        assert_eq!(reference.schema.as_deref(), Some("shop"));
        assert_eq!(reference.table, "customers");
        assert_eq!(reference.columns[0].name, "id");
        assert_eq!(reference.on_delete, Some(ReferentialAction::Cascade));
        assert_eq!(reference.on_update, Some(ReferentialAction::NoAction));
    }

    #[test]
    fn test_unrecognized_line_kept_verbatim() {
        let table = parse(ORDERS);

        assert_eq!(table.unparsed, vec!["CONSTRAINT `chk_total` CHECK (`total` >= 0)"]);
    }

    #[test]
    fn test_unparseable_statement_degrades() {
        let table = parse("SHOW WARNINGS");

        assert!(!table.is_parsed());
        assert!(table.columns.is_empty());
        assert!(table.keys.is_empty());
    }

    #[test]
    fn test_columns_only() {
        let ddl = "CREATE TABLE `t` (\n  `c` int(11) DEFAULT NULL,\n  `b` text,\n  `a` datetime NOT NULL\n) ENGINE=Aria";
        let table = parse(ddl);

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
        assert!(table.keys.is_empty());
        assert!(table.unparsed.is_empty());
    }

    #[test]
    fn test_persistent_generated_column() {
        let col = parse_column_definition("`v` int(11) AS (`a` + 1) PERSISTENT").unwrap();

        assert_eq!(col.generated_expression.as_deref(), Some("`a` + 1"));
        assert_eq!(col.generated, Some(GeneratedKind::Stored));
    }

    #[test]
    fn test_system_versioned_columns() {
        let ddl = "CREATE TABLE `audit` (
  `a` int(11) NOT NULL,
  `row_start` timestamp(6) GENERATED ALWAYS AS ROW START INVISIBLE,
  `row_end` timestamp(6) GENERATED ALWAYS AS ROW END INVISIBLE,
  PERIOD FOR SYSTEM_TIME (`row_start`, `row_end`)
) ENGINE=InnoDB DEFAULT CHARSET=latin1 WITH SYSTEM VERSIONING";
        let table = parse(ddl);

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "row_start", "row_end"]);

        let start = table.column("row_start").unwrap();
        assert_eq!(start.generated, Some(GeneratedKind::RowStart));
        assert_eq!(start.generated_expression, None);
        assert_eq!(start.data_type_size.as_deref(), Some("6"));
        assert!(start.invisible);
        assert_eq!(table.column("row_end").unwrap().generated, Some(GeneratedKind::RowEnd));
        assert_eq!(table.unparsed, vec!["PERIOD FOR SYSTEM_TIME (`row_start`, `row_end`)"]);
    }

    #[test]
    fn test_engine_attributes_and_trailing_clauses() {
        let ddl = "CREATE TABLE `t` (
  `a` int(11) DEFAULT NULL
) ENGINE=InnoDB DEFAULT CHARSET=latin1 `PAGE_COMPRESSED`='ON' `PAGE_COMPRESSION_LEVEL`=3";
        let table = parse(ddl);

        assert_eq!(table.options.charset.as_deref(), Some("latin1"));
        assert_eq!(table.options.get("page_compressed"), Some("ON"));
        assert_eq!(table.options.get("page_compression_level"), Some("3"));

        let versioned = parse_table_options(
            "ENGINE=InnoDB DEFAULT CHARSET=latin1 WITH SYSTEM VERSIONING COMMENT='x'",
        );
        assert_eq!(versioned.comment.as_deref(), Some("x"));
    }

    #[test]
    fn test_inline_reference_becomes_foreign_key() {
        let ddl = "CREATE TABLE `t` (\n  `owner_id` int NOT NULL REFERENCES `users` (`id`) ON DELETE SET NULL\n)";
        let table = parse(ddl);

        assert_eq!(table.columns.len(), 1);
        let fk = &table.foreign_keys()[0];
        assert_eq!(fk.name, "");
        assert_eq!(fk.columns[0].name, "owner_id");
        let reference = fk.reference.as_ref().unwrap();
        assert_eq!(reference.table, "users");
        assert_eq!(reference.on_delete, Some(ReferentialAction::SetNull));
    }

    #[test]
    fn test_foreign_key_arity_mismatch_is_unrecognized() {
        let line = "CONSTRAINT `fk` FOREIGN KEY (`a`,`b`) REFERENCES `p` (`x`)";

        assert!(parse_key_definition(line).is_none());
    }

    #[test]
    fn test_composite_foreign_key() {
        let key = parse_key_definition(
            "CONSTRAINT `fk_pair` FOREIGN KEY (`c1`, `c2`) REFERENCES `parent` (`d1`, `d2`) ON UPDATE SET DEFAULT",
        )
        .unwrap();

        assert_eq!(key.kind, KeyKind::Foreign);
        assert_eq!(key.column_names().collect::<Vec<_>>(), vec!["c1", "c2"]);
        let reference = key.reference.unwrap();
        assert_eq!(reference.schema, None);
        assert_eq!(reference.columns[1].name, "d2");
        assert_eq!(reference.on_update, Some(ReferentialAction::SetDefault));
        assert_eq!(reference.on_delete, None);
    }

    #[test]
    fn test_other_key_kinds() {
        let ft = parse_key_definition("FULLTEXT KEY `ft_body` (`body`)").unwrap();
        assert_eq!(ft.kind, KeyKind::Fulltext);
        assert_eq!(ft.name, "ft_body");

        let sp = parse_key_definition("SPATIAL KEY `sp_geo` (`geo`)").unwrap();
        assert_eq!(sp.kind, KeyKind::Spatial);

        let hashed = parse_key_definition("KEY `k` (`a`) USING HASH").unwrap();
        assert_eq!(hashed.kind, KeyKind::Index);
    }

    #[test]
    fn test_option_key_normalization() {
        let opts =
            parse_table_options("ENGINE=MyISAM DEFAULT CHARACTER SET=latin1 ROW_FORMAT=DYNAMIC");

        assert_eq!(opts.engine.as_deref(), Some("MyISAM"));
        assert_eq!(opts.charset.as_deref(), Some("latin1"));
        assert_eq!(opts.collation, None);
        assert_eq!(opts.extra, vec![("row_format".to_string(), "DYNAMIC".to_string())]);
    }
}
