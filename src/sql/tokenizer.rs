//! Extraction patterns over the token stream of one DDL string.
//!
//! Every pattern either matches or returns `None`; nothing here fails hard.

use super::lexer::{Keyword, Lexer, Spanned, Token};
use std::ops::Range;

/// Token cursor that can hand back the raw source text behind its tokens.
pub struct Cursor<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Lexer::new(source).tokenize(),
            pos: 0,
        }
    }

    pub fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub fn peek_at(&self, n: usize) -> &Token {
        self.tokens
            .get(self.pos + n)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    pub fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Token at an absolute index, `Eof` past the end.
    pub fn token_at(&self, index: usize) -> &Token {
        self.tokens
            .get(index)
            .map(|s| &s.token)
            .unwrap_or(&Token::Eof)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        *self.peek() == Token::Eof
    }

    pub fn check(&self, kw: Keyword) -> bool {
        self.peek().is_keyword(kw)
    }

    pub fn eat(&mut self, kw: Keyword) -> bool {
        if self.check(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consumes the whole keyword sequence or nothing.
    pub fn eat_all(&mut self, kws: &[Keyword]) -> bool {
        let matched = kws
            .iter()
            .enumerate()
            .all(|(i, kw)| self.peek_at(i).is_keyword(*kw));
        if matched {
            self.pos += kws.len();
        }
        matched
    }

    /// Consumes the first of `kws` that matches.
    pub fn eat_any(&mut self, kws: &[Keyword]) -> bool {
        kws.iter().any(|kw| self.eat(*kw))
    }

    pub fn eat_token(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn eat_ident(&mut self) -> Option<String> {
        match self.peek() {
            Token::Ident(name) => {
                let name = name.clone();
                self.pos += 1;
                Some(name)
            }
            _ => None,
        }
    }

    /// An unquoted word or keyword, as written in the source.
    pub fn eat_word(&mut self) -> Option<&'a str> {
        match self.peek() {
            Token::Word(_) | Token::Keyword(_) => {
                let text = self.slice(self.pos, self.pos + 1);
                self.pos += 1;
                Some(text)
            }
            _ => None,
        }
    }

    pub fn eat_str(&mut self) -> Option<String> {
        match self.peek() {
            Token::Str(s) => {
                let s = s.clone();
                self.pos += 1;
                Some(s)
            }
            _ => None,
        }
    }

    /// Source text covered by tokens `from..to`.
    pub fn slice(&self, from: usize, to: usize) -> &'a str {
        if from >= to || to > self.tokens.len() {
            return "";
        }
        let source = self.source;
        &source[self.tokens[from].span.start..self.tokens[to - 1].span.end]
    }

    /// Byte offset where the current token starts.
    pub fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |s| s.span.start)
    }

    /// At `(`: consumes through the matching `)` and returns the byte range
    /// strictly between them. `None` when not at `(` or unbalanced.
    pub fn eat_group(&mut self) -> Option<Range<usize>> {
        if *self.peek() != Token::LParen {
            return None;
        }
        let start = self.tokens[self.pos].span.end;
        let mut depth = 0usize;
        let mut i = self.pos;
        while let Some(spanned) = self.tokens.get(i) {
            match spanned.token {
                Token::LParen => depth += 1,
                Token::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = i + 1;
                        return Some(start..spanned.span.start);
                    }
                }
                Token::Eof => return None,
                _ => {}
            }
            i += 1;
        }
        None
    }

    /// Trimmed source text of a byte range.
    pub fn text(&self, range: Range<usize>) -> &'a str {
        let source = self.source;
        source[range].trim()
    }
}

/// Header, definitions section and options section of one `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSkeleton<'a> {
    pub schema: Option<String>,
    pub name: String,
    /// Text between the outer parentheses.
    pub definitions: &'a str,
    /// Text after the closing parenthesis, up to `;` or end of input.
    pub options: &'a str,
}

/// Matches `CREATE [OR REPLACE] [TEMPORARY] TABLE [IF NOT EXISTS] name (...) options`.
pub fn match_create_table(ddl: &str) -> Option<TableSkeleton<'_>> {
    let mut cur = Cursor::new(ddl);

    if !cur.eat(Keyword::Create) {
        return None;
    }
    cur.eat_all(&[Keyword::Or, Keyword::Replace]);
    cur.eat(Keyword::Temporary);
    if !cur.eat(Keyword::Table) {
        return None;
    }
    cur.eat_all(&[Keyword::If, Keyword::Not, Keyword::Exists]);

    let first = table_name_part(&mut cur)?;
    let (schema, name) = if cur.eat_token(&Token::Dot) {
        (Some(first), table_name_part(&mut cur)?)
    } else {
        (None, first)
    };
    if name.is_empty() {
        return None;
    }

    let body = cur.eat_group()?;
    let options_start = body.end + 1;
    while !matches!(cur.peek(), Token::Semicolon | Token::Eof) {
        cur.advance();
    }
    let options_end = cur.offset().max(options_start);

    Some(TableSkeleton {
        schema,
        name,
        definitions: &ddl[body],
        options: ddl[options_start..options_end].trim(),
    })
}

fn table_name_part(cur: &mut Cursor<'_>) -> Option<String> {
    match cur.peek() {
        Token::Ident(_) => cur.eat_ident(),
        Token::Word(_) => cur.eat_word().map(str::to_string),
        _ => None,
    }
}

/// Splits a definitions section into one trimmed line per definition.
pub fn definition_lines(definitions: &str) -> impl Iterator<Item = &str> {
    definitions
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_suffix(',').unwrap_or(line).trim_end()
        })
        .filter(|line| !line.is_empty())
}

/// Yields `(key, value)` pairs from a table options section. Fragments that
/// are not pairs, such as `WITH SYSTEM VERSIONING` or a parenthesized
/// partition clause, are skipped. Keys are returned as written, unquoted.
pub struct TableOptionPairs<'a> {
    cursor: Cursor<'a>,
    /// First token not yet claimed by an earlier pair.
    floor: usize,
}

impl<'a> TableOptionPairs<'a> {
    pub fn new(options: &'a str) -> Self {
        Self {
            cursor: Cursor::new(options),
            floor: 0,
        }
    }

    /// Start of the key ending right before the `=` at `eq`. A key is one
    /// quoted identifier or one word, optionally led by `DEFAULT` and with
    /// `CHARACTER SET` taken as a unit.
    fn key_start(&self, eq: usize) -> Option<usize> {
        if eq <= self.floor {
            return None;
        }
        let cur = &self.cursor;
        let mut start = eq - 1;
        match cur.token_at(start) {
            Token::Ident(_) => return Some(start),
            Token::Word(_) | Token::Keyword(_) => {}
            _ => return None,
        }
        if cur.token_at(start).is_keyword(Keyword::Set)
            && start > self.floor
            && cur.token_at(start - 1).is_keyword(Keyword::Character)
        {
            start -= 1;
        }
        if start > self.floor && cur.token_at(start - 1).is_keyword(Keyword::Default) {
            start -= 1;
        }
        Some(start)
    }

    fn value(&mut self) -> Option<String> {
        let cur = &mut self.cursor;
        match cur.peek() {
            Token::Str(_) => cur.eat_str(),
            Token::Ident(_) => cur.eat_ident(),
            Token::Word(_) | Token::Keyword(_) => cur.eat_word().map(str::to_string),
            Token::Num(n) => {
                let n = n.clone();
                cur.advance();
                Some(n)
            }
            _ => None,
        }
    }
}

impl Iterator for TableOptionPairs<'_> {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.cursor.peek() {
                Token::Eof => return None,
                Token::LParen => {
                    if self.cursor.eat_group().is_none() {
                        self.cursor.advance();
                    }
                }
                Token::Eq => {
                    let eq = self.cursor.position();
                    self.cursor.advance();
                    let Some(start) = self.key_start(eq) else {
                        continue;
                    };
                    let Some(value) = self.value() else {
                        continue;
                    };
                    let key = match self.cursor.token_at(start) {
                        Token::Ident(name) => name.clone(),
                        _ => self.cursor.slice(start, eq).to_string(),
                    };
                    self.floor = self.cursor.position();
                    return Some((key, value));
                }
                _ => {
                    self.cursor.advance();
                }
            }
        }
    }
}

/// Splits a script into statements on top-level `;`.
pub fn split_statements(script: &str) -> Vec<&str> {
    let tokens = Lexer::new(script).tokenize();
    let mut statements = Vec::new();
    let mut start: Option<usize> = None;
    for spanned in &tokens {
        match spanned.token {
            Token::Semicolon | Token::Eof => {
                if let Some(start) = start.take() {
                    statements.push(script[start..spanned.span.start].trim());
                }
            }
            _ => {
                start.get_or_insert(spanned.span.start);
            }
        }
    }
    statements
}
