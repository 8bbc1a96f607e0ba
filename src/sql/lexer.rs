//! SQL lexer for tokenizing `SHOW CREATE TABLE` output.

use std::iter::Peekable;
use std::ops::Range;
use std::str::CharIndices;

/// Keywords the DDL patterns look for. Anything else is a [`Token::Word`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Create,
    Or,
    Replace,
    Temporary,
    Table,
    If,
    Not,
    Exists,
    Null,
    Primary,
    Unique,
    Key,
    Index,
    Fulltext,
    Spatial,
    Foreign,
    Constraint,
    References,
    On,
    Delete,
    Update,
    Default,
    Unsigned,
    Signed,
    Zerofill,
    AutoIncrement,
    Character,
    Set,
    Charset,
    Collate,
    Generated,
    Always,
    As,
    Virtual,
    Stored,
    Persistent,
    Comment,
    Check,
    Invisible,
    Cascade,
    Restrict,
    No,
    Action,
    Asc,
    Desc,
}

impl Keyword {
    fn from_word(s: &str) -> Option<Self> {
        let kw = match s.to_uppercase().as_str() {
            "CREATE" => Self::Create,
            "OR" => Self::Or,
            "REPLACE" => Self::Replace,
            "TEMPORARY" => Self::Temporary,
            "TABLE" => Self::Table,
            "IF" => Self::If,
            "NOT" => Self::Not,
            "EXISTS" => Self::Exists,
            "NULL" => Self::Null,
            "PRIMARY" => Self::Primary,
            "UNIQUE" => Self::Unique,
            "KEY" => Self::Key,
            "INDEX" => Self::Index,
            "FULLTEXT" => Self::Fulltext,
            "SPATIAL" => Self::Spatial,
            "FOREIGN" => Self::Foreign,
            "CONSTRAINT" => Self::Constraint,
            "REFERENCES" => Self::References,
            "ON" => Self::On,
            "DELETE" => Self::Delete,
            "UPDATE" => Self::Update,
            "DEFAULT" => Self::Default,
            "UNSIGNED" => Self::Unsigned,
            "SIGNED" => Self::Signed,
            "ZEROFILL" => Self::Zerofill,
            "AUTO_INCREMENT" => Self::AutoIncrement,
            "CHARACTER" => Self::Character,
            "SET" => Self::Set,
            "CHARSET" => Self::Charset,
            "COLLATE" => Self::Collate,
            "GENERATED" => Self::Generated,
            "ALWAYS" => Self::Always,
            "AS" => Self::As,
            "VIRTUAL" => Self::Virtual,
            "STORED" => Self::Stored,
            "PERSISTENT" => Self::Persistent,
            "COMMENT" => Self::Comment,
            "CHECK" => Self::Check,
            "INVISIBLE" => Self::Invisible,
            "CASCADE" => Self::Cascade,
            "RESTRICT" => Self::Restrict,
            "NO" => Self::No,
            "ACTION" => Self::Action,
            "ASC" => Self::Asc,
            "DESC" => Self::Desc,
            _ => return None,
        };
        Some(kw)
    }
}

/// SQL token types.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    /// Unquoted word that is not a known keyword (type names, functions, engines).
    Word(String),
    /// Backtick or double-quote delimited identifier, unescaped.
    Ident(String),
    Str(String),
    Num(String),

    LParen,
    RParen,
    Comma,
    Semicolon,
    Dot,
    Eq,
    /// Any other punctuation (`+`, `>`, `*`, ...).
    Symbol(char),

    Eof,
}

impl Token {
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self, Token::Keyword(k) if *k == kw)
    }
}

/// A token with its byte range in the lexed input.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Range<usize>,
}

/// SQL lexer. Never fails: unterminated quotes run to end of input.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    current: Option<(usize, char)>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut chars = input.char_indices().peekable();
        let current = chars.next();
        Self {
            input,
            chars,
            current,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.current.map(|(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.current.map_or(self.input.len(), |(i, _)| i)
    }

    fn advance(&mut self) {
        self.current = self.chars.next();
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) {
        self.advance(); // skip /
        self.advance(); // skip *
        while let Some(c) = self.current_char() {
            self.advance();
            if c == '*' && self.current_char() == Some('/') {
                self.advance();
                break;
            }
        }
    }

    fn read_word(&mut self) -> &'a str {
        let start = self.offset();
        while let Some(c) = self.current_char() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.advance();
            } else {
                break;
            }
        }
        let input = self.input;
        &input[start..self.offset()]
    }

    /// Reads a delimited run, collapsing doubled delimiters. Backslash escapes
    /// apply only to string literals.
    fn read_quoted(&mut self, quote: char, backslash_escapes: bool) -> String {
        self.advance(); // skip opening quote
        let mut s = String::new();
        while let Some(c) = self.current_char() {
            if c == quote {
                if self.peek() == Some(quote) {
                    s.push(c);
                    self.advance();
                    self.advance();
                } else {
                    self.advance(); // skip closing quote
                    break;
                }
            } else if c == '\\' && backslash_escapes {
                self.advance();
                if let Some(escaped) = self.current_char() {
                    match escaped {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        'r' => s.push('\r'),
                        '0' => s.push('\0'),
                        _ => s.push(escaped),
                    }
                    self.advance();
                }
            } else {
                s.push(c);
                self.advance();
            }
        }
        s
    }

    fn read_number(&mut self) -> String {
        let start = self.offset();
        if self.current_char() == Some('-') {
            self.advance();
        }
        let mut has_dot = false;
        while let Some(c) = self.current_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !has_dot {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }
        self.input[start..self.offset()].to_string()
    }

    pub fn next_token(&mut self) -> Spanned {
        loop {
            self.skip_whitespace();
            let start = self.offset();

            let token = match self.current_char() {
                None => Token::Eof,

                Some('-') if self.peek() == Some('-') => {
                    self.skip_line_comment();
                    continue;
                }
                Some('#') => {
                    self.skip_line_comment();
                    continue;
                }
                Some('/') if self.peek() == Some('*') => {
                    self.skip_block_comment();
                    continue;
                }
                Some('-') if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                    Token::Num(self.read_number())
                }

                Some('`') => Token::Ident(self.read_quoted('`', false)),
                Some('"') => Token::Ident(self.read_quoted('"', false)),
                Some('\'') => Token::Str(self.read_quoted('\'', true)),

                Some(c) if c.is_ascii_digit() => Token::Num(self.read_number()),
                Some(c) if c.is_alphabetic() || c == '_' => {
                    let word = self.read_word();
                    match Keyword::from_word(word) {
                        Some(kw) => Token::Keyword(kw),
                        None => Token::Word(word.to_string()),
                    }
                }

                Some(c) => {
                    self.advance();
                    match c {
                        '(' => Token::LParen,
                        ')' => Token::RParen,
                        ',' => Token::Comma,
                        ';' => Token::Semicolon,
                        '.' => Token::Dot,
                        '=' => Token::Eq,
                        other => Token::Symbol(other),
                    }
                }
            };

            return Spanned {
                token,
                span: start..self.offset(),
            };
        }
    }

    /// Collect all tokens, ending with [`Token::Eof`].
    pub fn tokenize(&mut self) -> Vec<Spanned> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token();
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }
        tokens
    }
}
