use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::types::error::{DatabaseError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Create,
    Table,
    Drop,
    And,
    Or,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    Int,
    Text,
}

impl Keyword {
    /// Keywords are matched case-insensitively; anything else is an
    /// identifier.
    fn from_word(word: &str) -> Option<Self> {
        let keyword = match word.to_ascii_uppercase().as_str() {
            "SELECT" => Keyword::Select,
            "FROM" => Keyword::From,
            "WHERE" => Keyword::Where,
            "INSERT" => Keyword::Insert,
            "INTO" => Keyword::Into,
            "VALUES" => Keyword::Values,
            "UPDATE" => Keyword::Update,
            "SET" => Keyword::Set,
            "DELETE" => Keyword::Delete,
            "CREATE" => Keyword::Create,
            "TABLE" => Keyword::Table,
            "DROP" => Keyword::Drop,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "ORDER" => Keyword::Order,
            "BY" => Keyword::By,
            "ASC" => Keyword::Asc,
            "DESC" => Keyword::Desc,
            "LIMIT" => Keyword::Limit,
            "INT" => Keyword::Int,
            "TEXT" => Keyword::Text,
            _ => return None,
        };
        Some(keyword)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::Insert => "INSERT",
            Keyword::Into => "INTO",
            Keyword::Values => "VALUES",
            Keyword::Update => "UPDATE",
            Keyword::Set => "SET",
            Keyword::Delete => "DELETE",
            Keyword::Create => "CREATE",
            Keyword::Table => "TABLE",
            Keyword::Drop => "DROP",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Order => "ORDER",
            Keyword::By => "BY",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::Limit => "LIMIT",
            Keyword::Int => "INT",
            Keyword::Text => "TEXT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Eq,
    Neq,
    Lt,
    Gt,
    Le,
    Ge,
    LParen,
    RParen,
    Comma,
    Star,
    Semicolon,
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Symbol::Eq => "=",
            Symbol::Neq => "!=",
            Symbol::Lt => "<",
            Symbol::Gt => ">",
            Symbol::Le => "<=",
            Symbol::Ge => ">=",
            Symbol::LParen => "(",
            Symbol::RParen => ")",
            Symbol::Comma => ",",
            Symbol::Star => "*",
            Symbol::Semicolon => ";",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    Ident(String),
    Number(i64),
    String(String),
    Symbol(Symbol),
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(kw) => write!(f, "{}", kw),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Number(n) => write!(f, "{}", n),
            Token::String(s) => write!(f, "'{}'", s),
            Token::Symbol(sym) => write!(f, "{}", sym),
            Token::Eof => f.write_str("end of input"),
        }
    }
}

/// Turn a SQL string into tokens, ending with `Token::Eof`.
///
/// Whitespace is skipped; `--` comments run to end of line; `''` inside a
/// string literal escapes a single quote.
pub fn tokenize(sql: &str) -> Result<Vec<Token>> {
    Lexer::new(sql).tokenize()
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(sql: &'a str) -> Self {
        Self {
            chars: sql.char_indices().peekable(),
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(&(pos, ch)) = self.chars.peek() {
            if ch.is_whitespace() {
                self.chars.next();
            } else if ch == '-' {
                // Only `--` comments; a lone `-` is not part of the dialect.
                self.chars.next();
                match self.chars.peek() {
                    Some(&(_, '-')) => self.skip_line_comment(),
                    _ => {
                        return Err(DatabaseError::Lex {
                            pos,
                            details: "unexpected character '-'".to_string(),
                        })
                    }
                }
            } else if ch == '\'' {
                self.chars.next();
                tokens.push(self.read_string(pos)?);
            } else if ch.is_ascii_digit() {
                tokens.push(self.read_number(pos)?);
            } else if ch.is_ascii_alphabetic() || ch == '_' {
                tokens.push(self.read_word());
            } else {
                tokens.push(self.read_symbol(pos, ch)?);
            }
        }
        tokens.push(Token::Eof);
        Ok(tokens)
    }

    fn skip_line_comment(&mut self) {
        for (_, ch) in self.chars.by_ref() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn read_string(&mut self, start: usize) -> Result<Token> {
        let mut buf = String::new();
        loop {
            match self.chars.next() {
                Some((_, '\'')) => {
                    // `''` is an escaped quote; anything else ends the literal.
                    if let Some(&(_, '\'')) = self.chars.peek() {
                        self.chars.next();
                        buf.push('\'');
                    } else {
                        return Ok(Token::String(buf));
                    }
                }
                Some((_, ch)) => buf.push(ch),
                None => {
                    return Err(DatabaseError::Lex {
                        pos: start,
                        details: "unterminated string literal".to_string(),
                    })
                }
            }
        }
    }

    fn read_number(&mut self, start: usize) -> Result<Token> {
        let mut digits = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        digits
            .parse::<i64>()
            .map(Token::Number)
            .map_err(|_| DatabaseError::Lex {
                pos: start,
                details: format!("integer literal out of range: {}", digits),
            })
    }

    fn read_word(&mut self) -> Token {
        let mut word = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                word.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }
        match Keyword::from_word(&word) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Ident(word),
        }
    }

    fn read_symbol(&mut self, pos: usize, ch: char) -> Result<Token> {
        self.chars.next();
        let symbol = match ch {
            '(' => Symbol::LParen,
            ')' => Symbol::RParen,
            ',' => Symbol::Comma,
            '*' => Symbol::Star,
            ';' => Symbol::Semicolon,
            '=' => Symbol::Eq,
            '!' => match self.chars.peek() {
                Some(&(_, '=')) => {
                    self.chars.next();
                    Symbol::Neq
                }
                _ => {
                    return Err(DatabaseError::Lex {
                        pos,
                        details: "expected '=' after '!'".to_string(),
                    })
                }
            },
            '<' => match self.chars.peek() {
                Some(&(_, '=')) => {
                    self.chars.next();
                    Symbol::Le
                }
                Some(&(_, '>')) => {
                    self.chars.next();
                    Symbol::Neq
                }
                _ => Symbol::Lt,
            },
            '>' => match self.chars.peek() {
                Some(&(_, '=')) => {
                    self.chars.next();
                    Symbol::Ge
                }
                _ => Symbol::Gt,
            },
            _ => {
                return Err(DatabaseError::Lex {
                    pos,
                    details: format!("unexpected character {:?}", ch),
                })
            }
        };
        Ok(Token::Symbol(symbol))
    }
}
