//! Query text compilation.
//!
//! A query is a conjunction of clauses separated by whitespace, optionally
//! joined by the `AND` keyword:
//!
//! ```text
//! *                                   every entry
//! resource_name:"web_server"          exact attribute match
//! @level:error AND provider:*         level match and attribute presence
//! timeout                             case-insensitive substring of @message
//! ```
//!
//! Compilation is the only fallible step. A compiled [`Query`] is an immutable
//! predicate that can be evaluated from any number of threads.

use std::fmt;

use thiserror::Error;

use crate::types::{LogEntry, MESSAGE_FIELD};

/// A compiled query.
///
/// An entry matches when every clause matches. A query with no clauses
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    /// `field:*`
    Present { field: String },
    /// `field:"value"`, exact and case-sensitive
    Equals { field: String, value: String },
    /// Free text or `@message:"value"`; needle is stored lowercased
    MessageContains { needle: String },
}

impl Clause {
    fn matches(&self, entry: &LogEntry) -> bool {
        match self {
            Self::Present { field } => entry.field(field).is_some(),
            Self::Equals { field, value } => entry.field(field).is_some_and(|v| v == *value),
            Self::MessageContains { needle } => {
                entry.message.to_lowercase().contains(needle.as_str())
            }
        }
    }
}

/// A query parse failure with the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {position}")]
pub struct QueryError {
    /// Byte offset into the query text.
    pub position: usize,
    /// What went wrong.
    pub kind: QueryErrorKind,
}

/// Categories of query parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryErrorKind {
    /// A `"` was opened but never closed.
    #[error("unterminated quoted string")]
    UnterminatedQuote,

    /// A clause starts with `:`.
    #[error("empty field name")]
    EmptyField,

    /// Nothing follows `field:`.
    #[error("missing value for field '{0}'")]
    MissingValue(String),

    /// `AND` without a clause on one side.
    #[error("AND must join two clauses")]
    DanglingAnd,

    /// `OR` or `NOT`; only conjunction is supported.
    #[error("unsupported operator {0}, only AND is supported")]
    UnsupportedOperator(String),

    /// `(` or `)`; grouping is not supported.
    #[error("parentheses are not supported")]
    Parenthesis,

    /// A character that cannot follow the preceding clause.
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
}

impl QueryError {
    const fn at(position: usize, kind: QueryErrorKind) -> Self {
        Self { position, kind }
    }
}

impl Query {
    /// A query that matches every entry.
    #[must_use]
    pub const fn match_all() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Compiles query text.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] describing the first syntax problem found.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == "*" {
            return Ok(Self::match_all());
        }
        Parser::new(input).parse()
    }

    /// Returns true if the query has no constraining clause.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluates the query against an entry.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        self.clauses.iter().all(|clause| clause.matches(entry))
    }

    /// Borrows the query as a closure, for use with iterator adapters.
    pub fn as_predicate(&self) -> impl Fn(&LogEntry) -> bool + '_ {
        move |entry| self.matches(entry)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return f.write_str("*");
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            match clause {
                Clause::Present { field } => write!(f, "{field}:*")?,
                Clause::Equals { field, value } => write!(f, "{field}:{value:?}")?,
                Clause::MessageContains { needle } => write!(f, "{MESSAGE_FIELD}:{needle:?}")?,
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

enum Value {
    Wildcard,
    Text(String),
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

const fn is_delimiter(c: char) -> bool {
    matches!(c, '"' | '(' | ')')
}

impl<'a> Parser<'a> {
    const fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self, c: char) {
        self.pos += c.len_utf8();
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.bump(c);
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek().filter(|&c| keep(c)) {
            self.bump(c);
        }
        &self.src[start..self.pos]
    }

    /// The whitespace-delimited word at the cursor, without consuming it.
    fn peek_word(&self) -> &'a str {
        let rest = &self.src[self.pos..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        &rest[..end]
    }

    fn parse(mut self) -> Result<Query, QueryError> {
        let mut clauses = Vec::new();
        let mut seen_clause = false;
        let mut pending_and: Option<usize> = None;

        loop {
            self.skip_whitespace();
            let start = self.pos;
            if start == self.src.len() {
                break;
            }

            match self.peek_word() {
                "AND" => {
                    if !seen_clause || pending_and.is_some() {
                        return Err(QueryError::at(start, QueryErrorKind::DanglingAnd));
                    }
                    pending_and = Some(start);
                    self.pos += "AND".len();
                    continue;
                }
                word @ ("OR" | "NOT") => {
                    return Err(QueryError::at(
                        start,
                        QueryErrorKind::UnsupportedOperator(word.to_string()),
                    ));
                }
                _ => {}
            }

            if let Some(clause) = self.parse_clause()? {
                clauses.push(clause);
            }
            seen_clause = true;
            pending_and = None;

            match self.peek() {
                None => {}
                Some(c) if c.is_whitespace() => {}
                Some('(' | ')') => return Err(QueryError::at(self.pos, QueryErrorKind::Parenthesis)),
                Some(c) => return Err(QueryError::at(self.pos, QueryErrorKind::UnexpectedChar(c))),
            }
        }

        if let Some(position) = pending_and {
            return Err(QueryError::at(position, QueryErrorKind::DanglingAnd));
        }

        Ok(Query { clauses })
    }

    /// Parses one clause. Returns `None` for a bare `*`.
    fn parse_clause(&mut self) -> Result<Option<Clause>, QueryError> {
        let start = self.pos;
        match self.peek() {
            Some('(' | ')') => return Err(QueryError::at(start, QueryErrorKind::Parenthesis)),
            Some('"') => {
                let text = self.parse_quoted()?;
                return Ok(Some(Clause::MessageContains {
                    needle: text.to_lowercase(),
                }));
            }
            _ => {}
        }

        let word = self.take_while(|c| !c.is_whitespace() && c != ':' && !is_delimiter(c));

        if self.peek() != Some(':') {
            return Ok(match word {
                "*" => None,
                _ => Some(Clause::MessageContains {
                    needle: word.to_lowercase(),
                }),
            });
        }

        if word.is_empty() {
            return Err(QueryError::at(start, QueryErrorKind::EmptyField));
        }
        self.bump(':');

        let clause = match self.parse_value(word)? {
            Value::Wildcard => Clause::Present {
                field: word.to_string(),
            },
            Value::Text(value) if word == MESSAGE_FIELD => Clause::MessageContains {
                needle: value.to_lowercase(),
            },
            Value::Text(value) => Clause::Equals {
                field: word.to_string(),
                value,
            },
        };
        Ok(Some(clause))
    }

    fn parse_value(&mut self, field: &str) -> Result<Value, QueryError> {
        match self.peek() {
            None => Err(QueryError::at(self.pos, QueryErrorKind::MissingValue(field.to_string()))),
            Some(c) if c.is_whitespace() => {
                Err(QueryError::at(self.pos, QueryErrorKind::MissingValue(field.to_string())))
            }
            Some('(' | ')') => Err(QueryError::at(self.pos, QueryErrorKind::Parenthesis)),
            Some('"') => self.parse_quoted().map(Value::Text),
            Some(_) => {
                let bare = self.take_while(|c| !c.is_whitespace() && !is_delimiter(c));
                Ok(if bare == "*" {
                    Value::Wildcard
                } else {
                    Value::Text(bare.to_string())
                })
            }
        }
    }

    /// Parses a `"..."` string. `\"` and `\\` are the escapes; a backslash
    /// before any other character keeps that character.
    fn parse_quoted(&mut self) -> Result<String, QueryError> {
        let start = self.pos;
        self.bump('"');
        let mut out = String::new();

        while let Some(c) = self.peek() {
            self.bump(c);
            match c {
                '"' => return Ok(out),
                '\\' => match self.peek() {
                    Some(escaped) => {
                        self.bump(escaped);
                        out.push(escaped);
                    }
                    None => break,
                },
                _ => out.push(c),
            }
        }

        Err(QueryError::at(start, QueryErrorKind::UnterminatedQuote))
    }
}
