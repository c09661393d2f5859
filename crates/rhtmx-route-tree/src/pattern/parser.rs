//! Pattern parsing from lexical tokens into route tokens
//!
//! Pure functional parser: pattern source → `Vec<Token>`.
//! Adjacent literal characters are merged; a `/` or `.` directly in front of
//! a parameter or group becomes that key's prefix.

use super::lexer::{lex, LexKind, LexToken};
use super::{Key, KeyKind, Modifier, Token};
use crate::error::PatternSyntaxError;

/// Pattern used by `:name` parameters without an explicit group
pub(crate) const DEFAULT_PATTERN: &str = "[^/#?]+?";

/// Pattern captured by a bare `*`
pub(crate) const WILDCARD_PATTERN: &str = ".*";

/// Characters that attach to the following key as its prefix
const PREFIXES: [&str; 2] = ["/", "."];

/// Read position over a lexical token stream
struct Cursor<'a> {
    tokens: Vec<LexToken<'a>>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn try_consume(&mut self, kind: LexKind) -> Option<&'a str> {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == kind => {
                self.pos += 1;
                Some(token.value)
            }
            _ => None,
        }
    }

    fn try_consume_modifier(&mut self) -> Modifier {
        self.try_consume(LexKind::Modifier)
            .map(Modifier::from_symbol)
            .unwrap_or_default()
    }

    /// Consumes a `*` standing where a literal character was expected
    fn try_consume_wildcard(&mut self) -> bool {
        match self.tokens.get(self.pos) {
            Some(token) if token.kind == LexKind::Modifier && token.value == "*" => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn must_consume(&mut self, kind: LexKind) -> Result<&'a str, PatternSyntaxError> {
        if let Some(value) = self.try_consume(kind) {
            return Ok(value);
        }

        // The stream always ends with END, so a failed consume has a token to report
        let found = self.tokens[self.pos.min(self.tokens.len() - 1)];
        Err(PatternSyntaxError::UnexpectedToken {
            found: found.kind.describe(),
            index: found.index,
            expected: kind.describe(),
        })
    }

    fn consume_text(&mut self) -> String {
        let mut text = String::new();
        while let Some(value) = self
            .try_consume(LexKind::Char)
            .or_else(|| self.try_consume(LexKind::EscapedChar))
        {
            text.push_str(value);
        }
        text
    }
}

/// Moves accumulated literal text into the token list
fn flush_literal(tokens: &mut Vec<Token>, path: &mut String) {
    if !path.is_empty() {
        tokens.push(Token::Literal(std::mem::take(path)));
    }
}

/// Parses a pattern source into route tokens
///
/// # Examples
///
/// ```
/// use rhtmx_route_tree::pattern::{parse, Token};
///
/// let tokens = parse("/users/:id").unwrap();
/// assert_eq!(tokens[0], Token::Literal("/users".to_string()));
/// assert!(matches!(&tokens[1], Token::Key(key) if key.name == "id" && key.prefix == "/"));
/// ```
pub fn parse(source: &str) -> Result<Vec<Token>, PatternSyntaxError> {
    let mut cursor = Cursor {
        tokens: lex(source)?,
        pos: 0,
    };
    let mut tokens = Vec::new();
    let mut path = String::new();
    let mut positional = 0usize;

    let mut next_positional = |wildcard: bool| {
        let name = positional.to_string();
        positional += 1;
        let kind = if wildcard {
            KeyKind::Wildcard
        } else {
            KeyKind::Positional
        };
        (name, kind)
    };

    while !cursor.is_done() {
        let ch = cursor.try_consume(LexKind::Char);
        let name = cursor.try_consume(LexKind::Name);
        let pattern = cursor.try_consume(LexKind::Pattern);
        let wildcard = name.is_none() && pattern.is_none() && cursor.try_consume_wildcard();

        if name.is_some() || pattern.is_some() || wildcard {
            let mut prefix = ch.unwrap_or("");
            if !prefix.is_empty() && !PREFIXES.contains(&prefix) {
                path.push_str(prefix);
                prefix = "";
            }
            flush_literal(&mut tokens, &mut path);

            let (key_name, kind) = match name {
                Some(name) => (name.to_string(), KeyKind::Named),
                None => next_positional(wildcard),
            };
            let pattern = if wildcard {
                WILDCARD_PATTERN
            } else {
                pattern.unwrap_or(DEFAULT_PATTERN)
            };
            let modifier = if wildcard {
                Modifier::None
            } else {
                cursor.try_consume_modifier()
            };

            tokens.push(Token::Key(Key {
                name: key_name,
                kind,
                prefix: prefix.to_string(),
                suffix: String::new(),
                pattern: pattern.to_string(),
                modifier,
            }));
            continue;
        }

        if let Some(value) = ch.or_else(|| cursor.try_consume(LexKind::EscapedChar)) {
            path.push_str(value);
            continue;
        }

        flush_literal(&mut tokens, &mut path);

        if cursor.try_consume(LexKind::Open).is_some() {
            let prefix = cursor.consume_text();
            let name = cursor.try_consume(LexKind::Name);
            let pattern = cursor.try_consume(LexKind::Pattern);
            let suffix = cursor.consume_text();
            cursor.must_consume(LexKind::Close)?;
            let modifier = cursor.try_consume_modifier();

            let token = match (name, pattern) {
                (None, None) => Token::Group {
                    text: format!("{prefix}{suffix}"),
                    modifier,
                },
                (name, pattern) => {
                    let (key_name, kind) = match name {
                        Some(name) => (name.to_string(), KeyKind::Named),
                        None => next_positional(false),
                    };
                    Token::Key(Key {
                        name: key_name,
                        kind,
                        prefix,
                        suffix,
                        pattern: pattern.unwrap_or(DEFAULT_PATTERN).to_string(),
                        modifier,
                    })
                }
            };
            tokens.push(token);
            continue;
        }

        cursor.must_consume(LexKind::End)?;
    }

    Ok(tokens)
}
