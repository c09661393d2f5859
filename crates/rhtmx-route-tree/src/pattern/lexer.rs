/// Lexer for route pattern strings
///
/// Splits a pattern like `/users/:id(\d+)?` into a flat token stream.
/// Pure function: same input → same tokens, no side effects.

use crate::error::PatternSyntaxError;

/// Kind of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LexKind {
    /// `{`
    Open,
    /// `}`
    Close,
    /// Body of a `( … )` group, without the parentheses
    Pattern,
    /// Parameter name following `:`
    Name,
    /// Any plain character
    Char,
    /// Character following `\`
    EscapedChar,
    /// `?`, `*` or `+`
    Modifier,
    /// End of input
    End,
}

impl LexKind {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            LexKind::Open => "OPEN",
            LexKind::Close => "CLOSE",
            LexKind::Pattern => "PATTERN",
            LexKind::Name => "NAME",
            LexKind::Char => "CHAR",
            LexKind::EscapedChar => "ESCAPED_CHAR",
            LexKind::Modifier => "MODIFIER",
            LexKind::End => "END",
        }
    }
}

/// A token borrowing its text from the pattern source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LexToken<'a> {
    pub kind: LexKind,
    /// Byte offset in the source
    pub index: usize,
    pub value: &'a str,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenizes a pattern source
///
/// Always terminates the stream with an [`LexKind::End`] token.
pub(crate) fn lex(source: &str) -> Result<Vec<LexToken<'_>>, PatternSyntaxError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let byte_at = |i: usize| chars.get(i).map(|&(b, _)| b).unwrap_or(source.len());
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (index, c) = chars[i];

        match c {
            '*' | '+' | '?' => {
                tokens.push(LexToken {
                    kind: LexKind::Modifier,
                    index,
                    value: &source[index..byte_at(i + 1)],
                });
                i += 1;
            }
            '\\' => {
                if i + 1 >= chars.len() {
                    return Err(PatternSyntaxError::TrailingEscape { index });
                }
                tokens.push(LexToken {
                    kind: LexKind::EscapedChar,
                    index,
                    value: &source[byte_at(i + 1)..byte_at(i + 2)],
                });
                i += 2;
            }
            '{' => {
                tokens.push(LexToken { kind: LexKind::Open, index, value: "{" });
                i += 1;
            }
            '}' => {
                tokens.push(LexToken { kind: LexKind::Close, index, value: "}" });
                i += 1;
            }
            ':' => {
                let mut j = i + 1;
                while j < chars.len() && is_name_char(chars[j].1) {
                    j += 1;
                }
                if j == i + 1 {
                    return Err(PatternSyntaxError::MissingParameterName { index });
                }
                tokens.push(LexToken {
                    kind: LexKind::Name,
                    index,
                    value: &source[byte_at(i + 1)..byte_at(j)],
                });
                i = j;
            }
            '(' => {
                let end = group_end(&chars, i)?;
                tokens.push(LexToken {
                    kind: LexKind::Pattern,
                    index,
                    value: &source[byte_at(i + 1)..byte_at(end)],
                });
                i = end + 1;
            }
            _ => {
                tokens.push(LexToken {
                    kind: LexKind::Char,
                    index,
                    value: &source[index..byte_at(i + 1)],
                });
                i += 1;
            }
        }
    }

    tokens.push(LexToken {
        kind: LexKind::End,
        index: source.len(),
        value: "",
    });

    Ok(tokens)
}

/// Finds the char position of the `)` closing the group opened at `open`
///
/// Nested groups must be non-capturing (`(?:…)`, `(?i)` and friends) so the
/// number of parameters stays equal to the number of capture groups.
fn group_end(chars: &[(usize, char)], open: usize) -> Result<usize, PatternSyntaxError> {
    let index = chars[open].0;
    let mut depth = 1;
    let mut j = open + 1;

    if let Some(&(at, '?')) = chars.get(j) {
        return Err(PatternSyntaxError::GroupStartsWithQuestion { index: at });
    }

    while j < chars.len() {
        match chars[j].1 {
            '\\' => {
                j += 2;
                continue;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            '(' => {
                depth += 1;
                if !matches!(chars.get(j + 1), Some((_, '?'))) {
                    return Err(PatternSyntaxError::CapturingGroup { index: chars[j].0 });
                }
            }
            _ => {}
        }
        j += 1;
    }

    if depth != 0 || j >= chars.len() {
        return Err(PatternSyntaxError::UnbalancedGroup { index });
    }
    if j == open + 1 {
        return Err(PatternSyntaxError::EmptyGroup { index });
    }

    Ok(j)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<LexKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_lex_named_parameter() {
        let tokens = lex("/:id").unwrap();
        assert_eq!(tokens[0].kind, LexKind::Char);
        assert_eq!(tokens[1].kind, LexKind::Name);
        assert_eq!(tokens[1].value, "id");
        assert_eq!(tokens[2].kind, LexKind::End);
    }

    #[test]
    fn test_lex_group_and_modifier() {
        assert_eq!(
            kinds("(a|b)?"),
            vec![LexKind::Pattern, LexKind::Modifier, LexKind::End]
        );
        assert_eq!(lex("(a|b)").unwrap()[0].value, "a|b");
    }

    #[test]
    fn test_lex_non_capturing_nested_group() {
        let tokens = lex("((?:a|b)c)").unwrap();
        assert_eq!(tokens[0].value, "(?:a|b)c");
    }

    #[test]
    fn test_lex_escaped_char() {
        let tokens = lex("\\:x").unwrap();
        assert_eq!(tokens[0].kind, LexKind::EscapedChar);
        assert_eq!(tokens[0].value, ":");
        assert_eq!(tokens[1].kind, LexKind::Char);
    }

    #[test]
    fn test_lex_escaped_paren_inside_group() {
        let tokens = lex("(a\\)b)").unwrap();
        assert_eq!(tokens[0].value, "a\\)b");
    }

    #[test]
    fn test_lex_braces() {
        assert_eq!(
            kinds("{/:id}"),
            vec![
                LexKind::Open,
                LexKind::Char,
                LexKind::Name,
                LexKind::Close,
                LexKind::End
            ]
        );
    }

    #[test]
    fn test_lex_errors() {
        assert_eq!(
            lex("/:").unwrap_err(),
            PatternSyntaxError::MissingParameterName { index: 1 }
        );
        assert_eq!(
            lex("/(abc").unwrap_err(),
            PatternSyntaxError::UnbalancedGroup { index: 1 }
        );
        assert_eq!(
            lex("/(a(b))").unwrap_err(),
            PatternSyntaxError::CapturingGroup { index: 3 }
        );
        assert_eq!(
            lex("(?abc)").unwrap_err(),
            PatternSyntaxError::GroupStartsWithQuestion { index: 1 }
        );
        assert_eq!(lex("/()").unwrap_err(), PatternSyntaxError::EmptyGroup { index: 1 });
        assert_eq!(lex("/a\\").unwrap_err(), PatternSyntaxError::TrailingEscape { index: 2 });
    }

    #[test]
    fn test_lex_multibyte_literals() {
        let tokens = lex("/café/:x").unwrap();
        let text: String = tokens
            .iter()
            .take_while(|t| t.kind == LexKind::Char)
            .map(|t| t.value)
            .collect();
        assert_eq!(text, "/café/");
    }
}
