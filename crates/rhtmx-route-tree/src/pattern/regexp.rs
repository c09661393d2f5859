/// Recognizer construction: route tokens → regular expression
///
/// Every capturing key gets its own named group (`k0`, `k1`, …) so user
/// patterns can freely use non-capturing groups. Two bookkeeping groups
/// frame the match:
///
/// - `route`: the text matched by the tokens themselves
/// - `trail`: an optional trailing delimiter accepted at end of input
///
/// The regex engine has no lookahead, so the segment-boundary check used in
/// prefix mode is expressed as an alternation that may consume the following
/// delimiter; the reported match stops at the end of `route` (plus `trail`).

use regex::{Regex, RegexBuilder};

use super::{CompileOptions, Key, Modifier, Token};
use crate::error::PatternSyntaxError;

/// Path delimiters recognized at segment boundaries
pub(crate) const DELIMITERS: [char; 3] = ['/', '#', '?'];

const DELIMITER_CLASS: &str = "[/#?]";

pub(crate) const ROUTE_GROUP: &str = "route";
pub(crate) const TRAIL_GROUP: &str = "trail";

/// Name of the capture group for the key at `index`
pub(crate) fn key_group(index: usize) -> String {
    format!("k{index}")
}

/// Compiled recognizer plus per-key validators
pub(crate) struct Recognizer {
    pub regex: Regex,
    pub group_names: Vec<String>,
    pub validators: Vec<Regex>,
}

/// Builds the regex source for the token list (pure function)
pub(crate) fn regex_source(tokens: &[Token], options: &CompileOptions) -> Result<String, PatternSyntaxError> {
    let mut route = String::new();
    let mut key_index = 0;

    for token in tokens {
        match token {
            Token::Literal(text) => route.push_str(&regex::escape(text)),
            Token::Group { text, modifier } => {
                route.push_str(&format!("(?:{}){}", regex::escape(text), modifier.as_str()));
            }
            Token::Key(key) => {
                route.push_str(&key_source(key, &key_group(key_index))?);
                key_index += 1;
            }
        }
    }

    let source = if options.end {
        let trail = if options.strict {
            String::new()
        } else {
            format!("(?P<{TRAIL_GROUP}>{DELIMITER_CLASS})?")
        };
        format!("^(?P<{ROUTE_GROUP}>{route}){trail}$")
    } else if ends_with_delimiter(tokens) {
        let trail = if options.strict {
            String::new()
        } else {
            format!("(?:(?P<{TRAIL_GROUP}>{DELIMITER_CLASS})$)?")
        };
        format!("^(?P<{ROUTE_GROUP}>{route}){trail}")
    } else if options.strict {
        format!("^(?P<{ROUTE_GROUP}>{route})(?:{DELIMITER_CLASS}|$)")
    } else {
        format!(
            "^(?P<{ROUTE_GROUP}>{route})(?:(?P<{TRAIL_GROUP}>{DELIMITER_CLASS})$|{DELIMITER_CLASS}|$)"
        )
    };

    Ok(source)
}

/// Regex fragment for one capturing key
fn key_source(key: &Key, group: &str) -> Result<String, PatternSyntaxError> {
    let prefix = regex::escape(&key.prefix);
    let suffix = regex::escape(&key.suffix);
    let pattern = &key.pattern;

    if prefix.is_empty() && suffix.is_empty() {
        if key.modifier.is_repeat() {
            return Err(PatternSyntaxError::RepeatWithoutAffix {
                name: key.name.clone(),
            });
        }
        return Ok(format!("(?P<{group}>{pattern}){}", key.modifier.as_str()));
    }

    if key.modifier.is_repeat() {
        let optional = if key.modifier == Modifier::ZeroOrMore { "?" } else { "" };
        return Ok(format!(
            "(?:{prefix}(?P<{group}>(?:{pattern})(?:{suffix}{prefix}(?:{pattern}))*){suffix}){optional}"
        ));
    }

    Ok(format!(
        "(?:{prefix}(?P<{group}>{pattern}){suffix}){}",
        key.modifier.as_str()
    ))
}

/// Whether the pattern already ends on a delimiter (or is empty)
fn ends_with_delimiter(tokens: &[Token]) -> bool {
    match tokens.last() {
        None => true,
        Some(Token::Literal(text)) => text.ends_with(DELIMITERS),
        Some(_) => false,
    }
}

fn compile_regex(source: &str, options: &CompileOptions) -> Result<Regex, PatternSyntaxError> {
    RegexBuilder::new(source)
        .case_insensitive(!options.sensitive)
        .build()
        .map_err(|err| PatternSyntaxError::InvalidRegex {
            pattern: source.to_string(),
            message: err.to_string(),
        })
}

/// Compiles the recognizer and per-key validators
///
/// Rejects user patterns that smuggle in extra capture groups (for example
/// `(?P<x>…)`), keeping one parameter per capture group.
pub(crate) fn build_recognizer(tokens: &[Token], options: &CompileOptions) -> Result<Recognizer, PatternSyntaxError> {
    let source = regex_source(tokens, options)?;
    let regex = compile_regex(&source, options)?;

    let keys: Vec<&Key> = tokens
        .iter()
        .filter_map(|token| match token {
            Token::Key(key) => Some(key),
            _ => None,
        })
        .collect();

    let expected_groups = 2 + keys.len() + usize::from(regex.capture_names().flatten().any(|n| n == TRAIL_GROUP));
    if regex.captures_len() != expected_groups {
        return Err(PatternSyntaxError::CapturingGroup { index: 0 });
    }

    let validators = keys
        .iter()
        .map(|key| compile_regex(&format!("^(?:{})$", key.pattern), options))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Recognizer {
        regex,
        group_names: (0..keys.len()).map(key_group).collect(),
        validators,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::parse;

    fn source(pattern: &str, options: CompileOptions) -> String {
        regex_source(&parse(pattern).unwrap(), &options).unwrap()
    }

    #[test]
    fn test_source_prefix_mode() {
        assert_eq!(
            source("/users/:id", CompileOptions::default()),
            "^(?P<route>/users(?:/(?P<k0>[^/#?]+?)))(?:(?P<trail>[/#?])$|[/#?]|$)"
        );
    }

    #[test]
    fn test_source_delimiter_terminated() {
        assert_eq!(
            source("/users/", CompileOptions::default()),
            "^(?P<route>/users/)(?:(?P<trail>[/#?])$)?"
        );
    }

    #[test]
    fn test_source_end_mode() {
        let options = CompileOptions {
            end: true,
            ..CompileOptions::default()
        };
        assert_eq!(
            source("/a", options),
            "^(?P<route>/a)(?P<trail>[/#?])?$"
        );
    }

    #[test]
    fn test_source_strict_mode() {
        let options = CompileOptions {
            strict: true,
            ..CompileOptions::default()
        };
        assert_eq!(source("/a", options), "^(?P<route>/a)(?:[/#?]|$)");
    }

    #[test]
    fn test_source_repeat() {
        assert_eq!(
            source("/:p*", CompileOptions::default()),
            "^(?P<route>(?:/(?P<k0>(?:[^/#?]+?)(?:/(?:[^/#?]+?))*))?)(?:(?P<trail>[/#?])$|[/#?]|$)"
        );
    }

    #[test]
    fn test_repeat_without_affix_is_rejected() {
        let err = regex_source(&parse("(a)+").unwrap(), &CompileOptions::default()).unwrap_err();
        assert_eq!(
            err,
            PatternSyntaxError::RepeatWithoutAffix {
                name: "0".to_string()
            }
        );
    }

    #[test]
    fn test_named_capture_in_user_pattern_is_rejected() {
        let err = build_recognizer(&parse("/((?P<x>a))").unwrap(), &CompileOptions::default())
            .err()
            .unwrap();
        assert_eq!(err, PatternSyntaxError::CapturingGroup { index: 0 });
    }

    #[test]
    fn test_invalid_regex_is_reported() {
        let err = build_recognizer(&parse("/:id([)").unwrap(), &CompileOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, PatternSyntaxError::InvalidRegex { .. }));
    }
}
