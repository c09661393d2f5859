/// Reverse routing: fill a pattern's keys with parameter values
///
/// Walks the token list once: literals are copied, keys are substituted with
/// their prefix/suffix, optional keys without a value are skipped.

use regex::Regex;

use super::Token;
use crate::context::Params;
use crate::error::BuildError;

pub(crate) fn build_path(tokens: &[Token], validators: &[Regex], params: &Params) -> Result<String, BuildError> {
    let mut path = String::new();
    let mut key_index = 0;

    for token in tokens {
        match token {
            Token::Literal(text) => path.push_str(text),
            Token::Group { text, modifier } => {
                if !modifier.is_optional() {
                    path.push_str(text);
                }
            }
            Token::Key(key) => {
                let validator = &validators[key_index];
                key_index += 1;

                let Some(value) = params.get(&key.name) else {
                    if key.modifier.is_optional() {
                        continue;
                    }
                    return Err(BuildError::MissingParameter {
                        name: key.name.clone(),
                    });
                };

                if !validator.is_match(value) {
                    return Err(BuildError::InvalidParameter {
                        name: key.name.clone(),
                        value: value.clone(),
                        pattern: key.pattern.clone(),
                    });
                }

                path.push_str(&key.prefix);
                path.push_str(value);
                path.push_str(&key.suffix);
            }
        }
    }

    Ok(path)
}
