//! Shell-style word splitting for curl command lines.

use courier_domain::{DomainError, DomainResult};

/// Splits a command line into words.
///
/// Understands single quotes, double quotes, backslash escapes and
/// backslash-newline continuations. Quotes are removed from the words.
///
/// # Errors
///
/// Returns [`DomainError::InvalidCurl`] for an unterminated quote.
pub fn tokenize(input: &str) -> DomainResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if !in_single_quote => match chars.next() {
                Some('\n') => {}
                Some('\r') if chars.peek() == Some(&'\n') => {
                    chars.next();
                }
                // Inside double quotes only a few characters are escapable.
                Some(next) if in_double_quote && !matches!(next, '"' | '\\' | '$' | '`') => {
                    current.push('\\');
                    current.push(next);
                }
                Some(next) => {
                    current.push(next);
                    in_word = true;
                }
                None => current.push('\\'),
            },
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
                in_word = true;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
                in_word = true;
            }
            c if c.is_whitespace() && !in_single_quote && !in_double_quote => {
                if in_word {
                    tokens.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if in_single_quote || in_double_quote {
        return Err(DomainError::InvalidCurl("unterminated quote".to_string()));
    }
    if in_word {
        tokens.push(current);
    }
    Ok(tokens)
}
