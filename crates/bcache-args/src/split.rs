//! Response-file argument splitting.
//!
//! Splits command-line text into tokens the way TI-style toolchains read
//! their command files. Backslashes are literal (Windows paths are common
//! in these files), so POSIX shell splitting does not apply.

use crate::ArgList;

/// Split `text` into argument tokens.
///
/// - Whitespace outside quotes separates tokens.
/// - `"` and `'` start a quoted span closed by the same character; the quote
///   characters themselves are removed.
/// - Inside double quotes, `\"` yields a literal `"`.
/// - An unterminated quote runs to the end of the input.
pub fn split_args(text: &str) -> ArgList {
    let mut args = ArgList::new();
    let mut current = String::new();
    // A quoted empty string still produces a token.
    let mut has_token = false;
    let mut quote: Option<char> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else if c == '\\' && q == '"' && chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    current.push(c);
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                    has_token = true;
                } else if c.is_whitespace() {
                    if has_token {
                        args.push(std::mem::take(&mut current));
                        has_token = false;
                    }
                } else {
                    current.push(c);
                    has_token = true;
                }
            }
        }
    }

    if has_token {
        args.push(current);
    }

    args
}
