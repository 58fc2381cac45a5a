//! Positional substitution for message templates.
//!
//! Templates use `{}` for the next argument and `{N}` for argument `N`.
//! `{{` and `}}` produce literal braces.  Unused arguments are ignored.
use std::fmt::{self, Write as _};

use crate::error::FormatError;

/// A template argument.
pub type Arg<'a> = &'a dyn fmt::Display;

/// Expand `template` with `args`.
///
/// # Errors
///
/// Returns a [`FormatError`] for unbalanced braces, non-numeric placeholders
/// and references to arguments that were not supplied.
pub fn expand(template: &str, args: &[Arg<'_>]) -> Result<String, FormatError> {
    let mut out = String::with_capacity(template.len() + 16 * args.len());
    let mut chars = template.char_indices().peekable();
    let mut next_index = 0;

    while let Some((at, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut placeholder = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    placeholder.push(inner);
                }
                if !closed {
                    return Err(FormatError::UnclosedBrace { at });
                }
                let index = if placeholder.is_empty() {
                    let i = next_index;
                    next_index += 1;
                    i
                } else {
                    placeholder
                        .trim()
                        .parse::<usize>()
                        .map_err(|_| FormatError::BadIndex {
                            placeholder: placeholder.clone(),
                        })?
                };
                let arg = args
                    .get(index)
                    .ok_or(FormatError::MissingArgument { index })?;
                write!(out, "{arg}").ok();
            }
            '}' if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(FormatError::UnmatchedClose { at }),
            other => out.push(other),
        }
    }
    Ok(out)
}
