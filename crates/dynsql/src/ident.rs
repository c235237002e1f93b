//! SQL identifier validation and quoting.
//!
//! Names the builder writes itself (relations, criterion properties, aggregate and join
//! columns) are written verbatim when every dotted segment is a plain identifier, and
//! quoted segment by segment otherwise. Configured SELECT columns and ORDER BY entries
//! are not names and are written as given.
//!
//! - Plain segments match `[A-Za-z_][A-Za-z0-9_$]*` and are never quoted.
//! - Other segments are wrapped in the dialect's quote character, which is escaped by
//!   doubling it.
//!
//! # Example
//! ```
//! use dynsql::ident;
//!
//! let mut out = String::new();
//! ident::write_quoted(&mut out, "ORDERS.order date", '`');
//! assert_eq!(out, "ORDERS.`order date`");
//! ```

use crate::error::{BuildError, BuildResult};

/// Validate a possibly dotted identifier.
///
/// Rejects empty names, NUL characters, and empty segments (`a..b`, `.a`, `a.`).
pub fn validate(name: &str) -> BuildResult<()> {
    if name.trim().is_empty() {
        return Err(BuildError::invalid_identifier(name, "identifier cannot be empty"));
    }
    if name.contains('\0') {
        return Err(BuildError::invalid_identifier(
            name,
            "identifier cannot contain NUL character",
        ));
    }
    if name.split('.').any(|segment| segment.is_empty()) {
        return Err(BuildError::invalid_identifier(name, "empty identifier segment"));
    }
    Ok(())
}

/// Whether a single segment can be written without quotes.
pub fn is_plain(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
}

/// Whether `name` refers to a column of another relation (`relation.column`).
pub fn is_qualified(name: &str) -> bool {
    name.contains('.')
}

/// Write `name`, quoting every segment that is not plain with `quote`.
///
/// The wildcard segment `*` is written as-is.
pub fn write_quoted(out: &mut String, name: &str, quote: char) {
    for (i, segment) in name.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        if segment == "*" || is_plain(segment) {
            out.push_str(segment);
            continue;
        }
        out.push(quote);
        for ch in segment.chars() {
            if ch == quote {
                out.push(quote);
            }
            out.push(ch);
        }
        out.push(quote);
    }
}
