//! Marker scanner.
//!
//! Templates carry two declarative markers in attribute position:
//!
//! - `@<event>="<Handler>"` binds a DOM event to a handler
//! - `@value="<Field>"` binds an input's value to a field, two-way
//!
//! A small hand-written scanner finds them. A marker only starts at an `@`
//! that follows whitespace and is itself followed by a name and `=`; any
//! other `@` (e-mail addresses, CSS at-rules, prose) is plain text. Once a
//! marker has started, a missing quote, an unterminated value or a value that
//! is not an identifier is an error rather than a silent mis-rewrite.

use crate::error::RenderError;

/// A recognised marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker<'a> {
    /// `@click="AddOne"`
    Event { event: &'a str, handler: &'a str },
    /// `@value="Name"`
    Value { field: &'a str },
}

/// A run of template text or a marker found at a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    Text(&'a str),
    Marker { marker: Marker<'a>, offset: usize },
}

/// Split a template into text runs and markers.
pub fn scan(source: &str) -> Result<Vec<Piece<'_>>, RenderError> {
    let bytes = source.as_bytes();
    let mut pieces = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'@' || i == 0 || !bytes[i - 1].is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let name_start = i + 1;
        let name_end = name_start + ident_len(&bytes[name_start..], is_event_char);
        if name_end == name_start || bytes.get(name_end) != Some(&b'=') {
            i += 1;
            continue;
        }

        let quote_at = name_end + 1;
        let quote = match bytes.get(quote_at) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(RenderError::Marker {
                    offset: i,
                    reason: "expected a quoted value after '='",
                })
            }
        };

        let value_start = quote_at + 1;
        let value_len = bytes[value_start..]
            .iter()
            .position(|&b| b == quote)
            .ok_or(RenderError::Marker {
                offset: i,
                reason: "unterminated marker value",
            })?;
        let value_end = value_start + value_len;

        let value = &source[value_start..value_end];
        if !is_identifier(value) {
            return Err(RenderError::Marker {
                offset: i,
                reason: "marker value must be an identifier",
            });
        }

        if text_start < i {
            pieces.push(Piece::Text(&source[text_start..i]));
        }

        let name = &source[name_start..name_end];
        let marker = if name == "value" {
            Marker::Value { field: value }
        } else {
            Marker::Event {
                event: name,
                handler: value,
            }
        };
        pieces.push(Piece::Marker { marker, offset: i });

        i = value_end + 1;
        text_start = i;
    }

    if text_start < bytes.len() {
        pieces.push(Piece::Text(&source[text_start..]));
    }

    Ok(pieces)
}

/// Rewrite every marker with `expand`, keeping text untouched.
pub fn rewrite<F>(source: &str, mut expand: F) -> Result<String, RenderError>
where
    F: FnMut(Marker<'_>) -> Result<String, RenderError>,
{
    let mut out = String::with_capacity(source.len() + 64);
    for piece in scan(source)? {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Marker { marker, .. } => out.push_str(&expand(marker)?),
        }
    }
    Ok(out)
}

fn is_event_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn ident_len(bytes: &[u8], accept: fn(u8) -> bool) -> usize {
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() => bytes.iter().take_while(|&&b| accept(b)).count(),
        _ => 0,
    }
}

/// Identifiers usable as template variable names.
pub fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_alphabetic() || b == b'_')
        && bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(source: &str) -> Vec<Marker<'_>> {
        scan(source)
            .unwrap()
            .into_iter()
            .filter_map(|p| match p {
                Piece::Marker { marker, .. } => Some(marker),
                Piece::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn finds_event_and_value_markers() {
        let found = markers(r#"<button @click="AddOne">+</button><input @value='Name'>"#);
        assert_eq!(
            found,
            vec![
                Marker::Event {
                    event: "click",
                    handler: "AddOne"
                },
                Marker::Value { field: "Name" },
            ]
        );
    }

    #[test]
    fn text_is_preserved_around_markers() {
        let out = rewrite(r#"<b @click="Go">x</b>"#, |_| Ok("M".into())).unwrap();
        assert_eq!(out, "<b M>x</b>");
    }

    #[test]
    fn ignores_at_signs_outside_attribute_position() {
        let source = "mail me at ada@example.com\n<style> @media screen { } </style> @ alone";
        assert!(markers(source).is_empty());
        assert_eq!(rewrite(source, |_| Ok(String::new())).unwrap(), source);
    }

    #[test]
    fn rejects_unquoted_values() {
        let err = scan("<b @click=AddOne>").unwrap_err();
        assert!(matches!(err, RenderError::Marker { offset: 3, .. }));
    }

    #[test]
    fn rejects_unterminated_values() {
        let err = scan(r#"<b @click="AddOne>"#).unwrap_err();
        assert!(matches!(err, RenderError::Marker { reason: "unterminated marker value", .. }));
    }

    #[test]
    fn rejects_non_identifier_values() {
        for source in [
            r#"<b @click="">"#,
            r#"<b @click="alert('x')">"#,
            r#"<b @value="{{ Name }}">"#,
        ] {
            assert!(scan(source).is_err(), "{source}");
        }
    }

    #[test]
    fn quotes_close_only_on_their_own_kind() {
        assert!(scan(r#"<b @click='Go' data-x="1">"#).is_ok());
        assert!(scan(r#"<b @click="Go' data-x='1'>"#).is_err());
    }

    #[test]
    fn identifiers() {
        assert!(is_identifier("Name"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier(""));
    }
}
