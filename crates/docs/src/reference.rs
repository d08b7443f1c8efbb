// Document identifiers embedded in form upload links

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// The cell is blank.
    Empty,
    /// Non-blank, but has no `id=` parameter.
    MissingId(String),
    /// `id=` is present with nothing after it.
    EmptyId(String),
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no document reference"),
            Self::MissingId(r) => write!(f, "reference '{r}' has no 'id=' parameter"),
            Self::EmptyId(r) => write!(f, "reference '{r}' has an empty id"),
        }
    }
}

impl std::error::Error for ReferenceError {}

/// Identifier after the last `id=` of `reference`, cut at the next `&` or `#`.
///
/// `https://drive.google.com/open?id=1AbC&usp=sharing` gives `1AbC`.
pub fn parse_document_id(reference: &str) -> Result<&str, ReferenceError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ReferenceError::Empty);
    }
    let (_, tail) = reference
        .rsplit_once("id=")
        .ok_or_else(|| ReferenceError::MissingId(reference.to_string()))?;
    let id = tail.split(|c| c == '&' || c == '#').next().unwrap_or("").trim();
    if id.is_empty() {
        return Err(ReferenceError::EmptyId(reference.to_string()));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_open_links() {
        assert_eq!(parse_document_id("https://drive.google.com/open?id=1RNu8332u3z-x"), Ok("1RNu8332u3z-x"));
        assert_eq!(parse_document_id(" https://drive.google.com/open?id=abc&usp=drive_fs "), Ok("abc"));
        assert_eq!(parse_document_id("https://x/?a=1&id=abc#frag"), Ok("abc"));
    }

    #[test]
    fn rejects_references_without_an_id() {
        assert_eq!(parse_document_id(""), Err(ReferenceError::Empty));
        assert_eq!(
            parse_document_id("https://drive.google.com/file/d/abc/view"),
            Err(ReferenceError::MissingId("https://drive.google.com/file/d/abc/view".into()))
        );
        assert!(matches!(parse_document_id("https://x/?id=&y=1"), Err(ReferenceError::EmptyId(_))));
    }
}
