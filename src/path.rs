//! Structural path encoding for exact element re-location
//!
//! Syntax:
//!   /html[1]/body[1]/div[2]   - positional walk from the document root,
//!                               1-based index among same-tag siblings
//!   //*[@id="submit"]         - short-circuit for a stable identifier

use crate::error::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralPath {
    /// Single-segment path referencing a stable identifier.
    Id(String),
    /// Root-to-element walk of (tag, same-tag sibling index) pairs.
    Segments(Vec<PathSegment>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub tag: String,
    pub index: usize,
}

impl StructuralPath {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::path_invalid(s, "empty path"));
        }

        if let Some(rest) = s.strip_prefix("//*[@id=\"") {
            let id = rest
                .strip_suffix("\"]")
                .ok_or_else(|| Error::path_invalid(s, "unterminated id reference"))?;
            if id.is_empty() || id.contains('"') {
                return Err(Error::path_invalid(s, "malformed id reference"));
            }
            return Ok(Self::Id(id.to_string()));
        }

        if !s.starts_with('/') {
            return Err(Error::path_invalid(s, "expected leading '/'"));
        }

        let mut segments = Vec::new();
        for part in s[1..].split('/') {
            segments.push(PathSegment::parse(part).map_err(|e| {
                Error::path_invalid(s, &format!("bad segment '{}': {}", part, e.message))
            })?);
        }
        Ok(Self::Segments(segments))
    }
}

impl PathSegment {
    fn parse(s: &str) -> Result<Self> {
        let (tag, rest) = s
            .split_once('[')
            .ok_or_else(|| Error::path_invalid(s, "expected 'tag[index]'"))?;
        let idx = rest
            .strip_suffix(']')
            .ok_or_else(|| Error::path_invalid(s, "missing ']'"))?;
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::path_invalid(s, "invalid tag name"));
        }
        let index: usize = idx
            .parse()
            .map_err(|_| Error::path_invalid(s, "index is not a number"))?;
        if index == 0 {
            return Err(Error::path_invalid(s, "index is 1-based"));
        }
        Ok(Self {
            tag: tag.to_string(),
            index,
        })
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "//*[@id=\"{}\"]", id),
            Self::Segments(segments) => {
                for seg in segments {
                    write!(f, "/{}[{}]", seg.tag, seg.index)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_positional() {
        let path = StructuralPath::parse("/html[1]/body[1]/div[2]").unwrap();
        match path {
            StructuralPath::Segments(segs) => {
                assert_eq!(segs.len(), 3);
                assert_eq!(segs[2].tag, "div");
                assert_eq!(segs[2].index, 2);
            }
            _ => panic!("expected segments"),
        }
    }

    #[test]
    fn parse_id_shortcut() {
        let path = StructuralPath::parse("//*[@id=\"submit\"]").unwrap();
        assert_eq!(path, StructuralPath::Id("submit".to_string()));
    }

    #[test]
    fn display_round_trips() {
        for s in ["/html[1]/body[1]/span[3]", "//*[@id=\"login\"]"] {
            let path = StructuralPath::parse(s).unwrap();
            assert_eq!(path.to_string(), s);
        }
    }

    #[test]
    fn malformed_paths_are_errors_not_panics() {
        for s in [
            "",
            "div[1]",
            "/div",
            "/div[0]",
            "/div[x]",
            "/div[1",
            "//*[@id=\"unclosed\"",
            "//*[@id=\"\"]",
        ] {
            let err = StructuralPath::parse(s).unwrap_err();
            assert_eq!(err.code, crate::error::ErrorCode::PathInvalid);
        }
    }
}
