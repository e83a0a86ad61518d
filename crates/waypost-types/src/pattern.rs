//! Route path patterns and captured parameters.

use serde::Serialize;
use std::fmt;

/// One position in a route pattern: either a literal path segment or a
/// named capture that accepts any non-empty segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route path.
///
/// `raw` is the normalized printable form (`/api/blog/:id`). `base` is the
/// module's filename stem exactly as written (`index`, `blog`, `[id]`),
/// the trailing identifier before normalization. The dispatcher uses it to
/// break ties between routes that both match a request structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    base: String,
}

impl PathPattern {
    /// Parse a normalized route path such as `/api/blog/:id`.
    ///
    /// Segments starting with `:` become named captures; everything else is
    /// a literal. Empty segments (from duplicate separators) are dropped,
    /// so `/` parses to the empty segment list.
    pub fn parse(path: &str, base: impl Into<String>) -> Self {
        let segments: Vec<Segment> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        let raw = if segments.is_empty() {
            "/".to_string()
        } else {
            let mut out = String::with_capacity(path.len());
            for seg in &segments {
                out.push('/');
                match seg {
                    Segment::Literal(lit) => out.push_str(lit),
                    Segment::Param(name) => {
                        out.push(':');
                        out.push_str(name);
                    }
                }
            }
            out
        };

        Self {
            raw,
            segments,
            base: base.into(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Whether this pattern contains any named captures.
    pub fn has_params(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Param(_)))
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parameters captured from a matched path, in pattern order.
///
/// Keys are unique by construction: one capture per pattern position, and
/// a pattern never declares the same name twice in practice. Lookup scans
/// from the end so the deepest capture wins if that assumption is broken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
