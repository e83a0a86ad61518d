//! The fixed set of HTTP verbs a route module can export.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// HTTP methods recognized by the route compiler.
///
/// The set is closed on purpose: a verb outside this list can never match a
/// route, so an unknown method on the wire falls straight through to the
/// default handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

/// Error returned when parsing a string that is not a recognized verb.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized HTTP method: {0}")]
pub struct UnknownMethod(pub String);

impl Method {
    /// All recognized methods, in the order the compiler probes module
    /// exports. This order is part of the route table's scan order.
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
    ];

    /// Canonical upper-case form, matching the export name a module uses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }

    /// Case-insensitive parse. Returns `None` for verbs outside the
    /// recognized set (HEAD, OPTIONS, nonsense strings, ...).
    pub fn parse(s: &str) -> Option<Method> {
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::parse(s).ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(Method::parse("GET"), Some(Method::Get));
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("Patch"), Some(Method::Patch));
    }

    #[test]
    fn test_parse_unknown_verbs() {
        assert_eq!(Method::parse("HEAD"), None);
        assert_eq!(Method::parse("OPTIONS"), None);
        assert_eq!(Method::parse(""), None);
    }

    #[test]
    fn test_display_round_trip() {
        for m in Method::ALL {
            assert_eq!(Method::parse(&m.to_string()), Some(m));
        }
    }

    #[test]
    fn test_from_str_error() {
        let err = "TRACE".parse::<Method>().unwrap_err();
        assert_eq!(err, UnknownMethod("TRACE".to_string()));
    }
}
