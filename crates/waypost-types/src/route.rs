//! A compiled route table entry.

use crate::{Handler, Method, PathPattern};

/// One row of the route table: a pattern, one HTTP verb, and the handler
/// to invoke. Built once at startup by the route compiler and immutable
/// for the process lifetime.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub pattern: PathPattern,
    pub method: Method,
    pub handler: Handler,
}

impl RouteEntry {
    pub fn new(pattern: PathPattern, method: Method, handler: Handler) -> Self {
        Self {
            pattern,
            method,
            handler,
        }
    }
}
