//! Structural matching of a concrete path against a route pattern.

use waypost_types::{Params, PathPattern, Segment};

/// Match a request path against a pattern.
///
/// Purely structural: segment counts must agree, literals compare by
/// equality, and a named capture accepts any non-empty segment and records
/// it. Duplicate separators in the concrete path are ignored, mirroring
/// pattern normalization. No backtracking is needed: each concrete segment
/// maps to exactly one pattern position.
pub fn match_path(pattern: &PathPattern, path: &str) -> Option<Params> {
    let concrete: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let segments = pattern.segments();

    if concrete.len() != segments.len() {
        return None;
    }

    let mut params = Params::new();
    for (segment, got) in segments.iter().zip(concrete) {
        match segment {
            Segment::Literal(lit) => {
                if lit != got {
                    return None;
                }
            }
            Segment::Param(name) => params.push(name.clone(), got),
        }
    }
    Some(params)
}
