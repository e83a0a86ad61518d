//! Route compiler: descriptors in, route table and event map out.

use crate::events::EventMap;
use crate::source::Export;
use crate::walker::ModuleDescriptor;
use std::sync::Arc;
use tracing::{info, warn};
use waypost_types::{Method, PathPattern, RouteEntry};

/// Reserved filename stem for the WebSocket event module.
pub const EVENT_MODULE: &str = "+ws";

/// Filename stem that maps a module onto its containing directory's path.
pub const INDEX_MODULE: &str = "index";

/// Export name treated as a generic `GET` handler.
pub const DEFAULT_EXPORT: &str = "default";

/// The compiled, immutable routing state.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    pub routes: Vec<Arc<RouteEntry>>,
    pub events: EventMap,
}

/// Compile walked descriptors into a route table.
///
/// Route order follows descriptor order, which the walker keeps
/// deterministic; the dispatcher's scan-order tie-break depends on that.
/// Invalid modules are reported and skipped, never fatal.
pub fn compile(descriptors: Vec<ModuleDescriptor>) -> RouteTable {
    let mut routes: Vec<Arc<RouteEntry>> = Vec::new();
    let mut events = EventMap::new();

    for descriptor in descriptors {
        if descriptor.stem == EVENT_MODULE {
            compile_event_module(&descriptor, &mut events);
            continue;
        }

        let pattern = derive_pattern(&descriptor.base_path, &descriptor.stem);
        let mut emitted = false;

        for method in Method::ALL {
            if let Some(Export::Route(handler)) = descriptor.exports.get(method.as_str()) {
                routes.push(Arc::new(RouteEntry::new(
                    pattern.clone(),
                    method,
                    handler.clone(),
                )));
                emitted = true;
            }
        }

        if let Some(Export::Route(handler)) = descriptor.exports.get(DEFAULT_EXPORT) {
            if descriptor.exports.contains(Method::Get.as_str()) {
                warn!(
                    target: "waypost::discovery",
                    module = %module_path(&descriptor),
                    "Module exports both GET and default; explicit GET wins"
                );
            } else {
                routes.push(Arc::new(RouteEntry::new(
                    pattern.clone(),
                    Method::Get,
                    handler.clone(),
                )));
                emitted = true;
            }
        }

        if !emitted {
            warn!(
                target: "waypost::discovery",
                module = %module_path(&descriptor),
                "Module has no recognized exports; skipped"
            );
        }
    }

    info!(
        target: "waypost::discovery",
        routes = routes.len(),
        events = events.len(),
        "Route table compiled"
    );
    for route in &routes {
        info!(
            target: "waypost::discovery",
            method = %route.method,
            path = %route.pattern,
            "Route registered"
        );
    }

    RouteTable { routes, events }
}

fn compile_event_module(descriptor: &ModuleDescriptor, events: &mut EventMap) {
    for (name, export) in descriptor.exports.iter() {
        match export {
            Export::Event(handler) => events.insert(name, handler.clone()),
            Export::Route(_) => {
                warn!(
                    target: "waypost::discovery",
                    module = %module_path(descriptor),
                    export = name,
                    "Route export inside an event module; ignored"
                );
            }
        }
    }
}

/// Derive a module's route pattern from its position in the namespace.
///
/// In priority order: an `index` stem maps to the containing directory's
/// path (root index maps to `/`); a `[name]` stem appends one trailing
/// capture; any other stem appends itself as a literal segment. Duplicate
/// separators are collapsed by the pattern parser.
pub(crate) fn derive_pattern(base_path: &str, stem: &str) -> PathPattern {
    let raw = if stem == INDEX_MODULE {
        format!("/{base_path}")
    } else if let Some(name) = capture_name(stem) {
        format!("/{base_path}/:{name}")
    } else {
        format!("/{base_path}/{stem}")
    };
    PathPattern::parse(&raw, stem)
}

fn capture_name(stem: &str) -> Option<&str> {
    stem.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .filter(|name| !name.is_empty())
}

fn module_path(descriptor: &ModuleDescriptor) -> String {
    if descriptor.base_path.is_empty() {
        descriptor.stem.clone()
    } else {
        format!("{}/{}", descriptor.base_path, descriptor.stem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventHandler;
    use crate::source::ModuleExports;
    use waypost_types::{Handler, RouteResponse, Segment};

    fn noop() -> Handler {
        Handler::new(|_req, _params| async { RouteResponse::new(200) })
    }

    fn noop_event() -> EventHandler {
        EventHandler::new(|_conn, _payload| async {})
    }

    fn descriptor(base: &str, stem: &str, exports: ModuleExports) -> ModuleDescriptor {
        ModuleDescriptor {
            base_path: base.to_string(),
            stem: stem.to_string(),
            exports,
        }
    }

    fn route_exports(names: &[&str]) -> ModuleExports {
        let mut exports = ModuleExports::new();
        for name in names {
            exports.insert(*name, Export::Route(noop()));
        }
        exports
    }

    #[test]
    fn test_root_index_maps_to_slash() {
        let pattern = derive_pattern("", "index");
        assert_eq!(pattern.raw(), "/");
        assert!(pattern.segments().is_empty());
    }

    #[test]
    fn test_index_maps_to_parent_dir() {
        let pattern = derive_pattern("api/blog", "index");
        assert_eq!(pattern.raw(), "/api/blog");
        assert_eq!(pattern.base(), "index");
    }

    #[test]
    fn test_bracket_stem_maps_to_capture() {
        let pattern = derive_pattern("api/blog", "[id]");
        assert_eq!(pattern.raw(), "/api/blog/:id");
        assert_eq!(
            pattern.segments().last(),
            Some(&Segment::Param("id".to_string()))
        );
        assert_eq!(pattern.base(), "[id]");
    }

    #[test]
    fn test_plain_stem_maps_to_literal() {
        let pattern = derive_pattern("api", "status");
        assert_eq!(pattern.raw(), "/api/status");
    }

    #[test]
    fn test_malformed_bracket_stem_stays_literal() {
        assert_eq!(derive_pattern("", "[id").raw(), "/[id");
        assert_eq!(derive_pattern("", "[]").raw(), "/[]");
    }

    #[test]
    fn test_compile_emits_one_route_per_method() {
        let table = compile(vec![descriptor(
            "api",
            "items",
            route_exports(&["GET", "POST", "DELETE"]),
        )]);

        assert_eq!(table.routes.len(), 3);
        let methods: Vec<Method> = table.routes.iter().map(|r| r.method).collect();
        assert_eq!(methods, vec![Method::Get, Method::Post, Method::Delete]);
        assert!(table
            .routes
            .iter()
            .all(|r| r.pattern.raw() == "/api/items"));
    }

    #[test]
    fn test_compile_default_export_is_get() {
        let table = compile(vec![descriptor("", "home", route_exports(&["default"]))]);
        assert_eq!(table.routes.len(), 1);
        assert_eq!(table.routes[0].method, Method::Get);
    }

    #[test]
    fn test_compile_explicit_get_beats_default() {
        let table = compile(vec![descriptor(
            "",
            "home",
            route_exports(&["GET", "default"]),
        )]);
        assert_eq!(table.routes.len(), 1);
        assert_eq!(table.routes[0].method, Method::Get);
    }

    #[test]
    fn test_compile_event_module_contributes_no_routes() {
        let mut exports = ModuleExports::new();
        exports.insert("open", Export::Event(noop_event()));
        exports.insert("message", Export::Event(noop_event()));
        exports.insert("close", Export::Event(noop_event()));

        let table = compile(vec![descriptor("", "+ws", exports)]);
        assert!(table.routes.is_empty());
        assert_eq!(table.events.len(), 3);
        assert!(table.events.get("message").is_some());
    }

    #[test]
    fn test_compile_route_export_in_event_module_ignored() {
        let mut exports = ModuleExports::new();
        exports.insert("open", Export::Event(noop_event()));
        exports.insert("GET", Export::Route(noop()));

        let table = compile(vec![descriptor("", "+ws", exports)]);
        assert!(table.routes.is_empty());
        assert_eq!(table.events.len(), 1);
    }

    #[test]
    fn test_compile_skips_module_without_recognized_exports() {
        let table = compile(vec![
            descriptor("", "weird", route_exports(&["HANDLE", "run"])),
            descriptor("", "ok", route_exports(&["GET"])),
        ]);
        assert_eq!(table.routes.len(), 1);
        assert_eq!(table.routes[0].pattern.raw(), "/ok");
    }

    #[test]
    fn test_compile_nested_event_modules_merge() {
        let mut first = ModuleExports::new();
        first.insert("open", Export::Event(noop_event()));
        let mut second = ModuleExports::new();
        second.insert("message", Export::Event(noop_event()));

        let table = compile(vec![
            descriptor("", "+ws", first),
            descriptor("api", "+ws", second),
        ]);
        assert_eq!(table.events.len(), 2);
    }
}
