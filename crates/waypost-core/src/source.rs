//! Module sources: where handler modules come from.
//!
//! Dynamic code loading is not a thing here. A [`ModuleSource`] hands the
//! walker two capabilities: enumerating a directory level and resolving a
//! module path to its exported symbols. [`StaticModules`] is the
//! registration table embedders build at startup; [`FsModules`] walks a
//! real directory and delegates symbol resolution to a caller-supplied
//! loader.

use crate::events::EventHandler;
use crate::{Result, WaypostError};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use waypost_types::Handler;

/// One entry of a directory level, as the walker sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
}

/// A symbol exported by a module: either a route handler or a WebSocket
/// event handler.
#[derive(Clone)]
pub enum Export {
    Route(Handler),
    Event(EventHandler),
}

impl std::fmt::Debug for Export {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Export::Route(_) => f.write_str("Route(..)"),
            Export::Event(_) => f.write_str("Event(..)"),
        }
    }
}

/// The exported symbols of one module, keyed by export name.
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    exports: BTreeMap<String, Export>,
}

impl ModuleExports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, export: Export) {
        self.exports.insert(name.into(), export);
    }

    pub fn get(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.exports.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Export)> {
        self.exports.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }
}

/// Supplies the namespace walker with a directory tree of modules.
///
/// Relative paths are `/`-joined segment chains; the empty string is the
/// tree root. Failures are per-entry: the walker reports and skips, and
/// siblings are unaffected.
pub trait ModuleSource: Send + Sync {
    /// Enumerate one directory level.
    fn read_dir(&self, rel_dir: &str) -> Result<Vec<DirEntryInfo>>;

    /// Resolve a module path to its exported symbols.
    fn load(&self, rel_path: &str) -> Result<ModuleExports>;
}

/// The ahead-of-time registration table.
///
/// Modules are registered under extension-less tree paths:
///
/// ```
/// use waypost_core::StaticModules;
/// use waypost_types::{Handler, RouteResponse};
///
/// let mut modules = StaticModules::new();
/// modules
///     .module("api/blog/index")
///     .route("GET", Handler::new(|_req, _params| async {
///         RouteResponse::text(200, "posts")
///     }));
/// ```
#[derive(Default)]
pub struct StaticModules {
    tree: BTreeMap<String, ModuleExports>,
}

impl StaticModules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or extend) the module at `path` and return a builder for
    /// its exports.
    pub fn module(&mut self, path: &str) -> ModuleBuilder<'_> {
        let key = normalize_rel(path);
        ModuleBuilder {
            exports: self.tree.entry(key).or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

/// Builder handle for one registered module's exports.
pub struct ModuleBuilder<'a> {
    exports: &'a mut ModuleExports,
}

impl ModuleBuilder<'_> {
    pub fn route(self, name: &str, handler: Handler) -> Self {
        self.exports.insert(name, Export::Route(handler));
        self
    }

    pub fn event(self, name: &str, handler: EventHandler) -> Self {
        self.exports.insert(name, Export::Event(handler));
        self
    }
}

impl ModuleSource for StaticModules {
    fn read_dir(&self, rel_dir: &str) -> Result<Vec<DirEntryInfo>> {
        let prefix = if rel_dir.is_empty() {
            String::new()
        } else {
            format!("{rel_dir}/")
        };

        let mut dirs = BTreeSet::new();
        let mut files = BTreeSet::new();
        for key in self.tree.keys() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((head, _)) => {
                    dirs.insert(head.to_string());
                }
                None if !rest.is_empty() => {
                    files.insert(rest.to_string());
                }
                None => {}
            }
        }

        let mut out: Vec<DirEntryInfo> = dirs
            .into_iter()
            .map(|name| DirEntryInfo { name, is_dir: true })
            .collect();
        out.extend(files.into_iter().map(|name| DirEntryInfo {
            name,
            is_dir: false,
        }));
        Ok(out)
    }

    fn load(&self, rel_path: &str) -> Result<ModuleExports> {
        self.tree
            .get(rel_path)
            .cloned()
            .ok_or_else(|| WaypostError::ModuleLoad {
                path: rel_path.to_string(),
                reason: "not registered".to_string(),
            })
    }
}

/// Loader callback for [`FsModules`]: given a resolved on-disk path,
/// produce the module's exports or a reason it cannot be loaded.
pub type LoaderFn = dyn Fn(&Path) -> std::result::Result<ModuleExports, String> + Send + Sync;

/// A module source backed by a real directory tree.
///
/// Only files whose extension is in the configured set are treated as
/// modules; everything else at a level is ignored. What a module file
/// *means* stays a black box: the loader callback owns that.
pub struct FsModules {
    root: PathBuf,
    extensions: Vec<String>,
    loader: Arc<LoaderFn>,
}

impl FsModules {
    pub fn new<F>(root: impl Into<PathBuf>, extensions: Vec<String>, loader: F) -> Self
    where
        F: Fn(&Path) -> std::result::Result<ModuleExports, String> + Send + Sync + 'static,
    {
        Self {
            root: root.into(),
            extensions,
            loader: Arc::new(loader),
        }
    }
}

impl ModuleSource for FsModules {
    fn read_dir(&self, rel_dir: &str) -> Result<Vec<DirEntryInfo>> {
        let dir = self.root.join(rel_dir);
        let entries = std::fs::read_dir(&dir).map_err(|source| WaypostError::TreeRead {
            path: dir.display().to_string(),
            source,
        })?;

        let mut out = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                out.push(DirEntryInfo { name, is_dir: true });
            } else {
                let recognized = Path::new(&name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| self.extensions.iter().any(|x| x == e))
                    .unwrap_or(false);
                if recognized {
                    out.push(DirEntryInfo {
                        name,
                        is_dir: false,
                    });
                }
            }
        }
        Ok(out)
    }

    fn load(&self, rel_path: &str) -> Result<ModuleExports> {
        let path = self.root.join(rel_path);
        (self.loader)(&path).map_err(|reason| WaypostError::ModuleLoad {
            path: rel_path.to_string(),
            reason,
        })
    }
}

/// Trim separators so registered paths are stored in canonical
/// `a/b/c` form.
fn normalize_rel(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
