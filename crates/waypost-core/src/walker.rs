//! Namespace walker: flattens a module tree into descriptors.

use crate::source::{ModuleExports, ModuleSource};
use tracing::{debug, warn};

/// One leaf module, tagged with the directory chain leading to it.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// `/`-joined chain of directory names from the root; empty at the
    /// root itself. Never has leading or trailing separators.
    pub base_path: String,
    /// Filename without extension (`index`, `blog`, `[id]`, `+ws`).
    pub stem: String,
    pub exports: ModuleExports,
}

/// Walk a module source depth-first and return descriptors for every
/// loadable leaf module.
///
/// Directories are recursed into before their sibling files are emitted,
/// and both are visited in name order, so the resulting list (and with it
/// the route table's scan order) is deterministic. An unreadable directory
/// or module is reported and skipped; siblings are unaffected.
pub fn walk(source: &dyn ModuleSource) -> Vec<ModuleDescriptor> {
    let mut out = Vec::new();
    walk_dir(source, "", &mut out);
    debug!(
        target: "waypost::discovery",
        modules = out.len(),
        "Namespace walk complete"
    );
    out
}

fn walk_dir(source: &dyn ModuleSource, rel_dir: &str, out: &mut Vec<ModuleDescriptor>) {
    let entries = match source.read_dir(rel_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                target: "waypost::discovery",
                dir = %display_dir(rel_dir),
                error = %e,
                "Skipping unreadable directory"
            );
            return;
        }
    };

    let (mut dirs, mut files): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.is_dir);
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    for dir in dirs {
        walk_dir(source, &join_rel(rel_dir, &dir.name), out);
    }

    for file in files {
        let rel_path = join_rel(rel_dir, &file.name);
        match source.load(&rel_path) {
            Ok(exports) => out.push(ModuleDescriptor {
                base_path: rel_dir.to_string(),
                stem: stem_of(&file.name),
                exports,
            }),
            Err(e) => {
                warn!(
                    target: "waypost::discovery",
                    module = %rel_path,
                    error = %e,
                    "Skipping unloadable module"
                );
            }
        }
    }
}

fn join_rel(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

fn stem_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

fn display_dir(rel_dir: &str) -> &str {
    if rel_dir.is_empty() { "<root>" } else { rel_dir }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{DirEntryInfo, FsModules, StaticModules};
    use crate::{Result, WaypostError};
    use waypost_types::{Handler, RouteResponse};

    fn noop() -> Handler {
        Handler::new(|_req, _params| async { RouteResponse::new(200) })
    }

    #[test]
    fn test_walk_depth_first_dirs_before_files() {
        let mut modules = StaticModules::new();
        modules.module("index").route("GET", noop());
        modules.module("about").route("GET", noop());
        modules.module("api/blog/index").route("GET", noop());
        modules.module("api/blog/[id]").route("POST", noop());
        modules.module("api/status").route("GET", noop());

        let descriptors = walk(&modules);
        let order: Vec<(String, String)> = descriptors
            .iter()
            .map(|d| (d.base_path.clone(), d.stem.clone()))
            .collect();

        assert_eq!(
            order,
            vec![
                ("api/blog".to_string(), "[id]".to_string()),
                ("api/blog".to_string(), "index".to_string()),
                ("api".to_string(), "status".to_string()),
                ("".to_string(), "about".to_string()),
                ("".to_string(), "index".to_string()),
            ]
        );
    }

    #[test]
    fn test_walk_strips_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("api/blog")).unwrap();
        std::fs::write(dir.path().join("api/blog/[id].handler"), b"").unwrap();
        std::fs::write(dir.path().join("api/blog/index.handler"), b"").unwrap();

        let source = FsModules::new(dir.path(), vec!["handler".to_string()], |_p| {
            Ok(crate::ModuleExports::new())
        });

        let descriptors = walk(&source);
        let stems: Vec<&str> = descriptors.iter().map(|d| d.stem.as_str()).collect();
        assert_eq!(stems, vec!["[id]", "index"]);
        assert!(descriptors.iter().all(|d| d.base_path == "api/blog"));
    }

    #[test]
    fn test_walk_skips_failing_module_keeps_siblings() {
        struct Flaky;
        impl crate::ModuleSource for Flaky {
            fn read_dir(&self, rel_dir: &str) -> Result<Vec<DirEntryInfo>> {
                match rel_dir {
                    "" => Ok(vec![
                        DirEntryInfo {
                            name: "bad".into(),
                            is_dir: false,
                        },
                        DirEntryInfo {
                            name: "good".into(),
                            is_dir: false,
                        },
                    ]),
                    _ => Ok(vec![]),
                }
            }

            fn load(&self, rel_path: &str) -> Result<crate::ModuleExports> {
                if rel_path == "bad" {
                    Err(WaypostError::ModuleLoad {
                        path: rel_path.to_string(),
                        reason: "corrupt".to_string(),
                    })
                } else {
                    Ok(crate::ModuleExports::new())
                }
            }
        }

        let descriptors = walk(&Flaky);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].stem, "good");
    }

    #[test]
    fn test_walk_skips_unreadable_subtree_keeps_rest() {
        struct Partial;
        impl crate::ModuleSource for Partial {
            fn read_dir(&self, rel_dir: &str) -> Result<Vec<DirEntryInfo>> {
                match rel_dir {
                    "" => Ok(vec![
                        DirEntryInfo {
                            name: "locked".into(),
                            is_dir: true,
                        },
                        DirEntryInfo {
                            name: "ok".into(),
                            is_dir: false,
                        },
                    ]),
                    "locked" => Err(WaypostError::TreeRead {
                        path: "locked".to_string(),
                        source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
                    }),
                    _ => Ok(vec![]),
                }
            }

            fn load(&self, _rel_path: &str) -> Result<crate::ModuleExports> {
                Ok(crate::ModuleExports::new())
            }
        }

        let descriptors = walk(&Partial);
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].stem, "ok");
    }
}
