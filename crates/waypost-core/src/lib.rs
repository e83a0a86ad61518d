//! Core route resolution engine for Waypost.
//!
//! The pipeline is: a [`ModuleSource`] enumerates handler modules, the
//! [`walk`] pass flattens the tree into descriptors, [`compile`] turns
//! descriptors into an immutable [`RouteTable`], and a [`Dispatcher`]
//! resolves each request against that table (through a bounded LRU
//! [`ResolutionCache`]) or hands upgrade requests to the WebSocket
//! [`EventMap`].

mod cache;
mod compiler;
mod dispatcher;
mod error;
mod events;
mod matcher;
mod source;
mod walker;

pub use cache::{CacheStats, Resolved, ResolutionCache};
pub use compiler::{compile, RouteTable, DEFAULT_EXPORT, EVENT_MODULE, INDEX_MODULE};
pub use dispatcher::Dispatcher;
pub use error::WaypostError;
pub use events::{EventHandler, EventMap, EventPayload, OutboundFrame, WsConn, WsEvent};
pub use matcher::match_path;
pub use source::{
    DirEntryInfo, Export, FsModules, LoaderFn, ModuleBuilder, ModuleExports, ModuleSource,
    StaticModules,
};
pub use walker::{walk, ModuleDescriptor};

/// Result type for Waypost operations.
pub type Result<T> = std::result::Result<T, WaypostError>;
