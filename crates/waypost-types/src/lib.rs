//! Shared types for the Waypost request router.

mod handler;
mod method;
mod pattern;
mod request;
mod route;

pub use handler::*;
pub use method::*;
pub use pattern::*;
pub use request::*;
pub use route::*;
