//! Edge router library.
//!
//! Classifies each request by device, resolves a target origin (static map or
//! configuration lookup) and forwards the request there, falling back to the
//! original destination whenever resolution fails.

pub mod config;
pub mod filters;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::EdgeConfig;
pub use http::EdgeServer;
pub use lifecycle::Shutdown;
pub use routing::EdgeRouter;
