//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → filters (optional prefilter stage)
//!     → routing (decision)
//!     → forward.rs (build outbound request, dispatch, stream response)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod server;

pub use forward::{ForwardError, Forwarder};
pub use request::{RequestId, RequestIdExt, X_REQUEST_ID};
pub use server::EdgeServer;
