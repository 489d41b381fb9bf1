//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, headers)
//!     → router.rs (site lookup by host)
//!     → classifier.rs (User-Agent → mobile | desktop)
//!     → resolver.rs (static map or configuration lookup → host)
//!     → Decision: Rewrite { host } | PassThrough
//!     → http::forward (exactly one dispatch)
//!
//! Site Compilation (at startup):
//!     SiteConfig[]
//!     → Sort by priority
//!     → Compile host matchers and resolvers
//!     → Freeze as immutable EdgeRouter
//! ```
//!
//! # Design Decisions
//! - Sites compiled at startup, immutable at runtime
//! - No shared mutable state between requests; nothing is cached
//! - Deterministic: same input always yields the same static decision

pub mod classifier;
pub mod origin;
pub mod resolver;
pub mod router;

pub use classifier::{classify, ClientProfile, DeviceClass};
pub use origin::OriginMap;
pub use resolver::{OriginResolver, ResolutionError};
pub use router::{Decision, EdgeRouter, PassThroughReason};
