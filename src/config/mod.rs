//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → handed to EdgeRouter / prefilters at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::EdgeConfig;
pub use schema::ForwarderConfig;
pub use schema::ListenerConfig;
pub use schema::OriginSource;
pub use schema::RedirectConfig;
pub use schema::SiteConfig;
pub use validation::ValidationError;
