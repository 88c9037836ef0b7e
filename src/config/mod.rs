//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BreakerSettings (validated, immutable)
//!     → schema.rs Strategy::from (defaults for values <= 0)
//!     → one Strategy per breaker
//! ```
//!
//! # Design Decisions
//! - A strategy is immutable once a breaker is built from it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BreakerSettings, NamedStrategyConfig, ObservabilityConfig, Strategy, StrategyConfig};
pub use validation::ValidationError;
