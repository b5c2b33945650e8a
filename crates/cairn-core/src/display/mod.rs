//! Display formatting for domain models and operation results.
//!
//! Domain models implement [`std::fmt::Display`] directly and produce
//! markdown; collections and operation results get thin wrappers so the CLI
//! renders everything through one path.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │  Domain Models  │    │  Wrappers &     │    │   Markdown      │
//! │ (Plan, Version, │───▶│  Result Types   │───▶│    Output       │
//! │  RunResult)     │    │                 │    │   (Terminal)    │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! - [`collections`]: `Plans`, `Versions`, `Branches`
//! - [`results`]: `CreateResult`, `UpdateResult`
//! - [`status`]: `OperationStatus`
//! - [`datetime`]: `LocalDateTime`
//! - [`models`]: Display implementations for domain models
//!
//! # Example
//!
//! ```rust
//! use cairn_core::display::OperationStatus;
//!
//! let status = OperationStatus::success("Tagged v2 as 'stable'".to_string());
//! assert_eq!(status.to_string(), "Success: Tagged v2 as 'stable'\n");
//! ```

pub mod collections;
pub mod datetime;
pub mod models;
pub mod results;
pub mod status;

pub use collections::{Branches, Plans, Versions};
pub use datetime::LocalDateTime;
pub use results::{CreateResult, UpdateResult};
pub use status::OperationStatus;
