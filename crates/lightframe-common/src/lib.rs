//! Lightframe-Common: Shared types, IDs, and errors.
//!
//! This crate provides common functionality used across lightframe:
//!
//! - **Typed IDs**: page-view UUIDs plus counter-based listener and timer handles
//! - **Core Types**: the page-module state machine and page termination signals
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use lightframe_common::{Error, ModuleState, PageViewId, Result};
//!
//! let view = PageViewId::new();
//! let state = ModuleState::Uninitialized;
//! assert!(state.can_init());
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("project"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
