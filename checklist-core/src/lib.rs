//! Host security checklist collection
//!
//! Each check reads raw facts from a host through a [`FactSource`] and
//! renders them as a canonical text block. [`Checklist`] maps the numeric
//! check identifiers onto collectors and wraps the result in a
//! [`CheckReport`].

pub mod checks;
pub mod config;
pub mod error;
pub mod modules;
pub mod platform;
pub mod source;
pub mod types;

pub use checks::{Check, CheckArgs, Checklist};
pub use config::ChecklistConfig;
pub use error::{CollectError, Result, SourceError};
pub use platform::Platform;
pub use source::{FactSource, HostSource, MemorySource, SourceRef};
pub use types::CheckReport;
