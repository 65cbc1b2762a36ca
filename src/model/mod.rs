//! Data model
//!
//! Targets, projects, channels and filters as the shell edits them.

pub mod filter;
pub mod project;
pub mod session;
pub mod target;

pub use filter::{Filter, FilterType};
pub use project::{Channel, DesignedFilter, Project, DEFAULT_SAMPLE_RATE};
pub use session::Session;
pub use target::{DataType, Target, TargetId};
