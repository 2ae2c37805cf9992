//! Command handlers for the Asha CLI.

pub mod context;
pub mod expand;
pub mod status;

pub use context::ContextCommand;
pub use expand::ExpandCommand;
pub use status::StatusCommand;
