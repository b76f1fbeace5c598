//! Shared types for the mnemo memory store.

pub mod types;

pub use types::{MemoryCategory, OutputFormat, ParseCategoryError};
