//! Storage layer for installed tool definitions.
//!
//! The registry reads every definition through a `ToolStore` once at startup
//! and writes the full set back after each successful install.

mod jsonl;
mod memory;
mod traits;

pub use jsonl::JsonlToolStore;
pub use memory::MemoryToolStore;
pub use traits::ToolStore;
