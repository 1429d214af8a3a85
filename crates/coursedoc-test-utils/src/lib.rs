//! Testing utilities for the coursedoc workspace
//!
//! [`MemoryBackend`] implements all three backend seams in memory, with
//! hooks to inject the failure modes the services must survive.

#![warn(unreachable_pub)]

pub mod fixtures;
mod memory;

pub use memory::MemoryBackend;
