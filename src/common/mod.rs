//! Common types and utilities shared across heapdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`BufferPoolConfig`]
//! - Error types
//! - Identifiers (PageId, FrameId, FileId, SlotId, Rid)

pub mod config;
pub mod error;
mod file_id;
mod frame_id;
mod page_id;
mod rid;

pub use config::BufferPoolConfig;
pub use error::{Error, Result};
pub use file_id::FileId;
pub use frame_id::FrameId;
pub use page_id::PageId;
pub use rid::{Rid, SlotId};
