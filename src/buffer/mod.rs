//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between heap files and
//! disk. It manages a fixed pool of frames, each holding one page of one
//! open file.
//!
//! # Components
//! - [`BufferPool`] - The main page cache
//! - [`Frame`] / [`BufferDescriptor`] - A slot in the pool and its bookkeeping
//! - [`PageIndex`] - `(file, page)` to frame lookup
//! - [`PageGuard`] - RAII pin on a page
//! - [`BufferPoolStats`] - Performance statistics
//! - [`replacer`] - Eviction policy

mod buffer_pool;
mod frame;
mod page_guard;
mod page_index;
pub mod replacer;
mod stats;

pub use buffer_pool::BufferPool;
pub use frame::{BufferDescriptor, Frame};
pub use page_guard::PageGuard;
pub use page_index::PageIndex;
pub use stats::{BufferPoolStats, StatsSnapshot};
