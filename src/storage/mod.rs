//! Storage layer - disk I/O and page formats.
//!
//! This module handles persistent storage:
//! - [`DiskFile`] - Page I/O on one file
//! - [`PagedFile`] / [`FileRef`] - An open file shared with the buffer pool
//! - [`FileManager`] - Creating, opening and destroying files
//! - [`page`] - Page types and layouts

mod disk_file;
mod file_manager;
pub mod page;
mod paged_file;

pub use disk_file::DiskFile;
pub use file_manager::FileManager;
pub use paged_file::{FileRef, PagedFile};
