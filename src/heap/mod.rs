//! Heap files - unordered record storage on top of the buffer pool.
//!
//! - [`HeapFile`] - An open heap file and its record cursor
//! - [`create_heap_file`] / [`destroy_heap_file`] - File lifecycle
//! - [`HeapFileScan`] / [`ScanPredicate`] - Filtered sequential scans with
//!   mark/reset and deletion
//! - [`InsertFileScan`] - Appending records

mod heap_file;
mod insert_scan;
mod predicate;
mod scan;

pub use heap_file::{create_heap_file, destroy_heap_file, HeapFile};
pub use insert_scan::InsertFileScan;
pub use predicate::{CompOp, Datatype, ScanPredicate};
pub use scan::{HeapFileScan, ScanState};
