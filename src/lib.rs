//! heapdb - A buffer pool with clock eviction and heap files on top of it.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                             heapdb                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Heap Files (heap/)                        │   │
//! │  │   HeapFile + HeapFileScan (predicate, mark/reset)        │   │
//! │  │            + InsertFileScan (chain growth)               │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Buffer Pool (buffer/)                      │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │   CLOCK eviction over the frame descriptors     │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  │      BufferPool + PageGuard + PageIndex + Statistics     │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Storage Layer (storage/)                   │   │
//! │  │   FileManager + DiskFile + Page + FileHeader + DataPage  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Rid, Error, config)
//! - [`storage`] - Files, disk I/O and page formats
//! - [`buffer`] - Buffer pool management and eviction
//! - [`heap`] - Heap files, scans and inserts
//!
//! # Quick Start
//! ```no_run
//! use heapdb::heap::{create_heap_file, CompOp, HeapFileScan, InsertFileScan, ScanPredicate};
//! use heapdb::storage::FileManager;
//! use heapdb::{BufferPool, BufferPoolConfig};
//!
//! let files = FileManager::new("my_database").unwrap();
//! let pool = BufferPool::new(BufferPoolConfig::default());
//!
//! create_heap_file(&pool, &files, "numbers").unwrap();
//! {
//!     let mut ins = InsertFileScan::open(&pool, &files, "numbers").unwrap();
//!     for n in [1i32, 5, 3, 9, 2] {
//!         ins.insert_record(&n.to_le_bytes()).unwrap();
//!     }
//! }
//!
//! let mut scan = HeapFileScan::open(&pool, &files, "numbers").unwrap();
//! scan.start_scan(Some(ScanPredicate::int32(0, CompOp::Gt, 3))).unwrap();
//! while let Ok(rid) = scan.scan_next() {
//!     println!("{} -> {:?}", rid, scan.get_record().unwrap());
//! }
//! ```

pub mod buffer;
pub mod common;
pub mod heap;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::PAGE_SIZE;
pub use common::{BufferPoolConfig, Error, FileId, FrameId, PageId, Result, Rid, SlotId};

pub use buffer::{BufferPool, BufferPoolStats, PageGuard, StatsSnapshot};
pub use heap::{HeapFile, HeapFileScan, InsertFileScan};
pub use storage::page::{DataPage, FileHeader, Page};
pub use storage::{FileManager, FileRef};
