//! Buffer pool tests.
//!
//! Pin discipline, clock eviction order and write-back across several
//! open files.

use heapdb::common::{BufferPoolConfig, Error, PageId};
use heapdb::storage::{FileManager, FileRef};
use heapdb::BufferPool;
use std::sync::Arc;
use std::thread;
use tempfile::{tempdir, TempDir};

const FRAMES: usize = 10;

fn setup(pool_size: usize) -> (BufferPool, FileManager, TempDir) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempdir().unwrap();
    let files = FileManager::new(dir.path()).unwrap();
    let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(pool_size));
    (pool, files, dir)
}

/// Create and open a file with `pages` allocated pages.
fn open_with_pages(files: &FileManager, name: &str, pages: u32) -> FileRef {
    files.create_file(name).unwrap();
    let file = files.open_file(name).unwrap();
    for _ in 0..pages {
        file.allocate_page().unwrap();
    }
    file
}

/// Helper to write a string to page data.
fn copy_string(data: &mut [u8], s: &str) {
    let bytes = s.as_bytes();
    data[..bytes.len()].copy_from_slice(bytes);
    data[bytes.len()] = 0;
}

/// Helper to read a NUL-terminated string from page data.
fn read_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).to_string()
}

#[test]
fn test_very_basic() {
    let (pool, files, _dir) = setup(FRAMES);
    let file = open_with_pages(&files, "basic", 0);
    let str_data = "Hello, world!";

    let pid = {
        let mut guard = pool.alloc_page(&file).unwrap();
        copy_string(guard.write().as_mut_slice(), str_data);
        assert_eq!(read_string(guard.read().as_slice()), str_data);
        guard.page_id()
    };

    {
        let guard = pool.fetch_page(&file, pid).unwrap();
        assert_eq!(read_string(guard.read().as_slice()), str_data);
    }

    assert!(pool.dispose_page(&file, pid).is_ok());
}

#[test]
fn test_fetch_unpin_pairs_return_to_zero() {
    let (pool, files, _dir) = setup(4);
    let file = open_with_pages(&files, "pairs", 3);

    for round in 0..5 {
        let guards: Vec<_> = (0..3)
            .map(|i| pool.fetch_page(&file, PageId::new((i + round) % 3)).unwrap())
            .collect();
        let extra = pool.fetch_page(&file, PageId::new(0)).unwrap();
        drop(extra);
        drop(guards);
    }

    for i in 0..3 {
        assert_eq!(pool.pin_count(&file, PageId::new(i)), Some(0));
    }
}

#[test]
fn test_page_pin_easy() {
    let (pool, files, _dir) = setup(2);
    let file = open_with_pages(&files, "easy", 4);
    let (p0, p1, t0, t1) = (PageId::new(0), PageId::new(1), PageId::new(2), PageId::new(3));

    {
        let mut page0 = pool.fetch_page(&file, p0).unwrap();
        copy_string(page0.write().as_mut_slice(), "page0");
        let mut page1 = pool.fetch_page(&file, p1).unwrap();
        copy_string(page1.write().as_mut_slice(), "page1");

        assert_eq!(pool.pin_count(&file, p0), Some(1));
        assert_eq!(pool.pin_count(&file, p1), Some(1));

        // All frames pinned
        assert!(matches!(pool.fetch_page(&file, t0), Err(Error::ResourceExhausted)));
        assert!(matches!(pool.fetch_page(&file, t1), Err(Error::ResourceExhausted)));

        page0.release().unwrap();
        assert_eq!(pool.pin_count(&file, p0), Some(0));
        page1.release().unwrap();
        assert_eq!(pool.pin_count(&file, p1), Some(0));
    }

    {
        drop(pool.fetch_page(&file, t0).unwrap());
        drop(pool.fetch_page(&file, t1).unwrap());

        assert!(pool.pin_count(&file, p0).is_none());
        assert!(pool.pin_count(&file, p1).is_none());
    }

    {
        let mut page0 = pool.fetch_page(&file, p0).unwrap();
        assert_eq!(read_string(page0.read().as_slice()), "page0");
        copy_string(page0.write().as_mut_slice(), "page0updated");

        let mut page1 = pool.fetch_page(&file, p1).unwrap();
        assert_eq!(read_string(page1.read().as_slice()), "page1");
        copy_string(page1.write().as_mut_slice(), "page1updated");
    }

    {
        drop(pool.fetch_page(&file, t0).unwrap());
        drop(pool.fetch_page(&file, t1).unwrap());

        let page0 = pool.fetch_page(&file, p0).unwrap();
        assert_eq!(read_string(page0.read().as_slice()), "page0updated");
        let page1 = pool.fetch_page(&file, p1).unwrap();
        assert_eq!(read_string(page1.read().as_slice()), "page1updated");
    }

    assert_eq!(pool.pin_count(&file, p0), Some(0));
    assert_eq!(pool.pin_count(&file, p1), Some(0));
}

#[test]
fn test_pinned_frames_never_evicted() {
    let (pool, files, _dir) = setup(FRAMES);
    let file = open_with_pages(&files, "pinned", 0);

    let mut pages = Vec::new();
    for i in 0..FRAMES {
        let mut guard = pool.alloc_page(&file).unwrap();
        copy_string(guard.write().as_mut_slice(), &format!("page{}", i));
        pages.push(guard);
    }

    // Every frame is pinned: no new page can come in
    assert!(matches!(pool.alloc_page(&file), Err(Error::ResourceExhausted)));
    assert_eq!(pool.resident_count(), FRAMES);

    // Releasing half makes room for exactly that many
    for guard in pages.drain(..FRAMES / 2) {
        guard.release().unwrap();
    }
    for _ in 0..FRAMES / 2 {
        pages.push(pool.alloc_page(&file).unwrap());
    }
    assert!(matches!(pool.alloc_page(&file), Err(Error::ResourceExhausted)));

    // The pages still pinned kept their contents
    for (i, guard) in pages.iter().take(FRAMES / 2).enumerate() {
        let expected = format!("page{}", i + FRAMES / 2);
        assert_eq!(read_string(guard.read().as_slice()), expected);
    }
}

#[test]
fn test_clock_gives_referenced_page_a_second_chance() {
    let (pool, files, _dir) = setup(3);
    let file = open_with_pages(&files, "clock", 4);
    let p = |n| PageId::new(n);

    for n in 0..3 {
        drop(pool.fetch_page(&file, p(n)).unwrap());
    }

    // Touch page 0 again: its reference bit is set
    drop(pool.fetch_page(&file, p(0)).unwrap());

    // Page 3 needs a frame: page 0 is spared, page 1 goes
    drop(pool.fetch_page(&file, p(3)).unwrap());

    assert!(pool.is_resident(&file, p(0)));
    assert!(!pool.is_resident(&file, p(1)));
    assert!(pool.is_resident(&file, p(2)));
    assert!(pool.is_resident(&file, p(3)));
    assert_eq!(pool.stats().snapshot().ref_bit_clears, 1);
}

#[test]
fn test_dirty_page_survives_eviction() {
    let (pool, files, _dir) = setup(2);
    let file = open_with_pages(&files, "dirty", 5);

    for n in 0..5u32 {
        let mut guard = pool.fetch_page(&file, PageId::new(n)).unwrap();
        guard.write().as_mut_slice()[0] = n as u8 + 1;
        guard.write().as_mut_slice()[1] = (n as u8).wrapping_mul(3);
    }

    for n in 0..5u32 {
        let guard = pool.fetch_page(&file, PageId::new(n)).unwrap();
        assert_eq!(guard.read().as_slice()[0], n as u8 + 1);
        assert_eq!(guard.read().as_slice()[1], (n as u8).wrapping_mul(3));
    }
    assert!(pool.stats().snapshot().evictions >= 3);
}

#[test]
fn test_same_page_number_in_two_files() {
    let (pool, files, _dir) = setup(4);
    let a = open_with_pages(&files, "a", 1);
    let b = open_with_pages(&files, "b", 1);

    {
        let mut ga = pool.fetch_page(&a, PageId::new(0)).unwrap();
        let mut gb = pool.fetch_page(&b, PageId::new(0)).unwrap();
        assert_ne!(ga.frame_id(), gb.frame_id());
        copy_string(ga.write().as_mut_slice(), "from a");
        copy_string(gb.write().as_mut_slice(), "from b");
    }

    pool.flush_file(&a).unwrap();
    pool.flush_file(&b).unwrap();

    let ga = pool.fetch_page(&a, PageId::new(0)).unwrap();
    let gb = pool.fetch_page(&b, PageId::new(0)).unwrap();
    assert_eq!(read_string(ga.read().as_slice()), "from a");
    assert_eq!(read_string(gb.read().as_slice()), "from b");
}

#[test]
fn test_flush_file_with_pinned_page() {
    let (pool, files, _dir) = setup(4);
    let target = open_with_pages(&files, "target", 2);
    let other = open_with_pages(&files, "other", 1);

    {
        let mut guard = pool.fetch_page(&other, PageId::new(0)).unwrap();
        guard.write().as_mut_slice()[0] = 42;
    }
    drop(pool.fetch_page(&target, PageId::new(0)).unwrap());
    let pinned = pool.fetch_page(&target, PageId::new(1)).unwrap();

    assert!(matches!(
        pool.flush_file(&target),
        Err(Error::PagePinned { .. })
    ));
    // frames handled before the pinned one are flushed
    assert!(!pool.is_resident(&target, PageId::new(0)));
    assert!(pool.is_resident(&target, PageId::new(1)));

    // the unrelated file is untouched: still resident and still dirty
    assert!(pool.is_resident(&other, PageId::new(0)));
    assert_eq!(pool.stats().snapshot().pages_written, 0);

    drop(pinned);
    pool.flush_file(&target).unwrap();
    assert!(!pool.is_resident(&target, PageId::new(1)));
}

#[test]
fn test_dispose_then_reallocate() {
    let (pool, files, _dir) = setup(4);
    let file = open_with_pages(&files, "dispose", 0);

    let pid = pool.alloc_page(&file).unwrap().page_id();
    let keep = pool.alloc_page(&file).unwrap().page_id();

    pool.dispose_page(&file, pid).unwrap();
    assert!(!pool.is_resident(&file, pid));

    // the disposed page number is handed out again, zeroed
    let guard = pool.alloc_page(&file).unwrap();
    assert_eq!(guard.page_id(), pid);
    assert!(guard.read().as_slice().iter().all(|&b| b == 0));
    assert_ne!(guard.page_id(), keep);
}

#[test]
fn test_flush_and_reload() {
    let dir = tempdir().unwrap();
    let data = "persistent!";
    let pid;

    {
        let files = FileManager::new(dir.path()).unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(FRAMES));
        let file = open_with_pages(&files, "reload", 0);

        let mut guard = pool.alloc_page(&file).unwrap();
        pid = guard.page_id();
        copy_string(guard.write().as_mut_slice(), data);
        drop(guard);

        pool.flush_all_pages().unwrap();
    }

    {
        let files = FileManager::new(dir.path()).unwrap();
        let pool = BufferPool::new(BufferPoolConfig::default().with_pool_size(FRAMES));
        let file = files.open_file("reload").unwrap();

        let guard = pool.fetch_page(&file, pid).unwrap();
        assert_eq!(read_string(guard.read().as_slice()), data);
    }
}

#[test]
fn test_concurrent_writers() {
    let (pool, files, _dir) = setup(FRAMES);
    let file = open_with_pages(&files, "threads", 0);
    let pool = Arc::new(pool);

    let page_ids: Vec<PageId> = (0..5)
        .map(|_| pool.alloc_page(&file).unwrap().page_id())
        .collect();

    let mut handles = vec![];

    for (i, pid) in page_ids.iter().enumerate() {
        let pool = Arc::clone(&pool);
        let file = Arc::clone(&file);
        let pid = *pid;

        handles.push(thread::spawn(move || {
            for j in 0..50 {
                let mut guard = pool.fetch_page(&file, pid).unwrap();
                guard.write().as_mut_slice()[0] = ((i * 50 + j) % 256) as u8;
            }
        }));
    }

    for h in handles {
        h.join().unwrap();
    }

    for (i, &pid) in page_ids.iter().enumerate() {
        let guard = pool.fetch_page(&file, pid).unwrap();
        assert_eq!(guard.read().as_slice()[0], ((i * 50 + 49) % 256) as u8);
        assert_eq!(pool.pin_count(&file, pid), Some(1));
    }
}
