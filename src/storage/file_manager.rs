//! File Manager - the directory of paged files.
//!
//! The [`FileManager`] creates, opens, closes and destroys the files that
//! heap files live in. It keeps a table of open files so that every opener of
//! the same name shares one [`FileRef`] and therefore one set of frames in
//! the buffer pool.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::common::config::MAX_NAME_SIZE;
use crate::common::{Error, FileId, Result};
use crate::storage::disk_file::DiskFile;
use crate::storage::paged_file::{FileRef, PagedFile};

struct OpenFile {
    file: FileRef,
    open_count: usize,
}

struct OpenTable {
    files: HashMap<String, OpenFile>,
    next_id: u32,
}

/// Manages the files under one root directory.
///
/// # Example
/// ```no_run
/// use heapdb::storage::FileManager;
///
/// let files = FileManager::new("/tmp/heapdb").unwrap();
/// files.create_file("emp").unwrap();
/// let file = files.open_file("emp").unwrap();
/// let page_id = file.allocate_page().unwrap();
/// files.close_file(&file).unwrap();
/// ```
pub struct FileManager {
    root: PathBuf,
    open: Mutex<OpenTable>,
}

impl FileManager {
    /// Use `root` as the database directory, creating it if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
            open: Mutex::new(OpenTable {
                files: HashMap::new(),
                next_id: 0,
            }),
        })
    }

    /// Whether a file with this name exists on disk.
    pub fn exists(&self, name: &str) -> bool {
        validate_name(name).is_ok() && self.path_for(name).exists()
    }

    /// Create an empty file.
    ///
    /// # Errors
    /// - `Error::AlreadyExists` if the name is taken
    /// - `Error::InvalidFileName` for empty, overlong or path-like names
    pub fn create_file(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.path_for(name).exists() {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        DiskFile::create(self.path_for(name))?;
        debug!("created file {:?}", name);
        Ok(())
    }

    /// Open a file, or share the handle if it is already open.
    ///
    /// # Errors
    /// Returns `Error::FileNotFound` if the file doesn't exist.
    pub fn open_file(&self, name: &str) -> Result<FileRef> {
        validate_name(name)?;
        let mut open = self.open.lock();

        if let Some(entry) = open.files.get_mut(name) {
            entry.open_count += 1;
            return Ok(Arc::clone(&entry.file));
        }

        let path = self.path_for(name);
        if !path.exists() {
            return Err(Error::FileNotFound(name.to_string()));
        }
        let disk = DiskFile::open(path)?;

        let id = FileId(open.next_id);
        open.next_id += 1;
        let file = Arc::new(PagedFile::new(id, name, disk));
        open.files.insert(
            name.to_string(),
            OpenFile {
                file: Arc::clone(&file),
                open_count: 1,
            },
        );
        debug!("opened file {:?} as {}", name, id);

        Ok(file)
    }

    /// Drop one open of `file`.
    ///
    /// Returns `true` when that was the last open handle; the caller should
    /// then flush the file's pages out of the buffer pool.
    ///
    /// # Errors
    /// Returns `Error::FileNotFound` if the file is not open.
    pub fn close_file(&self, file: &FileRef) -> Result<bool> {
        let mut open = self.open.lock();

        let entry = match open.files.get_mut(file.name()) {
            Some(entry) if Arc::ptr_eq(&entry.file, file) => entry,
            _ => return Err(Error::FileNotFound(file.name().to_string())),
        };

        entry.open_count -= 1;
        if entry.open_count > 0 {
            return Ok(false);
        }

        open.files.remove(file.name());
        debug!("closed file {:?} ({})", file.name(), file.id());
        Ok(true)
    }

    /// Whether the file is currently open.
    pub fn is_open(&self, name: &str) -> bool {
        self.open.lock().files.contains_key(name)
    }

    /// Delete a file from disk.
    ///
    /// # Errors
    /// - `Error::FileOpen` if the file is still open
    /// - `Error::FileNotFound` if the file doesn't exist
    pub fn destroy_file(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.is_open(name) {
            return Err(Error::FileOpen(name.to_string()));
        }
        let path = self.path_for(name);
        if !path.exists() {
            return Err(Error::FileNotFound(name.to_string()));
        }
        std::fs::remove_file(path)?;
        debug!("destroyed file {:?}", name);
        Ok(())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.len() > MAX_NAME_SIZE
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(Error::InvalidFileName(name.to_string()));
    }
    Ok(())
}
