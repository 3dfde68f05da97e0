//! Configuration constants and buffer pool settings.

/// Size of a page in bytes (4KB).
///
/// Every page on disk and every frame in the buffer pool is exactly this
/// large. Header pages and data pages share the size; nothing in the engine
/// supports mixing page sizes.
///
/// # Memory Layout
/// Page numbers are persisted as `i32` with `-1` as the "no page" marker, so
/// a file can address up to 2^31 - 1 pages (8TB at 4KB).
pub const PAGE_SIZE: usize = 4096;

/// Maximum length of a heap file name in bytes.
///
/// The header page reserves exactly this many bytes for the name.
pub const MAX_NAME_SIZE: usize = 50;

/// Number of frames used by [`BufferPoolConfig::default`].
pub const DEFAULT_POOL_SIZE: usize = 128;

/// Page index capacity relative to the number of frames.
pub const DEFAULT_INDEX_LOAD_FACTOR: f64 = 1.2;

/// Settings for a [`BufferPool`](crate::buffer::BufferPool).
///
/// # Example
/// ```
/// use heapdb::common::config::BufferPoolConfig;
///
/// let config = BufferPoolConfig::default()
///     .with_pool_size(16)
///     .with_index_load_factor(2.0);
/// assert_eq!(config.pool_size, 16);
/// assert_eq!(config.index_capacity(), 33);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferPoolConfig {
    /// Number of frames in the pool.
    pub pool_size: usize,
    /// Page index slots reserved per frame.
    pub index_load_factor: f64,
}

impl BufferPoolConfig {
    /// Set the number of frames.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the page index load factor.
    pub fn with_index_load_factor(mut self, load_factor: f64) -> Self {
        self.index_load_factor = load_factor;
        self
    }

    /// Number of entries the page index is pre-sized for.
    ///
    /// One more than `pool_size * index_load_factor`, rounded up, so the
    /// index never rehashes while the pool is full.
    pub fn index_capacity(&self) -> usize {
        (self.pool_size as f64 * self.index_load_factor).ceil() as usize + 1
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            index_load_factor: DEFAULT_INDEX_LOAD_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(PAGE_SIZE.is_power_of_two());
        assert_eq!(PAGE_SIZE, 4096);
    }

    #[test]
    fn test_default_config() {
        let config = BufferPoolConfig::default();
        assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.index_load_factor, DEFAULT_INDEX_LOAD_FACTOR);
    }

    #[test]
    fn test_index_capacity() {
        let config = BufferPoolConfig::default().with_pool_size(10);
        // 10 * 1.2 = 12, plus one spare slot
        assert_eq!(config.index_capacity(), 13);

        let config = config.with_index_load_factor(1.0);
        assert_eq!(config.index_capacity(), 11);
    }
}
