//! Page types and layouts.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container
//! - [`FileHeader`] - The first page of every heap file
//! - [`DataPage`] - The slotted layout of every data page

mod data_page;
mod header_page;
#[allow(clippy::module_inception)]
mod page;

pub use data_page::DataPage;
pub use header_page::FileHeader;
pub use page::Page;
