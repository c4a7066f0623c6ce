//! coif-catalog: Hairstyle catalog loading.
//!
//! Reads unified or partitioned JSON catalogs, reconciles their field
//! aliases into canonical [`HairstyleRecord`](coif_core::HairstyleRecord)s
//! and caches the result for the life of the repository.

pub mod repository;
pub mod schema;
pub mod source;

pub use repository::CatalogRepository;
pub use source::{CatalogError, CatalogSource};
