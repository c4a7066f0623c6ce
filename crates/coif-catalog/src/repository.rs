//! Load-once catalog repository.

use crate::schema::reconcile_all;
use crate::source::{read_source, CatalogError, CatalogSource};
use coif_core::record::HairstyleRecord;
use tokio::sync::OnceCell;

/// Hairstyle catalog, read from its source on first use and shared
/// immutably afterwards.
///
/// Concurrent first loads are serialized by the cache cell: one caller reads
/// the source while the others wait for its result. A failed load is not
/// cached, so the next call tries again.
pub struct CatalogRepository {
    source: Option<CatalogSource>,
    cache: OnceCell<Vec<HairstyleRecord>>,
}

impl CatalogRepository {
    pub fn new(source: CatalogSource) -> Self {
        Self {
            source: Some(source),
            cache: OnceCell::new(),
        }
    }

    /// Repository over records already in memory.
    pub fn from_records(records: Vec<HairstyleRecord>) -> Self {
        Self {
            source: None,
            cache: OnceCell::new_with(Some(records)),
        }
    }

    pub fn source(&self) -> Option<&CatalogSource> {
        self.source.as_ref()
    }

    /// The catalog, loading it on first call. An unavailable source yields an
    /// empty slice.
    pub async fn load(&self) -> &[HairstyleRecord] {
        match self.try_load().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "hairstyle catalog unavailable, serving empty catalog");
                &[]
            }
        }
    }

    /// Like [`load`](Self::load) but reports why the source could not be read.
    pub async fn try_load(&self) -> Result<&[HairstyleRecord], CatalogError> {
        let records = self
            .cache
            .get_or_try_init(|| async {
                let Some(source) = &self.source else {
                    return Ok(Vec::new());
                };
                let entries = read_source(source).await?;
                let records = reconcile_all(&entries);
                tracing::info!(
                    path = %source.path().display(),
                    records = records.len(),
                    "hairstyle catalog loaded"
                );
                Ok::<_, CatalogError>(records)
            })
            .await?;
        Ok(records.as_slice())
    }

    /// The catalog if it has been loaded.
    pub fn cached(&self) -> Option<&[HairstyleRecord]> {
        self.cache.get().map(Vec::as_slice)
    }
}
