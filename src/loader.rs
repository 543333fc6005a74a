use std::collections::HashSet;

use futures::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::CatalogSettings;
use crate::model::{
    fallback_products, CatalogDocument, ImageResolution, Product, ProductRecord, MAX_PRODUCT_ID,
};
use crate::resolver::ImageResolver;
use crate::source::{AssetSource, SourceError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("catalog document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub struct CatalogLoader<'a> {
    source: &'a dyn AssetSource,
    settings: &'a CatalogSettings,
}

impl<'a> CatalogLoader<'a> {
    pub fn new(source: &'a dyn AssetSource, settings: &'a CatalogSettings) -> Self {
        Self { source, settings }
    }

    /// Loads the catalog, degrading to the fallback product on any fetch or
    /// parse failure.
    pub async fn load(&self) -> Vec<Product> {
        match self.try_load().await {
            Ok(products) => products,
            Err(err) => {
                warn!(source = %self.source.describe(), error = %err, "catalog load failed, using fallback products");
                fallback_products(self.settings)
            }
        }
    }

    /// Loads the catalog and reports failures instead of substituting the
    /// fallback.
    pub async fn try_load(&self) -> Result<Vec<Product>, LoadError> {
        let body = self.source.fetch_text(&self.settings.catalog_path).await?;
        let document: CatalogDocument = serde_json::from_str(&body)?;
        let records = assign_ids(document.products);
        let products = self.enrich(records).await;
        info!(
            source = %self.source.describe(),
            count = products.len(),
            "catalog loaded"
        );
        Ok(products)
    }

    /// Resolves images for every record concurrently. `join_all` keeps the
    /// output in input order whatever order the probes finish in.
    pub async fn enrich(&self, records: Vec<(u64, ProductRecord)>) -> Vec<Product> {
        let resolver = ImageResolver::new(self.source, self.settings);
        let resolutions = join_all(records.iter().map(|(_, record)| {
            let resolver = &resolver;
            async move {
                match record.image_base_name.as_deref() {
                    Some(base) if !base.trim().is_empty() => resolver.resolve(base.trim()).await,
                    _ => ImageResolution::NotFound { probe_errors: 0 },
                }
            }
        }))
        .await;

        records
            .into_iter()
            .zip(resolutions)
            .map(|((id, record), resolution)| {
                Product::from_record(id, record, &resolution, resolver.placeholder())
            })
            .collect()
    }
}

/// Keeps document ids where they are usable. Entries without an id, with
/// id 0, above `MAX_PRODUCT_ID`, or repeating an earlier id get the next
/// free one.
fn assign_ids(records: Vec<ProductRecord>) -> Vec<(u64, ProductRecord)> {
    let usable = |id: u64| (1..=MAX_PRODUCT_ID).contains(&id);
    let mut next = records
        .iter()
        .filter_map(|record| record.id)
        .filter(|id| usable(*id))
        .max()
        .unwrap_or(0)
        + 1;
    let mut seen = HashSet::new();
    records
        .into_iter()
        .map(|record| {
            let id = match record.id {
                Some(id) if usable(id) && seen.insert(id) => id,
                other => {
                    let assigned = next;
                    next += 1;
                    seen.insert(assigned);
                    if let Some(original) = other {
                        warn!(original, assigned, name = %record.name, "reassigned unusable product id");
                    }
                    assigned
                }
            };
            (id, record)
        })
        .collect()
}
