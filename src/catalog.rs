//! The catalog controller.
//!
//! `Catalog` owns the full product collection, the active category filter
//! and the filtered view derived from them. It is also the maintenance
//! surface: add a product, reload from the source, export the collection.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::CatalogSettings;
use crate::loader::{CatalogLoader, LoadError};
use crate::model::{next_product_id, Product, ProductRecord};
use crate::source::AssetSource;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Category(String),
}

impl CategoryFilter {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(code) => product.category == *code,
        }
    }
}

/// Input for a product added at runtime. The id is always assigned by the
/// catalog.
#[derive(Clone, Debug, Default)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,
    pub image_base_name: String,
    pub colors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogExport {
    pub products: Vec<ProductRecord>,
    pub configuration: CatalogSettings,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugSummary {
    pub total: usize,
    pub filtered: usize,
    pub filter: CategoryFilter,
    pub source: String,
    pub images_found: usize,
    pub placeholders: usize,
}

pub struct Catalog {
    source: Arc<dyn AssetSource>,
    settings: CatalogSettings,
    products: Vec<Product>,
    filter: CategoryFilter,
    filtered: Vec<usize>,
}

impl Catalog {
    pub fn from_products(
        source: Arc<dyn AssetSource>,
        settings: CatalogSettings,
        products: Vec<Product>,
    ) -> Self {
        let mut catalog = Catalog {
            source,
            settings,
            products,
            filter: CategoryFilter::All,
            filtered: Vec::new(),
        };
        catalog.refilter();
        catalog
    }

    /// Initial load. Never fails: an unreachable catalog becomes the
    /// fallback product.
    pub async fn load(source: Arc<dyn AssetSource>, settings: CatalogSettings) -> Self {
        let products = CatalogLoader::new(source.as_ref(), &settings).load().await;
        Self::from_products(source, settings, products)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Replaces the filtered view; filters never stack.
    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
        self.refilter();
    }

    pub fn filtered_view(&self) -> impl Iterator<Item = &Product> + '_ {
        self.filtered.iter().map(move |&index| &self.products[index])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn product(&self, id: u64) -> Option<&Product> {
        self.products.iter().find(|product| product.id == id)
    }

    fn refilter(&mut self) {
        self.filtered = self
            .products
            .iter()
            .enumerate()
            .filter(|(_, product)| self.filter.matches(product))
            .map(|(index, _)| index)
            .collect();
    }

    /// Appends a product with the next free id after resolving its image.
    pub async fn add_product(&mut self, new: NewProduct) -> Product {
        let id = next_product_id(&self.products);
        let record = ProductRecord {
            id: Some(id),
            name: new.name,
            category: new.category,
            price: new.price,
            description: new.description,
            image_base_name: Some(new.image_base_name),
            colors: new.colors,
        };
        let loader = CatalogLoader::new(self.source.as_ref(), &self.settings);
        let mut enriched = loader.enrich(vec![(id, record)]).await;
        let product = enriched.remove(0);
        info!(
            id = product.id,
            name = %product.name,
            image = %product.image_path,
            image_found = product.image_found,
            "product added"
        );
        self.products.push(product.clone());
        self.refilter();
        product
    }

    /// Re-reads the catalog from the source. The current collection is
    /// replaced only when the fetch succeeds; on failure it is kept as is.
    pub async fn reload(&mut self) -> Result<usize, LoadError> {
        let loader = CatalogLoader::new(self.source.as_ref(), &self.settings);
        match loader.try_load().await {
            Ok(products) => {
                self.products = products;
                self.refilter();
                info!(count = self.products.len(), "catalog reloaded");
                Ok(self.products.len())
            }
            Err(err) => {
                warn!(error = %err, "reload failed, keeping current catalog");
                Err(err)
            }
        }
    }

    pub fn export(&self) -> CatalogExport {
        CatalogExport {
            products: self
                .products
                .iter()
                .map(|product| product.to_record(&self.settings.image_prefix))
                .collect(),
            configuration: self.settings.clone(),
        }
    }

    pub fn debug_summary(&self) -> DebugSummary {
        let images_found = self.products.iter().filter(|p| p.image_found).count();
        DebugSummary {
            total: self.products.len(),
            filtered: self.filtered.len(),
            filter: self.filter.clone(),
            source: self.source.describe(),
            images_found,
            placeholders: self.products.len() - images_found,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::model::ImageResolution;
    use crate::source::fake::FakeSource;

    pub fn product(id: u64, name: &str, category: &str) -> Product {
        let record = ProductRecord {
            id: Some(id),
            name: name.into(),
            category: category.into(),
            price: "R$ 50,00".into(),
            description: format!("{name} feita à mão"),
            image_base_name: Some(format!("bolsa{id:02}")),
            colors: vec!["Cru".into()],
        };
        let resolution = ImageResolution::Found(format!("images/bolsa{id:02}.jpg"));
        Product::from_record(id, record, &resolution, "images/placeholder.jpg")
    }

    pub fn sample_catalog() -> Catalog {
        Catalog::from_products(
            Arc::new(FakeSource::new()),
            CatalogSettings::default(),
            vec![
                product(1, "Mini Flor", "pequenas"),
                product(2, "Tiracolo", "medias"),
                product(3, "Sacola", "grandes"),
                product(4, "Carteira", "medias"),
                product(7, "Praia", "grandes"),
            ],
        )
    }

    fn names(catalog: &Catalog) -> Vec<String> {
        catalog.filtered_view().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn category_filter_is_ordered_subsequence() {
        let mut catalog = sample_catalog();
        catalog.set_filter(CategoryFilter::Category("medias".into()));
        assert_eq!(names(&catalog), vec!["Tiracolo", "Carteira"]);

        catalog.set_filter(CategoryFilter::Category("grandes".into()));
        assert_eq!(names(&catalog), vec!["Sacola", "Praia"]);
    }

    #[test]
    fn all_filter_restores_full_collection() {
        let mut catalog = sample_catalog();
        catalog.set_filter(CategoryFilter::Category("pequenas".into()));
        catalog.set_filter(CategoryFilter::All);
        let all: Vec<String> = catalog.products().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names(&catalog), all);
    }

    #[test]
    fn filter_matches_exactly() {
        let mut catalog = sample_catalog();
        catalog.set_filter(CategoryFilter::Category("Medias".into()));
        assert_eq!(catalog.filtered_len(), 0);
        catalog.set_filter(CategoryFilter::Category("media".into()));
        assert_eq!(catalog.filtered_len(), 0);
    }

    #[test]
    fn category_named_todos_is_an_ordinary_code() {
        let mut products = sample_catalog().products().to_vec();
        products.push(product(9, "Coringa", "todos"));
        let mut catalog = Catalog::from_products(
            Arc::new(FakeSource::new()),
            CatalogSettings::default(),
            products,
        );
        catalog.set_filter(CategoryFilter::Category("todos".into()));
        assert_eq!(names(&catalog), vec!["Coringa"]);
    }

    #[tokio::test]
    async fn add_product_assigns_next_id_and_resolves_image() {
        let source = FakeSource::new().with_existing("images/bolsa08.webp");
        let mut catalog = Catalog::from_products(
            Arc::new(source),
            CatalogSettings::default(),
            sample_catalog().products().to_vec(),
        );
        catalog.set_filter(CategoryFilter::Category("medias".into()));

        let added = catalog
            .add_product(NewProduct {
                name: "Nova".into(),
                category: "medias".into(),
                price: "R$ 80,00".into(),
                description: "Nova bolsa".into(),
                image_base_name: "bolsa08".into(),
                colors: vec!["Verde".into()],
            })
            .await;

        assert_eq!(added.id, 8);
        assert_eq!(added.image_path, "images/bolsa08.webp");
        assert!(added.image_found);
        assert_eq!(catalog.products().len(), 6);
        assert_eq!(names(&catalog), vec!["Tiracolo", "Carteira", "Nova"]);
    }

    #[tokio::test]
    async fn add_to_empty_catalog_starts_at_one() {
        let mut catalog = Catalog::from_products(
            Arc::new(FakeSource::new()),
            CatalogSettings::default(),
            Vec::new(),
        );
        let added = catalog
            .add_product(NewProduct {
                name: "Primeira".into(),
                image_base_name: "bolsa01".into(),
                ..NewProduct::default()
            })
            .await;
        assert_eq!(added.id, 1);
        assert!(!added.image_found);
        assert_eq!(added.image_path, "images/placeholder.jpg");
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_collection() {
        let mut catalog = Catalog::from_products(
            Arc::new(FakeSource::offline()),
            CatalogSettings::default(),
            sample_catalog().products().to_vec(),
        );
        assert!(catalog.reload().await.is_err());
        assert_eq!(catalog.products().len(), 5);
    }

    #[tokio::test]
    async fn successful_reload_replaces_collection_and_keeps_filter() {
        let source = FakeSource::new().with_document(
            "produtos.json",
            r#"{"products": [
                {"id": 10, "name": "A", "category": "medias", "imageBaseName": "a"},
                {"id": 11, "name": "B", "category": "grandes", "imageBaseName": "b"}
            ]}"#,
        );
        let mut catalog = Catalog::from_products(
            Arc::new(source),
            CatalogSettings::default(),
            sample_catalog().products().to_vec(),
        );
        catalog.set_filter(CategoryFilter::Category("medias".into()));

        assert_eq!(catalog.reload().await.unwrap(), 2);
        assert_eq!(names(&catalog), vec!["A"]);
    }

    #[test]
    fn export_echoes_document_shape() {
        let mut products = sample_catalog().products().to_vec();
        products[0].image_base_name = None;
        let catalog = Catalog::from_products(
            Arc::new(FakeSource::new()),
            CatalogSettings::default(),
            products,
        );
        let value = serde_json::to_value(catalog.export()).unwrap();
        let exported = value["products"].as_array().unwrap();
        assert_eq!(exported.len(), 5);
        assert_eq!(exported[0]["imageBaseName"], "bolsa01");
        assert_eq!(exported[4]["id"], 7);
        assert_eq!(exported[4]["imageBaseName"], "bolsa07");
        assert_eq!(value["configuration"]["catalogPath"], "produtos.json");
    }

    #[test]
    fn debug_summary_counts_images() {
        let mut products = sample_catalog().products().to_vec();
        products[1].image_found = false;
        let mut catalog = Catalog::from_products(
            Arc::new(FakeSource::new()),
            CatalogSettings::default(),
            products,
        );
        catalog.set_filter(CategoryFilter::Category("grandes".into()));
        let summary = catalog.debug_summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.filtered, 2);
        assert_eq!(summary.images_found, 4);
        assert_eq!(summary.placeholders, 1);
        assert_eq!(summary.source, "fake");
    }
}
