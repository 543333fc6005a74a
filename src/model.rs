use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::config::CatalogSettings;

/// Largest id kept from a catalog document: the largest integer a JSON
/// number holds exactly. Larger ids are reassigned on load.
pub const MAX_PRODUCT_ID: u64 = (1 << 53) - 1;

/// The catalog document as published next to the site.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct CatalogDocument {
    #[serde(default, alias = "produtos")]
    pub products: Vec<ProductRecord>,
}

/// One product entry as it appears in the catalog document and in exports.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(
        default,
        deserialize_with = "lenient_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<u64>,
    #[serde(default, alias = "nome")]
    pub name: String,
    #[serde(default, alias = "categoria")]
    pub category: String,
    #[serde(default, alias = "preco")]
    pub price: String,
    #[serde(default, alias = "descricao")]
    pub description: String,
    #[serde(default, alias = "imagemBase", skip_serializing_if = "Option::is_none")]
    pub image_base_name: Option<String>,
    #[serde(default, alias = "cores")]
    pub colors: Vec<String>,
}

/// Accepts any JSON value for an id. Whole positive numbers (`2` or `2.0`)
/// and numeric strings are kept; anything else reads as no id, so one odd
/// entry never rejects the whole document.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= MAX_PRODUCT_ID as f64)
                .map(|f| f as u64)
        }),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Outcome of probing the candidate image paths for one base name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageResolution {
    Found(String),
    /// No candidate answered. `probe_errors` counts candidates whose probe
    /// failed outright rather than reporting a missing file.
    NotFound { probe_errors: usize },
}

impl ImageResolution {
    pub fn is_found(&self) -> bool {
        matches!(self, ImageResolution::Found(_))
    }

    pub fn path_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        match self {
            ImageResolution::Found(path) => path,
            ImageResolution::NotFound { .. } => placeholder,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub price: String,
    pub description: String,
    pub image_base_name: Option<String>,
    pub image_path: String,
    pub image_found: bool,
    pub colors: Vec<String>,
}

impl Product {
    pub fn from_record(
        id: u64,
        record: ProductRecord,
        resolution: &ImageResolution,
        placeholder: &str,
    ) -> Self {
        Product {
            id,
            name: record.name,
            category: record.category,
            price: record.price,
            description: record.description,
            image_base_name: record.image_base_name,
            image_path: resolution.path_or(placeholder).to_string(),
            image_found: resolution.is_found(),
            colors: record.colors,
        }
    }

    /// Converts back to the document shape. A missing base name is derived
    /// from the id, e.g. `bolsa07`.
    pub fn to_record(&self, image_prefix: &str) -> ProductRecord {
        ProductRecord {
            id: Some(self.id),
            name: self.name.clone(),
            category: self.category.clone(),
            price: self.price.clone(),
            description: self.description.clone(),
            image_base_name: Some(
                self.image_base_name
                    .clone()
                    .unwrap_or_else(|| format!("{image_prefix}{:02}", self.id)),
            ),
            colors: self.colors.clone(),
        }
    }
}

/// The single product shown when the catalog document cannot be loaded.
pub fn fallback_products(settings: &CatalogSettings) -> Vec<Product> {
    vec![Product {
        id: 1,
        name: "Bolsa Artesanal".into(),
        category: "medias".into(),
        price: "R$ 65,00".into(),
        description: "Bolsa artesanal feita em crochê com muito carinho e dedicação.".into(),
        image_base_name: Some("bolsa01".into()),
        image_path: settings.image_path("bolsa01", "png"),
        image_found: true,
        colors: vec!["Variadas".into()],
    }]
}

/// Next free id: one past the largest id, or 1 for an empty collection.
/// When the largest id has no successor the lowest unused id is taken.
pub fn next_product_id(products: &[Product]) -> u64 {
    let max = products.iter().map(|p| p.id).max().unwrap_or(0);
    max.checked_add(1).unwrap_or_else(|| {
        let used: HashSet<u64> = products.iter().map(|p| p.id).collect();
        (1..).find(|id| !used.contains(id)).unwrap_or(max)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_accepts_legacy_keys() {
        let json = r#"{
            "produtos": [
                { "id": 3, "nome": "Bolsa Praia", "categoria": "grandes", "preco": "R$ 120,00",
                  "descricao": "Grande", "imagemBase": "bolsa03", "cores": ["Azul", "Branco"] }
            ]
        }"#;
        let doc: CatalogDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.products.len(), 1);
        let record = &doc.products[0];
        assert_eq!(record.id, Some(3));
        assert_eq!(record.name, "Bolsa Praia");
        assert_eq!(record.image_base_name.as_deref(), Some("bolsa03"));
        assert_eq!(record.colors, vec!["Azul", "Branco"]);
    }

    #[test]
    fn missing_products_field_is_empty() {
        let doc: CatalogDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.products.is_empty());
    }

    #[test]
    fn record_serializes_with_camel_case_base_name() {
        let record = ProductRecord {
            id: Some(2),
            name: "Mini".into(),
            image_base_name: Some("bolsa02".into()),
            ..ProductRecord::default()
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["imageBaseName"], "bolsa02");
        assert!(value.get("image_base_name").is_none());
    }

    #[test]
    fn placeholder_resolution_is_not_found() {
        let record = ProductRecord {
            name: "Sem foto".into(),
            ..ProductRecord::default()
        };
        let resolution = ImageResolution::NotFound { probe_errors: 2 };
        let product = Product::from_record(4, record, &resolution, "images/placeholder.jpg");
        assert_eq!(product.image_path, "images/placeholder.jpg");
        assert!(!product.image_found);
    }

    #[test]
    fn export_derives_missing_base_name_from_id() {
        let resolution = ImageResolution::NotFound { probe_errors: 0 };
        let product = Product::from_record(7, ProductRecord::default(), &resolution, "p.jpg");
        let record = product.to_record("bolsa");
        assert_eq!(record.image_base_name.as_deref(), Some("bolsa07"));
        assert_eq!(record.id, Some(7));
    }

    #[test]
    fn next_id_follows_maximum() {
        assert_eq!(next_product_id(&[]), 1);
        let settings = CatalogSettings::default();
        let mut products = fallback_products(&settings);
        products[0].id = 7;
        assert_eq!(next_product_id(&products), 8);
    }

    #[test]
    fn next_id_never_overflows() {
        let settings = CatalogSettings::default();
        let mut products = fallback_products(&settings);
        products.extend(fallback_products(&settings));
        products[1].id = u64::MAX;
        assert_eq!(next_product_id(&products), 2);
    }

    #[test]
    fn ids_are_read_leniently() {
        let json = r#"{"products": [
            {"id": 2.0}, {"id": -3}, {"id": 1.5}, {"id": "7"}, {"id": null},
            {"id": "abc"}, {"id": [1]}, {"id": 18446744073709551615}
        ]}"#;
        let doc: CatalogDocument = serde_json::from_str(json).unwrap();
        let ids: Vec<Option<u64>> = doc.products.iter().map(|p| p.id).collect();
        assert_eq!(
            ids,
            vec![Some(2), None, None, Some(7), None, None, None, Some(u64::MAX)]
        );
    }
}
