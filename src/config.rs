use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const MAX_COLUMNS: u16 = 6;

pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub export_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    pub fn new(config_override: Option<PathBuf>) -> Result<Self> {
        let config_file = match config_override {
            Some(path) => path,
            None => {
                let home = dirs::home_dir().context("Unable to determine home directory")?;
                home.join(".local/vitrine").join("config.json")
            }
        };
        let config_dir = config_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Unable to create {}", config_dir.display()))?;
        Ok(Self {
            export_file: config_dir.join("export.json"),
            log_file: config_dir.join("vitrine.log"),
            config_file,
            config_dir,
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSettings {
    /// Base URL (`http`/`https`) or local directory of the static site.
    pub source: String,
    pub catalog_path: String,
    pub image_dir: String,
    pub image_formats: Vec<String>,
    pub placeholder: String,
    /// Prefix used when an exported product has no image base name.
    pub image_prefix: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            source: "./site".into(),
            catalog_path: "produtos.json".into(),
            image_dir: "images/".into(),
            image_formats: vec!["jpg".into(), "jpeg".into(), "png".into(), "webp".into()],
            placeholder: "images/placeholder.jpg".into(),
            image_prefix: "bolsa".into(),
        }
    }
}

impl CatalogSettings {
    pub fn image_path(&self, base_name: &str, extension: &str) -> String {
        let dir = self.image_dir.trim_end_matches('/');
        if dir.is_empty() {
            format!("{base_name}.{extension}")
        } else {
            format!("{dir}/{base_name}.{extension}")
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactSettings {
    pub whatsapp_number: String,
    pub instagram_user: String,
    pub email: String,
}

impl ContactSettings {
    pub fn instagram_direct_url(&self) -> String {
        format!("https://ig.me/m/{}", self.instagram_user.trim_start_matches('@'))
    }

    pub fn whatsapp_base_url(&self) -> String {
        let digits: String = self
            .whatsapp_number
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        format!("https://wa.me/{digits}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CategoryLabel {
    pub code: String,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct AppSettings {
    pub title: Option<String>,
    pub columns: Option<u16>,
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub contact: ContactSettings,
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryLabel>,
    #[serde(default)]
    pub app_settings: AppSettings,
}

fn default_categories() -> Vec<CategoryLabel> {
    [
        ("pequenas", "Bolsas Pequenas"),
        ("medias", "Bolsas Médias"),
        ("grandes", "Bolsas Grandes"),
    ]
    .iter()
    .map(|(code, label)| CategoryLabel {
        code: (*code).into(),
        label: (*label).into(),
    })
    .collect()
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let data = fs::read_to_string(path)
                .with_context(|| format!("Unable to read {}", path.display()))?;
            let parsed: AppConfig = serde_json::from_str(&data)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?;
            Ok(parsed)
        } else {
            let default = Self::default_data();
            default.save(path)?;
            Ok(default)
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn default_data() -> Self {
        AppConfig {
            catalog: CatalogSettings::default(),
            contact: ContactSettings {
                whatsapp_number: "5511999999999".into(),
                instagram_user: "leme.croche".into(),
                email: "contato@lemecroche.com".into(),
            },
            categories: default_categories(),
            app_settings: AppSettings {
                title: Some("Leme Crochê - Bolsas Artesanais".into()),
                columns: Some(3),
                theme: Some("nord".into()),
            },
        }
    }

    pub fn title(&self) -> String {
        self.app_settings
            .title
            .clone()
            .unwrap_or_else(|| "Vitrine".into())
    }

    pub fn column_count(&self) -> u16 {
        self.app_settings.columns.unwrap_or(3).clamp(1, MAX_COLUMNS)
    }

    /// Display label for a category code; unknown codes are shown raw.
    pub fn category_label<'a>(&'a self, code: &'a str) -> &'a str {
        self.categories
            .iter()
            .find(|category| category.code == code)
            .map(|category| category.label.as_str())
            .unwrap_or(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_writes_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig::load(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.categories.len(), 3);
        assert_eq!(config.contact.instagram_user, "leme.croche");
        assert_eq!(config.catalog.source, "./site");
        assert_eq!(config.title(), "Leme Crochê - Bolsas Artesanais");

        let reloaded = AppConfig::load(&path).unwrap();
        assert_eq!(reloaded.catalog, config.catalog);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "appSettings": { "columns": 12 } }"#).unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.column_count(), MAX_COLUMNS);
        assert_eq!(config.catalog.image_formats, vec!["jpg", "jpeg", "png", "webp"]);
        assert_eq!(config.category_label("medias"), "Bolsas Médias");
    }

    #[test]
    fn partial_blocks_keep_their_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "catalog": { "source": "https://shop.example/" },
                "contact": { "instagramUser": "loja" }
            }"#,
        )
        .unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.catalog.source, "https://shop.example/");
        assert_eq!(config.catalog.catalog_path, "produtos.json");
        assert_eq!(config.catalog.image_prefix, "bolsa");
        assert_eq!(config.contact.instagram_user, "loja");
        assert_eq!(config.contact.whatsapp_number, "");
    }

    #[test]
    fn unknown_category_uses_raw_code() {
        let config = AppConfig::default_data();
        assert_eq!(config.category_label("carteiras"), "carteiras");
        assert_eq!(config.category_label("Medias"), "Medias");
    }

    #[test]
    fn image_path_tolerates_trailing_slash() {
        let mut settings = CatalogSettings::default();
        assert_eq!(settings.image_path("bolsa01", "png"), "images/bolsa01.png");
        settings.image_dir = "assets/img".into();
        assert_eq!(settings.image_path("bolsa01", "jpg"), "assets/img/bolsa01.jpg");
        settings.image_dir = String::new();
        assert_eq!(settings.image_path("bolsa01", "jpg"), "bolsa01.jpg");
    }

    #[test]
    fn contact_links_come_from_settings() {
        let contact = ContactSettings {
            whatsapp_number: "+55 (11) 99999-9999".into(),
            instagram_user: "@leme.croche".into(),
            email: String::new(),
        };
        assert_eq!(contact.instagram_direct_url(), "https://ig.me/m/leme.croche");
        assert_eq!(contact.whatsapp_base_url(), "https://wa.me/5511999999999");
    }
}
