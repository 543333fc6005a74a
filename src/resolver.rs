use tracing::debug;

use crate::config::CatalogSettings;
use crate::model::ImageResolution;
use crate::source::AssetSource;

/// Finds the image file for a product base name by probing each configured
/// extension in order.
pub struct ImageResolver<'a> {
    source: &'a dyn AssetSource,
    settings: &'a CatalogSettings,
}

impl<'a> ImageResolver<'a> {
    pub fn new(source: &'a dyn AssetSource, settings: &'a CatalogSettings) -> Self {
        Self { source, settings }
    }

    pub fn candidates(&self, base_name: &str) -> Vec<String> {
        self.settings
            .image_formats
            .iter()
            .map(|extension| self.settings.image_path(base_name, extension))
            .collect()
    }

    /// Probes candidates one at a time and stops at the first hit, so the
    /// earliest extension in the list wins when several files exist.
    pub async fn resolve(&self, base_name: &str) -> ImageResolution {
        let mut probe_errors = 0;
        for candidate in self.candidates(base_name) {
            match self.source.exists(&candidate).await {
                Ok(true) => return ImageResolution::Found(candidate),
                Ok(false) => {}
                Err(err) => {
                    debug!(candidate = %candidate, error = %err, "image probe failed");
                    probe_errors += 1;
                }
            }
        }
        ImageResolution::NotFound { probe_errors }
    }

    pub fn placeholder(&self) -> &str {
        &self.settings.placeholder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fake::FakeSource;

    fn settings() -> CatalogSettings {
        CatalogSettings::default()
    }

    #[tokio::test]
    async fn first_extension_in_priority_order_wins() {
        // webp answers instantly, png slowly; png still wins.
        let source = FakeSource::new()
            .with_existing("images/bolsa01.png")
            .with_existing("images/bolsa01.webp")
            .with_delay("images/bolsa01.png", 30);
        let settings = settings();
        let resolver = ImageResolver::new(&source, &settings);

        let resolution = resolver.resolve("bolsa01").await;

        assert_eq!(
            resolution,
            ImageResolution::Found("images/bolsa01.png".into())
        );
        assert_eq!(
            source.probes(),
            vec![
                "images/bolsa01.jpg",
                "images/bolsa01.jpeg",
                "images/bolsa01.png"
            ]
        );
    }

    #[tokio::test]
    async fn missing_everywhere_yields_placeholder() {
        let source = FakeSource::new();
        let settings = settings();
        let resolver = ImageResolver::new(&source, &settings);

        let resolution = resolver.resolve("bolsa99").await;

        assert_eq!(resolution, ImageResolution::NotFound { probe_errors: 0 });
        assert_eq!(
            resolution.path_or(resolver.placeholder()),
            "images/placeholder.jpg"
        );
        assert_eq!(source.probes().len(), 4);
    }

    #[tokio::test]
    async fn probe_errors_fall_through_to_next_candidate() {
        let source = FakeSource::new()
            .with_failing("images/bolsa02.jpg")
            .with_existing("images/bolsa02.jpeg");
        let settings = settings();
        let resolver = ImageResolver::new(&source, &settings);

        let resolution = resolver.resolve("bolsa02").await;

        assert_eq!(
            resolution,
            ImageResolution::Found("images/bolsa02.jpeg".into())
        );
    }

    #[tokio::test]
    async fn offline_source_counts_every_failed_probe() {
        let source = FakeSource::offline();
        let settings = settings();
        let resolver = ImageResolver::new(&source, &settings);

        let resolution = resolver.resolve("bolsa03").await;

        assert_eq!(resolution, ImageResolution::NotFound { probe_errors: 4 });
        assert!(!resolution.is_found());
    }
}
