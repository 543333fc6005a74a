use crate::config::AppConfig;
use crate::model::Product;

/// Everything the detail overlay shows for one product.
#[derive(Clone, Debug, PartialEq)]
pub struct ModalContent {
    pub product_id: u64,
    pub title: String,
    pub category_label: String,
    pub price: String,
    pub description: String,
    pub image_path: String,
    pub image_found: bool,
    pub colors: Vec<String>,
    pub contact_link: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DismissTrigger {
    CloseControl,
    Backdrop,
    CancelKey,
}

/// The single product detail overlay. Opening while open replaces the
/// content; there is never more than one product on screen.
#[derive(Default)]
pub struct ProductModal {
    content: Option<ModalContent>,
    scroll_locked: bool,
}

impl ProductModal {
    pub fn open(&mut self, product: &Product, config: &AppConfig) {
        self.content = Some(ModalContent {
            product_id: product.id,
            title: product.name.clone(),
            category_label: config.category_label(&product.category).to_string(),
            price: product.price.clone(),
            description: product.description.clone(),
            image_path: product.image_path.clone(),
            image_found: product.image_found,
            colors: product.colors.clone(),
            contact_link: config.contact.instagram_direct_url(),
        });
        self.scroll_locked = true;
    }

    pub fn close(&mut self) {
        self.content = None;
        self.scroll_locked = false;
    }

    /// Every dismissal path ends in `close`; all of them are no-ops while
    /// the overlay is closed.
    pub fn dismiss(&mut self, trigger: DismissTrigger) {
        if !self.is_open() {
            return;
        }
        tracing::debug!(?trigger, "modal dismissed");
        self.close();
    }

    pub fn is_open(&self) -> bool {
        self.content.is_some()
    }

    pub fn content(&self) -> Option<&ModalContent> {
        self.content.as_ref()
    }

    pub fn scroll_locked(&self) -> bool {
        self.scroll_locked
    }
}
