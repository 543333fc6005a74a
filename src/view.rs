use ratatui::prelude::Rect;

use crate::catalog::Catalog;
use crate::config::{AppConfig, MAX_COLUMNS};

pub const CARD_HEIGHT: u16 = 7;
const EXCERPT_CHARS: usize = 80;

/// One rendered product card. Carries the product id so activating the
/// card opens exactly that product.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductCard {
    pub product_id: u64,
    pub title: String,
    pub category_label: String,
    pub price: String,
    pub excerpt: String,
    pub image_path: String,
    pub image_found: bool,
}

/// The product grid: the cards for the current filtered view plus the
/// selection cursor.
pub struct ProductGrid {
    cards: Vec<ProductCard>,
    selected: usize,
    columns: u16,
}

impl ProductGrid {
    pub fn new(columns: u16) -> Self {
        Self {
            cards: Vec::new(),
            selected: 0,
            columns: columns.clamp(1, MAX_COLUMNS),
        }
    }

    /// Throws away the previous cards and builds one per product in the
    /// filtered view, in order.
    pub fn render(&mut self, catalog: &Catalog, config: &AppConfig) {
        self.cards = catalog
            .filtered_view()
            .map(|product| ProductCard {
                product_id: product.id,
                title: product.name.clone(),
                category_label: config.category_label(&product.category).to_string(),
                price: product.price.clone(),
                excerpt: excerpt(&product.description),
                image_path: product.image_path.clone(),
                image_found: product.image_found,
            })
            .collect();
        if self.selected >= self.cards.len() {
            self.selected = self.cards.len().saturating_sub(1);
        }
    }

    pub fn cards(&self) -> &[ProductCard] {
        &self.cards
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_card(&self) -> Option<&ProductCard> {
        self.cards.get(self.selected)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.cards.len() {
            self.selected = index;
        }
    }

    pub fn reset_selection(&mut self) {
        self.selected = 0;
    }

    pub fn move_left(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.selected + 1 < self.cards.len() {
            self.selected += 1;
        }
    }

    pub fn move_up(&mut self) {
        let step = usize::from(self.columns);
        if self.selected >= step {
            self.selected -= step;
        }
    }

    pub fn move_down(&mut self) {
        let step = usize::from(self.columns);
        if self.selected + step < self.cards.len() {
            self.selected += step;
        }
    }

    /// Screen rectangles of the cards visible in `area`, scrolled so the
    /// selected card is on screen.
    pub fn card_rects(&self, area: Rect) -> Vec<(usize, Rect)> {
        if area.width == 0 || area.height < CARD_HEIGHT || self.cards.is_empty() {
            return Vec::new();
        }
        let columns = usize::from(self.columns);
        let visible_rows = usize::from(area.height / CARD_HEIGHT);
        let selected_row = self.selected / columns;
        let first_row = (selected_row + 1).saturating_sub(visible_rows);
        let column_width = area.width / self.columns;

        (0..self.cards.len())
            .filter_map(|index| {
                let row = index / columns;
                if row < first_row || row >= first_row + visible_rows {
                    return None;
                }
                let column = (index % columns) as u16;
                let x = area.x + column * column_width;
                let width = if usize::from(column) + 1 == columns {
                    area.width - column * column_width
                } else {
                    column_width
                };
                let y = area.y + (row - first_row) as u16 * CARD_HEIGHT;
                Some((index, Rect::new(x, y, width, CARD_HEIGHT)))
            })
            .collect()
    }

    pub fn card_at(&self, column: u16, row: u16, area: Rect) -> Option<usize> {
        self.card_rects(area)
            .into_iter()
            .find(|(_, rect)| {
                column >= rect.x
                    && column < rect.x + rect.width
                    && row >= rect.y
                    && row < rect.y + rect.height
            })
            .map(|(index, _)| index)
    }
}

fn excerpt(description: &str) -> String {
    let trimmed = description.trim();
    if trimmed.chars().count() <= EXCERPT_CHARS {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}
