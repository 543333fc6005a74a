use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::prelude::Rect;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use crate::catalog::{Catalog, CategoryFilter, NewProduct};
use crate::config::{AppConfig, AppPaths, ContactSettings};
use crate::contact::{ContactSubmission, Notification};
use crate::form::{FormField, FormKeyResult, FormKind, FormState};
use crate::modal::{DismissTrigger, ProductModal};
use crate::theme::{Theme, DEFAULT_THEME};
use crate::ui;
use crate::view::ProductGrid;

pub enum PopupState {
    Form(FormState),
    Message { title: String, body: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShortcutAction {
    Quit,
    Open,
    Reload,
    NewProduct,
    Contact,
    Settings,
    Export,
    Debug,
}

#[derive(Clone, Debug)]
pub struct FilterOption {
    pub filter: CategoryFilter,
    pub label: String,
}

pub struct AppState {
    pub catalog: Catalog,
    pub grid: ProductGrid,
    pub modal: ProductModal,
    pub popup: Option<PopupState>,
    pub notification: Option<Notification>,
    pub config: AppConfig,
    pub theme: Theme,
    pub should_quit: bool,
    paths: AppPaths,
    runtime: Runtime,
    contact_draft: FormState,
    status_message: Option<String>,
    pending_link: Option<String>,
}

impl AppState {
    pub fn new(catalog: Catalog, config: AppConfig, paths: AppPaths, runtime: Runtime) -> Self {
        let theme = Theme::from_name(config.app_settings.theme.as_deref().unwrap_or(DEFAULT_THEME));
        let mut grid = ProductGrid::new(config.column_count());
        grid.render(&catalog, &config);
        let status_message = Some(format!(
            "{} products from {}",
            catalog.products().len(),
            catalog.source_description()
        ));
        AppState {
            catalog,
            grid,
            modal: ProductModal::default(),
            popup: None,
            notification: None,
            config,
            theme,
            should_quit: false,
            paths,
            runtime,
            contact_draft: contact_form(),
            status_message,
            pending_link: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.popup.is_some() {
            self.handle_popup_key(key);
            return;
        }
        if self.modal.is_open() {
            self.handle_modal_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left | KeyCode::Char('h') => self.move_selection(ProductGrid::move_left),
            KeyCode::Right | KeyCode::Char('l') => self.move_selection(ProductGrid::move_right),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(ProductGrid::move_up),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(ProductGrid::move_down),
            KeyCode::Enter => self.open_selected(),
            KeyCode::Tab => self.cycle_filter(true),
            KeyCode::BackTab => self.cycle_filter(false),
            KeyCode::Char('a') => self.apply_filter(0),
            KeyCode::Char(digit @ '1'..='9') => {
                let index = digit as usize - '0' as usize;
                self.apply_filter(index);
            }
            KeyCode::Char('r') => self.reload(),
            KeyCode::Char('n') => self.open_new_product_form(),
            KeyCode::Char('c') => self.open_contact_form(),
            KeyCode::Char('s') => self.open_contact_settings(),
            KeyCode::Char('x') => self.export_catalog(),
            KeyCode::Char('?') => self.show_debug_summary(),
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.modal.dismiss(DismissTrigger::CancelKey),
            KeyCode::Char('q') => self.modal.dismiss(DismissTrigger::CloseControl),
            KeyCode::Char('o') | KeyCode::Char('i') => self.queue_modal_link(),
            _ => {}
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        let Some(popup) = self.popup.as_mut() else {
            return;
        };
        let result = match popup {
            PopupState::Message { .. } => match key.code {
                KeyCode::Esc | KeyCode::Enter => FormKeyResult::Cancel,
                _ => FormKeyResult::Continue,
            },
            PopupState::Form(form) => form.handle_key(key),
        };
        match result {
            FormKeyResult::Continue => {}
            FormKeyResult::Cancel => {
                if let Some(PopupState::Form(form)) = self.popup.take() {
                    self.set_status(Some(format!("{} cancelled", form.title)));
                    // The contact form keeps what was typed until it is sent.
                    if form.kind == FormKind::Contact {
                        self.contact_draft = form;
                    }
                }
            }
            FormKeyResult::Submit(values) => {
                let Some(kind) = self.active_form_kind() else {
                    return;
                };
                match self.apply_form(kind, values) {
                    Ok(msg) => {
                        self.popup = None;
                        self.set_status(Some(msg));
                    }
                    Err(err) => {
                        if let Some(PopupState::Form(form)) = self.popup.as_mut() {
                            form.error = Some(err);
                        }
                    }
                }
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, terminal_area: Rect) {
        if !matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left)) {
            return;
        }
        if let Some(PopupState::Form(form)) = self.popup.as_mut() {
            if let Some(index) = ui::form_field_at(mouse.column, mouse.row, terminal_area, form) {
                form.select(index);
            }
            return;
        }
        if self.popup.is_some() {
            return;
        }
        if self.modal.is_open() {
            let modal_area = ui::modal_area(terminal_area);
            if contains(ui::modal_close_area(modal_area), mouse.column, mouse.row) {
                self.modal.dismiss(DismissTrigger::CloseControl);
            } else if !contains(modal_area, mouse.column, mouse.row) {
                self.modal.dismiss(DismissTrigger::Backdrop);
            }
            return;
        }

        let areas = ui::screen_layout(terminal_area);
        if let Some(index) = self
            .grid
            .card_at(mouse.column, mouse.row, ui::grid_area(areas.grid))
        {
            self.grid.select(index);
            self.open_selected();
            return;
        }
        if contains(areas.filters, mouse.column, mouse.row) {
            let data = ui::filter_bar_data(self);
            if let Some(index) = data.action_at(mouse.column, areas.filters) {
                self.apply_filter(index);
            }
            return;
        }
        if contains(areas.shortcuts, mouse.column, mouse.row) {
            let data = ui::shortcut_line_data(self);
            if let Some(action) = data.action_at(mouse.column, areas.shortcuts) {
                self.execute_shortcut(action);
            }
        }
    }

    pub fn execute_shortcut(&mut self, action: ShortcutAction) {
        match action {
            ShortcutAction::Quit => self.should_quit = true,
            ShortcutAction::Open => self.open_selected(),
            ShortcutAction::Reload => self.reload(),
            ShortcutAction::NewProduct => self.open_new_product_form(),
            ShortcutAction::Contact => self.open_contact_form(),
            ShortcutAction::Settings => self.open_contact_settings(),
            ShortcutAction::Export => self.export_catalog(),
            ShortcutAction::Debug => self.show_debug_summary(),
        }
    }

    /// Expires the success toast once its time is up.
    pub fn tick(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|toast| toast.is_expired(now))
        {
            self.notification = None;
        }
    }

    pub fn take_pending_link(&mut self) -> Option<String> {
        self.pending_link.take()
    }

    pub fn set_status(&mut self, message: Option<String>) {
        self.status_message = message;
    }

    pub fn status_text(&self) -> String {
        let total = self.grid.cards().len();
        let current = if total == 0 {
            0
        } else {
            self.grid.selected() + 1
        };
        let mut text = format!(
            "Product {}/{} | Filter: {}",
            current,
            total,
            self.filter_label(self.catalog.filter())
        );
        if let Some(msg) = &self.status_message {
            text.push_str(" | ");
            text.push_str(msg);
        }
        text
    }

    /// `All` first, then the configured categories, then any category codes
    /// present in the catalog but missing from the configuration.
    pub fn filter_options(&self) -> Vec<FilterOption> {
        let mut options = vec![FilterOption {
            filter: CategoryFilter::All,
            label: "All".into(),
        }];
        for category in &self.config.categories {
            options.push(FilterOption {
                filter: CategoryFilter::Category(category.code.clone()),
                label: category.label.clone(),
            });
        }
        for product in self.catalog.products() {
            let filter = CategoryFilter::Category(product.category.clone());
            if !options.iter().any(|option| option.filter == filter) {
                options.push(FilterOption {
                    filter,
                    label: product.category.clone(),
                });
            }
        }
        options
    }

    fn filter_label(&self, filter: &CategoryFilter) -> String {
        match filter {
            CategoryFilter::All => "All".into(),
            CategoryFilter::Category(code) => self.config.category_label(code).to_string(),
        }
    }

    pub fn apply_filter(&mut self, index: usize) {
        let Some(option) = self.filter_options().into_iter().nth(index) else {
            return;
        };
        self.catalog.set_filter(option.filter);
        self.grid.render(&self.catalog, &self.config);
        self.grid.reset_selection();
        self.set_status(Some(format!(
            "Showing {} of {} products",
            self.catalog.filtered_len(),
            self.catalog.products().len()
        )));
    }

    fn cycle_filter(&mut self, forward: bool) {
        let options = self.filter_options();
        let current = options
            .iter()
            .position(|option| &option.filter == self.catalog.filter())
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % options.len()
        } else if current == 0 {
            options.len() - 1
        } else {
            current - 1
        };
        self.apply_filter(next);
    }

    fn move_selection(&mut self, movement: fn(&mut ProductGrid)) {
        if self.modal.scroll_locked() {
            return;
        }
        movement(&mut self.grid);
    }

    pub fn open_selected(&mut self) {
        let Some(card) = self.grid.selected_card() else {
            return;
        };
        if let Some(product) = self.catalog.product(card.product_id) {
            self.modal.open(product, &self.config);
        }
    }

    fn queue_modal_link(&mut self) {
        let Some(link) = self.modal.content().map(|content| content.contact_link.clone()) else {
            return;
        };
        self.set_status(Some(format!("Opening {link}")));
        self.pending_link = Some(link);
    }

    pub fn reload(&mut self) {
        let result = self.runtime.block_on(self.catalog.reload());
        self.grid.render(&self.catalog, &self.config);
        match result {
            Ok(count) => self.set_status(Some(format!("Catalog reloaded ({count} products)"))),
            Err(err) => self.set_status(Some(format!(
                "Reload failed, keeping current catalog: {err}"
            ))),
        }
    }

    fn open_new_product_form(&mut self) {
        let default_category = self
            .config
            .categories
            .first()
            .map(|category| category.code.clone())
            .unwrap_or_default();
        let next_base = format!(
            "{}{:02}",
            self.catalog.settings().image_prefix,
            crate::model::next_product_id(self.catalog.products())
        );
        self.popup = Some(PopupState::Form(FormState::new(
            FormKind::NewProduct,
            "New Product",
            "The image is detected from the base name; the id is assigned automatically.",
            vec![
                FormField::required("Name"),
                FormField::required("Category").with_value(default_category),
                FormField::optional("Price"),
                FormField::optional("Description"),
                FormField::required("Image base name").with_value(next_base),
                FormField::optional("Colors (comma separated)"),
            ],
        )));
    }

    fn open_contact_form(&mut self) {
        self.popup = Some(PopupState::Form(self.contact_draft.clone()));
    }

    fn open_contact_settings(&mut self) {
        let contact = &self.config.contact;
        self.popup = Some(PopupState::Form(FormState::new(
            FormKind::ContactSettings,
            "Contact Settings",
            "Used for the product contact link and the contact form.",
            vec![
                FormField::required("WhatsApp number").with_value(&contact.whatsapp_number),
                FormField::required("Instagram user").with_value(&contact.instagram_user),
                FormField::optional("E-mail").with_value(&contact.email),
            ],
        )));
    }

    fn show_debug_summary(&mut self) {
        let summary = self.catalog.debug_summary();
        let body = format!(
            "Source: {}\nProducts loaded: {}\nProducts shown: {}\nFilter: {}\nImages found: {}\nPlaceholders: {}\nModal open: {}\nTheme: {}\nConfig: {}",
            summary.source,
            summary.total,
            summary.filtered,
            self.filter_label(&summary.filter),
            summary.images_found,
            summary.placeholders,
            self.modal.is_open(),
            self.theme.name,
            self.paths.config_file.display()
        );
        info!(
            total = summary.total,
            filtered = summary.filtered,
            "debug summary requested"
        );
        self.popup = Some(PopupState::Message {
            title: "Debug".into(),
            body,
        });
    }

    pub fn export_catalog(&mut self) {
        match self.write_export() {
            Ok(count) => self.set_status(Some(format!(
                "Exported {count} products to {}",
                self.paths.export_file.display()
            ))),
            Err(err) => {
                warn!(error = %err, "export failed");
                self.set_status(Some(format!("Export failed: {err}")));
            }
        }
    }

    fn write_export(&self) -> Result<usize> {
        let export = self.catalog.export();
        let data = serde_json::to_string_pretty(&export)?;
        fs::write(&self.paths.export_file, data)
            .with_context(|| format!("Unable to write {}", self.paths.export_file.display()))?;
        info!(count = export.products.len(), path = %self.paths.export_file.display(), "catalog exported");
        Ok(export.products.len())
    }

    fn active_form_kind(&self) -> Option<FormKind> {
        match &self.popup {
            Some(PopupState::Form(form)) => Some(form.kind),
            _ => None,
        }
    }

    fn apply_form(&mut self, kind: FormKind, values: Vec<String>) -> Result<String, String> {
        match kind {
            FormKind::Contact => Ok(self.submit_contact(&values)),
            FormKind::NewProduct => Ok(self.submit_new_product(values)),
            FormKind::ContactSettings => self.submit_contact_settings(values),
        }
    }

    fn submit_contact(&mut self, values: &[String]) -> String {
        let submission = ContactSubmission::from_values(values);
        let url = submission.whatsapp_url(&self.config.contact);
        info!(name = %submission.name, "contact message prepared");
        self.pending_link = Some(url);
        self.notification = Some(Notification::new(
            "Message ready! You will be redirected to WhatsApp.",
            Instant::now(),
        ));
        self.contact_draft.reset();
        "Contact message sent to WhatsApp".into()
    }

    fn submit_new_product(&mut self, values: Vec<String>) -> String {
        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        let new = NewProduct {
            name: next(),
            category: next(),
            price: next(),
            description: next(),
            image_base_name: next(),
            colors: next()
                .split(',')
                .map(str::trim)
                .filter(|color| !color.is_empty())
                .map(str::to_string)
                .collect(),
        };
        let product = self.runtime.block_on(self.catalog.add_product(new));
        self.grid.render(&self.catalog, &self.config);
        if let Some(index) = self
            .grid
            .cards()
            .iter()
            .position(|card| card.product_id == product.id)
        {
            self.grid.select(index);
        }
        if product.image_found {
            format!("Added #{} {} ({})", product.id, product.name, product.image_path)
        } else {
            format!("Added #{} {} (no image found)", product.id, product.name)
        }
    }

    fn submit_contact_settings(&mut self, values: Vec<String>) -> Result<String, String> {
        let mut values = values.into_iter();
        let contact = ContactSettings {
            whatsapp_number: values.next().unwrap_or_default(),
            instagram_user: values.next().unwrap_or_default(),
            email: values.next().unwrap_or_default(),
        };
        if !contact.whatsapp_number.chars().any(|c| c.is_ascii_digit()) {
            return Err("WhatsApp number must contain digits".into());
        }
        self.persist_contact(&contact)
            .map_err(|err| format!("Unable to save settings: {err}"))?;
        info!(instagram = %contact.instagram_user, "contact settings updated");
        self.config.contact = contact;
        Ok("Contact information updated".into())
    }

    /// Writes the contact block into the stored configuration, leaving the
    /// rest of the file (including any command-line overrides) untouched.
    fn persist_contact(&self, contact: &ContactSettings) -> Result<()> {
        let mut stored = AppConfig::load(&self.paths.config_file)?;
        stored.contact = contact.clone();
        stored.save(&self.paths.config_file)
    }
}

fn contact_form() -> FormState {
    FormState::new(
        FormKind::Contact,
        "Contact Us",
        "Your message is sent through WhatsApp.",
        vec![
            FormField::required("Name"),
            FormField::required("E-mail"),
            FormField::optional("Phone"),
            FormField::required("Message"),
        ],
    )
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}
