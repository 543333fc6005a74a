use ratatui::layout::{Constraint, Direction, Layout, Margin};
use ratatui::prelude::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::block::Title;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::app::{AppState, PopupState, ShortcutAction};
use crate::form::FormState;
use crate::modal::ModalContent;
use crate::view::ProductCard;

const CLOSE_CONTROL: &str = "[x]";
/// Form rows start below the hint line and one blank line.
const FORM_FIELD_OFFSET: u16 = 2;

pub struct ScreenAreas {
    pub header: Rect,
    pub filters: Rect,
    pub grid: Rect,
    pub shortcuts: Rect,
    pub status: Rect,
}

pub fn screen_layout(area: Rect) -> ScreenAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);
    ScreenAreas {
        header: chunks[0],
        filters: chunks[1],
        grid: chunks[2],
        shortcuts: chunks[3],
        status: chunks[4],
    }
}

pub fn grid_area(content: Rect) -> Rect {
    content.inner(&Margin {
        vertical: 1,
        horizontal: 1,
    })
}

pub fn modal_area(area: Rect) -> Rect {
    centered_rect(area, 70, 70)
}

/// The `[x]` control drawn at the right end of the modal's top border.
pub fn modal_close_area(modal: Rect) -> Rect {
    let width = CLOSE_CONTROL.len() as u16;
    if modal.width < width + 2 {
        return Rect::new(modal.x, modal.y, 0, 0);
    }
    Rect::new(modal.x + modal.width - width - 1, modal.y, width, 1)
}

pub fn form_field_at(column: u16, row: u16, area: Rect, form: &FormState) -> Option<usize> {
    let [_, _, content_area, _] = popup_sections(area)?;
    let inner = content_area.inner(&popup_content_margin());
    if column < inner.x || column >= inner.x + inner.width {
        return None;
    }
    let first = inner.y + FORM_FIELD_OFFSET;
    if row < first {
        return None;
    }
    let index = usize::from(row - first);
    (index < form.fields.len()).then_some(index)
}

pub struct LineSegment<A> {
    start: u16,
    end: u16,
    action: A,
}

/// A centered one-line bar whose entries can be clicked.
pub struct ClickableLine<A> {
    pub line: Line<'static>,
    segments: Vec<LineSegment<A>>,
    total_width: u16,
}

impl<A: Copy> ClickableLine<A> {
    fn build(entries: Vec<(Vec<Span<'static>>, A)>, separator: Span<'static>) -> Self {
        let separator_width = span_width(&separator);
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut segments = Vec::new();
        let mut cursor: u16 = 0;
        for (index, (entry, action)) in entries.into_iter().enumerate() {
            if index > 0 {
                spans.push(separator.clone());
                cursor = cursor.saturating_add(separator_width);
            }
            let start = cursor;
            for span in entry {
                cursor = cursor.saturating_add(span_width(&span));
                spans.push(span);
            }
            segments.push(LineSegment {
                start,
                end: cursor,
                action,
            });
        }
        ClickableLine {
            line: Line::from(spans),
            segments,
            total_width: cursor,
        }
    }

    pub fn action_at(&self, column: u16, area: Rect) -> Option<A> {
        if self.segments.is_empty() || self.total_width == 0 || area.width == 0 {
            return None;
        }
        let text_width = self.total_width.min(area.width);
        let mut start_x = area.x;
        if area.width > text_width {
            start_x += (area.width - text_width) / 2;
        }
        if column < start_x || column >= start_x + text_width {
            return None;
        }
        let relative = column - start_x;
        self.segments
            .iter()
            .find(|segment| relative >= segment.start && relative < segment.end)
            .map(|segment| segment.action)
    }
}

fn span_width(span: &Span<'_>) -> u16 {
    UnicodeWidthStr::width(span.content.as_ref()) as u16
}

struct FooterShortcut {
    key: &'static str,
    label: &'static str,
    action: ShortcutAction,
}

const FOOTER_SHORTCUTS: &[FooterShortcut] = &[
    FooterShortcut {
        key: "↵",
        label: " Details",
        action: ShortcutAction::Open,
    },
    FooterShortcut {
        key: "r",
        label: " Reload",
        action: ShortcutAction::Reload,
    },
    FooterShortcut {
        key: "n",
        label: " New",
        action: ShortcutAction::NewProduct,
    },
    FooterShortcut {
        key: "c",
        label: " Contact",
        action: ShortcutAction::Contact,
    },
    FooterShortcut {
        key: "s",
        label: " Settings",
        action: ShortcutAction::Settings,
    },
    FooterShortcut {
        key: "x",
        label: " Export",
        action: ShortcutAction::Export,
    },
    FooterShortcut {
        key: "?",
        label: " Debug",
        action: ShortcutAction::Debug,
    },
    FooterShortcut {
        key: "q",
        label: " Quit",
        action: ShortcutAction::Quit,
    },
];

pub fn shortcut_line_data(app: &AppState) -> ClickableLine<ShortcutAction> {
    let key_style = Style::default()
        .fg(app.theme.accent)
        .bg(app.theme.highlight)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default()
        .fg(app.theme.background)
        .bg(app.theme.highlight);
    let entries = FOOTER_SHORTCUTS
        .iter()
        .map(|shortcut| {
            (
                vec![
                    Span::styled(shortcut.key, key_style),
                    Span::styled(shortcut.label, label_style),
                ],
                shortcut.action,
            )
        })
        .collect();
    ClickableLine::build(entries, Span::styled(" | ", label_style))
}

/// One entry per filter option; the action is the option's index.
pub fn filter_bar_data(app: &AppState) -> ClickableLine<usize> {
    let key_style = Style::default()
        .fg(app.theme.accent)
        .add_modifier(Modifier::BOLD);
    let label_style = Style::default().fg(app.theme.text);
    let active_style = Style::default()
        .fg(app.theme.background)
        .bg(app.theme.highlight)
        .add_modifier(Modifier::BOLD);
    let entries = app
        .filter_options()
        .into_iter()
        .enumerate()
        .map(|(index, option)| {
            let key = match index {
                0 => "a".to_string(),
                1..=9 => index.to_string(),
                _ => String::new(),
            };
            let active = &option.filter == app.catalog.filter();
            let mut spans = Vec::new();
            if !key.is_empty() {
                spans.push(Span::styled(format!("{key} "), key_style));
            }
            spans.push(Span::styled(
                option.label,
                if active { active_style } else { label_style },
            ));
            (spans, index)
        })
        .collect();
    ClickableLine::build(entries, Span::raw("   "))
}

pub fn render(frame: &mut Frame, app: &AppState) {
    let size = frame.size();
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        size,
    );
    let areas = screen_layout(size);

    let header = Paragraph::new(app.config.title())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(app.theme.text)
                .bg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(header, areas.header);

    let filters = Paragraph::new(filter_bar_data(app).line)
        .alignment(Alignment::Center)
        .style(Style::default().bg(app.theme.background));
    frame.render_widget(filters, areas.filters);

    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.surface)),
        areas.grid,
    );
    render_grid(frame, grid_area(areas.grid), app);

    let shortcuts = Paragraph::new(shortcut_line_data(app).line)
        .alignment(Alignment::Center)
        .style(Style::default().bg(app.theme.highlight));
    frame.render_widget(shortcuts, areas.shortcuts);

    let status = Paragraph::new(app.status_text())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(app.theme.primary)
                .fg(app.theme.text)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(status, areas.status);

    if let Some(content) = app.modal.content() {
        render_modal(frame, content, app);
    }
    if let Some(popup) = &app.popup {
        render_popup(frame, popup, app);
    }
    if let Some(toast) = &app.notification {
        render_notification(frame, &toast.message, app);
    }
}

fn render_grid(frame: &mut Frame, area: Rect, app: &AppState) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    if app.grid.cards().is_empty() {
        let empty = Paragraph::new("No products in this category.")
            .alignment(Alignment::Center)
            .style(Style::default().bg(app.theme.surface).fg(app.theme.text));
        frame.render_widget(empty, area);
        return;
    }
    for (index, rect) in app.grid.card_rects(area) {
        if let Some(card) = app.grid.cards().get(index) {
            render_card(frame, rect, card, index == app.grid.selected(), app);
        }
    }
}

fn render_card(frame: &mut Frame, area: Rect, card: &ProductCard, selected: bool, app: &AppState) {
    let border_style = if selected {
        Style::default()
            .fg(app.theme.highlight)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.primary)
    };
    let block = Block::default()
        .title(format!(" {} ", card.title))
        .borders(Borders::ALL)
        .border_style(border_style)
        .style(Style::default().bg(app.theme.surface).fg(app.theme.text));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let meta = Line::from(vec![
        Span::styled(
            card.category_label.clone(),
            Style::default().fg(app.theme.accent),
        ),
        Span::raw("  "),
        Span::styled(
            card.price.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    ]);
    frame.render_widget(Paragraph::new(meta), rows[0]);

    frame.render_widget(
        Paragraph::new(card.excerpt.clone()).wrap(Wrap { trim: true }),
        rows[1],
    );

    frame.render_widget(Paragraph::new(image_line(&card.image_path, card.image_found)), rows[2]);
}

fn image_line(path: &str, found: bool) -> Line<'static> {
    if found {
        Line::from(Span::styled(
            format!("▣ {path}"),
            Style::default().fg(Color::Green),
        ))
    } else {
        Line::from(Span::styled(
            format!("□ {path} (placeholder)"),
            Style::default().fg(Color::DarkGray),
        ))
    }
}

fn render_modal(frame: &mut Frame, content: &ModalContent, app: &AppState) {
    let area = modal_area(frame.size());
    frame.render_widget(Clear, area);

    let label_style = Style::default()
        .fg(app.theme.accent)
        .add_modifier(Modifier::BOLD);
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label}: "), label_style),
            Span::raw(value),
        ])
    };

    let colors = if content.colors.is_empty() {
        "-".to_string()
    } else {
        content.colors.join(", ")
    };
    let mut lines = vec![
        field("Category", content.category_label.clone()),
        field("Price", content.price.clone()),
        field("Colors", colors),
        image_line(&content.image_path, content.image_found),
        Line::from(""),
    ];
    lines.extend(
        content
            .description
            .lines()
            .map(|line| Line::from(line.to_string())),
    );
    lines.push(Line::from(""));
    lines.push(field("Contact", content.contact_link.clone()));
    lines.push(Line::from(vec![
        Span::styled("o", label_style),
        Span::raw(" Open contact link    "),
        Span::styled("Esc", label_style),
        Span::raw(" Close"),
    ]));

    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", content.title),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .title(Title::from(Span::styled(CLOSE_CONTROL, label_style)).alignment(Alignment::Right))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.highlight))
        .style(Style::default().bg(app.theme.surface).fg(app.theme.text));
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_popup(frame: &mut Frame, popup: &PopupState, app: &AppState) {
    match popup {
        PopupState::Message { title, body } => {
            let area = centered_rect(frame.size(), 50, 40);
            frame.render_widget(Clear, area);
            let block = Paragraph::new(format!("{body}\n\nPress Enter or Esc to close."))
                .style(Style::default().bg(app.theme.surface).fg(app.theme.text))
                .block(
                    Block::default()
                        .title(title.as_str())
                        .borders(Borders::ALL)
                        .style(Style::default().bg(app.theme.surface)),
                );
            frame.render_widget(block, area);
        }
        PopupState::Form(form) => {
            let area = frame.size();
            frame.render_widget(Clear, area);
            render_form_popup(frame, area, app, form);
        }
    }
}

fn popup_sections(area: Rect) -> Option<[Rect; 4]> {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);
    if sections.len() < 4 {
        return None;
    }
    Some([sections[0], sections[1], sections[2], sections[3]])
}

fn popup_content_margin() -> Margin {
    Margin {
        horizontal: 3,
        vertical: 1,
    }
}

fn render_form_popup(frame: &mut Frame, area: Rect, app: &AppState, form: &FormState) {
    let Some([header_area, shortcuts_area, content_area, status_area]) = popup_sections(area)
    else {
        return;
    };
    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.background)),
        area,
    );

    let header = Paragraph::new(format!("{} - {}", app.config.title(), form.title))
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(app.theme.primary)
                .fg(app.theme.text)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(header, header_area);

    let key_style = Style::default()
        .fg(app.theme.accent)
        .add_modifier(Modifier::BOLD);
    let shortcut_line = Line::from(vec![
        Span::styled("Tab", key_style),
        Span::raw("/"),
        Span::styled("Shift+Tab", key_style),
        Span::raw(" Move    "),
        Span::styled("Enter", key_style),
        Span::raw(" Send    "),
        Span::styled("Esc", key_style),
        Span::raw(" Cancel"),
    ]);
    let shortcuts = Paragraph::new(shortcut_line)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(app.theme.highlight)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(shortcuts, shortcuts_area);

    frame.render_widget(
        Block::default().style(Style::default().bg(app.theme.surface)),
        content_area,
    );
    let inner = content_area.inner(&popup_content_margin());
    let width = usize::from(inner.width);

    let mut lines = vec![Line::from(form.hint), Line::from("")];
    for (index, field) in form.fields.iter().enumerate() {
        let line = make_field_line(field.label, &field.value, field.required, app);
        if index == form.selected {
            lines.push(highlight_line_with_width(line, width, app));
        } else {
            lines.push(line);
        }
    }
    if let Some(error) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    let paragraph =
        Paragraph::new(lines).style(Style::default().bg(app.theme.surface).fg(app.theme.text));
    frame.render_widget(paragraph, inner);

    let status = Paragraph::new(app.status_text())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .bg(app.theme.primary)
                .fg(app.theme.text)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(status, status_area);
}

fn make_field_line(label: &str, value: &str, required: bool, app: &AppState) -> Line<'static> {
    let value_display = if value.trim().is_empty() {
        "(empty)".to_string()
    } else {
        value.to_string()
    };
    let marker = if required { "*" } else { "" };
    let label_style = Style::default()
        .fg(app.theme.accent)
        .add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::styled(format!("{label}{marker}: "), label_style),
        Span::styled(value_display, Style::default().fg(app.theme.text)),
    ])
}

fn highlight_line_with_width(
    mut line: Line<'static>,
    width: usize,
    app: &AppState,
) -> Line<'static> {
    let mut text_width = 0usize;
    let highlight_style = Style::default()
        .fg(app.theme.background)
        .bg(app.theme.highlight)
        .add_modifier(Modifier::BOLD);
    for span in &mut line.spans {
        span.style = highlight_style;
        text_width += UnicodeWidthStr::width(span.content.as_ref());
    }
    if width > text_width {
        line.spans
            .push(Span::styled(" ".repeat(width - text_width), highlight_style));
    }
    line
}

fn render_notification(frame: &mut Frame, message: &str, app: &AppState) {
    let size = frame.size();
    let width = (UnicodeWidthStr::width(message) as u16 + 4).min(size.width);
    if width == 0 || size.height < 4 {
        return;
    }
    let area = Rect::new(size.x + size.width - width, size.y + 1, width, 3);
    frame.render_widget(Clear, area);
    let toast = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(app.theme.background)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(toast, area);
}

fn centered_rect(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - width_percent) / 2),
            Constraint::Percentage(width_percent),
            Constraint::Percentage((100 - width_percent) / 2),
        ])
        .split(area);
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - height_percent) / 2),
            Constraint::Percentage(height_percent),
            Constraint::Percentage((100 - height_percent) / 2),
        ])
        .split(horizontal[1]);
    vertical[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clickable_line_maps_columns_to_entries() {
        let line = ClickableLine::build(
            vec![
                (vec![Span::raw("a"), Span::raw(" All")], 0usize),
                (vec![Span::raw("1"), Span::raw(" Médias")], 1usize),
            ],
            Span::raw(" | "),
        );
        // "a All | 1 Médias" is 16 columns wide, centered in 20.
        let area = Rect::new(0, 0, 20, 1);
        assert_eq!(line.action_at(2, area), Some(0));
        assert_eq!(line.action_at(6, area), Some(0));
        assert_eq!(line.action_at(8, area), None);
        assert_eq!(line.action_at(10, area), Some(1));
        assert_eq!(line.action_at(17, area), Some(1));
        assert_eq!(line.action_at(18, area), None);
        assert_eq!(line.action_at(0, area), None);
    }

    #[test]
    fn close_control_sits_on_top_border() {
        let modal = Rect::new(10, 5, 40, 20);
        let close = modal_close_area(modal);
        assert_eq!(close, Rect::new(46, 5, 3, 1));
    }

    #[test]
    fn layout_reserves_bars_around_grid() {
        let areas = screen_layout(Rect::new(0, 0, 80, 30));
        assert_eq!(areas.header.y, 0);
        assert_eq!(areas.filters.y, 1);
        assert_eq!(areas.grid, Rect::new(0, 2, 80, 26));
        assert_eq!(areas.shortcuts.y, 28);
        assert_eq!(areas.status.y, 29);
    }
}
