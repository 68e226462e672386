//! Rendering for the backdrop and the modal dialogs.
//!
//! Every dialog is drawn centered over the backdrop and cleared first, so a
//! dialog never shows remnants of the previous one.
//!
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

use crate::app::theme::Theme;
use crate::ui::MenuItem;
use crate::ui::widgets::{ChecklistState, ConfirmState, InputState, MenuState, TextViewState};

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn dialog_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .style(Style::default().fg(theme.text))
}

/// Width that fits the longest line plus borders, within sane limits.
fn fit_width(lines: impl Iterator<Item = usize>, area: Rect) -> u16 {
    let longest = lines.max().unwrap_or(0);
    let want = u16::try_from(longest + 6).unwrap_or(u16::MAX);
    want.clamp(40, area.width.saturating_sub(4).max(40))
}

fn prompt_height(prompt: &str) -> u16 {
    if prompt.is_empty() { 0 } else { u16::try_from(prompt.lines().count() + 1).unwrap_or(4) }
}

/// Split a dialog's inner area into prompt, body and a one-line key hint.
fn dialog_layout(inner: Rect, prompt: &str) -> (Rect, Rect, Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(prompt_height(prompt)),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);
    (parts[0], parts[1], parts[2])
}

fn hint<'a>(text: &'a str, theme: &Theme) -> Paragraph<'a> {
    Paragraph::new(text).style(Style::default().fg(theme.muted))
}

/// Full-screen background with the tool name and the operator.
pub fn render_backdrop(f: &mut Frame, theme: &Theme, header: &str) {
    let area = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    f.render_widget(Block::default().style(Style::default().bg(theme.backdrop)), area);
    f.render_widget(
        Paragraph::new(header)
            .style(Style::default().fg(theme.title).bg(theme.backdrop).add_modifier(Modifier::BOLD)),
        rows[0],
    );
    f.render_widget(
        Paragraph::new("↑/↓ j/k: move  Enter: select  Esc: back")
            .style(Style::default().fg(theme.muted).bg(theme.backdrop)),
        rows[2],
    );
}

pub fn render_menu(
    f: &mut Frame,
    theme: &Theme,
    title: &str,
    prompt: &str,
    items: &[MenuItem],
    state: &mut MenuState,
) {
    let area = f.area();
    let tag_w = items.iter().map(|i| i.tag.chars().count()).max().unwrap_or(0);
    let width = fit_width(
        prompt
            .lines()
            .map(|l| l.chars().count())
            .chain(items.iter().map(|i| tag_w + i.label.chars().count() + 5)),
        area,
    );
    let rows = u16::try_from(items.len()).unwrap_or(u16::MAX);
    let height = rows
        .saturating_add(prompt_height(prompt))
        .saturating_add(3)
        .min(area.height.saturating_sub(2))
        .max(6);
    let rect = centered_rect(width, height, area);
    let block = dialog_block(title, theme);
    let inner = block.inner(rect);
    let (prompt_area, body, hint_area) = dialog_layout(inner, prompt);

    state.scroll_into_view(body.height as usize);
    let end = (state.offset + body.height as usize).min(items.len());
    let list_items: Vec<ListItem> = items[state.offset.min(end)..end]
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let abs = state.offset + i;
            let marker = if abs == state.selected { "▶ " } else { "  " };
            let style = if abs == state.selected {
                Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{:<tag_w$}  ", item.tag), Style::default().fg(theme.title)),
                Span::raw(item.label.clone()),
            ]))
            .style(style)
        })
        .collect();

    f.render_widget(Clear, rect);
    f.render_widget(block, rect);
    f.render_widget(Paragraph::new(prompt).wrap(Wrap { trim: false }), prompt_area);
    f.render_widget(List::new(list_items), body);
    f.render_widget(hint("Enter: select  Esc: back", theme), hint_area);
}

pub fn render_checklist(
    f: &mut Frame,
    theme: &Theme,
    title: &str,
    prompt: &str,
    items: &[String],
    state: &mut ChecklistState,
) {
    let area = f.area();
    let width = fit_width(
        prompt.lines().map(|l| l.chars().count()).chain(items.iter().map(|i| i.chars().count() + 6)),
        area,
    );
    let rows = u16::try_from(items.len()).unwrap_or(u16::MAX);
    let height = rows
        .saturating_add(prompt_height(prompt))
        .saturating_add(3)
        .min(area.height.saturating_sub(2))
        .max(6);
    let rect = centered_rect(width, height, area);
    let block = dialog_block(title, theme);
    let inner = block.inner(rect);
    let (prompt_area, body, hint_area) = dialog_layout(inner, prompt);

    state.scroll_into_view(body.height as usize);
    let end = (state.offset + body.height as usize).min(items.len());
    let list_items: Vec<ListItem> = (state.offset.min(end)..end)
        .map(|abs| {
            let checkbox = if state.checked.get(abs).copied().unwrap_or(false) { "[x]" } else { "[ ]" };
            let marker = if abs == state.selected { "▶" } else { " " };
            let style = if abs == state.selected {
                Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg)
            } else {
                Style::default()
            };
            ListItem::new(format!("{marker} {checkbox} {}", items[abs])).style(style)
        })
        .collect();

    f.render_widget(Clear, rect);
    f.render_widget(block, rect);
    f.render_widget(Paragraph::new(prompt).wrap(Wrap { trim: false }), prompt_area);
    f.render_widget(List::new(list_items), body);
    f.render_widget(hint("Space: toggle  Enter: apply  Esc: back", theme), hint_area);
}

pub fn render_input(f: &mut Frame, theme: &Theme, title: &str, prompt: &str, state: &InputState) {
    let area = f.area();
    let width = fit_width(prompt.lines().map(|l| l.chars().count()).chain([state.value.len() + 2]), area);
    let rect = centered_rect(width, prompt_height(prompt).saturating_add(4), area);
    let block = dialog_block(title, theme);
    let inner = block.inner(rect);
    let (prompt_area, body, hint_area) = dialog_layout(inner, prompt);

    let field = Line::from(vec![
        Span::styled(state.display(), Style::default().fg(theme.highlight_fg)),
        Span::styled("█", Style::default().fg(theme.muted)),
    ]);
    f.render_widget(Clear, rect);
    f.render_widget(block, rect);
    f.render_widget(Paragraph::new(prompt).wrap(Wrap { trim: false }), prompt_area);
    f.render_widget(Paragraph::new(field), body);
    f.render_widget(hint("Enter: accept  Esc: back", theme), hint_area);
}

pub fn render_confirm(f: &mut Frame, theme: &Theme, title: &str, question: &str, state: &ConfirmState) {
    let area = f.area();
    let width = fit_width(question.lines().map(|l| l.chars().count()), area);
    let rect = centered_rect(width, prompt_height(question).saturating_add(4), area);
    let block = dialog_block(title, theme);
    let inner = block.inner(rect);
    let (prompt_area, body, hint_area) = dialog_layout(inner, question);

    let selected = Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD);
    let (yes, no) = if state.yes { (selected, Style::default()) } else { (Style::default(), selected) };
    let buttons = Line::from(vec![
        Span::raw("    "),
        Span::styled(" Yes ", yes),
        Span::raw("    "),
        Span::styled(" No ", no),
    ]);
    f.render_widget(Clear, rect);
    f.render_widget(block, rect);
    f.render_widget(Paragraph::new(question).wrap(Wrap { trim: false }), prompt_area);
    f.render_widget(Paragraph::new(buttons), body);
    f.render_widget(hint("y/n  ←/→: switch  Enter: choose  Esc: back", theme), hint_area);
}

/// Informational or error message box.
pub fn render_message(f: &mut Frame, theme: &Theme, title: &str, text: &str, is_error: bool) {
    let area = f.area();
    let width = fit_width(text.lines().map(|l| l.chars().count()), area);
    let body_lines = u16::try_from(text.lines().count()).unwrap_or(u16::MAX);
    let height = body_lines.saturating_add(4).min(area.height.saturating_sub(2)).max(5);
    let rect = centered_rect(width, height, area);
    let mut block = dialog_block(title, theme);
    if is_error {
        block = block.border_style(Style::default().fg(theme.error));
    }
    let inner = block.inner(rect);
    let (_, body, hint_area) = dialog_layout(inner, "");

    f.render_widget(Clear, rect);
    f.render_widget(block, rect);
    f.render_widget(Paragraph::new(text).wrap(Wrap { trim: false }), body);
    f.render_widget(hint("Enter: OK", theme), hint_area);
}

/// Large scrollable view used for listings and reports.
pub fn render_text_view(f: &mut Frame, theme: &Theme, title: &str, text: &str, state: &TextViewState) {
    let area = f.area();
    let rect = centered_rect(area.width.saturating_sub(4), area.height.saturating_sub(2), area);
    let block = dialog_block(title, theme);
    let inner = block.inner(rect);
    let (_, body, hint_area) = dialog_layout(inner, "");

    f.render_widget(Clear, rect);
    f.render_widget(block, rect);
    f.render_widget(Paragraph::new(text).scroll((state.scroll, 0)), body);
    f.render_widget(hint("↑/↓ PgUp/PgDn: scroll  Enter/Esc: close", theme), hint_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn centered_rect_never_exceeds_area() {
        let area = Rect { x: 0, y: 0, width: 30, height: 10 };
        let r = centered_rect(80, 40, area);
        assert_eq!(r, area);
        let r = centered_rect(10, 4, area);
        assert_eq!((r.x, r.y, r.width, r.height), (10, 3, 10, 4));
    }

    #[test]
    fn menu_renders_tags_and_labels() {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let items = vec![MenuItem::new("1", "Create account"), MenuItem::new("2", "Delete account")];
        let mut state = MenuState::new(items.len());
        let theme = Theme::dark();
        terminal
            .draw(|f| {
                render_backdrop(f, &theme, "usrgrp-admin");
                render_menu(f, &theme, "Main menu", "Choose an action:", &items, &mut state);
            })
            .unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Main menu"));
        assert!(text.contains("Create account"));
        assert!(text.contains("Delete account"));
    }

    #[test]
    fn masked_input_hides_secret() {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        let state = InputState::new("hunter22", true);
        let theme = Theme::dark();
        terminal
            .draw(|f| render_input(f, &theme, "Password", "New password:", &state))
            .unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("********"));
        assert!(!text.contains("hunter22"));
    }

    #[test]
    fn menu_with_more_rows_than_u16_still_fits() {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        let items: Vec<MenuItem> =
            (0..70_000).map(|i| MenuItem::new(format!("u{i}"), "account")).collect();
        let mut state = MenuState::new(items.len());
        let theme = Theme::dark();
        terminal
            .draw(|f| render_menu(f, &theme, "Delete account", "Select:", &items, &mut state))
            .unwrap();
        assert!(screen_text(&terminal).contains("u0"));
    }
}
