//! Key handling for the modal widgets.
//!
//! Each widget is a small state machine fed with key codes. Rendering lives in
//! `components`, the terminal loop in `tui`; keeping the transitions here lets
//! them be tested without a terminal.

use crossterm::event::KeyCode;

/// Page size for PageUp/PageDown in lists.
const PAGE_STEP: usize = 10;

/// Result of feeding one key to a widget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step<T> {
    Pending,
    Done(T),
    Cancelled,
}

/// Single-choice list.
#[derive(Clone, Debug, Default)]
pub struct MenuState {
    pub selected: usize,
    pub offset: usize,
    len: usize,
}

impl MenuState {
    pub fn new(len: usize) -> Self {
        Self { selected: 0, offset: 0, len }
    }

    pub fn handle(&mut self, code: KeyCode) -> Step<usize> {
        match code {
            KeyCode::Esc | KeyCode::Char('q') => return Step::Cancelled,
            KeyCode::Enter if self.len > 0 => return Step::Done(self.selected),
            _ => move_cursor(&mut self.selected, self.len, code),
        }
        Step::Pending
    }

    /// Keep the selection inside a window of `visible` rows.
    pub fn scroll_into_view(&mut self, visible: usize) {
        self.offset = scroll_offset(self.selected, self.offset, visible);
    }
}

/// Multi-choice list toggled with Space.
#[derive(Clone, Debug, Default)]
pub struct ChecklistState {
    pub selected: usize,
    pub offset: usize,
    pub checked: Vec<bool>,
}

impl ChecklistState {
    pub fn new(len: usize) -> Self {
        Self { selected: 0, offset: 0, checked: vec![false; len] }
    }

    pub fn handle(&mut self, code: KeyCode) -> Step<Vec<usize>> {
        match code {
            KeyCode::Esc => return Step::Cancelled,
            KeyCode::Enter => {
                let picked = self
                    .checked
                    .iter()
                    .enumerate()
                    .filter_map(|(i, on)| on.then_some(i))
                    .collect();
                return Step::Done(picked);
            }
            KeyCode::Char(' ') => {
                if let Some(slot) = self.checked.get_mut(self.selected) {
                    *slot = !*slot;
                }
            }
            _ => move_cursor(&mut self.selected, self.checked.len(), code),
        }
        Step::Pending
    }

    pub fn scroll_into_view(&mut self, visible: usize) {
        self.offset = scroll_offset(self.selected, self.offset, visible);
    }
}

/// Single-line text entry, optionally masked for secrets.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    pub value: String,
    pub masked: bool,
}

impl InputState {
    pub fn new(initial: &str, masked: bool) -> Self {
        Self { value: initial.to_string(), masked }
    }

    pub fn handle(&mut self, code: KeyCode) -> Step<String> {
        match code {
            KeyCode::Esc => return Step::Cancelled,
            KeyCode::Enter => return Step::Done(self.value.clone()),
            KeyCode::Backspace => {
                self.value.pop();
            }
            KeyCode::Char(c) if !c.is_control() => self.value.push(c),
            _ => {}
        }
        Step::Pending
    }

    /// What the operator sees in the field.
    pub fn display(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

/// Yes/No buttons.
#[derive(Clone, Debug)]
pub struct ConfirmState {
    pub yes: bool,
}

impl ConfirmState {
    pub fn new(default_yes: bool) -> Self {
        Self { yes: default_yes }
    }

    pub fn handle(&mut self, code: KeyCode) -> Step<bool> {
        match code {
            KeyCode::Esc => Step::Cancelled,
            KeyCode::Enter => Step::Done(self.yes),
            KeyCode::Char('y') | KeyCode::Char('Y') => Step::Done(true),
            KeyCode::Char('n') | KeyCode::Char('N') => Step::Done(false),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Char('l') => {
                self.yes = !self.yes;
                Step::Pending
            }
            _ => Step::Pending,
        }
    }
}

/// Scrollable read-only text.
#[derive(Clone, Debug, Default)]
pub struct TextViewState {
    pub scroll: u16,
    lines: u16,
}

impl TextViewState {
    pub fn new(text: &str) -> Self {
        let lines = u16::try_from(text.lines().count()).unwrap_or(u16::MAX);
        Self { scroll: 0, lines }
    }

    pub fn handle(&mut self, code: KeyCode) -> Step<()> {
        let last = self.lines.saturating_sub(1);
        match code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => return Step::Done(()),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1).min(last),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(PAGE_STEP as u16),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(PAGE_STEP as u16).min(last),
            KeyCode::Home => self.scroll = 0,
            KeyCode::End => self.scroll = last,
            _ => {}
        }
        Step::Pending
    }
}

fn move_cursor(selected: &mut usize, len: usize, code: KeyCode) {
    let last = len.saturating_sub(1);
    match code {
        KeyCode::Up | KeyCode::Char('k') => *selected = selected.saturating_sub(1),
        KeyCode::Down | KeyCode::Char('j') => *selected = (*selected + 1).min(last),
        KeyCode::PageUp => *selected = selected.saturating_sub(PAGE_STEP),
        KeyCode::PageDown => *selected = (*selected + PAGE_STEP).min(last),
        KeyCode::Home => *selected = 0,
        KeyCode::End => *selected = last,
        _ => {}
    }
}

fn scroll_offset(selected: usize, offset: usize, visible: usize) -> usize {
    let visible = visible.max(1);
    if selected < offset {
        selected
    } else if selected >= offset + visible {
        selected + 1 - visible
    } else {
        offset
    }
}
