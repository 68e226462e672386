//! Modal dialogs: the operator-facing half of every handler.
//!
//! Handlers talk to the [`Dialogs`] trait only. [`tui::TuiDialogs`] implements
//! it on a real terminal; tests script it. Every prompt returns `Ok(None)` when
//! the operator cancels, which handlers treat as "back to the parent menu".

pub mod components;
pub mod tui;
pub mod widgets;

use crate::error::Result;

/// One row of a single-choice menu: a short tag and a description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuItem {
    pub tag: String,
    pub label: String,
}

impl MenuItem {
    pub fn new(tag: impl Into<String>, label: impl Into<String>) -> Self {
        Self { tag: tag.into(), label: label.into() }
    }
}

pub trait Dialogs {
    /// Single choice; returns the index of the chosen item.
    fn menu(&mut self, title: &str, prompt: &str, items: &[MenuItem]) -> Result<Option<usize>>;

    /// Multiple choice; returns the indices of the checked items.
    fn checklist(&mut self, title: &str, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>>;

    fn input(&mut self, title: &str, prompt: &str, initial: &str) -> Result<Option<String>>;

    /// Like `input`, with the typed characters masked.
    fn password(&mut self, title: &str, prompt: &str) -> Result<Option<String>>;

    fn confirm(&mut self, title: &str, question: &str, default_yes: bool) -> Result<Option<bool>>;

    fn message(&mut self, title: &str, text: &str) -> Result<()>;

    fn error(&mut self, title: &str, text: &str) -> Result<()>;

    /// Scrollable read-only text for listings and reports.
    fn text_view(&mut self, title: &str, text: &str) -> Result<()>;
}
