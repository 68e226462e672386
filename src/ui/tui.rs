//! `Dialogs` on a real terminal via crossterm and ratatui.
//!
//! Each dialog runs its own draw/read loop and blocks until the operator
//! answers, so handlers read as straight-line code.
//!
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal};
use std::io::Stdout;

use crate::app::theme::Theme;
use crate::error::Result;
use crate::ui::widgets::{
    ChecklistState, ConfirmState, InputState, MenuState, Step, TextViewState,
};
use crate::ui::{Dialogs, MenuItem, components};

pub struct TuiDialogs {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    theme: Theme,
    header: String,
    restored: bool,
}

impl TuiDialogs {
    /// Switch the terminal to raw mode and the alternate screen.
    pub fn init(theme: Theme, header: impl Into<String>) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            disable_raw_mode().ok();
            return Err(err.into());
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal, theme, header: header.into(), restored: false })
    }

    /// Give the terminal back to the shell. Safe to call more than once.
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    fn drive<S, T>(
        &mut self,
        state: &mut S,
        draw: impl Fn(&mut Frame, &Theme, &mut S),
        mut handle: impl FnMut(&mut S, KeyCode) -> Step<T>,
    ) -> Result<Option<T>> {
        let theme = self.theme;
        loop {
            let header = self.header.as_str();
            self.terminal.draw(|f| {
                components::render_backdrop(f, &theme, header);
                draw(f, &theme, state);
            })?;
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if is_interrupt(&key) {
                return Ok(None);
            }
            match handle(state, key.code) {
                Step::Pending => {}
                Step::Done(value) => return Ok(Some(value)),
                Step::Cancelled => return Ok(None),
            }
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c'))
}

impl Drop for TuiDialogs {
    fn drop(&mut self) {
        self.restore().ok();
    }
}

impl Dialogs for TuiDialogs {
    fn menu(&mut self, title: &str, prompt: &str, items: &[MenuItem]) -> Result<Option<usize>> {
        let mut state = MenuState::new(items.len());
        self.drive(
            &mut state,
            |f, theme, s| components::render_menu(f, theme, title, prompt, items, s),
            |s, code| s.handle(code),
        )
    }

    fn checklist(&mut self, title: &str, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        let mut state = ChecklistState::new(items.len());
        self.drive(
            &mut state,
            |f, theme, s| components::render_checklist(f, theme, title, prompt, items, s),
            |s, code| s.handle(code),
        )
    }

    fn input(&mut self, title: &str, prompt: &str, initial: &str) -> Result<Option<String>> {
        let mut state = InputState::new(initial, false);
        self.drive(
            &mut state,
            |f, theme, s| components::render_input(f, theme, title, prompt, s),
            |s, code| s.handle(code),
        )
    }

    fn password(&mut self, title: &str, prompt: &str) -> Result<Option<String>> {
        let mut state = InputState::new("", true);
        self.drive(
            &mut state,
            |f, theme, s| components::render_input(f, theme, title, prompt, s),
            |s, code| s.handle(code),
        )
    }

    fn confirm(&mut self, title: &str, question: &str, default_yes: bool) -> Result<Option<bool>> {
        let mut state = ConfirmState::new(default_yes);
        self.drive(
            &mut state,
            |f, theme, s| components::render_confirm(f, theme, title, question, s),
            |s, code| s.handle(code),
        )
    }

    fn message(&mut self, title: &str, text: &str) -> Result<()> {
        self.drive(
            &mut (),
            |f, theme, _| components::render_message(f, theme, title, text, false),
            |_, code| close_on(code),
        )?;
        Ok(())
    }

    fn error(&mut self, title: &str, text: &str) -> Result<()> {
        self.drive(
            &mut (),
            |f, theme, _| components::render_message(f, theme, title, text, true),
            |_, code| close_on(code),
        )?;
        Ok(())
    }

    fn text_view(&mut self, title: &str, text: &str) -> Result<()> {
        let mut state = TextViewState::new(text);
        self.drive(
            &mut state,
            |f, theme, s| components::render_text_view(f, theme, title, text, s),
            |s, code| s.handle(code),
        )?;
        Ok(())
    }
}

fn close_on(code: KeyCode) -> Step<()> {
    match code {
        KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => Step::Done(()),
        _ => Step::Pending,
    }
}
