//! Compensating actions for multi-step handlers.
//!
//! A handler registers an undo step right after each change it makes. If the
//! handler finishes it calls [`Rollback::commit`]; any other exit (an explicit
//! [`Rollback::unwind`], an early `?` return, a panic) runs the registered
//! steps in reverse order.

use crate::error::Result;

type Compensation<'a> = Box<dyn FnOnce() -> Result<()> + 'a>;

pub struct Rollback<'a> {
    what: String,
    steps: Vec<(String, Compensation<'a>)>,
}

impl<'a> Rollback<'a> {
    pub fn new(what: impl Into<String>) -> Self {
        Self { what: what.into(), steps: Vec::new() }
    }

    pub fn register(&mut self, label: impl Into<String>, step: impl FnOnce() -> Result<()> + 'a) {
        self.steps.push((label.into(), Box::new(step)));
    }

    pub fn is_armed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Keep every change; nothing will be undone.
    pub fn commit(mut self) {
        self.steps.clear();
    }

    /// Undo every registered change now. Returns a description of each step
    /// that failed.
    pub fn unwind(mut self) -> Vec<String> {
        self.run_steps()
    }

    fn run_steps(&mut self) -> Vec<String> {
        let mut failures = Vec::new();
        while let Some((label, step)) = self.steps.pop() {
            match step() {
                Ok(()) => tracing::info!(operation = %self.what, step = %label, "rolled back"),
                Err(err) => {
                    tracing::warn!(operation = %self.what, step = %label, %err, "rollback step failed");
                    failures.push(format!("{label}: {err}"));
                }
            }
        }
        failures
    }
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if !self.steps.is_empty() {
            self.run_steps();
        }
    }
}
