//! Menu dispatcher and the per-action handlers.
//!
//! The main menu is a table of [`MainAction`] variants; each variant maps to a
//! handler function taking the [`Session`]. Handlers own their form state for
//! the duration of one action and return to the menu when done or cancelled.
//!
pub mod accounts;
pub mod groups;
pub mod reports;
pub mod rollback;
pub mod settings;
pub mod theme;

use crate::error::Result;
use crate::sys::{AccountBackend, SystemGroup, SystemUser};
use crate::ui::{Dialogs, MenuItem};
use settings::Settings;

/// Everything a handler needs: the system, the operator, and the thresholds.
pub struct Session<'a> {
    pub backend: &'a dyn AccountBackend,
    pub dialogs: &'a mut dyn Dialogs,
    pub settings: &'a Settings,
    /// Account running the tool; never offered for deletion.
    pub invoking_user: Option<String>,
}

pub type Handler = fn(&mut Session<'_>) -> Result<()>;

/// Entries of the main menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MainAction {
    CreateAccount,
    ModifyAccount,
    DeleteAccount,
    ListRegular,
    ListSystem,
    ManageGroups,
    Statistics,
    Exit,
}

impl MainAction {
    pub const ALL: [MainAction; 8] = [
        MainAction::CreateAccount,
        MainAction::ModifyAccount,
        MainAction::DeleteAccount,
        MainAction::ListRegular,
        MainAction::ListSystem,
        MainAction::ManageGroups,
        MainAction::Statistics,
        MainAction::Exit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MainAction::CreateAccount => "Create account",
            MainAction::ModifyAccount => "Modify account",
            MainAction::DeleteAccount => "Delete account",
            MainAction::ListRegular => "List regular accounts",
            MainAction::ListSystem => "List system accounts",
            MainAction::ManageGroups => "Manage groups",
            MainAction::Statistics => "System statistics",
            MainAction::Exit => "Exit",
        }
    }

    /// `None` for `Exit`, which ends the loop instead of running a handler.
    pub fn handler(self) -> Option<Handler> {
        match self {
            MainAction::CreateAccount => Some(accounts::create_account),
            MainAction::ModifyAccount => Some(accounts::modify_account),
            MainAction::DeleteAccount => Some(accounts::delete_account),
            MainAction::ListRegular => Some(reports::list_regular_accounts),
            MainAction::ListSystem => Some(reports::list_system_accounts),
            MainAction::ManageGroups => Some(groups::manage_groups),
            MainAction::Statistics => Some(reports::system_statistics),
            MainAction::Exit => None,
        }
    }
}

/// Build numbered menu rows for a fixed list of labels.
pub(crate) fn numbered_items<'s>(labels: impl IntoIterator<Item = &'s str>) -> Vec<MenuItem> {
    labels
        .into_iter()
        .enumerate()
        .map(|(i, label)| MenuItem::new((i + 1).to_string(), label))
        .collect()
}

/// Top-level loop. Returns when the operator picks Exit or cancels the menu.
pub fn run_menu(session: &mut Session<'_>) -> Result<()> {
    let items = numbered_items(MainAction::ALL.iter().map(|a| a.label()));
    loop {
        let Some(choice) =
            session.dialogs.menu("Main menu", "Account and group administration", &items)?
        else {
            break;
        };
        let action = MainAction::ALL[choice];
        let Some(handler) = action.handler() else {
            break;
        };
        tracing::info!(?action, "dispatching");
        handler(session)?;
    }
    tracing::info!("leaving main menu");
    Ok(())
}

/// Unwrap a backend query, showing the error and yielding `None` on failure.
pub(crate) fn query<T>(dialogs: &mut dyn Dialogs, title: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            dialogs.error(title, &format!("Could not read the account database.\n\n{err:#}"))?;
            Ok(None)
        }
    }
}

/// Report the outcome of one command. Returns whether it succeeded.
pub(crate) fn report(
    dialogs: &mut dyn Dialogs,
    title: &str,
    result: Result<()>,
    success: &str,
    failure: &str,
) -> Result<bool> {
    match result {
        Ok(()) => {
            dialogs.message(title, success)?;
            Ok(true)
        }
        Err(err) => {
            dialogs.error(title, &format!("{failure}\n\n{err:#}"))?;
            Ok(false)
        }
    }
}

/// Let the operator pick one account; `None` when cancelled or none qualify.
pub(crate) fn select_account(
    session: &mut Session<'_>,
    title: &str,
    prompt: &str,
    candidates: &[SystemUser],
) -> Result<Option<SystemUser>> {
    if candidates.is_empty() {
        session.dialogs.message(title, "No accounts are available for this action.")?;
        return Ok(None);
    }
    let items: Vec<MenuItem> = candidates
        .iter()
        .map(|u| {
            MenuItem::new(
                u.name.clone(),
                format!("uid {:<6} {}", u.uid, u.full_name.as_deref().unwrap_or("")),
            )
        })
        .collect();
    let choice = session.dialogs.menu(title, prompt, &items)?;
    Ok(choice.and_then(|i| candidates.get(i).cloned()))
}

pub(crate) fn select_group(
    session: &mut Session<'_>,
    title: &str,
    prompt: &str,
    candidates: &[SystemGroup],
) -> Result<Option<SystemGroup>> {
    if candidates.is_empty() {
        session.dialogs.message(title, "No groups are available for this action.")?;
        return Ok(None);
    }
    let items: Vec<MenuItem> = candidates
        .iter()
        .map(|g| MenuItem::new(g.name.clone(), format!("gid {}", g.gid)))
        .collect();
    let choice = session.dialogs.menu(title, prompt, &items)?;
    Ok(choice.and_then(|i| candidates.get(i).cloned()))
}
