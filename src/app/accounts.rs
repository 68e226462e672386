//! Account handlers: create, modify (nested loop) and delete.

use crate::app::rollback::Rollback;
use crate::app::settings::Settings;
use crate::app::{Session, numbered_items, query, report, select_account};
use crate::error::{Result, ValidationError};
use crate::sys::{AccountBackend, NewUser, PasswordStatus, SystemUser};
use crate::ui::MenuItem;
use crate::validate::{is_weak_password, validate_comment, validate_name};

/// Administrative groups, tried in order. Other conventions are not guessed.
pub const ADMIN_GROUPS: [&str; 2] = ["sudo", "wheel"];

/// Answers collected by the create-account dialogs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccountForm {
    pub name: String,
    pub full_name: String,
    pub admin: bool,
    pub create_home: bool,
}

pub fn create_account(session: &mut Session<'_>) -> Result<()> {
    const TITLE: &str = "Create account";
    let Some(form) = collect_new_account(session)? else {
        return Ok(());
    };
    let backend = session.backend;
    let new_user = NewUser {
        name: form.name.clone(),
        full_name: form.full_name.clone(),
        create_home: form.create_home,
    };
    if let Err(err) = backend.create_user(&new_user) {
        session.dialogs.error(TITLE, &format!("Could not create account '{}'.\n\n{err:#}", form.name))?;
        return Ok(());
    }
    tracing::info!(account = %form.name, "account created");

    let mut rollback = Rollback::new(format!("create account {}", form.name));
    let undo_name = form.name.clone();
    // `userdel -r` fails when useradd -M left no home behind
    let remove_home = form.create_home;
    rollback.register(format!("delete account {undo_name}"), move || {
        backend.delete_user(&undo_name, remove_home)
    });

    let mut notes = Vec::new();
    if form.admin {
        notes.push(match grant_admin(backend, &form.name) {
            Ok(Some(group)) => format!("Added to administrative group '{group}'."),
            Ok(None) => format!(
                "Neither '{}' nor '{}' exists; administrator rights were not granted.",
                ADMIN_GROUPS[0], ADMIN_GROUPS[1]
            ),
            Err(err) => format!("Could not grant administrator rights: {err:#}"),
        });
    }

    let Some(password) = prompt_new_password(session, TITLE, &form.name)? else {
        let failures = rollback.unwind();
        let mut text = format!("Account creation cancelled; '{}' was removed again.", form.name);
        append_failures(&mut text, &failures);
        session.dialogs.message(TITLE, &text)?;
        return Ok(());
    };
    if let Err(err) = backend.set_password(&form.name, &password) {
        let failures = rollback.unwind();
        let mut text = format!(
            "Could not set the password; account '{}' was removed again.\n\n{err:#}",
            form.name
        );
        append_failures(&mut text, &failures);
        session.dialogs.error(TITLE, &text)?;
        return Ok(());
    }
    rollback.commit();

    let mut text = format!("Account '{}' created.", form.name);
    for note in &notes {
        text.push('\n');
        text.push_str(note);
    }
    session.dialogs.message(TITLE, &text)?;
    Ok(())
}

fn append_failures(text: &mut String, failures: &[String]) {
    if !failures.is_empty() {
        text.push_str("\n\nCleanup failed:\n");
        text.push_str(&failures.join("\n"));
    }
}

/// Name, full name and the two flags. Nothing on the system changes here.
pub fn collect_new_account(session: &mut Session<'_>) -> Result<Option<NewAccountForm>> {
    const TITLE: &str = "Create account";
    let mut last = String::new();
    let name = loop {
        let Some(name) = session.dialogs.input(TITLE, "Username:", &last)? else {
            return Ok(None);
        };
        let name = name.trim().to_string();
        if let Err(err) = validate_name("username", &name) {
            session.dialogs.error(TITLE, &err.to_string())?;
            last = name;
            continue;
        }
        let Some(existing) = query(session.dialogs, TITLE, session.backend.find_user(&name))? else {
            return Ok(None);
        };
        if existing.is_some() {
            let err = ValidationError::AlreadyExists { what: "account", value: name.clone() };
            session.dialogs.error(TITLE, &err.to_string())?;
            last = name;
            continue;
        }
        break name;
    };

    let full_name = loop {
        let Some(full_name) = session.dialogs.input(TITLE, &format!("Full name for '{name}':"), "")?
        else {
            return Ok(None);
        };
        match validate_comment("full name", &full_name) {
            Ok(()) => break full_name.trim().to_string(),
            Err(err) => session.dialogs.error(TITLE, &err.to_string())?,
        }
    };

    let Some(admin) =
        session.dialogs.confirm(TITLE, &format!("Grant administrator rights to '{name}'?"), false)?
    else {
        return Ok(None);
    };
    let Some(create_home) =
        session.dialogs.confirm(TITLE, &format!("Create a home directory for '{name}'?"), true)?
    else {
        return Ok(None);
    };
    Ok(Some(NewAccountForm { name, full_name, admin, create_home }))
}

/// Ask for a new password twice. Short passwords need confirmation; declining
/// counts as cancelling.
pub fn prompt_new_password(session: &mut Session<'_>, title: &str, username: &str) -> Result<Option<String>> {
    let min_len = session.settings.min_password_len;
    loop {
        let Some(password) = session.dialogs.password(title, &format!("New password for '{username}':"))?
        else {
            return Ok(None);
        };
        if password.is_empty() {
            let err = ValidationError::Empty { what: "password" };
            session.dialogs.error(title, &err.to_string())?;
            continue;
        }
        let Some(again) = session.dialogs.password(title, "Repeat the password:")? else {
            return Ok(None);
        };
        if again != password {
            session.dialogs.error(title, "The passwords do not match.")?;
            continue;
        }
        if is_weak_password(&password, min_len) {
            let question = format!("The password is shorter than {min_len} characters.\nUse it anyway?");
            if session.dialogs.confirm("Weak password", &question, false)? != Some(true) {
                return Ok(None);
            }
        }
        return Ok(Some(password));
    }
}

/// Add the account to the first administrative group that exists.
pub fn grant_admin(backend: &dyn AccountBackend, username: &str) -> Result<Option<&'static str>> {
    for group in ADMIN_GROUPS {
        if backend.find_group(group)?.is_some() {
            backend.add_user_to_group(username, group)?;
            return Ok(Some(group));
        }
    }
    Ok(None)
}

pub fn is_admin(group_names: &[String]) -> bool {
    group_names.iter().any(|g| ADMIN_GROUPS.contains(&g.as_str()))
}

/// Multi-line summary shown by "Show details".
pub fn account_details(backend: &dyn AccountBackend, settings: &Settings, username: &str) -> Result<String> {
    let user = backend
        .find_user(username)?
        .ok_or_else(|| ValidationError::NotFound { what: "account", value: username.to_string() })?;
    let primary = backend
        .list_groups()?
        .into_iter()
        .find(|g| g.gid == user.primary_gid)
        .map(|g| g.name)
        .unwrap_or_else(|| "?".to_string());
    let groups = backend.group_names_for_user(username)?;
    let status = backend.password_status(username).unwrap_or(PasswordStatus::Unknown);
    let kind = if settings.is_regular_id(user.uid) { "Regular" } else { "System" };

    Ok(format!(
        "Username: {}\nUID: {}\nPrimary group: {} ({})\nFull name: {}\nHome directory: {}\nShell: {}\nGroups: {}\nAccount type: {}\nPassword: {}\nAdministrator: {}",
        user.name,
        user.uid,
        primary,
        user.primary_gid,
        user.full_name.as_deref().unwrap_or(""),
        user.home_dir,
        user.shell,
        groups.join(", "),
        kind,
        status.label(),
        if is_admin(&groups) { "Yes" } else { "No" },
    ))
}

/// Sub-actions of the modify loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModifyAction {
    Password,
    FullName,
    AddGroups,
    RemoveGroup,
    Shell,
    ToggleLock,
    Details,
    Back,
}

type ModifyHandler = fn(&mut Session<'_>, &SystemUser) -> Result<()>;

impl ModifyAction {
    pub const ALL: [ModifyAction; 8] = [
        ModifyAction::Password,
        ModifyAction::FullName,
        ModifyAction::AddGroups,
        ModifyAction::RemoveGroup,
        ModifyAction::Shell,
        ModifyAction::ToggleLock,
        ModifyAction::Details,
        ModifyAction::Back,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ModifyAction::Password => "Change password",
            ModifyAction::FullName => "Change full name",
            ModifyAction::AddGroups => "Add to groups",
            ModifyAction::RemoveGroup => "Remove from group",
            ModifyAction::Shell => "Change login shell",
            ModifyAction::ToggleLock => "Lock / unlock account",
            ModifyAction::Details => "Show details",
            ModifyAction::Back => "Back to main menu",
        }
    }

    fn handler(self) -> Option<ModifyHandler> {
        match self {
            ModifyAction::Password => Some(change_password),
            ModifyAction::FullName => Some(change_full_name),
            ModifyAction::AddGroups => Some(add_groups),
            ModifyAction::RemoveGroup => Some(remove_group),
            ModifyAction::Shell => Some(change_shell),
            ModifyAction::ToggleLock => Some(toggle_lock),
            ModifyAction::Details => Some(show_details),
            ModifyAction::Back => None,
        }
    }
}

pub fn modify_account(session: &mut Session<'_>) -> Result<()> {
    const TITLE: &str = "Modify account";
    let Some(users) = query(session.dialogs, TITLE, session.backend.list_users())? else {
        return Ok(());
    };
    let candidates = crate::app::reports::regular_accounts(&users, session.settings);
    let Some(target) = select_account(session, TITLE, "Select the account to modify:", &candidates)? else {
        return Ok(());
    };

    let items = numbered_items(ModifyAction::ALL.iter().map(|a| a.label()));
    loop {
        // re-read every round; another session may have changed the account
        let Some(current) = query(session.dialogs, TITLE, session.backend.find_user(&target.name))? else {
            return Ok(());
        };
        let Some(user) = current else {
            session.dialogs.error(TITLE, &format!("Account '{}' no longer exists.", target.name))?;
            return Ok(());
        };
        let title = format!("Modify '{}'", user.name);
        let Some(choice) = session.dialogs.menu(&title, "Choose a change:", &items)? else {
            return Ok(());
        };
        let Some(handler) = ModifyAction::ALL[choice].handler() else {
            return Ok(());
        };
        handler(session, &user)?;
    }
}

fn change_password(session: &mut Session<'_>, user: &SystemUser) -> Result<()> {
    const TITLE: &str = "Change password";
    let Some(password) = prompt_new_password(session, TITLE, &user.name)? else {
        return Ok(());
    };
    let result = session.backend.set_password(&user.name, &password);
    report(
        session.dialogs,
        TITLE,
        result,
        &format!("Password of '{}' changed.", user.name),
        &format!("Could not change the password of '{}'.", user.name),
    )?;
    Ok(())
}

fn change_full_name(session: &mut Session<'_>, user: &SystemUser) -> Result<()> {
    const TITLE: &str = "Change full name";
    let current = user.full_name.clone().unwrap_or_default();
    let full_name = loop {
        let Some(value) = session.dialogs.input(TITLE, &format!("Full name for '{}':", user.name), &current)?
        else {
            return Ok(());
        };
        match validate_comment("full name", &value) {
            Ok(()) => break value.trim().to_string(),
            Err(err) => session.dialogs.error(TITLE, &err.to_string())?,
        }
    };
    let result = session.backend.change_fullname(&user.name, &full_name);
    report(
        session.dialogs,
        TITLE,
        result,
        &format!("Full name of '{}' set to '{}'.", user.name, full_name),
        &format!("Could not change the full name of '{}'.", user.name),
    )?;
    Ok(())
}

fn add_groups(session: &mut Session<'_>, user: &SystemUser) -> Result<()> {
    const TITLE: &str = "Add to groups";
    let Some(groups) = query(session.dialogs, TITLE, session.backend.list_groups())? else {
        return Ok(());
    };
    let available: Vec<_> = groups
        .into_iter()
        .filter(|g| g.gid != user.primary_gid && !g.members.iter().any(|m| m == &user.name))
        .collect();
    if available.is_empty() {
        session.dialogs.message(TITLE, &format!("'{}' already belongs to every group.", user.name))?;
        return Ok(());
    }
    let labels: Vec<String> = available.iter().map(|g| format!("{} ({})", g.name, g.gid)).collect();
    let Some(picked) = session.dialogs.checklist(
        TITLE,
        &format!("Select groups to add '{}' to:", user.name),
        &labels,
    )?
    else {
        return Ok(());
    };
    if picked.is_empty() {
        session.dialogs.message(TITLE, "No groups selected.")?;
        return Ok(());
    }

    let mut added = Vec::new();
    let mut failed = Vec::new();
    for group in picked.iter().filter_map(|&i| available.get(i)) {
        match session.backend.add_user_to_group(&user.name, &group.name) {
            Ok(()) => added.push(group.name.clone()),
            Err(err) => failed.push(format!("{}: {err:#}", group.name)),
        }
    }
    if failed.is_empty() {
        session.dialogs.message(TITLE, &format!("Added '{}' to: {}", user.name, added.join(", ")))?;
    } else {
        let mut text = String::new();
        if !added.is_empty() {
            text.push_str(&format!("Added to: {}\n\n", added.join(", ")));
        }
        text.push_str(&format!("Failed:\n{}", failed.join("\n")));
        session.dialogs.error(TITLE, &text)?;
    }
    Ok(())
}

fn remove_group(session: &mut Session<'_>, user: &SystemUser) -> Result<()> {
    const TITLE: &str = "Remove from group";
    let Some(groups) = query(session.dialogs, TITLE, session.backend.list_groups())? else {
        return Ok(());
    };
    let memberships: Vec<_> = groups
        .into_iter()
        .filter(|g| g.gid == user.primary_gid || g.members.iter().any(|m| m == &user.name))
        .collect();
    let Some(group) = crate::app::select_group(
        session,
        TITLE,
        &format!("Remove '{}' from which group?", user.name),
        &memberships,
    )?
    else {
        return Ok(());
    };
    if group.gid == user.primary_gid {
        session.dialogs.error(
            TITLE,
            &format!("'{}' is the primary group of '{}' and cannot be removed.", group.name, user.name),
        )?;
        return Ok(());
    }
    let result = session.backend.remove_user_from_group(&user.name, &group.name);
    report(
        session.dialogs,
        TITLE,
        result,
        &format!("Removed '{}' from '{}'.", user.name, group.name),
        &format!("Could not remove '{}' from '{}'.", user.name, group.name),
    )?;
    Ok(())
}

fn change_shell(session: &mut Session<'_>, user: &SystemUser) -> Result<()> {
    const TITLE: &str = "Change login shell";
    let Some(shells) = query(session.dialogs, TITLE, session.backend.list_shells())? else {
        return Ok(());
    };
    if shells.is_empty() {
        session.dialogs.message(TITLE, "No login shells are listed in /etc/shells.")?;
        return Ok(());
    }
    let items: Vec<MenuItem> = shells
        .iter()
        .enumerate()
        .map(|(i, sh)| {
            let label = if *sh == user.shell { format!("{sh} (current)") } else { sh.clone() };
            MenuItem::new((i + 1).to_string(), label)
        })
        .collect();
    let Some(choice) = session.dialogs.menu(
        TITLE,
        &format!("Current shell of '{}': {}", user.name, user.shell),
        &items,
    )?
    else {
        return Ok(());
    };
    let shell = &shells[choice];
    let result = session.backend.change_shell(&user.name, shell);
    report(
        session.dialogs,
        TITLE,
        result,
        &format!("Login shell of '{}' set to {shell}.", user.name),
        &format!("Could not change the login shell of '{}'.", user.name),
    )?;
    Ok(())
}

fn toggle_lock(session: &mut Session<'_>, user: &SystemUser) -> Result<()> {
    const TITLE: &str = "Lock / unlock account";
    let Some(status) = query(session.dialogs, TITLE, session.backend.password_status(&user.name))? else {
        return Ok(());
    };
    let lock = status != PasswordStatus::Locked;
    let (verb, done) = if lock { ("Lock", "locked") } else { ("Unlock", "unlocked") };
    let question = format!(
        "Account '{}' is currently {}.\n{verb} it?",
        user.name,
        if lock { "unlocked" } else { "locked" }
    );
    if session.dialogs.confirm(TITLE, &question, false)? != Some(true) {
        return Ok(());
    }
    let result = session.backend.set_locked(&user.name, lock);
    report(
        session.dialogs,
        TITLE,
        result,
        &format!("Account '{}' {done}.", user.name),
        &format!("Could not {} account '{}'.", verb.to_lowercase(), user.name),
    )?;
    Ok(())
}

fn show_details(session: &mut Session<'_>, user: &SystemUser) -> Result<()> {
    let details = account_details(session.backend, session.settings, &user.name);
    match details {
        Ok(text) => session.dialogs.text_view(&format!("Account '{}'", user.name), &text),
        Err(err) => session.dialogs.error("Show details", &format!("{err:#}")),
    }
}

pub fn delete_account(session: &mut Session<'_>) -> Result<()> {
    const TITLE: &str = "Delete account";
    let Some(users) = query(session.dialogs, TITLE, session.backend.list_users())? else {
        return Ok(());
    };
    let candidates: Vec<SystemUser> = crate::app::reports::regular_accounts(&users, session.settings)
        .into_iter()
        .filter(|u| Some(&u.name) != session.invoking_user.as_ref())
        .collect();
    let Some(user) = select_account(session, TITLE, "Select the account to delete:", &candidates)? else {
        return Ok(());
    };
    if Some(&user.name) == session.invoking_user.as_ref() {
        session.dialogs.error(TITLE, "You cannot delete the account you are running this tool as.")?;
        return Ok(());
    }

    let question = format!(
        "Really delete account '{}' (uid {})?\nThis cannot be undone.",
        user.name, user.uid
    );
    if session.dialogs.confirm(TITLE, &question, false)? != Some(true) {
        return Ok(());
    }
    let Some(remove_home) = session.dialogs.confirm(
        TITLE,
        &format!("Also remove the home directory ({}) and mail spool?", user.home_dir),
        false,
    )?
    else {
        return Ok(());
    };

    let result = session.backend.delete_user(&user.name, remove_home);
    report(
        session.dialogs,
        TITLE,
        result,
        &format!(
            "Account '{}' deleted{}.",
            user.name,
            if remove_home { " together with its home directory" } else { "" }
        ),
        &format!("Could not delete account '{}'.", user.name),
    )?;
    Ok(())
}
