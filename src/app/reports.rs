//! Read-only views: account listings and system statistics.

use std::fmt::Write;

use crate::app::settings::Settings;
use crate::app::{Session, query};
use crate::error::Result;
use crate::sys::SystemUser;

/// Accounts with `uid >= min_uid` that are not the placeholder account, by uid.
pub fn regular_accounts(users: &[SystemUser], settings: &Settings) -> Vec<SystemUser> {
    let mut out: Vec<SystemUser> =
        users.iter().filter(|u| settings.is_regular_id(u.uid)).cloned().collect();
    out.sort_by_key(|u| u.uid);
    out
}

/// Everything [`regular_accounts`] leaves out, by uid.
pub fn system_accounts(users: &[SystemUser], settings: &Settings) -> Vec<SystemUser> {
    let mut out: Vec<SystemUser> =
        users.iter().filter(|u| !settings.is_regular_id(u.uid)).cloned().collect();
    out.sort_by_key(|u| u.uid);
    out
}

pub fn format_account_table(users: &[SystemUser]) -> String {
    if users.is_empty() {
        return "No accounts.".to_string();
    }
    let name_w = users.iter().map(|u| u.name.len()).max().unwrap_or(0).max("USER".len());
    let home_w = users.iter().map(|u| u.home_dir.len()).max().unwrap_or(0).max("HOME".len());
    let mut out = String::new();
    let _ = writeln!(out, "{:<7} {:<name_w$}  {:<home_w$}  {:<16} FULL NAME", "UID", "USER", "HOME", "SHELL");
    for u in users {
        let _ = writeln!(
            out,
            "{:<7} {:<name_w$}  {:<home_w$}  {:<16} {}",
            u.uid,
            u.name,
            u.home_dir,
            u.shell,
            u.full_name.as_deref().unwrap_or("")
        );
    }
    let _ = write!(out, "\n{} account(s)", users.len());
    out
}

pub fn list_regular_accounts(session: &mut Session<'_>) -> Result<()> {
    const TITLE: &str = "Regular accounts";
    let Some(users) = query(session.dialogs, TITLE, session.backend.list_users())? else {
        return Ok(());
    };
    let text = format_account_table(&regular_accounts(&users, session.settings));
    session.dialogs.text_view(TITLE, &text)
}

pub fn list_system_accounts(session: &mut Session<'_>) -> Result<()> {
    const TITLE: &str = "System accounts";
    let Some(users) = query(session.dialogs, TITLE, session.backend.list_users())? else {
        return Ok(());
    };
    let text = format_account_table(&system_accounts(&users, session.settings));
    session.dialogs.text_view(TITLE, &text)
}

fn or_unavailable(result: Result<String>) -> String {
    match result {
        Ok(text) => text.trim_end().to_string(),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "statistics source unavailable");
            "unavailable".to_string()
        }
    }
}

/// Statistics text. Each source degrades to "unavailable" on its own.
pub fn statistics_text(session: &Session<'_>) -> String {
    let backend = session.backend;
    let mut out = String::new();
    let _ = writeln!(out, "Operating system: {}", or_unavailable(backend.os_release()));
    match backend.list_users() {
        Ok(users) => {
            let regular = users.iter().filter(|u| session.settings.is_regular_id(u.uid)).count();
            let _ = writeln!(out, "Regular accounts: {regular}");
            let _ = writeln!(out, "System accounts:  {}", users.len() - regular);
        }
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "could not count accounts");
            let _ = writeln!(out, "Accounts: unavailable");
        }
    }
    let groups = backend
        .list_groups()
        .map(|g| g.len().to_string())
        .unwrap_or_else(|_| "unavailable".to_string());
    let _ = writeln!(out, "Groups:           {groups}");
    let _ = writeln!(out, "\nDisk usage (/):\n{}", or_unavailable(backend.disk_usage()));
    let _ = write!(out, "\nMemory:\n{}", or_unavailable(backend.memory_usage()));
    out
}

pub fn system_statistics(session: &mut Session<'_>) -> Result<()> {
    let text = statistics_text(session);
    session.dialogs.text_view("System statistics", &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, uid: u32) -> SystemUser {
        SystemUser {
            uid,
            name: name.to_string(),
            primary_gid: uid,
            full_name: None,
            home_dir: format!("/home/{name}"),
            shell: "/bin/bash".to_string(),
        }
    }

    #[test]
    fn classifies_by_threshold_and_placeholder() {
        let users = vec![user("bob", 1001), user("root", 0), user("nobody", 65534), user("alice", 1000), user("daemon", 999)];
        let settings = Settings::default();
        let regular: Vec<String> = regular_accounts(&users, &settings).into_iter().map(|u| u.name).collect();
        assert_eq!(regular, vec!["alice", "bob"]);
        let system: Vec<String> = system_accounts(&users, &settings).into_iter().map(|u| u.name).collect();
        assert_eq!(system, vec!["root", "daemon", "nobody"]);
    }

    #[test]
    fn table_has_header_and_count() {
        let mut alice = user("alice", 1000);
        alice.full_name = Some("Alice A".into());
        let table = format_account_table(&[alice]);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("UID"));
        assert!(lines[1].starts_with("1000") && lines[1].ends_with("Alice A"));
        assert_eq!(lines.last(), Some(&"1 account(s)"));
        assert_eq!(format_account_table(&[]), "No accounts.");
    }
}
