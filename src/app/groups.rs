//! Group management loop: create, delete, list and show members.

use std::collections::BTreeSet;
use std::fmt::Write;

use crate::app::settings::Settings;
use crate::app::{Session, numbered_items, query, report, select_group};
use crate::error::{Result, ValidationError};
use crate::sys::{SystemGroup, SystemUser};
use crate::validate::validate_name;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupAction {
    Create,
    Delete,
    List,
    Members,
    Back,
}

impl GroupAction {
    pub const ALL: [GroupAction; 5] = [
        GroupAction::Create,
        GroupAction::Delete,
        GroupAction::List,
        GroupAction::Members,
        GroupAction::Back,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GroupAction::Create => "Create group",
            GroupAction::Delete => "Delete group",
            GroupAction::List => "List groups",
            GroupAction::Members => "Show group members",
            GroupAction::Back => "Back to main menu",
        }
    }

    fn handler(self) -> Option<crate::app::Handler> {
        match self {
            GroupAction::Create => Some(create_group),
            GroupAction::Delete => Some(delete_group),
            GroupAction::List => Some(list_groups),
            GroupAction::Members => Some(show_members),
            GroupAction::Back => None,
        }
    }
}

pub fn manage_groups(session: &mut Session<'_>) -> Result<()> {
    let items = numbered_items(GroupAction::ALL.iter().map(|a| a.label()));
    loop {
        let Some(choice) = session.dialogs.menu("Manage groups", "Choose an action:", &items)? else {
            return Ok(());
        };
        let Some(handler) = GroupAction::ALL[choice].handler() else {
            return Ok(());
        };
        handler(session)?;
    }
}

/// Explicit members plus accounts whose primary group this is, sorted and
/// without duplicates.
pub fn merged_members(group: &SystemGroup, users: &[SystemUser]) -> Vec<String> {
    let mut names: BTreeSet<String> = group.members.iter().cloned().collect();
    names.extend(users.iter().filter(|u| u.primary_gid == group.gid).map(|u| u.name.clone()));
    names.into_iter().collect()
}

/// Accounts that have `group` as their primary group.
pub fn primary_users<'u>(group: &SystemGroup, users: &'u [SystemUser]) -> Vec<&'u str> {
    users.iter().filter(|u| u.primary_gid == group.gid).map(|u| u.name.as_str()).collect()
}

fn create_group(session: &mut Session<'_>) -> Result<()> {
    const TITLE: &str = "Create group";
    let mut last = String::new();
    let name = loop {
        let Some(name) = session.dialogs.input(TITLE, "Group name:", &last)? else {
            return Ok(());
        };
        let name = name.trim().to_string();
        if let Err(err) = validate_name("group name", &name) {
            session.dialogs.error(TITLE, &err.to_string())?;
            last = name;
            continue;
        }
        let Some(existing) = query(session.dialogs, TITLE, session.backend.find_group(&name))? else {
            return Ok(());
        };
        if existing.is_some() {
            let err = ValidationError::AlreadyExists { what: "group", value: name.clone() };
            session.dialogs.error(TITLE, &err.to_string())?;
            last = name;
            continue;
        }
        break name;
    };
    let result = session.backend.create_group(&name);
    report(
        session.dialogs,
        TITLE,
        result,
        &format!("Group '{name}' created."),
        &format!("Could not create group '{name}'."),
    )?;
    Ok(())
}

fn delete_group(session: &mut Session<'_>) -> Result<()> {
    const TITLE: &str = "Delete group";
    let Some(groups) = query(session.dialogs, TITLE, session.backend.list_groups())? else {
        return Ok(());
    };
    let candidates: Vec<SystemGroup> =
        groups.into_iter().filter(|g| session.settings.is_regular_id(g.gid)).collect();
    let Some(group) = select_group(session, TITLE, "Select the group to delete:", &candidates)? else {
        return Ok(());
    };

    let Some(users) = query(session.dialogs, TITLE, session.backend.list_users())? else {
        return Ok(());
    };
    let owners = primary_users(&group, &users);
    if !owners.is_empty() {
        session.dialogs.error(
            TITLE,
            &format!(
                "Group '{}' is the primary group of: {}\nIt was not deleted.",
                group.name,
                owners.join(", ")
            ),
        )?;
        return Ok(());
    }

    let question = format!("Really delete group '{}' (gid {})?", group.name, group.gid);
    if session.dialogs.confirm(TITLE, &question, false)? != Some(true) {
        return Ok(());
    }
    let result = session.backend.delete_group(&group.name);
    report(
        session.dialogs,
        TITLE,
        result,
        &format!("Group '{}' deleted.", group.name),
        &format!("Could not delete group '{}'.", group.name),
    )?;
    Ok(())
}

/// One line per group: gid, name, kind and member count.
pub fn format_group_table(groups: &[SystemGroup], users: &[SystemUser], settings: &Settings) -> String {
    let width = groups.iter().map(|g| g.name.len()).max().unwrap_or(0).max("NAME".len());
    let mut out = format!("{:<7} {:<width$}  {:<7} MEMBERS\n", "GID", "NAME", "TYPE");
    for g in groups {
        let kind = if settings.is_regular_id(g.gid) { "user" } else { "system" };
        let members = merged_members(g, users).len();
        let _ = writeln!(out, "{:<7} {:<width$}  {:<7} {}", g.gid, g.name, kind, members);
    }
    out
}

fn list_groups(session: &mut Session<'_>) -> Result<()> {
    const TITLE: &str = "Groups";
    let Some(mut groups) = query(session.dialogs, TITLE, session.backend.list_groups())? else {
        return Ok(());
    };
    let Some(users) = query(session.dialogs, TITLE, session.backend.list_users())? else {
        return Ok(());
    };
    groups.sort_by_key(|g| g.gid);
    let text = format_group_table(&groups, &users, session.settings);
    session.dialogs.text_view(TITLE, &text)
}

fn show_members(session: &mut Session<'_>) -> Result<()> {
    const TITLE: &str = "Group members";
    let Some(mut groups) = query(session.dialogs, TITLE, session.backend.list_groups())? else {
        return Ok(());
    };
    groups.sort_by(|a, b| a.name.cmp(&b.name));
    let Some(group) = select_group(session, TITLE, "Show the members of which group?", &groups)? else {
        return Ok(());
    };
    let Some(users) = query(session.dialogs, TITLE, session.backend.list_users())? else {
        return Ok(());
    };
    let members = merged_members(&group, &users);
    let text = if members.is_empty() {
        format!("Group '{}' (gid {}) has no members.", group.name, group.gid)
    } else {
        format!("Group '{}' (gid {}):\n\n{}", group.name, group.gid, members.join("\n"))
    };
    session.dialogs.text_view(TITLE, &text)
}
