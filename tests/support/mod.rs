// Shared fakes for the handler tests: an in-memory account database and a
// scripted operator.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::anyhow;
use usrgrp_admin::app::Session;
use usrgrp_admin::app::settings::Settings;
use usrgrp_admin::error::{CommandError, Result};
use usrgrp_admin::sys::{AccountBackend, NewUser, PasswordStatus, SystemGroup, SystemUser};
use usrgrp_admin::ui::{Dialogs, MenuItem};

pub fn user(name: &str, uid: u32, gid: u32) -> SystemUser {
    SystemUser {
        uid,
        name: name.to_string(),
        primary_gid: gid,
        full_name: None,
        home_dir: format!("/home/{name}"),
        shell: "/bin/bash".to_string(),
    }
}

pub fn group(name: &str, gid: u32, members: &[&str]) -> SystemGroup {
    SystemGroup {
        gid,
        name: name.to_string(),
        members: members.iter().map(|m| m.to_string()).collect(),
    }
}

/// In-memory account database that logs every mutating command it is asked
/// to run, in `useradd alice` form.
#[derive(Default)]
pub struct FakeBackend {
    pub users: RefCell<Vec<SystemUser>>,
    pub groups: RefCell<Vec<SystemGroup>>,
    pub status: RefCell<HashMap<String, PasswordStatus>>,
    /// Accounts whose home directory exists on disk.
    pub homes: RefCell<HashSet<String>>,
    pub commands: RefCell<Vec<String>>,
    /// Operations (`"set_password"`, `"change_shell"`, ...) that fail.
    pub failing: RefCell<Vec<&'static str>>,
}

impl FakeBackend {
    /// root, daemon, nobody, alice (1000), bob (1001), `sudo` with no members.
    pub fn seeded() -> Self {
        let fake = Self::default();
        *fake.users.borrow_mut() = vec![
            SystemUser { home_dir: "/root".into(), ..user("root", 0, 0) },
            SystemUser { home_dir: "/".into(), shell: "/usr/sbin/nologin".into(), ..user("daemon", 1, 1) },
            SystemUser { home_dir: "/nonexistent".into(), shell: "/usr/sbin/nologin".into(), ..user("nobody", 65534, 65534) },
            SystemUser { full_name: Some("Alice A".into()), ..user("alice", 1000, 1000) },
            user("bob", 1001, 1001),
        ];
        *fake.homes.borrow_mut() = ["root", "alice", "bob"].iter().map(|n| n.to_string()).collect();
        *fake.groups.borrow_mut() = vec![
            group("root", 0, &[]),
            group("daemon", 1, &[]),
            group("sudo", 27, &[]),
            group("alice", 1000, &[]),
            group("bob", 1001, &[]),
            group("nogroup", 65534, &[]),
        ];
        fake
    }

    pub fn fail(&self, op: &'static str) {
        self.failing.borrow_mut().push(op);
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.users.borrow().iter().any(|u| u.name == name)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.borrow().iter().any(|g| g.name == name)
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.commands.borrow().iter().any(|c| c.starts_with(prefix))
    }

    fn record(&self, op: &'static str, command: String) -> Result<()> {
        self.commands.borrow_mut().push(command.clone());
        if self.failing.borrow().contains(&op) {
            return Err(anyhow!(CommandError {
                command,
                status: Some(1),
                stderr: format!("{op}: simulated failure"),
            }));
        }
        Ok(())
    }

    fn next_id(ids: impl Iterator<Item = u32>) -> u32 {
        ids.filter(|id| (1000..65534).contains(id)).max().map_or(1000, |m| m + 1)
    }
}

impl AccountBackend for FakeBackend {
    fn list_users(&self) -> Result<Vec<SystemUser>> {
        Ok(self.users.borrow().clone())
    }

    fn list_groups(&self) -> Result<Vec<SystemGroup>> {
        Ok(self.groups.borrow().clone())
    }

    fn group_names_for_user(&self, username: &str) -> Result<Vec<String>> {
        let Some(u) = self.users.borrow().iter().find(|u| u.name == username).cloned() else {
            return Err(anyhow!("id: '{username}': no such user"));
        };
        Ok(self
            .groups
            .borrow()
            .iter()
            .filter(|g| g.gid == u.primary_gid || g.members.contains(&u.name))
            .map(|g| g.name.clone())
            .collect())
    }

    fn password_status(&self, username: &str) -> Result<PasswordStatus> {
        Ok(self.status.borrow().get(username).copied().unwrap_or(PasswordStatus::Set))
    }

    fn list_shells(&self) -> Result<Vec<String>> {
        Ok(vec!["/bin/sh".into(), "/bin/bash".into(), "/usr/bin/zsh".into()])
    }

    fn create_user(&self, new: &NewUser) -> Result<()> {
        let flag = if new.create_home { "-m" } else { "-M" };
        self.record("create_user", format!("useradd {flag} {}", new.name))?;
        if self.has_user(&new.name) {
            return Err(anyhow!("useradd: user '{}' already exists", new.name));
        }
        let uid = Self::next_id(self.users.borrow().iter().map(|u| u.uid));
        let gid = Self::next_id(self.groups.borrow().iter().map(|g| g.gid)).max(uid);
        self.groups.borrow_mut().push(group(&new.name, gid, &[]));
        let full_name = (!new.full_name.is_empty()).then(|| new.full_name.clone());
        self.users.borrow_mut().push(SystemUser { full_name, ..user(&new.name, uid, gid) });
        self.status.borrow_mut().insert(new.name.clone(), PasswordStatus::Empty);
        if new.create_home {
            self.homes.borrow_mut().insert(new.name.clone());
        }
        Ok(())
    }

    fn delete_user(&self, username: &str, remove_home: bool) -> Result<()> {
        let flag = if remove_home { " -r" } else { "" };
        self.record("delete_user", format!("userdel{flag} {username}"))?;
        let mut users = self.users.borrow_mut();
        let Some(pos) = users.iter().position(|u| u.name == username) else {
            return Err(anyhow!("userdel: user '{username}' does not exist"));
        };
        let removed = users.remove(pos);
        let mut groups = self.groups.borrow_mut();
        groups.retain(|g| !(g.gid == removed.primary_gid && g.name == removed.name));
        for g in groups.iter_mut() {
            g.members.retain(|m| m != username);
        }
        self.status.borrow_mut().remove(username);
        // like shadow-utils: the row is gone, but a missing home exits 12
        if !self.homes.borrow_mut().remove(username) && remove_home {
            return Err(anyhow!(CommandError {
                command: format!("userdel -r {username}"),
                status: Some(12),
                stderr: format!("userdel: {username} home directory ({}) not found", removed.home_dir),
            }));
        }
        Ok(())
    }

    fn set_password(&self, username: &str, _password: &str) -> Result<()> {
        self.record("set_password", format!("chpasswd {username}"))?;
        self.status.borrow_mut().insert(username.to_string(), PasswordStatus::Set);
        Ok(())
    }

    fn change_fullname(&self, username: &str, full_name: &str) -> Result<()> {
        self.record("change_fullname", format!("usermod -c {full_name} {username}"))?;
        if let Some(u) = self.users.borrow_mut().iter_mut().find(|u| u.name == username) {
            u.full_name = (!full_name.is_empty()).then(|| full_name.to_string());
        }
        Ok(())
    }

    fn change_shell(&self, username: &str, shell: &str) -> Result<()> {
        self.record("change_shell", format!("usermod -s {shell} {username}"))?;
        if let Some(u) = self.users.borrow_mut().iter_mut().find(|u| u.name == username) {
            u.shell = shell.to_string();
        }
        Ok(())
    }

    fn set_locked(&self, username: &str, locked: bool) -> Result<()> {
        let flag = if locked { "-L" } else { "-U" };
        self.record("set_locked", format!("usermod {flag} {username}"))?;
        let status = if locked { PasswordStatus::Locked } else { PasswordStatus::Set };
        self.status.borrow_mut().insert(username.to_string(), status);
        Ok(())
    }

    fn add_user_to_group(&self, username: &str, groupname: &str) -> Result<()> {
        self.record("add_user_to_group", format!("gpasswd -a {username} {groupname}"))?;
        let mut groups = self.groups.borrow_mut();
        let Some(g) = groups.iter_mut().find(|g| g.name == groupname) else {
            return Err(anyhow!("gpasswd: group '{groupname}' does not exist"));
        };
        if !g.members.iter().any(|m| m == username) {
            g.members.push(username.to_string());
        }
        Ok(())
    }

    fn remove_user_from_group(&self, username: &str, groupname: &str) -> Result<()> {
        self.record("remove_user_from_group", format!("gpasswd -d {username} {groupname}"))?;
        if let Some(g) = self.groups.borrow_mut().iter_mut().find(|g| g.name == groupname) {
            g.members.retain(|m| m != username);
        }
        Ok(())
    }

    fn create_group(&self, groupname: &str) -> Result<()> {
        self.record("create_group", format!("groupadd {groupname}"))?;
        let gid = Self::next_id(self.groups.borrow().iter().map(|g| g.gid));
        self.groups.borrow_mut().push(group(groupname, gid, &[]));
        Ok(())
    }

    fn delete_group(&self, groupname: &str) -> Result<()> {
        self.record("delete_group", format!("groupdel {groupname}"))?;
        let mut groups = self.groups.borrow_mut();
        let Some(pos) = groups.iter().position(|g| g.name == groupname) else {
            return Err(anyhow!("groupdel: group '{groupname}' does not exist"));
        };
        let gid = groups[pos].gid;
        if let Some(owner) = self.users.borrow().iter().find(|u| u.primary_gid == gid) {
            return Err(anyhow!(CommandError {
                command: format!("groupdel {groupname}"),
                status: Some(8),
                stderr: format!("groupdel: cannot remove the primary group of user '{}'", owner.name),
            }));
        }
        groups.remove(pos);
        Ok(())
    }

    fn os_release(&self) -> Result<String> {
        Ok("Debian GNU/Linux 12 (bookworm)".into())
    }

    fn disk_usage(&self) -> Result<String> {
        Ok("Filesystem Size Used Avail Use% Mounted on\n/dev/sda1 20G 5G 15G 25% /\n".into())
    }

    fn memory_usage(&self) -> Result<String> {
        Err(anyhow!("free: command not found"))
    }
}

/// One scripted operator answer.
#[derive(Clone, Debug)]
pub enum Reply {
    /// Menu entry whose tag or label equals the text.
    Pick(&'static str),
    /// Checklist entries whose label is the text or starts with it plus a space.
    Check(Vec<&'static str>),
    /// Text for an input or password prompt.
    Text(&'static str),
    Yes,
    No,
    Cancel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shown {
    Message { title: String, text: String },
    Error { title: String, text: String },
    Text { title: String, text: String },
}

/// Answers prompts from a queue. Once the queue is empty every prompt is
/// cancelled, which unwinds any loop back to the caller.
#[derive(Default)]
pub struct ScriptedDialogs {
    pub replies: VecDeque<Reply>,
    pub shown: Vec<Shown>,
    /// Menu titles and the tags offered, in prompt order.
    pub menus: Vec<(String, Vec<String>)>,
    pub prompts: Vec<String>,
}

impl ScriptedDialogs {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self { replies: replies.into_iter().collect(), ..Default::default() }
    }

    fn next(&mut self, prompt: &str) -> Reply {
        self.prompts.push(prompt.to_string());
        self.replies.pop_front().unwrap_or(Reply::Cancel)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Error { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Message { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.shown
            .iter()
            .filter_map(|s| match s {
                Shown::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn exhausted(&self) -> bool {
        self.replies.is_empty()
    }
}

impl Dialogs for ScriptedDialogs {
    fn menu(&mut self, title: &str, prompt: &str, items: &[MenuItem]) -> Result<Option<usize>> {
        self.menus.push((title.to_string(), items.iter().map(|i| i.tag.clone()).collect()));
        match self.next(prompt) {
            Reply::Pick(want) => {
                let pos = items
                    .iter()
                    .position(|i| i.tag == want || i.label == want)
                    .unwrap_or_else(|| panic!("menu {title:?} has no entry {want:?}: {items:?}"));
                Ok(Some(pos))
            }
            Reply::Cancel => Ok(None),
            other => panic!("menu {title:?} got {other:?}"),
        }
    }

    fn checklist(&mut self, title: &str, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        match self.next(prompt) {
            Reply::Check(wanted) => Ok(Some(
                items
                    .iter()
                    .enumerate()
                    .filter(|(_, label)| {
                        wanted.iter().any(|w| label.as_str() == *w || label.starts_with(&format!("{w} ")))
                    })
                    .map(|(i, _)| i)
                    .collect(),
            )),
            Reply::Cancel => Ok(None),
            other => panic!("checklist {title:?} got {other:?}"),
        }
    }

    fn input(&mut self, title: &str, prompt: &str, _initial: &str) -> Result<Option<String>> {
        match self.next(prompt) {
            Reply::Text(text) => Ok(Some(text.to_string())),
            Reply::Cancel => Ok(None),
            other => panic!("input {title:?} / {prompt:?} got {other:?}"),
        }
    }

    fn password(&mut self, title: &str, prompt: &str) -> Result<Option<String>> {
        self.input(title, prompt, "")
    }

    fn confirm(&mut self, title: &str, question: &str, _default_yes: bool) -> Result<Option<bool>> {
        match self.next(question) {
            Reply::Yes => Ok(Some(true)),
            Reply::No => Ok(Some(false)),
            Reply::Cancel => Ok(None),
            other => panic!("confirm {title:?} / {question:?} got {other:?}"),
        }
    }

    fn message(&mut self, title: &str, text: &str) -> Result<()> {
        self.shown.push(Shown::Message { title: title.into(), text: text.into() });
        Ok(())
    }

    fn error(&mut self, title: &str, text: &str) -> Result<()> {
        self.shown.push(Shown::Error { title: title.into(), text: text.into() });
        Ok(())
    }

    fn text_view(&mut self, title: &str, text: &str) -> Result<()> {
        self.shown.push(Shown::Text { title: title.into(), text: text.into() });
        Ok(())
    }
}

/// Run `f` against a session over `backend` and `dialogs` as `invoking_user`.
pub fn with_session<R>(
    backend: &FakeBackend,
    dialogs: &mut ScriptedDialogs,
    invoking_user: Option<&str>,
    f: impl FnOnce(&mut Session<'_>) -> R,
) -> R {
    let settings = Settings::default();
    let mut session = Session {
        backend,
        dialogs,
        settings: &settings,
        invoking_user: invoking_user.map(str::to_string),
    };
    f(&mut session)
}
