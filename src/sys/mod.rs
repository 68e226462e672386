//! System interaction layer: live account/group queries and the
//! account-management commands that mutate them.
//!
//! Nothing here is cached. Every call re-reads the account database or runs
//! the relevant utility, so changes made by another administrator session are
//! visible on the next query.

use anyhow::Context;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use crate::error::{CommandError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemUser {
    pub uid: u32,
    pub name: String,
    pub primary_gid: u32,
    pub full_name: Option<String>,
    pub home_dir: String,
    pub shell: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemGroup {
    pub gid: u32,
    pub name: String,
    pub members: Vec<String>,
}

/// Password state as reported by `passwd -S`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordStatus {
    Locked,
    Set,
    Empty,
    Unknown,
}

impl PasswordStatus {
    pub fn label(self) -> &'static str {
        match self {
            PasswordStatus::Locked => "Locked",
            PasswordStatus::Set => "Set",
            PasswordStatus::Empty => "No password",
            PasswordStatus::Unknown => "Unknown",
        }
    }
}

/// Parameters for `useradd`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub full_name: String,
    pub create_home: bool,
}

/// Everything the menu handlers need from the operating system.
///
/// `SystemAdapter` implements it with the real utilities; tests substitute an
/// in-memory database.
pub trait AccountBackend {
    fn list_users(&self) -> Result<Vec<SystemUser>>;
    fn list_groups(&self) -> Result<Vec<SystemGroup>>;

    fn find_user(&self, name: &str) -> Result<Option<SystemUser>> {
        Ok(self.list_users()?.into_iter().find(|u| u.name == name))
    }

    fn find_group(&self, name: &str) -> Result<Option<SystemGroup>> {
        Ok(self.list_groups()?.into_iter().find(|g| g.name == name))
    }

    /// Names of every group the account belongs to, primary group included.
    fn group_names_for_user(&self, username: &str) -> Result<Vec<String>>;
    fn password_status(&self, username: &str) -> Result<PasswordStatus>;
    fn list_shells(&self) -> Result<Vec<String>>;

    fn create_user(&self, user: &NewUser) -> Result<()>;
    fn delete_user(&self, username: &str, remove_home: bool) -> Result<()>;
    fn set_password(&self, username: &str, password: &str) -> Result<()>;
    fn change_fullname(&self, username: &str, full_name: &str) -> Result<()>;
    fn change_shell(&self, username: &str, shell: &str) -> Result<()>;
    fn set_locked(&self, username: &str, locked: bool) -> Result<()>;
    fn add_user_to_group(&self, username: &str, groupname: &str) -> Result<()>;
    fn remove_user_from_group(&self, username: &str, groupname: &str) -> Result<()>;
    fn create_group(&self, groupname: &str) -> Result<()>;
    fn delete_group(&self, groupname: &str) -> Result<()>;

    fn os_release(&self) -> Result<String>;
    fn disk_usage(&self) -> Result<String>;
    fn memory_usage(&self) -> Result<String>;
}

/// Backend that shells out to the standard account-management utilities.
/// The process is expected to run as root; nothing is wrapped in `sudo`.
#[derive(Clone, Debug, Default)]
pub struct SystemAdapter;

impl SystemAdapter {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        tracing::debug!(command = cmd, ?args, "running");
        Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to execute {cmd}"))
    }

    /// Run a command and turn a non-zero exit into a `CommandError`.
    fn run_checked(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let output = self.run(cmd, args)?;
        if output.status.success() {
            Ok(output)
        } else {
            let err = CommandError::from_output(display_command(cmd, args), &output);
            tracing::warn!(%err, "command failed");
            Err(err.into())
        }
    }

    fn stdout_of(&self, cmd: &str, args: &[&str]) -> Result<String> {
        let output = self.run_checked(cmd, args)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl AccountBackend for SystemAdapter {
    fn list_users(&self) -> Result<Vec<SystemUser>> {
        #[cfg(feature = "file-parse")]
        let contents = std::fs::read_to_string("/etc/passwd").context("reading /etc/passwd")?;
        #[cfg(not(feature = "file-parse"))]
        let contents = self.stdout_of("getent", &["passwd"])?;
        Ok(parse_passwd(&contents))
    }

    fn list_groups(&self) -> Result<Vec<SystemGroup>> {
        #[cfg(feature = "file-parse")]
        let contents = std::fs::read_to_string("/etc/group").context("reading /etc/group")?;
        #[cfg(not(feature = "file-parse"))]
        let contents = self.stdout_of("getent", &["group"])?;
        Ok(parse_group(&contents))
    }

    #[cfg(not(feature = "file-parse"))]
    fn find_user(&self, name: &str) -> Result<Option<SystemUser>> {
        // getent exits 2 when the key is unknown
        let output = self.run("getent", &["passwd", name])?;
        match output.status.code() {
            Some(0) => Ok(parse_passwd(&String::from_utf8_lossy(&output.stdout)).into_iter().next()),
            Some(2) => Ok(None),
            _ => Err(CommandError::from_output(format!("getent passwd {name}"), &output).into()),
        }
    }

    #[cfg(not(feature = "file-parse"))]
    fn find_group(&self, name: &str) -> Result<Option<SystemGroup>> {
        let output = self.run("getent", &["group", name])?;
        match output.status.code() {
            Some(0) => Ok(parse_group(&String::from_utf8_lossy(&output.stdout)).into_iter().next()),
            Some(2) => Ok(None),
            _ => Err(CommandError::from_output(format!("getent group {name}"), &output).into()),
        }
    }

    fn group_names_for_user(&self, username: &str) -> Result<Vec<String>> {
        let out = self.stdout_of("id", &["-nG", username])?;
        Ok(out.split_whitespace().map(str::to_string).collect())
    }

    fn password_status(&self, username: &str) -> Result<PasswordStatus> {
        let out = self.stdout_of("passwd", &["-S", username])?;
        Ok(parse_password_status(&out))
    }

    fn list_shells(&self) -> Result<Vec<String>> {
        let contents = std::fs::read_to_string("/etc/shells").context("reading /etc/shells")?;
        Ok(parse_shells(&contents))
    }

    fn create_user(&self, user: &NewUser) -> Result<()> {
        let mut args: Vec<&str> = Vec::new();
        args.push(if user.create_home { "-m" } else { "-M" });
        if !user.full_name.is_empty() {
            args.push("-c");
            args.push(&user.full_name);
        }
        args.push(&user.name);
        self.run_checked("useradd", &args).map(|_| ())
    }

    fn delete_user(&self, username: &str, remove_home: bool) -> Result<()> {
        let mut args: Vec<&str> = Vec::new();
        if remove_home {
            args.push("-r");
        }
        args.push(username);
        self.run_checked("userdel", &args).map(|_| ())
    }

    fn set_password(&self, username: &str, password: &str) -> Result<()> {
        // chpasswd reads "user:password" lines from stdin; keep the secret off argv
        tracing::debug!(command = "chpasswd", username, "running");
        let mut child = Command::new("chpasswd")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn chpasswd")?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(format!("{username}:{password}\n").as_bytes())
                .context("writing to chpasswd")?;
        }
        let output = child.wait_with_output().context("waiting for chpasswd")?;
        if output.status.success() {
            Ok(())
        } else {
            let err = CommandError::from_output(format!("chpasswd ({username})"), &output);
            tracing::warn!(%err, "command failed");
            Err(err.into())
        }
    }

    fn change_fullname(&self, username: &str, full_name: &str) -> Result<()> {
        self.run_checked("usermod", &["-c", full_name, username]).map(|_| ())
    }

    fn change_shell(&self, username: &str, shell: &str) -> Result<()> {
        self.run_checked("usermod", &["-s", shell, username]).map(|_| ())
    }

    fn set_locked(&self, username: &str, locked: bool) -> Result<()> {
        let flag = if locked { "-L" } else { "-U" };
        self.run_checked("usermod", &[flag, username]).map(|_| ())
    }

    fn add_user_to_group(&self, username: &str, groupname: &str) -> Result<()> {
        self.run_checked("gpasswd", &["-a", username, groupname]).map(|_| ())
    }

    fn remove_user_from_group(&self, username: &str, groupname: &str) -> Result<()> {
        self.run_checked("gpasswd", &["-d", username, groupname]).map(|_| ())
    }

    fn create_group(&self, groupname: &str) -> Result<()> {
        self.run_checked("groupadd", &[groupname]).map(|_| ())
    }

    fn delete_group(&self, groupname: &str) -> Result<()> {
        self.run_checked("groupdel", &[groupname]).map(|_| ())
    }

    fn os_release(&self) -> Result<String> {
        let contents = std::fs::read_to_string("/etc/os-release")
            .or_else(|_| std::fs::read_to_string("/usr/lib/os-release"))
            .context("reading os-release")?;
        Ok(parse_os_release(&contents).unwrap_or_else(|| "unknown".to_string()))
    }

    fn disk_usage(&self) -> Result<String> {
        self.stdout_of("df", &["-h", "/"])
    }

    fn memory_usage(&self) -> Result<String> {
        self.stdout_of("free", &["-h"])
    }
}

fn display_command(cmd: &str, args: &[&str]) -> String {
    std::iter::once(cmd).chain(args.iter().copied()).collect::<Vec<_>>().join(" ")
}

/// Parse passwd(5) formatted text, as printed by `getent passwd`.
pub fn parse_passwd(contents: &str) -> Vec<SystemUser> {
    let mut users = Vec::new();
    for line in contents.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 7 {
            continue;
        }
        let (Ok(uid), Ok(gid)) = (parts[2].parse::<u32>(), parts[3].parse::<u32>()) else {
            continue;
        };
        // GECOS: full name is the first comma-separated field
        let full_name = parts[4]
            .split(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        users.push(SystemUser {
            uid,
            name: parts[0].to_string(),
            primary_gid: gid,
            full_name,
            home_dir: parts[5].to_string(),
            shell: parts[6].to_string(),
        });
    }
    users
}

/// Parse group(5) formatted text, as printed by `getent group`.
pub fn parse_group(contents: &str) -> Vec<SystemGroup> {
    let mut groups = Vec::new();
    for line in contents.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 3 {
            continue;
        }
        let Ok(gid) = parts[2].parse::<u32>() else {
            continue;
        };
        let members = match parts.get(3) {
            Some(list) if !list.is_empty() => list
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        groups.push(SystemGroup { gid, name: parts[0].to_string(), members });
    }
    groups
}

pub fn parse_shells(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Second field of `passwd -S`: `L`/`LK` locked, `P`/`PS` usable, `NP` empty.
pub fn parse_password_status(line: &str) -> PasswordStatus {
    match line.split_whitespace().nth(1) {
        Some("L") | Some("LK") => PasswordStatus::Locked,
        Some("P") | Some("PS") => PasswordStatus::Set,
        Some("NP") => PasswordStatus::Empty,
        _ => PasswordStatus::Unknown,
    }
}

/// `PRETTY_NAME` from os-release(5), falling back to `NAME`.
pub fn parse_os_release(contents: &str) -> Option<String> {
    let value = |key: &str| {
        contents.lines().find_map(|line| {
            let (k, v) = line.split_once('=')?;
            (k.trim() == key).then(|| v.trim().trim_matches('"').trim_matches('\'').to_string())
        })
    };
    value("PRETTY_NAME").or_else(|| value("NAME")).filter(|s| !s.is_empty())
}

/// Whether the process runs with an effective uid of 0.
pub fn is_root() -> bool {
    users::get_effective_uid() == 0
}

/// The account on whose behalf the tool runs: `SUDO_USER` when launched
/// through sudo, otherwise the owner of the process.
pub fn invoking_username() -> Option<String> {
    if let Ok(name) = std::env::var("SUDO_USER")
        && !name.is_empty()
    {
        return Some(name);
    }
    users::get_current_username().map(|n| n.to_string_lossy().into_owned())
}
