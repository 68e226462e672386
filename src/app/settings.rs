//! Runtime settings: parse `usrgrp-admin.conf` and merge command-line overrides.
//!
//! The file uses `<key> = <value>` lines. Comments (`#`) and blank lines are
//! skipped, unknown keys are ignored, and values that fail to parse keep the
//! previous value. The tool never writes this file; `render` produces the
//! text for `--print-config`.

use crate::validate::DEFAULT_MIN_PASSWORD_LEN;

/// Thresholds that decide which accounts and groups the menus offer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// First uid (and gid) treated as a regular, human account.
    pub min_uid: u32,
    /// Placeholder id of the `nobody` account, never regular.
    pub nobody_uid: u32,
    /// Shorter passwords need explicit confirmation.
    pub min_password_len: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { min_uid: 1000, nobody_uid: 65534, min_password_len: DEFAULT_MIN_PASSWORD_LEN }
    }
}

impl Settings {
    /// Regular accounts have `uid >= min_uid` and are not the placeholder id.
    pub fn is_regular_id(&self, id: u32) -> bool {
        id >= self.min_uid && id != self.nobody_uid
    }

    /// Load settings from `path`; a missing or unreadable file yields defaults.
    pub fn load(path: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(err) => {
                tracing::debug!(path, %err, "no settings file, using defaults");
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Self {
        let mut cfg = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((lhs, rhs)) = line.split_once('=') else {
                continue;
            };
            let (key, val) = (lhs.trim(), rhs.trim());
            match key {
                "min_uid" => cfg.min_uid = val.parse().unwrap_or(cfg.min_uid),
                "nobody_uid" => cfg.nobody_uid = val.parse().unwrap_or(cfg.nobody_uid),
                "min_password_len" => {
                    cfg.min_password_len = val.parse().unwrap_or(cfg.min_password_len)
                }
                _ => tracing::debug!(key, "ignoring unknown settings key"),
            }
        }
        cfg
    }

    pub fn render(&self) -> String {
        format!(
            "# usrgrp-admin settings\n\
             # First uid/gid of regular accounts and groups\n\
             min_uid = {}\n\
             # Placeholder id, never treated as regular\n\
             nobody_uid = {}\n\
             # Shorter passwords require confirmation\n\
             min_password_len = {}\n",
            self.min_uid, self.nobody_uid, self.min_password_len
        )
    }
}
