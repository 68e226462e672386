//! Library crate for usrgrp-admin.
//!
//! This crate exposes the building blocks of the menu:
//! - Menu dispatcher, handlers and settings (`app`)
//! - Error and result types (`error`)
//! - System interaction layer for users/groups (`sys`)
//! - Dialogs and their terminal rendering (`ui`)
//! - Name and password checks (`validate`)
//!
//! It is used by the `usrgrp-admin` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod app;
pub mod error;
pub mod sys;
pub mod ui;
pub mod validate;

/// Convenient error and result types shared across the crate.
pub use error::Result;
