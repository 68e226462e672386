//! usrgrp-admin binary entry point.
//!
//! Parses the command line, checks that we run as root on a terminal, then
//! drives the main menu until the operator exits. The terminal is restored
//! on every path out of the menu.
//!
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use crossterm::tty::IsTty;
use tracing_subscriber::EnvFilter;
use usrgrp_admin::app::settings::Settings;
use usrgrp_admin::app::theme::Theme;
use usrgrp_admin::app::{Session, run_menu};
use usrgrp_admin::error::{PreconditionError, Result};
use usrgrp_admin::sys::{self, SystemAdapter};
use usrgrp_admin::ui::tui::TuiDialogs;

const DEFAULT_CONFIG: &str = "/etc/usrgrp-admin.conf";

#[derive(Parser, Debug)]
#[command(name = "usrgrp-admin", version, about = "Menu-driven user and group administration")]
struct Cli {
    /// Settings file (`key = value` lines)
    #[arg(long, env = "USRGRP_ADMIN_CONFIG", default_value = DEFAULT_CONFIG)]
    config: String,

    /// Theme file; the built-in palette is used when absent
    #[arg(long, env = "USRGRP_ADMIN_THEME")]
    theme: Option<String>,

    /// First uid/gid treated as a regular account or group
    #[arg(long)]
    min_uid: Option<u32>,

    /// Placeholder uid that is never treated as regular
    #[arg(long)]
    nobody_uid: Option<u32>,

    /// Passwords shorter than this need confirmation
    #[arg(long)]
    min_password_len: Option<usize>,

    /// Append diagnostics to this file (filter with RUST_LOG)
    #[arg(long, env = "USRGRP_ADMIN_LOG")]
    log_file: Option<String>,

    /// Print the effective settings and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = Settings::load(&self.config);
        if let Some(v) = self.min_uid {
            settings.min_uid = v;
        }
        if let Some(v) = self.nobody_uid {
            settings.nobody_uid = v;
        }
        if let Some(v) = self.min_password_len {
            settings.min_password_len = v;
        }
        settings
    }
}

/// Diagnostics go to a file only; the terminal belongs to the dialogs.
fn init_logging(path: &str) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn check_preconditions() -> std::result::Result<(), PreconditionError> {
    if !std::io::stdin().is_tty() || !std::io::stdout().is_tty() {
        return Err(PreconditionError("usrgrp-admin needs an interactive terminal".into()));
    }
    if !sys::is_root() {
        return Err(PreconditionError(
            "usrgrp-admin must be run as root (try: sudo usrgrp-admin)".into(),
        ));
    }
    Ok(())
}

fn run(settings: &Settings, theme: Theme) -> Result<()> {
    let invoking_user = sys::invoking_username();
    let header = format!("usrgrp-admin ({})", invoking_user.as_deref().unwrap_or("root"));
    let mut dialogs = TuiDialogs::init(theme, header)?;
    let backend = SystemAdapter::new();
    let res = {
        let mut session = Session {
            backend: &backend,
            dialogs: &mut dialogs,
            settings,
            invoking_user,
        };
        run_menu(&mut session)
    };
    dialogs.restore()?;
    res
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file
        && let Err(err) = init_logging(path)
    {
        eprintln!("cannot open log file {path}: {err}");
    }

    let settings = cli.settings();
    if cli.print_config {
        print!("{}", settings.render());
        return ExitCode::SUCCESS;
    }
    let theme = cli.theme.as_deref().and_then(Theme::from_file).unwrap_or_default();

    if let Err(err) = check_preconditions() {
        eprintln!("{err}");
        return ExitCode::from(1);
    }

    tracing::info!(?settings, "starting");
    match run(&settings, theme) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "terminal failure");
            eprintln!("application error: {err:#}");
            ExitCode::from(2)
        }
    }
}
