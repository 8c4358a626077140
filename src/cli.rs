use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser};
use serde::Serialize;
use tracing::info;

use crate::browser::BrowserState;
use crate::config::{ColorChoice, Config, Overrides};
use crate::controller::Controller;
use crate::error::StartupError;
use crate::metrics::{MetricsCollector, SystemSnapshot};
use crate::processes::{ProcessRecord, ProcessRegistry};
use crate::runner::CommandRunner;
use crate::sources::{HostSources, SystemSources};
use crate::tui::{self, theme::Theme};

#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(version)]
#[command(about = "Watch this host: CPU, memory, disk, processes, files and a command shell")]
#[command(long_about = "hostwatch is an interactive terminal system monitor. It samples host \
    metrics on a fixed cadence, lists the busiest processes (and can terminate them), \
    browses the filesystem and runs one-shot shell commands.\n\n\
    Examples:\n  \
    hostwatch                       # Start the monitor\n  \
    hostwatch --refresh-ms 1000     # Refresh every second\n  \
    hostwatch --dir /var/log        # Open the file browser in /var/log\n  \
    hostwatch --dump                # Print one JSON sample and exit")]
pub struct Cli {
    /// Configuration file [default: <config dir>/hostwatch/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Refresh cadence for the Dashboard and Processes views, in milliseconds
    #[arg(long, value_name = "MS")]
    pub refresh_ms: Option<u64>,

    /// Number of processes to list
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Mount point whose disk usage is shown
    #[arg(long, value_name = "PATH")]
    pub mount: Option<PathBuf>,

    /// Directory the file browser opens in
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Seconds a Terminal command may run before it is killed
    #[arg(long, value_name = "SECS")]
    pub command_timeout: Option<u64>,

    /// When to use color
    #[arg(long, value_enum, value_name = "WHEN")]
    pub color: Option<ColorChoice>,

    /// Append logs to this file (the screen belongs to the UI)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Print one JSON sample of the host and its top processes, then exit
    #[arg(long)]
    pub dump: bool,

    /// Increase log verbosity (-v, -vv for more)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// What `--dump` prints.
#[derive(Debug, Serialize)]
pub struct Dump {
    pub system: SystemSnapshot,
    pub processes: Vec<ProcessRecord>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            refresh_ms: self.refresh_ms,
            top: self.top,
            mount_point: self.mount.clone(),
            start_dir: self.dir.clone(),
            command_timeout_secs: self.command_timeout,
            color: self.color,
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        crate::logging::init(self.log_file.as_deref(), self.verbose, self.quiet)?;

        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(StartupError::UnsupportedHost(std::env::consts::OS).into());
        }

        let config = self.load_config()?;
        let mut sources = build_sources(&config);

        if self.dump {
            let dump = collect_dump(&mut sources, config.processes.top)?;
            println!("{}", serde_json::to_string_pretty(&dump)?);
            return Ok(());
        }

        if !std::io::stdout().is_terminal() {
            return Err(StartupError::NotATerminal.into());
        }

        let home = directories::UserDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
        let start_dir = start_directory(&config, home.as_deref())?;
        let browser = BrowserState::open(&start_dir).map_err(StartupError::StartDirectory)?;
        let theme = Theme::detect(config.ui.color);
        info!(
            start_dir = %browser.current_path().display(),
            color = theme.uses_color(),
            cadence = ?config.refresh_interval(),
            "starting monitor"
        );

        let mut controller = Controller::new(sources, browser, config.controller_options(home));
        tui::run(&mut controller, theme)
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let config = Config::resolve(self.config.as_deref(), &self.overrides())
            .map_err(StartupError::from)?;
        Ok(config)
    }
}

fn build_sources(config: &Config) -> SystemSources {
    SystemSources::new(
        MetricsCollector::new(config.disk.mount_point.clone()),
        ProcessRegistry::new(config.terminate_grace()),
        CommandRunner::new(config.command.shell.clone(), config.command.output_limit_bytes),
    )
}

/// Configured directory, else home, else the working directory.
fn start_directory(config: &Config, home: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = &config.files.start_dir {
        return Ok(dir.clone());
    }
    if let Some(home) = home {
        return Ok(home.to_path_buf());
    }
    std::env::current_dir().context("Failed to determine the working directory")
}

/// Sample once and list processes over a short interval so CPU figures are real.
pub fn collect_dump<S: HostSources>(sources: &mut S, top: usize) -> anyhow::Result<Dump> {
    let system = sources.sample().context("Failed to sample host metrics")?;
    // The first listing only establishes the CPU baseline
    sources.list_top(top);
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    let processes = sources.list_top(top);
    Ok(Dump { system, processes })
}
