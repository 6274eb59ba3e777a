//! devgrep - grep across the output of many network devices.
//!
//! Runs one command on every selected device over SSH (or replays the
//! cached output from the previous run) and prints the matching lines,
//! prefixed with their source file when more than one device was queried.

#![forbid(unsafe_code)]

mod filter;
mod helpers;
mod output;

use anyhow::{Context, Result, bail};
use clap::Parser;
use devgrep_common::config::{DevgrepConfig, Sourced};
use devgrep_common::logging::{LogConfig, init_logging};
use devgrep_common::{
    CacheStore, CancelReason, CancelToken, DispatchConfig, DispatchMode, Dispatcher, SshOptions,
    SshSession, StaticInventory, aggregate, resolve,
};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use filter::LineFilter;

/// Exit status when the run finished but at least one device failed.
const EXIT_PARTIAL: u8 = 3;

#[derive(Parser)]
#[command(name = "devgrep")]
#[command(author, version, about = "Grep through command output from many network devices")]
struct Cli {
    /// Pattern to search for (case-insensitive regex)
    pattern: Option<String>,

    /// Devices or groups to query (`all` selects every device)
    devices: Vec<String>,

    /// Command to run on each device
    #[arg(long, default_value = "show run")]
    cmd: String,

    /// List devices and groups from the inventory
    #[arg(long)]
    list_devices: bool,

    /// Search the output cached by the previous run instead of connecting
    #[arg(long)]
    use_cache: bool,

    /// Print the total run time to stderr
    #[arg(long)]
    display_runtime: bool,

    /// Do not print the failed-devices section
    #[arg(long)]
    hide_failed: bool,

    /// Path to the inventory file
    #[arg(long)]
    inventory: Option<PathBuf>,

    /// Directory holding cached device output
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Maximum number of devices contacted at once
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=256))]
    concurrency: Option<u32>,

    /// Per-device timeout (e.g. 30s, 2m)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Login user for every device, overriding the inventory
    #[arg(long)]
    username: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let start = Instant::now();

    let mut config = DevgrepConfig::from_env().map_err(|errors| {
        let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::anyhow!("invalid configuration:\n  {}", joined.join("\n  "))
    })?;
    init_logging(&LogConfig::from_config(&config, cli.verbose));

    config.inventory.override_with(cli.inventory.clone());
    config.cache_dir.override_with(cli.cache_dir.clone());
    config.concurrency.override_with(cli.concurrency);
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = Sourced::from_cli(timeout.as_secs().max(1));
    }
    debug!(
        inventory = %config.inventory.value.display(),
        inventory_source = %config.inventory.describe_source(),
        cache_dir = %config.cache_dir.value.display(),
        cache_dir_source = %config.cache_dir.describe_source(),
        "configuration loaded"
    );

    if cli.list_devices {
        let inventory = load_inventory(&config)?;
        print_stdout(&output::render_inventory(&inventory))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(pattern) = cli.pattern.as_deref().filter(|_| !cli.devices.is_empty()) else {
        bail!("Grep pattern or devices not specified.");
    };

    let mut inventory = load_inventory(&config)?;
    if let Some(user) = &cli.username {
        inventory.override_user(user);
    }

    let targets = resolve(&cli.devices, &inventory);
    let mode = if cli.use_cache {
        DispatchMode::CacheOnly
    } else {
        DispatchMode::Live
    };
    info!(targets = targets.len(), mode = ?mode, "resolved targets");

    let cache = CacheStore::new(config.cache_dir.value.clone());
    let dispatcher = Dispatcher::new(
        SshSession::new(SshOptions::default()),
        cache,
        DispatchConfig {
            concurrency: config.concurrency.value as usize,
            device_timeout: config.device_timeout(),
            run_deadline: None,
        },
    );

    let cancel = CancelToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel(CancelReason::Interrupted);
            }
        })
    };
    let result = dispatcher.dispatch(&targets, &cli.cmd, mode, &cancel).await;
    interrupt.abort();
    let result = result?;

    let merged = aggregate(&result, dispatcher.cache());
    let line_filter = LineFilter::new(pattern);
    print_stdout(&merged.render(|line| line_filter.keeps(line), cli.hide_failed))?;

    if cli.display_runtime {
        eprintln!("Total time: {}", helpers::humanize_duration(start.elapsed()));
    }

    if merged.has_failures() {
        Ok(ExitCode::from(EXIT_PARTIAL))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn load_inventory(config: &DevgrepConfig) -> Result<StaticInventory> {
    let path = &config.inventory.value;
    StaticInventory::load(path).with_context(|| {
        format!(
            "failed to load inventory {} (from {})",
            path.display(),
            config.inventory.describe_source()
        )
    })
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    match stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush()) {
        Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
        other => other.context("failed to write output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_multiple_devices_and_defaults() {
        let cli = Cli::try_parse_from(["devgrep", "interface", "cisco", "pynet_rtr3"]).unwrap();
        assert_eq!(cli.pattern.as_deref(), Some("interface"));
        assert_eq!(cli.devices, vec!["cisco", "pynet_rtr3"]);
        assert_eq!(cli.cmd, "show run");
        assert!(!cli.use_cache);
    }

    #[test]
    fn test_parse_timeout_and_concurrency() {
        let cli = Cli::try_parse_from([
            "devgrep",
            "--cmd",
            "show ip int brief",
            "--timeout",
            "45s",
            "--concurrency",
            "4",
            "up",
            "all",
        ])
        .unwrap();
        assert_eq!(cli.timeout, Some(Duration::from_secs(45)));
        assert_eq!(cli.concurrency, Some(4));
        assert_eq!(cli.cmd, "show ip int brief");
    }

    #[test]
    fn test_concurrency_zero_rejected() {
        assert!(Cli::try_parse_from(["devgrep", "--concurrency", "0", "x", "all"]).is_err());
    }
}
