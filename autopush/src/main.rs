//! Periodically stage, commit and push the current git working directory.
//!
//! Runs until killed. After staging, the operator gets one minute to type a
//! commit message before the configured default is used.

use std::ffi::OsString;
use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use autopush::exit_codes;
use autopush::io::config::{CONFIG_FILE_NAME, ConfigOverrides, resolve_config};
use autopush::io::git::Git;
use autopush::io::idler::ThreadIdler;
use autopush::io::prompt::StdinPrompt;
use autopush::logging;
use autopush::looping::run_loop;

const BANNER: &str = r"             _                        _
            | |                      | |
  __ _ _   _| |_ ___  _ __  _   _ ___| |__
 / _` | | | | __/ _ \| '_ \| | | / __| '_ \
| (_| | |_| | || (_) | |_) | |_| \__ \ | | |
 \__,_|\__,_|\__\___/| .__/ \__,_|___/_| |_|
                     | |
                     |_|";

/// Long flags also accepted with a single dash (`-msg`, `-tstr s`, `-timeout=5`).
const SINGLE_DASH_LONG: [&str; 3] = ["timeout", "tstr", "msg"];

#[derive(Parser, Debug)]
#[command(
    name = "autopush",
    version,
    about = "Stage, commit and push a git working directory on a loop"
)]
struct Cli {
    /// Idle time between runs when nothing was pushed, in `--tstr` units [default: 60].
    #[arg(short = 't', long = "timeout", value_name = "INT")]
    timeout: Option<u64>,

    /// Idle unit: `ms`, `s` or `m`. Unknown units count as minutes [default: m].
    #[arg(long = "tstr", visible_alias = "unit", value_name = "UNIT")]
    tstr: Option<String>,

    /// Commit message used when none is entered at the prompt.
    #[arg(short = 'm', long = "msg", value_name = "TEXT")]
    msg: Option<String>,

    /// Working directory to watch.
    #[arg(short = 'C', long = "dir", value_name = "PATH", default_value = ".")]
    dir: PathBuf,

    /// TOML config file [default: <dir>/.autopush.toml, if present].
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also push when the tree is clean but the branch is ahead of its upstream.
    #[arg(long)]
    push_ahead: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            idle: self.timeout,
            idle_unit: self.tstr.clone(),
            message: self.msg.clone(),
            push_when_ahead: self.push_ahead,
        }
    }
}

/// Rewrite single-dash long flags to clap's `--name` form.
///
/// Without this, clap reads `-msg` as `-m` with the value `sg`.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut after_separator = false;
    for arg in args {
        if !after_separator {
            if arg == "--" {
                after_separator = true;
            } else if let Some(raw) = arg.to_str()
                && let Some(rest) = raw.strip_prefix('-')
                && !rest.starts_with('-')
            {
                let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                if SINGLE_DASH_LONG.contains(&name) {
                    out.push(OsString::from(format!("-{raw}")));
                    continue;
                }
            }
        }
        out.push(arg);
    }
    out
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::INVALID);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    logging::init();
    print_banner();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.dir.join(CONFIG_FILE_NAME));
    let config = resolve_config(&config_path, cli.overrides()).context("load config")?;

    let git = Git::new(&cli.dir);
    git.ensure_repository()
        .with_context(|| format!("open repository at {}", cli.dir.display()))?;
    match git.current_branch() {
        Ok(branch) => info!(dir = %git.workdir().display(), branch = %branch, "autopush started"),
        Err(err) => warn!(dir = %git.workdir().display(), "autopush started: {err:#}"),
    }

    let mut prompt = StdinPrompt::new();
    run_loop(&git, &mut prompt, &ThreadIdler, &config, |_| {
        ControlFlow::Continue(())
    });
    Ok(())
}

fn print_banner() {
    println!("{BANNER}");
    println!();
    println!("autopush v{}", env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults() {
        let cli = Cli::parse_from(["autopush"]);
        assert_eq!(cli.overrides(), ConfigOverrides::default());
        assert_eq!(cli.dir, PathBuf::from("."));
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_short_flags() {
        let cli = Cli::parse_from(["autopush", "-t", "30", "--tstr", "s", "-m", "wip"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.idle, Some(30));
        assert_eq!(overrides.idle_unit.as_deref(), Some("s"));
        assert_eq!(overrides.message.as_deref(), Some("wip"));
    }

    #[test]
    fn parse_long_flags_and_alias() {
        let cli = Cli::parse_from([
            "autopush",
            "--timeout",
            "500",
            "--unit",
            "ms",
            "--msg",
            "sync",
            "--push-ahead",
            "-C",
            "/tmp/repo",
        ]);
        assert_eq!(cli.timeout, Some(500));
        assert_eq!(cli.tstr.as_deref(), Some("ms"));
        assert!(cli.push_ahead);
        assert_eq!(cli.dir, PathBuf::from("/tmp/repo"));
    }

    fn parse_normalized(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args.iter().map(OsString::from))).expect("parse")
    }

    #[test]
    fn single_dash_msg_is_the_message_flag() {
        let cli = parse_normalized(&["autopush", "-msg", "wip"]);
        assert_eq!(cli.msg.as_deref(), Some("wip"));
    }

    #[test]
    fn single_dash_tstr_and_timeout_are_long_flags() {
        let cli = parse_normalized(&["autopush", "-timeout", "5", "-tstr", "s"]);
        assert_eq!(cli.timeout, Some(5));
        assert_eq!(cli.tstr.as_deref(), Some("s"));
    }

    #[test]
    fn single_dash_flags_accept_equals_form() {
        let cli = parse_normalized(&["autopush", "-msg=hello world", "-timeout=7", "-tstr=ms"]);
        assert_eq!(cli.msg.as_deref(), Some("hello world"));
        assert_eq!(cli.timeout, Some(7));
        assert_eq!(cli.tstr.as_deref(), Some("ms"));
    }

    #[test]
    fn short_and_double_dash_flags_pass_through() {
        let args = ["autopush", "-t", "3", "-m", "x", "--tstr", "m", "-C", "/tmp"];
        let normalized = normalize_args(args.iter().map(OsString::from));
        assert_eq!(
            normalized,
            args.iter().map(OsString::from).collect::<Vec<_>>()
        );
        let cli = parse_normalized(&args);
        assert_eq!(cli.timeout, Some(3));
        assert_eq!(cli.msg.as_deref(), Some("x"));
    }

    #[test]
    fn negative_timeout_is_rejected() {
        assert!(Cli::try_parse_from(["autopush", "-t", "-5"]).is_err());
    }
}
