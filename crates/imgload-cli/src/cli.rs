//! Argument definitions

use crate::logging::LogSettings;
use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use imgload_core::LoaderConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level `imgload` command
#[must_use]
pub fn build_cli() -> Command {
    Command::new("imgload")
        .version(imgload_core::VERSION)
        .about("Load, probe and compress images")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Loader configuration file (TOML)"),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .global(true)
                .value_parser(value_parser!(u32))
                .help("Attempts per image before giving up"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .global(true)
                .value_parser(value_parser!(u64))
                .help("Per-attempt timeout in milliseconds"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log as JSON lines"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("More log output (repeatable)"),
        )
        .subcommand(
            Command::new("compress")
                .about("Shrink an image into bounds and re-encode it")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Source image"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Destination file; its extension picks the format"),
                )
                .arg(
                    Arg::new("max-width")
                        .long("max-width")
                        .default_value("1200")
                        .value_parser(value_parser!(u32))
                        .help("Maximum width in pixels"),
                )
                .arg(
                    Arg::new("max-height")
                        .long("max-height")
                        .default_value("1200")
                        .value_parser(value_parser!(u32))
                        .help("Maximum height in pixels"),
                )
                .arg(
                    Arg::new("quality")
                        .long("quality")
                        .default_value("0.8")
                        .value_parser(value_parser!(f32))
                        .help("Encoder quality in (0, 1]"),
                ),
        )
        .subcommand(
            Command::new("sizes")
                .about("Print size-variant URLs as JSON")
                .arg(
                    Arg::new("target")
                        .required(true)
                        .help("Image URL, or a storage path when --bucket is set"),
                )
                .arg(
                    Arg::new("bucket")
                        .long("bucket")
                        .help("Resolve the target as a path in this storage bucket"),
                ),
        )
        .subcommand(
            Command::new("probe")
                .about("Load local images through the full loader and print results as JSON")
                .arg(
                    Arg::new("paths")
                        .required(true)
                        .num_args(1..)
                        .help("Image paths or file:// URLs"),
                )
                .arg(
                    Arg::new("root")
                        .long("root")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory relative paths resolve against"),
                )
                .arg(
                    Arg::new("fallback")
                        .long("fallback")
                        .help("Image to try once every path attempt has failed"),
                ),
        )
}

/// Logging flags
#[must_use]
pub fn log_settings(matches: &ArgMatches) -> LogSettings {
    LogSettings {
        json: matches.get_flag("json"),
        verbosity: matches.get_count("verbose"),
    }
}

/// Loader configuration from `--config`, then flag overrides
///
/// # Errors
///
/// Fails when the file cannot be read or parsed, or the result is invalid.
pub fn loader_config(matches: &ArgMatches) -> anyhow::Result<LoaderConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => LoaderConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => LoaderConfig::default(),
    };
    if let Some(retries) = matches.get_one::<u32>("retries") {
        config = config.with_retry_attempts(*retries);
    }
    if let Some(timeout_ms) = matches.get_one::<u64>("timeout-ms") {
        config = config.with_timeout(Duration::from_millis(*timeout_ms));
    }
    config.validate().context("invalid loader configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let matches = build_cli()
            .try_get_matches_from(["imgload", "probe", "a.png", "--retries", "5", "--timeout-ms", "250", "-vv"])
            .unwrap();

        let config = loader_config(&matches).unwrap();
        assert_eq!(config.default_retry_attempts, 5);
        assert_eq!(config.default_timeout_ms, 250);
        assert_eq!(log_settings(&matches).verbosity, 2);
    }

    #[test]
    fn zero_retries_rejected() {
        let matches = build_cli()
            .try_get_matches_from(["imgload", "sizes", "x", "--retries", "0"])
            .unwrap();
        assert!(loader_config(&matches).is_err());
    }

    #[test]
    fn subcommand_required() {
        assert!(build_cli().try_get_matches_from(["imgload"]).is_err());
    }
}
