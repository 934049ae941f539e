mod formatter;
mod logging;

use anyhow::{Context, Result};
use checklist_core::types::report::is_root;
use checklist_core::{CheckArgs, Checklist, ChecklistConfig, HostSource, Platform};
use clap::{Parser, ValueEnum};
use formatter::{format_json, format_text};
use logging::{init_logging, LogConfig, LogFormat};
use std::path::PathBuf;
use tracing::{error, warn};

#[derive(Parser, Debug)]
#[command(name = "checklist")]
#[command(author = "Checklist Contributors")]
#[command(version)]
#[command(about = "Collect security-relevant facts from a host, one check at a time", long_about = None)]
struct Cli {
    /// Check identifier (e.g. 1091 for SSH trust files, 1093 for user groups)
    id: String,

    /// Folders to list (files check); comma-separated or repeated
    #[arg(short = 'f', long, value_delimiter = ',')]
    folders: Vec<String>,

    /// Files to hash (checksum check); comma-separated or repeated
    #[arg(short = 'F', long, value_delimiter = ',')]
    files: Vec<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target platform layout (linux, macos, windows); defaults to the running OS
    #[arg(long)]
    platform: Option<Platform>,

    /// Override the home directory root scanned for trust files
    #[arg(long)]
    home_root: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print report metadata above the text block
    #[arg(long)]
    header: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (compact, pretty, json)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Canonical text block
    Text,
    /// JSON report
    Json,
    /// JSON report with pretty printing
    JsonPretty,
}

impl Cli {
    /// File, then environment, then flags
    fn load_config(&self) -> Result<ChecklistConfig> {
        let config = match self.config {
            Some(ref path) => ChecklistConfig::from_file(path)?,
            None => ChecklistConfig::default(),
        };
        let mut config = config.merge_env();

        if let Some(ref root) = self.home_root {
            config.home_root = Some(root.clone());
        }
        if let Some(ref level) = self.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }

    fn log_config(&self, config: &ChecklistConfig) -> LogConfig {
        let format = self.log_format.unwrap_or_else(|| {
            config.logging.format.parse().unwrap_or_default()
        });
        LogConfig::new().level(config.logging.level.clone()).format(format)
    }

    fn check_args(&self) -> CheckArgs {
        CheckArgs {
            files: self.files.clone(),
            folders: self.folders.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli.load_config()?;
    init_logging(&cli.log_config(&config));

    if !is_root() {
        warn!("not running as root; some sources may be unreadable");
    }

    let platform = cli.platform.unwrap_or_default();
    let checklist = Checklist::new(config, platform, Box::new(HostSource::new()));

    let report = match checklist.run(&cli.id, &cli.check_args()).await {
        Ok(report) => report,
        Err(e) => {
            error!(code = e.code(), error = %e, "check failed");
            return Err(e.into());
        }
    };

    let output = match cli.format {
        OutputFormat::Text => format_text(&report, cli.header),
        OutputFormat::Json => format_json(&report, false)?,
        OutputFormat::JsonPretty => format_json(&report, true)?,
    };

    if let Some(ref path) = cli.output {
        std::fs::write(path, output)
            .with_context(|| format!("failed to write {}", path.display()))?;
    } else {
        print!("{}", output);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_lists() {
        let cli = Cli::try_parse_from([
            "checklist",
            "1096",
            "-F",
            "/etc/passwd,/etc/group",
            "--files",
            "/etc/hosts",
            "-f",
            "/etc/cron.d",
        ])
        .unwrap();

        assert_eq!(cli.id, "1096");
        assert_eq!(cli.files, vec!["/etc/passwd", "/etc/group", "/etc/hosts"]);
        assert_eq!(cli.folders, vec!["/etc/cron.d"]);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_platform_and_format() {
        let cli = Cli::try_parse_from([
            "checklist",
            "3",
            "--platform",
            "windows",
            "--format",
            "json-pretty",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.platform, Some(Platform::Windows));
        assert_eq!(cli.format, OutputFormat::JsonPretty);
        assert_eq!(cli.log_format, Some(LogFormat::Json));

        assert!(Cli::try_parse_from(["checklist", "3", "--platform", "beos"]).is_err());
        assert!(Cli::try_parse_from(["checklist"]).is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("checklist.toml");
        std::fs::write(
            &path,
            "home_root = \"/srv/home\"\nelevated_marker = \"admin\"\n\n[logging]\nlevel = \"info\"\nformat = \"pretty\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "checklist",
            "1",
            "--config",
            path.to_str().unwrap(),
            "--home-root",
            "/export/home",
            "--log-level",
            "debug",
        ])
        .unwrap();

        let config = cli.load_config().unwrap();
        assert_eq!(config.home_root, Some(PathBuf::from("/export/home")));
        assert_eq!(config.logging.level, "debug");

        let log = cli.log_config(&config);
        assert_eq!(log.level, "debug");
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::try_parse_from(["checklist", "1", "--config", "/nonexistent/checklist.toml"]).unwrap();
        assert!(cli.load_config().is_err());
    }
}
