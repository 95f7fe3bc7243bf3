//! Command-line interface for tair-cts.

use clap::Parser;
use std::path::PathBuf;

/// Provision a managed Tair instance and run the Redis compatibility suite
/// against it.
///
/// The tool creates a VPC, a vswitch, and a Tair instance, configures access,
/// waits until the instance is ready, runs the external compatibility-test
/// executable, and releases everything it created.
#[derive(Parser, Debug, Clone)]
#[command(name = "tair-cts")]
#[command(version)]
#[command(about = "Provision a managed Tair instance and run the Redis compatibility suite")]
pub struct Cli {
    /// Path to the config file
    #[arg(short = 'c', long, env = "TAIR_CTS_CONFIG")]
    pub config: PathBuf,

    /// Path to the compatibility-test definition file
    #[arg(short = 't', long)]
    pub testfile: PathBuf,

    /// Show details of failed tests in the suite output
    #[arg(long)]
    pub show_failed: bool,

    /// Write the suite's stdout here instead of the configured results file
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Leave the provisioned resources in place after the run (for debugging)
    #[arg(long)]
    pub keep_resources: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level.
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_invocation_parses() {
        let cli = Cli::try_parse_from([
            "tair-cts",
            "--config",
            "cts.yaml",
            "--testfile",
            "suite.json",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("cts.yaml"));
        assert_eq!(cli.testfile, PathBuf::from("suite.json"));
        assert!(!cli.show_failed);
        assert!(!cli.keep_resources);
        assert_eq!(cli.verbosity(), 0);
    }

    #[test]
    fn test_config_and_testfile_are_required() {
        assert!(Cli::try_parse_from(["tair-cts"]).is_err());
        assert!(Cli::try_parse_from(["tair-cts", "--config", "cts.yaml"]).is_err());
        assert!(Cli::try_parse_from(["tair-cts", "--testfile", "suite.json"]).is_err());
    }

    #[test]
    fn test_flags_and_verbosity() {
        let cli = Cli::try_parse_from([
            "tair-cts",
            "-c",
            "cts.yaml",
            "-t",
            "suite.json",
            "--show-failed",
            "--keep-resources",
            "--results",
            "out.txt",
            "-vv",
        ])
        .unwrap();
        assert!(cli.show_failed);
        assert!(cli.keep_resources);
        assert_eq!(cli.results, Some(PathBuf::from("out.txt")));
        assert_eq!(cli.verbosity(), 2);
    }
}
