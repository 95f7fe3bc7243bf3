//! Invocation of the external compatibility-test suite.
//!
//! The suite is a separate executable (by default the reference
//! `redis_compatibility_test.py`). Its stdout is the test report and goes to
//! the results file; stderr is captured and logged but not persisted.

use std::path::PathBuf;
use std::process::Stdio;

use tracing::{info, warn};

use crate::config::CompatConfig;
use crate::error::{Error, Result};

/// One prepared invocation of the compatibility suite.
#[derive(Debug, Clone)]
pub struct CompatTest {
    /// Command that launches the suite, parsed with shell quoting rules
    pub runner: String,
    /// Test definition file passed through as `--testfile`
    pub testfile: PathBuf,
    /// Pass `--show-failed` to the suite
    pub show_failed: bool,
    /// File the suite's stdout is redirected to
    pub results_file: PathBuf,
    /// Port the suite connects to
    pub port: u16,
}

/// What the suite reported back.
#[derive(Debug, Clone)]
pub struct CompatReport {
    /// Exit code of the test process (-1 if killed by a signal)
    pub exit_code: i32,
    /// Where the report was written
    pub results_file: PathBuf,
    /// Captured stderr
    pub stderr: String,
}

impl CompatReport {
    /// True when the whole suite passed.
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }
}

impl CompatTest {
    /// Builds an invocation from config plus the per-run CLI arguments.
    pub fn new(config: &CompatConfig, testfile: PathBuf, show_failed: bool) -> Self {
        Self {
            runner: config.runner.clone(),
            testfile,
            show_failed,
            results_file: config.results_file.clone(),
            port: config.port,
        }
    }

    /// The full argv for one run against `host` with `password`.
    pub fn command_line(&self, host: &str, password: &str) -> Result<Vec<String>> {
        let mut argv = shell_words::split(&self.runner).map_err(|e| Error::InvalidRunner {
            command: self.runner.clone(),
            message: e.to_string(),
        })?;
        if argv.is_empty() {
            return Err(Error::InvalidRunner {
                command: self.runner.clone(),
                message: "empty command".to_string(),
            });
        }
        argv.push("--testfile".to_string());
        argv.push(self.testfile.to_string_lossy().into_owned());
        if self.show_failed {
            argv.push("--show-failed".to_string());
        }
        argv.push("--host".to_string());
        argv.push(host.to_string());
        argv.push("--port".to_string());
        argv.push(self.port.to_string());
        argv.push("--password".to_string());
        argv.push(password.to_string());
        Ok(argv)
    }

    /// Runs the suite, writing its stdout to the results file.
    ///
    /// A non-zero exit status is reported in the returned [`CompatReport`],
    /// not as an error; failing to launch the process is.
    pub async fn run(&self, host: &str, password: &str) -> Result<CompatReport> {
        let argv = self.command_line(host, password)?;
        let output_file = std::fs::File::create(&self.results_file)?;

        info!(
            program = %argv[0],
            results_file = %self.results_file.display(),
            "running compatibility test"
        );

        let child = tokio::process::Command::new(&argv[0])
            .args(&argv[1..])
            .stdout(Stdio::from(output_file))
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::TestSpawn {
                command: argv[0].clone(),
                source,
            })?;

        let output = child.wait_with_output().await?;
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !stderr.is_empty() {
            warn!(%stderr, "compatibility test wrote to stderr");
        }

        Ok(CompatReport {
            exit_code: output.status.code().unwrap_or(-1),
            results_file: self.results_file.clone(),
            stderr,
        })
    }
}
