//! tair-cts - provision a managed Tair instance and run the Redis
//! compatibility suite against it.
//!
//! This is the main entry point for the tair-cts CLI.

use tair_cts::cli::Cli;
use tair_cts::cloud::aliyun::AliyunClient;
use tair_cts::compat::CompatTest;
use tair_cts::config::Config;
use tair_cts::output::Reporter;
use tair_cts::workflow::Workflow;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let reporter = Reporter::new(cli.no_color);
    std::process::exit(run(cli, &reporter).await);
}

async fn run(cli: Cli, reporter: &Reporter) -> i32 {
    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            reporter.error(&e.to_string());
            return e.exit_code();
        }
    };
    if let Some(results) = &cli.results {
        config.compat.results_file = results.clone();
    }

    let tair = &config.database.tair;
    let client = match AliyunClient::new(&tair.access_key, &tair.access_key_secret) {
        Ok(client) => client,
        Err(e) => {
            reporter.error(&e.to_string());
            return e.exit_code();
        }
    };

    let test = CompatTest::new(&config.compat, cli.testfile.clone(), cli.show_failed);
    let workflow =
        Workflow::new(client, config, reporter.clone()).keep_resources(cli.keep_resources);

    match workflow.run(&test).await {
        Ok(report) if report.passed() => 0,
        Ok(report) => {
            let e = tair_cts::error::Error::TestFailed {
                exit_code: report.exit_code,
            };
            reporter.error(&e.to_string());
            e.exit_code()
        }
        Err(e) => {
            reporter.error(&e.to_string());
            e.exit_code()
        }
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(verbosity >= 3))
        .with(env_filter)
        .init();
}
