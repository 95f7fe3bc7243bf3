//! # tair-cts - Tair compatibility-test harness
//!
//! tair-cts provisions a managed Tair (Redis-compatible) instance on Alibaba
//! Cloud together with a supporting VPC and vswitch, configures access, waits
//! for readiness, runs the external Redis compatibility-test suite against
//! the instance, and tears everything down again.
//!
//! ## Workflow
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐
//! │ provision  │──▶│ configure  │──▶│ wait ready │──▶│ run suite  │──▶│  teardown  │
//! │ vpc + vsw  │   │ acl + pwd  │   │ (bounded)  │   │ (external) │   │ (reverse)  │
//! │ + instance │   │            │   │            │   │            │   │            │
//! └────────────┘   └────────────┘   └────────────┘   └────────────┘   └────────────┘
//! ```
//!
//! Every remote call goes through the [`cloud::CloudClient`] trait; the real
//! implementation is [`cloud::aliyun::AliyunClient`], tests substitute mocks.
//! The first failing step aborts the run. A failing test suite is not a
//! failing step: teardown still runs and the process exits with a dedicated
//! code (see [`error::Error::exit_code`]).
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use tair_cts::cloud::aliyun::AliyunClient;
//! use tair_cts::compat::CompatTest;
//! use tair_cts::config::Config;
//! use tair_cts::output::Reporter;
//! use tair_cts::workflow::Workflow;
//!
//! #[tokio::main]
//! async fn main() -> tair_cts::error::Result<()> {
//!     let config = Config::load("cts.yaml")?;
//!     let tair = &config.database.tair;
//!     let client = AliyunClient::new(&tair.access_key, &tair.access_key_secret)?;
//!     let test = CompatTest::new(&config.compat, "suite.json".into(), true);
//!     let report = Workflow::new(client, config, Reporter::default())
//!         .run(&test)
//!         .await?;
//!     std::process::exit(if report.passed() { 0 } else { 2 });
//! }
//! ```

#![warn(clippy::all)]

/// Command-line interface definition.
pub mod cli;

/// Cloud API boundary: the [`cloud::CloudClient`] trait, the Aliyun
/// implementation, and request signing.
pub mod cloud;

/// Invocation of the external compatibility-test suite.
pub mod compat;

/// YAML configuration loading and validation.
pub mod config;

/// Error types and the exit-code taxonomy.
pub mod error;

/// The transient record describing the provisioned instance.
pub mod instance;

/// Human-readable progress output.
pub mod output;

/// Bounded polling helpers.
pub mod wait;

/// The provision → configure → test → teardown sequence.
pub mod workflow;

/// Returns the current version of tair-cts.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
