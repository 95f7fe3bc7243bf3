//! The provisioning workflow.
//!
//! A strictly sequential run: provision network and instance, configure
//! access, wait for readiness, run the compatibility suite, tear everything
//! down in reverse order. The first failing step aborts the run; no
//! compensating cleanup is attempted for a half-provisioned stack (the ids
//! printed along the way are the operator's recovery data).

use std::future::Future;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cloud::{CloudClient, CreateInstanceRequest};
use crate::compat::{CompatReport, CompatTest};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::instance::{Credentials, InstanceInfo};
use crate::output::Reporter;
use crate::wait::{wait_until, WaitError, WaitPolicy};

/// Runs the provision → configure → test → teardown sequence against one
/// [`CloudClient`].
pub struct Workflow<C> {
    client: C,
    config: Config,
    reporter: Reporter,
    keep_resources: bool,
}

impl<C: CloudClient> Workflow<C> {
    /// Creates a workflow over `client` with the given config.
    pub fn new(client: C, config: Config, reporter: Reporter) -> Self {
        Self {
            client,
            config,
            reporter,
            keep_resources: false,
        }
    }

    /// Leave the provisioned resources in place after the test run.
    pub fn keep_resources(mut self, keep: bool) -> Self {
        self.keep_resources = keep;
        self
    }

    /// Runs the whole workflow and returns the suite's report.
    ///
    /// A failing suite is a report, not an error: teardown still runs and the
    /// caller decides the exit status. Any provisioning error aborts before
    /// the next step.
    pub async fn run(&self, test: &CompatTest) -> Result<CompatReport> {
        let mut instance = self.provision().await?;
        self.configure(&mut instance).await?;
        self.wait_until_ready(&instance).await?;

        self.reporter.banner("COMPATIBILITY TEST");
        let credentials = instance.credentials()?;
        self.reporter
            .step(&format!("running suite against {}", instance.private_ip));
        let report = test.run(&instance.private_ip, &credentials.password).await?;
        if report.passed() {
            self.reporter.success(&format!(
                "compatibility test passed; results in {}",
                report.results_file.display()
            ));
        } else {
            self.reporter.error(&format!(
                "compatibility test failed with exit code {}; results in {}",
                report.exit_code,
                report.results_file.display()
            ));
        }

        if self.keep_resources {
            self.reporter.warning(&format!(
                "leaving resources in place: instance {}, vswitch {}, vpc {}",
                instance.instance_id, instance.vswitch_id, instance.vpc_id
            ));
        } else {
            self.cleanup(&instance).await?;
        }

        Ok(report)
    }

    /// Creates the VPC, the vswitch, and the managed store instance.
    pub async fn provision(&self) -> Result<InstanceInfo> {
        let tair = &self.config.database.tair;
        let provision = &self.config.provision;
        let suffix = name_suffix();

        self.reporter.banner("PROVISION");
        self.reporter.step("creating virtual network");
        let vpc_name = format!("tair-cts-vpc-{suffix}");
        let vpc_id = self
            .client
            .create_vpc(&tair.region_id, &vpc_name, &provision.cidr_block)
            .await?;
        self.reporter.resource("created", "vpc", &vpc_id);

        let vswitch_name = format!("tair-cts-vsw-{suffix}");
        let vswitch_id = self
            .client
            .create_vswitch(
                &tair.region_id,
                &tair.zone_id,
                &vpc_id,
                &vswitch_name,
                &provision.cidr_block,
            )
            .await?;
        self.reporter.resource("created", "vswitch", &vswitch_id);

        self.reporter.step("creating managed store instance");
        let instance_name = format!("tair-cts-instance-{suffix}");
        let created = self
            .client
            .create_instance(&CreateInstanceRequest {
                region_id: tair.region_id.clone(),
                zone_id: tair.zone_id.clone(),
                vpc_id: vpc_id.clone(),
                vswitch_id: vswitch_id.clone(),
                instance_name: instance_name.clone(),
                instance_class: provision.instance_class.clone(),
                instance_type: provision.instance_type.clone(),
                charge_type: provision.charge_type.clone(),
            })
            .await?;
        self.reporter
            .resource("created", "instance", &created.instance_id);
        info!(
            instance_id = %created.instance_id,
            private_ip = %created.private_ip,
            "instance created"
        );

        Ok(InstanceInfo {
            instance_id: created.instance_id,
            instance_name,
            region_id: tair.region_id.clone(),
            zone_id: tair.zone_id.clone(),
            vpc_id,
            vswitch_id,
            private_ip: created.private_ip,
            credentials: None,
        })
    }

    /// Installs the IP allow-list and resets the account password.
    pub async fn configure(&self, instance: &mut InstanceInfo) -> Result<()> {
        let provision = &self.config.provision;

        self.reporter.banner("CONFIGURE");
        self.reporter.step(&format!(
            "restricting access to {}",
            provision.security_ips
        ));
        self.client
            .modify_security_ips(&instance.instance_id, &provision.security_ips)
            .await?;

        self.reporter.step("resetting account password");
        // The vendor's default account carries the instance id as its name.
        let account = instance.instance_id.clone();
        let password = provision
            .account_password
            .clone()
            .unwrap_or_else(generate_password);
        self.client
            .reset_account_password(&instance.instance_id, &account, &password)
            .await?;
        instance.credentials = Some(Credentials { account, password });
        Ok(())
    }

    /// Polls the instance status until it reaches `Normal`, bounded by
    /// `wait.ready`. Configuration changes show up as `Changing` in between;
    /// this wait also absorbs those.
    pub async fn wait_until_ready(&self, instance: &InstanceInfo) -> Result<()> {
        let policy = self.config.wait.ready;
        self.reporter.step(&format!(
            "waiting for instance {} to become ready",
            instance.instance_id
        ));
        wait_until(&policy, || self.probe_ready(instance))
            .await
            .map_err(|e| match e {
                WaitError::Timeout { .. } => Error::ReadyTimeout {
                    instance_id: instance.instance_id.clone(),
                    timeout_secs: policy.timeout.as_secs(),
                },
                WaitError::Probe(e) => e,
            })?;
        self.reporter.success("instance is ready");
        Ok(())
    }

    /// Deletes instance, vswitch, and VPC, in that order, waiting for the
    /// instance release to complete before touching the network.
    pub async fn cleanup(&self, instance: &InstanceInfo) -> Result<()> {
        self.reporter.banner("TEARDOWN");

        self.reporter.step("releasing instance");
        self.client.delete_instance(&instance.instance_id).await?;
        let release = self.config.wait.release;
        wait_until(&release, || self.probe_released(instance))
            .await
            .map_err(|e| match e {
                WaitError::Timeout { .. } => Error::CleanupTimeout {
                    resource: "instance".to_string(),
                    id: instance.instance_id.clone(),
                    timeout_secs: release.timeout.as_secs(),
                },
                WaitError::Probe(e) => e,
            })?;
        self.reporter
            .resource("deleted", "instance", &instance.instance_id);

        let policy = self.config.wait.network_delete;
        self.reporter.step("deleting network resources");
        self.delete_with_retry(&policy, "vswitch", &instance.vswitch_id, || {
            self.client
                .delete_vswitch(&instance.region_id, &instance.vswitch_id)
        })
        .await?;
        self.reporter
            .resource("deleted", "vswitch", &instance.vswitch_id);

        self.delete_with_retry(&policy, "vpc", &instance.vpc_id, || {
            self.client.delete_vpc(&instance.region_id, &instance.vpc_id)
        })
        .await?;
        self.reporter.resource("deleted", "vpc", &instance.vpc_id);

        self.reporter.success("all resources released");
        Ok(())
    }

    async fn probe_ready(&self, instance: &InstanceInfo) -> Result<Option<()>> {
        let status = self
            .client
            .describe_instance_status(&instance.region_id, &instance.instance_id)
            .await?;
        match status {
            Some(status) if status.is_ready() => Ok(Some(())),
            Some(status) => {
                self.reporter.info(&format!("instance status: {status}"));
                Ok(None)
            }
            // Right after creation the describe call may not see the
            // instance yet; keep polling.
            None => {
                debug!("instance not visible yet");
                Ok(None)
            }
        }
    }

    async fn probe_released(&self, instance: &InstanceInfo) -> Result<Option<()>> {
        let status = self
            .client
            .describe_instance_status(&instance.region_id, &instance.instance_id)
            .await?;
        match status {
            None => Ok(Some(())),
            Some(status) if status.is_released() => Ok(Some(())),
            Some(status) => {
                self.reporter.info(&format!("instance status: {status}"));
                Ok(None)
            }
        }
    }

    /// Retries a network delete that fails with a dependency conflict while
    /// the upstream release is still settling on the vendor side.
    async fn delete_with_retry<F, Fut>(
        &self,
        policy: &WaitPolicy,
        resource: &str,
        id: &str,
        mut op: F,
    ) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        wait_until(policy, || {
            let attempt = op();
            async move {
                match attempt.await {
                    Ok(()) => Ok(Some(())),
                    Err(e) if e.is_dependency_conflict() => {
                        warn!(%e, "delete hit a dependency conflict, retrying");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
        })
        .await
        .map_err(|e| match e {
            WaitError::Timeout { .. } => Error::CleanupTimeout {
                resource: resource.to_string(),
                id: id.to_string(),
                timeout_secs: policy.timeout.as_secs(),
            },
            WaitError::Probe(e) => e,
        })
    }
}

/// Five hex characters to keep resource names unique between runs.
fn name_suffix() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..5].to_string()
}

/// A throwaway password for the test account when none is configured.
fn generate_password() -> String {
    use rand::distributions::Alphanumeric;
    use rand::Rng;
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();
    format!("Cts-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_suffix_is_short_and_lowercase_hex() {
        let suffix = name_suffix();
        assert_eq!(suffix.len(), 5);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_passwords_differ_and_carry_prefix() {
        let a = generate_password();
        let b = generate_password();
        assert_ne!(a, b);
        assert!(a.starts_with("Cts-"));
        assert_eq!(a.len(), 20);
    }
}
