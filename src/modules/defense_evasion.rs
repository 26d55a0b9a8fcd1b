//! Defense evasion modules: weaken the target environment's controls.

use async_trait::async_trait;

use crate::client::entities::PolicyView;
use crate::error::Result;
use crate::modules::{required, Module};
use crate::options::ModuleOptions;
use crate::shell::ShellContext;

const SOURCE: &str = "modules::change-policy-state";

/// Deactivate or activate a policy.
pub struct ChangePolicyState {
    options: ModuleOptions,
}

impl ChangePolicyState {
    pub fn new() -> Self {
        Self { options: ModuleOptions::new().declare("id", true, "The unique ID for the policy") }
    }
}

impl Default for ChangePolicyState {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for ChangePolicyState {
    fn name(&self) -> &'static str {
        "change-policy-state"
    }

    fn description(&self) -> &'static str {
        "Deactivate or activate a policy"
    }

    fn tactics(&self) -> &'static [&'static str] {
        &["Defense Evasion", "Impact"]
    }

    fn options(&self) -> &ModuleOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ModuleOptions {
        &mut self.options
    }

    async fn execute(&mut self, ctx: &ShellContext) -> Result<()> {
        let policy_id = required(&self.options, "id")?;

        ctx.echo_info(SOURCE, &format!("Attempting to get policy {policy_id}")).await;
        let policy = match ctx.client.policy(policy_id, false).await {
            Ok(policy) => policy,
            Err(e) => {
                ctx.echo_error(
                    SOURCE,
                    &format!("Error retrieving policy {policy_id}\n    {}", e.detail()),
                )
                .await;
                return Ok(());
            }
        };

        let view = PolicyView(&policy);
        ctx.echo_success(SOURCE, &format!("Retrieved policy ID {} ({})", view.id(), view.name()))
            .await;

        match view.status() {
            "ACTIVE" => {
                println!("[*] Policy is ACTIVE");
                if ctx.confirm(
                    &format!("Do you want to deactivate policy {} ({})?", view.id(), view.name()),
                    true,
                ) {
                    change_state(ctx, view.id(), view.name(), "DEACTIVATE").await;
                }
            }
            "INACTIVE" => {
                println!("[*] Policy is INACTIVE");
                if ctx.confirm(
                    &format!("Do you want to activate policy {} ({})?", view.id(), view.name()),
                    true,
                ) {
                    change_state(ctx, view.id(), view.name(), "ACTIVATE").await;
                }
            }
            other => println!("[*] Policy status is {other}"),
        }

        Ok(())
    }
}

async fn change_state(ctx: &ShellContext, policy_id: &str, name: &str, operation: &str) {
    ctx.echo_info(
        SOURCE,
        &format!("Attempting to {} policy {policy_id} ({name})", operation.to_lowercase()),
    )
    .await;

    match ctx.client.policy_lifecycle(policy_id, operation).await {
        Ok(()) => {
            ctx.echo_success(SOURCE, &format!("Policy {policy_id} {}d", operation.to_lowercase()))
                .await;
        }
        Err(e) => {
            ctx.echo_error(
                SOURCE,
                &format!("Error executing {operation} for policy {policy_id}\n    {}", e.detail()),
            )
            .await;
        }
    }
}
