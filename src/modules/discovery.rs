//! Discovery modules: enumerate users, groups, and MFA posture.

use async_trait::async_trait;
use colored::Colorize;
use indicatif::ProgressBar;
use serde_json::Value;
use std::path::PathBuf;

use crate::client::entities::{GroupView, PolicyView, UserView};
use crate::error::Result;
use crate::modules::{required, Module};
use crate::options::ModuleOptions;
use crate::shell::context::POLICY_TYPES;
use crate::shell::ShellContext;
use crate::storage;

const HARVEST_CONFIRM: &str =
    "Do you want to attempt to harvest information for all users? This may take a while to avoid exceeding API rate limits";

/// Harvest information on all users.
pub struct GetUsers {
    options: ModuleOptions,
}

impl GetUsers {
    pub fn new() -> Self {
        Self { options: ModuleOptions::new() }
    }
}

impl Default for GetUsers {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for GetUsers {
    fn name(&self) -> &'static str {
        "get-users"
    }

    fn description(&self) -> &'static str {
        "Harvest information on all users"
    }

    fn tactics(&self) -> &'static [&'static str] {
        &["Discovery"]
    }

    fn options(&self) -> &ModuleOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ModuleOptions {
        &mut self.options
    }

    async fn execute(&mut self, ctx: &ShellContext) -> Result<()> {
        const SOURCE: &str = "modules::get-users";

        if !ctx.confirm(HARVEST_CONFIRM, true) {
            return Ok(());
        }

        ctx.echo_info(SOURCE, "Attempting to harvest all users").await;
        let harvest = ctx.client.get_all(&ctx.auditor, "/users", None, "users").await;

        if harvest.failed() && !harvest.is_empty() {
            println!(
                "{}",
                format!("[!] Harvest stopped early; keeping {} users retrieved so far", harvest.len())
                    .red()
            );
        }
        if harvest.is_empty() {
            return Ok(());
        }

        if ctx.confirm("Do you want to print harvested user information?", true) {
            for record in &harvest.records {
                UserView(record).print_info();
            }
        }

        if ctx.confirm("Do you want to save harvested user information to a file?", true) {
            storage::write_harvest(&ctx.data_dir, &ctx.session_prefix, "users", &harvest.records)
                .await?;
        }

        Ok(())
    }
}

/// Harvest information on all groups.
pub struct GetGroups {
    options: ModuleOptions,
}

impl GetGroups {
    pub fn new() -> Self {
        Self { options: ModuleOptions::new() }
    }
}

impl Default for GetGroups {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for GetGroups {
    fn name(&self) -> &'static str {
        "get-groups"
    }

    fn description(&self) -> &'static str {
        "Harvest information on all groups"
    }

    fn tactics(&self) -> &'static [&'static str] {
        &["Discovery"]
    }

    fn options(&self) -> &ModuleOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ModuleOptions {
        &mut self.options
    }

    async fn execute(&mut self, ctx: &ShellContext) -> Result<()> {
        const SOURCE: &str = "modules::get-groups";

        ctx.echo_info(SOURCE, "Attempting to harvest all groups").await;
        let harvest = ctx.client.get_all(&ctx.auditor, "/groups", None, "groups").await;

        if harvest.failed() && !harvest.is_empty() {
            println!(
                "{}",
                format!("[!] Harvest stopped early; keeping {} groups retrieved so far", harvest.len())
                    .red()
            );
        }
        if harvest.is_empty() {
            return Ok(());
        }

        if ctx.confirm("Do you want to print harvested group information?", true) {
            for record in &harvest.records {
                GroupView(record).print_info();
            }
        }

        if ctx.confirm("Do you want to save harvested group information to a file?", true) {
            storage::write_harvest(&ctx.data_dir, &ctx.session_prefix, "groups", &harvest.records)
                .await?;
        }

        Ok(())
    }
}

/// Get a single user by its unique ID.
pub struct GetUser {
    options: ModuleOptions,
}

impl GetUser {
    pub fn new() -> Self {
        Self { options: ModuleOptions::new().declare("id", true, "The unique ID for the user") }
    }
}

impl Default for GetUser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for GetUser {
    fn name(&self) -> &'static str {
        "get-user"
    }

    fn description(&self) -> &'static str {
        "Get information for a user using its unique ID"
    }

    fn tactics(&self) -> &'static [&'static str] {
        &["Discovery"]
    }

    fn options(&self) -> &ModuleOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ModuleOptions {
        &mut self.options
    }

    async fn execute(&mut self, ctx: &ShellContext) -> Result<()> {
        const SOURCE: &str = "modules::get-user";

        let user_id = required(&self.options, "id")?;
        ctx.echo_info(SOURCE, &format!("Attempting to get user {user_id}")).await;

        match ctx.client.user(user_id).await {
            Ok(user) => {
                UserView(&user).print_info();
            }
            Err(e) => {
                ctx.echo_error(SOURCE, &format!("Error retrieving user information\n    {}", e.detail()))
                    .await;
                println!("[*] This error is expected if the user object was deleted");
            }
        }

        Ok(())
    }
}

/// Harvest information on all policies and their rules.
pub struct GetPolicies {
    options: ModuleOptions,
}

impl GetPolicies {
    pub fn new() -> Self {
        Self { options: ModuleOptions::new() }
    }
}

impl Default for GetPolicies {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for GetPolicies {
    fn name(&self) -> &'static str {
        "get-policies"
    }

    fn description(&self) -> &'static str {
        "Harvest information on all policies and policy rules"
    }

    fn tactics(&self) -> &'static [&'static str] {
        &["Discovery"]
    }

    fn options(&self) -> &ModuleOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ModuleOptions {
        &mut self.options
    }

    async fn execute(&mut self, ctx: &ShellContext) -> Result<()> {
        const SOURCE: &str = "modules::get-policies";

        if !ctx.confirm(
            "Do you want to attempt to harvest information for all policies and policy rules?",
            true,
        ) {
            return Ok(());
        }

        let mut harvested: Vec<Value> = Vec::new();
        for policy_type in POLICY_TYPES {
            ctx.echo_info(SOURCE, &format!("Attempting to get policies with policy type, {policy_type}"))
                .await;

            match ctx.client.policies_by_type(policy_type).await {
                Ok(policies) => {
                    ctx.echo_success(
                        SOURCE,
                        &format!(
                            "Retrieved {} policies with policy type, {policy_type}",
                            policies.len()
                        ),
                    )
                    .await;
                    harvested.extend(policies);
                }
                Err(e) => {
                    ctx.echo_error(
                        SOURCE,
                        &format!(
                            "Error retrieving policies for policy type, {policy_type}\n    {}",
                            e.detail()
                        ),
                    )
                    .await;
                }
            }
        }

        if harvested.is_empty() {
            ctx.echo_info(SOURCE, "No policies found").await;
            return Ok(());
        }

        // Fetch each policy again with its rules expanded. The provider
        // refuses the expansion for policies with more than twenty rules.
        let mut policies_and_rules: Vec<Value> = Vec::new();
        for policy in &harvested {
            let view = PolicyView(policy);
            match ctx.client.policy(view.id(), true).await {
                Ok(expanded) => policies_and_rules.push(expanded),
                Err(e) => {
                    ctx.echo_error(
                        SOURCE,
                        &format!(
                            "Issue retrieving policy {} ({}) with rules\n    {}",
                            view.id(),
                            view.name(),
                            e.detail()
                        ),
                    )
                    .await;
                }
            }
        }

        if policies_and_rules.is_empty() {
            return Ok(());
        }

        if ctx.confirm("Do you want to print harvested policy information?", true) {
            for record in &policies_and_rules {
                PolicyView(record).print_info();
            }
        }

        if ctx.confirm(
            &format!("Do you want to save {} harvested policies to a file?", policies_and_rules.len()),
            true,
        ) {
            storage::write_harvest(&ctx.data_dir, &ctx.session_prefix, "policies", &policies_and_rules)
                .await?;
        }

        Ok(())
    }
}

/// Identify users with no MFA factors enrolled.
pub struct FindUsersWithoutMfa {
    options: ModuleOptions,
}

impl FindUsersWithoutMfa {
    pub fn new() -> Self {
        Self { options: ModuleOptions::new() }
    }
}

impl Default for FindUsersWithoutMfa {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for FindUsersWithoutMfa {
    fn name(&self) -> &'static str {
        "find-users-without-mfa"
    }

    fn description(&self) -> &'static str {
        "Identify users with no MFA factors enrolled"
    }

    fn tactics(&self) -> &'static [&'static str] {
        &["Discovery"]
    }

    fn options(&self) -> &ModuleOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ModuleOptions {
        &mut self.options
    }

    async fn execute(&mut self, ctx: &ShellContext) -> Result<()> {
        const SOURCE: &str = "modules::find-users-without-mfa";

        loop {
            println!(
                "[*] Available options\n\
                 [1] Load harvested users from a json file and check their enrolled MFA factors\n\
                 [2] Harvest all users and check their enrolled MFA factors\n\
                 [0] Exit this menu"
            );
            let Some(choice) = ctx.prompt_number("Choose from the above options") else {
                return Ok(());
            };

            match choice {
                0 => return Ok(()),
                1 => {
                    let Some(path) =
                        ctx.prompt_string("Enter full path of file containing harvested users")
                    else {
                        return Ok(());
                    };
                    let path = PathBuf::from(path);

                    if !path.exists() {
                        ctx.echo_error(SOURCE, &format!("File not found, {}", path.display())).await;
                        continue;
                    }

                    ctx.echo_info(
                        SOURCE,
                        &format!("Attempting to check MFA factors for users in file, {}", path.display()),
                    )
                    .await;
                    let users = storage::load_json_file(&path).await?;
                    check_enrolled_factors(ctx, &users).await?;
                    return Ok(());
                }
                2 => {
                    if !ctx.confirm(HARVEST_CONFIRM, true) {
                        continue;
                    }
                    ctx.echo_info(SOURCE, "Attempting to harvest all users").await;
                    let harvest = ctx.client.get_all(&ctx.auditor, "/users", None, "users").await;
                    if harvest.is_empty() {
                        return Ok(());
                    }
                    check_enrolled_factors(ctx, &harvest.records).await?;
                    return Ok(());
                }
                _ => println!("{}", "[!] Invalid option selected".red()),
            }
        }
    }
}

/// Enumerate enrolled factors per user and collect the users with none.
/// Stops early if the token cannot read factors at all.
async fn check_enrolled_factors(ctx: &ShellContext, users: &[Value]) -> Result<()> {
    const SOURCE: &str = "modules::find-users-without-mfa";

    ctx.echo_info(
        SOURCE,
        &format!(
            "Checking enrolled MFA factors for {} users. This may take a while to avoid exceeding API rate limits",
            users.len()
        ),
    )
    .await;

    println!("[*] Checking for users without MFA enrolled");
    // Nothing prints under the bar; findings go to the audit sink until
    // the scan finishes.
    let bar = ProgressBar::new(users.len() as u64);
    let mut without_mfa: Vec<Value> = Vec::new();

    for record in users {
        let user_id = UserView(record).id().to_string();

        match ctx.client.user_factors(&user_id).await {
            Ok(factors) => {
                if factors.is_empty() {
                    ctx.auditor
                        .info(SOURCE, &format!("User {user_id} does not have any MFA factors enrolled"))
                        .await;
                    without_mfa.push(record.clone());
                }
            }
            Err(e) => {
                bar.finish_and_clear();
                ctx.echo_error(
                    SOURCE,
                    &format!(
                        "Error retrieving enrolled MFA factors for user {user_id}\n    {}",
                        e.detail()
                    ),
                )
                .await;
                println!(
                    "{}",
                    "[!] The current API token might not have permission to read MFA factors".red()
                );
                return Ok(());
            }
        }

        bar.inc(1);
        tokio::time::sleep(ctx.client.page_delay()).await;
    }

    bar.finish_and_clear();

    if without_mfa.is_empty() {
        ctx.echo_info(SOURCE, "No users found without MFA factors enrolled").await;
        return Ok(());
    }

    ctx.echo_info(
        SOURCE,
        &format!("Found {} users without any MFA factors enrolled", without_mfa.len()),
    )
    .await;

    if ctx.confirm("Do you want to print information for users without MFA enrolled?", true) {
        for record in &without_mfa {
            UserView(record).print_info();
        }
    }

    if ctx.confirm("Do you want to save this information to a file?", true) {
        storage::write_harvest(&ctx.data_dir, &ctx.session_prefix, "users_without_mfa", &without_mfa)
            .await?;
    }

    Ok(())
}
