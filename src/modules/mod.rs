//! Attack modules.
//!
//! Each module is a self-contained unit with owned option state and an
//! execute action against the provider API, grouped under a tactic
//! subshell. The shell engine supplies the `info`/`set`/`reset`/`execute`
//! contract on top of this trait.

pub mod defense_evasion;
pub mod discovery;
pub mod persistence;

use async_trait::async_trait;
use colored::Colorize;
use std::io::Write;
use std::sync::Arc;
use tabular::{Row, Table};

use crate::client::entities::{GroupView, RoleView, UserView};
use crate::client::RoleTarget;
use crate::error::{Error, Result};
use crate::options::ModuleOptions;
use crate::shell::{Command, NodeBuilder, ShellContext};

pub const ROOT_NAME: &str = "red-team-shell";

#[async_trait]
pub trait Module: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Adversary tactics the module maps to, for the catalogue listing.
    fn tactics(&self) -> &'static [&'static str];

    fn options(&self) -> &ModuleOptions;

    fn options_mut(&mut self) -> &mut ModuleOptions;

    /// Run the module. Options have already been validated by the shell.
    async fn execute(&mut self, ctx: &ShellContext) -> Result<()>;
}

/// Fetch a required single-valued option. The shell validates options
/// before execute, so a miss here means the option was never declared.
pub(crate) fn required<'a>(options: &'a ModuleOptions, name: &str) -> Result<&'a str> {
    options.get(name).ok_or_else(|| Error::Validation(name.replace('_', "-")))
}

struct CatalogueEntry {
    tactics: String,
    name: String,
    description: String,
}

/// Assemble the full navigation tree: root globals plus one subshell per
/// tactic group, each holding its module subshells.
pub fn build_root() -> NodeBuilder {
    let groups: Vec<(&str, &str, Vec<Box<dyn Module>>)> = vec![
        (
            "discovery",
            "Modules to enumerate users, groups, and policies in the target environment",
            vec![
                Box::new(discovery::GetUsers::new()),
                Box::new(discovery::GetGroups::new()),
                Box::new(discovery::GetUser::new()),
                Box::new(discovery::GetPolicies::new()),
                Box::new(discovery::FindUsersWithoutMfa::new()),
            ],
        ),
        (
            "persistence",
            "Modules to establish and keep privileged access in the target environment",
            vec![
                Box::new(persistence::CreateUser::new()),
                Box::new(persistence::CreateAdminUser::new()),
            ],
        ),
        (
            "defense-evasion",
            "Modules to weaken or disable the target environment's defenses",
            vec![Box::new(defense_evasion::ChangePolicyState::new())],
        ),
    ];

    let mut catalogue = vec![CatalogueEntry {
        tactics: "Discovery".to_string(),
        name: "whoami".to_string(),
        description: "Get info for user linked with current API token".to_string(),
    }];

    let mut group_nodes = Vec::new();
    for (name, description, modules) in groups {
        let mut group = NodeBuilder::new(name, description);
        for module in modules {
            catalogue.push(CatalogueEntry {
                tactics: module.tactics().join(", "),
                name: module.name().to_string(),
                description: module.description().to_string(),
            });
            group = group.child(NodeBuilder::for_module(module));
        }
        group_nodes.push(group);
    }

    let mut root = NodeBuilder::new(
        ROOT_NAME,
        "Simulate adversary techniques against an identity provider environment",
    )
    .command(Arc::new(Whoami))
    .command(Arc::new(ListModules { catalogue }))
    .command(Arc::new(ClearScreen));

    for group in group_nodes {
        root = root.child(group);
    }
    root
}

/// Get info for the user linked with the current API token, along with
/// its assigned admin roles and group memberships.
struct Whoami;

#[async_trait]
impl Command for Whoami {
    fn name(&self) -> &str {
        "whoami"
    }

    fn help(&self) -> &str {
        "Get info for user linked with current API token"
    }

    async fn run(&self, ctx: &ShellContext, _args: &[String]) -> Result<()> {
        const SOURCE: &str = "modules::whoami";

        ctx.echo_info(SOURCE, "Attempting to get user information associated with current API token")
            .await;

        let user = match ctx.client.current_user().await {
            Ok(user) => user,
            Err(e) => {
                ctx.echo_error(SOURCE, &format!("Error retrieving user information\n    {}", e.detail()))
                    .await;
                return Ok(());
            }
        };

        UserView(&user).print_info();
        let user_id = UserView(&user).id().to_string();

        ctx.echo_info(SOURCE, &format!("Attempting to get roles for user ID {user_id}")).await;
        match ctx.client.assigned_roles(RoleTarget::User, &user_id).await {
            Ok(roles) => {
                println!("[*] Roles assigned to user ID {user_id}:");
                for role in &roles {
                    RoleView(role).print_info();
                }
            }
            Err(e) => {
                ctx.echo_error(
                    SOURCE,
                    &format!("Error retrieving user's assigned roles\n    {}", e.detail()),
                )
                .await;
                println!(
                    "{}",
                    "[!] Only the SUPER_ADMIN role can view, assign, or remove admin roles. The user \
                     linked to the current API token might not have the SUPER_ADMIN role assigned"
                        .red()
                );
            }
        }

        match ctx.client.user_groups(&user_id).await {
            Ok(groups) if !groups.is_empty() => {
                println!("[*] Group memberships for user ID {user_id}:");
                for group in &groups {
                    GroupView(group).print_info();
                }
            }
            Ok(_) => {}
            Err(e) => {
                ctx.echo_error(
                    SOURCE,
                    &format!("Error retrieving user's group memberships\n    {}", e.detail()),
                )
                .await;
            }
        }

        Ok(())
    }
}

/// Tabular catalogue of every registered module.
struct ListModules {
    catalogue: Vec<CatalogueEntry>,
}

#[async_trait]
impl Command for ListModules {
    fn name(&self) -> &str {
        "list-modules"
    }

    fn help(&self) -> &str {
        "List all available modules"
    }

    async fn run(&self, _ctx: &ShellContext, _args: &[String]) -> Result<()> {
        let mut table = Table::new("{:<}    {:<}    {:<}");
        table.add_row(Row::new().with_cell("Tactics").with_cell("Module Name").with_cell("Description"));
        for entry in &self.catalogue {
            table.add_row(
                Row::new().with_cell(&entry.tactics).with_cell(&entry.name).with_cell(&entry.description),
            );
        }
        println!("{table}");
        Ok(())
    }
}

/// Clear the terminal screen.
struct ClearScreen;

#[async_trait]
impl Command for ClearScreen {
    fn name(&self) -> &str {
        "clear"
    }

    fn help(&self) -> &str {
        "Clear the terminal screen"
    }

    async fn run(&self, _ctx: &ShellContext, _args: &[String]) -> Result<()> {
        print!("\x1B[2J\x1B[1;1H");
        std::io::stdout().flush()?;
        Ok(())
    }
}
