//! Persistence modules: create accounts and escalate them to admin roles.

use async_trait::async_trait;
use colored::Colorize;
use serde_json::json;

use crate::client::RoleTarget;
use crate::error::Result;
use crate::modules::{required, Module};
use crate::options::ModuleOptions;
use crate::shell::context::ADMIN_ROLES;
use crate::shell::ShellContext;

const SUPER_ADMIN_HINT: &str =
    "[!] Only the SUPER_ADMIN role can view, assign, or remove admin roles. The user linked to the \
     current API token might not have the SUPER_ADMIN role assigned";

/// Create and activate a user with an assigned password. New users are
/// added to the provider's built-in "Everyone" group by default.
pub struct CreateUser {
    options: ModuleOptions,
}

impl CreateUser {
    pub fn new() -> Self {
        Self {
            options: ModuleOptions::new()
                .declare("first_name", true, "Given name of the user")
                .declare("last_name", true, "Family name of the user")
                .declare("email", true, "Primary email address of user")
                .declare("login", true, "Unique identifier for the user (username)")
                .declare_list(
                    "group_ids",
                    false,
                    "The unique ID(s) of the group(s) to put the user in.\nSeparate group IDs using a comma",
                ),
        }
    }
}

impl Default for CreateUser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for CreateUser {
    fn name(&self) -> &'static str {
        "create-user"
    }

    fn description(&self) -> &'static str {
        "Create and activate a user with an assigned password"
    }

    fn tactics(&self) -> &'static [&'static str] {
        &["Persistence"]
    }

    fn options(&self) -> &ModuleOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ModuleOptions {
        &mut self.options
    }

    async fn execute(&mut self, ctx: &ShellContext) -> Result<()> {
        const SOURCE: &str = "modules::create-user";

        let first_name = required(&self.options, "first_name")?;
        let last_name = required(&self.options, "last_name")?;
        let email = required(&self.options, "email")?;
        let login = required(&self.options, "login")?;

        let Some(password) =
            ctx.prompt_hidden("Enter a password for the new user. The input for this value is hidden")
        else {
            return Ok(());
        };

        ctx.echo_info(SOURCE, &format!("Attempting to create new user {login}")).await;

        let mut payload = json!({
            "profile": {
                "firstName": first_name,
                "lastName": last_name,
                "email": email,
                "login": login,
            },
            "credentials": { "password": { "value": password } },
        });
        if let Some(group_ids) = self.options.get_list("group_ids") {
            payload["groupIds"] = json!(group_ids);
        }

        match ctx.client.create_user(&payload, true).await {
            Ok(_) => {
                ctx.echo_success(SOURCE, &format!("Created new user {login}")).await;
            }
            Err(e) => {
                ctx.echo_error(SOURCE, &format!("Error creating new user\n    {}", e.detail())).await;
                println!("[*] Did you try to add the new user to a built-in group? E.g. \"Everyone\"");
            }
        }

        Ok(())
    }
}

/// Assign an admin role to a user. Only the SUPER_ADMIN role can view,
/// assign, or remove admin roles for administrators.
pub struct CreateAdminUser {
    options: ModuleOptions,
}

impl CreateAdminUser {
    pub fn new() -> Self {
        Self { options: ModuleOptions::new().declare("id", true, "The unique ID for the user") }
    }
}

impl Default for CreateAdminUser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for CreateAdminUser {
    fn name(&self) -> &'static str {
        "create-admin-user"
    }

    fn description(&self) -> &'static str {
        "Assign an admin role to a user"
    }

    fn tactics(&self) -> &'static [&'static str] {
        &["Persistence"]
    }

    fn options(&self) -> &ModuleOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut ModuleOptions {
        &mut self.options
    }

    async fn execute(&mut self, ctx: &ShellContext) -> Result<()> {
        const SOURCE: &str = "modules::create-admin-user";

        let user_id = required(&self.options, "id")?;

        println!("[*] Available admin roles:");
        for (index, role) in ADMIN_ROLES.iter().enumerate() {
            println!("{}. {role}", index + 1);
        }

        loop {
            let Some(choice) =
                ctx.prompt_number("Which admin role do you want to assign to the user?")
            else {
                return Ok(());
            };

            if choice >= 1 && choice <= ADMIN_ROLES.len() {
                let role_type = ADMIN_ROLES[choice - 1];

                ctx.echo_info(
                    SOURCE,
                    &format!("Attempting to assign admin role, {role_type} to user ID, {user_id}"),
                )
                .await;

                match ctx.client.assign_admin_role(RoleTarget::User, user_id, role_type).await {
                    Ok(_) => {
                        ctx.echo_success(
                            SOURCE,
                            &format!("Admin role, {role_type} assigned to user {user_id}"),
                        )
                        .await;
                    }
                    Err(e) => {
                        ctx.echo_error(
                            SOURCE,
                            &format!("Error assigning admin role to user\n    {}", e.detail()),
                        )
                        .await;
                        println!("{}", SUPER_ADMIN_HINT.red());
                    }
                }

                return Ok(());
            }

            println!("{}", "[!] Invalid option selected".red());
        }
    }
}
