//! Shared state handed to every command and module execution.

use colored::Colorize;
use dialoguer::{Confirm, Input, Password};
use std::path::PathBuf;

use crate::audit::Auditor;
use crate::client::IdpClient;

/// Admin role types as documented by the provider. Only the SUPER_ADMIN
/// role can view, assign, or remove admin roles.
pub const ADMIN_ROLES: &[&str] = &[
    "API_ACCESS_MANAGEMENT_ADMIN",
    "APP_ADMIN",
    "GROUP_MEMBERSHIP_ADMIN",
    "HELP_DESK_ADMIN",
    "MOBILE_ADMIN",
    "ORG_ADMIN",
    "READ_ONLY_ADMIN",
    "REPORT_ADMIN",
    "SUPER_ADMIN",
    "USER_ADMIN",
];

pub const POLICY_TYPES: &[&str] =
    &["OKTA_SIGN_ON", "PASSWORD", "MFA_ENROLL", "OAUTH_AUTHORIZATION_POLICY", "IDP_DISCOVERY"];

pub struct ShellContext {
    pub client: IdpClient,
    pub auditor: Auditor,
    /// Directory harvested data files are written to.
    pub data_dir: PathBuf,
    /// Prefix stamped onto harvest file names, derived from the target host.
    pub session_prefix: String,
    /// Answer yes to every confirmation prompt (`--yes`).
    pub assume_yes: bool,
}

impl ShellContext {
    /// Ask a yes/no question. With `--yes` the question is skipped and
    /// answered affirmatively; a failed interaction falls back to the
    /// default answer.
    pub fn confirm(&self, prompt: &str, default: bool) -> bool {
        if self.assume_yes {
            return true;
        }
        Confirm::new()
            .with_prompt(format!("[*] {prompt}"))
            .default(default)
            .interact()
            .unwrap_or(default)
    }

    /// Prompt for a line of input. `None` when no interactive terminal is
    /// available.
    pub fn prompt_string(&self, prompt: &str) -> Option<String> {
        Input::<String>::new().with_prompt(format!("[*] {prompt}")).interact_text().ok()
    }

    /// Prompt for a number, e.g. a menu choice.
    pub fn prompt_number(&self, prompt: &str) -> Option<usize> {
        Input::<usize>::new().with_prompt(format!("[*] {prompt}")).interact_text().ok()
    }

    /// Prompt for a secret with hidden input.
    pub fn prompt_hidden(&self, prompt: &str) -> Option<String> {
        Password::new().with_prompt(format!("[*] {prompt}")).interact().ok()
    }

    /// Announce an action: audit event, structured log, console line.
    pub async fn echo_info(&self, source: &str, msg: &str) {
        self.auditor.info(source, msg).await;
        println!("[*] {msg}");
    }

    /// Record a completed action with a green console line.
    pub async fn echo_success(&self, source: &str, msg: &str) {
        self.auditor.info(source, msg).await;
        println!("{}", format!("[*] {msg}").green());
    }

    /// Record a failure with a red console line. The shell loop survives;
    /// nothing is re-raised past this point.
    pub async fn echo_error(&self, source: &str, msg: &str) {
        self.auditor.error(source, msg).await;
        println!("{}", format!("[!] {msg}").red());
    }
}
