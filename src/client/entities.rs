//! Typed views over provider JSON records.
//!
//! The API returns loosely-shaped JSON; these views pull out the handful
//! of fields the shell prints without committing to the provider's full
//! object schemas.

use serde_json::Value;

fn field<'v>(value: &'v Value, path: &[&str]) -> &'v str {
    let mut current = value;
    for key in path {
        match current.get(key) {
            Some(next) => current = next,
            None => return "unknown",
        }
    }
    current.as_str().unwrap_or("unknown")
}

pub struct UserView<'a>(pub &'a Value);

impl UserView<'_> {
    pub fn id(&self) -> &str {
        field(self.0, &["id"])
    }

    pub fn login(&self) -> &str {
        field(self.0, &["profile", "login"])
    }

    pub fn print_info(&self) {
        println!("[*] User information for ID {}, login {}:", self.id(), self.login());
        println!(
            "    ID: {}\n    Status: {}\n    Login: {}\n    Last login: {}\n    Last password change: {}",
            self.id(),
            field(self.0, &["status"]),
            self.login(),
            field(self.0, &["lastLogin"]),
            field(self.0, &["passwordChanged"]),
        );
    }
}

pub struct GroupView<'a>(pub &'a Value);

impl GroupView<'_> {
    pub fn id(&self) -> &str {
        field(self.0, &["id"])
    }

    pub fn print_info(&self) {
        println!(
            "    Group ID: {}\n    Type: {}\n    Name: {}\n    Description: {}",
            self.id(),
            field(self.0, &["type"]),
            field(self.0, &["profile", "name"]),
            field(self.0, &["profile", "description"]),
        );
    }
}

pub struct PolicyView<'a>(pub &'a Value);

impl PolicyView<'_> {
    pub fn id(&self) -> &str {
        field(self.0, &["id"])
    }

    pub fn name(&self) -> &str {
        field(self.0, &["name"])
    }

    pub fn status(&self) -> &str {
        field(self.0, &["status"])
    }

    pub fn print_info(&self) {
        println!("[*] Information for policy ID {} ({}):", self.id(), self.name());
        println!(
            "    Status: {}\n    Description: {}\n    Created: {}\n    Last Updated: {}",
            self.status(),
            field(self.0, &["description"]),
            field(self.0, &["created"]),
            field(self.0, &["lastUpdated"]),
        );
    }
}

pub struct RoleView<'a>(pub &'a Value);

impl RoleView<'_> {
    pub fn print_info(&self) {
        println!(
            "    ID: {}\n    Label: {}\n    Type: {}\n    Status: {}\n    Assignment type: {}",
            field(self.0, &["id"]),
            field(self.0, &["label"]),
            field(self.0, &["type"]),
            field(self.0, &["status"]),
            field(self.0, &["assignmentType"]),
        );
    }
}
