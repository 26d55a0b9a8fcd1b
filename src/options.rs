//! Module option registry.
//!
//! Every attack module declares an ordered set of named options at
//! construction time. Options are mutated through `set`/`reset` and
//! validated with `check` before the module is allowed to execute.

use indexmap::IndexMap;
use tabular::{Row, Table};

use crate::error::{Error, Result};

/// A configured value for a single option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Single(String),
    List(Vec<String>),
}

impl OptionValue {
    pub fn render(&self) -> String {
        match self {
            OptionValue::Single(v) => v.clone(),
            OptionValue::List(items) => items.join(","),
        }
    }
}

/// How raw input for an option is interpreted by `set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Single,
    /// Comma-separated input is split into an ordered list of values.
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleOption {
    pub value: Option<OptionValue>,
    pub required: bool,
    pub help: String,
    pub kind: OptionKind,
}

/// Result of a `set` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// At least one option value was written.
    Updated,
    /// Every update was empty; nothing was mutated and the caller should
    /// print the module usage instead.
    ShowUsage,
}

/// Insertion-ordered option registry owned by a module.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleOptions {
    entries: IndexMap<String, ModuleOption>,
}

impl ModuleOptions {
    pub fn new() -> Self {
        Self { entries: IndexMap::new() }
    }

    /// Declare a single-valued option. Options start unset.
    pub fn declare(mut self, name: &str, required: bool, help: &str) -> Self {
        self.entries.insert(
            name.to_string(),
            ModuleOption { value: None, required, help: help.to_string(), kind: OptionKind::Single },
        );
        self
    }

    /// Declare a list-valued option whose input is split on commas.
    pub fn declare_list(mut self, name: &str, required: bool, help: &str) -> Self {
        self.entries.insert(
            name.to_string(),
            ModuleOption { value: None, required, help: help.to_string(), kind: OptionKind::List },
        );
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply updates keyed by option name. Empty updates leave the previous
    /// value in place so partial `set` calls do not clobber earlier settings.
    pub fn set(&mut self, updates: &[(String, Option<String>)]) -> SetOutcome {
        if updates.iter().all(|(_, value)| value.is_none()) {
            return SetOutcome::ShowUsage;
        }

        for (name, value) in updates {
            let Some(raw) = value else { continue };
            // Blank input does not clobber a previously set value.
            if raw.trim().is_empty() {
                continue;
            }

            match self.entries.get_mut(name.as_str()) {
                Some(option) => {
                    option.value = Some(match option.kind {
                        OptionKind::Single => OptionValue::Single(raw.trim().to_string()),
                        OptionKind::List => OptionValue::List(
                            raw.trim().split(',').map(|item| item.to_string()).collect(),
                        ),
                    });
                }
                None => {
                    tracing::warn!(option = %name, "ignoring unknown option");
                }
            }
        }

        SetOutcome::Updated
    }

    /// Clear every option back to unset.
    pub fn reset(&mut self) {
        for option in self.entries.values_mut() {
            option.value = None;
        }
    }

    /// Verify that every required option holds a non-empty value. Scans
    /// the whole registry and reports the first required option that is
    /// unset.
    pub fn check(&self) -> Result<()> {
        for (name, option) in &self.entries {
            let missing = match &option.value {
                None => true,
                Some(OptionValue::Single(value)) => value.is_empty(),
                Some(OptionValue::List(items)) => items.is_empty(),
            };
            if option.required && missing {
                return Err(Error::Validation(display_name(name)));
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        match self.entries.get(name)?.value.as_ref()? {
            OptionValue::Single(v) => Some(v.as_str()),
            OptionValue::List(_) => None,
        }
    }

    pub fn get_list(&self, name: &str) -> Option<&[String]> {
        match self.entries.get(name)?.value.as_ref()? {
            OptionValue::List(items) => Some(items.as_slice()),
            OptionValue::Single(_) => None,
        }
    }

    /// Render the registry as a table: option, value, required, help.
    /// Underscores in option names display as dashes.
    pub fn render_table(&self) -> String {
        let mut table = Table::new("{:<}    {:<}    {:<}    {:<}");
        table.add_row(
            Row::new().with_cell("Option").with_cell("Value").with_cell("Required").with_cell("Description"),
        );

        for (name, option) in &self.entries {
            table.add_row(
                Row::new()
                    .with_cell(display_name(name))
                    .with_cell(option.value.as_ref().map(OptionValue::render).unwrap_or_default())
                    .with_cell(option.required)
                    .with_cell(option.help.lines().next().unwrap_or_default()),
            );
        }

        table.to_string()
    }

    /// Usage text for the `set` command, listing the module's settable options.
    pub fn usage(&self) -> String {
        let flags: Vec<String> =
            self.entries.keys().map(|name| format!("[--{} <value>]", display_name(name))).collect();
        format!("Usage: set {}\n\nOptions:\n{}", flags.join(" "), self.describe_flags())
    }

    fn describe_flags(&self) -> String {
        self.entries
            .iter()
            .map(|(name, option)| format!("  --{:<18} {}", display_name(name), option.help.lines().next().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModuleOption)> {
        self.entries.iter()
    }
}

fn display_name(name: &str) -> String {
    name.replace('_', "-")
}

/// Parse `set` command arguments of the form `--option value`. Option names
/// use dashes on the command line and underscores in the registry. A flag
/// with no following value parses as an empty update.
pub fn parse_set_args(args: &[String]) -> Vec<(String, Option<String>)> {
    let mut updates = Vec::new();
    let mut index = 0;

    while index < args.len() {
        let token = &args[index];
        if let Some(name) = token.strip_prefix("--") {
            let key = name.replace('-', "_");
            let value = match args.get(index + 1) {
                Some(next) if !next.starts_with("--") => {
                    index += 1;
                    Some(next.clone())
                }
                _ => None,
            };
            updates.push((key, value));
        }
        index += 1;
    }

    updates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_set_args_pairs_flags_with_values() {
        let args: Vec<String> =
            ["--id", "123", "--group-ids", "a,b", "--missing"].iter().map(|s| s.to_string()).collect();
        let updates = parse_set_args(&args);
        assert_eq!(
            updates,
            vec![
                ("id".to_string(), Some("123".to_string())),
                ("group_ids".to_string(), Some("a,b".to_string())),
                ("missing".to_string(), None),
            ]
        );
    }

    #[test]
    fn option_names_display_with_dashes() {
        let options = ModuleOptions::new().declare("group_ids", false, "Group IDs");
        assert!(options.render_table().contains("group-ids"));
    }
}
