//! Interactive navigation engine.
//!
//! A stack of shell levels over the node tree: entering a subshell pushes,
//! `back` pops one level, `main` returns to the root in one step, and
//! `exit`/`quit` ends the whole session regardless of depth. The prompt
//! renders the path from the root to the current level. Command dispatch
//! never aborts the loop; failed commands report and return to the prompt.

pub mod command;
pub mod context;
pub mod node;

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::error::Error;
use crate::options::parse_set_args;
use crate::options::SetOutcome;
pub use command::Command;
pub use context::ShellContext;
pub use node::{NodeBuilder, NodeId, ShellNode, ShellTree};

const PROMPT_SEPARATOR: &str = " > ";

/// Fixed navigation commands available at every level. `back` and `main`
/// are hidden at the root, where they are no-ops.
const NAV_COMMANDS: &[(&str, &str)] = &[
    ("help", "Show available commands"),
    ("back", "Return to the previous shell"),
    ("main", "Return to the main shell"),
    ("exit", "Exit the shell"),
    ("quit", "Exit the shell"),
];

/// The four-command contract every module node exposes.
const MODULE_CONTRACT: &[(&str, &str)] = &[
    ("info", "Show available options and their current values for this module"),
    ("set", "Set one or more options for this module"),
    ("reset", "Reset the options for this module"),
    ("execute", "Execute this module with the configured options"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Remain in the read loop (possibly at a different level).
    Stay,
    /// Terminate the whole session.
    Exit,
}

pub struct Shell {
    tree: ShellTree,
    stack: Vec<NodeId>,
    ctx: ShellContext,
}

impl Shell {
    pub fn new(root: NodeBuilder, ctx: ShellContext) -> Self {
        Self { tree: ShellTree::build(root), stack: Vec::new(), ctx }
    }

    /// Number of subshell levels below the root currently entered.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn current_id(&self) -> NodeId {
        self.stack.last().copied().unwrap_or(ShellTree::ROOT)
    }

    pub fn current(&self) -> &ShellNode {
        self.tree.node(self.current_id())
    }

    /// Root label plus every entered node name, each followed by the
    /// separator: `red-team-shell > discovery > get-users > `.
    pub fn prompt(&self) -> String {
        let mut segments = vec![self.tree.root().name().to_string()];
        segments.extend(self.stack.iter().map(|id| self.tree.node(*id).name().to_string()));
        format!("{}{}", segments.join(PROMPT_SEPARATOR), PROMPT_SEPARATOR)
    }

    /// Blocking interactive loop. Returns when the user exits.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut editor = DefaultEditor::new()?;

        loop {
            match editor.readline(&self.prompt()) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    editor.add_history_entry(line)?;
                    if self.handle_line(line).await == Outcome::Exit {
                        break;
                    }
                }
                // Ctrl-C discards the current line; Ctrl-D exits.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    /// Execute a single input line against the current level.
    pub async fn handle_line(&mut self, line: &str) -> Outcome {
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let Some((name, args)) = tokens.split_first() else {
            return Outcome::Stay;
        };

        match name.as_str() {
            "help" => {
                self.print_help(args.first().map(String::as_str));
                Outcome::Stay
            }
            "exit" | "quit" => Outcome::Exit,
            "main" => {
                self.stack.clear();
                Outcome::Stay
            }
            // Popping past the root is a no-op.
            "back" => {
                self.stack.pop();
                Outcome::Stay
            }
            _ => self.dispatch(name, args).await,
        }
    }

    async fn dispatch(&mut self, name: &str, args: &[String]) -> Outcome {
        let current_id = self.current_id();
        let current = self.tree.node(current_id);

        if current.module().is_some() && MODULE_CONTRACT.iter().any(|(n, _)| *n == name) {
            self.run_module_command(current_id, name, args).await;
            return Outcome::Stay;
        }

        if let Some(child) = current.children().get(name) {
            debug!(subshell = name, "entering subshell");
            self.stack.push(*child);
            return Outcome::Stay;
        }

        if let Some(command) = current.resolve(name) {
            if let Err(e) = command.run(&self.ctx, args).await {
                self.ctx.echo_error("shell", &format!("Error executing {name}\n    {}", e.detail())).await;
            }
            return Outcome::Stay;
        }

        let e = Error::NotFound(name.to_string());
        self.ctx.echo_error("shell", &e.to_string()).await;
        Outcome::Stay
    }

    async fn run_module_command(&mut self, id: NodeId, name: &str, args: &[String]) {
        let Self { tree, ctx, .. } = self;
        let Some(module) = tree.node_mut(id).module_mut() else {
            return;
        };
        let source = format!("modules::{}", module.name());

        match name {
            "info" => {
                println!("\n{}\n", module.description());
                if module.options().is_empty() {
                    println!("[*] This module has no options to set");
                } else {
                    println!("{}", module.options().render_table());
                }
            }
            "set" => {
                let updates = parse_set_args(args);
                if updates.is_empty() || module.options_mut().set(&updates) == SetOutcome::ShowUsage {
                    println!("{}", module.options().usage());
                }
            }
            "reset" => {
                module.options_mut().reset();
                println!("[*] Module options reset");
            }
            "execute" => {
                // Validate before any network call.
                if let Err(e) = module.options().check() {
                    let msg = format!("Unable to execute module. {e}. Set required value and try again");
                    ctx.echo_error(&source, &msg).await;
                    return;
                }
                if let Err(e) = module.execute(ctx).await {
                    let msg = format!("Error executing module\n    {}", e.detail());
                    ctx.echo_error(&source, &msg).await;
                }
            }
            _ => {}
        }
    }

    fn print_help(&self, topic: Option<&str>) {
        if let Some(topic) = topic {
            self.print_topic_help(topic);
            return;
        }

        let node = self.current();
        let at_root = self.stack.is_empty();

        let mut local: Vec<(String, String)> = Vec::new();
        if node.module().is_some() {
            local.extend(MODULE_CONTRACT.iter().map(|(n, h)| (n.to_string(), h.to_string())));
        }
        for (name, command) in node.commands() {
            local.push((name.clone(), command.help().to_string()));
        }
        let mut subshells: Vec<(String, String)> = Vec::new();
        for (name, id) in node.children() {
            subshells.push((name.clone(), self.tree.node(*id).description().to_string()));
        }

        if at_root {
            print_section("Global Commands", local);
            print_section("Modules", subshells);
            print_section("Navigation Commands", nav_entries(true));
        } else {
            println!();
            println!("{}", node.name());
            println!("{}", "=".repeat(node.name().len()));
            println!("{}\n", node.description());

            local.extend(subshells);
            print_section("Module Commands", local);
            print_section(
                "Global Commands",
                node.inherited().iter().map(|(n, c)| (n.clone(), c.help().to_string())).collect(),
            );
            print_section("Navigation Commands", nav_entries(false));
        }

        println!("Type help <command> for detailed information");
    }

    fn print_topic_help(&self, topic: &str) {
        let node = self.current();

        if let Some((name, help)) = NAV_COMMANDS.iter().find(|(n, _)| *n == topic) {
            println!("{name}: {help}");
            return;
        }
        if node.module().is_some() {
            if let Some((name, help)) = MODULE_CONTRACT.iter().find(|(n, _)| *n == topic) {
                println!("{name}: {help}");
                return;
            }
        }
        if let Some(command) = node.resolve(topic) {
            println!("{}: {}", command.name(), command.help());
            return;
        }
        if let Some(id) = node.children().get(topic) {
            let child = self.tree.node(*id);
            println!("{}: {}", child.name(), child.description());
            return;
        }

        println!("{}", format!("[!] No help found for {topic}").red());
    }
}

fn nav_entries(at_root: bool) -> Vec<(String, String)> {
    NAV_COMMANDS
        .iter()
        .filter(|(name, _)| !at_root || (*name != "back" && *name != "main"))
        .map(|(n, h)| (n.to_string(), h.to_string()))
        .collect()
}

fn print_section(title: &str, mut entries: Vec<(String, String)>) {
    if entries.is_empty() {
        return;
    }

    entries.sort();
    println!("{title}");
    println!("{}", "-".repeat(title.len()));
    for (name, help) in entries {
        println!("  {name:<18} {}", help.lines().next().unwrap_or_default());
    }
    println!();
}
