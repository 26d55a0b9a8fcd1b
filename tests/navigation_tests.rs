//! Navigation engine tests: stack transitions, command inheritance, and
//! the four-command module contract driven through the dispatch loop.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use red_team_shell::error::Result;
use red_team_shell::modules;
use red_team_shell::shell::node::ShellTree;
use red_team_shell::shell::{Command, NodeBuilder, ShellContext};
use red_team_shell::{Auditor, IdpClient, Module as _, Outcome, Shell};

/// Root-level command that records every invocation, so output can be
/// compared across depths.
struct Recorder {
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Command for Recorder {
    fn name(&self) -> &str {
        "ping"
    }

    fn help(&self) -> &str {
        "Record an invocation"
    }

    async fn run(&self, _ctx: &ShellContext, args: &[String]) -> Result<()> {
        self.log.lock().unwrap().push(format!("ping {}", args.join(" ")));
        Ok(())
    }
}

fn test_context() -> ShellContext {
    ShellContext {
        // Points at a closed port; navigation tests never reach the network.
        client: IdpClient::new("http://127.0.0.1:9/api/v1", "test-token").unwrap(),
        auditor: Auditor::disabled(),
        data_dir: std::env::temp_dir().join("rts-navigation-tests"),
        session_prefix: "test".to_string(),
        assume_yes: true,
    }
}

fn nested_shell(log: Arc<Mutex<Vec<String>>>) -> Shell {
    let root = NodeBuilder::new("redshell", "test root").command(Arc::new(Recorder { log })).child(
        NodeBuilder::new("alpha", "first level").child(
            NodeBuilder::new("beta", "second level").child(NodeBuilder::new("gamma", "third level")),
        ),
    );
    Shell::new(root, test_context())
}

#[tokio::test]
async fn main_returns_directly_to_root_from_any_depth() {
    let mut shell = nested_shell(Arc::new(Mutex::new(Vec::new())));

    assert_eq!(shell.handle_line("alpha").await, Outcome::Stay);
    assert_eq!(shell.handle_line("beta").await, Outcome::Stay);
    assert_eq!(shell.depth(), 2);

    assert_eq!(shell.handle_line("main").await, Outcome::Stay);
    assert_eq!(shell.depth(), 0);
}

#[tokio::test]
async fn exit_from_depth_three_terminates_the_whole_session() {
    let mut shell = nested_shell(Arc::new(Mutex::new(Vec::new())));

    shell.handle_line("alpha").await;
    shell.handle_line("beta").await;
    shell.handle_line("gamma").await;
    assert_eq!(shell.depth(), 3);

    assert_eq!(shell.handle_line("exit").await, Outcome::Exit);
}

#[tokio::test]
async fn quit_is_a_synonym_for_exit_at_the_root() {
    let mut shell = nested_shell(Arc::new(Mutex::new(Vec::new())));
    assert_eq!(shell.handle_line("quit").await, Outcome::Exit);
}

#[tokio::test]
async fn back_pops_exactly_one_level_and_is_a_no_op_at_root() {
    let mut shell = nested_shell(Arc::new(Mutex::new(Vec::new())));

    shell.handle_line("alpha").await;
    shell.handle_line("beta").await;

    assert_eq!(shell.handle_line("back").await, Outcome::Stay);
    assert_eq!(shell.depth(), 1);

    assert_eq!(shell.handle_line("back").await, Outcome::Stay);
    assert_eq!(shell.depth(), 0);

    assert_eq!(shell.handle_line("back").await, Outcome::Stay);
    assert_eq!(shell.depth(), 0);
}

#[tokio::test]
async fn prompt_renders_the_path_from_root_to_current_level() {
    let mut shell = nested_shell(Arc::new(Mutex::new(Vec::new())));
    assert_eq!(shell.prompt(), "redshell > ");

    shell.handle_line("alpha").await;
    shell.handle_line("beta").await;
    assert!(shell.prompt().ends_with("alpha > beta > "));
}

#[tokio::test]
async fn root_commands_resolve_identically_at_every_depth() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut shell = nested_shell(log.clone());

    shell.handle_line("ping x").await;
    shell.handle_line("alpha").await;
    shell.handle_line("ping x").await;
    shell.handle_line("beta").await;
    shell.handle_line("gamma").await;
    shell.handle_line("ping x").await;

    let entries = log.lock().unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|entry| entry == "ping x"));
}

#[tokio::test]
async fn unknown_commands_report_and_do_not_change_level() {
    let mut shell = nested_shell(Arc::new(Mutex::new(Vec::new())));

    shell.handle_line("alpha").await;
    assert_eq!(shell.handle_line("bogus").await, Outcome::Stay);
    assert_eq!(shell.depth(), 1);
}

#[tokio::test]
async fn entering_a_subshell_links_back_to_its_parent() {
    let mut shell = nested_shell(Arc::new(Mutex::new(Vec::new())));

    shell.handle_line("alpha").await;
    assert_eq!(shell.current().parent(), Some(ShellTree::ROOT));

    shell.handle_line("beta").await;
    assert_eq!(shell.current().name(), "beta");
    assert!(shell.current().parent().is_some());
    assert_ne!(shell.current().parent(), Some(ShellTree::ROOT));
}

#[tokio::test]
async fn module_contract_is_reachable_through_dispatch() {
    let mut shell = Shell::new(modules::build_root(), test_context());

    shell.handle_line("discovery").await;
    shell.handle_line("get-user").await;
    assert_eq!(shell.depth(), 2);
    assert!(shell.prompt().ends_with("discovery > get-user > "));

    shell.handle_line("set --id 00u123").await;
    let module = shell.current().module().expect("get-user is a module node");
    assert_eq!(module.options().get("id"), Some("00u123"));

    shell.handle_line("reset").await;
    let module = shell.current().module().expect("get-user is a module node");
    assert_eq!(module.options().get("id"), None);
}

#[tokio::test]
async fn execute_with_missing_required_options_is_refused_and_survives() {
    let mut shell = Shell::new(modules::build_root(), test_context());

    shell.handle_line("discovery").await;
    shell.handle_line("get-user").await;

    // No id set: validation refuses execution before any network call and
    // the loop stays alive at the same level.
    assert_eq!(shell.handle_line("execute").await, Outcome::Stay);
    assert_eq!(shell.depth(), 2);
}

#[tokio::test]
async fn globals_from_the_real_tree_are_inherited_by_module_nodes() {
    let mut shell = Shell::new(modules::build_root(), test_context());

    shell.handle_line("persistence").await;
    shell.handle_line("create-admin-user").await;

    // list-modules is declared only at the root; it must resolve here.
    assert!(shell.current().inherited().contains_key("list-modules"));
    assert_eq!(shell.handle_line("list-modules").await, Outcome::Stay);
    assert_eq!(shell.depth(), 2);
}
