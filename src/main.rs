//! Red Team Shell
//!
//! Interactive shell that simulates adversary techniques against an
//! identity provider environment so its security monitoring and detection
//! pipelines can be validated against realistic activity.

use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use red_team_shell::audit::HttpAuditSink;
use red_team_shell::modules;
use red_team_shell::storage;
use red_team_shell::{Auditor, IdpClient, Shell, ShellContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let matches = Command::new("red-team-shell")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Simulate adversary techniques against an identity provider environment")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("Provider API base URL, e.g. https://example.okta.com/api/v1 (or REDSHELL_URL)"),
        )
        .arg(
            Arg::new("token")
                .short('t')
                .long("token")
                .value_name("TOKEN")
                .help("API token for the target environment (or REDSHELL_TOKEN)"),
        )
        .arg(
            Arg::new("audit-url")
                .long("audit-url")
                .value_name("URL")
                .help("Endpoint to index audit events at; events are discarded when unset"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Directory harvested data is written to (default: ~/red-team-shell/data)"),
        )
        .arg(
            Arg::new("page-delay-ms")
                .long("page-delay-ms")
                .value_name("MILLIS")
                .default_value("1000")
                .help("Courtesy delay between harvested pages, to respect provider rate limits"),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .action(ArgAction::SetTrue)
                .help("Answer yes to every confirmation prompt"),
        )
        .get_matches();

    println!("{}", "🔴 RED TEAM SHELL".red().bold());
    println!("{}", "==========================================".red());
    println!("A tool to test security monitoring and detection for identity provider environments\n");
    println!(
        "{}: this shell can change the configuration of your target environment",
        "Caution".underline()
    );
    println!("Consider using a test environment to avoid any risk of impacting production\n");

    let url = matches
        .get_one::<String>("url")
        .cloned()
        .or_else(|| std::env::var("REDSHELL_URL").ok())
        .ok_or_else(|| anyhow::anyhow!("no target URL; pass --url or set REDSHELL_URL"))?;
    let token = matches
        .get_one::<String>("token")
        .cloned()
        .or_else(|| std::env::var("REDSHELL_TOKEN").ok())
        .ok_or_else(|| anyhow::anyhow!("no API token; pass --token or set REDSHELL_TOKEN"))?;
    let page_delay: u64 = matches
        .get_one::<String>("page-delay-ms")
        .map(String::as_str)
        .unwrap_or("1000")
        .parse()?;

    let data_dir = match matches.get_one::<String>("data-dir") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("unable to determine home directory; pass --data-dir"))?
            .join("red-team-shell/data"),
    };

    let saved = storage::saved_harvest_files(&data_dir);
    if !saved.is_empty() {
        println!("[*] Found {} saved harvest file(s) in {}", saved.len(), data_dir.display());
    }

    let session_prefix = reqwest::Url::parse(&url)?
        .host_str()
        .unwrap_or("target")
        .replace('.', "-");

    let auditor = match matches.get_one::<String>("audit-url") {
        Some(audit_url) => {
            println!("[*] Audit events will be indexed at {audit_url}");
            Auditor::new(Arc::new(HttpAuditSink::new(audit_url)?))
        }
        None => Auditor::disabled(),
    };

    let client =
        IdpClient::new(&url, &token)?.with_page_delay(Duration::from_millis(page_delay));

    let ctx = ShellContext {
        client,
        auditor,
        data_dir,
        session_prefix,
        assume_yes: matches.get_flag("yes"),
    };

    ctx.auditor.info("main", &format!("Red team shell started using URL {url}")).await;

    println!("[*] Consider executing \"whoami\" to get user information and roles associated with the current API token");
    println!("[*] Execute \"list-modules\" to show all available modules");
    println!("[*] Type \"help\" to get started\n");

    let mut shell = Shell::new(modules::build_root(), ctx);
    shell.run().await
}
