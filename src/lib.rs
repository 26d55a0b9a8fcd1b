//! Red Team Shell Library
//!
//! Interactive shell for simulating adversary techniques against an
//! identity provider's REST API, to exercise security monitoring and
//! detection pipelines.

pub mod audit;
pub mod client;
pub mod error;
pub mod modules;
pub mod options;
pub mod shell;
pub mod storage;

pub use audit::{AuditEvent, AuditSink, Auditor, EventType};
pub use client::fetcher::Harvest;
pub use client::{IdpClient, RoleTarget};
pub use error::{Error, Result};
pub use modules::Module;
pub use options::{ModuleOptions, OptionValue, SetOutcome};
pub use shell::{NodeBuilder, Outcome, Shell, ShellContext};
