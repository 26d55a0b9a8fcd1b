//! Audit event indexing.
//!
//! Every meaningful action emits one event to the configured sink so the
//! monitored environment's detection pipeline has a ground-truth record of
//! what the shell did and when. Indexing failures are logged and swallowed;
//! they must never abort the action that produced the event.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Info,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub module: String,
    pub event_type: EventType,
    pub event: String,
}

impl AuditEvent {
    pub fn new(module: &str, event_type: EventType, event: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            module: module.to_string(),
            event_type,
            event: event.to_string(),
        }
    }
}

/// Destination for audit events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn index_event(&self, event: &AuditEvent) -> Result<()>;
}

/// Ships events as JSON documents to an external indexing service.
pub struct HttpAuditSink {
    endpoint: String,
    http: reqwest::Client,
}

impl HttpAuditSink {
    pub fn new(endpoint: &str) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(7)).build()?;
        Ok(Self { endpoint: endpoint.trim_end_matches('/').to_string(), http })
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn index_event(&self, event: &AuditEvent) -> Result<()> {
        let response = self.http.post(&self.endpoint).json(event).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}

/// Discards every event. Used when no audit endpoint is configured.
pub struct NullAuditSink;

#[async_trait]
impl AuditSink for NullAuditSink {
    async fn index_event(&self, _event: &AuditEvent) -> Result<()> {
        Ok(())
    }
}

/// Shared handle that records events to the tracing log and the sink.
#[derive(Clone)]
pub struct Auditor {
    sink: Arc<dyn AuditSink>,
}

impl Auditor {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn disabled() -> Self {
        Self { sink: Arc::new(NullAuditSink) }
    }

    pub async fn info(&self, module: &str, event: &str) {
        info!(module, "{event}");
        self.index(AuditEvent::new(module, EventType::Info, event)).await;
    }

    pub async fn error(&self, module: &str, event: &str) {
        error!(module, "{event}");
        self.index(AuditEvent::new(module, EventType::Error, event)).await;
    }

    async fn index(&self, event: AuditEvent) {
        if let Err(e) = self.sink.index_event(&event).await {
            warn!("failed to index audit event: {e}");
        }
    }
}
