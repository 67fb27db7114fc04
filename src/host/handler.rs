//! Routes host commands to a [`SessionDriver`].

use crate::driver::SessionDriver;
use crate::error::{Result, StackrankError};
use crate::host::contract::{
    CommandEnvelope, CommandName, ContractError, ContractErrorKind, EVENT_VERSION,
    ResponseEnvelope,
};
use crate::merger::ViewMode;
use crate::present;
use crate::session::SessionSnapshot;
use chrono::{DateTime, Utc};
use serde::Serialize;
use stackrank_gateway::{AnswerGateway, RecentSearch};

/// One `recent.list` entry: the backend record plus a display age label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentRow {
    #[serde(flatten)]
    pub search: RecentSearch,
    /// `None` when the backend timestamp is missing or unparseable.
    pub age: Option<String>,
}

impl RecentRow {
    pub fn new(search: RecentSearch, now: DateTime<Utc>) -> Self {
        let age = present::relative_age(&search.inserted_at, now);
        Self { search, age }
    }
}

/// Production command handler backed by one search session.
pub struct SessionCommandHandler<G> {
    driver: SessionDriver<G>,
}

impl<G> Clone for SessionCommandHandler<G> {
    fn clone(&self) -> Self {
        Self {
            driver: self.driver.clone(),
        }
    }
}

impl<G: AnswerGateway + 'static> SessionCommandHandler<G> {
    pub fn new(driver: SessionDriver<G>) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &SessionDriver<G> {
        &self.driver
    }

    /// Validate and route `envelope`, folding any failure into an error
    /// response.
    pub async fn handle(&self, envelope: &CommandEnvelope) -> ResponseEnvelope {
        if let Err(e) = envelope.validate() {
            tracing::warn!(request_id = %envelope.request_id, error = %e, "invalid command envelope");
            return ResponseEnvelope::error(envelope.request_id.clone(), e.to_string());
        }

        match self.route(envelope).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(
                    command = envelope.command.as_str(),
                    request_id = %envelope.request_id,
                    error = %e,
                    "host command failed"
                );
                ResponseEnvelope::error(envelope.request_id.clone(), e.to_string())
            }
        }
    }

    /// Route a command envelope to the session.
    pub async fn route(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let request_id = envelope.request_id.clone();
        let payload = match envelope.command {
            CommandName::HostPing => serde_json::json!({"pong": true}),
            CommandName::HostVersion => serde_json::json!({
                "contract_version": EVENT_VERSION,
                "package_version": env!("CARGO_PKG_VERSION"),
            }),
            CommandName::SessionSubmitQuery => {
                let query = parse_query(&envelope.payload)?;
                snapshot_json(self.driver.submit_query(query).await?)?
            }
            CommandName::SessionSelectView => {
                let view = parse_view(&envelope.payload)?;
                snapshot_json(self.driver.select_view(view).await?)?
            }
            CommandName::SessionSnapshot => snapshot_json(self.driver.snapshot())?,
            CommandName::CapabilityStatus => {
                let capability = self.driver.snapshot().capability;
                serde_json::json!({
                    "capability": capability,
                    "available": capability.is_available(),
                })
            }
            CommandName::RecentList => {
                let now = Utc::now();
                let searches: Vec<RecentRow> = self
                    .driver
                    .recent_searches()
                    .await?
                    .into_iter()
                    .map(|search| RecentRow::new(search, now))
                    .collect();
                serde_json::json!({ "searches": searches })
            }
            CommandName::RuntimeStop => serde_json::json!({"stopping": true}),
        };
        Ok(ResponseEnvelope::ok(request_id, payload))
    }
}

fn snapshot_json(snapshot: SessionSnapshot) -> Result<serde_json::Value> {
    serde_json::to_value(snapshot)
        .map_err(|e| StackrankError::Protocol(format!("failed to serialize snapshot: {e}")))
}

fn invalid_payload(message: String) -> ContractError {
    ContractError::new(ContractErrorKind::InvalidPayload, message)
}

fn parse_query(payload: &serde_json::Value) -> std::result::Result<&str, ContractError> {
    payload
        .get("query")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| invalid_payload("session.submit_query requires payload.query".to_owned()))
}

fn parse_view(payload: &serde_json::Value) -> std::result::Result<ViewMode, ContractError> {
    let Some(raw) = payload.get("view") else {
        return Err(invalid_payload(
            "session.select_view requires payload.view".to_owned(),
        ));
    };
    serde_json::from_value(raw.clone()).map_err(|_| {
        invalid_payload(format!(
            "unsupported view `{raw}` (expected original/ranked)"
        ))
    })
}
