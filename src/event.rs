use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

use crate::error::MonitorError;
use crate::record::{is_instance_id, InstanceRecord};

const ITEMS_POINTER: &str = "/detail/responseElements/instancesSet/items";

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub account_id: Option<String>,
    pub region: Option<String>,
    /// De-duplicated, in first-seen order.
    pub candidates: Vec<String>,
    pub arrived_at: DateTime<Utc>,
}

impl EventEnvelope {
    pub fn parse(raw: &Value) -> Result<Self, MonitorError> {
        Self::parse_at(raw, Utc::now())
    }

    /// Like `parse`, using `now` when the event carries no usable timestamp.
    ///
    /// Only a missing instance list makes the event malformed; bad entries
    /// inside the list are skipped.
    pub fn parse_at(raw: &Value, now: DateTime<Utc>) -> Result<Self, MonitorError> {
        if !raw.is_object() {
            return Err(MonitorError::MalformedEvent(
                "event is not a JSON object".to_string(),
            ));
        }
        let detail = raw
            .get("detail")
            .filter(|detail| detail.is_object())
            .ok_or_else(|| MonitorError::MalformedEvent("missing detail".to_string()))?;
        let items = raw
            .pointer(ITEMS_POINTER)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                MonitorError::MalformedEvent(
                    "missing detail.responseElements.instancesSet.items".to_string(),
                )
            })?;

        let mut seen = HashSet::new();
        let mut candidates = Vec::with_capacity(items.len());
        for item in items {
            match item.get("instanceId").and_then(Value::as_str) {
                Some(instance_id) if is_instance_id(instance_id) => {
                    if seen.insert(instance_id) {
                        candidates.push(instance_id.to_string());
                    }
                }
                Some(instance_id) => {
                    warn!(instance_id = %instance_id, "ignoring malformed instance id")
                }
                None => warn!(item = %item, "ignoring instance item without an instance id"),
            }
        }

        let account_id = text(raw.get("account"))
            .or_else(|| text(raw.pointer("/detail/userIdentity/accountId")))
            .or_else(|| text(detail.get("recipientAccountId")));
        let region = text(raw.get("region")).or_else(|| text(detail.get("awsRegion")));

        let arrived_at = match raw.get("time") {
            None | Some(Value::Null) => now,
            Some(time) => match time
                .as_str()
                .and_then(|time| DateTime::parse_from_rfc3339(time).ok())
            {
                Some(time) => time.with_timezone(&Utc),
                None => {
                    warn!(time = %time, "ignoring unreadable event time");
                    now
                }
            },
        };

        Ok(EventEnvelope {
            account_id,
            region,
            candidates,
            arrived_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    NoMatches,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_processed: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
}

impl Summary {
    pub fn new(total_processed: usize, matched_count: usize) -> Self {
        Summary {
            total_processed,
            matched_count,
            unmatched_count: total_processed.saturating_sub(matched_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLocation {
    pub key: String,
    pub rows_written: usize,
}

/// What one invocation did, before it is shaped into a response.
#[derive(Debug)]
pub struct Outcome {
    pub account_id: Option<String>,
    pub total_processed: usize,
    pub records: Vec<InstanceRecord>,
    pub report: Option<ReportLocation>,
}

#[derive(Debug, Serialize)]
pub struct ResponseEnvelope {
    pub status: Status,
    pub message: String,
    pub account_id: Option<String>,
    pub summary: Summary,
    pub matched: BTreeMap<String, InstanceRecord>,
    pub report: Option<ReportLocation>,
    pub records_at_risk: Option<usize>,
}

impl ResponseEnvelope {
    pub fn format(outcome: Outcome) -> Self {
        let summary = Summary::new(outcome.total_processed, outcome.records.len());
        let (status, message) = if outcome.records.is_empty() {
            (
                Status::NoMatches,
                format!(
                    "No tagged instances among {} candidate(s)",
                    summary.total_processed
                ),
            )
        } else {
            (
                Status::Success,
                format!(
                    "Recorded {} of {} instance(s)",
                    summary.matched_count, summary.total_processed
                ),
            )
        };

        ResponseEnvelope {
            status,
            message,
            account_id: outcome.account_id,
            summary,
            matched: keyed_by_identifier(outcome.records),
            report: outcome.report,
            records_at_risk: None,
        }
    }

    /// Whole-batch failure. `records` are the ones that did not make it into the report.
    pub fn from_error(
        error: &MonitorError,
        account_id: Option<String>,
        summary: Summary,
        records: Vec<InstanceRecord>,
    ) -> Self {
        ResponseEnvelope {
            status: Status::Error,
            message: error.to_string(),
            account_id,
            summary,
            matched: keyed_by_identifier(records),
            report: None,
            records_at_risk: error.records_at_risk(),
        }
    }
}

fn keyed_by_identifier(records: Vec<InstanceRecord>) -> BTreeMap<String, InstanceRecord> {
    records
        .into_iter()
        .map(|record| (record.identifier.clone(), record))
        .collect()
}
