use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::collector;
use crate::config::MonitorConfig;
use crate::ec2_instance_client::Describe;
use crate::event::{EventEnvelope, Outcome, ReportLocation, ResponseEnvelope, Summary};
use crate::partition::PartitionKey;
use crate::report_sink::ReportSink;
use crate::s3_report_client::ReportStore;
use crate::tag_filter::TagFilter;

/// Runs one invocation: parse, filter, collect, append, respond.
///
/// Clients are built once per process and handed in; the monitor keeps no
/// state between invocations.
pub struct Monitor<D, S> {
    describer: D,
    store: S,
    config: MonitorConfig,
}

impl<D, S> Monitor<D, S>
where
    D: Describe + Send + Sync,
    S: ReportStore + Send + Sync,
{
    pub fn new(describer: D, store: S, config: MonitorConfig) -> Self {
        Monitor {
            describer,
            store,
            config,
        }
    }

    /// Never fails: every error ends up in the returned envelope.
    pub async fn handle(&self, raw: Value) -> ResponseEnvelope {
        let envelope = match EventEnvelope::parse(&raw) {
            Ok(envelope) => envelope,
            Err(error) => {
                error!(%error, "rejecting event");
                return ResponseEnvelope::from_error(&error, None, Summary::default(), vec![]);
            }
        };
        self.process(envelope).await
    }

    pub async fn process(&self, envelope: EventEnvelope) -> ResponseEnvelope {
        let total = envelope.candidates.len();
        info!(
            account_id = envelope.account_id.as_deref().unwrap_or("unknown"),
            region = envelope.region.as_deref().unwrap_or("unknown"),
            candidates = total,
            "processing launch event"
        );

        let filter = TagFilter::new(
            &self.describer,
            &self.config.tag_key,
            &self.config.tag_value,
        );
        let selection = match filter.select(&envelope.candidates).await {
            Ok(selection) => selection,
            Err(error) => {
                error!(%error, "instance lookup failed");
                return ResponseEnvelope::from_error(
                    &error,
                    envelope.account_id,
                    Summary::new(total, 0),
                    vec![],
                );
            }
        };

        debug!(
            matched = selection.matched.len(),
            unmatched = selection.unmatched.len(),
            "applied tag filter"
        );

        let records = collector::collect(&selection.matched);
        if records.is_empty() {
            info!(candidates = total, "no tagged instances");
            return ResponseEnvelope::format(Outcome {
                account_id: envelope.account_id,
                total_processed: total,
                records,
                report: None,
            });
        }

        let partition = PartitionKey::from(envelope.arrived_at);
        let sink = ReportSink::new(
            &self.store,
            &self.config.report_prefix,
            &self.config.report_file_name,
        );
        match sink.append(&partition, &records).await {
            Ok(rows_written) => {
                info!(
                    partition = %partition,
                    matched = records.len(),
                    unmatched = total - records.len(),
                    "recorded tagged instances"
                );
                ResponseEnvelope::format(Outcome {
                    account_id: envelope.account_id,
                    total_processed: total,
                    report: Some(ReportLocation {
                        key: sink.object_key(&partition),
                        rows_written,
                    }),
                    records,
                })
            }
            Err(error) => {
                warn!(%error, partition = %partition, "report append not confirmed");
                let summary = Summary::new(total, records.len());
                ResponseEnvelope::from_error(&error, envelope.account_id, summary, records)
            }
        }
    }
}
