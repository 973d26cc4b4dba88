use tracing::{debug, info};

use crate::error::MonitorError;
use crate::partition::PartitionKey;
use crate::record::InstanceRecord;
use crate::report;
use crate::s3_report_client::ReportStore;

/// Read-modify-write append of records to a day partition.
///
/// Concurrent appends to the same partition are not serialized: the last
/// writer wins and the other writer's rows can be lost. Re-running an append
/// can only duplicate rows.
pub struct ReportSink<'a, S> {
    store: &'a S,
    prefix: &'a str,
    file_name: &'a str,
}

impl<'a, S: ReportStore + Sync> ReportSink<'a, S> {
    pub fn new(store: &'a S, prefix: &'a str, file_name: &'a str) -> Self {
        ReportSink {
            store,
            prefix,
            file_name,
        }
    }

    pub fn object_key(&self, partition: &PartitionKey) -> String {
        partition.object_key(self.prefix, self.file_name)
    }

    /// Returns the number of rows written.
    pub async fn append(
        &self,
        partition: &PartitionKey,
        records: &[InstanceRecord],
    ) -> Result<usize, MonitorError> {
        if records.is_empty() {
            return Ok(0);
        }
        let key = self.object_key(partition);
        let unconfirmed = records.len();

        let existing = match self.store.read_partition(&key).await {
            Ok(Some(bytes)) => {
                String::from_utf8(bytes).map_err(|error| MonitorError::sink(unconfirmed, error))?
            }
            Ok(None) => String::new(),
            Err(cause) => return Err(MonitorError::sink(unconfirmed, cause)),
        };
        let merged = report::merge(&existing, records);
        debug!(
            key = %key,
            existing_bytes = existing.len(),
            appended = records.len(),
            "merged partition"
        );

        self.store
            .write_partition(&key, merged.into_bytes())
            .await
            .map_err(|cause| MonitorError::sink(unconfirmed, cause))?;

        info!(key = %key, rows = records.len(), "appended report rows");
        Ok(records.len())
    }
}
