use rusoto_ec2::Instance;
use std::convert::TryFrom;
use tracing::warn;

use crate::record::InstanceRecord;

/// Builds one record per describable instance, keeping input order.
pub fn collect(matched: &[Instance]) -> Vec<InstanceRecord> {
    matched
        .iter()
        .filter_map(|instance| match InstanceRecord::try_from(instance) {
            Ok(record) => Some(record),
            Err(error) => {
                warn!(%error, "dropping undescribable instance");
                None
            }
        })
        .collect()
}
