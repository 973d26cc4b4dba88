use rusoto_ec2::Instance;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::ec2_instance_client::Describe;
use crate::error::MonitorError;

#[derive(Debug, Default)]
pub struct Selection {
    pub matched: Vec<Instance>,
    pub unmatched: Vec<String>,
}

pub struct TagFilter<'a, D> {
    describer: &'a D,
    key: &'a str,
    value: &'a str,
}

impl<'a, D: Describe + Sync> TagFilter<'a, D> {
    pub fn new(describer: &'a D, key: &'a str, value: &'a str) -> Self {
        TagFilter {
            describer,
            key,
            value,
        }
    }

    /// Splits `instance_ids` into instances carrying `key=value` and ids that don't,
    /// both in input order. Makes at most one batched lookup.
    pub async fn select(&self, instance_ids: &[String]) -> Result<Selection, MonitorError> {
        if instance_ids.is_empty() {
            return Ok(Selection::default());
        }

        let described = self.describer.describe_instances(instance_ids).await?;
        let mut by_id: HashMap<String, Instance> = described
            .into_iter()
            .filter_map(|instance| instance.instance_id.clone().map(|id| (id, instance)))
            .collect();

        let mut selection = Selection::default();
        for instance_id in instance_ids {
            match by_id.remove(instance_id) {
                Some(instance) if self.is_tagged(&instance) => selection.matched.push(instance),
                Some(_) => {
                    debug!(instance_id = %instance_id, key = self.key, "instance lacks required tag");
                    selection.unmatched.push(instance_id.clone());
                }
                None => {
                    warn!(instance_id = %instance_id, "instance no longer exists, skipping");
                    selection.unmatched.push(instance_id.clone());
                }
            }
        }
        Ok(selection)
    }

    fn is_tagged(&self, instance: &Instance) -> bool {
        instance.tags.iter().flatten().any(|tag| {
            tag.key.as_deref() == Some(self.key) && tag.value.as_deref() == Some(self.value)
        })
    }
}
