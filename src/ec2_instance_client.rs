use async_trait::async_trait;
use rusoto_core::Region;
use rusoto_ec2::{DescribeInstancesRequest, Ec2, Ec2Client, Filter, Instance};
use tracing::debug;

use crate::error::MonitorError;

const MAX_RESULTS_PER_PAGE: i64 = 1000;

pub struct Ec2InstanceClient {
    client: Ec2Client,
}

#[async_trait]
pub trait Describe {
    /// Describes every instance in `instance_ids` that still exists. Ids that
    /// no longer resolve are left out of the result rather than failing the call.
    async fn describe_instances(&self, instance_ids: &[String])
        -> Result<Vec<Instance>, MonitorError>;
}

#[async_trait]
impl Describe for Ec2InstanceClient {
    async fn describe_instances(
        &self,
        instance_ids: &[String],
    ) -> Result<Vec<Instance>, MonitorError> {
        let mut instances = Vec::<Instance>::new();
        let mut next_token: Option<String> = None;
        loop {
            // The instance-id filter skips unknown ids, InstanceIds would reject the whole batch.
            let request = DescribeInstancesRequest {
                filters: Some(vec![Filter {
                    name: Some("instance-id".to_string()),
                    values: Some(instance_ids.to_vec()),
                }]),
                max_results: Some(MAX_RESULTS_PER_PAGE),
                next_token: next_token.take(),
                ..DescribeInstancesRequest::default()
            };

            let result = self.client.describe_instances(request).await?;

            for reservation in result.reservations.unwrap_or_default() {
                instances.extend(reservation.instances.unwrap_or_default());
            }

            match result.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }
        debug!(
            requested = instance_ids.len(),
            described = instances.len(),
            "described instances"
        );
        Ok(instances)
    }
}

impl Ec2InstanceClient {
    pub fn new(region: Region) -> Self {
        Self::new_with_client(Ec2Client::new(region))
    }

    pub fn new_with_client(client: Ec2Client) -> Self {
        Ec2InstanceClient { client }
    }
}
