use crate::ec2_instance_client::Describe;
use crate::error::{MonitorError, SinkFailureCause};
use crate::s3_report_client::ReportStore;
use async_trait::async_trait;
use rusoto_core::RusotoError;
use rusoto_ec2::{Instance, InstanceState, Placement, Tag};
use rusoto_s3::{GetObjectError, PutObjectError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn instance(instance_id: &str, tags: &[(&str, &str)]) -> Instance {
    Instance {
        instance_id: Some(instance_id.to_string()),
        instance_type: Some("t3.micro".to_string()),
        state: Some(InstanceState {
            code: Some(16),
            name: Some("running".to_string()),
        }),
        launch_time: Some("2025-03-07T10:15:00.000Z".to_string()),
        placement: Some(Placement {
            availability_zone: Some("us-east-1a".to_string()),
            ..Default::default()
        }),
        vpc_id: Some("vpc-0a1b2c".to_string()),
        subnet_id: Some("subnet-0d4e5f".to_string()),
        private_ip_address: Some("10.0.1.15".to_string()),
        tags: if tags.is_empty() {
            None
        } else {
            Some(
                tags.iter()
                    .map(|(key, value)| Tag {
                        key: Some(key.to_string()),
                        value: Some(value.to_string()),
                    })
                    .collect(),
            )
        },
        ..Default::default()
    }
}

/// Answers lookups from a fixed inventory and counts how often it was asked.
pub struct FakeDescriber {
    inventory: Vec<Instance>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeDescriber {
    pub fn new(inventory: Vec<Instance>) -> Self {
        FakeDescriber {
            inventory,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        FakeDescriber {
            inventory: vec![],
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Describe for FakeDescriber {
    async fn describe_instances(
        &self,
        instance_ids: &[String],
    ) -> Result<Vec<Instance>, MonitorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MonitorError::LookupFailure(RusotoError::Validation(
                "throttled".to_string(),
            )));
        }
        Ok(self
            .inventory
            .iter()
            .filter(|instance| {
                instance
                    .instance_id
                    .as_ref()
                    .map_or(false, |id| instance_ids.contains(id))
            })
            .cloned()
            .collect())
    }
}

/// Report store backed by a map of object key to content.
#[derive(Default)]
pub struct MemoryReportStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: bool,
    fail_writes: bool,
    writes: AtomicUsize,
}

impl MemoryReportStore {
    pub fn failing_writes() -> Self {
        MemoryReportStore {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn failing_reads() -> Self {
        MemoryReportStore {
            fail_reads: true,
            ..Default::default()
        }
    }

    pub fn insert(&self, key: &str, content: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), content.as_bytes().to_vec());
    }

    pub fn insert_bytes(&self, key: &str, content: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), content.to_vec());
    }

    pub fn content(&self, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|bytes| String::from_utf8(bytes.clone()).unwrap())
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportStore for MemoryReportStore {
    async fn read_partition(&self, key: &str) -> Result<Option<Vec<u8>>, SinkFailureCause> {
        if self.fail_reads {
            return Err(RusotoError::<GetObjectError>::Validation("access denied".to_string()).into());
        }
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn write_partition(&self, key: &str, content: Vec<u8>) -> Result<(), SinkFailureCause> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes {
            return Err(RusotoError::<PutObjectError>::Validation("connection reset".to_string()).into());
        }
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), content);
        Ok(())
    }
}
