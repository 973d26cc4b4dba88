use rusoto_ec2::Instance;
use serde::Serialize;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Running => "running",
            LifecycleState::ShuttingDown => "shutting-down",
            LifecycleState::Terminated => "terminated",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleState {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "pending" => Ok(LifecycleState::Pending),
            "running" => Ok(LifecycleState::Running),
            "shutting-down" => Ok(LifecycleState::ShuttingDown),
            "terminated" => Ok(LifecycleState::Terminated),
            "stopping" => Ok(LifecycleState::Stopping),
            "stopped" => Ok(LifecycleState::Stopped),
            _ => Err(()),
        }
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum RecordError {
    #[error("Instance description has no instance id")]
    MissingIdentifier,
    #[error("Instance id {0:?} is not shaped like an instance id")]
    InvalidIdentifier(String),
    #[error("Instance {0} has no lifecycle state")]
    MissingState(String),
    #[error("Instance {instance_id} has unknown lifecycle state {state:?}")]
    UnknownState { instance_id: String, state: String },
}

/// `i-` followed by lowercase alphanumerics, e.g. `i-1234567890abcdef0`.
pub fn is_instance_id(candidate: &str) -> bool {
    match candidate.strip_prefix("i-") {
        Some(rest) => {
            !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        }
        None => false,
    }
}

/// One row of the daily report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceRecord {
    pub identifier: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub state: LifecycleState,
    pub launch_time: String,
    pub zone: String,
    pub network_id: String,
    pub subnet_id: String,
    pub private_address: String,
    pub public_address: Option<String>,
    pub security_groups: Vec<String>,
    pub key_label: Option<String>,
    #[serde(rename = "full_tags")]
    pub tags: BTreeMap<String, String>,
}

impl TryFrom<&Instance> for InstanceRecord {
    type Error = RecordError;

    fn try_from(instance: &Instance) -> Result<Self, Self::Error> {
        let identifier = instance
            .instance_id
            .clone()
            .ok_or(RecordError::MissingIdentifier)?;
        if !is_instance_id(&identifier) {
            return Err(RecordError::InvalidIdentifier(identifier));
        }

        let state_name = instance
            .state
            .as_ref()
            .and_then(|state| state.name.as_deref())
            .ok_or_else(|| RecordError::MissingState(identifier.clone()))?;
        let state = state_name
            .parse::<LifecycleState>()
            .map_err(|_| RecordError::UnknownState {
                instance_id: identifier.clone(),
                state: state_name.to_string(),
            })?;

        let security_groups = instance
            .security_groups
            .iter()
            .flatten()
            .filter_map(|group| group.group_name.clone().or_else(|| group.group_id.clone()))
            .collect();

        let tags = instance
            .tags
            .iter()
            .flatten()
            .filter_map(|tag| {
                tag.key
                    .clone()
                    .map(|key| (key, tag.value.clone().unwrap_or_default()))
            })
            .collect();

        Ok(InstanceRecord {
            identifier,
            instance_type: instance.instance_type.clone().unwrap_or_default(),
            state,
            launch_time: instance.launch_time.clone().unwrap_or_default(),
            zone: instance
                .placement
                .as_ref()
                .and_then(|placement| placement.availability_zone.clone())
                .unwrap_or_default(),
            network_id: instance.vpc_id.clone().unwrap_or_default(),
            subnet_id: instance.subnet_id.clone().unwrap_or_default(),
            private_address: instance.private_ip_address.clone().unwrap_or_default(),
            public_address: instance.public_ip_address.clone(),
            security_groups,
            key_label: instance.key_name.clone(),
            tags,
        })
    }
}
