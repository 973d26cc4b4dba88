use std::string::FromUtf8Error;

use rusoto_core::RusotoError;
use rusoto_ec2::DescribeInstancesError;
use rusoto_s3::{GetObjectError, PutObjectError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Failed to describe instances: {0}")]
    LookupFailure(#[from] RusotoError<DescribeInstancesError>),

    #[error("Failed to append report, {unconfirmed} record(s) not confirmed written: {cause}")]
    SinkWriteFailure {
        unconfirmed: usize,
        #[source]
        cause: SinkFailureCause,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}

/// What went wrong while moving a partition in or out of the report store.
#[derive(Debug, Error)]
pub enum SinkFailureCause {
    #[error("read failed: {0}")]
    Read(#[from] RusotoError<GetObjectError>),

    #[error("write failed: {0}")]
    Write(#[from] RusotoError<PutObjectError>),

    #[error("body could not be read: {0}")]
    Body(#[from] std::io::Error),

    #[error("existing partition is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}

impl MonitorError {
    pub fn sink(unconfirmed: usize, cause: impl Into<SinkFailureCause>) -> Self {
        MonitorError::SinkWriteFailure {
            unconfirmed,
            cause: cause.into(),
        }
    }

    /// Number of records that may be missing from the report because of this error.
    pub fn records_at_risk(&self) -> Option<usize> {
        match *self {
            MonitorError::SinkWriteFailure { unconfirmed, .. } => Some(unconfirmed),
            _ => None,
        }
    }
}
