use async_trait::async_trait;
use rusoto_core::{Region, RusotoError};
use rusoto_s3::{GetObjectError, GetObjectRequest, PutObjectRequest, S3Client, S3};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::SinkFailureCause;

const CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Blob storage holding one report object per partition.
#[async_trait]
pub trait ReportStore {
    /// Returns `None` when the partition has not been written yet.
    async fn read_partition(&self, key: &str) -> Result<Option<Vec<u8>>, SinkFailureCause>;

    /// Replaces the partition with `content`.
    async fn write_partition(&self, key: &str, content: Vec<u8>) -> Result<(), SinkFailureCause>;
}

pub struct S3ReportClient {
    client: S3Client,
    bucket: String,
}

#[async_trait]
impl ReportStore for S3ReportClient {
    async fn read_partition(&self, key: &str) -> Result<Option<Vec<u8>>, SinkFailureCause> {
        let request = GetObjectRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            ..GetObjectRequest::default()
        };

        let output = match self.client.get_object(request).await {
            Ok(output) => output,
            Err(RusotoError::Service(GetObjectError::NoSuchKey(_))) => {
                debug!(bucket = %self.bucket, key, "partition does not exist yet");
                return Ok(None);
            }
            Err(RusotoError::Unknown(ref response)) if response.status.as_u16() == 404 => {
                debug!(bucket = %self.bucket, key, "partition does not exist yet");
                return Ok(None);
            }
            Err(error) => return Err(error.into()),
        };

        let mut content = Vec::new();
        if let Some(body) = output.body {
            let reader = body.into_async_read();
            tokio::pin!(reader);
            reader.read_to_end(&mut content).await?;
        }
        Ok(Some(content))
    }

    async fn write_partition(&self, key: &str, content: Vec<u8>) -> Result<(), SinkFailureCause> {
        let size = content.len();
        let request = PutObjectRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            content_type: Some(CONTENT_TYPE.to_string()),
            body: Some(content.into()),
            ..PutObjectRequest::default()
        };

        self.client.put_object(request).await?;
        debug!(bucket = %self.bucket, key, size, "wrote partition");
        Ok(())
    }
}

impl S3ReportClient {
    pub fn new(region: Region, bucket: impl Into<String>) -> Self {
        Self::new_with_client(S3Client::new(region), bucket)
    }

    pub fn new_with_client(client: S3Client, bucket: impl Into<String>) -> Self {
        S3ReportClient {
            client,
            bucket: bucket.into(),
        }
    }
}
