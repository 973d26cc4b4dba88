mod collector;
mod config;
mod ec2_instance_client;
mod error;
mod event;
mod monitor;
mod partition;
mod record;
mod report;
mod report_sink;
mod s3_report_client;
mod tag_filter;
#[cfg(test)]
mod test_support;

use lambda_runtime::{handler_fn, Context, Error};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::MonitorConfig;
use crate::ec2_instance_client::Ec2InstanceClient;
use crate::event::ResponseEnvelope;
use crate::monitor::Monitor;
use crate::s3_report_client::S3ReportClient;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = MonitorConfig::from_env()?;
    init_tracing(&config.log_level);

    let region = config.region()?;
    info!(
        region = region.name(),
        bucket = %config.report_bucket,
        tag_key = %config.tag_key,
        tag_value = %config.tag_value,
        "starting instance compliance monitor"
    );

    let monitor = Arc::new(Monitor::new(
        Ec2InstanceClient::new(region.clone()),
        S3ReportClient::new(region, config.report_bucket.clone()),
        config,
    ));

    lambda_runtime::run(handler_fn(move |event: Value, _: Context| {
        let monitor = Arc::clone(&monitor);
        async move { Ok::<ResponseEnvelope, Error>(monitor.handle(event).await) }
    }))
    .await?;
    Ok(())
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        // CloudWatch adds the ingestion time
        .without_time()
        .with_target(false)
        .init();
}
