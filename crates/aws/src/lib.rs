//! AWS backends: SSM Parameter Store for the brain and SQS for the work queue.

use aws_config::{BehaviorVersion, Region, SdkConfig};

pub mod sqs;
pub mod ssm;

pub use sqs::SqsMessageQueue;
pub use ssm::SsmParameterStore;

/// Shared SDK configuration from the standard credential and region chain.
/// An explicit `region` wins over the environment.
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_owned()));
    }
    loader.load().await
}
