use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::Client as Ec2Client;
use tracing::debug;

use crate::cache::InventorySource;
use crate::instance::{running_only, Instance};
use crate::username::ImageMetadataSource;
use crate::{AsshError, Result};

/// AWS client wrapper; the one place the SDK is touched.
#[derive(Clone)]
pub struct AwsClients {
    pub ec2: Ec2Client,
    pub region: String,
}

impl AwsClients {
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_default();
        debug!(%region, "loaded AWS configuration");

        Self {
            ec2: Ec2Client::new(&config),
            region,
        }
    }
}

#[async_trait]
impl InventorySource for AwsClients {
    async fn fetch_running(&self) -> Result<Vec<Instance>> {
        let output = self
            .ec2
            .describe_instances()
            .send()
            .await
            .map_err(AsshError::fetch)?;

        let mut instances = Vec::new();
        for reservation in output.reservations() {
            for raw in reservation.instances() {
                if let Some(instance) = convert(raw) {
                    instances.push(instance);
                }
            }
        }

        Ok(running_only(instances))
    }
}

#[async_trait]
impl ImageMetadataSource for AwsClients {
    async fn image_description(&self, image_id: &str) -> Result<Option<String>> {
        let output = self
            .ec2
            .describe_images()
            .image_ids(image_id)
            .send()
            .await
            .map_err(|e| AsshError::username(image_id, e))?;

        Ok(output
            .images()
            .first()
            .and_then(|image| image.description())
            .map(str::to_string))
    }
}

/// Map an SDK instance record onto the local model. Records missing an id or
/// a private address are unusable and skipped.
fn convert(raw: &aws_sdk_ec2::types::Instance) -> Option<Instance> {
    Some(Instance {
        id: raw.instance_id()?.to_string(),
        state: raw
            .state()
            .and_then(|s| s.name())
            .map(|name| name.as_str().to_string())
            .unwrap_or_default(),
        instance_type: raw
            .instance_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        image: raw.image_id().unwrap_or_default().to_string(),
        keyname: raw.key_name().map(str::to_string),
        private_ip: raw.private_ip_address()?.to_string(),
        public_ip: raw.public_ip_address().map(str::to_string),
        tags: raw
            .tags()
            .iter()
            .filter_map(|tag| Some((tag.key()?.to_string(), tag.value()?.to_string())))
            .collect(),
    })
}
