use async_trait::async_trait;
use tracing::debug;

use crate::instance::Instance;
use crate::Result;

/// The image-metadata collaborator: given an image id, an optional
/// human-readable description.
#[async_trait]
pub trait ImageMetadataSource: Send + Sync {
    async fn image_description(&self, image_id: &str) -> Result<Option<String>>;
}

/// Priority-ordered OS-family rules: first description substring to match
/// wins. Precedence is an explicit contract, not incidental map order.
const USERNAME_RULES: &[(&str, &str)] = &[("ubuntu", "ubuntu"), ("centos", "centos")];

/// Covers Amazon Linux, RHEL, and any image without a description.
const FALLBACK_USERNAME: &str = "ec2-user";

/// Best-effort default login name inferred from the instance's image
/// description. A failed metadata lookup propagates so the caller can fall
/// back to an explicit `--login_name` override.
pub async fn default_username(
    source: &dyn ImageMetadataSource,
    instance: &Instance,
) -> Result<String> {
    let description = source
        .image_description(&instance.image)
        .await?
        .unwrap_or_default()
        .to_lowercase();

    debug!(image = %instance.image, %description, "inferring username from image");

    for (needle, username) in USERNAME_RULES {
        if description.contains(needle) {
            return Ok((*username).to_string());
        }
    }

    Ok(FALLBACK_USERNAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::sample_instance;
    use crate::AsshError;

    struct FixedDescription(Option<String>);

    #[async_trait]
    impl ImageMetadataSource for FixedDescription {
        async fn image_description(&self, _image_id: &str) -> Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingMetadata;

    #[async_trait]
    impl ImageMetadataSource for FailingMetadata {
        async fn image_description(&self, image_id: &str) -> Result<Option<String>> {
            Err(AsshError::username(image_id, "describe-images denied"))
        }
    }

    async fn username_for(description: Option<&str>) -> String {
        let source = FixedDescription(description.map(str::to_string));
        default_username(&source, &sample_instance()).await.unwrap()
    }

    #[tokio::test]
    async fn test_amazon_linux_username() {
        assert_eq!(username_for(Some("Mock Amazon Linux Image")).await, "ec2-user");
    }

    #[tokio::test]
    async fn test_ubuntu_username() {
        assert_eq!(username_for(Some("Mock Ubuntu Linux Image")).await, "ubuntu");
    }

    #[tokio::test]
    async fn test_centos_username() {
        assert_eq!(username_for(Some("Mock CentOS Linux Image")).await, "centos");
    }

    #[tokio::test]
    async fn test_missing_description_falls_back() {
        assert_eq!(username_for(None).await, "ec2-user");
    }

    #[tokio::test]
    async fn test_metadata_failure_propagates() {
        let err = default_username(&FailingMetadata, &sample_instance())
            .await
            .unwrap_err();
        assert!(matches!(err, AsshError::UsernameResolution { .. }));
    }
}
