use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One EC2 instance as seen by the rest of the tool. Immutable after
/// construction; the serde shape doubles as the cache snapshot record.
///
/// `keyname` is optional to support SSM-only access where instances may not
/// have an attached keypair. `public_ip` is absent for instances without
/// public network exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub state: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub image: String,
    pub keyname: Option<String>,
    pub private_ip: String,
    pub public_ip: Option<String>,
    pub tags: HashMap<String, String>,
}

impl Instance {
    /// The `Name` tag, or the empty string when untagged.
    pub fn name(&self) -> &str {
        self.tags.get("Name").map(String::as_str).unwrap_or("")
    }

    /// Query predicate: a case-sensitive substring of the instance id, or a
    /// case-insensitive substring of the Name tag.
    pub fn matches(&self, query: &str) -> bool {
        self.id.contains(query) || self.name().to_lowercase().contains(&query.to_lowercase())
    }
}

/// Keep only instances in the `running` state. Filtering happens here rather
/// than in the API call so terminated records never reach the cache.
pub fn running_only(instances: Vec<Instance>) -> Vec<Instance> {
    instances
        .into_iter()
        .filter(|i| i.state == "running")
        .collect()
}

/// Shared test fixture mirroring a typical public instance.
#[cfg(test)]
pub(crate) fn sample_instance() -> Instance {
    Instance {
        id: "i-0123456789abcdef0".to_string(),
        state: "running".to_string(),
        instance_type: "t3.micro".to_string(),
        image: "ami-assh-test-1".to_string(),
        keyname: Some("testkey".to_string()),
        private_ip: "10.0.0.5".to_string(),
        public_ip: Some("1.2.3.4".to_string()),
        tags: HashMap::from([("Name".to_string(), "Public Instance".to_string())]),
    }
}
