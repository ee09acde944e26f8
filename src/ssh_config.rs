/// One `Host` block: an alias plus its settings in insertion order. `set`
/// replaces in place so serialization order stays deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct HostBlock {
    alias: String,
    settings: Vec<(String, String)>,
}

impl HostBlock {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            settings: Vec::new(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.settings.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.settings.push((key.to_string(), value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// An ordered set of host blocks, rendered in the format the external `ssh`
/// binary consumes via `-F`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SshConfig {
    hosts: Vec<HostBlock>,
}

impl SshConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_host(&mut self, host: HostBlock) -> &mut Self {
        self.hosts.push(host);
        self
    }

    pub fn host(&self, alias: &str) -> Option<&HostBlock> {
        self.hosts.iter().find(|h| h.alias == alias)
    }

    /// Wire format: a `Host <alias>` header per block followed by
    /// tab-indented `<Key> <value>` lines, blocks in insertion order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for host in &self.hosts {
            out.push_str(&format!("Host {}\n", host.alias));
            for (key, value) in &host.settings {
                out.push_str(&format!("\t{key} {value}\n"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_line() {
        let mut conf = SshConfig::new();
        conf.add_host(HostBlock::new("destination"));

        assert!(conf.render().contains("Host destination"));
    }

    #[test]
    fn test_kv_pairs_are_tab_indented() {
        let mut host = HostBlock::new("destination");
        host.set("Key1", "test").set("Key2", "test-again");
        let mut conf = SshConfig::new();
        conf.add_host(host);

        let content = conf.render();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines.contains(&"\tKey1 test"));
        assert!(lines.contains(&"\tKey2 test-again"));
    }

    #[test]
    fn test_multiple_hosts_render_in_order() {
        let mut host_a = HostBlock::new("host-a");
        host_a.set("HostAUnique", "test");
        let mut host_b = HostBlock::new("host-b");
        host_b.set("HostBUnique", "foobar");

        let mut conf = SshConfig::new();
        conf.add_host(host_a).add_host(host_b);

        let expected = "Host host-a\n\tHostAUnique test\nHost host-b\n\tHostBUnique foobar\n";
        assert_eq!(conf.render(), expected);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut host = HostBlock::new("destination");
        host.set("HostName", "1.2.3.4")
            .set("User", "ec2-user")
            .set("HostName", "10.0.0.5");

        assert_eq!(host.get("HostName"), Some("10.0.0.5"));
        // The replaced key keeps its original position.
        assert_eq!(
            host.settings.first().map(|(k, _)| k.as_str()),
            Some("HostName")
        );
    }
}
