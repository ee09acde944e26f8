use clap::ValueEnum;

use crate::instance::Instance;
use crate::ssh_config::{HostBlock, SshConfig};
use crate::{AsshError, Result};

/// Tunnels the SSH connection through an SSM session; `%h`/`%p` are bound by
/// ssh to the placeholder host token (the instance id) and port.
pub const SSM_PROXY_COMMAND: &str = "sh -c \"aws ssm start-session --target %h \
     --document-name AWS-StartSSHSession --parameters 'portNumber=%p'\"";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConnectMode {
    /// Plain SSH to the instance's public address
    Ssh,
    /// SSM session only, no SSH configuration
    Ssm,
    /// SSH tunneled over an SSM session channel
    SsmSsh,
}

/// A resolved jump instance plus its login name. The identity file is shared
/// with the destination; per-hop credentials are not supported.
pub struct JumpHost<'a> {
    pub instance: &'a Instance,
    pub username: String,
}

/// Build the layered connection configuration for a resolved instance.
///
/// Pure function of its inputs. `ConnectMode::Ssm` never reaches synthesis —
/// the caller short-circuits to the session channel before any SSH
/// configuration exists.
pub fn synthesize(
    target: &Instance,
    mode: ConnectMode,
    username: &str,
    identity_file: Option<&str>,
    jump: Option<&JumpHost<'_>>,
) -> Result<SshConfig> {
    debug_assert!(mode != ConnectMode::Ssm, "ssm mode short-circuits before synthesis");

    let hostname = match (mode, jump) {
        // The instance id is a placeholder token resolved by the
        // ProxyCommand, not by DNS.
        (ConnectMode::SsmSsh, _) => target.id.clone(),
        // The jump host is assumed to have a network path to the private
        // side.
        (_, Some(_)) => target.private_ip.clone(),
        (_, None) => target
            .public_ip
            .clone()
            .ok_or_else(|| AsshError::NoPublicAddress(target.id.clone()))?,
    };

    let mut destination = HostBlock::new("destination");
    destination.set("HostName", hostname);
    destination.set("User", username);
    if let Some(key) = identity_file {
        destination.set("IdentityFile", key);
    }

    let mut config = SshConfig::new();

    if let Some(jump) = jump {
        let jump_address = jump
            .instance
            .public_ip
            .clone()
            .ok_or_else(|| AsshError::NoPublicAddress(jump.instance.id.clone()))?;

        let mut block = HostBlock::new("jump");
        block.set("HostName", jump_address);
        block.set("User", jump.username.as_str());
        if let Some(key) = identity_file {
            block.set("IdentityFile", key);
        }
        config.add_host(block);

        destination.set("ProxyJump", "jump");
    }

    if mode == ConnectMode::SsmSsh {
        destination.set("ProxyCommand", SSM_PROXY_COMMAND);
    }

    config.add_host(destination);
    Ok(config)
}
