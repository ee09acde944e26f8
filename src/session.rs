use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::ssh_config::SshConfig;
use crate::{AsshError, Result};

/// Write the configuration to a uniquely named transient file and hand off to
/// the external `ssh` binary. The file is removed on every exit path: the
/// `NamedTempFile` guard lives for the duration of the child process and its
/// drop runs whether the child succeeds, fails, or the wait errors.
pub async fn start_ssh(config: &SshConfig) -> Result<i32> {
    let file = tempfile::Builder::new()
        .prefix(".sshconf-")
        .tempfile()
        .map_err(|e| AsshError::session("ssh", e))?;
    std::fs::write(file.path(), config.render())?;
    debug!(path = %file.path().display(), "wrote transient ssh configuration");

    let path = file.path().to_string_lossy().into_owned();
    run("ssh", &["-F", &path, "destination"]).await
}

/// Plain SSM session against the instance id; no SSH configuration involved.
pub async fn start_ssm(instance_id: &str) -> Result<i32> {
    run("aws", &["ssm", "start-session", "--target", instance_id]).await
}

/// Run the external session binary with inherited stdio and return its exit
/// code. Ctrl-C is swallowed in the parent while the child runs so the child
/// owns the terminal and cleanup still happens after an interrupted session.
async fn run(program: &str, args: &[&str]) -> Result<i32> {
    info!("connecting using command '{} {}'", program, args.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| AsshError::session(program, e))?;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status.map_err(|e| AsshError::session(program, e))?,
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupt forwarded to session process");
            }
        }
    };

    // Sessions killed by a signal have no code; report failure.
    Ok(status.code().unwrap_or(1))
}
