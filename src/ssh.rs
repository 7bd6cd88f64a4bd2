use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{error, info};

use crate::console::{Console, Tone};

const PRIVATE_KEY: &str = "id_rsa";
const PUBLIC_KEY: &str = "id_rsa.pub";
const KEYS_URL: &str = "https://github.com/settings/keys";

/// Generates a key pair at a given private key path.
pub trait Keygen {
    fn generate(&self, private_key: &Path, comment: &str) -> Result<()>;
}

/// `ssh-keygen`, non-interactive, no passphrase.
#[derive(Debug, Default)]
pub struct SshKeygen;

impl Keygen for SshKeygen {
    fn generate(&self, private_key: &Path, comment: &str) -> Result<()> {
        let status = Command::new("ssh-keygen")
            .args(["-t", "rsa", "-b", "4096", "-f"])
            .arg(private_key)
            .args(["-N", "", "-C", comment])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("failed to run ssh-keygen")?;
        if !status.success() {
            bail!("ssh-keygen exited with {}", status);
        }
        Ok(())
    }
}

/// Whether `url` is an SSH remote (`git@host:path` or `ssh://...`).
pub fn is_ssh_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("ssh://")
        || (!url.contains("://")
            && url
                .split_once(':')
                .is_some_and(|(host, _)| host.contains('@') && !host.contains('/')))
}

fn key_comment() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "user".to_string());
    let host = fs::read_to_string("/etc/hostname")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string());
    format!("{}@{}", user, host)
}

#[cfg(unix)]
fn restrict_permissions(ssh_dir: &Path, keys: &[&Path]) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(ssh_dir, fs::Permissions::from_mode(0o700))
        .with_context(|| format!("failed to chmod {}", ssh_dir.display()))?;
    for key in keys {
        fs::set_permissions(key, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("failed to chmod {}", key.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_ssh_dir: &Path, _keys: &[&Path]) -> Result<()> {
    Ok(())
}

/// Make sure `ssh_dir` holds an RSA key pair and return the public key path.
///
/// An existing pair only has its permissions tightened. Otherwise the user
/// is asked before a new pair is generated; the public key is then shown
/// with upload instructions and the call waits for acknowledgement.
///
/// # Errors
/// - The user declines generation.
/// - Key generation or permission changes fail.
pub fn ensure_ssh_key<K, C>(ssh_dir: &Path, keygen: &K, console: &C) -> Result<PathBuf>
where
    K: Keygen + ?Sized,
    C: Console + ?Sized,
{
    fs::create_dir_all(ssh_dir)
        .with_context(|| format!("failed to create {}", ssh_dir.display()))?;
    let private_key = ssh_dir.join(PRIVATE_KEY);
    let public_key = ssh_dir.join(PUBLIC_KEY);

    if private_key.exists() && public_key.exists() {
        restrict_permissions(ssh_dir, &[&private_key, &public_key])?;
        info!(key = %public_key.display(), "using existing ssh key");
        return Ok(public_key);
    }

    console.say(
        Tone::Warn,
        &format!("SSH key not found at {}.", public_key.display()),
    );
    if !console.confirm("Generate new SSH key?", false) {
        bail!("SSH key is required to continue");
    }

    console.print("Generating a new SSH key...");
    keygen
        .generate(&private_key, &key_comment())
        .inspect_err(|e| error!(error = %format!("{:#}", e), "ssh key generation failed"))
        .context("SSH key generation failed")?;
    restrict_permissions(ssh_dir, &[&private_key, &public_key])?;

    let key = fs::read_to_string(&public_key)
        .with_context(|| format!("failed to read {}", public_key.display()))?;
    console.print("");
    console.print("Your new SSH public key:");
    console.say(Tone::Success, key.trim());
    console.print(&format!(
        "Please add this public key to your git host ({}).",
        KEYS_URL
    ));
    console.ask("Press Enter once you have added the key", "Done");

    info!(key = %public_key.display(), "generated ssh key");
    Ok(public_key)
}
