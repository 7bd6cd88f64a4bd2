//! System prerequisites: the external commands git-onboard shells out to, and
//! the package managers that can install them.

use anyhow::{Context, Result, bail};
use std::fmt;
use std::process::{Command, Stdio};
use std::str::FromStr;
use tracing::{info, warn};

use crate::console::{Console, Tone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Brew,
}

impl PackageManager {
    /// Detection order.
    pub const ALL: [PackageManager; 4] = [
        PackageManager::Apt,
        PackageManager::Dnf,
        PackageManager::Yum,
        PackageManager::Brew,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Brew => "brew",
        }
    }

    /// Executable whose presence signals this manager.
    pub fn binary(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get",
            other => other.name(),
        }
    }

    /// Command lines that install `package`, run in order.
    pub fn install_commands(self, package: &str) -> Vec<Vec<String>> {
        let argv = |parts: &[&str]| parts.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        match self {
            PackageManager::Apt => vec![
                argv(&["sudo", "apt-get", "update"]),
                argv(&["sudo", "apt-get", "install", "-y", package]),
            ],
            PackageManager::Dnf | PackageManager::Yum => {
                vec![argv(&["sudo", self.name(), "install", "-y", package])]
            }
            PackageManager::Brew => vec![argv(&["brew", "install", package])],
        }
    }

    /// Package that provides `command` under this manager.
    pub fn package_for(self, command: &str) -> &str {
        match (command, self) {
            ("ssh-keygen", PackageManager::Apt) => "openssh-client",
            ("ssh-keygen", _) => "openssh",
            (other, _) => other,
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PackageManager {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        PackageManager::ALL
            .into_iter()
            .find(|pm| pm.name() == s || pm.binary() == s)
            .with_context(|| format!("unsupported package manager: {}", s))
    }
}

/// Commands that must be on `PATH` before onboarding can run.
pub const REQUIRED_COMMANDS: [&str; 2] = ["git", "ssh-keygen"];

/// Host queries and package installation, kept behind a trait so the
/// prerequisite check can be driven without touching the machine.
pub trait Host {
    fn has_command(&self, command: &str) -> bool;
    fn install(&self, pm: PackageManager, package: &str) -> Result<()>;
}

/// The real machine.
#[derive(Debug, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn has_command(&self, command: &str) -> bool {
        which::which(command).is_ok()
    }

    fn install(&self, pm: PackageManager, package: &str) -> Result<()> {
        for argv in pm.install_commands(package) {
            let line = argv.join(" ");
            info!(cmd = %line, "installing package");
            let status = Command::new(&argv[0])
                .args(&argv[1..])
                .stdin(Stdio::inherit())
                .status()
                .with_context(|| format!("failed to run `{}`", line))?;
            if !status.success() {
                bail!("`{}` exited with {}", line, status);
            }
        }
        Ok(())
    }
}

/// First package manager found on `PATH`, or apt when none is.
pub fn detect() -> PackageManager {
    detect_with(&SystemHost)
}

fn detect_with<H: Host + ?Sized>(host: &H) -> PackageManager {
    PackageManager::ALL
        .into_iter()
        .find(|pm| host.has_command(pm.binary()))
        .unwrap_or(PackageManager::Apt)
}

/// Make sure every required command is available, offering to install the
/// missing ones.
///
/// # Errors
/// - The user declines an installation.
/// - The installation fails, or the command is still missing afterwards.
pub fn ensure_prerequisites<H, C>(pm: PackageManager, host: &H, console: &C) -> Result<()>
where
    H: Host + ?Sized,
    C: Console + ?Sized,
{
    for cmd in REQUIRED_COMMANDS {
        if host.has_command(cmd) {
            continue;
        }
        let package = pm.package_for(cmd);
        warn!(command = cmd, package, manager = %pm, "required command missing");
        console.say(Tone::Warn, &format!("Required command '{}' was not found.", cmd));
        if !console.confirm(
            &format!("Install '{}' using {}?", package, pm),
            true,
        ) {
            bail!("'{}' is required to continue", cmd);
        }

        host.install(pm, package)
            .with_context(|| format!("failed to install {} with {}", package, pm))?;
        if !host.has_command(cmd) {
            bail!("'{}' is still unavailable after installing {}", cmd, package);
        }
        console.say(Tone::Success, &format!("Installed {}.", package));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedConsole;
    use std::cell::RefCell;
    use std::collections::BTreeSet;

    #[derive(Default)]
    struct FakeHost {
        present: RefCell<BTreeSet<String>>,
        installs: RefCell<Vec<(PackageManager, String)>>,
        install_provides: Option<&'static str>,
    }

    impl FakeHost {
        fn with(cmds: &[&str]) -> Self {
            let h = Self::default();
            h.present
                .borrow_mut()
                .extend(cmds.iter().map(|s| s.to_string()));
            h
        }
    }

    impl Host for FakeHost {
        fn has_command(&self, command: &str) -> bool {
            self.present.borrow().contains(command)
        }

        fn install(&self, pm: PackageManager, package: &str) -> Result<()> {
            self.installs.borrow_mut().push((pm, package.to_string()));
            if let Some(cmd) = self.install_provides {
                self.present.borrow_mut().insert(cmd.to_string());
            }
            Ok(())
        }
    }

    #[test]
    fn parses_names_and_binaries() {
        assert_eq!("apt".parse::<PackageManager>().unwrap(), PackageManager::Apt);
        assert_eq!("apt-get".parse::<PackageManager>().unwrap(), PackageManager::Apt);
        assert_eq!(" Brew ".parse::<PackageManager>().unwrap(), PackageManager::Brew);
        let err = "pacman".parse::<PackageManager>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported package manager: pacman");
    }

    #[test]
    fn install_commands_per_manager() {
        assert_eq!(
            PackageManager::Apt.install_commands("git"),
            vec![
                vec!["sudo", "apt-get", "update"],
                vec!["sudo", "apt-get", "install", "-y", "git"],
            ]
        );
        assert_eq!(
            PackageManager::Yum.install_commands("git"),
            vec![vec!["sudo", "yum", "install", "-y", "git"]]
        );
        assert_eq!(
            PackageManager::Brew.install_commands("openssh"),
            vec![vec!["brew", "install", "openssh"]]
        );
    }

    #[test]
    fn ssh_keygen_package_differs_on_apt() {
        assert_eq!(PackageManager::Apt.package_for("ssh-keygen"), "openssh-client");
        assert_eq!(PackageManager::Dnf.package_for("ssh-keygen"), "openssh");
        assert_eq!(PackageManager::Brew.package_for("git"), "git");
    }

    #[test]
    fn detection_follows_order_and_defaults_to_apt() {
        assert_eq!(detect_with(&FakeHost::with(&["yum", "brew"])), PackageManager::Yum);
        assert_eq!(detect_with(&FakeHost::with(&["brew"])), PackageManager::Brew);
        assert_eq!(detect_with(&FakeHost::with(&[])), PackageManager::Apt);
    }

    #[test]
    fn nothing_happens_when_everything_is_present() {
        let host = FakeHost::with(&["git", "ssh-keygen"]);
        let console = ScriptedConsole::new(&[]);
        ensure_prerequisites(PackageManager::Apt, &host, &console).unwrap();
        assert!(host.installs.borrow().is_empty());
        assert!(console.prompts().is_empty());
    }

    #[test]
    fn missing_command_is_installed_after_confirmation() {
        let host = FakeHost {
            install_provides: Some("ssh-keygen"),
            ..FakeHost::with(&["git"])
        };
        let console = ScriptedConsole::new(&[]);
        ensure_prerequisites(PackageManager::Apt, &host, &console).unwrap();
        assert_eq!(
            *host.installs.borrow(),
            vec![(PackageManager::Apt, "openssh-client".to_string())]
        );
    }

    #[test]
    fn declined_install_is_an_error() {
        let host = FakeHost::with(&["ssh-keygen"]);
        let console = ScriptedConsole::new(&["n"]);
        let err = ensure_prerequisites(PackageManager::Dnf, &host, &console).unwrap_err();
        assert!(err.to_string().contains("'git' is required"));
        assert!(host.installs.borrow().is_empty());
    }

    #[test]
    fn install_that_does_not_provide_the_command_is_an_error() {
        let host = FakeHost::with(&["ssh-keygen"]);
        let console = ScriptedConsole::new(&["y"]);
        let err = ensure_prerequisites(PackageManager::Brew, &host, &console).unwrap_err();
        assert!(err.to_string().contains("still unavailable"));
    }
}
