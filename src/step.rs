//! Step model - one declarative provisioning action
//!
//! Every action the tool performs is a Step with:
//! - A kind (package install, shell command, git clone)
//! - An idempotence check ("already satisfied?") allowing safe skip
//! - An invoke function that runs the underlying system tool

use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StepError;
use crate::runner;

/// What a step does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    /// Install a system or language package
    Package,
    /// Run an arbitrary shell command
    Command,
    /// Clone a git repository
    GitClone,
}

/// Package manager backing a `package` step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PackageManager {
    #[default]
    Apt,
    Pip,
    Npm,
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageManager::Apt => "apt",
            PackageManager::Pip => "pip",
            PackageManager::Npm => "npm",
        };
        f.write_str(name)
    }
}

/// One declarative provisioning step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Step {
    pub name: String,
    pub kind: StepKind,
    /// Package name, shell command line, or repository URL
    pub target: String,
    /// Directory the action runs in (tilde-expanded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    /// Package manager for `package` steps (defaults to apt)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<PackageManager>,
    /// Shell predicate; exit 0 means the step is already satisfied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

impl Step {
    pub fn package(name: &str, package: &str, manager: PackageManager) -> Self {
        Self {
            name: name.to_string(),
            kind: StepKind::Package,
            target: package.to_string(),
            working_directory: None,
            manager: Some(manager),
            check: None,
        }
    }

    pub fn command(name: &str, command_line: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: StepKind::Command,
            target: command_line.to_string(),
            working_directory: None,
            manager: None,
            check: None,
        }
    }

    pub fn git_clone(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: StepKind::GitClone,
            target: url.to_string(),
            working_directory: None,
            manager: None,
            check: None,
        }
    }

    pub fn in_dir(mut self, dir: &str) -> Self {
        self.working_directory = Some(dir.to_string());
        self
    }

    pub fn with_check(mut self, check: &str) -> Self {
        self.check = Some(check.to_string());
        self
    }

    /// Package manager for this step (apt unless declared otherwise)
    pub fn package_manager(&self) -> PackageManager {
        self.manager.unwrap_or_default()
    }

    /// Human-readable description
    pub fn description(&self) -> String {
        match self.kind {
            StepKind::Package => {
                format!("Install {} via {}", self.target, self.package_manager())
            }
            StepKind::Command => format!("Run `{}`", self.target),
            StepKind::GitClone => format!("Clone {}", self.target),
        }
    }

    /// Tilde-expanded working directory
    pub fn working_dir(&self) -> Option<PathBuf> {
        self.working_directory
            .as_deref()
            .map(|d| PathBuf::from(shellexpand::tilde(d).as_ref()))
    }

    /// Where a git-clone step will put its checkout
    pub fn clone_destination(&self) -> Option<PathBuf> {
        if self.kind != StepKind::GitClone {
            return None;
        }
        let repo = repo_name_from_url(&self.target)?;
        Some(match self.working_dir() {
            Some(dir) => dir.join(repo),
            None => PathBuf::from(repo),
        })
    }

    /// Whether the step's effect is already in place.
    ///
    /// An explicit `check` predicate wins; otherwise package steps query the
    /// package manager and git-clone steps look for the checkout directory.
    /// Plain commands have no built-in check and always run.
    pub fn is_satisfied(&self) -> bool {
        if let Some(check) = &self.check {
            return runner::check_shell(check, self.working_dir().as_deref());
        }

        match self.kind {
            StepKind::Package => match self.package_manager() {
                PackageManager::Apt => runner::run_quiet("dpkg", &["-s", &self.target]),
                PackageManager::Pip => {
                    runner::run_quiet("python3", &["-m", "pip", "show", &self.target])
                }
                PackageManager::Npm => runner::run_quiet("npm", &["ls", "-g", &self.target]),
            },
            StepKind::Command => false,
            StepKind::GitClone => self.clone_destination().is_some_and(|dest| dest.exists()),
        }
    }

    /// Invoke the underlying system action
    pub fn invoke(&self) -> Result<(), StepError> {
        let cwd = self.working_dir();

        match self.kind {
            StepKind::Package => {
                let manager = self.package_manager();
                let output = match manager {
                    PackageManager::Apt => runner::run_captured(
                        "apt-get",
                        &["install", "-y", &self.target],
                        cwd.as_deref(),
                    )?,
                    PackageManager::Pip => runner::run_captured(
                        "python3",
                        &["-m", "pip", "install", "--upgrade", &self.target],
                        cwd.as_deref(),
                    )?,
                    PackageManager::Npm => runner::run_captured(
                        "npm",
                        &["install", "-g", &self.target],
                        cwd.as_deref(),
                    )?,
                };

                if !output.success() {
                    return Err(StepError::PackageManager {
                        manager,
                        package: self.target.clone(),
                        exit_code: output.exit_code,
                        stderr: output.stderr_trimmed(),
                    });
                }
                Ok(())
            }
            StepKind::Command => {
                let output = runner::run_shell(&self.target, cwd.as_deref())?;
                if !output.success() {
                    return Err(StepError::CommandExecution {
                        command: self.target.clone(),
                        exit_code: output.exit_code,
                        stderr: output.stderr_trimmed(),
                    });
                }
                Ok(())
            }
            StepKind::GitClone => {
                if let Some(dir) = &cwd {
                    fs::create_dir_all(dir)?;
                }

                let output =
                    runner::run_captured("git", &["clone", &self.target], cwd.as_deref())?;
                if !output.success() {
                    return Err(StepError::Clone {
                        url: self.target.clone(),
                        exit_code: output.exit_code,
                        stderr: output.stderr_trimmed(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Extract the checkout directory name from a git URL
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let url = url.trim_end_matches('/').trim_end_matches(".git");
    url.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_name_from_common_urls() {
        assert_eq!(
            repo_name_from_url("https://github.com/opentensor/prompting.git"),
            Some("prompting".to_string())
        );
        assert_eq!(
            repo_name_from_url("https://example.com/repo/"),
            Some("repo".to_string())
        );
        assert_eq!(repo_name_from_url(""), None);
    }

    #[test]
    fn clone_destination_joins_working_dir() {
        let step = Step::git_clone("repo", "https://example.com/a/b.git").in_dir("/tmp/work");
        assert_eq!(
            step.clone_destination(),
            Some(PathBuf::from("/tmp/work/b"))
        );

        let bare = Step::git_clone("repo", "https://example.com/a/b.git");
        assert_eq!(bare.clone_destination(), Some(PathBuf::from("b")));
    }

    #[test]
    fn clone_destination_only_for_clone_steps() {
        let step = Step::command("noop", "true");
        assert_eq!(step.clone_destination(), None);
    }

    #[test]
    fn package_manager_defaults_to_apt() {
        let step = Step {
            name: "jq".to_string(),
            kind: StepKind::Package,
            target: "jq".to_string(),
            working_directory: None,
            manager: None,
            check: None,
        };
        assert_eq!(step.package_manager(), PackageManager::Apt);
    }

    #[test]
    fn kind_uses_kebab_case_names() {
        let step: Step = toml::from_str(
            r#"
            name = "clone"
            kind = "git-clone"
            target = "https://example.com/repo.git"
            "#,
        )
        .unwrap();
        assert_eq!(step.kind, StepKind::GitClone);

        let step: Step = toml::from_str(
            r#"
            name = "pm2"
            kind = "package"
            target = "pm2"
            manager = "npm"
            "#,
        )
        .unwrap();
        assert_eq!(step.package_manager(), PackageManager::Npm);
    }

    #[test]
    fn explicit_check_decides_satisfaction() {
        let satisfied = Step::command("noop", "false").with_check("true");
        assert!(satisfied.is_satisfied());

        let pending = Step::command("noop", "true").with_check("false");
        assert!(!pending.is_satisfied());
    }

    #[test]
    fn plain_commands_are_never_satisfied() {
        assert!(!Step::command("always", "true").is_satisfied());
    }

    #[test]
    fn clone_is_satisfied_when_destination_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("repo")).unwrap();

        let step = Step::git_clone("repo", "https://example.com/x/repo.git")
            .in_dir(dir.path().to_str().unwrap());
        assert!(step.is_satisfied());

        let missing = Step::git_clone("other", "https://example.com/x/other.git")
            .in_dir(dir.path().to_str().unwrap());
        assert!(!missing.is_satisfied());
    }

    #[test]
    fn failed_command_reports_exit_code_and_stderr() {
        let step = Step::command("boom", "echo oops >&2; exit 3");
        let err = step.invoke().unwrap_err();
        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(err.stderr(), "oops");
    }

    #[test]
    fn command_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let step = Step::command("touch", "touch marker").in_dir(dir.path().to_str().unwrap());
        step.invoke().unwrap();
        assert!(dir.path().join("marker").exists());
    }
}
