//! Plan loading, validation, and the built-in default plan

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::step::{PackageManager, Step, StepKind};

/// An ordered list of provisioning steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<Step>,
}

impl Plan {
    /// Load a plan from a TOML or JSON file, chosen by extension
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let plan: Plan = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => return Err(PlanError::UnsupportedFormat(path.to_path_buf())),
        };

        plan.validate()?;
        Ok(plan)
    }

    /// Resolve the plan to run: explicit path, then the user plan file,
    /// then the built-in default
    pub fn resolve(path: Option<&Path>) -> Result<Self, PlanError> {
        if let Some(path) = path {
            return Self::load(path);
        }

        if let Some(user_plan) = default_plan_path()
            && user_plan.exists()
        {
            return Self::load(&user_plan);
        }

        Ok(Self::builtin())
    }

    /// Reject empty plans, empty targets, and duplicate step names
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.steps.is_empty() {
            return Err(PlanError::Empty);
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.target.trim().is_empty() {
                return Err(PlanError::EmptyTarget(step.name.clone()));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(PlanError::DuplicateName(step.name.clone()));
            }
        }

        Ok(())
    }

    /// Names of `command` steps that run inside a directory created by an
    /// earlier `git-clone` step. Those execute unreviewed remote code and
    /// are called out before the run starts.
    pub fn remote_script_steps(&self) -> Vec<String> {
        let mut clone_dests: Vec<PathBuf> = Vec::new();
        let mut flagged = Vec::new();

        for step in &self.steps {
            match step.kind {
                StepKind::GitClone => {
                    if let Some(dest) = step.clone_destination() {
                        clone_dests.push(dest);
                    }
                }
                StepKind::Command => {
                    if let Some(dir) = step.working_dir()
                        && clone_dests.iter().any(|dest| dir.starts_with(dest))
                    {
                        flagged.push(step.name.clone());
                    }
                }
                StepKind::Package => {}
            }
        }

        flagged
    }

    /// The actions of the original bootstrap script, as declarative steps
    pub fn builtin() -> Self {
        Self {
            steps: vec![
                Step::command("apt-update", "apt-get update"),
                Step::package("sudo", "sudo", PackageManager::Apt),
                Step::package("python3-pip", "python3-pip", PackageManager::Apt),
                Step::package("jq", "jq", PackageManager::Apt),
                Step::package("npm", "npm", PackageManager::Apt),
                Step::package("bittensor", "bittensor", PackageManager::Pip),
                Step::package("pm2", "pm2", PackageManager::Npm),
                Step::git_clone("prompting", "https://github.com/opentensor/prompting.git")
                    .in_dir("~"),
                Step::command("prompting-install", "./install.sh").in_dir("~/prompting"),
            ],
        }
    }
}

/// Default user plan location (~/.config/provis/plan.toml)
pub fn default_plan_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("provis").join("plan.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_plan(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_toml_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plan(
            dir.path(),
            "plan.toml",
            r#"
            [[steps]]
            name = "jq"
            kind = "package"
            target = "jq"

            [[steps]]
            name = "pm2"
            kind = "command"
            target = "npm install -g pm2"
            check = "command -v pm2"
            "#,
        );

        let plan = Plan::load(&path).unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[0].name, "jq");
        assert_eq!(plan.steps[1].check.as_deref(), Some("command -v pm2"));
    }

    #[test]
    fn loads_json_plan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plan(
            dir.path(),
            "plan.json",
            r#"{
                "steps": [
                    {
                        "name": "clone",
                        "kind": "git-clone",
                        "target": "https://example.com/repo.git",
                        "working-directory": "/tmp/work"
                    }
                ]
            }"#,
        );

        let plan = Plan::load(&path).unwrap();
        assert_eq!(plan.steps[0].kind, StepKind::GitClone);
        assert_eq!(
            plan.steps[0].working_directory.as_deref(),
            Some("/tmp/work")
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_plan(dir.path(), "plan.yaml", "steps: []");
        assert!(matches!(
            Plan::load(&path),
            Err(PlanError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rejects_missing_file() {
        assert!(matches!(
            Plan::load(Path::new("/no/such/plan.toml")),
            Err(PlanError::Io { .. })
        ));
    }

    #[test]
    fn validate_rejects_empty_plan() {
        let plan = Plan { steps: vec![] };
        assert!(matches!(plan.validate(), Err(PlanError::Empty)));
    }

    #[test]
    fn validate_rejects_empty_target() {
        let plan = Plan {
            steps: vec![Step::command("noop", "  ")],
        };
        assert!(matches!(
            plan.validate(),
            Err(PlanError::EmptyTarget(name)) if name == "noop"
        ));
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let plan = Plan {
            steps: vec![Step::command("dup", "true"), Step::command("dup", "true")],
        };
        assert!(matches!(
            plan.validate(),
            Err(PlanError::DuplicateName(name)) if name == "dup"
        ));
    }

    #[test]
    fn builtin_plan_is_valid() {
        let plan = Plan::builtin();
        plan.validate().unwrap();
        assert!(!plan.steps.is_empty());
    }

    #[test]
    fn builtin_plan_flags_the_cloned_install_script() {
        let flagged = Plan::builtin().remote_script_steps();
        assert_eq!(flagged, vec!["prompting-install".to_string()]);
    }

    #[test]
    fn remote_script_detection_ignores_unrelated_commands() {
        let plan = Plan {
            steps: vec![
                Step::git_clone("repo", "https://example.com/x/repo.git").in_dir("/tmp/work"),
                Step::command("elsewhere", "./run.sh").in_dir("/tmp/other"),
            ],
        };
        assert!(plan.remote_script_steps().is_empty());
    }
}
