//! Sequential step executor
//!
//! Runs a plan's steps in declared order, skipping satisfied ones, and
//! collects a per-step report. Steps never run concurrently: package
//! managers and git are not safe to parallelize against a shared
//! filesystem, so each step gates the next.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::plan::Plan;
use crate::step::Step;
use crate::ui;

/// Options for a run
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Abort remaining steps on first failure
    pub fail_fast: bool,
    /// Don't invoke anything, just show what would happen
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            fail_fast: true,
            dry_run: false,
            verbose: false,
        }
    }
}

/// Cooperative cancellation, checked between steps only.
///
/// A running step is never interrupted; a set token stops the run before
/// the next step starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Success,
    Skipped { reason: String },
    Failed { error: String },
}

/// Per-step execution record
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    pub exit_code: Option<i32>,
    pub stderr: String,
    pub duration: Duration,
}

impl StepReport {
    fn skipped(step: &Step, reason: &str) -> Self {
        Self {
            name: step.name.clone(),
            status: StepStatus::Skipped {
                reason: reason.to_string(),
            },
            exit_code: None,
            stderr: String::new(),
            duration: Duration::ZERO,
        }
    }
}

/// Aggregated run outcome
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    pub fn from_reports(reports: &[StepReport]) -> Self {
        let mut summary = Self::default();
        for report in reports {
            match report.status {
                StepStatus::Success => summary.succeeded += 1,
                StepStatus::Skipped { .. } => summary.skipped += 1,
                StepStatus::Failed { .. } => summary.failed += 1,
            }
        }
        summary
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code: the failure count, capped at 255
    pub fn exit_code(&self) -> u8 {
        u8::try_from(self.failed).unwrap_or(u8::MAX)
    }
}

/// Run every step of the plan in declared order.
///
/// Always returns a well-formed report sequence. With `fail_fast` the
/// sequence is truncated after the first failure; a set cancel token
/// truncates it before the next step starts. No rollback, no retries.
pub fn execute(plan: &Plan, opts: &ExecuteOptions, cancel: &CancelToken) -> Vec<StepReport> {
    let total = plan.steps.len();
    let mut reports = Vec::with_capacity(total);

    for (i, step) in plan.steps.iter().enumerate() {
        if cancel.is_cancelled() {
            log::info!("cancelled before step {}", step.name);
            break;
        }

        ui::step(i + 1, total, &step.description());

        if opts.dry_run {
            reports.push(StepReport::skipped(step, "dry run"));
            continue;
        }

        if step.is_satisfied() {
            ui::dim(&format!("{} already satisfied", step.name));
            reports.push(StepReport::skipped(step, "already satisfied"));
            continue;
        }

        let started = Instant::now();
        let report = match step.invoke() {
            Ok(()) => StepReport {
                name: step.name.clone(),
                status: StepStatus::Success,
                exit_code: Some(0),
                stderr: String::new(),
                duration: started.elapsed(),
            },
            Err(e) => StepReport {
                name: step.name.clone(),
                status: StepStatus::Failed {
                    error: e.to_string(),
                },
                exit_code: e.exit_code(),
                stderr: e.stderr().to_string(),
                duration: started.elapsed(),
            },
        };

        let failed = matches!(report.status, StepStatus::Failed { .. });
        if failed {
            ui::error(&format!("{} failed", step.name));
            if !report.stderr.is_empty() {
                ui::dim(&report.stderr);
            }
        } else if opts.verbose {
            ui::dim(&format!("{} done in {:.1?}", step.name, report.duration));
        }

        reports.push(report);

        if failed && opts.fail_fast {
            log::warn!("aborting remaining steps (fail-fast)");
            break;
        }
    }

    reports
}

/// Print the final human-readable summary
pub fn print_summary(reports: &[StepReport]) {
    let summary = ExecuteSummary::from_reports(reports);

    println!();
    if summary.is_success() {
        println!("  {} Provisioning complete", "✓".green().bold());
    } else {
        println!("  {} Provisioning finished with errors", "⚠".yellow().bold());
    }

    if summary.succeeded > 0 {
        println!("    • {} step(s) succeeded", summary.succeeded);
    }
    if summary.skipped > 0 {
        let names = names_with(reports, |s| matches!(s, StepStatus::Skipped { .. }));
        println!("    • {} skipped: {}", summary.skipped, names.join(", "));
    }
    if summary.failed > 0 {
        let names = names_with(reports, |s| matches!(s, StepStatus::Failed { .. }));
        println!(
            "    • {} {}: {}",
            summary.failed,
            "failed".red(),
            names.join(", ")
        );
    }
}

fn names_with(reports: &[StepReport], pred: impl Fn(&StepStatus) -> bool) -> Vec<String> {
    reports
        .iter()
        .filter(|r| pred(&r.status))
        .map(|r| r.name.clone())
        .collect()
}
