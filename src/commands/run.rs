//! Run command - execute a provisioning plan

use anyhow::{Context, Result};

use crate::Context as AppContext;
use crate::cli::RunArgs;
use crate::executor::{self, CancelToken, ExecuteOptions, ExecuteSummary};
use crate::plan::Plan;
use crate::ui;

pub fn run(ctx: &AppContext, args: &RunArgs) -> Result<u8> {
    let plan = Plan::resolve(args.plan.as_deref())?;

    if !ctx.quiet {
        ui::header("Provisioning");
        println!();
        ui::info(&format!("{} step(s) to run", plan.steps.len()));
    }

    // Executing a script out of a freshly cloned repository is arbitrary
    // remote code execution; call it out before touching anything.
    for name in plan.remote_script_steps() {
        ui::warn(&format!(
            "step `{name}` runs a script from a freshly cloned repository"
        ));
    }

    if !args.yes && !args.dry_run && !confirm_proceed()? {
        ui::error("Aborted");
        return Ok(1);
    }

    let opts = ExecuteOptions {
        fail_fast: args.fail_fast || !args.continue_on_error,
        dry_run: args.dry_run,
        verbose: ctx.verbose > 0,
    };

    let reports = executor::execute(&plan, &opts, &CancelToken::new());
    executor::print_summary(&reports);

    Ok(ExecuteSummary::from_reports(&reports).exit_code())
}

fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()
        .context("Failed to read confirmation")?;

    Ok(confirmed)
}
