//! List command - print the resolved plan

use anyhow::Result;

use crate::Context as AppContext;
use crate::cli::PlanArgs;
use crate::plan::Plan;
use crate::ui;

pub fn run(ctx: &AppContext, args: &PlanArgs) -> Result<u8> {
    let plan = Plan::resolve(args.plan.as_deref())?;

    if !ctx.quiet {
        ui::header("Plan");
        println!();
    }

    let total = plan.steps.len();
    for (i, step) in plan.steps.iter().enumerate() {
        ui::step(i + 1, total, &step.description());
        if let Some(dir) = &step.working_directory {
            ui::dim(&format!("in {dir}"));
        }
        if let Some(check) = &step.check {
            ui::dim(&format!("check: {check}"));
        }
    }

    for name in plan.remote_script_steps() {
        println!();
        ui::warn(&format!(
            "step `{name}` runs a script from a freshly cloned repository"
        ));
    }

    Ok(0)
}
