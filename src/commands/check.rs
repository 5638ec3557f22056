//! Check command - report which steps are already satisfied

use anyhow::Result;
use colored::Colorize;

use crate::Context as AppContext;
use crate::cli::PlanArgs;
use crate::plan::Plan;
use crate::ui;

pub fn run(ctx: &AppContext, args: &PlanArgs) -> Result<u8> {
    let plan = Plan::resolve(args.plan.as_deref())?;

    if !ctx.quiet {
        ui::header("Plan status");
        println!();
    }

    let mut pending = 0usize;
    for step in &plan.steps {
        if step.is_satisfied() {
            println!("  {} {:<20} {}", "✓".green(), step.name, "satisfied".dimmed());
        } else {
            pending += 1;
            println!(
                "  {} {:<20} {}",
                "○".yellow(),
                step.name,
                step.description().dimmed()
            );
        }
    }

    println!();
    if pending == 0 {
        ui::success("Everything already satisfied");
    } else {
        ui::info(&format!("{pending} step(s) pending"));
    }

    Ok(0)
}
