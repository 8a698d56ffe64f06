use crate::cli::core::{require_args, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::{CommandEntry, Operand};
use crate::form::NavigationOutcome;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("next", "Validate this step and continue", "next", cmd_next),
        CommandEntry::new("back", "Return to the previous step", "back", cmd_back),
        CommandEntry::new("goto", "Jump to a step by number", "goto <step>", cmd_goto)
            .taking(Operand::Step),
    ]
}

fn report(context: &ShellContext, outcome: NavigationOutcome) {
    match outcome {
        NavigationOutcome::Moved { to, .. } => {
            let title = &context.form.config().sections[to].title;
            io::print_info(format!("Step {}: {}", to + 1, title));
        }
        NavigationOutcome::Unchanged => {}
        NavigationOutcome::Blocked { step } => {
            io::print_warning("Fix the errors on this step first.");
            context.print_step_errors(step);
        }
    }
}

fn cmd_next(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let outcome = context.form.advance();
    if outcome == NavigationOutcome::Unchanged {
        io::print_info("This is the last step. Use `submit` to send the application.");
    }
    report(context, outcome);
    Ok(())
}

fn cmd_back(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let outcome = context.form.retreat();
    if outcome == NavigationOutcome::Unchanged {
        io::print_info("Already on the first step.");
    }
    report(context, outcome);
    Ok(())
}

fn cmd_goto(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 1, "goto <step>")?;
    let step: usize = args[0]
        .parse()
        .ok()
        .filter(|step| *step > 0)
        .ok_or_else(|| {
            CommandError::InvalidArguments(format!("`{}` is not a step number", args[0]))
        })?;
    let outcome = context.form.jump_to_step(step - 1)?;
    report(context, outcome);
    Ok(())
}
