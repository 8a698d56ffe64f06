use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::CommandEntry;
use crate::form::SubmitOutcome;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("submit", "Validate and submit the form", "submit", cmd_submit),
        CommandEntry::new("reset", "Discard all entries", "reset", cmd_reset),
        CommandEntry::new("cancel", "Cancel the application", "cancel", cmd_cancel),
    ]
}

fn cmd_submit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.form.submit() {
        SubmitOutcome::Submitted => io::print_success("Application submitted."),
        SubmitOutcome::Invalid { step, errors } => {
            io::print_warning(format!(
                "{errors} field(s) need attention. Moved to step {}.",
                step + 1
            ));
            context.print_step_errors(step);
        }
        SubmitOutcome::Busy => io::print_warning("A submission is already in progress."),
        SubmitOutcome::CallbackFailed(reason) => {
            io::print_error(format!("Submission failed: {reason}"));
        }
    }
    Ok(())
}

fn cmd_reset(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.form.reset();
    io::print_info("Form cleared.");
    Ok(())
}

fn cmd_cancel(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.form.cancel();
    Ok(())
}
