use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::cli::registry::{CommandEntry, Operand};
use crate::form::StepStatus;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        )
        .taking(Operand::Command),
        CommandEntry::new(
            "status",
            "Show progress and the current step",
            "status",
            cmd_status,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output_section(format!("SL NIC Bridge {}", meta.version));
    io::print_info(format!("  Build hash   : {}", meta.git_hash));
    io::print_info(format!("  Built at     : {}", meta.timestamp));
    io::print_info(format!("  Target       : {}", meta.target));
    io::print_info(format!("  Profile      : {}", meta.profile));
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(command) = args.first().map(|name| name.to_lowercase()) {
        if let Some(command) = context.command(&command) {
            help::print_command(command);
        } else {
            context.suggest_command(args[0]);
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output_section(&context.form.config().title);
    match &context.form_path {
        Some(path) => io::print_info(format!("  Form file: {}", path.display())),
        None => io::print_info("  Form file: built-in"),
    }
    for step in context.form.step_summaries() {
        let marker = match step.status {
            StepStatus::Completed => "[x]",
            StepStatus::Current => "[>]",
            StepStatus::Pending => "[ ]",
        };
        io::print_info(format!("  {} {}. {}", marker, step.index + 1, step.title));
    }
    context.print_current_step();
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
