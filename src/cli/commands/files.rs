use crate::cli::core::{find_file, require_args, short_id, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::picker::PathPicker;
use crate::cli::registry::{CommandEntry, Operand};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "attach",
            "Attach files to a file field",
            "attach <key> <path>...",
            cmd_attach,
        )
        .taking(Operand::FileField),
        CommandEntry::new("files", "List attached files", "files <key>", cmd_files)
            .taking(Operand::FileField),
        CommandEntry::new(
            "detach",
            "Remove an attached file",
            "detach <key> <id>",
            cmd_detach,
        )
        .taking(Operand::FileField),
    ]
}

fn cmd_attach(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 2, "attach <key> <path>...")?;
    let key = args[0];
    let picker = PathPicker::new(args[1..].iter().copied());
    let added = smol::block_on(context.form.pick_files(key, &picker))?;

    if let Some(error) = context.form.state().visible_error(key) {
        io::print_error(format!("{key}: {error}"));
    } else if added > 0 {
        io::print_success(format!("{added} file(s) attached to {key}."));
    } else if let Some(status) = context
        .form
        .state()
        .signature(key)
        .and_then(|capture| capture.status())
    {
        io::print_warning(status);
    }
    Ok(())
}

fn cmd_files(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 1, "files <key>")?;
    let key = args[0];
    context.form.field(key)?;
    let files = context.form.state().files(key);
    if files.is_empty() {
        io::print_info(format!("No files attached to {key}."));
        return Ok(());
    }
    for record in files {
        io::print_info(format!(
            "  {}  {:<28} {:>9} B  {}",
            short_id(record.id),
            record.name,
            record.size,
            record.mime_type
        ));
    }
    Ok(())
}

fn cmd_detach(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 2, "detach <key> <id>")?;
    let key = args[0];
    let id = find_file(context.form.state().files(key), args[1])?;
    if context.form.remove_file(key, id)? {
        io::print_success(format!("File removed from {key}."));
    }
    if let Some(error) = context.form.state().visible_error(key) {
        io::print_error(format!("{key}: {error}"));
    }
    Ok(())
}
