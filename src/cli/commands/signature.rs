use std::path::Path;

use crate::cli::core::{require_args, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::{CommandEntry, Operand};
use crate::files::PickedFile;
use crate::form::UploadOutcome;
use crate::signature::SignatureMode;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "draw",
            "Draw one stroke through the given points",
            "draw <key> <x,y> <x,y>...",
            cmd_draw,
        )
        .taking(Operand::SignatureField),
        CommandEntry::new("undo", "Undo the last drawn segment", "undo <key>", cmd_undo)
            .taking(Operand::SignatureField),
        CommandEntry::new("clear", "Clear a signature", "clear <key>", cmd_clear)
            .taking(Operand::SignatureField),
        CommandEntry::new(
            "mode",
            "Switch between drawing and uploading",
            "mode <key> draw|upload",
            cmd_mode,
        )
        .taking(Operand::SignatureField)
        .then_one_of(&["draw", "upload"]),
        CommandEntry::new(
            "sign-upload",
            "Use an image file as the signature",
            "sign-upload <key> <path>",
            cmd_sign_upload,
        )
        .taking(Operand::SignatureField),
    ]
}

fn parse_point(raw: &str) -> Result<(f32, f32), CommandError> {
    let invalid = || CommandError::InvalidArguments(format!("`{raw}` is not a point (use x,y)"));
    let (x, y) = raw.split_once(',').ok_or_else(invalid)?;
    let x = x.trim().parse().map_err(|_| invalid())?;
    let y = y.trim().parse().map_err(|_| invalid())?;
    Ok((x, y))
}

fn print_status(context: &ShellContext, key: &str) {
    if let Some(status) = context
        .form
        .state()
        .signature(key)
        .and_then(|capture| capture.status())
    {
        io::print_info(status);
    }
    if let Some(error) = context.form.state().visible_error(key) {
        io::print_error(format!("{key}: {error}"));
    }
}

fn cmd_draw(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 3, "draw <key> <x,y> <x,y>...")?;
    let key = args[0];
    let points = args[1..]
        .iter()
        .map(|raw| parse_point(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let (x, y) = points[0];
    context.form.signature_drag_start(key, x, y)?;
    for (x, y) in &points[1..] {
        context.form.signature_drag_update(key, *x, *y)?;
    }
    context.form.signature_drag_end(key)?;
    print_status(context, key);
    Ok(())
}

fn cmd_undo(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 1, "undo <key>")?;
    if !context.form.signature_undo(args[0])? {
        io::print_info("Nothing to undo.");
        return Ok(());
    }
    print_status(context, args[0]);
    Ok(())
}

fn cmd_clear(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 1, "clear <key>")?;
    context.form.signature_clear(args[0])?;
    print_status(context, args[0]);
    Ok(())
}

fn cmd_mode(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 2, "mode <key> draw|upload")?;
    let mode = match args[1].to_ascii_lowercase().as_str() {
        "draw" => SignatureMode::Draw,
        "upload" => SignatureMode::Upload,
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown signature mode `{other}`"
            )))
        }
    };
    context.form.signature_mode(args[0], mode)?;
    Ok(())
}

fn cmd_sign_upload(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 2, "sign-upload <key> <path>")?;
    let key = args[0];
    let path = Path::new(args[1]);
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args[1].to_string());
    let size = std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
    let file = PickedFile::new(name, size).with_path(path);

    match smol::block_on(context.form.upload_signature(key, file))? {
        UploadOutcome::Accepted => print_status(context, key),
        UploadOutcome::Rejected(reason) => io::print_error(reason),
    }
    Ok(())
}
