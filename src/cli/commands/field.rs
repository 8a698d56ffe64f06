use crate::cli::core::{require_args, CommandError, CommandResult, ShellContext};
use crate::cli::io;
use crate::cli::registry::{CommandEntry, Operand};
use crate::form::{FieldType, FieldValue};

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "set",
            "Enter a value and leave the field",
            "set <key> <value>",
            cmd_set,
        )
        .taking(Operand::ValueField),
        CommandEntry::new("blur", "Leave a field, validating it", "blur <key>", cmd_blur)
            .taking(Operand::AnyField),
        CommandEntry::new(
            "validate",
            "Validate every field of the form",
            "validate",
            cmd_validate,
        ),
    ]
}

fn parse_bool(raw: &str) -> Result<bool, CommandError> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Ok(true),
        "false" | "no" | "n" | "0" | "off" => Ok(false),
        other => Err(CommandError::InvalidArguments(format!(
            "`{other}` is not a checkbox value (use yes or no)"
        ))),
    }
}

fn cmd_set(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 1, "set <key> <value>")?;
    let key = args[0];
    let raw = args[1..].join(" ");
    let field = context.form.field(key)?;
    let value = match &field.field_type {
        FieldType::Checkbox => FieldValue::Bool(parse_bool(&raw)?),
        FieldType::File(_) | FieldType::Signature(_) => {
            return Err(CommandError::InvalidArguments(format!(
                "`{key}` takes files; use `attach` or `draw`"
            )));
        }
        _ => FieldValue::Text(raw),
    };
    if field.disabled {
        return Err(CommandError::Message(format!("`{key}` is disabled")));
    }

    context.form.change(key, value)?;
    context.form.blur(key)?;
    match context.form.state().visible_error(key) {
        Some(error) => io::print_error(format!("{key}: {error}")),
        None => io::print_success(format!("{key} updated.")),
    }
    Ok(())
}

fn cmd_blur(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    require_args(args, 1, "blur <key>")?;
    let key = args[0];
    context.form.blur(key)?;
    if let Some(error) = context.form.state().visible_error(key) {
        io::print_error(format!("{key}: {error}"));
    }
    Ok(())
}

fn cmd_validate(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if context.form.validate_all() {
        io::print_success("All fields are valid.");
        return Ok(());
    }
    for (key, error) in context.form.state().errors() {
        io::print_error(format!("{key}: {error}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkbox_words_parse() {
        assert!(parse_bool("Yes").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
