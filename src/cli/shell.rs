//! Line-driven shell. Interactive sessions read through rustyline with
//! completion of command names and form field keys; script sessions read
//! stdin line by line. Both feed the same dispatch loop.

use std::io::{self, BufRead, Lines, StdinLock};

use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    history::DefaultHistory,
    Context as ReadlineContext, Editor, Helper, Highlighter, Hinter, Validator,
};

use crate::cli::core::{CliError, CliMode, CommandError, LoopControl, ShellContext};
use crate::cli::io::print_warning;
use crate::cli::output::info as output_info;
use crate::cli::shell_context::SCRIPT_ENV;

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;
    tracing::info!(form = %context.form.config().id, ?mode, "shell started");

    match mode {
        CliMode::Interactive => {
            let mut source = EditorSource::new(FieldCompleter::for_context(&context))?;
            output_info(format!(
                "{}: {}. Type `help` for commands, Tab to complete.",
                context.config.app_title,
                context.form.config().title
            ));
            context.print_current_step();
            drive(&mut context, &mut source)
        }
        CliMode::Script => drive(&mut context, &mut ScriptSource::stdin()),
    }
}

enum Input {
    Line(String),
    Interrupted,
    Closed,
}

trait LineSource {
    fn read(&mut self, prompt: &str) -> Result<Input, CliError>;
}

struct ScriptSource<R> {
    lines: Lines<R>,
}

impl ScriptSource<StdinLock<'static>> {
    fn stdin() -> Self {
        Self {
            lines: io::stdin().lock().lines(),
        }
    }
}

impl<R: BufRead> LineSource for ScriptSource<R> {
    fn read(&mut self, _prompt: &str) -> Result<Input, CliError> {
        match self.lines.next() {
            Some(line) => Ok(Input::Line(line?)),
            None => Ok(Input::Closed),
        }
    }
}

struct EditorSource {
    editor: Editor<FieldCompleter, DefaultHistory>,
}

impl EditorSource {
    fn new(completer: FieldCompleter) -> Result<Self, CliError> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(completer));
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn read(&mut self, prompt: &str) -> Result<Input, CliError> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    self.editor.add_history_entry(trimmed).ok();
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Closed),
            Err(err) => Err(err.into()),
        }
    }
}

fn drive(context: &mut ShellContext, source: &mut impl LineSource) -> Result<(), CliError> {
    loop {
        let prompt = context.prompt();
        match source.read(&prompt)? {
            Input::Line(line) => match handle_line(context, &line) {
                Ok(LoopControl::Continue) => {}
                Ok(LoopControl::Exit) => return Ok(()),
                Err(err) => context.report_error(err)?,
            },
            Input::Interrupted => {
                if context.confirm_exit()? {
                    return Ok(());
                }
            }
            Input::Closed => {
                if context.mode == CliMode::Interactive {
                    output_info("Exiting shell.");
                }
                return Ok(());
            }
        }
    }
}

fn handle_line(context: &mut ShellContext, line: &str) -> Result<LoopControl, CommandError> {
    let tokens = match command_tokens(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            print_warning(format!("Could not read `{}`: {err}", line.trim()));
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.dispatch(&raw.to_lowercase(), raw, &args)
}

/// Shell words of `line`; blank lines and `#` comments yield nothing.
pub(crate) fn command_tokens(line: &str) -> Result<Vec<String>, shell_words::ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Vec::new());
    }
    shell_words::split(line)
}

struct CommandWords {
    name: &'static str,
    operands: Vec<String>,
    choices: &'static [&'static str],
}

/// Completion snapshot of the command table and the loaded form's keys.
#[derive(Helper, Highlighter, Hinter, Validator)]
struct FieldCompleter {
    commands: Vec<CommandWords>,
}

impl FieldCompleter {
    fn for_context(context: &ShellContext) -> Self {
        let form = context.form.config();
        let commands = context
            .registry
            .list()
            .map(|entry| CommandWords {
                name: entry.name,
                operands: context.registry.operand_words(entry, form),
                choices: entry.choices,
            })
            .collect();
        Self { commands }
    }

    /// Start of the word under the cursor and the words that may replace it.
    fn candidates(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let prefix = &line[..pos];
        let words: Vec<&str> = prefix.split_whitespace().collect();
        let partial = if prefix.ends_with(char::is_whitespace) {
            ""
        } else {
            words.last().copied().unwrap_or("")
        };
        let index = if partial.is_empty() {
            words.len()
        } else {
            words.len() - 1
        };
        let start = pos - partial.len();

        let pool: Vec<&str> = match index {
            0 => self.commands.iter().map(|command| command.name).collect(),
            1 | 2 => {
                let name = words[0].to_ascii_lowercase();
                match self.commands.iter().find(|command| command.name == name) {
                    Some(command) if index == 1 => {
                        command.operands.iter().map(String::as_str).collect()
                    }
                    Some(command) => command.choices.to_vec(),
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        };

        let matches = pool
            .into_iter()
            .filter(|word| word.starts_with(partial))
            .map(str::to_string)
            .collect();
        (start, matches)
    }
}

impl Completer for FieldCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, words) = self.candidates(line, pos);
        let pairs = words
            .into_iter()
            .map(|word| Pair {
                display: word.clone(),
                replacement: word,
            })
            .collect();
        Ok((start, pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completer() -> FieldCompleter {
        let words = |list: &[&str]| list.iter().map(|word| word.to_string()).collect();
        FieldCompleter {
            commands: vec![
                CommandWords {
                    name: "set",
                    operands: words(&["full_name", "email", "agree"]),
                    choices: &[],
                },
                CommandWords {
                    name: "submit",
                    operands: Vec::new(),
                    choices: &[],
                },
                CommandWords {
                    name: "mode",
                    operands: words(&["signature"]),
                    choices: &["draw", "upload"],
                },
            ],
        }
    }

    fn complete(line: &str) -> (usize, Vec<String>) {
        completer().candidates(line, line.len())
    }

    #[test]
    fn quoted_values_stay_together() {
        let tokens = command_tokens(r#"set full_name "Kamal Perera""#).unwrap();
        assert_eq!(tokens, vec!["set", "full_name", "Kamal Perera"]);
    }

    #[test]
    fn comments_and_blank_lines_have_no_tokens() {
        assert!(command_tokens("   ").unwrap().is_empty());
        assert!(command_tokens("# set agree \"unbalanced").unwrap().is_empty());
        assert!(command_tokens(r#"set full_name "Kamal"#).is_err());
    }

    #[test]
    fn first_word_completes_command_names() {
        assert_eq!(complete("s"), (0, vec!["set".into(), "submit".into()]));
        assert_eq!(complete("su"), (0, vec!["submit".into()]));
    }

    #[test]
    fn second_word_completes_field_keys_for_the_command() {
        assert_eq!(complete("set e"), (4, vec!["email".into()]));
        assert_eq!(complete("SET ").1.len(), 3);
        assert!(complete("submit ").1.is_empty());
        assert!(complete("nope ").1.is_empty());
    }

    #[test]
    fn third_word_completes_fixed_choices() {
        assert_eq!(complete("mode signature u"), (15, vec!["upload".into()]));
        assert!(complete("set email x").1.is_empty());
        assert!(complete("mode signature draw ").1.is_empty());
    }
}
