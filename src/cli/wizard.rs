//! Line-oriented driver for `ToolBuilder`.

use colored::*;
use eyre::Result;
use std::io::{BufRead, Write};

use toolreg::tools::{BuilderEvent, InputKind, Prompt, ToolBuilder, ToolDefinition};

/// Run the builder over `input`, echoing prompts to `output`.
///
/// Returns `None` when the operator cancels (empty answer or EOF).
pub fn run_wizard<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<Option<ToolDefinition>> {
    let mut builder = ToolBuilder::new();

    while let Some(prompt) = builder.prompt() {
        write_prompt(&mut output, &prompt)?;

        let mut line = String::new();
        let event = if input.read_line(&mut line)? == 0 {
            BuilderEvent::Cancel
        } else {
            match to_event(&prompt, line.trim()) {
                Some(event) => event,
                None => {
                    writeln!(output, "{}", "Please answer y or n".yellow())?;
                    continue;
                }
            }
        };

        if let Err(e) = builder.handle(event) {
            writeln!(output, "{} {}", "Error:".red(), e)?;
        }
    }

    Ok(builder.finish())
}

fn write_prompt<W: Write>(output: &mut W, prompt: &Prompt) -> Result<()> {
    let mut hint = String::new();
    match prompt.kind {
        InputKind::Confirm => hint.push_str(" [y/n]"),
        InputKind::Choice => hint = format!(" [{}]", prompt.choices.join("/")),
        InputKind::Text => {
            if let Some(default) = prompt.default {
                hint = format!(" [{}]", default);
            } else if !prompt.placeholder.is_empty() {
                hint = format!(" ({})", prompt.placeholder);
            }
        }
    }
    write!(output, "{}{}: ", prompt.message.cyan(), hint.dimmed())?;
    output.flush()?;
    Ok(())
}

fn to_event(prompt: &Prompt, answer: &str) -> Option<BuilderEvent> {
    match prompt.kind {
        InputKind::Text | InputKind::Choice => match (answer.is_empty(), prompt.default) {
            (true, Some(default)) => Some(BuilderEvent::Text(default.to_string())),
            _ => Some(BuilderEvent::Text(answer.to_string())),
        },
        InputKind::Confirm => match answer.to_lowercase().as_str() {
            "" => Some(BuilderEvent::Cancel),
            "y" | "yes" => Some(BuilderEvent::Confirm(true)),
            "n" | "no" => Some(BuilderEvent::Confirm(false)),
            _ => None,
        },
    }
}
