// Table driven command line parser.
//
// Options are matched by prefix in registration order and the first hit wins,
// so `-n` also claims `-n42` (value glued to the spelling) and `-number`.
use std::ffi::OsString;
use std::fmt::Write as _;
use std::io::{self, Write};

use shared::models::ArgList;
use shared::utils::starts_with;
use tracing::{debug, trace};

use crate::error::{Result, ToolkitError};

pub type Action<'a> = Box<dyn FnMut(&str) + 'a>;

enum ArgAction<'a> {
    Run(Action<'a>),
    Help,
}

/// One option definition.
pub struct Arg<'a> {
    pub short: String,
    pub long: String,
    /// Name of the expected value, empty for plain flags.
    pub placeholder: String,
    pub explanation: String,
    action: ArgAction<'a>,
}

impl<'a> Arg<'a> {
    /// Option whose action receives the extracted value, or `""` when `placeholder` is empty.
    pub fn new(
        short: impl Into<String>,
        long: impl Into<String>,
        placeholder: impl Into<String>,
        explanation: impl Into<String>,
        action: impl FnMut(&str) + 'a,
    ) -> Self {
        Arg {
            short: short.into(),
            long: long.into(),
            placeholder: placeholder.into(),
            explanation: explanation.into(),
            action: ArgAction::Run(Box::new(action)),
        }
    }

    pub fn flag(
        short: impl Into<String>,
        long: impl Into<String>,
        explanation: impl Into<String>,
        action: impl FnMut(&str) + 'a,
    ) -> Self {
        Arg::new(short, long, "", explanation, action)
    }

    fn help() -> Self {
        Arg {
            short: "-h".to_string(),
            long: "--help".to_string(),
            placeholder: String::new(),
            explanation: "This help".to_string(),
            action: ArgAction::Help,
        }
    }

    fn takes_value(&self) -> bool {
        !self.placeholder.is_empty()
    }

    // Returns the spelling that prefixes `current`, short spelling first.
    fn matched_spelling(&self, current: &str) -> Option<&str> {
        [self.short.as_str(), self.long.as_str()]
            .into_iter()
            .find(|spelling| !spelling.is_empty() && starts_with(current, spelling))
    }

    fn help_width(&self) -> usize {
        self.short.len() + self.placeholder.len() + 4 + self.long.len()
    }
}

/// How a [`Parser::process`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Every argument was dispatched or collected.
    Completed,
    /// The help text was written; the remaining arguments were not looked at.
    HelpShown,
}

pub struct Parser<'a> {
    app_name: String,
    commands: Vec<Arg<'a>>,
    remaining: ArgList,
    help_out: Box<dyn Write + 'a>,
}

impl<'a> Parser<'a> {
    /// Creates a parser for `args`, followed by the built-in `-h`/`--help` option.
    pub fn new(app_name: impl Into<String>, args: Vec<Arg<'a>>) -> Self {
        let mut commands = args;
        commands.push(Arg::help());
        Parser {
            app_name: app_name.into(),
            commands,
            remaining: ArgList::new(),
            help_out: Box::new(io::stdout()),
        }
    }

    /// Sends the built-in help text to `out` instead of stdout.
    pub fn with_help_output(mut self, out: impl Write + 'a) -> Self {
        self.help_out = Box::new(out);
        self
    }

    pub fn add(&mut self, arg: Arg<'a>) {
        self.commands.push(arg);
    }

    pub fn add_all(&mut self, args: impl IntoIterator<Item = Arg<'a>>) {
        self.commands.extend(args);
    }

    pub fn name(&self) -> &str {
        &self.app_name
    }

    /// Arguments no option claimed, in the order they were seen over all `process` calls.
    pub fn remaining_args(&self) -> &[String] {
        &self.remaining
    }

    pub fn process<I, S>(&mut self, args: I) -> Result<ProcessOutcome>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: ArgList = args.into_iter().map(Into::into).collect();
        let mut cursor = 0;
        while cursor < args.len() {
            let current = &args[cursor];
            let found = self.commands.iter().enumerate().find_map(|(index, cmd)| {
                cmd.matched_spelling(current).map(|spelling| (index, spelling.to_string()))
            });

            let Some((index, spelling)) = found else {
                trace!(arg = %current, "Unmatched command line argument");
                self.remaining.push(current.clone());
                cursor += 1;
                continue;
            };

            let value = if !self.commands[index].takes_value() {
                String::new()
            } else if current.len() > spelling.len() {
                current[spelling.len()..].to_string()
            } else if cursor + 1 < args.len() {
                cursor += 1;
                args[cursor].clone()
            } else {
                return Err(ToolkitError::MissingArgument(spelling));
            };
            debug!(option = %spelling, value = %value, "Matched command line option");

            if matches!(self.commands[index].action, ArgAction::Help) {
                let text = self.help_text();
                self.help_out.write_all(text.as_bytes())?;
                self.help_out.flush()?;
                return Ok(ProcessOutcome::HelpShown);
            }
            if let ArgAction::Run(action) = &mut self.commands[index].action {
                action(value.as_str());
            }
            cursor += 1;
        }
        Ok(ProcessOutcome::Completed)
    }

    /// Processes the arguments of the running process, program name excluded.
    /// Arguments that are not valid UTF-8 are converted lossily.
    pub fn process_env(&mut self) -> Result<ProcessOutcome> {
        self.process(lossy_args(std::env::args_os().skip(1)))
    }

    /// Like [`Parser::process_env`], but terminates the process once help was shown.
    pub fn process_env_or_exit(&mut self) -> Result<()> {
        if self.process_env()? == ProcessOutcome::HelpShown {
            std::process::exit(0);
        }
        Ok(())
    }

    pub fn help_text(&self) -> String {
        let min_len = self.commands.iter().map(Arg::help_width).max().unwrap_or(0);
        let mut text = format!("{}\navailable options:\n", self.app_name);
        for cmd in &self.commands {
            let pad = min_len - cmd.help_width();
            // Writing into a String cannot fail.
            let _ = writeln!(
                text,
                "  {}|{} {}{:pad$} : {}",
                cmd.short, cmd.long, cmd.placeholder, "", cmd.explanation
            );
        }
        text
    }

    pub fn show_help<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(self.help_text().as_bytes())?;
        Ok(())
    }
}

fn lossy_args<I: IntoIterator<Item = OsString>>(args: I) -> ArgList {
    args.into_iter()
        .map(|arg| arg.into_string().unwrap_or_else(|raw| raw.to_string_lossy().into_owned()))
        .collect()
}
