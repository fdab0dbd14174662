// UI layer: a numbered REPL menu over the operation table.
// Input goes through the `Prompter` trait so the loop can be driven by
// `dialoguer` in the terminal and by a script in tests.

use crate::api::Transport;
use crate::credentials::CredentialEncoder;
use crate::dispatcher::Dispatcher;
use crate::operations::{Args, OperationDescriptor};
use crate::session::Session;
use anyhow::Result;
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tracing::debug;

/// Source of user input, one line per prompt.
pub trait Prompter {
    fn line(&mut self, prompt: &str) -> Result<String>;
    /// Like `line`, but the input is not echoed.
    fn secret(&mut self, prompt: &str) -> Result<String>;
}

/// Terminal prompter backed by `dialoguer`.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn line(&mut self, prompt: &str) -> Result<String> {
        let value: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(value)
    }

    fn secret(&mut self, prompt: &str) -> Result<String> {
        // `Password` hides input in terminal for passwords.
        let value = Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?;
        Ok(value)
    }
}

/// What the user picked at the menu prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// Index into the operation table.
    Operation(usize),
    ShowSession,
    Exit,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown selection '{0}'")]
pub struct UnknownSelection(pub String);

/// Accepts a 1-based menu number, an operation name (any case), `s`/`session`,
/// or `q`/`quit`/`exit`.
pub fn parse_selection(
    input: &str,
    operations: &[OperationDescriptor],
) -> Result<MenuChoice, UnknownSelection> {
    let input = input.trim();
    match input.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => return Ok(MenuChoice::Exit),
        "s" | "session" => return Ok(MenuChoice::ShowSession),
        _ => {}
    }
    if let Ok(n) = input.parse::<usize>() {
        if (1..=operations.len()).contains(&n) {
            return Ok(MenuChoice::Operation(n - 1));
        }
        return Err(UnknownSelection(input.to_string()));
    }
    operations
        .iter()
        .position(|op| op.name.eq_ignore_ascii_case(input))
        .map(MenuChoice::Operation)
        .ok_or_else(|| UnknownSelection(input.to_string()))
}

fn print_menu<W: Write>(
    out: &mut W,
    operations: &[OperationDescriptor],
    session: &Session,
) -> Result<()> {
    let who = if session.is_authenticated() {
        format!("logged in as {}", session.username)
    } else {
        "not logged in".to_string()
    };
    writeln!(out)?;
    writeln!(out, "== Catalog client ({who}) ==")?;
    for (i, op) in operations.iter().enumerate() {
        writeln!(out, "{:>3}) {}", i + 1, op.name)?;
    }
    writeln!(out, "  s) show session")?;
    writeln!(out, "  q) exit")?;
    Ok(())
}

/// Ask for every argument `op` declares.
pub fn gather_args<P: Prompter>(prompter: &mut P, op: &OperationDescriptor) -> Result<Args> {
    let mut args = Args::new();
    for spec in op.args {
        let value = if spec.is_secret() {
            prompter.secret(spec.prompt)?
        } else {
            prompter.line(spec.prompt)?
        };
        args.insert(spec.key, value);
    }
    Ok(args)
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Run the menu until the user exits or input runs out. Returns the final
/// session so callers (and tests) can inspect it.
pub fn run_menu<T, E, P, W>(
    dispatcher: &Dispatcher<T, E>,
    prompter: &mut P,
    out: &mut W,
) -> Result<Session>
where
    T: Transport,
    E: CredentialEncoder,
    P: Prompter,
    W: Write,
{
    let mut session = Session::new();
    let operations = dispatcher.operations();

    loop {
        print_menu(out, operations, &session)?;
        let selection = match prompter.line("Selection") {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, "input closed");
                break;
            }
        };

        let op = match parse_selection(&selection, operations) {
            Ok(MenuChoice::Exit) => break,
            Ok(MenuChoice::ShowSession) => {
                write!(out, "{}", describe_session(&session))?;
                continue;
            }
            Ok(MenuChoice::Operation(i)) => &operations[i],
            Err(e) => {
                writeln!(out, "{}", capitalize(&e.to_string()))?;
                continue;
            }
        };

        let args = match gather_args(prompter, op) {
            Ok(args) => args,
            Err(e) => {
                debug!(error = %e, "input closed");
                break;
            }
        };

        let progress = spinner("Sending...")?;
        let result = dispatcher.execute(&mut session, op, &args);
        progress.finish_and_clear();

        match result {
            Ok(response) => writeln!(out, "{}", serde_json::to_string_pretty(&response)?)?,
            Err(e) => writeln!(out, "Failed: {e}")?,
        }
    }

    Ok(session)
}

/// Session summary for the `s` command. The token itself is never shown.
pub fn describe_session(session: &Session) -> String {
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    let token = if session.is_authenticated() { "set" } else { "not set" };
    format!(
        "username: {}\ntoken: {}\nlast object id: {}\n",
        or_dash(&session.username),
        token,
        or_dash(&session.last_object_id),
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
