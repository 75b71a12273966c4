//! Interactive loop and command dispatcher
//!
//! Reads one line at a time and decides, per line, whether to quit, skip,
//! answer a persona meta-command locally, or forward the text to the
//! session. Turn failures are printed and the loop carries on; only quit,
//! interrupt or end of input end it.

use std::future::Future;
use std::io::{self, Write};

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::agent::{AgentError, Session};
use crate::persona::{MetaCommand, Persona};

/// Tokens that end the session, matched after trimming and lower-casing
pub const QUIT_TOKENS: &[&str] = &["quit", "exit", "q"];

/// Anything that can answer a line of user text
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, text: &str) -> Result<String, AgentError>;
}

#[async_trait]
impl Responder for Session {
    async fn respond(&self, text: &str) -> Result<String, AgentError> {
        Session::respond(self, text).await
    }
}

/// What a single input line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Quit,
    Empty,
    Meta(&'a MetaCommand),
    Prompt(&'a str),
}

/// Classify one raw input line for `persona`
pub fn parse_command<'a>(persona: &'a Persona, line: &'a str) -> Command<'a> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    let lowered = trimmed.to_ascii_lowercase();
    if QUIT_TOKENS.contains(&lowered.as_str()) {
        return Command::Quit;
    }
    match persona.command(trimmed) {
        Some(command) => Command::Meta(command),
        None => Command::Prompt(trimmed),
    }
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// A quit token was entered
    Quit,
    /// The interrupt future fired
    Interrupted,
    /// Input reached end of file
    EndOfInput,
}

/// Per-run counters, mostly for the shutdown log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub turns: usize,
    pub failed_turns: usize,
    pub meta_commands: usize,
}

/// Run the loop until quit, interrupt or end of input
///
/// # Arguments
/// * `persona` - Supplies meta-commands and the text printed around turns
/// * `responder` - Answers forwarded lines, usually a [`Session`]
/// * `input` - Line-oriented input, e.g. buffered stdin
/// * `output` - Where the conversation is printed
/// * `interrupt` - Resolves when the user aborts (Ctrl-C); treated as quit
pub async fn run_loop<R, W, S, I>(
    persona: &Persona,
    responder: &S,
    mut input: R,
    output: &mut W,
    interrupt: I,
) -> io::Result<(LoopExit, LoopStats)>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    S: Responder + ?Sized,
    I: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let presentation = persona.presentation();
    let mut stats = LoopStats::default();
    let mut line = String::new();

    loop {
        write!(output, "{}", presentation.prompt)?;
        output.flush()?;

        line.clear();
        let read = tokio::select! {
            biased;
            _ = &mut interrupt => None,
            read = input.read_line(&mut line) => Some(read),
        };

        let Some(read) = read else {
            writeln!(output, "{}", presentation.interrupt_farewell)?;
            info!("Interrupted while waiting for input");
            return Ok((LoopExit::Interrupted, stats));
        };

        // The offending bytes are already consumed, so the next read starts clean
        let bytes = match read {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!(error = %e, "Skipping input line that is not valid UTF-8");
                writeln!(output, "{}input was not valid UTF-8", presentation.error_prefix)?;
                continue;
            }
            Err(e) => return Err(e),
        };

        if bytes == 0 {
            writeln!(output)?;
            writeln!(output, "{}", presentation.farewell)?;
            info!("End of input");
            return Ok((LoopExit::EndOfInput, stats));
        }

        match parse_command(persona, &line) {
            Command::Quit => {
                writeln!(output, "{}", presentation.farewell)?;
                return Ok((LoopExit::Quit, stats));
            }
            Command::Empty => continue,
            Command::Meta(command) => {
                debug!(command = %command.token, "Meta-command");
                stats.meta_commands += 1;
                writeln!(output, "{}", command.text)?;
            }
            Command::Prompt(text) => {
                stats.turns += 1;
                write!(output, "{}", presentation.response_header)?;
                output.flush()?;

                let result = tokio::select! {
                    biased;
                    _ = &mut interrupt => None,
                    result = responder.respond(text) => Some(result),
                };

                match result {
                    None => {
                        writeln!(output, "{}", presentation.interrupt_farewell)?;
                        info!("Interrupted while waiting for a response");
                        return Ok((LoopExit::Interrupted, stats));
                    }
                    Some(Ok(answer)) => {
                        writeln!(output, "{answer}")?;
                    }
                    Some(Err(e)) => {
                        stats.failed_turns += 1;
                        warn!(kind = e.kind(), error = %e, "Turn failed");
                        writeln!(output, "{}{}", presentation.error_prefix, e)?;
                    }
                }
                write!(output, "{}", presentation.response_footer)?;
            }
        }
    }
}
