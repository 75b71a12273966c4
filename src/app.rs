//! Process startup: probe the model server, build the session, run the loop
//!
//! Both binaries go through [`launch`]; they differ only in the persona.

use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, BufReader};
use tracing::{debug, info, warn};

use crate::agent::{ModelClient, Session};
use crate::config::Config;
use crate::metrics;
use crate::ollama::{has_model, OllamaClient};
use crate::persona::Persona;
use crate::probe::probe;
use crate::repl::run_loop;
use crate::tools::{Calculator, ToolError, ToolRegistry, WebSearch};

/// How the process should exit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Quit, interrupt or end of input
    Graceful,
    /// The model server was not reachable at startup
    Unreachable,
    /// Something outside a turn failed (e.g. stdout closed)
    Failed,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Graceful => 0,
            ExitStatus::Unreachable | ExitStatus::Failed => 1,
        }
    }
}

/// The standard tool set: calculator and web search
pub fn default_tools(config: &Config) -> Result<ToolRegistry, ToolError> {
    ToolRegistry::new()
        .with(Arc::new(Calculator::new()))?
        .with(Arc::new(WebSearch::with_timeout(
            config.search_endpoint.clone(),
            config.max_search_results,
            config.search_timeout,
        )))
}

/// Run `persona` against the configured Ollama server on stdin/stdout
pub async fn launch(config: Config, persona: Persona) -> ExitStatus {
    let client = OllamaClient::new(config.base_url.clone());
    let tools = match default_tools(&config) {
        Ok(tools) => Arc::new(tools),
        Err(e) => {
            eprintln!("Error starting agent: {e}");
            return ExitStatus::Failed;
        }
    };

    let preflight = {
        let client = client.clone();
        let model = persona.model().to_string();
        let timeout = config.probe_timeout;
        async move { warn_if_model_missing(&client, &model, timeout).await }
    };

    let input = BufReader::new(tokio::io::stdin());
    let mut output = io::stdout();

    run(
        &config,
        persona,
        Arc::new(client),
        tools,
        preflight,
        input,
        &mut output,
        interrupt_signal(),
    )
    .await
}

/// Startup sequence with every collaborator injected
///
/// Prints the persona's startup notice, probes `config.base_url`, and exits
/// with [`ExitStatus::Unreachable`] before any session exists when the probe
/// fails. Otherwise runs `preflight`, builds the session and hands it to the
/// interactive loop. `interrupt` is watched from the first line printed, so
/// an interrupt during the probe or preflight also exits gracefully.
#[allow(clippy::too_many_arguments)]
pub async fn run<R, W, P, I>(
    config: &Config,
    persona: Persona,
    client: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    preflight: P,
    input: R,
    output: &mut W,
    interrupt: I,
) -> ExitStatus
where
    R: AsyncBufRead + Unpin,
    W: Write,
    P: Future<Output = ()>,
    I: Future<Output = ()>,
{
    match start(config, persona, client, tools, preflight, input, output, interrupt).await {
        Ok(status) => status,
        Err(e) => {
            warn!(error = %e, "Agent stopped on an I/O error");
            eprintln!("Error: {e}");
            ExitStatus::Failed
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn start<R, W, P, I>(
    config: &Config,
    persona: Persona,
    client: Arc<dyn ModelClient>,
    tools: Arc<ToolRegistry>,
    preflight: P,
    input: R,
    output: &mut W,
    interrupt: I,
) -> io::Result<ExitStatus>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    P: Future<Output = ()>,
    I: Future<Output = ()>,
{
    tokio::pin!(interrupt);
    let presentation = persona.presentation().clone();
    writeln!(output, "{}", presentation.startup)?;

    let reachable = tokio::select! {
        biased;
        _ = &mut interrupt => return interrupted_at_startup(output, &presentation.interrupt_farewell),
        reachable = probe(&config.base_url, config.probe_timeout) => reachable,
    };

    if !reachable {
        writeln!(output, "❌ Ollama is not running or not accessible at {}.", config.base_url)?;
        writeln!(output, "Please make sure Ollama is installed and running.")?;
        writeln!(output, "You can start it with: ollama serve")?;
        output.flush()?;
        return Ok(ExitStatus::Unreachable);
    }

    writeln!(output, "{}", presentation.ready)?;
    tokio::select! {
        biased;
        _ = &mut interrupt => return interrupted_at_startup(output, &presentation.interrupt_farewell),
        _ = preflight => {}
    }

    let mut session = Session::new(client, tools, persona, config.session_options());
    info!(
        persona = %session.persona().name(),
        model = %session.persona().model(),
        tools = ?session.tools().names(),
        "Session ready"
    );

    for line in session.persona().banner() {
        writeln!(output, "{line}")?;
    }

    let (exit, stats) = run_loop(session.persona(), &session, input, output, &mut interrupt).await?;
    output.flush()?;
    session.close();

    info!(
        ?exit,
        turns = stats.turns,
        failed_turns = stats.failed_turns,
        meta_commands = stats.meta_commands,
        totals = %metrics::summary(),
        "Session ended"
    );
    debug!(metrics = %metrics::render(), "Final metrics");

    Ok(ExitStatus::Graceful)
}

fn interrupted_at_startup<W: Write>(output: &mut W, farewell: &str) -> io::Result<ExitStatus> {
    info!("Interrupted during startup");
    writeln!(output, "{farewell}")?;
    output.flush()?;
    Ok(ExitStatus::Graceful)
}

/// Log a warning when `model` is not installed on the server
///
/// Never fails and gives up after `timeout`.
pub async fn warn_if_model_missing(client: &OllamaClient, model: &str, timeout: Duration) {
    let listed = match tokio::time::timeout(timeout, client.list_models()).await {
        Ok(listed) => listed,
        Err(_) => {
            warn!(?timeout, "Listing installed models timed out");
            return;
        }
    };
    match listed {
        Ok(models) if has_model(&models, model) => {
            info!(model, installed = models.len(), "Model available");
        }
        Ok(models) => {
            let installed: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                model,
                ?installed,
                "Model is not installed; pull it with `ollama pull {}`",
                model
            );
        }
        Err(e) => warn!(error = %e, "Could not list installed models"),
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn interrupt_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitStatus::Graceful.code(), 0);
        assert_eq!(ExitStatus::Unreachable.code(), 1);
        assert_eq!(ExitStatus::Failed.code(), 1);
    }

    #[test]
    fn test_default_tools() {
        let tools = default_tools(&Config::default()).unwrap();
        assert_eq!(tools.names(), vec!["calculator", "web_search"]);
    }
}
