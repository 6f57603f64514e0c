mod output;
mod repl;


use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::core::bundle::CodeBundle;
use crate::core::config::load_config;
use crate::core::error::{AssistError, ValidationError};
use crate::core::message::HistoryEntry;
use crate::core::model::ModelId;
use crate::service::request::{AnalyzeRequest, EditRequest};
use crate::service::response::HealthResponse;
use crate::service::AssistService;

#[derive(Parser, Debug)]
#[command(
    name = "tinyplugin-assist",
    version,
    about = "Code-editing assistant for the TinyPlugin editor, with per-session usage accounting"
)]
pub struct Cli {
    /// Directory searched for tinyplugin-assist.json
    #[arg(short = 'c', long = "cwd", global = true)]
    working_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Model used for edits (overrides config)
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply one instruction to the given sources and print the edit as JSON
    Edit {
        /// What to change
        #[arg(short, long, required_unless_present = "request")]
        prompt: Option<String>,

        #[command(flatten)]
        sources: SourceFiles,

        /// Read a full `{history, currentHtml, currentCss, currentJs, sessionId}` request instead
        #[arg(long, conflicts_with = "prompt")]
        request: Option<PathBuf>,

        /// Session to charge
        #[arg(long)]
        session: Option<String>,
    },

    /// Extract colors and suggestions from the given sources
    Analyze {
        #[command(flatten)]
        sources: SourceFiles,

        /// Read a full `{html, css, js, sessionId}` request instead
        #[arg(long)]
        request: Option<PathBuf>,

        /// Session to charge
        #[arg(long)]
        session: Option<String>,
    },

    /// Interactive editing session
    Repl {
        #[command(flatten)]
        sources: SourceFiles,

        /// Session to charge
        #[arg(long)]
        session: Option<String>,
    },

    /// Print service information
    Health,
}

#[derive(Args, Debug, Default, Clone)]
pub struct SourceFiles {
    /// HTML source file
    #[arg(long)]
    html: Option<PathBuf>,

    /// CSS source file
    #[arg(long)]
    css: Option<PathBuf>,

    /// JavaScript source file
    #[arg(long)]
    js: Option<PathBuf>,
}

impl SourceFiles {
    /// Missing paths read as empty sources.
    fn load(&self) -> Result<CodeBundle> {
        Ok(CodeBundle {
            message: String::new(),
            html: read_optional(self.html.as_deref())?,
            css: read_optional(self.css.as_deref())?,
            js: read_optional(self.js.as_deref())?,
        })
    }
}

fn read_optional(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("reading {}", p.display())),
        None => Ok(String::new()),
    }
}

fn read_request(path: &Path) -> Result<serde_json::Value> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

pub async fn run_cli() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(cli.working_dir.clone()).map_err(|e| anyhow::anyhow!("{e}"))?;
    if let Some(model) = cli.model {
        config.edit.model = ModelId(model);
    }

    if matches!(cli.command, Command::Health) && !config.has_api_key() {
        output::print_json(&HealthResponse::from_config(&config))?;
        return Ok(ExitCode::SUCCESS);
    }

    let service = match AssistService::from_config(config) {
        Ok(service) => service,
        Err(e) => return Ok(output::report_error(&e)),
    };

    let result = match cli.command {
        Command::Edit {
            prompt,
            sources,
            request,
            session,
        } => {
            let request = match request {
                Some(path) => EditRequest::from_json(&read_request(&path)?).map(|mut req| {
                    if session.is_some() {
                        req.session_id = session;
                    }
                    req
                }),
                None => edit_from_prompt(prompt.as_deref(), sources.load()?, session),
            };
            match request {
                Ok(req) => run_edit(&service, req).await,
                Err(e) => Err(AssistError::from(e).into()),
            }
        }
        Command::Analyze {
            sources,
            request,
            session,
        } => {
            let request = match request {
                Some(path) => AnalyzeRequest::from_json(&read_request(&path)?).map(|mut req| {
                    if session.is_some() {
                        req.session_id = session;
                    }
                    req
                }),
                None => {
                    let bundle = sources.load()?;
                    Ok(AnalyzeRequest {
                        html: bundle.html,
                        css: bundle.css,
                        js: bundle.js,
                        session_id: session,
                    })
                }
            };
            match request {
                Ok(req) => run_analyze(&service, req).await,
                Err(e) => Err(AssistError::from(e).into()),
            }
        }
        Command::Repl { sources, session } => {
            return repl::run(&service, sources.load()?, session)
                .await
                .map(|()| ExitCode::SUCCESS);
        }
        Command::Health => output::print_json(&service.health()),
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast::<AssistError>() {
            Ok(assist) => Ok(output::report_error(&assist)),
            Err(other) => Err(other),
        },
    }
}

fn edit_from_prompt(
    prompt: Option<&str>,
    current: CodeBundle,
    session_id: Option<String>,
) -> Result<EditRequest, ValidationError> {
    let prompt = prompt.map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }
    Ok(EditRequest {
        history: vec![HistoryEntry::user(prompt)],
        current,
        session_id,
    })
}

async fn run_edit(service: &AssistService, req: EditRequest) -> Result<()> {
    let outcome = service
        .submit_edit(&req.history, &req.current, req.session_id.as_deref())
        .await?;
    output::print_json(&service.edit_response(&outcome))
}

async fn run_analyze(service: &AssistService, req: AnalyzeRequest) -> Result<()> {
    let outcome = service
        .analyze(&req.html, &req.css, &req.js, req.session_id.as_deref())
        .await?;
    output::print_json(&service.analyze_response(&outcome))
}
