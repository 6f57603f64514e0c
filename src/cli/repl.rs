use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::core::bundle::CodeBundle;
use crate::core::config::CurrencyConfig;
use crate::core::error::AssistError;
use crate::core::message::HistoryEntry;
use crate::service::AssistService;

use super::output;

/// Conversation state kept between turns.
struct ReplState {
    history: Vec<HistoryEntry>,
    current: CodeBundle,
    session_id: Option<String>,
}

pub async fn run(
    service: &AssistService,
    current: CodeBundle,
    session_id: Option<String>,
) -> Result<()> {
    println!("\x1b[1mtinyplugin-assist\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
    println!("Model: \x1b[36m{}\x1b[0m", service.config().edit.model);
    println!("Type \x1b[33m/help\x1b[0m for commands, \x1b[33mCtrl-D\x1b[0m to exit.\n");

    let mut state = ReplState {
        history: Vec::new(),
        current,
        session_id,
    };

    loop {
        eprint!("\x1b[32;1medit>\x1b[0m ");
        io::stderr().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            match handle_command(input, service, &mut state).await {
                Ok(true) => continue,
                Ok(false) => break,
                Err(e) => {
                    eprintln!("\x1b[31mCommand error: {e}\x1b[0m");
                    continue;
                }
            }
        }

        submit(service, &mut state, input).await;
    }

    Ok(())
}

async fn submit(service: &AssistService, state: &mut ReplState, input: &str) {
    state.history.push(HistoryEntry::user(input));
    eprint!("\x1b[90mThinking...\x1b[0m");
    io::stderr().flush().ok();

    let result = service
        .submit_edit(&state.history, &state.current, state.session_id.as_deref())
        .await;
    eprint!("\r\x1b[K");

    match result {
        Ok(outcome) => {
            println!("{}", outcome.bundle.message);
            eprintln!(
                "\x1b[90m{}\x1b[0m",
                output::usage_line(&outcome.usage, &service.ledger().currency().code())
            );
            state
                .history
                .push(HistoryEntry::ai(outcome.bundle.message.clone()));
            state.session_id = Some(outcome.usage.session_id);
            state.current = outcome.bundle;
        }
        Err(e) => {
            // The turn is dropped so a retry does not repeat it.
            state.history.pop();
            report(&e);
        }
    }
}

fn report(err: &AssistError) {
    eprintln!("\x1b[31m{}: {err}\x1b[0m", err.kind().label());
    if err.fallback_bundle().is_some() {
        eprintln!("\x1b[90mYour code was left unchanged.\x1b[0m");
    }
}

async fn handle_command(input: &str, service: &AssistService, state: &mut ReplState) -> Result<bool> {
    let (command, arg) = match input.split_once(char::is_whitespace) {
        Some((c, rest)) => (c, rest.trim()),
        None => (input, ""),
    };

    match command {
        "/help" | "/h" => {
            println!("\x1b[1mCommands:\x1b[0m");
            println!("  /help           Show this help");
            println!("  /usage          Show token usage & cost for this session");
            println!("  /clear          Forget the conversation and its usage");
            println!("  /show           Print the current html, css and js");
            println!("  /export <path>  Write the code as one document");
            println!("  /analyze        List colors and suggestions for the current code");
            println!("  /rate <value>   Set the exchange rate");
            println!("  /exit           Exit");
            Ok(true)
        }
        "/exit" | "/quit" | "/q" => {
            println!("Goodbye!");
            Ok(false)
        }
        "/usage" | "/cost" => {
            let Some(id) = state.session_id.as_deref() else {
                println!("No usage yet.");
                return Ok(true);
            };
            match service.usage_view(id) {
                Ok(view) => output::print_json(&view)?,
                Err(e) => report(&e),
            }
            Ok(true)
        }
        "/clear" => {
            if let Some(id) = state.session_id.take() {
                service.clear_usage(&id);
            }
            state.history.clear();
            println!("Session cleared.");
            Ok(true)
        }
        "/show" => {
            let c = &state.current;
            println!("\x1b[1mHTML\x1b[0m\n{}\n", c.html);
            println!("\x1b[1mCSS\x1b[0m\n{}\n", c.css);
            println!("\x1b[1mJS\x1b[0m\n{}", c.js);
            Ok(true)
        }
        "/export" => {
            if arg.is_empty() {
                anyhow::bail!("usage: /export <path>");
            }
            std::fs::write(arg, state.current.combined_markup())
                .with_context(|| format!("writing {arg}"))?;
            println!("Wrote {arg}");
            Ok(true)
        }
        "/analyze" => {
            let c = &state.current;
            match service
                .analyze(&c.html, &c.css, &c.js, state.session_id.as_deref())
                .await
            {
                Ok(outcome) => {
                    let colors = if outcome.analysis.colors.is_empty() {
                        "(none)".to_string()
                    } else {
                        outcome.analysis.colors.join(" ")
                    };
                    println!("Colors: {colors}");
                    println!("{}", outcome.analysis.suggestions);
                    state.session_id = Some(outcome.usage.session_id);
                }
                Err(e) => report(&e),
            }
            Ok(true)
        }
        "/rate" => {
            let rate: f64 = arg
                .parse()
                .with_context(|| format!("not a number: {arg:?}"))?;
            let currency = service.ledger().currency();
            service.reload_currency(&CurrencyConfig {
                code: currency.code(),
                rate,
            })?;
            println!("Exchange rate: 1 USD = {rate} {}", currency.code());
            Ok(true)
        }
        _ => {
            eprintln!("Unknown command: {input}. Type /help for available commands.");
            Ok(true)
        }
    }
}
