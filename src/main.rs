//! `chatbot-service` — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config (file, then env overrides)
//!   3. Init logger at the configured level
//!   4. Build the provider registry
//!   5. Run the requested command
//!
//! # Usage
//!
//! ```text
//! chatbot-service [--config <path>] [command]
//!
//! Commands:
//!   status                    print provider availability as JSON (default)
//!   ask [flags] <message...>  send one message through the dispatcher
//!   watch                     run the health checker until Ctrl-C
//!
//! Ask flags:
//!   --provider <name>         override the profile's provider
//!   --temperature <t>         override the profile's temperature
//!   --max-tokens <n>          override the profile's max_tokens
//! ```

use std::process;
use std::sync::Arc;

use chatbot_service::bootstrap::logger;
use chatbot_service::core::config;
use chatbot_service::llm::{ChatMessage, Profile, ProviderRegistry};
use chatbot_service::subsystems::llm::LlmSubsystem;
use chatbot_service::supervisor::health::HealthRegistry;
use chatbot_service::AppError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

// ── CLI arg parsing ────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Command {
    Status,
    Watch,
    Ask {
        provider: Option<String>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
        message: String,
    },
}

#[derive(Debug, PartialEq)]
struct Args {
    config: Option<String>,
    command: Command,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args, String> {
    let mut config = None;
    let mut command = None;
    let mut provider = None;
    let mut temperature = None;
    let mut max_tokens = None;
    let mut words = Vec::new();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config = Some(iter.next().ok_or("--config needs a path")?);
            }
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--provider" | "-p" => {
                provider = Some(iter.next().ok_or("--provider needs a name")?);
            }
            "--temperature" | "-t" => {
                let raw = iter.next().ok_or("--temperature needs a value")?;
                temperature = Some(Profile::parse_temperature(&raw).map_err(|e| e.to_string())?);
            }
            "--max-tokens" | "-m" => {
                let raw = iter.next().ok_or("--max-tokens needs a value")?;
                max_tokens = Some(
                    raw.parse::<u32>()
                        .map_err(|_| format!("invalid max tokens '{raw}'"))?,
                );
            }
            "--" => {
                words.extend(iter.by_ref());
                break;
            }
            _ if command.is_none() => command = Some(arg),
            _ => words.push(arg),
        }
    }

    let command = match command.as_deref() {
        None | Some("status") => Command::Status,
        Some("watch") => Command::Watch,
        Some("ask") => {
            if words.is_empty() {
                return Err("usage: chatbot-service ask [flags] <message...>".into());
            }
            Command::Ask { provider, temperature, max_tokens, message: words.join(" ") }
        }
        Some(other) => {
            return Err(format!(
                "unknown command: {other}\n  run 'chatbot-service --help' for usage"
            ));
        }
    };

    Ok(Args { config, command })
}

fn print_help() {
    eprintln!("usage: chatbot-service [--config <path>] [command]");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  status                    print provider availability as JSON (default)");
    eprintln!("  ask [flags] <message...>  send one message through the dispatcher");
    eprintln!("  watch                     run the health checker until Ctrl-C");
    eprintln!();
    eprintln!("ask flags:");
    eprintln!("  --provider,    -p <name>  override the profile's provider");
    eprintln!("  --temperature, -t <t>     override the profile's temperature");
    eprintln!("  --max-tokens,  -m <n>     override the profile's max_tokens");
    eprintln!();
    eprintln!("flags:");
    eprintln!("  --config, -c <path>       config file (default: config/default.toml)");
    eprintln!("  --help,   -h              print this help");
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = run(args).await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let config = config::load(args.config.as_deref())?;

    logger::init(
        &config.service.log_level,
        false,
        config.service.log_file.as_deref(),
    )?;

    info!(
        service = %config.service.name,
        environment = %config.service.environment,
        default_provider = %config.llm.default_provider,
        "config loaded"
    );

    let registry = Arc::new(ProviderRegistry::from_config(&config.llm));
    debug!(providers = ?registry.names().collect::<Vec<_>>(), "registry built");
    let llm = LlmSubsystem::new(Arc::clone(&registry));

    match args.command {
        Command::Status => {
            let status = llm.status(&config.service).await;
            let json = serde_json::to_string_pretty(&status)
                .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
            println!("{json}");
        }

        Command::Ask { provider, temperature, max_tokens, message } => {
            let mut profile = config.profile.clone();
            if let Some(name) = provider {
                profile.provider_name = name;
            }
            let response = registry
                .resolve_and_generate(vec![ChatMessage::user(message)], &profile, temperature, max_tokens)
                .await?;
            info!(
                provider = %response.provider,
                model = response.model.as_deref().unwrap_or("-"),
                tokens_used = response.tokens_used,
                response_time = response.response_time,
                "reply received"
            );
            println!("{}", response.content);
        }

        Command::Watch => {
            let health = HealthRegistry::new();
            let llm = llm.with_health_registry(health.clone());
            let shutdown = CancellationToken::new();
            let checker = llm.spawn_health_checker(config.llm.health_check_interval, shutdown.clone());

            let mut ticker = tokio::time::interval(config.llm.health_check_interval);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    _ = ticker.tick() => {
                        let (up, reported) = health.summary().await;
                        println!("{up}/{reported} providers up");
                        for h in health.snapshot().await {
                            let state = if h.up { "up" } else { "down" };
                            println!("  {:<16} {state:<5} {}", h.provider, h.message);
                        }
                    }
                }
            }

            info!("shutdown requested");
            shutdown.cancel();
            if let Some(handle) = checker {
                LlmSubsystem::join_health_checker(handle).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, String> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_command_means_status() {
        let a = args(&[]).unwrap();
        assert_eq!(a.command, Command::Status);
        assert!(a.config.is_none());
    }

    #[test]
    fn ask_collects_flags_and_message() {
        let a = args(&[
            "--config", "cfg.toml", "ask", "--provider", "dummy", "-t", "0.2", "--max-tokens", "50",
            "hello", "there",
        ])
        .unwrap();
        assert_eq!(a.config.as_deref(), Some("cfg.toml"));
        assert_eq!(
            a.command,
            Command::Ask {
                provider: Some("dummy".into()),
                temperature: Some(0.2),
                max_tokens: Some(50),
                message: "hello there".into(),
            }
        );
    }

    #[test]
    fn double_dash_keeps_flag_like_words() {
        let a = args(&["ask", "--", "--provider", "is", "a", "flag"]).unwrap();
        match a.command {
            Command::Ask { provider, message, .. } => {
                assert!(provider.is_none());
                assert_eq!(message, "--provider is a flag");
            }
            other => panic!("expected ask, got {other:?}"),
        }
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(args(&["ask"]).is_err());
        assert!(args(&["ask", "-t", "hot", "hi"]).is_err());
        assert!(args(&["ask", "-m", "-1", "hi"]).is_err());
        assert!(args(&["--config"]).is_err());
        assert!(args(&["launch"]).unwrap_err().contains("unknown command"));
    }
}
