use clap::{Arg, ArgAction, Command};
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use translate_relay::translate::{MockMode, MockTranslator};
use translate_relay::{Completion, Pipeline, RelayConfig, RelayResult, server};

/// Exit status asking the host to run the invocation again (EX_TEMPFAIL)
const EXIT_RETRY: u8 = 75;

fn cli() -> Command {
    Command::new("translate-relay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Relays chat events through a translation provider to Slack")
        .subcommand_required(true)
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .global(true)
                .help("Use the mock translator instead of the configured provider")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("serve").about("Run the webhook server").arg(
                Arg::new("bind")
                    .long("bind")
                    .short('b')
                    .help("Address to listen on")
                    .default_value("127.0.0.1:3000"),
            ),
        )
        .subcommand(
            Command::new("invoke")
                .about("Process one trigger payload read from a file or stdin")
                .arg(
                    Arg::new("file")
                        .help("JSON trigger payload (default: stdin)")
                        .index(1),
                ),
        )
}

/// Exit status for a finished `invoke`; 75 asks the host to retry
fn exit_status(result: &RelayResult<Completion>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(e) if e.is_retryable() => EXIT_RETRY,
        Err(_) => 1,
    }
}

fn build_pipeline(config: &RelayConfig, use_mock: bool) -> Result<Pipeline, Box<dyn std::error::Error>> {
    if use_mock {
        return Ok(Pipeline::new(
            config,
            Arc::new(MockTranslator::new(MockMode::Suffix)),
            reqwest::Client::new(),
        ));
    }
    Ok(Pipeline::from_config(config)?)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let use_mock = matches.get_flag("mock");

    let config = RelayConfig::from_env()?;
    let pipeline = build_pipeline(&config, use_mock)?;
    info!(provider = pipeline.provider_name(), "Relay configured");

    match matches.subcommand() {
        Some(("serve", args)) => {
            let bind: SocketAddr = args
                .get_one::<String>("bind")
                .map(String::as_str)
                .unwrap_or("127.0.0.1:3000")
                .parse()?;
            let app = server::router(Arc::new(pipeline));
            let listener = tokio::net::TcpListener::bind(bind).await?;
            info!("Server running at http://{}", bind);
            axum::serve(listener, app).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some(("invoke", args)) => {
            let raw = match args.get_one::<String>("file") {
                Some(path) => tokio::fs::read_to_string(path).await?,
                None => {
                    let mut buffer = String::new();
                    tokio::io::stdin().read_to_string(&mut buffer).await?;
                    buffer
                }
            };
            let event: serde_json::Value = serde_json::from_str(&raw)?;

            let result = pipeline.handle(event).await;
            match &result {
                Ok(Completion::Response(response)) => {
                    println!("{}", serde_json::to_string_pretty(response)?);
                }
                Ok(Completion::Acknowledged(outcome)) => {
                    info!(?outcome, "Queue message consumed");
                }
                Err(e) if e.is_retryable() => {
                    error!(error = %e, "Invocation failed, retry requested");
                }
                Err(e) => {
                    error!(error = %e, "Invocation failed");
                }
            }
            Ok(ExitCode::from(exit_status(&result)))
        }
        _ => Ok(ExitCode::FAILURE),
    }
}
