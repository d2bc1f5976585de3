//! Corvid process entry point: parse configuration, wire the relay
//! transport and chat handler together, and run the supervised ingestion
//! loop until it stops or gives up.

use std::{process::ExitCode, sync::Arc};

use {
    clap::Parser,
    secrecy::SecretString,
    tracing::error,
    tracing_subscriber::EnvFilter,
};

use {
    corvid_chat::{ChatHandler, DEFAULT_OPENAI_BASE_URL, DEFAULT_SYSTEM_PROMPT, OpenAiGenerator},
    corvid_client::{Dispatcher, HistoryPolicy, RelayTransport, SessionConfig, supervise},
};

/// Reconnect attempts before a transient failure becomes fatal.
const DEFAULT_MAX_RETRIES: u32 = 5;

#[derive(Parser)]
#[command(name = "corvid", about = "Chat-reply bot for the Corvid messaging network")]
struct Cli {
    /// Messaging network environment (production or dev).
    #[arg(long, env = "CORVID_ENV", default_value = "production")]
    env: String,

    /// Hex-encoded signing key. Without one a fresh ephemeral identity is
    /// generated on every start and prior conversations are lost.
    #[arg(long, env = "CORVID_KEY", hide_env_values = true)]
    key: Option<String>,

    /// Override the relay URL implied by --env.
    #[arg(long, env = "CORVID_RELAY_URL")]
    relay_url: Option<String>,

    /// Reconnect attempts before a connect or stream failure becomes fatal.
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// API key for the generation backend.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// Base URL of the OpenAI-compatible generation backend.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_OPENAI_BASE_URL)]
    openai_base_url: String,

    /// Model requested from the generation backend.
    #[arg(long, env = "CORVID_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// System prompt for the chat handler.
    #[arg(long, default_value = DEFAULT_SYSTEM_PROMPT)]
    system_prompt: String,

    /// What to do with a message whose history fetch fails.
    #[arg(long, value_enum, default_value = "use-empty")]
    history_policy: HistoryPolicyArg,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum HistoryPolicyArg {
    /// Dispatch with an empty history window.
    UseEmpty,
    /// Drop the message.
    Skip,
}

impl From<HistoryPolicyArg> for HistoryPolicy {
    fn from(value: HistoryPolicyArg) -> Self {
        match value {
            HistoryPolicyArg::UseEmpty => Self::UseEmpty,
            HistoryPolicyArg::Skip => Self::Skip,
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    if cli.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut transport = RelayTransport::new();
    if let Some(url) = &cli.relay_url {
        transport = transport.with_relay_url(url.clone());
    }

    let generator = OpenAiGenerator::new(
        SecretString::new(cli.openai_api_key.clone()),
        &cli.model,
    )
    .with_base_url(&cli.openai_base_url);
    let handler =
        ChatHandler::new(Arc::new(generator)).with_system_prompt(&cli.system_prompt);
    let dispatcher = Dispatcher::new(Arc::new(handler));

    let config = SessionConfig {
        signing_key: cli.key.clone().map(SecretString::new),
        env: cli.env.clone(),
    };

    match supervise(
        &transport,
        &config,
        &dispatcher,
        cli.history_policy.into(),
        cli.max_retries,
    )
    .await
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(fatal) => {
            error!(error = %fatal, "supervisor gave up");
            ExitCode::FAILURE
        },
    }
}
