use anyhow::{Context, Result};
use clap::Parser;
use mailgate::cache::MAX_SIZE;
use mailgate::config::{GatewayConfig, ProviderSettings};
use mailgate::dispatch::Dispatcher;
use mailgate::provider::{
    BroadcastSend, ProviderKind, SendRequest, SequenceStep, TransactionalSend,
};
use std::time::{SystemTime, UNIX_EPOCH};

/// mailgate - email dispatch gateway
///
/// Sends one message through the gateway core against the configured
/// providers, for smoke-testing a deployment.
///
/// Provider endpoints and credentials are taken from the MAILGATE_*
/// environment variables (URLs can be overridden on the command line).
///
/// Examples:
///   mailgate send --app-id app --from me@x.com --to you@y.com --subject Hi --text-body Hello
#[derive(Parser, Debug)]
#[command(author, version = env!("MAILGATE_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Transactional provider base URL
    #[arg(
        long,
        env = "MAILGATE_TRANSACTIONAL_URL",
        value_name = "URL",
        global = true
    )]
    transactional_url: Option<String>,

    /// Transactional provider API key
    #[arg(
        long,
        env = "MAILGATE_TRANSACTIONAL_KEY",
        value_name = "KEY",
        hide_env_values = true,
        global = true
    )]
    transactional_key: Option<String>,

    /// Broadcast provider base URL
    #[arg(long, env = "MAILGATE_BROADCAST_URL", value_name = "URL", global = true)]
    broadcast_url: Option<String>,

    /// Broadcast provider API key
    #[arg(
        long,
        env = "MAILGATE_BROADCAST_KEY",
        value_name = "KEY",
        hide_env_values = true,
        global = true
    )]
    broadcast_key: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send one message through the gateway
    Send(SendArgs),
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// Message type: transactional or broadcast
    #[arg(long = "type", value_name = "KIND", default_value = "transactional")]
    pub message_type: String,

    /// Idempotency key (defaults to a generated one-off key)
    #[arg(long, value_name = "KEY")]
    pub idempotency_key: Option<String>,

    /// Application identifier forwarded to the provider
    #[arg(long, value_name = "ID")]
    pub app_id: String,

    /// Sender address (transactional only)
    #[arg(long, value_name = "ADDR")]
    pub from: Option<String>,

    /// Recipient address
    #[arg(long, value_name = "ADDR")]
    pub to: String,

    /// Subject line
    #[arg(long)]
    pub subject: String,

    /// Plain-text body
    #[arg(long, value_name = "TEXT")]
    pub text_body: Option<String>,

    /// HTML body (required for broadcast sends)
    #[arg(long, value_name = "HTML")]
    pub html_body: Option<String>,
}

impl SendArgs {
    fn into_request(self) -> Result<SendRequest> {
        match self.message_type.parse::<ProviderKind>()? {
            ProviderKind::Transactional => {
                let from = self
                    .from
                    .context("--from is required for transactional sends")?;
                Ok(SendRequest::Transactional(TransactionalSend {
                    app_id: self.app_id,
                    from,
                    to: self.to,
                    subject: self.subject,
                    html_body: self.html_body,
                    text_body: self.text_body,
                    ..Default::default()
                }))
            }
            ProviderKind::Broadcast => {
                let body_html = self
                    .html_body
                    .context("--html-body is required for broadcast sends")?;
                Ok(SendRequest::Broadcast(BroadcastSend {
                    app_id: self.app_id,
                    to: self.to,
                    subject: self.subject,
                    sequence: vec![SequenceStep {
                        step: 1,
                        body_html,
                        body_text: self.text_body,
                        days_since_last_step: 0,
                    }],
                    ..Default::default()
                }))
            }
        }
    }
}

fn one_off_key() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("cli-{}-{}", std::process::id(), nanos)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let config = GatewayConfig {
        transactional: ProviderSettings {
            base_url: cli
                .transactional_url
                .context("MAILGATE_TRANSACTIONAL_URL (or --transactional-url) must be set")?,
            api_key: cli
                .transactional_key
                .context("MAILGATE_TRANSACTIONAL_KEY must be set")?,
        },
        broadcast: ProviderSettings {
            base_url: cli
                .broadcast_url
                .context("MAILGATE_BROADCAST_URL (or --broadcast-url) must be set")?,
            api_key: cli
                .broadcast_key
                .context("MAILGATE_BROADCAST_KEY must be set")?,
        },
        cache_capacity: MAX_SIZE,
        cache_failures: false,
    };
    let dispatcher = Dispatcher::new(&config)?;

    match cli.command {
        Commands::Send(args) => {
            let key = args.idempotency_key.clone().unwrap_or_else(one_off_key);
            let request = args.into_request()?;
            let outcome = dispatcher.dispatch_send(&key, request).await;

            println!(
                "{} {}",
                outcome.status_code,
                serde_json::to_string_pretty(&outcome.response)?
            );
            if !outcome.response.success {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_send_parsing() {
        let cli = Cli::try_parse_from([
            "mailgate",
            "send",
            "--app-id",
            "app-1",
            "--from",
            "me@example.com",
            "--to",
            "you@example.com",
            "--subject",
            "Hi",
            "--text-body",
            "Hello",
        ])
        .unwrap();

        let Commands::Send(args) = cli.command;
        assert_eq!(args.message_type, "transactional");
        assert_eq!(args.to, "you@example.com");
        assert_eq!(args.idempotency_key, None);
    }

    #[test]
    fn test_cli_send_requires_subject() {
        let result = Cli::try_parse_from([
            "mailgate",
            "send",
            "--app-id",
            "app-1",
            "--to",
            "you@example.com",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_transactional_request_requires_from() {
        let cli = Cli::try_parse_from([
            "mailgate",
            "send",
            "--app-id",
            "app-1",
            "--to",
            "you@example.com",
            "--subject",
            "Hi",
        ])
        .unwrap();

        let Commands::Send(args) = cli.command;
        let err = args.into_request().unwrap_err();
        assert!(err.to_string().contains("--from"));
    }

    #[test]
    fn test_broadcast_request_builds_single_step_sequence() {
        let cli = Cli::try_parse_from([
            "mailgate",
            "send",
            "--type",
            "broadcast",
            "--app-id",
            "app-1",
            "--to",
            "you@example.com",
            "--subject",
            "Hi",
            "--html-body",
            "<p>Hello</p>",
        ])
        .unwrap();

        let Commands::Send(args) = cli.command;
        match args.into_request().unwrap() {
            SendRequest::Broadcast(send) => {
                assert_eq!(send.sequence.len(), 1);
                assert_eq!(send.sequence[0].body_html, "<p>Hello</p>");
                assert_eq!(send.sequence[0].days_since_last_step, 0);
            }
            SendRequest::Transactional(_) => panic!("Expected broadcast request"),
        }
    }

    #[test]
    fn test_one_off_keys_are_prefixed() {
        assert!(one_off_key().starts_with("cli-"));
    }
}
