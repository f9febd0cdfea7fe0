use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use graph_client::{ApiRequest, ClientConfig, GraphClient, Payload, DEFAULT_BASE_URL};
use graph_signed_request::{verify, InvalidToken};

/// graph - Query the Graph API from the command line
#[derive(Parser, Debug)]
#[command(name = "graph")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Access token sent with every request
    #[arg(long, env = "GRAPH_ACCESS_TOKEN", global = true)]
    access_token: Option<String>,

    /// API root
    #[arg(long, env = "GRAPH_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Return only the first page of paged results
    #[arg(long, global = true)]
    no_paging: bool,

    /// Retries for temporarily unavailable errors
    #[arg(long, default_value_t = 0, global = true)]
    retries: u32,

    /// Pause before each retry, in milliseconds
    #[arg(long, default_value_t = 0, global = true)]
    retry_delay_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// GET a path and print the result
    Get {
        /// Path below the API root, e.g. `me/friends`
        path: String,

        /// Query argument as key=value; may be repeated
        #[arg(short = 'q', long = "query", value_parser = parse_key_value)]
        query: Vec<(String, String)>,
    },

    /// Verify a signed request and print its claims
    Verify {
        signed_request: String,

        /// Application secret the request was signed with
        #[arg(long, env = "GRAPH_APP_SECRET", hide_env_values = true)]
        secret: String,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Graph(#[from] graph_client::Error),

    #[error("invalid signed request: {0}")]
    InvalidToken(#[from] InvalidToken),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn parse_key_value(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", arg))
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default()
            .with_base_url(self.base_url.clone())
            .with_follow_paging(!self.no_paging)
            .with_retries(self.retries, Duration::from_millis(self.retry_delay_ms));
        if let Some(token) = &self.access_token {
            config = config.with_access_token(token.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

fn render(payload: Payload) -> serde_json::Value {
    match payload {
        Payload::Json(value) => value,
        Payload::Binary {
            data,
            mime_type,
            url,
        } => json!({"mime-type": mime_type, "url": url, "bytes": data.len()}),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    match &args.command {
        Command::Get { path, query } => {
            let graph = GraphClient::new(args.client_config())?;
            let request = ApiRequest::get(path.as_str()).with_args(query.iter().cloned());
            debug!(path = %path, "fetching");
            let payload = graph.request(request)?;
            println!("{}", serde_json::to_string_pretty(&render(payload))?);
        }
        Command::Verify {
            signed_request,
            secret,
        } => {
            let claims = verify(signed_request, secret)?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pairs() {
        assert_eq!(
            parse_key_value("fields=id,name"),
            Ok(("fields".to_string(), "id,name".to_string()))
        );
        assert_eq!(
            parse_key_value("q=a=b"),
            Ok(("q".to_string(), "a=b".to_string()))
        );
        assert!(parse_key_value("novalue").is_err());
    }

    #[test]
    fn flags_map_onto_client_config() {
        let args = Args::try_parse_from([
            "graph",
            "--access-token",
            "tok",
            "--base-url",
            "http://localhost:9000",
            "--timeout",
            "5",
            "--no-paging",
            "--retries",
            "3",
            "--retry-delay-ms",
            "250",
            "get",
            "me/friends",
            "-q",
            "limit=10",
        ])
        .unwrap();

        let config = args.client_config();
        assert_eq!(config.access_token.as_deref(), Some("tok"));
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(!config.follow_paging);
        assert_eq!(config.retry.retries, 3);
        assert_eq!(config.retry.delay, Duration::from_millis(250));

        match args.command {
            Command::Get { path, query } => {
                assert_eq!(path, "me/friends");
                assert_eq!(query, vec![("limit".to_string(), "10".to_string())]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn verify_requires_secret() {
        std::env::remove_var("GRAPH_APP_SECRET");
        assert!(Args::try_parse_from(["graph", "verify", "a.b"]).is_err());
    }

    #[test]
    fn binary_payloads_render_as_summary() {
        let rendered = render(Payload::Binary {
            data: vec![0; 12],
            mime_type: "image/png".to_string(),
            url: None,
        });
        assert_eq!(
            rendered,
            json!({"mime-type": "image/png", "url": null, "bytes": 12})
        );
    }
}
