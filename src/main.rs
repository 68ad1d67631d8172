use rust_silverpop_api::{catalog, ApiError, Args, Config, SilverpopClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "usage: rust-silverpop-api <operation> [json-object-args]";

/// Invokes one catalog operation and prints the normalized response as JSON.
///
/// `rust-silverpop-api get_lists '{"visibility": "1", "list_type": "2"}'`
///
/// Run without arguments to list the available operations.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_silverpop_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut cli_args = std::env::args().skip(1);
    let Some(operation) = cli_args.next() else {
        eprintln!("{}", USAGE);
        eprintln!("operations:");
        for op in catalog::OPERATIONS {
            eprintln!("  {} ({})", op.name, op.arguments().collect::<Vec<_>>().join(", "));
        }
        std::process::exit(2);
    };

    let args = match cli_args.next() {
        Some(raw) => {
            let json: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("arguments must be a JSON object: {}", e))?;
            Args::try_from(json).map_err(anyhow::Error::msg)?
        }
        None => Args::new(),
    };

    let config = Config::from_env()?;
    let client = SilverpopClient::from_config(&config)?;

    match client.call(&operation, args).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(ApiError::Fault(fault)) => {
            eprintln!("{} rejected: {}", operation, fault);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
