use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Map, Value};

use sp_api_relay::capture::dom::{scrape_cards, CardSnapshot};
use sp_api_relay::capture::session::RecordedExchange;
use sp_api_relay::capture::{
    export_with_fallback, CaptureToggle, ExportTarget, FileTarget, ReplayInterceptor, StdoutTarget,
    ToggleOutcome,
};
use sp_api_relay::routing::OperationKind;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line companion for the SP-API relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one operation to a running relay
    Invoke(InvokeArgs),
    /// List the operation names the relay accepts
    Operations,
    /// Replay recorded media-library responses through a capture session and export the assets
    Assets {
        /// JSON array of {"url", "body"} objects
        #[arg(short, long)]
        input: PathBuf,
        /// Export file; stdout is used when writing it fails
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Extract assets from media-library card snapshots
    Scrape {
        /// JSON array of {"text", "imageSrc", "dataIds"} objects
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct InvokeArgs {
    #[arg(short, long, env = "RELAY_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Operation name, e.g. `update` or `exportGpsr`
    operation: String,

    #[arg(long, default_value = "DE")]
    marketplace: String,

    #[arg(long, env = "SPAPI_MARKETPLACE_ID", default_value = "A1PA6795UKMFR9")]
    marketplace_id: String,

    #[arg(long, env = "LWA_CLIENT_ID")]
    client_id: String,

    #[arg(long, env = "LWA_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    #[arg(long, env = "LWA_REFRESH_TOKEN", hide_env_values = true)]
    refresh_token: String,

    #[arg(long, env = "SPAPI_SELLER_ID")]
    seller_id: String,

    /// Operation payload as a JSON object
    #[arg(short, long, conflicts_with = "payload_file")]
    payload: Option<String>,

    /// File holding the operation payload
    #[arg(long)]
    payload_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Invoke(args) => invoke(args).await?,
        Commands::Operations => {
            for kind in OperationKind::ALL {
                println!("{}", kind);
            }
        }
        Commands::Assets { input, output } => {
            let exchanges: Vec<RecordedExchange> = serde_json::from_str(&std::fs::read_to_string(&input)?)?;
            let primary = primary_target(output);

            let mut toggle = CaptureToggle::new();
            toggle.toggle(|| ReplayInterceptor::new(exchanges), primary.as_ref(), &StdoutTarget)?;
            match toggle.toggle(ReplayInterceptor::default, primary.as_ref(), &StdoutTarget)? {
                ToggleOutcome::Exported { count, target } => {
                    eprintln!("Exported {} assets to {}", count, target)
                }
                _ => eprintln!("No assets captured from {}", input.display()),
            }
        }
        Commands::Scrape { input, output } => {
            let cards: Vec<CardSnapshot> = serde_json::from_str(&std::fs::read_to_string(&input)?)?;
            let records = scrape_cards(&cards);
            if records.is_empty() {
                eprintln!("No assets found in {} cards", cards.len());
                return Ok(());
            }
            let primary = primary_target(output);
            let target = export_with_fallback(&records, primary.as_ref(), &StdoutTarget)?;
            eprintln!("Extracted {} assets to {}", records.len(), target);
        }
    }

    Ok(())
}

fn primary_target(output: Option<PathBuf>) -> Box<dyn ExportTarget> {
    match output {
        Some(path) => Box::new(FileTarget::new(path)),
        None => Box::new(StdoutTarget),
    }
}

async fn invoke(args: InvokeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let payload: Value = match (&args.payload, &args.payload_file) {
        (Some(inline), _) => serde_json::from_str(inline)?,
        (None, Some(path)) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        (None, None) => Value::Object(Map::new()),
    };
    let Value::Object(payload) = payload else {
        return Err("payload must be a JSON object".into());
    };

    let mut body = Map::new();
    body.insert("operation".into(), json!(args.operation));
    body.insert("marketplace".into(), json!(args.marketplace));
    body.insert("marketplaceId".into(), json!(args.marketplace_id));
    body.insert(
        "credentials".into(),
        json!({
            "lwaClientId": args.client_id,
            "lwaClientSecret": args.client_secret,
            "refreshToken": args.refresh_token,
            "sellerId": args.seller_id,
        }),
    );
    body.extend(payload);

    let res = reqwest::Client::new().post(&args.url).json(&body).send().await?;
    let status = res.status();
    let value: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    if !status.is_success() {
        return Err(format!("relay returned status {}", status).into());
    }
    Ok(())
}
