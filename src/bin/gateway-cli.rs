use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Client for the request sequence gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Bearer token sent with every request.
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the gateway answers
    Ping,
    /// Manage feature toggles
    Features {
        #[command(subcommand)]
        command: FeatureCommands,
    },
}

#[derive(Subcommand)]
enum FeatureCommands {
    /// List all features
    List {
        /// Only features with this enabled state
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Show one feature
    Get { key: String },
    /// Create a feature
    Create {
        key: String,
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        enabled: bool,
    },
    /// Delete a feature
    Delete { key: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }
    let client = reqwest::Client::builder().default_headers(headers).build()?;
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Ping => client.get(format!("{}/ping", base)).send().await?,
        Commands::Features { command } => match command {
            FeatureCommands::List { enabled } => {
                let mut req = client.get(format!("{}/features", base));
                if let Some(enabled) = enabled {
                    req = req.query(&[("enabled", enabled)]);
                }
                req.send().await?
            }
            FeatureCommands::Get { key } => {
                client.get(format!("{}/features/{}", base, key)).send().await?
            }
            FeatureCommands::Create {
                key,
                name,
                description,
                enabled,
            } => {
                client
                    .post(format!("{}/features", base))
                    .json(&json!({
                        "key": key,
                        "name": name,
                        "description": description,
                        "enabled": enabled,
                    }))
                    .send()
                    .await?
            }
            FeatureCommands::Delete { key } => {
                client.delete(format!("{}/features/{}", base, key)).send().await?
            }
        },
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }
    if text.is_empty() {
        println!("{}", status);
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
