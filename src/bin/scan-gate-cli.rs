use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "scan-gate-cli")]
#[command(about = "Inspect a running scan gate", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8000")]
    url: String,

    /// Admin bearer token, if the gate requires one.
    #[arg(short, long)]
    key: Option<String>,

    /// Query on behalf of this client address (sent as X-Forwarded-For).
    #[arg(long)]
    client: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the caller's remaining quota
    Status,
    /// Service health with rate limit summary
    Health,
    /// Limiter statistics (admin)
    Stats,
    /// Limiter health (admin)
    AdminHealth,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }
    if let Some(ip) = &cli.client {
        headers.insert("x-forwarded-for", HeaderValue::from_str(ip)?);
    }

    let path = match cli.command {
        Commands::Status => "/api/ratelimit",
        Commands::Health => "/api/health",
        Commands::Stats => "/api/admin/ratelimit/stats",
        Commands::AdminHealth => "/api/admin/health",
    };

    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gate returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
