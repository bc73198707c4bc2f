use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use predict_gateway::prediction::pixels;

#[derive(Parser)]
#[command(name = "predict-cli")]
#[command(about = "Client for the prediction gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway and broker health
    Health,
    /// Classify a 28x28 PNG image
    Predict {
        /// Path to the image
        image: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?;
        }
        Commands::Predict { image } => {
            let data = std::fs::read(&image)
                .map_err(|e| format!("failed to read {}: {}", image.display(), e))?;
            let input = pixels::decode_input_vector(&data)?;

            let res = client
                .post(format!("{}/predict", base))
                .json(&json!({ "image": input }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
