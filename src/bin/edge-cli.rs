use std::path::PathBuf;

use axum::body::Bytes;
use axum::http::{header, Request};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use edge_router::config::load_config;
use edge_router::routing::resolver::ConfigDocument;
use edge_router::routing::{classify, DeviceClass, Decision, EdgeRouter};

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Diagnostics for the edge router", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the device class for a User-Agent string
    Classify {
        user_agent: String,
    },
    /// Fetch and print a configuration document (e.g. https://app.example/api/data)
    Hosts {
        url: String,
    },
    /// Show the routing decision for a GET request
    Route {
        #[arg(short, long)]
        config: PathBuf,

        /// Absolute request URL, e.g. https://app.example/
        #[arg(short, long)]
        url: String,

        #[arg(short = 'a', long)]
        user_agent: Option<String>,
    },
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// GET a configuration document. A non-2xx answer is an error.
async fn fetch_document(client: &reqwest::Client, url: &str) -> CliResult<Bytes> {
    let res = client.get(url).send().await?;
    let status = res.status();
    if !status.is_success() {
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Err(format!("configuration service returned status {}", status).into());
    }
    Ok(res.bytes().await?)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { user_agent } => {
            println!("{}", classify(Some(&user_agent)));
        }
        Commands::Hosts { url } => {
            let body = fetch_document(&reqwest::Client::new(), &url).await?;
            let json: Value = serde_json::from_slice(&body)?;
            println!("{}", serde_json::to_string_pretty(&json)?);

            let doc = ConfigDocument::from_slice(&body)?;
            for device in [DeviceClass::Mobile, DeviceClass::Desktop] {
                match doc.host_for(device) {
                    Ok(host) => println!("{:>8} -> {}", device, host),
                    Err(e) => println!("{:>8} -> error: {}", device, e),
                }
            }
        }
        Commands::Route { config, url, user_agent } => {
            let config = load_config(&config)?;
            let router = EdgeRouter::from_config(&config)?;

            let mut builder = Request::get(&url);
            if let Some(ua) = &user_agent {
                builder = builder.header(header::USER_AGENT, ua);
            }
            let (parts, _) = builder.body(())?.into_parts();

            let device = classify(user_agent.as_deref());
            let decision = router.decide(&parts).await;
            let forwarder = router.forwarder();
            let report = match &decision {
                Decision::Rewrite { site, host, .. } => json!({
                    "decision": decision.label(),
                    "site": site,
                    "device": device,
                    "target": forwarder.rewritten_url(&parts, host)?.as_str(),
                }),
                Decision::PassThrough(reason) => json!({
                    "decision": decision.label(),
                    "reason": format!("{:?}", reason),
                    "device": device,
                    "target": forwarder.original_url(&parts)?.as_str(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
