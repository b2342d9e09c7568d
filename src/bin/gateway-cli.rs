use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use endpoint_gateway::config::load_config;
use endpoint_gateway::{ApiConfigRequest, GatewayController};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Inspect a gateway configuration's routes and API descriptor")]
struct Cli {
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List mounted routes and the endpoint behind each method
    Routes,
    /// Print the client-facing API descriptor
    Describe {
        /// Wrapper key for the endpoint tree
        #[arg(short, long)]
        setting: Option<String>,

        /// Mount route placeholder value, as name=value
        #[arg(short, long = "placeholder", value_parser = parse_placeholder)]
        placeholders: Vec<(String, String)>,
    },
    /// Print the resolved options and upstream declaration
    Options,
}

fn parse_placeholder(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got `{raw}`"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let controller = GatewayController::from_source(
        &config,
        &config.gateway.setting,
        config.gateway.mount.clone(),
        &config.gateway.options,
    )?;

    match cli.command {
        Commands::Routes => {
            for route in controller.routes() {
                for registered in &route.methods {
                    println!(
                        "{:<8} {}{} -> {}",
                        registered.method.as_str().to_uppercase(),
                        controller.mount_route().trim_end_matches('/'),
                        route.route,
                        registered.endpoint.name
                    );
                }
            }
        }
        Commands::Describe { setting, placeholders } => {
            let descriptor = controller.api_config(ApiConfigRequest {
                setting,
                placeholders: placeholders.into_iter().collect::<HashMap<_, _>>(),
            });
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Commands::Options => {
            let snapshot = json!({
                "mount": controller.mount_route(),
                "options": controller.options(),
                "gateway": controller.gateway_config(),
            });
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
