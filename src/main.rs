pub mod types;
pub mod config;
pub mod data;
pub mod metrics;
pub mod surface;
pub mod layers;
pub mod controls;
pub mod page;
pub mod server;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the interactive map page
    Generate {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the generated map
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate { config } => {
            println!("Generating map with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // 1. Load Data
            let visualization_data =
                data::load_visualization_data(&app_config.input.visualization_json)?;

            // 2. Derive Metrics
            let stats =
                metrics::ArrivalStats::compute(&visualization_data.bus.stops_with_arrivals);
            println!("Maximum arrivals per day: {}", stats.max_daily());

            // 3. Build Layers
            let mut page_surface = page::PageSurface::new();
            let map_state = layers::build_map(
                &mut page_surface,
                &app_config,
                &visualization_data,
                &stats,
            );

            // 4. Wire Toggles (applies the default visibility table)
            let mut page_controls = page::PageControls::new();
            controls::ToggleController::bind(
                &mut page_controls,
                &mut page_surface,
                &map_state,
                &app_config.controls,
            )?;

            // 5. Write Page
            let path = page::write_site(&app_config, &page_surface, &page_controls, &map_state)?;
            println!("Generation complete: {:?}", path);
        }
        Commands::Serve { config } => {
            println!("Serving map with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // Load data for the summary API.
            println!("Loading data for API...");
            let visualization_data =
                data::load_visualization_data(&app_config.input.visualization_json)?;
            let stats =
                metrics::ArrivalStats::compute(&visualization_data.bus.stops_with_arrivals);
            let summary = server::summarize(&visualization_data, &stats);

            server::start_server(app_config, summary).await?;
        }
    }

    Ok(())
}
