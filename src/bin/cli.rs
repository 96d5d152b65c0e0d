//! tagmark CLI
//!
//! Thin front end over the derivation service: dry-run analysis and
//! confirmed materialization for one scene.

use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tagmark_core::domain::DerivationPlan;
use tagmark_core::Core;

#[derive(Parser)]
#[command(
    name = "tagmark",
    version,
    about = "Derived-marker materialization over a tag ontology"
)]
struct Cli {
    /// Data directory holding config, ontology rules and the database
    #[arg(long, env = "TAGMARK_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dry-run derivation analysis for a scene
    Analyze {
        /// Scene to analyze
        scene_id: i32,
        /// Emit the full plan as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Materialize every new derivation for a scene
    Materialize {
        /// Scene to materialize
        scene_id: i32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let core = Core::open(cli.data_dir).await?;

    match cli.command {
        Commands::Analyze { scene_id, json } => {
            let plan = core.derivation().analyze_scene(scene_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print_plan(&plan);
            }
        }
        Commands::Materialize { scene_id } => {
            let summary = core.derivation().materialize_scene(scene_id).await?;
            println!(
                "Materialized {} markers from {} source markers",
                summary.markers_created, summary.sources_processed
            );
        }
    }

    Ok(())
}

fn print_plan(plan: &DerivationPlan) {
    if plan.materializable.is_empty() {
        println!("Nothing new to materialize.");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec![
            "Marker", "Tag", "Time", "New", "Total", "Derived tags",
        ]);
        for entry in &plan.materializable {
            table.add_row(vec![
                Cell::new(entry.marker_id),
                Cell::new(&entry.marker_tag),
                Cell::new(&entry.marker_time),
                Cell::new(entry.new_derivations_count),
                Cell::new(entry.total_derivations_count),
                Cell::new(entry.derived_tags.join(", ")),
            ]);
        }
        println!("{table}");
    }

    if !plan.already_materialized.is_empty() {
        println!(
            "Already materialized: {}",
            plan.already_materialized
                .iter()
                .map(|m| format!("#{} ({})", m.marker_id, m.marker_tag))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    if !plan.skipped.is_empty() {
        println!(
            "Skipped: {}",
            plan.skipped
                .iter()
                .map(|m| format!("#{} ({})", m.marker_id, m.reason))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
}
