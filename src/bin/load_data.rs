use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use foodgram::{
    import::{import_ingredients, import_tags, within},
    storage::Storage,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "load-data")]
#[command(about = "Import the ingredient and tag catalogs from CSV files", long_about = None)]
struct Cli {
    #[arg(short, long, help = "CSV file with name,measurement_unit rows")]
    ingredients: Option<PathBuf>,

    #[arg(short, long, help = "CSV file with name,color,slug rows")]
    tags: Option<PathBuf>,

    #[arg(
        short,
        long,
        env = "FOODGRAM_DATA_FILE",
        default_value = "foodgram.json",
        help = "Storage file to import into"
    )]
    data_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    foodgram::init_tracing();
    let cli = Cli::parse();

    if cli.ingredients.is_none() && cli.tags.is_none() {
        println!("Nothing to import. Pass --ingredients and/or --tags.");
        return Ok(());
    }

    let storage = Storage::open(&cli.data_file)?;

    if let Some(path) = cli.ingredients {
        let input = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report = storage
            .transaction(|db| within(import_ingredients(db, &input)))
            .await?;
        info!(rows = report.rows, added = report.added, "ingredients imported");
        println!(
            "✅ Ingredients: {} rows read, {} added",
            report.rows, report.added
        );
    }

    if let Some(path) = cli.tags {
        let input = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let report = storage
            .transaction(|db| within(import_tags(db, &input)))
            .await?;
        info!(rows = report.rows, added = report.added, "tags imported");
        println!("✅ Tags: {} rows read, {} added", report.rows, report.added);
    }

    Ok(())
}
