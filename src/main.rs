use anyhow::{Context, Result};
use clap::Parser;
use listing_scraper::scraper::{SchemaVersion, SelectorSchema};
use listing_scraper::{
    DocumentFetcher, InspectionExtractor, Listing, ListingExtractor, MediaResolver, ScraperConfig,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listing_scraper")]
#[command(about = "Scrape one real-estate listing by address")]
struct Cli {
    /// Free-text address, e.g. "North Sydney, NSW 2060"
    address: String,

    /// Download photos and floor plans
    #[arg(long)]
    images: bool,

    /// Read the inspection calendar
    #[arg(long)]
    inspections: bool,

    /// Write downloaded images into this directory (implies --images)
    #[arg(long, value_name = "DIR")]
    save_images: Option<PathBuf>,

    /// Extra schema definition (JSON), tried before the built-in layouts
    #[arg(long, value_name = "FILE")]
    schema: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("listing_scraper=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ScraperConfig::from_env()?;
    let fetcher = DocumentFetcher::http(&config)?;

    let mut schemas = Vec::new();
    if let Some(path) = &cli.schema {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading schema {}", path.display()))?;
        schemas.push(SelectorSchema::from_json(&json)?);
    }
    for version in SchemaVersion::ALL {
        schemas.push(version.schema()?);
    }

    let extractor = ListingExtractor::with_schemas(fetcher.clone(), config.clone(), schemas);
    let mut listing = extractor.extract(&cli.address)?;

    if cli.images || cli.save_images.is_some() {
        MediaResolver::new(fetcher.clone(), config.clone()).resolve_and_fetch(&mut listing)?;
    }

    if cli.inspections {
        InspectionExtractor::new(fetcher).extract_inspections(&mut listing)?;
    }

    if let Some(dir) = &cli.save_images {
        save_images(&listing, dir)?;
    }

    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn save_images(listing: &Listing, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let named = listing
        .photos
        .iter()
        .enumerate()
        .map(|(i, a)| (format!("photo-{i:02}"), a))
        .chain(
            listing
                .floor_plans
                .iter()
                .enumerate()
                .map(|(i, a)| (format!("floorplan-{i:02}"), a)),
        );

    for (stem, asset) in named {
        let Some(bytes) = &asset.bytes else { continue };
        let ext = Path::new(&asset.resolved_url)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let path = dir.join(format!("{stem}.{ext}"));
        std::fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "image saved");
    }

    Ok(())
}
