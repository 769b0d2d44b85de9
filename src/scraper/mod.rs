mod extractor;
mod fetcher;
mod inspections;
mod media;
mod schema;
mod scraper_error;

pub use extractor::{parse_count, ListingExtractor};
pub use fetcher::{DocumentFetcher, HttpTransport, Transport};
pub use inspections::InspectionExtractor;
pub use media::{resolve_asset_url, AssetUrlError, MediaResolver};
pub use schema::{
    Field, MarkerDefinition, PropertyTypeSource, RuleDefinition, SchemaDefinition, SchemaVersion,
    SelectorRule, SelectorSchema,
};
pub use scraper_error::ScraperError;
