//! Extracts real-estate listing records from the search and detail pages of
//! a listings site that offers no API.
//!
//! [`ListingExtractor`] finds exactly one listing for a free-text address.
//! [`MediaResolver`] and [`InspectionExtractor`] are optional enrichments run
//! against the listing's detail page afterwards.

pub mod config;
pub mod domain;
pub mod scraper;

pub use config::ScraperConfig;
pub use domain::{Asset, AssetKind, InspectionSlot, Listing};
pub use crate::scraper::{
    DocumentFetcher, InspectionExtractor, ListingExtractor, MediaResolver, ScraperError,
};
