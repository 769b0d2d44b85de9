// extractor.rs
use crate::config::ScraperConfig;
use crate::domain::listing::{Listing, UNKNOWN};
use crate::scraper::fetcher::{DocumentFetcher, HttpTransport, Transport};
use crate::scraper::schema::{Field, PropertyTypeSource, SchemaVersion, SelectorSchema};
use crate::scraper::ScraperError;
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

/// Room counts degrade to 0 when the text is not a non-negative integer.
pub fn parse_count(text: &str) -> u32 {
    text.trim().parse().unwrap_or(0)
}

pub struct ListingExtractor<T = HttpTransport> {
    fetcher: DocumentFetcher<T>,
    config: ScraperConfig,
    schemas: Vec<SelectorSchema>,
}

impl<T: Transport> ListingExtractor<T> {
    /// Uses the built-in layouts, newest first.
    pub fn new(fetcher: DocumentFetcher<T>, config: ScraperConfig) -> Result<Self, ScraperError> {
        let schemas = SchemaVersion::ALL
            .iter()
            .map(|v| v.schema())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::with_schemas(fetcher, config, schemas))
    }

    /// `schemas` are tried in order; put the newest layout first.
    pub fn with_schemas(
        fetcher: DocumentFetcher<T>,
        config: ScraperConfig,
        schemas: Vec<SelectorSchema>,
    ) -> Self {
        Self {
            fetcher,
            config,
            schemas,
        }
    }

    pub fn extract(&self, address: &str) -> Result<Listing, ScraperError> {
        let search_url = self.config.search_url(address)?;
        info!(address, url = %search_url, "searching");

        let document = self.fetcher.fetch(&search_url)?;
        let mut listing = Listing::new(address);

        let (schema, result) = self.locate_result(&document, address)?;
        debug!(address, schema = schema.version(), "result card located");
        listing.schema_version = schema.version().to_string();

        listing.price_text = required(schema, result, Field::Price)?;
        listing.sale_type = text_or_unknown(schema, result, Field::SaleType)?;
        listing.bedrooms = count(schema, result, Field::Bedrooms)?;
        listing.bathrooms = count(schema, result, Field::Bathrooms)?;
        listing.car_spaces = count(schema, result, Field::CarSpaces)?;

        let href = required(schema, result, Field::DetailLink)?;
        let detail_url = self.config.resolve_link(&href)?;
        listing.detail_url = detail_url.to_string();

        listing.property_type = match schema.property_type_source() {
            PropertyTypeSource::SearchResult => {
                text_or_unknown(schema, result, Field::PropertyType)?
            }
            PropertyTypeSource::DetailPage => {
                let detail = self.fetcher.fetch(&detail_url)?;
                text_or_unknown(schema, detail.root_element(), Field::PropertyType)?
            }
        };

        info!(
            address,
            schema = schema.version(),
            detail_url = listing.detail_url.as_str(),
            "listing extracted"
        );

        Ok(listing)
    }

    /// Checks the page-level markers, then picks the first layout whose
    /// result container is present and insists on exactly one result.
    fn locate_result<'d>(
        &self,
        document: &'d Html,
        address: &str,
    ) -> Result<(&SelectorSchema, ElementRef<'d>), ScraperError> {
        if self.schemas.iter().any(|s| s.shows_no_results(document)) {
            return Err(ScraperError::NotFound {
                address: address.to_string(),
            });
        }

        if self.schemas.iter().any(|s| s.shows_ambiguous(document)) {
            return Err(ScraperError::Ambiguous {
                address: address.to_string(),
            });
        }

        for schema in &self.schemas {
            let containers = schema.containers(document);
            match containers.as_slice() {
                [] => continue,
                [only] => return Ok((schema, *only)),
                many => {
                    warn!(address, count = many.len(), "more than one result");
                    return Err(ScraperError::UnexpectedResultCount { count: many.len() });
                }
            }
        }

        Err(ScraperError::UnexpectedResultCount { count: 0 })
    }
}

fn required(schema: &SelectorSchema, scope: ElementRef<'_>, field: Field) -> Result<String, ScraperError> {
    schema
        .apply(scope, field)?
        .ok_or_else(|| ScraperError::MissingField {
            field: field.name().to_string(),
            schema: schema.version().to_string(),
        })
}

fn text_or_unknown(
    schema: &SelectorSchema,
    scope: ElementRef<'_>,
    field: Field,
) -> Result<String, ScraperError> {
    Ok(schema
        .apply(scope, field)?
        .unwrap_or_else(|| UNKNOWN.to_string()))
}

fn count(schema: &SelectorSchema, scope: ElementRef<'_>, field: Field) -> Result<u32, ScraperError> {
    Ok(schema.apply(scope, field)?.map_or(0, |t| parse_count(&t)))
}
