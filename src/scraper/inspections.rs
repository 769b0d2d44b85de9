// inspections.rs
use crate::domain::listing::{InspectionSlot, Listing};
use crate::scraper::fetcher::{DocumentFetcher, HttpTransport, Transport};
use crate::scraper::schema::{compile, node_text};
use crate::scraper::ScraperError;
use scraper::Selector;
use url::Url;

const ENTRY_SELECTOR: &str = "#inspectionTimes > a.calendar-item";
const DATE_SELECTOR: &str = "strong";
const TIME_SELECTOR: &str = "span.time";

pub struct InspectionExtractor<T = HttpTransport> {
    fetcher: DocumentFetcher<T>,
}

impl<T: Transport> InspectionExtractor<T> {
    pub fn new(fetcher: DocumentFetcher<T>) -> Self {
        Self { fetcher }
    }

    /// Appends the open-home times shown on the detail page, in page order.
    pub fn extract_inspections(&self, listing: &mut Listing) -> Result<(), ScraperError> {
        let detail_url = Url::parse(&listing.detail_url)
            .map_err(|e| ScraperError::Parse(format!("bad detail url {:?}: {e}", listing.detail_url)))?;
        let document = self.fetcher.fetch(&detail_url)?;

        let entries = compile(ENTRY_SELECTOR)?;
        let date = compile(DATE_SELECTOR)?;
        let time = compile(TIME_SELECTOR)?;

        for (index, entry) in document.select(&entries).enumerate() {
            let first_text = |selector: &Selector| {
                entry
                    .select(selector)
                    .next()
                    .map(node_text)
                    .unwrap_or_default()
            };

            let slot = InspectionSlot {
                date: first_text(&date),
                time: first_text(&time),
            };

            if slot.date.is_empty() || slot.time.is_empty() {
                return Err(ScraperError::MalformedInspection { index });
            }

            listing.inspections.push(slot);
        }

        tracing::info!(
            detail_url = %detail_url,
            inspections = listing.inspections.len(),
            "inspections extracted"
        );
        Ok(())
    }
}
