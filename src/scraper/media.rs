// media.rs
use crate::config::ScraperConfig;
use crate::domain::listing::{Asset, AssetKind, Listing};
use crate::scraper::fetcher::{DocumentFetcher, HttpTransport, Transport};
use crate::scraper::schema::compile;
use crate::scraper::ScraperError;
use scraper::ElementRef;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

const THUMBNAIL_SELECTOR: &str =
    "#photoViewerCont > div.thumbs div.pages > div.page > div.thumb > img";

/// `300x300`, `150x112`, ...
fn is_size_qualifier(segment: &str) -> bool {
    match segment.split_once('x') {
        Some((w, h)) => {
            !w.is_empty()
                && !h.is_empty()
                && w.bytes().all(|b| b.is_ascii_digit())
                && h.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetUrlError {
    #[error("too few path segments in {0:?}")]
    TooFewSegments(String),
}

/// Rewrites a CDN thumbnail URL into its full-resolution form.
///
/// The URL is cut on `/`. Segments 0..3 (scheme, empty, host) are kept, the
/// path segments from index 3 through the size qualifier are replaced by
/// `token`, and the remainder is kept. When no path segment looks like a size
/// qualifier, only the segment at index 3 is replaced.
pub fn resolve_asset_url(thumbnail: &str, token: &str) -> Result<String, AssetUrlError> {
    let segments: Vec<&str> = thumbnail.split('/').collect();
    if segments.len() < 5 {
        return Err(AssetUrlError::TooFewSegments(thumbnail.to_string()));
    }

    let last = segments.len() - 1;
    let cut = (3..last)
        .find(|&i| is_size_qualifier(segments[i]))
        .unwrap_or(3);

    Ok(format!(
        "{}/{}/{}",
        segments[..3].join("/"),
        token,
        segments[cut + 1..].join("/")
    ))
}

fn required_attr<'a>(node: ElementRef<'a>, index: usize, name: &str) -> Result<&'a str, ScraperError> {
    node.value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ScraperError::MalformedAsset {
            index,
            reason: format!("thumbnail has no {name}"),
        })
}

struct Pending {
    index: usize,
    kind: AssetKind,
    thumbnail_url: String,
    resolved_url: String,
}

pub struct MediaResolver<T = HttpTransport> {
    fetcher: DocumentFetcher<T>,
    config: ScraperConfig,
}

impl<T: Transport> MediaResolver<T> {
    pub fn new(fetcher: DocumentFetcher<T>, config: ScraperConfig) -> Self {
        Self { fetcher, config }
    }

    /// Downloads every photo and floor plan on the listing's detail page and
    /// appends them in document order. Stops at the first malformed node or
    /// failed download; assets before it stay appended, none after it are.
    pub fn resolve_and_fetch(&self, listing: &mut Listing) -> Result<(), ScraperError> {
        let detail_url = Url::parse(&listing.detail_url)
            .map_err(|e| ScraperError::Parse(format!("bad detail url {:?}: {e}", listing.detail_url)))?;

        let (pending, malformed) = {
            let document = self.fetcher.fetch(&detail_url)?;
            let selector = compile(THUMBNAIL_SELECTOR)?;

            let mut pending = Vec::new();
            let mut malformed = None;
            for (index, node) in document.select(&selector).enumerate() {
                match self.thumbnail(index, node, &detail_url) {
                    Ok(p) => pending.push(p),
                    Err(e) => {
                        malformed = Some(e);
                        break;
                    }
                }
            }
            (pending, malformed)
        };

        debug!(
            detail_url = %detail_url,
            assets = pending.len(),
            malformed = malformed.is_some(),
            "thumbnails collected"
        );

        let workers = self.config.download_workers.max(1);
        for batch in pending.chunks(workers) {
            for result in self.download_batch(batch) {
                listing.push_asset(result?);
            }
        }

        if let Some(err) = malformed {
            return Err(err);
        }

        info!(
            detail_url = %detail_url,
            photos = listing.photos.len(),
            floor_plans = listing.floor_plans.len(),
            "media resolved"
        );
        Ok(())
    }

    fn thumbnail(
        &self,
        index: usize,
        node: ElementRef<'_>,
        detail_url: &Url,
    ) -> Result<Pending, ScraperError> {
        let src = required_attr(node, index, "src")?;
        let data_type = required_attr(node, index, "data-type")?;

        let thumbnail_url = detail_url
            .join(src)
            .map_err(|e| ScraperError::MalformedAsset {
                index,
                reason: format!("bad src {src:?}: {e}"),
            })?
            .to_string();

        let resolved_url = resolve_asset_url(&thumbnail_url, &self.config.resolution_token)
            .map_err(|e| ScraperError::MalformedAsset {
                index,
                reason: e.to_string(),
            })?;

        Ok(Pending {
            index,
            kind: AssetKind::from_data_type(data_type),
            thumbnail_url,
            resolved_url,
        })
    }

    /// Results come back in the order of `batch`.
    fn download_batch(&self, batch: &[Pending]) -> Vec<Result<Asset, ScraperError>> {
        if batch.len() == 1 {
            return vec![self.download(&batch[0])];
        }

        std::thread::scope(|s| {
            let handles: Vec<_> = batch
                .iter()
                .map(|p| (p, s.spawn(move || self.download(p))))
                .collect();

            handles
                .into_iter()
                .map(|(p, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(ScraperError::AssetDownload {
                            url: p.resolved_url.clone(),
                            reason: "download worker panicked".to_string(),
                        })
                    })
                })
                .collect()
        })
    }

    fn download(&self, pending: &Pending) -> Result<Asset, ScraperError> {
        let download_err = |reason: String| ScraperError::AssetDownload {
            url: pending.resolved_url.clone(),
            reason,
        };

        let url = Url::parse(&pending.resolved_url).map_err(|e| ScraperError::MalformedAsset {
            index: pending.index,
            reason: e.to_string(),
        })?;

        let bytes = self
            .fetcher
            .fetch_bytes(&url)
            .map_err(|e| download_err(e.to_string()))?;

        Ok(Asset {
            kind: pending.kind,
            thumbnail_url: pending.thumbnail_url.clone(),
            resolved_url: pending.resolved_url.clone(),
            bytes: Some(bytes),
        })
    }
}
