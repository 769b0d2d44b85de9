// src/tests/pipeline_tests/extract_tests.rs
use crate::scraper::{ListingExtractor, SchemaVersion, ScraperError, SelectorSchema};
use crate::tests::utils::*;

const ADDRESS: &str = "North Sydney, NSW 2060";

fn extractor(transport: &FixtureTransport) -> ListingExtractor<FixtureTransport> {
    ListingExtractor::new(fetcher(transport), test_config()).unwrap()
}

fn search_page(body: &str) -> FixtureTransport {
    FixtureTransport::new().with_page(&search_url(ADDRESS), &page(body))
}

#[test]
fn extracts_single_legacy_result() {
    let transport = search_page(&legacy_card("$650,000", "2", "1", "1", "/property-123"));

    let listing = extractor(&transport).extract(ADDRESS).unwrap();

    assert_eq!(listing.address, ADDRESS);
    assert_eq!(listing.price_text, "$650,000");
    assert_eq!(listing.bedrooms, 2);
    assert_eq!(listing.bathrooms, 1);
    assert_eq!(listing.car_spaces, 1);
    assert_eq!(listing.detail_url, format!("{BASE}/property-123"));
    assert_eq!(listing.sale_type, "Unknown");
    assert_eq!(listing.property_type, "Apartment");
    assert_eq!(listing.schema_version, "legacy");
    assert!(listing.photos.is_empty());
    assert!(listing.inspections.is_empty());

    // legacy layout never needs the detail page
    assert_eq!(transport.requested(), vec![search_url(ADDRESS)]);
}

#[test]
fn two_results_are_rejected() {
    let card = legacy_card("$650,000", "2", "1", "1", "/property-123");
    let transport = search_page(&format!("{card}{card}"));

    match extractor(&transport).extract(ADDRESS) {
        Err(ScraperError::UnexpectedResultCount { count }) => assert_eq!(count, 2),
        other => panic!("expected UnexpectedResultCount, got {other:?}"),
    }
}

#[test]
fn page_without_results_is_unexpected_count_zero() {
    let transport = search_page("<div id=\"resultsWrapper\"></div>");

    match extractor(&transport).extract(ADDRESS) {
        Err(ScraperError::UnexpectedResultCount { count }) => assert_eq!(count, 0),
        other => panic!("expected UnexpectedResultCount, got {other:?}"),
    }
}

#[test]
fn no_match_marker_is_not_found() {
    let transport =
        search_page(r#"<div id="resultsWrapper"><p class="noMatch">No results</p></div>"#);

    let err = extractor(&transport).extract(ADDRESS).unwrap_err();
    assert!(matches!(err, ScraperError::NotFound { ref address } if address == ADDRESS));
    assert!(!err.is_retryable());
}

#[test]
fn no_exact_match_marker_is_ambiguous() {
    // the marker wins even when fuzzy suggestions are listed below it
    let body = format!(
        r#"<div id="searchResultsTbl"><div class="h1Wrapper"><span>No Exact Matches Found:</span></div></div>{}"#,
        legacy_card("$1", "1", "1", "1", "/elsewhere")
    );
    let transport = search_page(&body);

    assert!(matches!(
        extractor(&transport).extract(ADDRESS),
        Err(ScraperError::Ambiguous { .. })
    ));
}

#[test]
fn missing_price_aborts_extraction() {
    let body = r#"<div class="resultBody"><div class="vcard"><a href="/p">x</a></div></div>"#;
    let transport = search_page(body);

    match extractor(&transport).extract(ADDRESS) {
        Err(ScraperError::MissingField { field, schema }) => {
            assert_eq!(field, "price");
            assert_eq!(schema, "legacy");
        }
        other => panic!("expected MissingField, got {other:?}"),
    }
}

#[test]
fn missing_detail_link_aborts_extraction() {
    let body = r#"<div class="resultBody"><div class="propertyStats"><p class="price">$5</p></div></div>"#;
    let transport = search_page(body);

    match extractor(&transport).extract(ADDRESS) {
        Err(ScraperError::MissingField { field, .. }) => assert_eq!(field, "detail_link"),
        other => panic!("expected MissingField, got {other:?}"),
    }
}

#[test]
fn unparsable_counts_become_zero() {
    let transport = search_page(&legacy_card("$650,000", "Studio", "1", "", "/property-123"));

    let listing = extractor(&transport).extract(ADDRESS).unwrap();
    assert_eq!(listing.bedrooms, 0);
    assert_eq!(listing.bathrooms, 1);
    assert_eq!(listing.car_spaces, 0);
}

#[test]
fn decoy_price_after_the_first_is_ignored() {
    let body = r#"<div class="resultBody">
          <div class="propertyStats"><p class="price">$650,000</p><p class="type">Private Sale</p></div>
          <div class="propertyStats"><p class="price">$1</p><p class="type">Decoy</p></div>
          <div class="vcard"><a href="/property-123">x</a></div>
        </div>"#;
    let transport = search_page(body);

    let listing = extractor(&transport).extract(ADDRESS).unwrap();
    assert_eq!(listing.price_text, "$650,000");
    assert_eq!(listing.sale_type, "Private Sale");
}

#[test]
fn absolute_detail_links_are_kept() {
    let transport = search_page(&legacy_card(
        "$1",
        "1",
        "1",
        "1",
        "https://mirror.test/property-9",
    ));

    let listing = extractor(&transport).extract(ADDRESS).unwrap();
    assert_eq!(listing.detail_url, "https://mirror.test/property-9");
}

#[test]
fn current_layout_reads_property_type_from_detail_page() {
    let detail = format!("{BASE}/property-house-nsw-456");
    let transport = search_page(&current_card("$1,200,000", "/property-house-nsw-456"))
        .with_page(
            &detail,
            &page(r#"<div id="listing_info"><span class="propertyType"> House </span></div>"#),
        );

    let listing = extractor(&transport).extract(ADDRESS).unwrap();

    assert_eq!(listing.schema_version, "current");
    assert_eq!(listing.price_text, "$1,200,000");
    assert_eq!(listing.sale_type, "Auction");
    assert_eq!(listing.property_type, "House");
    assert_eq!(listing.bedrooms, 3);
    assert_eq!(listing.bathrooms, 2);
    assert_eq!(listing.car_spaces, 0);
    assert_eq!(transport.requested(), vec![search_url(ADDRESS), detail]);
}

#[test]
fn current_layout_without_property_type_is_unknown() {
    let detail = format!("{BASE}/property-456");
    let transport = search_page(&current_card("$1", "/property-456"))
        .with_page(&detail, &page("<p>nothing here</p>"));

    let listing = extractor(&transport).extract(ADDRESS).unwrap();
    assert_eq!(listing.property_type, "Unknown");
}

#[test]
fn detail_page_failure_returns_no_listing() {
    // detail page is not served
    let transport = search_page(&current_card("$1", "/property-456"));

    let err = extractor(&transport).extract(ADDRESS).unwrap_err();
    assert!(matches!(err, ScraperError::Network(_)));
    assert!(err.is_retryable());
}

#[test]
fn search_page_network_failure() {
    let transport = FixtureTransport::new();

    assert!(matches!(
        extractor(&transport).extract(ADDRESS),
        Err(ScraperError::Network(_))
    ));
}

#[test]
fn repeated_extraction_is_identical() {
    let transport = search_page(&legacy_card("$650,000", "2", "1", "1", "/property-123"));
    let extractor = extractor(&transport);

    let first = extractor.extract(ADDRESS).unwrap();
    let second = extractor.extract(ADDRESS).unwrap();
    assert_eq!(first, second);
}

#[test]
fn custom_schema_is_tried_first() {
    let custom = SelectorSchema::from_json(
        r#"{
            "version": "2031-redesign",
            "container": "section.hit",
            "no_results": { "selector": "p.zero" },
            "ambiguous": { "selector": "p.fuzzy" },
            "property_type_source": "search_result",
            "rules": [
                { "field": "price", "selector": "b.cost", "required": true },
                { "field": "bedrooms", "selector": "i.beds", "default": "0" },
                { "field": "detail_link", "selector": "a", "attr": "href", "required": true }
            ]
        }"#,
    )
    .unwrap();
    let schemas = vec![custom, SchemaVersion::Legacy.schema().unwrap()];

    let transport = search_page(
        r#"<section class="hit"><b class="cost">$9</b><i class="beds">4</i><a href="/p-1">x</a></section>"#,
    );
    let extractor = ListingExtractor::with_schemas(fetcher(&transport), test_config(), schemas);

    let listing = extractor.extract(ADDRESS).unwrap();
    assert_eq!(listing.schema_version, "2031-redesign");
    assert_eq!(listing.price_text, "$9");
    assert_eq!(listing.bedrooms, 4);
    assert_eq!(listing.sale_type, "Unknown");
    assert_eq!(listing.property_type, "Unknown");
}

#[test]
fn latin1_bytes_in_page_do_not_abort_extraction() {
    let mut body = page(&legacy_card("$650,000", "2", "1", "1", "/property-123")).into_bytes();
    let tail = body.split_off(body.len() - "</body></html>".len());
    body.extend_from_slice(b"<p>Caf\xe9 nearby</p>");
    body.extend_from_slice(&tail);

    let transport = FixtureTransport::new().with_bytes(&search_url(ADDRESS), &body);

    let listing = extractor(&transport).extract(ADDRESS).unwrap();
    assert_eq!(listing.price_text, "$650,000");
    assert_eq!(listing.bedrooms, 2);
}

#[test]
fn binary_search_page_is_parse_error() {
    let transport =
        FixtureTransport::new().with_bytes(&search_url(ADDRESS), b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR");

    let err = extractor(&transport).extract(ADDRESS).unwrap_err();
    assert!(matches!(err, ScraperError::Parse(_)));
    assert!(!err.is_retryable());
}

#[test]
fn current_layout_no_results_marker_is_not_found() {
    let transport =
        search_page(r#"<div class="search-results__no-results">Nothing matched</div>"#);

    assert!(matches!(
        extractor(&transport).extract(ADDRESS),
        Err(ScraperError::NotFound { .. })
    ));
}

#[test]
fn current_layout_ambiguous_marker() {
    let body = format!(
        r#"<h1 class="search-results__title"><span> No Exact Matches Found: </span></h1>{}"#,
        current_card("$1", "/elsewhere")
    );
    let transport = search_page(&body);

    assert!(matches!(
        extractor(&transport).extract(ADDRESS),
        Err(ScraperError::Ambiguous { .. })
    ));
}
