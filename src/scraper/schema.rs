// schema.rs
use crate::domain::listing::UNKNOWN;
use crate::scraper::ScraperError;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Listing fields a schema knows how to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Price,
    SaleType,
    PropertyType,
    Bedrooms,
    Bathrooms,
    CarSpaces,
    DetailLink,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Price => "price",
            Field::SaleType => "sale_type",
            Field::PropertyType => "property_type",
            Field::Bedrooms => "bedrooms",
            Field::Bathrooms => "bathrooms",
            Field::CarSpaces => "car_spaces",
            Field::DetailLink => "detail_link",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which document carries the property type for a given layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyTypeSource {
    SearchResult,
    DetailPage,
}

// ---------------------------------------------------------------------------
// Definitions (plain data, loadable from JSON)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDefinition {
    pub field: Field,
    pub selector: String,
    /// Read this attribute instead of the node text.
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl RuleDefinition {
    pub fn new(field: Field, selector: &str) -> Self {
        Self {
            field,
            selector: selector.to_string(),
            attr: None,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_attr(mut self, attr: &str) -> Self {
        self.attr = Some(attr.to_string());
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerDefinition {
    pub selector: String,
    /// When set, the first matching node must also carry exactly this text.
    #[serde(default)]
    pub text: Option<String>,
}

impl MarkerDefinition {
    pub fn new(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            text: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub version: String,
    pub container: String,
    pub no_results: MarkerDefinition,
    pub ambiguous: MarkerDefinition,
    pub property_type_source: PropertyTypeSource,
    pub rules: Vec<RuleDefinition>,
}

// ---------------------------------------------------------------------------
// Compiled schema
// ---------------------------------------------------------------------------

pub(crate) fn compile(selector: &str) -> Result<Selector, ScraperError> {
    Selector::parse(selector).map_err(|e| ScraperError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Whitespace-trimmed text content of a node.
pub(crate) fn node_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[derive(Debug, Clone)]
pub struct SelectorRule {
    pub field: Field,
    pub required: bool,
    pub default: Option<String>,
    attr: Option<String>,
    selector: Selector,
}

impl SelectorRule {
    fn compile(def: &RuleDefinition) -> Result<Self, ScraperError> {
        Ok(Self {
            field: def.field,
            required: def.required,
            default: def.default.clone(),
            attr: def.attr.clone(),
            selector: compile(&def.selector)?,
        })
    }

    /// Value of the first match. Later matches are ignored, decoys included.
    fn first_match(&self, scope: ElementRef<'_>) -> Option<String> {
        let element = scope.select(&self.selector).next()?;
        match &self.attr {
            Some(attr) => element.value().attr(attr).map(|v| v.trim().to_string()),
            None => Some(node_text(element)),
        }
    }
}

#[derive(Debug, Clone)]
struct Marker {
    selector: Selector,
    text: Option<String>,
}

impl Marker {
    fn compile(def: &MarkerDefinition) -> Result<Self, ScraperError> {
        Ok(Self {
            selector: compile(&def.selector)?,
            text: def.text.clone(),
        })
    }

    fn is_present(&self, document: &Html) -> bool {
        let Some(element) = document.select(&self.selector).next() else {
            return false;
        };
        match &self.text {
            Some(expected) => node_text(element) == *expected,
            None => true,
        }
    }
}

/// One known layout of the upstream site, with every selector compiled.
#[derive(Debug, Clone)]
pub struct SelectorSchema {
    version: String,
    container: Selector,
    no_results: Marker,
    ambiguous: Marker,
    property_type_source: PropertyTypeSource,
    rules: Vec<SelectorRule>,
}

impl SelectorSchema {
    pub fn from_definition(def: &SchemaDefinition) -> Result<Self, ScraperError> {
        let rules = def
            .rules
            .iter()
            .map(SelectorRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            version: def.version.clone(),
            container: compile(&def.container)?,
            no_results: Marker::compile(&def.no_results)?,
            ambiguous: Marker::compile(&def.ambiguous)?,
            property_type_source: def.property_type_source,
            rules,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ScraperError> {
        let def: SchemaDefinition = serde_json::from_str(json)
            .map_err(|e| ScraperError::Config(format!("invalid schema definition: {e}")))?;
        Self::from_definition(&def)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn property_type_source(&self) -> PropertyTypeSource {
        self.property_type_source
    }

    pub fn rules(&self) -> &[SelectorRule] {
        &self.rules
    }

    pub fn shows_no_results(&self, document: &Html) -> bool {
        self.no_results.is_present(document)
    }

    pub fn shows_ambiguous(&self, document: &Html) -> bool {
        self.ambiguous.is_present(document)
    }

    /// Every node matching this layout's result container.
    pub fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.container).collect()
    }

    /// Evaluates the rule for `field` inside `scope`.
    ///
    /// Matched text and attribute values are whitespace-trimmed, so they can
    /// differ from the raw node text by leading and trailing whitespace.
    ///
    /// `Ok(None)` means the field is absent and the rule has no default, or
    /// the schema has no rule for it at all.
    pub fn apply(&self, scope: ElementRef<'_>, field: Field) -> Result<Option<String>, ScraperError> {
        let Some(rule) = self.rules.iter().find(|r| r.field == field) else {
            return Ok(None);
        };

        match rule.first_match(scope) {
            Some(value) => Ok(Some(value)),
            None if rule.required => Err(ScraperError::MissingField {
                field: field.name().to_string(),
                schema: self.version.clone(),
            }),
            None => Ok(rule.default.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Built-in layouts
// ---------------------------------------------------------------------------

/// Layouts shipped with the crate, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    Current,
    Legacy,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 2] = [SchemaVersion::Current, SchemaVersion::Legacy];

    pub fn definition(self) -> SchemaDefinition {
        match self {
            SchemaVersion::Current => current_definition(),
            SchemaVersion::Legacy => legacy_definition(),
        }
    }

    pub fn schema(self) -> Result<SelectorSchema, ScraperError> {
        SelectorSchema::from_definition(&self.definition())
    }
}

fn feature_count(field: Field, list: &str, label: &str) -> RuleDefinition {
    RuleDefinition::new(field, &format!(r#"{list} > li > img[alt="{label}"] + span"#))
        .with_default("0")
}

fn current_definition() -> SchemaDefinition {
    let features = "ul.residential-card__features";

    SchemaDefinition {
        version: "current".to_string(),
        container: "article.residential-card".to_string(),
        no_results: MarkerDefinition::new("div.search-results__no-results"),
        ambiguous: MarkerDefinition::new("h1.search-results__title > span")
            .with_text("No Exact Matches Found:"),
        property_type_source: PropertyTypeSource::DetailPage,
        rules: vec![
            RuleDefinition::new(Field::Price, "span.property-price").required(),
            RuleDefinition::new(Field::SaleType, "span.residential-card__sale-type")
                .with_default(UNKNOWN),
            RuleDefinition::new(Field::PropertyType, "#listing_info span.propertyType")
                .with_default(UNKNOWN),
            feature_count(Field::Bedrooms, features, "Bedrooms"),
            feature_count(Field::Bathrooms, features, "Bathrooms"),
            feature_count(Field::CarSpaces, features, "Car Spaces"),
            RuleDefinition::new(Field::DetailLink, "a.details-link")
                .with_attr("href")
                .required(),
        ],
    }
}

fn legacy_definition() -> SchemaDefinition {
    let features = "div.listingInfo > ul.propertyFeatures";

    SchemaDefinition {
        version: "legacy".to_string(),
        container: "div.resultBody".to_string(),
        no_results: MarkerDefinition::new("#resultsWrapper > p.noMatch"),
        ambiguous: MarkerDefinition::new("#searchResultsTbl > div.h1Wrapper > span")
            .with_text("No Exact Matches Found:"),
        property_type_source: PropertyTypeSource::SearchResult,
        rules: vec![
            RuleDefinition::new(Field::Price, "div.propertyStats > p.price").required(),
            RuleDefinition::new(Field::SaleType, "div.propertyStats > p.type")
                .with_default(UNKNOWN),
            RuleDefinition::new(Field::PropertyType, "div.listingInfo > span.propertyType")
                .with_default(UNKNOWN),
            feature_count(Field::Bedrooms, features, "Bedrooms"),
            feature_count(Field::Bathrooms, features, "Bathrooms"),
            feature_count(Field::CarSpaces, features, "Car Spaces"),
            RuleDefinition::new(Field::DetailLink, "div.vcard a")
                .with_attr("href")
                .required(),
        ],
    }
}
