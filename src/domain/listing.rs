use serde::{Serialize, Serializer};

/// Sentinel used for text fields the document does not carry.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    // Caller supplied, never rewritten
    pub address: String,

    pub price_text: String,
    pub sale_type: String,
    pub property_type: String,

    pub bedrooms: u32,
    pub bathrooms: u32,
    pub car_spaces: u32,

    /// Absolute URL of the listing's own page.
    pub detail_url: String,

    /// Name of the schema version that matched the search results page.
    pub schema_version: String,

    pub photos: Vec<Asset>,
    pub floor_plans: Vec<Asset>,
    pub inspections: Vec<InspectionSlot>,
}

impl Listing {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            price_text: String::new(),
            sale_type: UNKNOWN.to_string(),
            property_type: UNKNOWN.to_string(),
            bedrooms: 0,
            bathrooms: 0,
            car_spaces: 0,
            detail_url: String::new(),
            schema_version: String::new(),
            photos: Vec::new(),
            floor_plans: Vec::new(),
            inspections: Vec::new(),
        }
    }

    pub(crate) fn push_asset(&mut self, asset: Asset) {
        match asset.kind {
            AssetKind::FloorPlan => self.floor_plans.push(asset),
            AssetKind::Photo => self.photos.push(asset),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Photo,
    FloorPlan,
}

impl AssetKind {
    /// Maps the `data-type` attribute of a thumbnail node.
    pub fn from_data_type(data_type: &str) -> Self {
        if data_type.trim().eq_ignore_ascii_case("floorplan") {
            AssetKind::FloorPlan
        } else {
            AssetKind::Photo
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub kind: AssetKind,
    pub thumbnail_url: String,
    pub resolved_url: String,

    #[serde(rename = "byte_len", serialize_with = "serialize_len")]
    pub bytes: Option<Vec<u8>>,
}

fn serialize_len<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => s.serialize_some(&b.len()),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectionSlot {
    pub date: String,
    pub time: String,
}
