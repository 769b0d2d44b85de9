pub mod listing;

pub use listing::{Asset, AssetKind, InspectionSlot, Listing};
