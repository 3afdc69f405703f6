//! Domain types shared by every stage of the pipeline.

pub mod bar;

pub use bar::{PriceBar, PriceField, VolumeField};

/// Symbol type alias
pub type Symbol = String;
