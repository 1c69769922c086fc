//! Raw tile geometry: coordinate normalization and segment extraction

mod extract;
mod normalize;

pub use extract::{
    DecodedTile, TileFeature, TileGeometry, TileLayer, extract_segments, merge_tiles,
    segments_from_pairs,
};
pub use normalize::{TileBounds, TileTransform, normalize};
