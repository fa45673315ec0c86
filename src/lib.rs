//! Two-pass batch pipeline that turns a flat file of lat/lon records into an
//! ASCII density map.
//!
//! Pass 1 ([`scan::find_bounds`]) discovers the bounding box of the valid
//! data; pass 2 ([`scan::populate_grid`]) re-reads the file and counts each
//! point into a fixed-size grid; [`render::render_map`] draws the grid with
//! borders, axis labels, and a density legend. Both passes also come in
//! sharded-parallel variants whose merged output is identical to the
//! sequential one.

pub mod bounds;
pub mod config;
pub mod error;
pub mod grid;
pub mod parse;
pub mod render;
pub mod scan;

pub use bounds::Bounds;
pub use config::Config;
pub use error::{LineError, MapError};
pub use grid::DensityGrid;
pub use parse::Point;
