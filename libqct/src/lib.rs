//! # libqct
//!
//!
//! This library provides read support for the QuickChart (QCT) file format, a
//! proprietary tiled, paletted, geo-referenced raster format used for
//! navigational charts.
//!
//! A QCT file carries an 8-bit indexed image split into 64×64 pixel tiles,
//! each tile compressed with one of three schemes, together with a 256-entry
//! RGB palette, descriptive metadata, a map outline polygon in geographic
//! coordinates, and two bivariate cubic polynomials that convert between
//! pixel and (latitude, longitude) coordinates.
//!
//! ### History
//!
//! The format has never been openly published by its vendor. This
//! implementation follows the community reconstruction circulated as
//! `The_Quick_Chart_File_Format_Specification_1.01`, cross-checked against
//! real chart files. Fields the reconstruction leaves unidentified are read
//! and surfaced verbatim (see [`Metadata`]).
//!
//! ### Limitations
//!
//! Only reading is supported; there is no QCT encoder. Tiles packed with the
//! undocumented mode byte `128` (believed to be an encrypted variant) are
//! skipped and left blank. Geo-referencing is limited to the polynomial
//! transform plus constant datum shift stored in the file — no ellipsoid math
//! or re-projection is attempted.
//!
//! ### Usage
//!
//! Decode a chart and save it as a PNG:
//!
//! ```no_run
//! use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};
//! use libqct::QctMap;
//!
//! fn main() -> anyhow::Result<()> {
//!     let map = QctMap::from_file("chart.qct")?;
//!
//!     let rgb: Vec<u8> = map.rgb_pixels().expect("image is loaded").flatten().collect();
//!
//!     let output = std::fs::File::create("chart.png")?;
//!     let encoder = PngEncoder::new(output);
//!     encoder.write_image(
//!         &rgb,
//!         map.image_width(),
//!         map.image_height(),
//!         ExtendedColorType::Rgb8,
//!     )?;
//!     Ok(())
//! }
//! ```
//!
//! Query metadata and geo-referencing without decoding any pixels:
//!
//! ```no_run
//! use libqct::QctMap;
//!
//! fn main() -> anyhow::Result<()> {
//!     let map = QctMap::open("chart.qct")?;
//!     println!("{} ({})", map.title(), map.projection());
//!     let (lat, lon) = map.xy_to_latlon(0, 0);
//!     println!("top-left corner is at {lat}, {lon}");
//!     Ok(())
//! }
//! ```
//!

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

mod error;
mod geometry;
/// Module containing the map object and its decoders
pub mod map;
mod reader;

pub use error::Error;
pub use map::dump::DumpOptions;
pub use map::header::{License, Metadata};
pub use map::QctMap;

/// First four bytes of every QCT file (stored little-endian on disk).
pub const QCT_MAGIC: u32 = 0x1423_D5FF;
/// Tiles are always 64×64 pixels.
pub const TILE_SIZE: u32 = 64;
