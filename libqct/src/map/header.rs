//! The fixed-layout header, the offset-scattered metadata records, and the
//! remaining per-map tables (georef coefficients, palette, interpolation
//! matrix, tile index).
//!
//! Field order is rigid and every string or sub-record is reached through a
//! 32-bit absolute offset; reading one always restores the stream to just
//! after the offset field.

use std::io::{Read, Seek};

use tracing::{debug, trace};

use crate::map::georef::{CubicPoly, Georef};
use crate::reader::{read_f64_le, read_string, read_u32_le, with_position};
use crate::{Error, QCT_MAGIC};

/// Descriptive fields of a chart.
///
/// Strings are empty rather than absent when the file carries no value. The
/// `unknown*` words are carried verbatim for diagnostics; their meaning has
/// not been identified.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Metadata {
    /// Format version word
    pub version: u32,
    /// Chart title
    pub title: String,
    /// Chart (product) name
    pub name: String,
    /// Chart identifier
    pub ident: String,
    /// Edition
    pub edition: String,
    /// Revision
    pub revision: String,
    /// Search keywords
    pub keywords: String,
    /// Copyright statement
    pub copyright: String,
    /// Display scale, as text (e.g. `1:50000`)
    pub scale: String,
    /// Geodetic datum name
    pub datum: String,
    /// Depth units
    pub depths: String,
    /// Height units
    pub heights: String,
    /// Projection name
    pub projection: String,
    /// Flags word
    pub flags: u32,
    /// Name of the file the chart was created from
    pub original_file_name: String,
    /// Size in bytes of the file the chart was created from
    pub original_file_size: u32,
    /// Creation time of the source file, seconds since the Unix epoch
    pub original_file_time: u32,
    /// Map type (e.g. `Land`, `Marine`)
    pub map_type: String,
    /// Name of the distribution disk
    pub disk_name: String,
    /// Associated data string
    pub associated_data: String,
    /// License record, when present
    pub license: Option<License>,
    /// Unidentified word following the original-file creation time
    pub unknown1: u32,
    /// First unidentified word of the extended block
    pub unknown2: u32,
    /// Second unidentified word of the extended block
    pub unknown3: u32,
    /// Unidentified word following the associated-data string
    pub unknown4: u32,
}

/// License record of a chart.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct License {
    /// Numeric license identifier
    pub identifier: u32,
    /// Human-readable license description
    pub description: String,
    /// Serial number, 0 when the serial sub-record is absent
    pub serial: u32,
}

/// Everything the metadata pass reads; the image itself is decoded
/// separately, tile by tile, through the index.
pub(crate) struct FileContents {
    pub(crate) width_tiles: u32,
    pub(crate) height_tiles: u32,
    pub(crate) metadata: Metadata,
    pub(crate) outline: Vec<(f64, f64)>,
    pub(crate) georef: Georef,
    pub(crate) palette: [u32; 256],
    pub(crate) interp: Box<[[u8; 128]; 128]>,
    pub(crate) tile_index: Vec<u32>,
}

pub(crate) fn read_file_contents(r: &mut (impl Read + Seek)) -> Result<FileContents, Error> {
    let magic = read_u32_le(r)?;
    if magic != QCT_MAGIC {
        return Err(Error::BadMagic { found: magic });
    }

    let mut meta = Metadata {
        version: read_u32_le(r)?,
        ..Metadata::default()
    };
    let width_tiles = read_u32_le(r)?;
    let height_tiles = read_u32_le(r)?;
    debug!(
        "version {}, {width_tiles} x {height_tiles} tiles",
        meta.version
    );

    meta.title = read_string(r)?;
    meta.name = read_string(r)?;
    meta.ident = read_string(r)?;
    meta.edition = read_string(r)?;
    meta.revision = read_string(r)?;
    meta.keywords = read_string(r)?;
    meta.copyright = read_string(r)?;
    meta.scale = read_string(r)?;
    meta.datum = read_string(r)?;
    meta.depths = read_string(r)?;
    meta.heights = read_string(r)?;
    meta.projection = read_string(r)?;
    meta.flags = read_u32_le(r)?;
    meta.original_file_name = read_string(r)?;
    meta.original_file_size = read_u32_le(r)?;
    meta.original_file_time = read_u32_le(r)?;
    meta.unknown1 = read_u32_le(r)?;

    // Extended metadata lives behind its own offset, and the datum shift
    // behind another one inside it
    let mut datum_shift_north = 0.0;
    let mut datum_shift_east = 0.0;
    let extended = read_u32_le(r)?;
    with_position(r, u64::from(extended), |r| {
        meta.map_type = read_string(r)?;
        let shift = read_u32_le(r)?;
        (datum_shift_north, datum_shift_east) = with_position(r, u64::from(shift), |r| {
            Ok((read_f64_le(r)?, read_f64_le(r)?))
        })?;
        meta.disk_name = read_string(r)?;
        meta.unknown2 = read_u32_le(r)?;
        meta.unknown3 = read_u32_le(r)?;
        let license = read_u32_le(r)?;
        if license != 0 {
            meta.license = Some(with_position(r, u64::from(license), |r| read_license(r))?);
        }
        meta.associated_data = read_string(r)?;
        meta.unknown4 = read_u32_le(r)?;
        Ok(())
    })?;

    let num_outline = read_u32_le(r)? as usize;
    let outline_offset = read_u32_le(r)?;
    let outline = if num_outline == 0 {
        Vec::new()
    } else {
        with_position(r, u64::from(outline_offset), |r| {
            // No pre-allocation from the declared count: a lying header
            // should run into Truncated, not exhaust memory
            let mut points = Vec::new();
            for _ in 0..num_outline {
                let lat = read_f64_le(r)?;
                let lon = read_f64_le(r)?;
                points.push((lat, lon));
            }
            Ok(points)
        })?
    };
    trace!("outline of {} points", outline.len());

    let georef = Georef {
        eastings: CubicPoly::read_y_major(r)?,
        northings: CubicPoly::read_y_major(r)?,
        latitude: CubicPoly::read_x_major(r)?,
        longitude: CubicPoly::read_x_major(r)?,
        datum_shift_east,
        datum_shift_north,
    };

    let mut palette = [0u32; 256];
    for entry in &mut palette {
        *entry = read_u32_le(r)?;
    }

    let mut interp = Box::new([[0u8; 128]; 128]);
    for row in interp.iter_mut() {
        r.read_exact(row).map_err(Error::from_read)?;
    }

    let tiles = width_tiles as usize * height_tiles as usize;
    let mut tile_index = Vec::new();
    for _ in 0..tiles {
        tile_index.push(read_u32_le(r)?);
    }
    debug!("tile index of {tiles} entries loaded");

    Ok(FileContents {
        width_tiles,
        height_tiles,
        metadata: meta,
        outline,
        georef,
        palette,
        interp,
        tile_index,
    })
}

fn read_license(r: &mut (impl Read + Seek)) -> Result<License, Error> {
    let identifier = read_u32_le(r)?;
    let _ = read_u32_le(r)?;
    let _ = read_u32_le(r)?;
    let description = read_string(r)?;
    let serial_offset = read_u32_le(r)?;
    let serial = if serial_offset == 0 {
        0
    } else {
        with_position(r, u64::from(serial_offset), |r| read_u32_le(r))?
    };
    let _ = read_u32_le(r)?;
    Ok(License {
        identifier,
        description,
        serial,
    })
}
