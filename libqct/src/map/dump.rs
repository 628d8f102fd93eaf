//! Human-readable metadata dump and KML generation for the outline and
//! boundary.

use std::cmp::Ordering;
use std::fmt::Write as _;
use std::io::{self, Write};

use bon::Builder;
use chrono::DateTime;
use itertools::{Itertools, MinMaxResult};

use crate::map::QctMap;
use crate::TILE_SIZE;

/// Section selection for [`QctMap::print_metadata`].
///
/// The default prints the descriptive fields and the outline summary only.
#[derive(Builder, Default, Debug, Copy, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub struct DumpOptions {
    /// Print every non-zero palette entry
    #[builder(default)]
    pub palette: bool,
    /// Print each outline vertex, not just the extents
    #[builder(default)]
    pub outline: bool,
    /// Print the geographic coordinates of the four image corners
    #[builder(default)]
    pub corners: bool,
}

impl QctMap {
    /// Writes a diagnostic dump of the chart metadata to `out`.
    ///
    /// # Errors
    ///
    /// Fails only if writing to `out` fails.
    pub fn print_metadata(&self, out: &mut impl Write, options: &DumpOptions) -> io::Result<()> {
        let meta = self.metadata();

        writeln!(out, "Version     {}", meta.version)?;
        writeln!(
            out,
            "Width:      {} tiles ({} pixels)",
            self.width_tiles(),
            self.width_tiles() * TILE_SIZE
        )?;
        writeln!(
            out,
            "Height:     {} tiles ({} pixels)",
            self.height_tiles(),
            self.height_tiles() * TILE_SIZE
        )?;
        writeln!(out, "Title:      {}", meta.title)?;
        writeln!(out, "Name:       {}", meta.name)?;
        writeln!(out, "Identifier: {}", meta.ident)?;
        writeln!(out, "Edition:    {}", meta.edition)?;
        writeln!(out, "Revision:   {}", meta.revision)?;
        writeln!(out, "Keywords:   {}", meta.keywords)?;
        writeln!(out, "Copyright:  {}", meta.copyright)?;
        writeln!(out, "Scale:      {}", meta.scale)?;
        writeln!(out, "Datum:      {}", meta.datum)?;
        writeln!(out, "Depths:     {}", meta.depths)?;
        writeln!(out, "Heights:    {}", meta.heights)?;
        writeln!(out, "Projection: {}", meta.projection)?;
        writeln!(out, "Flags:      {:#x}", meta.flags)?;
        writeln!(out, "OriginalFileName:    {}", meta.original_file_name)?;
        writeln!(out, "OriginalFileSize     {} bytes", meta.original_file_size)?;
        let created = DateTime::from_timestamp(i64::from(meta.original_file_time), 0)
            .map(|t| t.to_rfc2822())
            .unwrap_or_default();
        writeln!(out, "OriginalFileCreation {created}")?;
        writeln!(out, "MapType:    {}", meta.map_type)?;
        writeln!(out, "DiskName:   {}", meta.disk_name)?;
        writeln!(out, "AssocData:  {}", meta.associated_data)?;
        if let Some(license) = &meta.license {
            writeln!(out, "LicIdent:   {}", license.identifier)?;
            writeln!(out, "LicDesc:    {}", license.description)?;
            writeln!(out, "LicSerial:  {}", license.serial)?;
        }
        writeln!(out, "Unknown:    {}", meta.unknown1)?;
        writeln!(out, "Unknown:    {}", meta.unknown2)?;
        writeln!(out, "Unknown:    {}", meta.unknown3)?;
        writeln!(out, "Unknown:    {}", meta.unknown4)?;

        if options.palette {
            for (index, &colour) in self.palette().iter().enumerate() {
                if colour != 0 {
                    writeln!(out, "Colour {index} = {colour:6x}")?;
                }
            }
        }

        writeln!(out, "OutlinePts: {}", self.outline_len())?;
        if options.outline {
            for &(lat, lon) in self.outline() {
                writeln!(out, " {lat:3.9} {lon:3.9}")?;
            }
        }
        write_extent(out, "OutlineLat", self.outline().iter().map(|p| p.0))?;
        write_extent(out, "OutlineLon", self.outline().iter().map(|p| p.1))?;

        let geo = &self.georef;
        writeln!(
            out,
            "GeoTopLeftLonLat:    {} {}",
            geo.longitude.c, geo.latitude.c
        )?;
        writeln!(
            out,
            "GeoTopLeftEastNorth: {} {}",
            geo.eastings.c, geo.northings.c
        )?;
        writeln!(
            out,
            "DatumShiftEastNorth: {} {}",
            geo.datum_shift_east, geo.datum_shift_north
        )?;

        if options.corners {
            let right = self.image_width().saturating_sub(1);
            let bottom = self.image_height().saturating_sub(1);
            for (label, x, y) in [
                ("TL", 0, 0),
                ("TR", right, 0),
                ("BL", 0, bottom),
                ("BR", right, bottom),
            ] {
                #[allow(clippy::cast_possible_wrap)]
                let (lat, lon) = self.xy_to_latlon(x as i32, y as i32);
                writeln!(out, "{label}  {lat}, {lon}")?;
            }
        }

        Ok(())
    }

    /// A KML document tracing the map outline as a line string.
    #[must_use]
    pub fn outline_kml(&self) -> String {
        kml_linestring("Outline", self.outline().iter().copied())
    }

    /// A KML document tracing the image boundary (the four corners at the
    /// current scale, closed).
    #[must_use]
    pub fn boundary_kml(&self) -> String {
        #[allow(clippy::cast_possible_wrap)]
        let right = self.image_width().saturating_sub(1) as i32;
        #[allow(clippy::cast_possible_wrap)]
        let bottom = self.image_height().saturating_sub(1) as i32;
        let corners = [(0, 0), (right, 0), (right, bottom), (0, bottom), (0, 0)];
        kml_linestring(
            "Boundary",
            corners.into_iter().map(|(x, y)| self.xy_to_latlon(x, y)),
        )
    }
}

fn write_extent(
    out: &mut impl Write,
    label: &str,
    values: impl Iterator<Item = f64>,
) -> io::Result<()> {
    match values.minmax_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal)) {
        MinMaxResult::NoElements => Ok(()),
        MinMaxResult::OneElement(v) => writeln!(out, "{label} {v} to {v}"),
        MinMaxResult::MinMax(min, max) => writeln!(out, "{label} {min} to {max}"),
    }
}

fn kml_linestring(name: &str, points: impl Iterator<Item = (f64, f64)>) -> String {
    let mut coordinates = String::new();
    for (lat, lon) in points {
        let _ = write!(coordinates, "{lon:.6},{lat:.6},0.000000 ");
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <kml xmlns=\"http://earth.google.com/kml/2.0\">\n\
         <Document>\n\
         <name>{name}</name>\n\
         <description>{name}</description>\n\
         <Style><LineStyle><color>ffffff00</color><width>6</width></LineStyle></Style>\n\
         <Placemark>\n\
         <name>{name}</name>\n\
         <description>{name}</description>\n\
         <LineString>\n\
         <coordinates>{coordinates}</coordinates>\n\
         </LineString>\n\
         </Placemark>\n\
         </Document>\n\
         </kml>\n"
    )
}
