#![allow(clippy::module_name_repetitions)]

pub(crate) mod dump;
pub(crate) mod georef;
pub(crate) mod header;
pub(crate) mod raster;
pub(crate) mod tile;

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::geometry::point_in_polygon;
use crate::map::header::{read_file_contents, Metadata};
use crate::map::raster::Raster;
use crate::map::tile::TILE_PIXELS;
use crate::{Error, TILE_SIZE};

pub(crate) const fn pal_red(colour: u32) -> u8 {
    ((colour >> 16) & 255) as u8
}

pub(crate) const fn pal_green(colour: u32) -> u8 {
    ((colour >> 8) & 255) as u8
}

pub(crate) const fn pal_blue(colour: u32) -> u8 {
    (colour & 255) as u8
}

/// A QuickChart map.
///
/// Opening a file loads all metadata (descriptive fields, palette,
/// geo-referencing, outline, tile index); the pixels themselves are decoded
/// on demand by [`load_image`](Self::load_image) and can be released again
/// with [`unload_image`](Self::unload_image), so a map can be re-decoded at
/// a different scale without re-reading its metadata. The underlying file
/// stays open until the map is dropped.
#[derive(Debug)]
pub struct QctMap {
    file: BufReader<File>,
    width_tiles: u32,
    height_tiles: u32,
    scale_factor: u32,
    palette: [u32; 256],
    interp: Box<[[u8; 128]; 128]>,
    metadata: Metadata,
    outline: Vec<(f64, f64)>,
    tile_index: Vec<u32>,
    georef: georef::Georef,
    raster: Option<Raster>,
}

impl QctMap {
    /// Opens a chart and loads its metadata, without decoding any pixels.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::BadMagic`] if the file is not a QCT file, and
    /// [`Error::Truncated`] if it ends in the middle of a metadata field.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut file = BufReader::new(File::open(path)?);
        let contents = read_file_contents(&mut file)?;
        info!(
            "opened '{}', {} x {} tiles",
            contents.metadata.title, contents.width_tiles, contents.height_tiles
        );
        Ok(Self {
            file,
            width_tiles: contents.width_tiles,
            height_tiles: contents.height_tiles,
            scale_factor: 1,
            palette: contents.palette,
            interp: contents.interp,
            metadata: contents.metadata,
            outline: contents.outline,
            tile_index: contents.tile_index,
            georef: contents.georef,
            raster: None,
        })
    }

    /// Opens a chart and decodes its image at full detail.
    ///
    /// # Errors
    ///
    /// See [`Self::open`] and [`Self::load_image`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut map = Self::open(path)?;
        map.load_image(1)?;
        Ok(map)
    }

    /// Decodes the image, down-sampled by `scale` in both directions.
    ///
    /// Any previously decoded image is replaced. Tiles that cannot be
    /// decoded (reserved packing mode, malformed prefix table, truncated
    /// data, a zero index entry) are left as palette index 0 and decoding
    /// carries on; the format has no checksums and a partial chart beats
    /// none.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedScale`] unless `scale` divides the
    /// tile size, and [`Error::Allocation`] if the image buffer cannot be
    /// allocated.
    pub fn load_image(&mut self, scale: u32) -> Result<(), Error> {
        if scale == 0 || TILE_SIZE % scale != 0 {
            return Err(Error::UnsupportedScale(scale));
        }
        self.scale_factor = scale;
        self.raster = None;

        let mut raster = Raster::empty(
            self.width_tiles * TILE_SIZE / scale,
            self.height_tiles * TILE_SIZE / scale,
        )?;
        debug!(
            "decoding {} x {} pixels at scale {scale}",
            raster.width(),
            raster.height()
        );

        let mut scratch = [0u8; TILE_PIXELS];
        for tile_y in 0..self.height_tiles {
            for tile_x in 0..self.width_tiles {
                let offset = self.tile_index[(tile_y * self.width_tiles + tile_x) as usize];
                if offset == 0 {
                    debug!("tile {tile_x}, {tile_y} has no data, leaving it blank");
                    continue;
                }
                self.file.seek(SeekFrom::Start(u64::from(offset)))?;
                scratch.fill(0);
                match tile::decode(&mut self.file, &mut scratch) {
                    Ok(_) => {
                        tile::blit(&mut raster, &scratch, tile_x, tile_y, scale, &self.interp);
                    }
                    Err(e) => warn!("tile {tile_x}, {tile_y} left blank: {e}"),
                }
            }
        }

        self.raster = Some(raster);
        Ok(())
    }

    /// Releases the decoded image. Metadata, palette and tile index remain
    /// loaded, so [`load_image`](Self::load_image) can be called again with
    /// a different scale.
    pub fn unload_image(&mut self) {
        self.raster = None;
    }

    /// Width of the map in tiles
    #[must_use]
    pub const fn width_tiles(&self) -> u32 {
        self.width_tiles
    }

    /// Height of the map in tiles
    #[must_use]
    pub const fn height_tiles(&self) -> u32 {
        self.height_tiles
    }

    /// The scale factor of the most recent [`load_image`](Self::load_image)
    #[must_use]
    pub const fn scale_factor(&self) -> u32 {
        self.scale_factor
    }

    /// Image width in pixels at the current scale
    #[must_use]
    pub const fn image_width(&self) -> u32 {
        self.width_tiles * TILE_SIZE / self.scale_factor
    }

    /// Image height in pixels at the current scale
    #[must_use]
    pub const fn image_height(&self) -> u32 {
        self.height_tiles * TILE_SIZE / self.scale_factor
    }

    /// The decoded image, one palette index per byte in row-major order, or
    /// [`None`] before [`load_image`](Self::load_image)
    #[must_use]
    pub fn image(&self) -> Option<&[u8]> {
        self.raster.as_ref().map(Raster::pixel_indices)
    }

    /// The raw 256-entry palette, RGB packed with blue in the low byte
    #[must_use]
    pub const fn palette(&self) -> &[u32; 256] {
        &self.palette
    }

    /// `(R, G, B)` for a palette index.
    ///
    /// Chart colours live in the lower half of the palette; this getter
    /// answers only for indices `0..=127`. The upper half is reachable
    /// through [`palette`](Self::palette).
    #[must_use]
    pub fn colour(&self, index: usize) -> Option<(u8, u8, u8)> {
        if index > 127 {
            return None;
        }
        let colour = self.palette[index];
        Some((pal_red(colour), pal_green(colour), pal_blue(colour)))
    }

    /// Returns an iterator over the palette colours the decoded pixel
    /// indexes correspond to, or [`None`] before
    /// [`load_image`](Self::load_image).
    #[must_use]
    pub fn rgb_pixels(&self) -> Option<impl Iterator<Item = [u8; 3]> + '_> {
        let raster = self.raster.as_ref()?;
        Some(raster.pixel_indices().iter().map(|&p| {
            let colour = self.palette[p as usize];
            [pal_red(colour), pal_green(colour), pal_blue(colour)]
        }))
    }

    /// Descriptive metadata
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Chart title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// Chart name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Chart identifier
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.metadata.ident
    }

    /// Projection name
    #[must_use]
    pub fn projection(&self) -> &str {
        &self.metadata.projection
    }

    /// Map outline vertices as `(lat, lon)` pairs, implicitly closed
    #[must_use]
    pub fn outline(&self) -> &[(f64, f64)] {
        &self.outline
    }

    /// Number of outline vertices
    #[must_use]
    pub fn outline_len(&self) -> usize {
        self.outline.len()
    }

    /// A single outline vertex as `(lat, lon)`
    #[must_use]
    pub fn outline_point(&self, index: usize) -> Option<(f64, f64)> {
        self.outline.get(index).copied()
    }

    /// Converts pixel coordinates (at the current scale, from the top-left
    /// corner) to WGS84 `(lat, lon)` in degrees.
    ///
    /// Out-of-range inputs are clipped to the image rather than
    /// extrapolated; y may reach one row past the bottom edge.
    #[must_use]
    pub fn xy_to_latlon(&self, x: i32, y: i32) -> (f64, f64) {
        let full_width = i64::from(self.width_tiles) * i64::from(TILE_SIZE);
        let full_height = i64::from(self.height_tiles) * i64::from(TILE_SIZE);
        let scale = i64::from(self.scale_factor);
        #[allow(clippy::cast_precision_loss)]
        let x = (i64::from(x) * scale).clamp(0, (full_width - 1).max(0)) as f64;
        #[allow(clippy::cast_precision_loss)]
        let y = (i64::from(y) * scale).clamp(0, full_height) as f64;
        self.georef.forward(x, y)
    }

    /// Converts WGS84 `(lat, lon)` in degrees to pixel coordinates at the
    /// current scale, rounded to the nearest pixel.
    ///
    /// Latitudes are clipped to `[-90, 90]`; longitudes outside
    /// `[-360, 360]` collapse to 0. The result is not clipped to the image.
    #[must_use]
    pub fn latlon_to_xy(&self, lat: f64, lon: f64) -> (i32, i32) {
        let (x, y) = self.georef.inverse(lat, lon);
        let scale = i64::from(self.scale_factor);
        let to_pixel = |v: f64| {
            #[allow(clippy::cast_possible_truncation)]
            let rounded = v.round() as i64;
            (rounded / scale).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
        };
        (to_pixel(x), to_pixel(y))
    }

    /// Longitude degrees spanned by one pixel, measured along the vertical
    /// midline of the image at the current scale.
    #[must_use]
    pub fn degrees_per_pixel(&self) -> f64 {
        if self.width_tiles < 1 || self.height_tiles < 1 {
            return 0.0;
        }
        let width = self.image_width();
        #[allow(clippy::cast_possible_wrap)]
        let mid = (self.image_height() / 2) as i32;
        let (_, lon_left) = self.xy_to_latlon(0, mid);
        #[allow(clippy::cast_possible_wrap)]
        let (_, lon_right) = self.xy_to_latlon(width as i32 - 1, mid);
        (lon_right - lon_left).abs() / f64::from(width)
    }

    /// Whether `(lat, lon)` falls inside the map outline polygon.
    ///
    /// Always `false` when the outline has fewer than three vertices.
    #[must_use]
    pub fn coord_inside_map(&self, lat: f64, lon: f64) -> bool {
        if self.outline.len() < 3 {
            return false;
        }
        // Millidegree grid shifted positive, as the polygon test wants
        // unsigned integers
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let to_grid = |lat: f64, lon: f64| (((lon + 180.0) * 1e3) as u32, ((lat + 90.0) * 1e3) as u32);
        let polygon: Vec<(u32, u32)> = self
            .outline
            .iter()
            .map(|&(lat, lon)| to_grid(lat, lon))
            .collect();
        let (x, y) = to_grid(lat, lon);
        point_in_polygon(&polygon, x, y)
    }
}
