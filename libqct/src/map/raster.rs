use crate::Error;

/// Decoded indexed-colour raster, one palette index per byte, row-major.
#[derive(Debug, Eq, PartialEq)]
pub(crate) struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// Allocates a zero-filled raster. Index 0 is what unreachable tiles
    /// show through as, so no separate clear pass is needed.
    pub(crate) fn empty(width: u32, height: u32) -> Result<Self, Error> {
        let len = width as usize * height as usize;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| Error::Allocation { bytes: len })?;
        pixels.resize(len, 0);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub(crate) const fn width(&self) -> u32 {
        self.width
    }

    pub(crate) const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the pixel indexes of the image
    pub(crate) fn pixel_indices(&self) -> &[u8] {
        &self.pixels
    }

    // get an entire row of the raster
    pub(crate) fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        if y < self.height {
            let start = y as usize * self.width as usize;
            let end = start + self.width as usize;
            Some(&mut self.pixels[start..end])
        } else {
            None
        }
    }
}
