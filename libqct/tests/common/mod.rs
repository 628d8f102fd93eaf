//! Builds complete synthetic QCT byte streams for the integration tests.
//!
//! The fixed region is laid out exactly as a reader walks it (header words,
//! string offsets, georef doubles, palette, interpolation matrix, tile
//! index); strings, sub-records, the outline and tile payloads are appended
//! behind it with absolute offsets patched into the fixed region.

#![allow(dead_code)]

use mktemp::Temp;

pub const QCT_MAGIC: u32 = 0x1423_D5FF;
pub const TILE_SIZE: usize = 64;
pub const TILE_PIXELS: usize = TILE_SIZE * TILE_SIZE;

/// The stream order of tile rows: stream row `k` is image row `ROW_SEQ[k]`.
pub const ROW_SEQ: [usize; TILE_SIZE] = [
    0, 32, 16, 48, 8, 40, 24, 56, 4, 36, 20, 52, 12, 44, 28, 60, 2, 34, 18, 50, 10, 42, 26, 58, 6,
    38, 22, 54, 14, 46, 30, 62, 1, 33, 17, 49, 9, 41, 25, 57, 5, 37, 21, 53, 13, 45, 29, 61, 3,
    35, 19, 51, 11, 43, 27, 59, 7, 39, 23, 55, 15, 47, 31, 63,
];

pub struct QctFixture {
    pub width_tiles: u32,
    pub height_tiles: u32,
    pub version: u32,
    pub title: String,
    pub name: String,
    pub ident: String,
    pub edition: String,
    pub revision: String,
    pub keywords: String,
    pub copyright: String,
    pub scale_text: String,
    pub datum: String,
    pub depths: String,
    pub heights: String,
    pub projection: String,
    pub flags: u32,
    pub original_file_name: String,
    pub original_file_size: u32,
    pub original_file_time: u32,
    pub map_type: String,
    pub disk_name: String,
    pub associated_data: String,
    /// (identifier, description, serial)
    pub license: Option<(u32, String, u32)>,
    pub unknowns: [u32; 4],
    /// (north, east) in degrees
    pub datum_shift: (f64, f64),
    /// (lat, lon) pairs
    pub outline: Vec<(f64, f64)>,
    /// eas/nor blocks in their wire (y-major) coefficient order
    pub eas: [f64; 10],
    pub nor: [f64; 10],
    /// lat/lon blocks in their wire (x-major) coefficient order
    pub lat: [f64; 10],
    pub lon: [f64; 10],
    pub palette: [u32; 256],
    /// 128 × 128 row-major bytes
    pub interp: Vec<u8>,
    /// Row-major tile payloads; `None` writes a zero index entry
    pub tiles: Vec<Option<Vec<u8>>>,
}

impl Default for QctFixture {
    fn default() -> Self {
        let mut palette = [0u32; 256];
        for (i, entry) in palette.iter_mut().enumerate() {
            let i = i as u32;
            *entry = (i << 16) | (i << 8) | i;
        }
        Self {
            width_tiles: 1,
            height_tiles: 1,
            version: 4,
            title: String::new(),
            name: String::new(),
            ident: String::new(),
            edition: String::new(),
            revision: String::new(),
            keywords: String::new(),
            copyright: String::new(),
            scale_text: String::new(),
            datum: String::new(),
            depths: String::new(),
            heights: String::new(),
            projection: String::new(),
            flags: 0,
            original_file_name: String::new(),
            original_file_size: 0,
            original_file_time: 0,
            map_type: String::new(),
            disk_name: String::new(),
            associated_data: String::new(),
            license: None,
            unknowns: [0; 4],
            datum_shift: (0.0, 0.0),
            outline: Vec::new(),
            eas: [0.0; 10],
            nor: [0.0; 10],
            lat: [0.0; 10],
            lon: [0.0; 10],
            palette,
            interp: interp_keep_left(),
            tiles: vec![None],
        }
    }
}

impl QctFixture {
    pub fn to_bytes(&self) -> Vec<u8> {
        let tile_count = (self.width_tiles * self.height_tiles) as usize;
        assert_eq!(self.tiles.len(), tile_count, "one payload slot per tile");
        assert_eq!(self.interp.len(), 128 * 128);

        // Fixed region: 96 header bytes, 320 of georef, 1024 of palette,
        // 16384 of interpolation matrix, then the tile index.
        let base = 17_824 + 4 * tile_count as u32;
        let mut tail: Vec<u8> = Vec::new();

        let datum_offset = base + tail.len() as u32;
        tail.extend(self.datum_shift.0.to_le_bytes());
        tail.extend(self.datum_shift.1.to_le_bytes());

        let license_offset = match &self.license {
            None => 0,
            Some((identifier, description, serial)) => {
                let serial_offset = base + tail.len() as u32;
                tail.extend(serial.to_le_bytes());
                let description_offset = push_string(&mut tail, base, description);
                let offset = base + tail.len() as u32;
                tail.extend(identifier.to_le_bytes());
                tail.extend(0u32.to_le_bytes());
                tail.extend(0u32.to_le_bytes());
                tail.extend(description_offset.to_le_bytes());
                tail.extend(serial_offset.to_le_bytes());
                tail.extend(0u32.to_le_bytes());
                offset
            }
        };

        let map_type_offset = push_string(&mut tail, base, &self.map_type);
        let disk_name_offset = push_string(&mut tail, base, &self.disk_name);
        let associated_offset = push_string(&mut tail, base, &self.associated_data);
        let extended_offset = base + tail.len() as u32;
        tail.extend(map_type_offset.to_le_bytes());
        tail.extend(datum_offset.to_le_bytes());
        tail.extend(disk_name_offset.to_le_bytes());
        tail.extend(self.unknowns[1].to_le_bytes());
        tail.extend(self.unknowns[2].to_le_bytes());
        tail.extend(license_offset.to_le_bytes());
        tail.extend(associated_offset.to_le_bytes());
        tail.extend(self.unknowns[3].to_le_bytes());

        let outline_offset = if self.outline.is_empty() {
            0
        } else {
            let offset = base + tail.len() as u32;
            for &(lat, lon) in &self.outline {
                tail.extend(lat.to_le_bytes());
                tail.extend(lon.to_le_bytes());
            }
            offset
        };

        let string_offsets: Vec<u32> = [
            &self.title,
            &self.name,
            &self.ident,
            &self.edition,
            &self.revision,
            &self.keywords,
            &self.copyright,
            &self.scale_text,
            &self.datum,
            &self.depths,
            &self.heights,
            &self.projection,
        ]
        .into_iter()
        .map(|s| push_string(&mut tail, base, s))
        .collect();
        let original_file_offset = push_string(&mut tail, base, &self.original_file_name);

        let tile_offsets: Vec<u32> = self
            .tiles
            .iter()
            .map(|payload| match payload {
                None => 0,
                Some(data) => {
                    let offset = base + tail.len() as u32;
                    tail.extend_from_slice(data);
                    offset
                }
            })
            .collect();

        let mut out = Vec::with_capacity(base as usize + tail.len());
        out.extend(QCT_MAGIC.to_le_bytes());
        out.extend(self.version.to_le_bytes());
        out.extend(self.width_tiles.to_le_bytes());
        out.extend(self.height_tiles.to_le_bytes());
        for offset in string_offsets {
            out.extend(offset.to_le_bytes());
        }
        out.extend(self.flags.to_le_bytes());
        out.extend(original_file_offset.to_le_bytes());
        out.extend(self.original_file_size.to_le_bytes());
        out.extend(self.original_file_time.to_le_bytes());
        out.extend(self.unknowns[0].to_le_bytes());
        out.extend(extended_offset.to_le_bytes());
        out.extend((self.outline.len() as u32).to_le_bytes());
        out.extend(outline_offset.to_le_bytes());
        assert_eq!(out.len(), 96);

        for block in [&self.eas, &self.nor, &self.lat, &self.lon] {
            for coefficient in block {
                out.extend(coefficient.to_le_bytes());
            }
        }
        for colour in &self.palette {
            out.extend(colour.to_le_bytes());
        }
        out.extend_from_slice(&self.interp);
        assert_eq!(out.len(), 17_824);
        for offset in &tile_offsets {
            out.extend(offset.to_le_bytes());
        }
        assert_eq!(out.len(), base as usize);

        out.extend_from_slice(&tail);
        out
    }

    pub fn write_temp(&self) -> anyhow::Result<Temp> {
        let tmp = Temp::new_file()?;
        std::fs::write(&tmp, self.to_bytes())?;
        Ok(tmp)
    }
}

fn push_string(tail: &mut Vec<u8>, base: u32, s: &str) -> u32 {
    if s.is_empty() {
        return 0;
    }
    let offset = base + tail.len() as u32;
    tail.extend_from_slice(s.as_bytes());
    tail.push(0);
    offset
}

/// `interp[a][b] == a`: down-sampling keeps the leftmost pixel.
pub fn interp_keep_left() -> Vec<u8> {
    let mut matrix = vec![0u8; 128 * 128];
    for (row, chunk) in matrix.chunks_exact_mut(128).enumerate() {
        chunk.fill(row as u8);
    }
    matrix
}

/// `interp[a][b] == b`: down-sampling keeps the rightmost pixel.
pub fn interp_keep_right() -> Vec<u8> {
    let mut matrix = vec![0u8; 128 * 128];
    for chunk in matrix.chunks_exact_mut(128) {
        for (column, cell) in chunk.iter_mut().enumerate() {
            *cell = column as u8;
        }
    }
    matrix
}

pub fn bits_per_pixel(colours: u8) -> u32 {
    match colours {
        0..=2 => 1,
        3..=4 => 2,
        5..=8 => 3,
        9..=16 => 4,
        17..=32 => 5,
        33..=64 => 6,
        _ => 7,
    }
}

/// A prefix-coded tile whose table is a single leaf: solid colour, no bit
/// stream.
pub fn solid_tile(colour: u8) -> Vec<u8> {
    vec![0, colour]
}

/// A bit-packed tile. `pixels` are sub-palette indices, one per pixel.
pub fn bit_packed_tile(sub_palette: &[u8], pixels: &[u8]) -> Vec<u8> {
    assert_eq!(pixels.len(), TILE_PIXELS);
    assert!(sub_palette.len() >= 2 && sub_palette.len() <= 127);
    let bits = bits_per_pixel(sub_palette.len() as u8);
    let pixels_per_word = (32 / bits) as usize;

    let mut out = vec![(256 - sub_palette.len()) as u8];
    out.extend_from_slice(sub_palette);
    for chunk in pixels.chunks(pixels_per_word) {
        let mut word = 0u32;
        for (i, &pixel) in chunk.iter().enumerate() {
            assert!((pixel as usize) < sub_palette.len());
            word |= u32::from(pixel) << (i as u32 * bits);
        }
        out.extend(word.to_le_bytes());
    }
    out
}

/// An RLE tile from (sub-palette index, run length) pairs.
pub fn rle_tile(sub_palette: &[u8], runs: &[(u8, u8)]) -> Vec<u8> {
    assert!(!sub_palette.is_empty() && sub_palette.len() <= 127);
    let bits = bits_per_pixel(sub_palette.len() as u8);

    let mut out = vec![sub_palette.len() as u8];
    out.extend_from_slice(sub_palette);
    for &(index, run) in runs {
        assert!(u32::from(index) < (1 << bits));
        assert!(u32::from(run) < (1 << (8 - bits)));
        out.push((run << bits) | index);
    }
    out
}

/// Rearranges a tile's stream-ordered pixels into image order.
pub fn depermute(scratch: &[u8]) -> Vec<u8> {
    assert_eq!(scratch.len(), TILE_PIXELS);
    let mut image = vec![0u8; TILE_PIXELS];
    for (k, row) in scratch.chunks_exact(TILE_SIZE).enumerate() {
        image[ROW_SEQ[k] * TILE_SIZE..][..TILE_SIZE].copy_from_slice(row);
    }
    image
}
