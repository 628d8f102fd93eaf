//! Decoding of individual 64×64 tiles.
//!
//! Every tile is compressed independently. The first byte selects the
//! scheme: a bespoke prefix code over the full palette, fixed-width bit
//! packing through a small sub-palette, or run-length encoding through a
//! sub-palette. Rows come out of the stream in reverse-binary order and are
//! de-interleaved while being placed into the destination image.

use std::io::Read;

use strum::IntoStaticStr;
use thiserror::Error;
use tracing::{debug, trace};

use crate::map::raster::Raster;
use crate::reader::{read_u32_le, read_u8};
use crate::Error as ReadError;

pub(crate) const TILE: usize = crate::TILE_SIZE as usize;
pub(crate) const TILE_PIXELS: usize = TILE * TILE;

const FAR_BRANCH: u8 = 128;

/// The order rows of a decoded tile appear in within the compressed stream:
/// `ROW_SEQ[k]` is the image row that stream row `k` belongs to. It is the
/// 6-bit reverse-binary sequence, and therefore its own inverse.
pub(crate) const ROW_SEQ: [usize; TILE] = [
    0, 32, 16, 48, 8, 40, 24, 56, 4, 36, 20, 52, 12, 44, 28, 60, 2, 34, 18, 50, 10, 42, 26, 58, 6,
    38, 22, 54, 14, 46, 30, 62, 1, 33, 17, 49, 9, 41, 25, 57, 5, 37, 21, 53, 13, 45, 29, 61, 3,
    35, 19, 51, 11, 43, 27, 59, 7, 39, 23, 55, 15, 47, 31, 63,
];

/// Failures local to one tile. The image assembler absorbs these: the format
/// carries no checksums, and a chart with a few blank tiles is more useful
/// than no chart at all.
#[derive(Error, Debug)]
pub(crate) enum TileError {
    #[error("tile data truncated")]
    Truncated,
    #[error("reserved packing mode")]
    UnsupportedEncoding,
    #[error("malformed prefix-code table")]
    MalformedPrefixTable,
    #[error("i/o error: {0}")]
    Io(std::io::Error),
}

impl From<ReadError> for TileError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::Io(io) => Self::Io(io),
            _ => Self::Truncated,
        }
    }
}

/// How a tile is packed, from its first byte.
#[derive(IntoStaticStr, Debug, Eq, PartialEq, Copy, Clone)]
pub(crate) enum TileEncoding {
    /// `0` or `255`: variable-length prefix code over the full palette
    #[strum(serialize = "huffman")]
    PrefixCoded,
    /// `129..=254`: fixed-width bit packing, `256 − byte` sub-palette entries
    #[strum(serialize = "pixel")]
    BitPacked {
        colours: u8,
    },
    /// `1..=127`: run-length encoding, `byte` sub-palette entries
    #[strum(serialize = "RLE")]
    RunLength {
        colours: u8,
    },
    /// `128`: undocumented, possibly encrypted
    #[strum(serialize = "reserved")]
    Reserved,
}

impl TileEncoding {
    pub(crate) const fn from_byte(packing: u8) -> Self {
        match packing {
            0 | 255 => Self::PrefixCoded,
            128 => Self::Reserved,
            colours @ 1..=127 => Self::RunLength { colours },
            p => Self::BitPacked {
                colours: (256 - p as u16) as u8,
            },
        }
    }

    pub(crate) fn name(self) -> &'static str {
        self.into()
    }
}

/// Decodes exactly [`TILE_PIXELS`] palette indices from a stream positioned
/// at the first byte of a tile. `scratch` holds rows in stream order; callers
/// are expected to hand it to [`blit`] for de-interleaving.
pub(crate) fn decode(
    r: &mut impl Read,
    scratch: &mut [u8; TILE_PIXELS],
) -> Result<TileEncoding, TileError> {
    let packing = read_u8(r)?;
    let encoding = TileEncoding::from_byte(packing);
    trace!("tile packed using {}", encoding.name());

    match encoding {
        TileEncoding::PrefixCoded => decode_prefix_coded(r, scratch)?,
        TileEncoding::BitPacked { colours } => decode_bit_packed(r, scratch, colours)?,
        TileEncoding::RunLength { colours } => decode_run_length(r, scratch, colours)?,
        TileEncoding::Reserved => {
            let mut skipped = [0u8; 8];
            r.read_exact(&mut skipped)
                .map_err(|e| TileError::from(ReadError::from_read(e)))?;
            debug!("reserved packing {packing:#04x}, skipped {skipped:02x?}");
            return Err(TileError::UnsupportedEncoding);
        }
    }
    Ok(encoding)
}

/// Smallest pixel width able to address `colours` sub-palette entries.
const fn bits_per_pixel(colours: u8) -> u32 {
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

/// Sub-palettes are at most 127 entries but pixel values can address up to
/// `2^bits − 1`, so the unused tail reads as palette index 0.
fn read_sub_palette(r: &mut impl Read, colours: u8) -> Result<[u8; 128], TileError> {
    let mut sub = [0u8; 128];
    r.read_exact(&mut sub[..colours as usize])
        .map_err(|e| TileError::from(ReadError::from_read(e)))?;
    Ok(sub)
}

/// Bit packing: a sub-palette, then little-endian 32-bit words each holding
/// `32 / bits` pixels from the low bits up. The spare high bits of a word and
/// anything after pixel 4095 are padding.
fn decode_bit_packed(
    r: &mut impl Read,
    scratch: &mut [u8; TILE_PIXELS],
    colours: u8,
) -> Result<(), TileError> {
    let bits = bits_per_pixel(colours);
    let mask = (1u32 << bits) - 1;
    let pixels_per_word = (32 / bits) as usize;
    let sub = read_sub_palette(r, colours)?;
    trace!("packed sub-palette of {colours} ({bits} bits, {pixels_per_word} pixels per word)");

    let mut pixel = 0;
    while pixel < TILE_PIXELS {
        let mut word = read_u32_le(r)?;
        for _ in 0..pixels_per_word {
            scratch[pixel] = sub[(word & mask) as usize];
            word >>= bits;
            pixel += 1;
            if pixel == TILE_PIXELS {
                break;
            }
        }
    }
    Ok(())
}

/// RLE: a sub-palette, then one byte per run; the low bits pick the colour
/// and the remaining high bits are the run length. A run that would cross
/// the end of the tile is clamped.
fn decode_run_length(
    r: &mut impl Read,
    scratch: &mut [u8; TILE_PIXELS],
    colours: u8,
) -> Result<(), TileError> {
    let bits = bits_per_pixel(colours);
    let mask = (1u16 << bits) - 1;
    let sub = read_sub_palette(r, colours)?;
    trace!("RLE sub-palette of {colours} ({bits} low bits)");

    let mut pixel = 0;
    while pixel < TILE_PIXELS {
        let byte = read_u8(r)?;
        let colour = sub[(u16::from(byte) & mask) as usize];
        let run = usize::from(byte >> bits).min(TILE_PIXELS - pixel);
        scratch[pixel..pixel + run].fill(colour);
        pixel += run;
    }
    Ok(())
}

/// Prefix code: a self-describing table, then a bit stream traversed from
/// table index 0. Entries below 128 are palette leaves, 128 is a far branch
/// carrying a two-byte jump, above 128 a near branch with the jump encoded
/// in the entry itself.
fn decode_prefix_coded(
    r: &mut impl Read,
    scratch: &mut [u8; TILE_PIXELS],
) -> Result<(), TileError> {
    // A full binary tree has one more leaf than branches, so the table is
    // complete the moment the leaf count pulls ahead.
    let mut table: Vec<u8> = Vec::with_capacity(256);
    let mut leaves = 0usize;
    let mut branches = 0usize;
    while leaves <= branches {
        let entry = read_u8(r)?;
        table.push(entry);
        match entry {
            FAR_BRANCH => {
                table.push(read_u8(r)?);
                table.push(read_u8(r)?);
                branches += 1;
            }
            e if e > FAR_BRANCH => branches += 1,
            _ => leaves += 1,
        }
    }

    // A single leaf is a solid tile; no bit stream follows.
    if leaves == 1 {
        scratch.fill(table[0]);
        return Ok(());
    }

    validate_prefix_table(&table)?;

    let mut bits = BitReader::new();
    let mut cursor = 0usize;
    let mut pixel = 0usize;
    while pixel < TILE_PIXELS {
        let entry = *table.get(cursor).ok_or(TileError::MalformedPrefixTable)?;
        if entry < FAR_BRANCH {
            scratch[pixel] = entry;
            pixel += 1;
            // Back to the top of the tree; no bit is consumed at a leaf
            cursor = 0;
            continue;
        }
        if bits.next(r)? == 0 {
            // Fall through to the adjacent entry
            cursor += if entry == FAR_BRANCH { 3 } else { 1 };
        } else if entry == FAR_BRANCH {
            let lo = *table.get(cursor + 1).ok_or(TileError::MalformedPrefixTable)?;
            let hi = *table.get(cursor + 2).ok_or(TileError::MalformedPrefixTable)?;
            cursor += far_delta(lo, hi);
        } else {
            cursor += near_delta(entry);
        }
    }
    Ok(())
}

const fn near_delta(entry: u8) -> usize {
    257 - entry as usize
}

const fn far_delta(lo: u8, hi: u8) -> usize {
    65537 - (256 * hi as usize + lo as usize) + 2
}

/// Every branch target must land strictly inside the table, otherwise the
/// bit stream could walk the cursor anywhere.
fn validate_prefix_table(table: &[u8]) -> Result<(), TileError> {
    let len = table.len();
    let mut i = 0;
    while i < len {
        match table[i] {
            e if e < FAR_BRANCH => i += 1,
            FAR_BRANCH => {
                if i + 2 >= len || i + far_delta(table[i + 1], table[i + 2]) >= len {
                    return Err(TileError::MalformedPrefixTable);
                }
                i += 3;
            }
            e => {
                if i + near_delta(e) >= len {
                    return Err(TileError::MalformedPrefixTable);
                }
                i += 1;
            }
        }
    }
    Ok(())
}

/// Bit cursor over the compressed stream, least-significant bit first within
/// each byte, refilling across byte boundaries.
struct BitReader {
    current: u8,
    remaining: u8,
}

impl BitReader {
    const fn new() -> Self {
        Self {
            current: 0,
            remaining: 0,
        }
    }

    fn next(&mut self, r: &mut impl Read) -> Result<u8, TileError> {
        if self.remaining == 0 {
            self.current = read_u8(r)?;
            self.remaining = 8;
        }
        let bit = self.current & 1;
        self.current >>= 1;
        self.remaining -= 1;
        Ok(bit)
    }
}

/// Places a decoded tile into the destination raster, de-interleaving rows
/// per [`ROW_SEQ`].
///
/// At scale 1 each stream row is copied whole. At larger scales every kept
/// row is the one at a multiple of the scale factor, and each output pixel
/// folds the `scale` source pixels to its right together through the palette
/// interpolation matrix.
pub(crate) fn blit(
    raster: &mut Raster,
    scratch: &[u8; TILE_PIXELS],
    tile_x: u32,
    tile_y: u32,
    scale: u32,
    interp: &[[u8; 128]; 128],
) {
    let scale = scale as usize;
    let tile_x = tile_x as usize * TILE / scale;
    let tile_y = tile_y as usize * TILE / scale;

    if scale == 1 {
        for (k, src) in scratch.chunks_exact(TILE).enumerate() {
            let row = raster
                .row_mut((tile_y + ROW_SEQ[k]) as u32)
                .expect("tile rows fit the raster");
            row[tile_x..tile_x + TILE].copy_from_slice(src);
        }
        return;
    }

    let out = TILE / scale;
    for y_out in 0..out {
        // The source row whose full-resolution position is y_out * scale
        let src = &scratch[ROW_SEQ[y_out * scale] * TILE..][..TILE];
        let row = raster
            .row_mut((tile_y + y_out) as u32)
            .expect("tile rows fit the raster");
        let dest = &mut row[tile_x..tile_x + out];
        for (x_out, d) in dest.iter_mut().enumerate() {
            let mut pix = src[x_out * scale];
            for n in 1..scale {
                let right = src[x_out * scale + n];
                pix = interp[(pix & 0x7F) as usize][(right & 0x7F) as usize];
            }
            *d = pix;
        }
    }
}
