use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use image::{
    codecs::{
        gif::GifEncoder,
        png::PngEncoder,
        pnm::{PnmEncoder, PnmSubtype, SampleEncoding},
        tiff::TiffEncoder,
    },
    ExtendedColorType, ImageEncoder,
};
use libqct::{DumpOptions, QctMap};
use tracing::{debug, info, instrument};

#[instrument]
pub fn qct_to_image(qct_file: &Path, output_name: &Path, scale: u32) -> Result<()> {
    let mut map = QctMap::open(qct_file)?;
    debug!("read chart metadata from file");
    map.load_image(scale)?;

    let rgb: Vec<u8> = map
        .rgb_pixels()
        .context("image was just loaded")?
        .flatten()
        .collect();
    debug!("length of RGB chart data: {}", rgb.len());

    info!("writing palette-applied image to {}", output_name.display());
    write_image(output_name, &rgb, map.image_width(), map.image_height())?;
    info!(
        "successfully wrote palette-applied image to {}",
        output_name.display()
    );
    Ok(())
}

/// The encoder is chosen from the output extension; anything unrecognized
/// gets PNG.
fn write_image(output_name: &Path, rgb: &[u8], width: u32, height: u32) -> Result<()> {
    let extension = output_name
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let output = File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output_name)?;

    match extension.as_str() {
        "ppm" | "pnm" => PnmEncoder::new(output)
            .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
            .write_image(rgb, width, height, ExtendedColorType::Rgb8)?,
        "gif" => {
            GifEncoder::new(output).encode(rgb, width, height, ExtendedColorType::Rgb8)?;
        }
        "tif" | "tiff" => TiffEncoder::new(BufWriter::new(output)).write_image(
            rgb,
            width,
            height,
            ExtendedColorType::Rgb8,
        )?,
        _ => PngEncoder::new(output).write_image(rgb, width, height, ExtendedColorType::Rgb8)?,
    }
    Ok(())
}

#[instrument]
pub fn query_metadata(qct_file: &Path, options: &DumpOptions, write_kml: bool) -> Result<()> {
    let map = QctMap::open(qct_file)?;
    map.print_metadata(&mut std::io::stdout().lock(), options)?;

    if write_kml {
        std::fs::write("outline.kml", map.outline_kml())?;
        std::fs::write("boundary.kml", map.boundary_kml())?;
        info!("wrote outline.kml and boundary.kml");
    }
    Ok(())
}
