use anyhow::Context;
use image::{codecs::png::PngEncoder, ExtendedColorType, ImageEncoder};
use libqct::QctMap;

fn main() -> anyhow::Result<()> {
    let input = std::env::args()
        .nth(1)
        .context("usage: qct_to_png <chart.qct>")?;

    let map = QctMap::from_file(&input)?;

    let rgb: Vec<u8> = map
        .rgb_pixels()
        .context("image was loaded")?
        .flatten()
        .collect();

    let output = std::fs::File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open("qct_to_png_example.png")?;

    let encoder = PngEncoder::new(output);
    encoder.write_image(
        &rgb,
        map.image_width(),
        map.image_height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(())
}
