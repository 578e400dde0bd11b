//! Writing rendered images to disk.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tessera_renderer::{color_to_rgb8, ImageBuffer};

/// Save the image, picking the format from the file extension. `.ppm` is
/// written as plain-text P3; anything else goes through the `image` crate.
pub fn save(image: &ImageBuffer, path: &Path) -> Result<()> {
    let is_ppm = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ppm"));

    if is_ppm {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_ppm(image, &mut writer)?;
        writer.flush()?;
        return Ok(());
    }

    let rgb = image::RgbImage::from_raw(image.width, image.height, image.to_rgb8())
        .ok_or_else(|| anyhow!("image buffer does not match {}x{}", image.width, image.height))?;
    rgb.save(path)
        .with_context(|| format!("encoding {}", path.display()))?;
    Ok(())
}

/// Plain PPM: header then one `r g b` line per pixel, top row first.
pub fn write_ppm<W: Write>(image: &ImageBuffer, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", image.width, image.height)?;
    writeln!(writer, "255")?;

    for y in 0..image.height {
        for x in 0..image.width {
            let [r, g, b] = color_to_rgb8(image.get(x, y));
            writeln!(writer, "{} {} {}", r, g, b)?;
        }
    }

    Ok(())
}
