use crate::error::RenderError;
use crate::render::Framebuffer;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ImageBuffer, ImageEncoder, ImageFormat, Rgb, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Binary P6 pixmap.
    Ppm,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Ppm => "ppm",
            OutputFormat::Png => "png",
        }
    }
}

/// `255 * c` truncated toward zero and clamped to a byte.
pub fn quantize(c: f64) -> u8 {
    (255. * c).clamp(0., 255.) as u8
}

pub fn to_rgb_image(fb: &Framebuffer) -> RgbImage {
    ImageBuffer::from_fn(fb.w(), fb.h(), |x, y| {
        let c = fb.at(x, y);
        Rgb([quantize(c.x), quantize(c.y), quantize(c.z)])
    })
}

pub fn write_ppm(img: &RgbImage, path: &Path) -> Result<(), RenderError> {
    let out = BufWriter::new(File::create(path)?);
    PnmEncoder::new(out)
        .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
        .write_image(img.as_raw(), img.width(), img.height(), image::ColorType::Rgb8)?;
    Ok(())
}

pub fn write_png(img: &RgbImage, path: &Path) -> Result<(), RenderError> {
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Writes `<dir>/<stem>.<ext>` for every requested format and returns the
/// paths written.
pub fn write_all(
    fb: &Framebuffer,
    dir: &Path,
    stem: &str,
    formats: &[OutputFormat],
) -> Result<Vec<PathBuf>, RenderError> {
    std::fs::create_dir_all(dir)?;
    let img = to_rgb_image(fb);
    let mut written = Vec::with_capacity(formats.len());
    for format in formats {
        let path = dir.join(format!("{}.{}", stem, format.extension()));
        match format {
            OutputFormat::Ppm => {
                info!(path = %path.display(), "making ppm");
                write_ppm(&img, &path)?
            }
            OutputFormat::Png => {
                info!(path = %path.display(), "making png");
                write_png(&img, &path)?
            }
        }
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::v;

    #[test]
    fn quantize_truncates_and_clamps() {
        assert_eq!(quantize(0.), 0);
        assert_eq!(quantize(1.), 255);
        assert_eq!(quantize(0.999), 254);
        assert_eq!(quantize(0.4), 102);
        assert_eq!(quantize(-0.3), 0);
        assert_eq!(quantize(7.), 255);
        assert_eq!(quantize(f64::NAN), 0);
    }

    #[test]
    fn image_keeps_row_order() {
        let fb = Framebuffer::from_pixels(
            2,
            2,
            vec![
                v(1., 0., 0.),
                v(0., 1., 0.),
                v(0., 0., 1.),
                v(0.2, 0.7, 0.8),
            ],
        )
        .unwrap();
        let img = to_rgb_image(&fb);
        assert_eq!(img.get_pixel(1, 0), &Rgb([0, 255, 0]));
        assert_eq!(img.get_pixel(0, 1), &Rgb([0, 0, 255]));
        assert_eq!(img.get_pixel(1, 1), &Rgb([51, 178, 204]));
    }
}
