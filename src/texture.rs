// texture.rs — decode texture images from disk and fit them to the GPU

use crate::error::TextureError;
use image::io::Reader as ImageReader;
use image::{GenericImageView, RgbaImage};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Open, decode and convert one texture to RGBA8. No caching: every call
/// reads the file again.
pub fn load_texture(path: &Path) -> Result<RgbaImage, TextureError> {
    log::info!("loading texture {:?}", path);

    let file = File::open(path).map_err(|source| TextureError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = ImageReader::new(BufReader::new(file))
        .with_guessed_format()
        .map_err(|source| TextureError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    // 8k lunar maps are well past the default allocation limit
    reader.no_limits();

    let img = reader.decode().map_err(|source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let (w, h) = img.dimensions();
    log::info!("decoded {:?}: {}x{}", path, w, h);

    Ok(img.to_rgba8())
}

/// Downscale so neither side exceeds `max_dim`, keeping the aspect ratio.
pub fn fit_to_limit(img: RgbaImage, max_dim: u32) -> RgbaImage {
    let (src_w, src_h) = img.dimensions();
    if src_w <= max_dim && src_h <= max_dim {
        return img;
    }

    let scale = max_dim as f64 / src_w.max(src_h) as f64;
    let new_w = ((src_w as f64 * scale) as u32).clamp(1, max_dim);
    let new_h = ((src_h as f64 * scale) as u32).clamp(1, max_dim);
    log::warn!(
        "texture {}x{} exceeds GPU limit {}, scaling to {}x{}",
        src_w,
        src_h,
        max_dim,
        new_w,
        new_h
    );

    image::imageops::resize(&img, new_w, new_h, image::imageops::FilterType::Lanczos3)
}
