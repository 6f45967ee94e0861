//! # Monochrome Dithering
//!
//! Converts 8-bit grayscale rasters into the strict two-level images the
//! panel can show. Two error-diffusion strategies are available:
//!
//! - **Floyd–Steinberg**: delegated to `image::imageops::dither` with the
//!   bi-level palette (threshold at the 8-bit midpoint, classic 7/3/5/1
//!   kernel)
//! - **Atkinson**: a single forward sweep over an owned buffer, spreading
//!   one eighth of the quantization error to six neighbours, so only 6/8 of
//!   the error is passed on.
//!
//! The output type, [`MonoImage`], can only be produced here, so anything
//! holding one is guaranteed to contain nothing but 0 (ink) and 255 (paper).

use crate::error::CalendarError;
use image::imageops::{self, BiLevel, FilterType};
use image::{GrayImage, Luma};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Sample value for ink
pub const INK: u8 = 0;
/// Sample value for bare paper
pub const PAPER: u8 = 255;

/// Floyd–Steinberg neighbours and their weights in sixteenths
const FLOYD_STEINBERG_KERNEL: [(i64, i64, i32); 4] = [(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)];

/// Atkinson neighbours relative to the current pixel, each receiving error/8
const ATKINSON_KERNEL: [(i64, i64); 6] = [(1, 0), (2, 0), (-1, 1), (0, 1), (1, 1), (0, 2)];

/// Error-diffusion strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DitherMethod {
    #[default]
    Atkinson,
    #[serde(alias = "floyd")]
    FloydSteinberg,
}

impl fmt::Display for DitherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DitherMethod::Atkinson => write!(f, "atkinson"),
            DitherMethod::FloydSteinberg => write!(f, "floyd-steinberg"),
        }
    }
}

impl FromStr for DitherMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "atkinson" => Ok(DitherMethod::Atkinson),
            "floyd" | "floyd-steinberg" | "floydsteinberg" => Ok(DitherMethod::FloydSteinberg),
            other => Err(format!(
                "unknown dithering method '{}' (expected atkinson or floyd-steinberg)",
                other
            )),
        }
    }
}

/// Two-level raster. Every sample is either [`INK`] or [`PAPER`].
#[derive(Clone, Debug, PartialEq)]
pub struct MonoImage {
    pixels: GrayImage,
}

impl MonoImage {
    /// All-paper image of the given size
    pub fn blank(width: u32, height: u32) -> Self {
        MonoImage {
            pixels: GrayImage::from_pixel(width, height, Luma([PAPER])),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// True when the pixel at (x, y) is ink. Out-of-range reads are paper.
    pub fn is_ink(&self, x: u32, y: u32) -> bool {
        self.pixels
            .get_pixel_checked(x, y)
            .is_some_and(|p| p.0[0] == INK)
    }

    /// 1-bit levels in row-major order: 1 for ink, 0 for paper
    pub fn levels(&self) -> impl Iterator<Item = u8> + '_ {
        self.pixels
            .as_raw()
            .iter()
            .map(|&v| u8::from(v == INK))
    }

    /// Underlying grayscale view (0/255 only)
    pub fn as_gray(&self) -> &GrayImage {
        &self.pixels
    }

    /// Copy of the rectangle `(x, y, width, height)`, clamped to the image
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> MonoImage {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);
        MonoImage {
            pixels: imageops::crop_imm(&self.pixels, x, y, width, height).to_image(),
        }
    }

    /// New image with `patch` pasted at (x, y), replacing whatever was there.
    /// Parts of the patch falling outside this image are dropped.
    pub fn overlay(&self, patch: &MonoImage, x: u32, y: u32) -> MonoImage {
        let mut pixels = self.pixels.clone();
        imageops::replace(&mut pixels, &patch.pixels, i64::from(x), i64::from(y));
        MonoImage { pixels }
    }

    /// Write the image; the format follows the file extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CalendarError> {
        let path = path.as_ref();
        self.pixels.save(path).map_err(|source| CalendarError::Output {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Dither a grayscale raster with the chosen strategy
pub fn dither(mut gray: GrayImage, method: DitherMethod) -> MonoImage {
    debug!(
        "Dithering {}x{} raster with {}",
        gray.width(),
        gray.height(),
        method
    );
    match method {
        DitherMethod::Atkinson => atkinson_in_place(&mut gray),
        // The library kernel indexes both neighbour rows and columns
        DitherMethod::FloydSteinberg if gray.width() < 2 || gray.height() < 2 => {
            floyd_steinberg_in_place(&mut gray)
        }
        DitherMethod::FloydSteinberg => imageops::dither(&mut gray, &BiLevel),
    }
    MonoImage { pixels: gray }
}

/// Floyd–Steinberg for rasters too thin for `imageops::dither`.
///
/// Same threshold and 7/3/5/1 sixteenths as the library; neighbours outside
/// the raster are skipped.
fn floyd_steinberg_in_place(gray: &mut GrayImage) {
    let width = i64::from(gray.width());
    let height = i64::from(gray.height());
    let buf: &mut [u8] = gray;

    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            let old = i32::from(buf[idx]);
            let new = if old < 128 { INK } else { PAPER };
            buf[idx] = new;

            let error = old - i32::from(new);
            for (dx, dy, weight) in FLOYD_STEINBERG_KERNEL {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || nx >= width || ny >= height {
                    continue;
                }
                let n = (ny * width + nx) as usize;
                buf[n] = (i32::from(buf[n]) + error * weight / 16).clamp(0, 255) as u8;
            }
        }
    }
}

/// Atkinson error diffusion over the buffer in place.
///
/// Pixels are visited in row-major order and neighbours see the updated
/// values of earlier pixels in the same sweep. The error is computed with
/// truncating division and each of the six neighbours receives it whole,
/// clamped to 0..=255.
pub fn atkinson_in_place(gray: &mut GrayImage) {
    let width = i64::from(gray.width());
    let height = i64::from(gray.height());
    let buf: &mut [u8] = gray;

    for y in 0..height {
        for x in 0..width {
            let idx = (y * width + x) as usize;
            let old = i32::from(buf[idx]);
            let new = if old < 128 { INK } else { PAPER };
            buf[idx] = new;

            let error = (old - i32::from(new)) / 8;
            if error == 0 {
                continue;
            }
            for (dx, dy) in ATKINSON_KERNEL {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || nx >= width || ny >= height {
                    continue;
                }
                let n = (ny * width + nx) as usize;
                buf[n] = (i32::from(buf[n]) + error).clamp(0, 255) as u8;
            }
        }
    }
}

/// Load a saved image as a panel bitmap.
///
/// The image is converted to grayscale, resampled to the panel size when
/// it differs, and dithered. Input that is already two-level comes back
/// unchanged.
pub fn load_bitmap<P: AsRef<Path>>(
    path: P,
    width: u32,
    height: u32,
    method: DitherMethod,
) -> Result<MonoImage, CalendarError> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|e| CalendarError::AssetNotFound {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut gray = img.to_luma8();
    if gray.dimensions() != (width, height) {
        debug!(
            "Resizing {} from {:?} to {}x{}",
            path.display(),
            gray.dimensions(),
            width,
            height
        );
        gray = imageops::resize(&gray, width, height, FilterType::Lanczos3);
    }
    Ok(dither(gray, method))
}
