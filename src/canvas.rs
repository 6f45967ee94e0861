//! Grayscale drawing surface.
//!
//! Wraps an 8-bit `GrayImage` so the `embedded-graphics` primitives, text
//! renderer and mono fonts can draw straight into the composite before it is
//! dithered. Pixels outside the image are silently dropped.

use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::prelude::*;
use image::{GrayImage, Luma};

pub struct GrayCanvas {
    image: GrayImage,
}

impl GrayCanvas {
    /// Canvas filled with a single gray level
    pub fn new(width: u32, height: u32, fill: u8) -> Self {
        Self {
            image: GrayImage::from_pixel(width, height, Luma([fill])),
        }
    }

    pub fn luma_at(&self, x: u32, y: u32) -> Option<u8> {
        self.image.get_pixel_checked(x, y).map(|p| p.0[0])
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}

impl OriginDimensions for GrayCanvas {
    fn size(&self) -> Size {
        Size::new(self.image.width(), self.image.height())
    }
}

impl DrawTarget for GrayCanvas {
    type Color = Gray8;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let (width, height) = self.image.dimensions();
        for Pixel(point, color) in pixels {
            if let (Ok(x), Ok(y)) = (u32::try_from(point.x), u32::try_from(point.y)) {
                if x < width && y < height {
                    self.image.put_pixel(x, y, Luma([color.luma()]));
                }
            }
        }
        Ok(())
    }
}
