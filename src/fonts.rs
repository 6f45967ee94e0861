//! Mono font lookup and text measurement.
//!
//! Fonts are the built-in `embedded-graphics` bitmap fonts, named by their
//! cell size ("6x12", "9x15-bold"). An unknown name never fails a render:
//! the built-in 6x10 font is substituted and a warning is logged.

use embedded_graphics::mono_font::{ascii, MonoFont};
use log::warn;

/// Substitute used whenever a configured font is unavailable
pub const FALLBACK_FONT: &MonoFont<'static> = &ascii::FONT_6X10;

/// Look up a built-in font by name
pub fn font_by_name(name: &str) -> Option<&'static MonoFont<'static>> {
    let font = match name.to_ascii_lowercase().replace('_', "-").as_str() {
        "4x6" => &ascii::FONT_4X6,
        "5x7" => &ascii::FONT_5X7,
        "5x8" => &ascii::FONT_5X8,
        "6x9" => &ascii::FONT_6X9,
        "6x10" => &ascii::FONT_6X10,
        "6x12" => &ascii::FONT_6X12,
        "6x13" => &ascii::FONT_6X13,
        "6x13-bold" => &ascii::FONT_6X13_BOLD,
        "7x13" => &ascii::FONT_7X13,
        "7x13-bold" => &ascii::FONT_7X13_BOLD,
        "7x14" => &ascii::FONT_7X14,
        "7x14-bold" => &ascii::FONT_7X14_BOLD,
        "8x13" => &ascii::FONT_8X13,
        "8x13-bold" => &ascii::FONT_8X13_BOLD,
        "9x15" => &ascii::FONT_9X15,
        "9x15-bold" => &ascii::FONT_9X15_BOLD,
        "9x18" => &ascii::FONT_9X18,
        "9x18-bold" => &ascii::FONT_9X18_BOLD,
        "10x20" => &ascii::FONT_10X20,
        _ => return None,
    };
    Some(font)
}

/// Fonts used by one render
#[derive(Clone, Copy, Debug)]
pub struct FontSet {
    /// Event text and hour labels
    pub body: &'static MonoFont<'static>,
    /// Day headers
    pub header: &'static MonoFont<'static>,
}

impl FontSet {
    /// Resolve configured names, substituting [`FALLBACK_FONT`] for unknown ones
    pub fn resolve(body: &str, header: &str) -> Self {
        FontSet {
            body: resolve_or_fallback(body),
            header: resolve_or_fallback(header),
        }
    }
}

fn resolve_or_fallback(name: &str) -> &'static MonoFont<'static> {
    font_by_name(name).unwrap_or_else(|| {
        warn!("Font '{}' is not available, using built-in 6x10", name);
        FALLBACK_FONT
    })
}

/// Rendered width of `text` in pixels
pub fn text_width(font: &MonoFont<'_>, text: &str) -> u32 {
    let chars = text.chars().count() as u32;
    if chars == 0 {
        return 0;
    }
    chars * font.character_size.width + (chars - 1) * font.character_spacing
}

/// Height of one text line in pixels
pub fn line_height(font: &MonoFont<'_>) -> u32 {
    font.character_size.height
}
