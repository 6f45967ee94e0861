//! # Panel Wire Protocol
//!
//! The panel firmware accepts image data only inside request paths, so the
//! bitmap is packed and spelled out in a 16-letter alphabet:
//!
//! - **Bit packing**: 8 pixels per byte in row-major order, most significant
//!   bit first. A bit is set when the pixel's 1-bit level differs from the
//!   configured background level (0 = paper, so set bits are ink).
//! - **Byte encoding**: low nibble then high nibble, each nibble `n` written
//!   as the letter `'a' + n`. `0x00` → `"aa"`, `0xFF` → `"pp"`, `0x12` → `"cb"`.
//! - **Word encoding**: low byte then high byte, each byte-encoded.
//!
//! A transfer is the sequence:
//!
//! | Step | Path | Payload |
//! |------|------|---------|
//! | 1 | `EPDw_` | none |
//! | 2…n | `<data><word(len(data))>LOAD_` | at most `chunk_chars` encoded characters |
//! | last | `SHOW_` | none |

use crate::dither::MonoImage;
use std::fmt;
use thiserror::Error;

pub const INIT_COMMAND: &str = "EPDw_";
pub const LOAD_SUFFIX: &str = "LOAD_";
pub const SHOW_COMMAND: &str = "SHOW_";
/// Largest encoded payload the firmware accepts in one `LOAD_` request
pub const MAX_CHUNK_CHARS: usize = 1000;

/// Characters produced per encoded byte
const CHARS_PER_BYTE: usize = 2;

/// Malformed encoded text
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    #[error("encoded text has odd length {0}")]
    OddLength(usize),
    #[error("'{0}' is outside the a..p alphabet")]
    InvalidChar(char),
}

fn nibble_char(nibble: u8) -> char {
    char::from(b'a' + (nibble & 0x0F))
}

fn char_nibble(c: char) -> Result<u8, DecodeError> {
    match c {
        'a'..='p' => Ok(c as u8 - b'a'),
        other => Err(DecodeError::InvalidChar(other)),
    }
}

/// A frame that cannot be put on the wire
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    #[error("payload of {0} characters exceeds the {} character limit", MAX_CHUNK_CHARS)]
    PayloadTooLong(usize),
}

/// Append the two-character form of `byte` to `out`
pub fn push_byte(out: &mut String, byte: u8) {
    out.push(nibble_char(byte & 0x0F));
    out.push(nibble_char(byte >> 4));
}

/// Two-character form of a byte, low nibble first
pub fn encode_byte(byte: u8) -> String {
    let mut out = String::with_capacity(CHARS_PER_BYTE);
    push_byte(&mut out, byte);
    out
}

/// Four-character form of a 16-bit word, low byte first
pub fn encode_word(word: u16) -> String {
    let [low, high] = word.to_le_bytes();
    let mut out = String::with_capacity(2 * CHARS_PER_BYTE);
    push_byte(&mut out, low);
    push_byte(&mut out, high);
    out
}

/// Encode a byte slice
pub fn encode_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * CHARS_PER_BYTE);
    for &b in bytes {
        push_byte(&mut out, b);
    }
    out
}

/// Inverse of [`encode_bytes`]
pub fn decode_bytes(text: &str) -> Result<Vec<u8>, DecodeError> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() % CHARS_PER_BYTE != 0 {
        return Err(DecodeError::OddLength(chars.len()));
    }
    chars
        .chunks(CHARS_PER_BYTE)
        .map(|pair| -> Result<u8, DecodeError> {
            Ok(char_nibble(pair[0])? | (char_nibble(pair[1])? << 4))
        })
        .collect()
}

/// Pack 1-bit levels into bytes, MSB first. A trailing partial byte is
/// padded with clear bits.
pub fn pack_levels<I>(levels: I, background: u8) -> Vec<u8>
where
    I: IntoIterator<Item = u8>,
{
    let mut packed = Vec::new();
    let mut current = 0u8;
    let mut filled = 0;

    for level in levels {
        if level != background {
            current |= 0x80 >> filled;
        }
        filled += 1;
        if filled == 8 {
            packed.push(current);
            current = 0;
            filled = 0;
        }
    }
    if filled > 0 {
        packed.push(current);
    }
    packed
}

/// Pack a finished bitmap for the panel
pub fn pack_bitmap(bitmap: &MonoImage, background: u8) -> Vec<u8> {
    pack_levels(bitmap.levels(), background)
}

/// One request of the transfer sequence
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Init,
    /// Encoded pixel data, at most `chunk_chars` characters
    Data(String),
    Show,
}

impl Frame {
    /// Request path (without the leading slash)
    pub fn path(&self) -> Result<String, EncodeError> {
        match self {
            Frame::Init => Ok(INIT_COMMAND.to_string()),
            Frame::Data(payload) => {
                let length = u16::try_from(payload.len())
                    .ok()
                    .filter(|&len| usize::from(len) <= MAX_CHUNK_CHARS)
                    .ok_or(EncodeError::PayloadTooLong(payload.len()))?;
                let mut path = String::with_capacity(payload.len() + 4 + LOAD_SUFFIX.len());
                path.push_str(payload);
                path.push_str(&encode_word(length));
                path.push_str(LOAD_SUFFIX);
                Ok(path)
            }
            Frame::Show => Ok(SHOW_COMMAND.to_string()),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Init => write!(f, "{}", INIT_COMMAND),
            Frame::Data(payload) => write!(f, "{} ({} chars)", LOAD_SUFFIX, payload.len()),
            Frame::Show => write!(f, "{}", SHOW_COMMAND),
        }
    }
}

/// Split packed bytes into encoded chunks of at most `chunk_chars`
/// characters, never more than [`MAX_CHUNK_CHARS`]. Chunks always end on a
/// whole byte.
pub fn encode_chunks(packed: &[u8], chunk_chars: usize) -> Vec<String> {
    let bytes_per_chunk = (chunk_chars.min(MAX_CHUNK_CHARS) / CHARS_PER_BYTE).max(1);
    packed.chunks(bytes_per_chunk).map(encode_bytes).collect()
}

/// Complete request sequence for a bitmap
pub fn transfer_frames(bitmap: &MonoImage, background: u8, chunk_chars: usize) -> Vec<Frame> {
    let packed = pack_bitmap(bitmap, background);
    let mut frames = vec![Frame::Init];
    frames.extend(
        encode_chunks(&packed, chunk_chars)
            .into_iter()
            .map(Frame::Data),
    );
    frames.push(Frame::Show);
    frames
}
