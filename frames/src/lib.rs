//! Bridge frame model and codecs for the pub/sub messaging bridge.
//!
//! A [`Frame`] is one operation exchanged with the bridge: the client sends
//! `subscribe` / `unsubscribe`, the bridge answers with `publish` (carrying a
//! topic message) or `status` (diagnostics). Everything travels as JSON text.
//!
//! A subscription made with [`Compression::Png`] is answered with `png`
//! frames instead: the whole JSON text of the real frame is packed three
//! bytes per pixel into an RGB image, PNG-encoded, and sent base64 in the
//! `data` field. [`decode_text`] unpacks those transparently.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use png::{BitDepth, ColorType, Transformations};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error returned by the frame codecs.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The text payload is not a valid JSON bridge frame.
    #[error("failed to decode json frame: {0}")]
    Json(#[from] serde_json::Error),
    /// The `data` of a `png` frame is not valid base64.
    #[error("failed to decode png frame data: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The `data` of a `png` frame is not a readable PNG image.
    #[error("failed to decode png image: {0}")]
    PngDecode(#[from] png::DecodingError),
    /// A frame could not be packed into a PNG image.
    #[error("failed to encode png image: {0}")]
    PngEncode(#[from] png::EncodingError),
    /// The image decodes, but not to 8-bit RGB or RGBA.
    #[error("unsupported png layout: {color:?} at {depth:?}")]
    UnsupportedPng { color: ColorType, depth: BitDepth },
    /// A `png` frame without `data`.
    #[error("png frame has no data")]
    MissingData,
    /// A `png` frame whose payload is itself a `png` frame.
    #[error("png frame wraps another png frame")]
    NestedPng,
    /// Frame text too long to fit in one image.
    #[error("frame of {0} bytes is too large to pack")]
    TooLarge(usize),
}

/// Bridge operation carried by a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    /// Client asks the bridge to start forwarding a topic.
    Subscribe,
    /// Client asks the bridge to stop forwarding a topic.
    Unsubscribe,
    /// A message published on a topic.
    Publish,
    /// Diagnostic status line from the bridge.
    Status,
    /// Another frame packed into a PNG image.
    Png,
}

/// Message compression requested from the bridge on subscribe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Plain JSON messages.
    #[default]
    None,
    /// Messages arrive as `png` frames.
    Png,
}

impl Compression {
    /// Parse the lowercase name used in JSON frames and configuration.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// A single operation on the bridge wire protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Operation name.
    pub op: Op,
    /// Client-chosen correlation id, echoed by the bridge where applicable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Topic name, e.g. `"/map"`. Absent on `status` frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Message type name, e.g. `"nav_msgs/OccupancyGrid"`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub msg_type: Option<String>,
    /// Requested compression for subscribe frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,
    /// Severity on `status` frames (`"info"`, `"warning"`, `"error"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Topic message for `publish`, text for `status`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<Value>,
    /// Base64 PNG image on `png` frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Frame {
    fn bare(op: Op) -> Self {
        Self { op, id: None, topic: None, msg_type: None, compression: None, level: None, msg: None, data: None }
    }

    /// Build a `subscribe` frame.
    #[must_use]
    pub fn subscribe(id: impl Into<String>, topic: impl Into<String>, msg_type: impl Into<String>, compression: Compression) -> Self {
        Self {
            id: Some(id.into()),
            topic: Some(topic.into()),
            msg_type: Some(msg_type.into()),
            compression: Some(compression),
            ..Self::bare(Op::Subscribe)
        }
    }

    /// Build an `unsubscribe` frame.
    #[must_use]
    pub fn unsubscribe(id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self { id: Some(id.into()), topic: Some(topic.into()), ..Self::bare(Op::Unsubscribe) }
    }

    /// Build a `publish` frame.
    #[must_use]
    pub fn publish(topic: impl Into<String>, msg: Value) -> Self {
        Self { topic: Some(topic.into()), msg: Some(msg), ..Self::bare(Op::Publish) }
    }

    /// Build a `status` frame.
    #[must_use]
    pub fn status(level: impl Into<String>, text: impl Into<String>) -> Self {
        Self { level: Some(level.into()), msg: Some(Value::String(text.into())), ..Self::bare(Op::Status) }
    }

    /// Build a `png` frame around base64 image data.
    #[must_use]
    pub fn png(data: impl Into<String>) -> Self {
        Self { data: Some(data.into()), ..Self::bare(Op::Png) }
    }
}

/// Encode a frame as bridge JSON text.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the payload cannot be serialized (for
/// example a map with non-string keys built by hand).
pub fn encode_json(frame: &Frame) -> Result<String, CodecError> {
    Ok(serde_json::to_string(frame)?)
}

/// Decode bridge JSON text into a frame, without unpacking `png` frames.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed text or unknown `op` names.
pub fn decode_json(text: &str) -> Result<Frame, CodecError> {
    Ok(serde_json::from_str(text)?)
}

/// Decode bridge JSON text, unpacking a `png` frame into the frame it carries.
///
/// # Errors
///
/// Returns [`CodecError::Json`] for malformed text, or any [`unpack_png`]
/// error for a broken `png` frame.
pub fn decode_text(text: &str) -> Result<Frame, CodecError> {
    let frame = decode_json(text)?;
    if frame.op == Op::Png { unpack_png(&frame) } else { Ok(frame) }
}

/// Recover the frame packed into a `png` frame.
///
/// Each pixel carries three bytes of JSON text in its red, green and blue
/// channels; alpha is ignored. Trailing padding is JSON whitespace.
///
/// # Errors
///
/// Returns [`CodecError::MissingData`], [`CodecError::Base64`],
/// [`CodecError::PngDecode`] or [`CodecError::UnsupportedPng`] for a broken
/// image, [`CodecError::Json`] if the text is not a frame, and
/// [`CodecError::NestedPng`] if it is another `png` frame.
pub fn unpack_png(frame: &Frame) -> Result<Frame, CodecError> {
    let data = frame.data.as_deref().ok_or(CodecError::MissingData)?;
    let bytes = BASE64.decode(data)?;

    let mut decoder = png::Decoder::new(bytes.as_slice());
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let (color, depth) = reader.output_color_type();
    let stride = match (color, depth) {
        (ColorType::Rgb, BitDepth::Eight) => 3,
        (ColorType::Rgba, BitDepth::Eight) => 4,
        _ => return Err(CodecError::UnsupportedPng { color, depth }),
    };
    let mut pixels = vec![0_u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut pixels)?;
    pixels.truncate(info.buffer_size());

    let text: Vec<u8> = pixels.chunks_exact(stride).flat_map(|px| px[..3].iter().copied()).collect();
    let inner: Frame = serde_json::from_slice(&text)?;
    if inner.op == Op::Png {
        return Err(CodecError::NestedPng);
    }
    Ok(inner)
}

/// Pack a frame into a `png` frame the way the bridge does.
///
/// The JSON text is padded with newlines to fill a near-square RGB image.
///
/// # Errors
///
/// Returns [`CodecError::Json`] if the frame cannot be serialized,
/// [`CodecError::TooLarge`] if the image would exceed PNG dimensions, and
/// [`CodecError::PngEncode`] if encoding fails.
pub fn pack_png(frame: &Frame) -> Result<Frame, CodecError> {
    let mut text = encode_json(frame)?.into_bytes();
    let len = text.len();
    let pixel_count = len.div_ceil(3);
    let width = pixel_count.isqrt().max(1);
    let height = pixel_count.div_ceil(width).max(1);
    text.resize(width * height * 3, b'\n');

    let too_large = || CodecError::TooLarge(len);
    let width = u32::try_from(width).map_err(|_| too_large())?;
    let height = u32::try_from(height).map_err(|_| too_large())?;

    let mut image = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut image, width, height);
        encoder.set_color(ColorType::Rgb);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&text)?;
        writer.finish()?;
    }
    Ok(Frame::png(BASE64.encode(image)))
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
