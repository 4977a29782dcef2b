//! Texture/Video embedding (§4.3, §6 `embedImages`/`maxTextureSize`).
//!
//! This is the encoder's one fallible internal path (§7, §9): everything
//! else is infallible by construction, but decoding a caller-supplied PNG
//! buffer can fail (a stand-in for a CORS-tainted or corrupt source image).
//! Callers are expected to log a warning and omit the texture on `Err`.

use image::imageops::FilterType;

use crate::error::TextureError;
use crate::names::{name_with_class, sanitize_texture_name, FbxClass};
use crate::node::{FbxNode, PropertyValue};

/// Decodes `png_bytes`, downscaling to fit within `max_size` (if set and
/// exceeded) before re-encoding. Returns the bytes unchanged when no resize
/// is needed.
pub fn prepare_embedded_png(png_bytes: &[u8], max_size: Option<u32>) -> Result<Vec<u8>, TextureError> {
    let img = image::load_from_memory(png_bytes)?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(TextureError::EmptyImage);
    }

    let needs_resize = max_size.is_some_and(|max| width > max || height > max);
    if !needs_resize {
        return Ok(png_bytes.to_vec());
    }

    let max = max_size.unwrap();
    let resized = img.resize(max, max, FilterType::Lanczos3);
    let mut out = Vec::new();
    resized.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)?;
    Ok(out)
}

pub fn embedded_filename(raw_name: &str, fallback_uuid: u64) -> String {
    format!("{}.png", sanitize_texture_name(raw_name, fallback_uuid))
}

pub fn video_node(video_id: u64, filename: &str, png_bytes: Vec<u8>) -> FbxNode {
    FbxNode::new("Video")
        .prop(video_id as i64)
        .prop(name_with_class(filename, FbxClass::Video))
        .prop("Clip")
        .child(FbxNode::leaf_str("Type", "Clip"))
        .child(FbxNode::new("Properties70"))
        .child(FbxNode::leaf_str("Filename", filename))
        .child(FbxNode::leaf_str("RelativeFilename", filename))
        .child(FbxNode::new("Content").prop(PropertyValue::Raw(png_bytes)))
}

pub fn texture_node(texture_id: u64, filename: &str) -> FbxNode {
    FbxNode::new("Texture")
        .prop(texture_id as i64)
        .prop(name_with_class(filename, FbxClass::Texture))
        .prop("")
        .child(FbxNode::leaf_str("Type", "TextureVideoClip"))
        .child(FbxNode::leaf_i32("Version", 202))
        .child(FbxNode::leaf_str("TextureName", name_with_class(filename, FbxClass::Texture)))
        .child(FbxNode::new("Properties70"))
        .child(FbxNode::leaf_str("Media", filename))
        .child(FbxNode::leaf_str("FileName", filename))
        .child(FbxNode::leaf_str("RelativeFilename", filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([255, 0, 0, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn corrupt_bytes_are_an_error() {
        let result = prepare_embedded_png(b"not a png", None);
        assert!(result.is_err());
    }

    #[test]
    fn under_max_size_passes_through_unchanged() {
        let png = tiny_png();
        let result = prepare_embedded_png(&png, Some(256)).unwrap();
        assert_eq!(result, png);
    }

    #[test]
    fn over_max_size_is_resized() {
        let png = tiny_png();
        let result = prepare_embedded_png(&png, Some(2)).unwrap();
        let resized = image::load_from_memory(&result).unwrap();
        assert!(resized.width() <= 2 && resized.height() <= 2);
    }

    #[test]
    fn filename_sanitizes_and_appends_extension() {
        assert_eq!(embedded_filename("Body Albedo.png", 1), "Body_Albedo_png.png");
    }
}
