use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use qsnap_core::CaptureResult;

use crate::error::CaptureError;
use crate::renderer::Bitmap;

/// Encode a rendered bitmap as PNG
pub fn encode_png(bitmap: Bitmap) -> Result<CaptureResult, CaptureError> {
    let Bitmap {
        width,
        height,
        rgba,
    } = bitmap;

    if width == 0 || height == 0 {
        return Err(CaptureError::Encoding(format!(
            "empty bitmap ({}x{})",
            width, height
        )));
    }

    let expected = width as usize * height as usize * 4;
    let actual = rgba.len();
    let image = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        CaptureError::Encoding(format!(
            "bitmap holds {} bytes, {}x{} RGBA needs {}",
            actual, width, height, expected
        ))
    })?;

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| CaptureError::Encoding(e.to_string()))?;

    Ok(CaptureResult {
        png: png.into_inner(),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    #[test]
    fn test_encode_png() {
        let result = encode_png(Bitmap::solid(4, 3, [255, 0, 0, 255])).unwrap();

        assert_eq!(&result.png[0..8], &PNG_SIGNATURE);
        assert_eq!((result.width, result.height), (4, 3));

        let decoded = image::load_from_memory(&result.png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_short_buffer_is_encoding_failure() {
        let bitmap = Bitmap {
            width: 10,
            height: 10,
            rgba: vec![0; 12],
        };
        let err = encode_png(bitmap).unwrap_err();
        assert!(matches!(err, CaptureError::Encoding(_)));
        assert!(err.is_render_failure());
    }

    #[test]
    fn test_empty_bitmap_is_encoding_failure() {
        let err = encode_png(Bitmap::solid(0, 5, [0; 4])).unwrap_err();
        assert!(matches!(err, CaptureError::Encoding(_)));
    }
}
