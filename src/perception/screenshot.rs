use base64::Engine as _;
use image::imageops::FilterType;

use crate::device::traits::DeviceDriver;
use crate::errors::{TouchPilotError, TouchPilotResult};
use crate::perception::types::{PreparedImage, ScreenshotMeta};

/// Capture the device screen and prepare it for the decision service.
pub async fn capture(driver: &dyn DeviceDriver, max_edge: u32) -> TouchPilotResult<PreparedImage> {
    let png = driver.screenshot().await?;
    // Decoding and Lanczos resampling are CPU-bound.
    let prepared = tokio::task::spawn_blocking(move || prepare_for_model(&png, max_edge))
        .await
        .map_err(|e| TouchPilotError::Perception(format!("join: {e}")))??;
    tracing::debug!(
        src = %format!("{}x{}", prepared.meta.source_width, prepared.meta.source_height),
        sent = %format!("{}x{}", prepared.meta.width, prepared.meta.height),
        resized = prepared.meta.was_resized(),
        "screenshot prepared"
    );
    Ok(prepared)
}

/// Shrink so that neither side exceeds `max_edge`, keeping the aspect ratio.
/// Height is fitted first, then width.
pub fn fit_within(width: u32, height: u32, max_edge: u32) -> (u32, u32) {
    let (mut w, mut h) = (width as u64, height as u64);
    let max = max_edge as u64;
    if h > max {
        w = w * max / h;
        h = max;
    }
    if w > max {
        h = h * max / w;
        w = max;
    }
    (w.max(1) as u32, h.max(1) as u32)
}

/// Decode `bytes`, downscale with Lanczos if needed, re-encode as base64 PNG.
pub fn prepare_for_model(bytes: &[u8], max_edge: u32) -> TouchPilotResult<PreparedImage> {
    let img = image::load_from_memory(bytes)?;
    let (source_width, source_height) = (img.width(), img.height());
    let (width, height) = fit_within(source_width, source_height, max_edge);

    let img = if (width, height) != (source_width, source_height) {
        img.resize_exact(width, height, FilterType::Lanczos3)
    } else {
        img
    };

    let mut out = Vec::new();
    image::DynamicImage::ImageRgb8(img.to_rgb8())
        .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)?;

    Ok(PreparedImage {
        image_base64: base64::engine::general_purpose::STANDARD.encode(&out),
        meta: ScreenshotMeta {
            source_width,
            source_height,
            width,
            height,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 144, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn fit_within_matches_long_edge_rule() {
        assert_eq!(fit_within(1080, 2400, 1120), (504, 1120));
        assert_eq!(fit_within(2400, 1080, 1120), (1120, 504));
        assert_eq!(fit_within(800, 600, 1120), (800, 600));
        assert_eq!(fit_within(1120, 1120, 1120), (1120, 1120));
    }

    #[test]
    fn portrait_capture_is_downscaled() {
        let prepared = prepare_for_model(&png(216, 480), 112).unwrap();
        assert_eq!(prepared.meta.width, 50);
        assert_eq!(prepared.meta.height, 112);
        assert!(prepared.meta.was_resized());

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&prepared.image_base64)
            .unwrap();
        let img = image::load_from_memory(&decoded).unwrap();
        assert_eq!((img.width(), img.height()), (50, 112));
        assert!(prepared.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn small_capture_is_kept_as_is() {
        let prepared = prepare_for_model(&png(64, 32), 1120).unwrap();
        assert!(!prepared.meta.was_resized());
        assert_eq!((prepared.meta.width, prepared.meta.height), (64, 32));
    }

    #[test]
    fn garbage_bytes_are_an_image_error() {
        assert!(matches!(
            prepare_for_model(b"not an image", 1120),
            Err(TouchPilotError::Image(_))
        ));
    }
}
