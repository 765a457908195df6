//! Screen-region capture
//!
//! A [`RegionSelector`] turns pointer input into a rectangle, [`capture_region`]
//! grabs and crops the visible page, and the [`CaptureSlot`] holds the result
//! until the prompt view picks it up.

pub mod selector;
pub mod slot;

pub use selector::{LogOverlay, OverlaySurface, PointerEvent, RegionSelector, SelectorStep};
pub use slot::CaptureSlot;

use crate::crawlers::{PageController, Screenshot};
use crate::error::CaptureError;
use crate::models::{CaptureRecord, CaptureRect};
use base64::Engine;
use image::ImageFormat;
use std::io::Cursor;
use std::time::Duration;

/// URL prefixes of browser-internal pages that cannot be captured
pub const RESTRICTED_PREFIXES: [&str; 5] =
    ["chrome:", "chrome-extension:", "edge:", "about:", "data:"];

pub fn is_restricted(url: &str) -> bool {
    RESTRICTED_PREFIXES
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Captures `rect` of the page behind `handle`
///
/// The capture races `timeout`; a capture that loses is ignored, not retried.
pub async fn capture_region<C: PageController>(
    controller: &C,
    handle: &C::Handle,
    rect: CaptureRect,
    timeout: Duration,
) -> Result<CaptureRecord, CaptureError> {
    let shot = match tokio::time::timeout(timeout, controller.capture_visible_region(handle)).await
    {
        Ok(Ok(shot)) => shot,
        Ok(Err(e)) => {
            ::log::error!("Screen capture failed: {}", e);
            return Err(CaptureError::Failed(e.to_string()));
        }
        Err(_) => {
            let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
            ::log::warn!("Screen capture timed out after {} ms", ms);
            return Err(CaptureError::Timeout(ms));
        }
    };

    let png = crop_png(&shot, rect)?;
    let record = CaptureRecord {
        rect,
        image: base64::engine::general_purpose::STANDARD.encode(png),
        captured_at: chrono::Utc::now().timestamp_millis(),
    };
    ::log::info!(
        "Captured {}x{} region at ({}, {})",
        rect.width,
        rect.height,
        rect.x,
        rect.y
    );
    Ok(record)
}

/// Cuts the CSS-pixel rectangle out of a screenshot, scaled by its pixel ratio
pub fn crop_png(shot: &Screenshot, rect: CaptureRect) -> Result<Vec<u8>, CaptureError> {
    let img = image::load_from_memory(&shot.png)
        .map_err(|e| CaptureError::Failed(format!("unreadable screenshot: {}", e)))?;

    let ratio = if shot.device_pixel_ratio > 0.0 {
        shot.device_pixel_ratio
    } else {
        1.0
    };
    let scale = |v: u32| (f64::from(v) * ratio).round() as u32;

    let x = scale(rect.x).min(img.width());
    let y = scale(rect.y).min(img.height());
    let width = scale(rect.width).min(img.width() - x);
    let height = scale(rect.height).min(img.height() - y);
    if width == 0 || height == 0 {
        return Err(CaptureError::Failed(
            "selection lies outside the visible page".to_string(),
        ));
    }

    let cropped = img.crop_imm(x, y, width, height);
    let mut buffer = Cursor::new(Vec::new());
    cropped
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| CaptureError::Failed(format!("failed to encode image: {}", e)))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ControllerError;
    use crate::inspector::{InspectRequest, InspectResponse};
    use async_trait::async_trait;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        img.put_pixel(20, 20, Rgba([255, 0, 0, 255]));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    struct Camera {
        hang: bool,
    }

    #[async_trait]
    impl PageController for Camera {
        type Handle = usize;

        async fn active_page(&self) -> Result<usize, ControllerError> {
            Ok(0)
        }

        async fn page_url(&self, _: &usize) -> Result<String, ControllerError> {
            Ok("https://example.com/".to_string())
        }

        async fn open_page(&self, _: &str) -> Result<usize, ControllerError> {
            unreachable!()
        }

        async fn wait_for_load(&self, _: &usize) -> Result<(), ControllerError> {
            Ok(())
        }

        async fn send_to_page(
            &self,
            _: &usize,
            _: &InspectRequest,
        ) -> Result<InspectResponse, ControllerError> {
            unreachable!()
        }

        async fn close_page(&self, _: &usize) -> Result<(), ControllerError> {
            Ok(())
        }

        async fn capture_visible_region(&self, _: &usize) -> Result<Screenshot, ControllerError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(Screenshot {
                png: png(100, 80),
                device_pixel_ratio: 2.0,
            })
        }
    }

    #[test]
    fn test_restricted_urls() {
        assert!(is_restricted("chrome://settings"));
        assert!(is_restricted("chrome-extension://abc/popup.html"));
        assert!(is_restricted("about:blank"));
        assert!(is_restricted("data:text/html,hi"));
        assert!(!is_restricted("https://example.com/about:us"));
    }

    #[test]
    fn test_crop_scales_by_pixel_ratio() {
        let shot = Screenshot {
            png: png(100, 80),
            device_pixel_ratio: 2.0,
        };
        let rect = CaptureRect { x: 10, y: 10, width: 15, height: 10 };

        let cropped = image::load_from_memory(&crop_png(&shot, rect).unwrap()).unwrap();
        assert_eq!(cropped.dimensions(), (30, 20));
        assert_eq!(cropped.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_crop_clamps_to_screenshot() {
        let shot = Screenshot {
            png: png(100, 80),
            device_pixel_ratio: 1.0,
        };
        let rect = CaptureRect { x: 90, y: 70, width: 50, height: 50 };
        let cropped = image::load_from_memory(&crop_png(&shot, rect).unwrap()).unwrap();
        assert_eq!(cropped.dimensions(), (10, 10));

        let outside = CaptureRect { x: 200, y: 0, width: 20, height: 20 };
        assert!(matches!(crop_png(&shot, outside), Err(CaptureError::Failed(_))));
    }

    #[tokio::test]
    async fn test_capture_region_stores_base64_png() {
        let rect = CaptureRect { x: 0, y: 0, width: 20, height: 20 };
        let record = capture_region(&Camera { hang: false }, &0, rect, Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(record.rect, rect);
        assert!(record.captured_at > 0);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&record.image)
            .unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.dimensions(), (40, 40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_times_out() {
        let rect = CaptureRect { x: 0, y: 0, width: 20, height: 20 };
        let result =
            capture_region(&Camera { hang: true }, &0, rect, Duration::from_secs(10)).await;
        assert!(matches!(result, Err(CaptureError::Timeout(10_000))));
    }
}
