//! Single-slot frame hand-off between the decode thread and the host

use image::RgbaImage;
use parking_lot::Mutex;

/// A decoded frame converted to RGBA
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub image: RgbaImage,
    /// Presentation timestamp in seconds
    pub pts_seconds: f64,
}

impl DecodedFrame {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Holds at most one unfetched frame. Publishing overwrites whatever the
/// host has not picked up yet; there is no queue and no drop counter.
#[derive(Debug, Default)]
pub struct FrameSlot {
    latest: Mutex<Option<DecodedFrame>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame`, returning `true` if an unfetched frame was replaced.
    pub fn publish(&self, frame: DecodedFrame) -> bool {
        self.latest.lock().replace(frame).is_some()
    }

    pub fn take(&self) -> Option<DecodedFrame> {
        self.latest.lock().take()
    }

    pub fn is_ready(&self) -> bool {
        self.latest.lock().is_some()
    }

    pub fn clear(&self) {
        self.latest.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pts_seconds: f64) -> DecodedFrame {
        DecodedFrame {
            image: RgbaImage::new(4, 2),
            pts_seconds,
        }
    }

    #[test]
    fn test_latest_frame_wins() {
        let slot = FrameSlot::new();
        assert!(!slot.is_ready());

        assert!(!slot.publish(frame(0.0)));
        assert!(slot.publish(frame(0.04)));
        assert!(slot.publish(frame(0.08)));
        assert!(slot.is_ready());

        let taken = slot.take().unwrap();
        assert_eq!(taken.pts_seconds, 0.08);
        assert_eq!((taken.width(), taken.height()), (4, 2));
        assert!(!slot.is_ready());
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_clear() {
        let slot = FrameSlot::new();
        slot.publish(frame(1.0));
        slot.clear();
        assert!(!slot.is_ready());
    }
}
