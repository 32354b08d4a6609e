//! In-memory device used by unit tests.
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::device::traits::DeviceDriver;
use crate::device::types::{KeyEvent, ScreenSize};
use crate::errors::{TouchPilotError, TouchPilotResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    Screenshot,
    ScreenSize,
    Tap(i32, i32),
    LongPress(i32, i32, u64),
    Swipe(i32, i32, i32, i32, u64),
    Key(KeyEvent),
    Text(String),
}

pub struct RecordingDriver {
    size: ScreenSize,
    png: Vec<u8>,
    fail_screenshot: bool,
    fail_gestures: bool,
    calls: Mutex<Vec<DeviceCall>>,
}

impl RecordingDriver {
    pub fn new(size: ScreenSize) -> Self {
        Self {
            size,
            png: solid_png(size.width.min(64), size.height.min(64)),
            fail_screenshot: false,
            fail_gestures: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_screenshots(mut self) -> Self {
        self.fail_screenshot = true;
        self
    }

    pub fn failing_gestures(mut self) -> Self {
        self.fail_gestures = true;
        self
    }

    pub fn take_calls(&self) -> Vec<DeviceCall> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    /// Calls other than screenshot and size queries.
    pub fn gestures(&self) -> Vec<DeviceCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !matches!(c, DeviceCall::Screenshot | DeviceCall::ScreenSize))
            .cloned()
            .collect()
    }

    fn record(&self, call: DeviceCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn gesture(&self, call: DeviceCall) -> TouchPilotResult<()> {
        self.record(call);
        if self.fail_gestures {
            return Err(TouchPilotError::Device("device disconnected".into()));
        }
        Ok(())
    }
}

pub fn solid_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 144, 255]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

#[async_trait]
impl DeviceDriver for RecordingDriver {
    async fn screenshot(&self) -> TouchPilotResult<Vec<u8>> {
        self.record(DeviceCall::Screenshot);
        if self.fail_screenshot {
            return Err(TouchPilotError::Device("screencap failed".into()));
        }
        Ok(self.png.clone())
    }

    async fn screen_size(&self) -> TouchPilotResult<ScreenSize> {
        self.record(DeviceCall::ScreenSize);
        Ok(self.size)
    }

    async fn tap(&self, x: i32, y: i32) -> TouchPilotResult<()> {
        self.gesture(DeviceCall::Tap(x, y))
    }

    async fn long_press(&self, x: i32, y: i32, duration_ms: u64) -> TouchPilotResult<()> {
        self.gesture(DeviceCall::LongPress(x, y, duration_ms))
    }

    async fn swipe(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        duration_ms: u64,
    ) -> TouchPilotResult<()> {
        self.gesture(DeviceCall::Swipe(x1, y1, x2, y2, duration_ms))
    }

    async fn press_key(&self, key: KeyEvent) -> TouchPilotResult<()> {
        self.gesture(DeviceCall::Key(key))
    }

    async fn type_text(&self, text: &str) -> TouchPilotResult<()> {
        self.gesture(DeviceCall::Text(text.to_string()))
    }
}
