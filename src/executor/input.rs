use crate::device::traits::DeviceDriver;
use crate::device::types::KeyEvent;
use crate::errors::TouchPilotResult;

/// One device-level primitive, in pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    Tap { x: i32, y: i32 },
    LongPress {
        x: i32,
        y: i32,
        duration_ms: u64,
    },
    Swipe {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        duration_ms: u64,
    },
    Key(KeyEvent),
    Text(String),
}

impl Gesture {
    /// Send this gesture to the device.
    pub async fn apply(&self, driver: &dyn DeviceDriver) -> TouchPilotResult<()> {
        match self {
            Gesture::Tap { x, y } => driver.tap(*x, *y).await,
            Gesture::LongPress { x, y, duration_ms } => {
                driver.long_press(*x, *y, *duration_ms).await
            }
            Gesture::Swipe {
                x1,
                y1,
                x2,
                y2,
                duration_ms,
            } => driver.swipe(*x1, *y1, *x2, *y2, *duration_ms).await,
            Gesture::Key(key) => driver.press_key(*key).await,
            Gesture::Text(text) => driver.type_text(text).await,
        }
    }
}
