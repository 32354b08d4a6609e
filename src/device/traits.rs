use async_trait::async_trait;

use crate::device::types::{KeyEvent, ScreenSize};
use crate::errors::TouchPilotResult;

/// Imperative surface of the touchscreen device. All coordinates are pixels
/// in the current orientation; durations are milliseconds.
#[async_trait]
pub trait DeviceDriver: Send + Sync {
    /// PNG-encoded capture of the current screen.
    async fn screenshot(&self) -> TouchPilotResult<Vec<u8>>;

    /// Queried live; orientation may change between steps.
    async fn screen_size(&self) -> TouchPilotResult<ScreenSize>;

    async fn tap(&self, x: i32, y: i32) -> TouchPilotResult<()>;

    async fn long_press(&self, x: i32, y: i32, duration_ms: u64) -> TouchPilotResult<()>;

    async fn swipe(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        duration_ms: u64,
    ) -> TouchPilotResult<()>;

    async fn press_key(&self, key: KeyEvent) -> TouchPilotResult<()>;

    /// Inject `text` verbatim into the focused field.
    async fn type_text(&self, text: &str) -> TouchPilotResult<()>;
}
