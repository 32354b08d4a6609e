use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenshotMeta {
    /// Size of the capture as delivered by the device.
    pub source_width: u32,
    pub source_height: u32,
    /// Size of the image actually sent to the model.
    pub width: u32,
    pub height: u32,
}

impl ScreenshotMeta {
    pub fn was_resized(&self) -> bool {
        self.source_width != self.width || self.source_height != self.height
    }
}

/// Screenshot ready to be embedded in a request.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// PNG bytes, base64 encoded.
    pub image_base64: String,
    pub meta: ScreenshotMeta,
}

impl PreparedImage {
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.image_base64)
    }
}
