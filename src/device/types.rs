use serde::{Deserialize, Serialize};

/// Current pixel size of the screen in its present orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn shorter_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

/// Hardware/software keys the device layer can inject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyEvent {
    Home,
    Back,
    Enter,
}

impl KeyEvent {
    /// Android key code name understood by `input keyevent`.
    pub fn keycode(&self) -> &'static str {
        match self {
            KeyEvent::Home => "KEYCODE_HOME",
            KeyEvent::Back => "KEYCODE_BACK",
            KeyEvent::Enter => "KEYCODE_ENTER",
        }
    }
}
