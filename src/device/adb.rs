use async_trait::async_trait;
use tokio::process::Command;

use crate::device::text_input::{
    encode_for_adb_keyboard, escape_for_input_text, requires_ime, ADB_KEYBOARD_B64_ACTION,
};
use crate::device::traits::DeviceDriver;
use crate::device::types::{KeyEvent, ScreenSize};
use crate::errors::{TouchPilotError, TouchPilotResult};

/// Android device reached through the `adb` command-line tool.
pub struct AdbDriver {
    adb_path: String,
    serial: Option<String>,
}

impl AdbDriver {
    pub fn new(adb_path: impl Into<String>, serial: Option<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial,
        }
    }

    /// Fail early when the device is not reachable.
    pub async fn connect(
        adb_path: impl Into<String>,
        serial: Option<String>,
    ) -> TouchPilotResult<Self> {
        let driver = Self::new(adb_path, serial);
        let state = driver.run(&["get-state"]).await?;
        let state = String::from_utf8_lossy(&state).trim().to_string();
        if state != "device" {
            return Err(TouchPilotError::Device(format!(
                "device {} is in state '{state}'",
                driver.label()
            )));
        }
        tracing::info!(device = %driver.label(), "connected to device");
        Ok(driver)
    }

    fn label(&self) -> &str {
        self.serial.as_deref().unwrap_or("<default>")
    }

    async fn run(&self, args: &[&str]) -> TouchPilotResult<Vec<u8>> {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.args(args);

        let output = cmd.output().await.map_err(|e| {
            TouchPilotError::Device(format!("failed to run {}: {e}", self.adb_path))
        })?;
        if !output.status.success() {
            return Err(TouchPilotError::Device(format!(
                "adb {} exited with {}: {}",
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }

    async fn shell(&self, args: &[&str]) -> TouchPilotResult<String> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push("shell");
        full.extend_from_slice(args);
        let out = self.run(&full).await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    async fn orientation(&self) -> u32 {
        match self.shell(&["dumpsys", "input"]).await {
            Ok(out) => parse_surface_orientation(&out).unwrap_or(0),
            Err(e) => {
                tracing::warn!(error = %e, "could not read orientation, assuming portrait");
                0
            }
        }
    }

    async fn type_segment(&self, segment: &str) -> TouchPilotResult<()> {
        if segment.is_empty() {
            return Ok(());
        }
        if requires_ime(segment) {
            let payload = encode_for_adb_keyboard(segment);
            self.shell(&["am", "broadcast", "-a", ADB_KEYBOARD_B64_ACTION, "--es", "msg", &payload])
                .await?;
        } else {
            let escaped = escape_for_input_text(segment);
            self.shell(&["input", "text", &escaped]).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceDriver for AdbDriver {
    async fn screenshot(&self) -> TouchPilotResult<Vec<u8>> {
        let png = self.run(&["exec-out", "screencap", "-p"]).await?;
        if png.is_empty() {
            return Err(TouchPilotError::Device("screencap returned no data".into()));
        }
        tracing::debug!(bytes = png.len(), "screenshot captured");
        Ok(png)
    }

    async fn screen_size(&self) -> TouchPilotResult<ScreenSize> {
        let out = self.shell(&["wm", "size"]).await?;
        let (w, h) = parse_wm_size(&out).ok_or_else(|| {
            TouchPilotError::Device(format!("unexpected `wm size` output: {}", out.trim()))
        })?;
        // `wm size` reports the natural orientation.
        let size = if self.orientation().await % 2 == 1 {
            ScreenSize::new(h, w)
        } else {
            ScreenSize::new(w, h)
        };
        tracing::debug!(width = size.width, height = size.height, "screen size");
        Ok(size)
    }

    async fn tap(&self, x: i32, y: i32) -> TouchPilotResult<()> {
        tracing::info!(x, y, "tap");
        self.shell(&["input", "tap", &x.to_string(), &y.to_string()]).await?;
        Ok(())
    }

    async fn long_press(&self, x: i32, y: i32, duration_ms: u64) -> TouchPilotResult<()> {
        tracing::info!(x, y, duration_ms, "long press");
        let (x, y) = (x.to_string(), y.to_string());
        self.shell(&["input", "swipe", &x, &y, &x, &y, &duration_ms.to_string()])
            .await?;
        Ok(())
    }

    async fn swipe(
        &self,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        duration_ms: u64,
    ) -> TouchPilotResult<()> {
        tracing::info!(x1, y1, x2, y2, duration_ms, "swipe");
        self.shell(&[
            "input",
            "swipe",
            &x1.to_string(),
            &y1.to_string(),
            &x2.to_string(),
            &y2.to_string(),
            &duration_ms.to_string(),
        ])
        .await?;
        Ok(())
    }

    async fn press_key(&self, key: KeyEvent) -> TouchPilotResult<()> {
        tracing::info!(key = key.keycode(), "key press");
        self.shell(&["input", "keyevent", key.keycode()]).await?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> TouchPilotResult<()> {
        tracing::info!(chars = text.chars().count(), ime = requires_ime(text), "type text");
        // `input text` cannot type a newline; send ENTER between lines instead.
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                self.press_key(KeyEvent::Enter).await?;
            }
            self.type_segment(line).await?;
        }
        Ok(())
    }
}

/// Parse `wm size` output, preferring an override size over the physical one.
pub fn parse_wm_size(output: &str) -> Option<(u32, u32)> {
    let mut physical = None;
    let mut overridden = None;
    for line in output.lines() {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let Some((w, h)) = value.trim().split_once('x') else {
            continue;
        };
        let (Ok(w), Ok(h)) = (w.trim().parse::<u32>(), h.trim().parse::<u32>()) else {
            continue;
        };
        match label.trim() {
            "Override size" => overridden = Some((w, h)),
            "Physical size" => physical = Some((w, h)),
            _ => {}
        }
    }
    overridden.or(physical)
}

/// Rotation (0–3) from `dumpsys input`.
pub fn parse_surface_orientation(output: &str) -> Option<u32> {
    output.lines().find_map(|line| {
        line.trim()
            .strip_prefix("SurfaceOrientation:")
            .and_then(|v| v.trim().parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_size_is_parsed() {
        assert_eq!(parse_wm_size("Physical size: 1080x2400\n"), Some((1080, 2400)));
    }

    #[test]
    fn override_size_wins() {
        let out = "Physical size: 1440x3200\nOverride size: 1080x2400\n";
        assert_eq!(parse_wm_size(out), Some((1080, 2400)));
    }

    #[test]
    fn garbage_size_output_is_rejected() {
        assert_eq!(parse_wm_size("error: no devices/emulators found"), None);
        assert_eq!(parse_wm_size("Physical size: axb"), None);
    }

    #[test]
    fn orientation_is_read_from_dumpsys() {
        let out = [
            "  Viewport: displayId=0",
            "      SurfaceOrientation: 1",
            "      SurfaceRotation: 90",
        ]
        .join("\n");
        assert_eq!(parse_surface_orientation(&out), Some(1));
        assert_eq!(parse_surface_orientation("nothing here"), None);
    }

    #[test]
    fn keycodes_match_android_names() {
        assert_eq!(KeyEvent::Home.keycode(), "KEYCODE_HOME");
        assert_eq!(KeyEvent::Back.keycode(), "KEYCODE_BACK");
        assert_eq!(KeyEvent::Enter.keycode(), "KEYCODE_ENTER");
    }
}
