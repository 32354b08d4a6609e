// Virtual 0–1000 grid → device pixels. The only place this mapping happens.
use crate::agent_engine::action::{VirtualPoint, VIRTUAL_MAX};
use crate::device::types::ScreenSize;

/// Map one virtual axis value onto `extent` pixels.
///
/// The input is clamped to [0, 1000] first; the result is clamped to the last
/// pixel so that 1000 stays on screen.
pub fn virtual_to_pixel(v: f64, extent: u32) -> i32 {
    let v = v.clamp(0.0, VIRTUAL_MAX);
    let px = (v * extent as f64 / VIRTUAL_MAX).round() as i64;
    px.min(extent.saturating_sub(1) as i64) as i32
}

/// Convert a virtual point to physical pixel coordinates.
pub fn virtual_to_physical(point: VirtualPoint, size: ScreenSize) -> (i32, i32) {
    (
        virtual_to_pixel(point.x, size.width),
        virtual_to_pixel(point.y, size.height),
    )
}

/// Length of a directional swipe: a third of the shorter screen side.
pub fn swipe_distance(size: ScreenSize) -> i32 {
    (size.shorter_side() / 3) as i32
}
