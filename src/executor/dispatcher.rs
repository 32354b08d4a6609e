// Action → gesture translation and dispatch.
use crate::agent_engine::action::{
    Action, Direction, Directive, Key, Status, SwipeTarget, VirtualPoint, DEFAULT_DURATION_MS,
};
use crate::device::traits::DeviceDriver;
use crate::device::types::{KeyEvent, ScreenSize};
use crate::errors::TouchPilotResult;
use crate::executor::coordinator::{swipe_distance, virtual_to_physical};
use crate::executor::input::Gesture;

/// A POINT held longer than this is a long press rather than a tap.
pub const LONG_PRESS_THRESHOLD_MS: u64 = 200;

/// Plan the gesture for `action` on a screen of `size`. `None` means nothing
/// to do on the device (status-only action, unknown key or direction).
pub fn plan(action: &Action, size: ScreenSize) -> Option<Gesture> {
    match action.directive.as_ref()? {
        Directive::Point {
            at,
            to,
            duration_ms,
        } => plan_point(*at, to.as_ref(), *duration_ms, size),
        Directive::Press(key) => plan_key(key),
        Directive::Type(text) => Some(Gesture::Text(text.clone())),
    }
}

fn plan_point(
    at: VirtualPoint,
    to: Option<&SwipeTarget>,
    duration_ms: Option<u64>,
    size: ScreenSize,
) -> Option<Gesture> {
    let (x1, y1) = virtual_to_physical(at, size);
    let duration_ms = duration_ms.unwrap_or(DEFAULT_DURATION_MS);
    let (x2, y2) = match to {
        Some(SwipeTarget::Point(end)) => virtual_to_physical(*end, size),
        Some(SwipeTarget::Direction(direction)) => {
            let d = swipe_distance(size);
            match direction {
                Direction::Up => (x1, y1 - d),
                Direction::Down => (x1, y1 + d),
                Direction::Left => (x1 - d, y1),
                Direction::Right => (x1 + d, y1),
                Direction::Other(raw) => {
                    tracing::warn!(direction = %raw, "unrecognized swipe direction, ignoring");
                    return None;
                }
            }
        }
        None if duration_ms > LONG_PRESS_THRESHOLD_MS => {
            return Some(Gesture::LongPress {
                x: x1,
                y: y1,
                duration_ms,
            });
        }
        None => return Some(Gesture::Tap { x: x1, y: y1 }),
    };
    Some(Gesture::Swipe {
        x1,
        y1,
        x2,
        y2,
        duration_ms,
    })
}

fn plan_key(key: &Key) -> Option<Gesture> {
    match key {
        Key::Home => Some(Gesture::Key(KeyEvent::Home)),
        Key::Back => Some(Gesture::Key(KeyEvent::Back)),
        Key::Enter => Some(Gesture::Key(KeyEvent::Enter)),
        Key::Other(raw) => {
            tracing::warn!(key = %raw, "unrecognized key, ignoring");
            None
        }
    }
}

/// Execute `action` on the device and return its status.
///
/// POINT actions query the screen size on every call since the orientation
/// may have changed since the previous step. Keys and text need no geometry.
pub async fn execute(driver: &dyn DeviceDriver, action: &Action) -> TouchPilotResult<Status> {
    if let Some(thought) = &action.thought {
        tracing::info!(thought = %thought, "model reasoning");
    }
    let gesture = match &action.directive {
        Some(Directive::Point {
            at,
            to,
            duration_ms,
        }) => {
            let size = driver.screen_size().await?;
            plan_point(*at, to.as_ref(), *duration_ms, size)
        }
        Some(Directive::Press(key)) => plan_key(key),
        Some(Directive::Type(text)) => Some(Gesture::Text(text.clone())),
        None => None,
    };
    match gesture {
        Some(gesture) => {
            tracing::info!(?gesture, "dispatching gesture");
            gesture.apply(driver).await?;
        }
        None => tracing::info!(
            status = action.status.as_str(),
            "no device operation for this action"
        ),
    }
    Ok(action.status)
}
