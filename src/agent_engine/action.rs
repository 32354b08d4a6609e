//! Structured "next action" returned by the decision service.
//!
//! The wire format is a loose JSON object (`POINT`, `to`, `duration`, `PRESS`,
//! `TYPE`, `STATUS`, `thought`). It is validated once here and turned into a
//! closed [`Action`]; nothing downstream touches raw JSON.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{TouchPilotError, TouchPilotResult};

/// Upper bound of the virtual coordinate space on each axis.
pub const VIRTUAL_MAX: f64 = 1000.0;

/// Gesture duration used when the service omits `duration`.
pub const DEFAULT_DURATION_MS: u64 = 200;

/// Position on the 0–1000 virtual grid, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualPoint {
    pub x: f64,
    pub y: f64,
}

impl VirtualPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn to_value(self) -> Value {
        Value::Array(vec![number(self.x), number(self.y)])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    /// Anything else the service sent; executed as a no-op.
    Other(String),
}

impl Direction {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Direction::Up,
            "down" => Direction::Down,
            "left" => Direction::Left,
            "right" => Direction::Right,
            _ => Direction::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Other(raw) => raw,
        }
    }
}

/// Where a swipe starting at `POINT` goes.
#[derive(Debug, Clone, PartialEq)]
pub enum SwipeTarget {
    Point(VirtualPoint),
    Direction(Direction),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Home,
    Back,
    Enter,
    /// Unsupported key name; executed as a no-op.
    Other(String),
}

impl Key {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "HOME" => Key::Home,
            "BACK" => Key::Back,
            "ENTER" => Key::Enter,
            _ => Key::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Key::Home => "HOME",
            Key::Back => "BACK",
            Key::Enter => "ENTER",
            Key::Other(raw) => raw,
        }
    }
}

/// Task-level outcome signal attached to every action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Continue,
    Finish,
    Satisfied,
    Impossible,
    Interrupt,
    NeedFeedback,
}

impl Status {
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "continue" => Some(Status::Continue),
            "finish" => Some(Status::Finish),
            "satisfied" => Some(Status::Satisfied),
            "impossible" => Some(Status::Impossible),
            "interrupt" => Some(Status::Interrupt),
            "need_feedback" => Some(Status::NeedFeedback),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Continue => "continue",
            Status::Finish => "finish",
            Status::Satisfied => "satisfied",
            Status::Impossible => "impossible",
            Status::Interrupt => "interrupt",
            Status::NeedFeedback => "need_feedback",
        }
    }
}

/// The operative part of an action. At most one per action.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Point {
        at: VirtualPoint,
        to: Option<SwipeTarget>,
        duration_ms: Option<u64>,
    },
    Press(Key),
    Type(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
    pub thought: Option<String>,
    pub directive: Option<Directive>,
    pub status: Status,
}

const POINT_KEYS: &[&str] = &["POINT", "point"];
const PRESS_KEYS: &[&str] = &["PRESS", "press"];
const TYPE_KEYS: &[&str] = &["TYPE", "type"];
const STATUS_KEYS: &[&str] = &["STATUS", "status"];

impl Action {
    /// Parse the raw text payload of one decision-service reply.
    pub fn parse(raw: &str) -> TouchPilotResult<Self> {
        let body = strip_code_fence(raw);
        let value: Value = serde_json::from_str(body)
            .map_err(|e| TouchPilotError::MalformedAction(format!("not JSON: {e}")))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> TouchPilotResult<Self> {
        let obj = value.as_object().ok_or_else(|| {
            TouchPilotError::MalformedAction(format!("expected a JSON object, got {value}"))
        })?;

        let thought = match obj.get("thought") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };

        let status = parse_status(field(obj, STATUS_KEYS));
        let duration_ms = parse_duration(obj.get("duration"))?;
        let to = parse_swipe_target(obj.get("to"))?;

        let point = field(obj, POINT_KEYS)
            .map(|v| parse_point(v, "POINT"))
            .transpose()?;
        let press = field(obj, PRESS_KEYS)
            .map(|v| expect_str(v, "PRESS").map(Key::parse))
            .transpose()?;
        let text = field(obj, TYPE_KEYS)
            .map(|v| expect_str(v, "TYPE").map(str::to_string))
            .transpose()?;

        let directive = match (point, press, text) {
            (Some(at), press, text) => {
                if press.is_some() || text.is_some() {
                    tracing::debug!("POINT takes precedence, dropping PRESS/TYPE");
                }
                Some(Directive::Point { at, to, duration_ms })
            }
            (None, Some(key), text) => {
                if text.is_some() {
                    tracing::debug!("PRESS takes precedence, dropping TYPE");
                }
                Some(Directive::Press(key))
            }
            (None, None, Some(text)) => Some(Directive::Type(text)),
            (None, None, None) => None,
        };

        if !matches!(directive, Some(Directive::Point { .. })) && obj.contains_key("to") {
            tracing::warn!("`to` without POINT is ignored");
        }

        Ok(Self {
            thought,
            directive,
            status,
        })
    }

    /// Canonical wire form; absent fields are omitted.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        if let Some(thought) = &self.thought {
            obj.insert("thought".into(), Value::String(thought.clone()));
        }
        match &self.directive {
            Some(Directive::Point {
                at,
                to,
                duration_ms,
            }) => {
                obj.insert("POINT".into(), at.to_value());
                match to {
                    Some(SwipeTarget::Point(p)) => {
                        obj.insert("to".into(), p.to_value());
                    }
                    Some(SwipeTarget::Direction(d)) => {
                        obj.insert("to".into(), Value::String(d.as_str().to_string()));
                    }
                    None => {}
                }
                if let Some(ms) = duration_ms {
                    obj.insert("duration".into(), Value::from(*ms));
                }
            }
            Some(Directive::Press(key)) => {
                obj.insert("PRESS".into(), Value::String(key.as_str().to_string()));
            }
            Some(Directive::Type(text)) => {
                obj.insert("TYPE".into(), Value::String(text.clone()));
            }
            None => {}
        }
        obj.insert("STATUS".into(), Value::String(self.status.as_str().into()));
        Value::Object(obj)
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// Chat models like to wrap JSON in a Markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|k| obj.get(*k))
        .filter(|v| !v.is_null())
}

fn expect_str<'a>(value: &'a Value, name: &str) -> TouchPilotResult<&'a str> {
    value.as_str().ok_or_else(|| {
        TouchPilotError::MalformedAction(format!("{name} must be a string, got {value}"))
    })
}

fn parse_point(value: &Value, name: &str) -> TouchPilotResult<VirtualPoint> {
    let malformed =
        || TouchPilotError::MalformedAction(format!("{name} must be a [x, y] pair, got {value}"));
    let items = value.as_array().ok_or_else(malformed)?;
    if items.len() != 2 {
        return Err(malformed());
    }
    let x = items[0].as_f64().filter(|v| v.is_finite()).ok_or_else(malformed)?;
    let y = items[1].as_f64().filter(|v| v.is_finite()).ok_or_else(malformed)?;
    Ok(VirtualPoint { x, y })
}

fn parse_swipe_target(value: Option<&Value>) -> TouchPilotResult<Option<SwipeTarget>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(SwipeTarget::Direction(Direction::parse(s)))),
        Some(v @ Value::Array(_)) => Ok(Some(SwipeTarget::Point(parse_point(v, "to")?))),
        Some(other) => Err(TouchPilotError::MalformedAction(format!(
            "to must be a direction or a [x, y] pair, got {other}"
        ))),
    }
}

fn parse_duration(value: Option<&Value>) -> TouchPilotResult<Option<u64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => match v.as_f64() {
            Some(ms) if ms.is_finite() && ms >= 0.0 => Ok(Some(ms.round() as u64)),
            _ => Err(TouchPilotError::MalformedAction(format!(
                "duration must be a non-negative number, got {v}"
            ))),
        },
    }
}

fn parse_status(value: Option<&Value>) -> Status {
    let Some(value) = value else {
        return Status::Continue;
    };
    match value.as_str().and_then(Status::from_wire) {
        Some(status) => status,
        None => {
            tracing::warn!(status = %value, "unrecognized STATUS, treating as continue");
            Status::Continue
        }
    }
}

fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tap_with_status() {
        let action =
            Action::parse(r#"{"thought":"tap the icon","POINT":[500,500],"STATUS":"continue"}"#)
                .unwrap();
        assert_eq!(action.thought.as_deref(), Some("tap the icon"));
        assert_eq!(action.status, Status::Continue);
        assert_eq!(
            action.directive,
            Some(Directive::Point {
                at: VirtualPoint::new(500.0, 500.0),
                to: None,
                duration_ms: None,
            })
        );
    }

    #[test]
    fn status_only_action_has_no_directive() {
        let action = Action::parse(r#"{"STATUS":"finish"}"#).unwrap();
        assert_eq!(action.directive, None);
        assert_eq!(action.status, Status::Finish);
    }

    #[test]
    fn missing_status_defaults_to_continue() {
        let action = Action::parse(r#"{"PRESS":"HOME"}"#).unwrap();
        assert_eq!(action.status, Status::Continue);
        assert_eq!(action.directive, Some(Directive::Press(Key::Home)));
    }

    #[test]
    fn unknown_status_falls_back_to_continue() {
        let action = Action::parse(r#"{"TYPE":"hi","STATUS":"celebrate"}"#).unwrap();
        assert_eq!(action.status, Status::Continue);
        let action = Action::parse(r#"{"STATUS":7}"#).unwrap();
        assert_eq!(action.status, Status::Continue);
    }

    #[test]
    fn lowercase_aliases_are_accepted() {
        let raw = r#"{"point":[100,900],"to":"up","duration":300,"status":"need_feedback"}"#;
        let action = Action::parse(raw).unwrap();
        assert_eq!(action.status, Status::NeedFeedback);
        assert_eq!(
            action.directive,
            Some(Directive::Point {
                at: VirtualPoint::new(100.0, 900.0),
                to: Some(SwipeTarget::Direction(Direction::Up)),
                duration_ms: Some(300),
            })
        );
    }

    #[test]
    fn point_beats_press_beats_type() {
        let action = Action::parse(r#"{"TYPE":"x","PRESS":"BACK","POINT":[1,2]}"#).unwrap();
        assert!(matches!(action.directive, Some(Directive::Point { .. })));

        let action = Action::parse(r#"{"TYPE":"x","PRESS":"BACK"}"#).unwrap();
        assert_eq!(action.directive, Some(Directive::Press(Key::Back)));
    }

    #[test]
    fn out_of_range_point_is_accepted_by_the_schema() {
        let action = Action::parse(r#"{"POINT":[-20,1012.5]}"#).unwrap();
        assert_eq!(
            action.directive,
            Some(Directive::Point {
                at: VirtualPoint::new(-20.0, 1012.5),
                to: None,
                duration_ms: None,
            })
        );
    }

    #[test]
    fn unknown_key_and_direction_are_kept_for_the_translator() {
        let action = Action::parse(r#"{"PRESS":"VOLUME_UP"}"#).unwrap();
        assert_eq!(
            action.directive,
            Some(Directive::Press(Key::Other("VOLUME_UP".into())))
        );

        let action = Action::parse(r#"{"POINT":[1,2],"to":"sideways"}"#).unwrap();
        match action.directive {
            Some(Directive::Point {
                to: Some(SwipeTarget::Direction(Direction::Other(d))),
                ..
            }) => assert_eq!(d, "sideways"),
            other => panic!("unexpected directive {other:?}"),
        }
    }

    #[test]
    fn shape_errors_are_malformed() {
        for raw in [
            "click the button",
            "[500, 500]",
            r#"{"POINT":[500]}"#,
            r#"{"POINT":"500,500"}"#,
            r#"{"POINT":[500,"a"]}"#,
            r#"{"POINT":[1,2],"to":42}"#,
            r#"{"POINT":[1,2],"duration":-5}"#,
            r#"{"PRESS":1}"#,
            r#"{"TYPE":["a"]}"#,
        ] {
            let err = Action::parse(raw).unwrap_err();
            assert!(
                matches!(err, TouchPilotError::MalformedAction(_)),
                "{raw} should be malformed, got {err:?}"
            );
        }
    }

    #[test]
    fn code_fence_is_stripped() {
        let action = Action::parse("```json\n{\"PRESS\":\"ENTER\"}\n```").unwrap();
        assert_eq!(action.directive, Some(Directive::Press(Key::Enter)));
    }

    #[test]
    fn to_without_point_is_ignored() {
        let action = Action::parse(r#"{"TYPE":"abc","to":"left"}"#).unwrap();
        assert_eq!(action.directive, Some(Directive::Type("abc".into())));
    }

    #[test]
    fn serialize_then_parse_preserves_every_directive() {
        let actions = [
            Action {
                thought: Some("drag".into()),
                directive: Some(Directive::Point {
                    at: VirtualPoint::new(120.0, 340.5),
                    to: Some(SwipeTarget::Point(VirtualPoint::new(800.0, 340.0))),
                    duration_ms: Some(450),
                }),
                status: Status::Continue,
            },
            Action {
                thought: None,
                directive: Some(Directive::Point {
                    at: VirtualPoint::new(500.0, 500.0),
                    to: Some(SwipeTarget::Direction(Direction::Left)),
                    duration_ms: None,
                }),
                status: Status::Interrupt,
            },
            Action {
                thought: Some("go home".into()),
                directive: Some(Directive::Press(Key::Home)),
                status: Status::Satisfied,
            },
            Action {
                thought: Some("search".into()),
                directive: Some(Directive::Type("weather in 北京".into())),
                status: Status::NeedFeedback,
            },
            Action {
                thought: None,
                directive: None,
                status: Status::Impossible,
            },
        ];
        for action in actions {
            let wire = serde_json::to_string(&action).unwrap();
            assert_eq!(Action::parse(&wire).unwrap(), action, "wire: {wire}");
        }
    }

    #[test]
    fn integral_coordinates_serialize_as_integers() {
        let action = Action {
            directive: Some(Directive::Point {
                at: VirtualPoint::new(500.0, 20.0),
                to: None,
                duration_ms: None,
            }),
            ..Action::default()
        };
        assert_eq!(action.to_string(), r#"{"POINT":[500,20],"STATUS":"continue"}"#);
    }
}
