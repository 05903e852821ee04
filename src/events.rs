use crate::buttons::{ButtonId, ButtonRecord};
use crate::data::{AxisPair, ButtonState};
use serde::Serialize;

/// Discrete interaction events, serialized with their literal event name
/// under `type`
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControllerEvent {
    ButtonDown {
        id: ButtonId,
    },
    ButtonUp {
        id: ButtonId,
    },
    TouchStart {
        id: ButtonId,
        state: ButtonRecord,
        axis: AxisPair,
    },
    TouchEnd {
        id: ButtonId,
        state: ButtonRecord,
        axis: AxisPair,
    },
    ButtonChanged {
        id: ButtonId,
        state: ButtonState,
    },
    AxisMove {
        axis: AxisPair,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Down,
    Up,
    TouchStart,
    TouchEnd,
}

impl ControllerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerEvent::ButtonDown { .. } => "buttondown",
            ControllerEvent::ButtonUp { .. } => "buttonup",
            ControllerEvent::TouchStart { .. } => "touchstart",
            ControllerEvent::TouchEnd { .. } => "touchend",
            ControllerEvent::ButtonChanged { .. } => "buttonchanged",
            ControllerEvent::AxisMove { .. } => "axismove",
        }
    }

    pub fn feedback(&self) -> Option<(ButtonId, Feedback)> {
        match *self {
            ControllerEvent::ButtonDown { id } => Some((id, Feedback::Down)),
            ControllerEvent::ButtonUp { id } => Some((id, Feedback::Up)),
            ControllerEvent::TouchStart { id, .. } => Some((id, Feedback::TouchStart)),
            ControllerEvent::TouchEnd { id, .. } => Some((id, Feedback::TouchEnd)),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
