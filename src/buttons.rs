use crate::data::{AxisPair, ButtonState};
use crate::events::ControllerEvent;
use serde::Serialize;

pub const MAX_BUTTONS: usize = 4;

pub type ButtonRecord = ButtonState;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonId(u8);

impl ButtonId {
    pub const TRACKPAD: ButtonId = ButtonId(0);
    pub const MENU: ButtonId = ButtonId(1);
    pub const SYSTEM: ButtonId = ButtonId(2);

    pub fn new(index: usize) -> Option<Self> {
        if index < MAX_BUTTONS {
            Some(ButtonId(index as u8))
        } else {
            None
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("trackpad"),
            1 => Some("menu"),
            2 => Some("system"),
            _ => None,
        }
    }

    pub fn mesh_name(self) -> Option<&'static str> {
        match self.0 {
            0 => Some("touchpad"),
            1 => Some("menubutton"),
            2 => Some("systembutton"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ButtonTracker {
    records: [ButtonRecord; MAX_BUTTONS],
    previous_axis: Option<AxisPair>,
}

impl ButtonTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, id: ButtonId) -> ButtonRecord {
        self.records[id.index()]
    }

    pub fn previous_axis(&self) -> Option<AxisPair> {
        self.previous_axis
    }

    pub fn handle_press(
        &mut self,
        id: ButtonId,
        state: &ButtonState,
        events: &mut Vec<ControllerEvent>,
    ) -> bool {
        let record = &mut self.records[id.index()];
        if record.pressed == state.pressed {
            return false;
        }
        record.pressed = state.pressed;
        events.push(if state.pressed {
            ControllerEvent::ButtonDown { id }
        } else {
            ControllerEvent::ButtonUp { id }
        });
        true
    }

    pub fn handle_touch(
        &mut self,
        id: ButtonId,
        state: &ButtonState,
        axis: AxisPair,
        events: &mut Vec<ControllerEvent>,
    ) -> bool {
        let record = &mut self.records[id.index()];
        if record.touched == state.touched {
            return false;
        }
        record.touched = state.touched;
        let state = *record;
        events.push(if state.touched {
            ControllerEvent::TouchStart { id, state, axis }
        } else {
            ControllerEvent::TouchEnd { id, state, axis }
        });
        true
    }

    /// A single `buttonchanged` follows when either press or touch changed
    pub fn handle_trackpad(
        &mut self,
        state: &ButtonState,
        axis: AxisPair,
        events: &mut Vec<ControllerEvent>,
    ) -> bool {
        let id = ButtonId::TRACKPAD;
        let pressed = self.handle_press(id, state, events);
        let touched = self.handle_touch(id, state, axis, events);
        if !(pressed || touched) {
            return false;
        }
        events.push(ControllerEvent::ButtonChanged { id, state: *state });
        true
    }

    /// Exact comparison, sensor noise counts as movement
    #[allow(clippy::float_cmp)]
    pub fn handle_axes(&mut self, axis: AxisPair, events: &mut Vec<ControllerEvent>) -> bool {
        if self.previous_axis == Some(axis) {
            return false;
        }
        self.previous_axis = Some(axis);
        events.push(ControllerEvent::AxisMove { axis });
        true
    }
}
