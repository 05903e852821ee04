use daydream_controller::config::{Color, ControllerConfig};
use daydream_controller::controller::DaydreamController;
use daydream_controller::data::{ButtonState, DeviceSnapshot, GamepadPose, HeadSample};
use daydream_controller::events::ControllerEvent;
use daydream_controller::host::{
    Camera, DeviceHandle, DeviceRegistry, EventSink, ModelBinder, ModelDescriptor, Transform,
};

use anyhow::{anyhow, Result};
use gilrs::{Axis, Button, EventType, Gilrs};
use log::*;
use nalgebra as na;
use simplelog::{Config, LevelFilter, TermLogger, TerminalMode};
use std::thread::sleep;
use std::time::Duration;

/// Trackpad, menu and system buttons in that order
const BUTTONS: [Button; 3] = [Button::South, Button::Start, Button::Mode];

struct GilrsRegistry {
    gilrs: Gilrs,
}

impl GilrsRegistry {
    /// Consumes pending events, returns true when a gamepad came or went
    fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Some(event) = self.gilrs.next_event() {
            if let EventType::Connected | EventType::Disconnected = event.event {
                changed = true;
            }
        }
        changed
    }
}

impl DeviceRegistry for GilrsRegistry {
    fn devices_by_prefix(&self, prefix: &str) -> Vec<DeviceHandle> {
        self.gilrs
            .gamepads()
            .filter(|(_, gamepad)| gamepad.is_connected() && gamepad.name().starts_with(prefix))
            .map(|(id, gamepad)| DeviceHandle::new(Into::<usize>::into(id), gamepad.name()))
            .collect()
    }

    fn snapshot(&self, device: &DeviceHandle) -> Option<DeviceSnapshot> {
        let (_, gamepad) = self
            .gilrs
            .gamepads()
            .find(|(id, gamepad)| Into::<usize>::into(*id) == device.index && gamepad.is_connected())?;
        Some(DeviceSnapshot {
            id: gamepad.name().to_owned(),
            pose: GamepadPose::default(),
            buttons: BUTTONS
                .iter()
                .map(|button| ButtonState::from_pressed(gamepad.is_pressed(*button)))
                .collect(),
            axes: [
                gamepad.value(Axis::LeftStickX),
                gamepad.value(Axis::LeftStickY),
            ],
        })
    }
}

/// Host without a scene, everything goes to the log
struct LogHost;

impl Camera for LogHost {
    fn head_pose(&self) -> HeadSample {
        HeadSample::standing()
    }
}

impl Transform for LogHost {
    fn set_rotation(&mut self, degrees: na::Vector3<f32>) {
        trace!("rotation {:.1} {:.1} {:.1}", degrees.x, degrees.y, degrees.z);
    }

    fn set_position(&mut self, position: na::Vector3<f32>) {
        trace!(
            "position {:.3} {:.3} {:.3}",
            position.x,
            position.y,
            position.z
        );
    }
}

impl ModelBinder for LogHost {
    fn attach(&mut self, _model: &ModelDescriptor) {}

    fn detach(&mut self) {}

    fn set_pivot(&mut self, _offset: na::Vector3<f32>) {}

    fn set_mesh_color(&mut self, _mesh: &str, _color: Color) {}
}

impl EventSink for LogHost {
    fn emit(&mut self, event: &ControllerEvent) {
        match event.to_json() {
            Ok(json) => info!("{}", json),
            Err(error) => warn!("Failed to serialize {}: {}", event.name(), error),
        }
    }
}

fn main() -> Result<()> {
    TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed)?;
    let config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::load(path)?,
        // any gamepad
        None => ControllerConfig {
            id_prefix: String::new(),
            model: false,
            ..ControllerConfig::default()
        },
    };
    let gilrs = Gilrs::new().map_err(|e| anyhow!("Failed to open gamepads: {}", e))?;
    let mut host = LogHost;
    let mut controller = DaydreamController::new(config, GilrsRegistry { gilrs });
    controller.play(&mut host);

    loop {
        sleep(Duration::from_millis(16));
        if controller.registry_mut().pump() {
            controller.on_device_connected(&mut host);
        }
        controller.tick(&mut host);
    }
}
