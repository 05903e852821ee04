use crate::arm_model::{euler_xyz, ArmModel, ResultPose};
use crate::buttons::{ButtonId, ButtonRecord, ButtonTracker};
use crate::config::ControllerConfig;
use crate::data::DeviceSnapshot;
use crate::events::{ControllerEvent, Feedback};
use crate::host::{DeviceHandle, DeviceRegistry, Host, LoadedModel, ModelDescriptor};
use log::*;
use nalgebra as na;

pub struct DaydreamController<R: DeviceRegistry> {
    config: ControllerConfig,
    registry: R,
    arm_model: ArmModel,
    buttons: ButtonTracker,
    device: Option<DeviceHandle>,
    listening: bool,
    model_listener: bool,
    button_meshes: Option<LoadedModel>,
}

impl<R: DeviceRegistry> DaydreamController<R> {
    pub const MODEL_PIVOT: [f32; 3] = [0.0, -0.015, 0.04];

    pub fn new(config: ControllerConfig, registry: R) -> Self {
        let arm_model = ArmModel::new(config.arm_model.clone(), config.hand);
        Self {
            config,
            registry,
            arm_model,
            buttons: ButtonTracker::new(),
            device: None,
            listening: false,
            model_listener: false,
            button_meshes: None,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    pub fn device(&self) -> Option<&DeviceHandle> {
        self.device.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.device.is_some()
    }

    /// Extrapolated pose, once one has been computed
    pub fn pose(&self) -> Option<&ResultPose> {
        if self.arm_model.is_ready() {
            Some(self.arm_model.pose())
        } else {
            None
        }
    }

    pub fn button_record(&self, id: ButtonId) -> ButtonRecord {
        self.buttons.record(id)
    }

    pub fn play(&mut self, host: &mut impl Host) {
        self.listening = true;
        self.check_presence(host);
    }

    pub fn pause(&mut self) {
        self.listening = false;
    }

    pub fn on_device_connected(&mut self, host: &mut impl Host) {
        if self.listening {
            self.check_presence(host);
        }
    }

    pub fn on_device_disconnected(&mut self, host: &mut impl Host) {
        if self.listening {
            self.check_presence(host);
        }
    }

    pub fn on_model_loaded(&mut self, host: &mut impl Host, model: &LoadedModel) {
        if !self.model_listener || !self.config.model {
            return;
        }
        self.button_meshes = Some(model.clone());
        host.set_pivot(na::Vector3::from(Self::MODEL_PIVOT));
    }

    fn check_presence(&mut self, host: &mut impl Host) {
        let devices = self.registry.devices_by_prefix(&self.config.id_prefix);
        let bound = self.device.take();
        let same = bound
            .as_ref()
            .and_then(|bound| devices.iter().find(|d| d.id == bound.id).cloned());
        self.device = same.or_else(|| devices.into_iter().next());

        match (bound, &self.device) {
            (None, None) => {}
            (None, Some(device)) => {
                info!("Bound controller {:?} at index {}", device.id, device.index);
                self.arm_model.reset();
                self.model_listener = true;
                if self.config.model {
                    host.attach(&ModelDescriptor::vive_controller());
                }
            }
            (Some(bound), None) => {
                info!("Controller {:?} went away", bound.id);
                host.detach();
                self.model_listener = false;
                self.button_meshes = None;
            }
            (Some(bound), Some(device)) => {
                if bound.id != device.id {
                    info!(
                        "Controller {:?} went away, switching to {:?}",
                        bound.id, device.id
                    );
                    self.arm_model.reset();
                }
            }
        }
    }

    pub fn tick(&mut self, host: &mut impl Host) {
        let snapshot = match &self.device {
            Some(device) => match self.registry.snapshot(device) {
                Some(snapshot) => snapshot,
                None => {
                    debug!("Controller {:?} has no state this frame", device.id);
                    return;
                }
            },
            None => return,
        };
        self.update_pose(host, &snapshot);
        self.update_buttons(host, &snapshot);
    }

    fn update_pose(&mut self, host: &mut impl Host, snapshot: &DeviceSnapshot) {
        let head = host.head_pose();
        self.arm_model.set_head_orientation(head.orientation);
        self.arm_model.set_head_position(head.position);
        self.arm_model
            .set_controller_orientation(snapshot.pose.orientation());
        self.arm_model.update();

        let pose = *self.arm_model.pose();
        let euler = euler_xyz(&pose.orientation);
        let rotation = na::Vector3::new(
            euler.x.to_degrees(),
            euler.y.to_degrees(),
            euler.z.to_degrees() + self.config.rotation_offset.degrees(),
        );
        trace!(
            "Controller pose {:.3} {:.3} {:.3}",
            pose.position.x,
            pose.position.y,
            pose.position.z
        );
        host.set_rotation(rotation);
        host.set_position(pose.position);
    }

    fn update_buttons(&mut self, host: &mut impl Host, snapshot: &DeviceSnapshot) {
        let mut events = Vec::new();
        if let Some(trackpad) = snapshot.buttons.get(ButtonId::TRACKPAD.index()) {
            self.buttons
                .handle_trackpad(trackpad, snapshot.axes, &mut events);
        }
        self.buttons.handle_axes(snapshot.axes, &mut events);
        for event in &events {
            debug!("Controller event {}", event.name());
            host.emit(event);
            if let Some((id, feedback)) = event.feedback() {
                self.show_feedback(host, id, feedback);
            }
        }
    }

    fn show_feedback(&self, host: &mut impl Host, id: ButtonId, feedback: Feedback) {
        let meshes = match &self.button_meshes {
            Some(meshes) => meshes,
            None => return,
        };
        let mesh = match id.mesh_name() {
            Some(mesh) if meshes.has_mesh(mesh) => mesh,
            _ => {
                debug!("No mesh to highlight for button {}", id.index());
                return;
            }
        };
        let color = match feedback {
            Feedback::TouchStart | Feedback::Up => self.config.button_touched_color,
            Feedback::Down => self.config.button_pressed_color,
            Feedback::TouchEnd => self.config.button_color,
        };
        host.set_mesh_color(mesh, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Color, RotationOffset};
    use crate::data::{ButtonState, GamepadPose, HeadSample};
    use crate::host::{Camera, EventSink, ModelBinder, Transform};
    use std::cell::Cell;

    #[derive(Default)]
    struct MockRegistry {
        devices: Vec<DeviceSnapshot>,
    }

    impl MockRegistry {
        fn connect(&mut self, id: &str) {
            self.devices.push(DeviceSnapshot {
                id: id.to_owned(),
                ..DeviceSnapshot::default()
            });
        }

        fn device_mut(&mut self, id: &str) -> &mut DeviceSnapshot {
            self.devices.iter_mut().find(|d| d.id == id).unwrap()
        }
    }

    impl DeviceRegistry for MockRegistry {
        fn devices_by_prefix(&self, prefix: &str) -> Vec<DeviceHandle> {
            self.devices
                .iter()
                .enumerate()
                .filter(|(_, d)| d.id.starts_with(prefix))
                .map(|(index, d)| DeviceHandle::new(index, d.id.clone()))
                .collect()
        }

        fn snapshot(&self, device: &DeviceHandle) -> Option<DeviceSnapshot> {
            self.devices.iter().find(|d| d.id == device.id).cloned()
        }
    }

    /// Loses every device on the second query only
    struct FlickeringRegistry {
        inner: MockRegistry,
        queries: Cell<usize>,
    }

    impl DeviceRegistry for FlickeringRegistry {
        fn devices_by_prefix(&self, prefix: &str) -> Vec<DeviceHandle> {
            let query = self.queries.get();
            self.queries.set(query + 1);
            if query == 1 {
                Vec::new()
            } else {
                self.inner.devices_by_prefix(prefix)
            }
        }

        fn snapshot(&self, device: &DeviceHandle) -> Option<DeviceSnapshot> {
            self.inner.snapshot(device)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Rotation(na::Vector3<f32>),
        Position(na::Vector3<f32>),
        Attach,
        Detach,
        Pivot,
        Color(String, Color),
        Event(ControllerEvent),
    }

    struct MockHost {
        head: HeadSample,
        calls: Vec<Call>,
    }

    impl MockHost {
        fn new() -> Self {
            Self {
                head: HeadSample::standing(),
                calls: Vec::new(),
            }
        }

        fn count(&self, call: &Call) -> usize {
            self.calls.iter().filter(|c| *c == call).count()
        }

        fn event_names(&mut self) -> Vec<&'static str> {
            let names = self
                .calls
                .iter()
                .filter_map(|c| match c {
                    Call::Event(event) => Some(event.name()),
                    _ => None,
                })
                .collect();
            self.calls.clear();
            names
        }
    }

    impl Camera for MockHost {
        fn head_pose(&self) -> HeadSample {
            self.head
        }
    }

    impl Transform for MockHost {
        fn set_rotation(&mut self, degrees: na::Vector3<f32>) {
            self.calls.push(Call::Rotation(degrees));
        }

        fn set_position(&mut self, position: na::Vector3<f32>) {
            self.calls.push(Call::Position(position));
        }
    }

    impl ModelBinder for MockHost {
        fn attach(&mut self, _model: &ModelDescriptor) {
            self.calls.push(Call::Attach);
        }

        fn detach(&mut self) {
            self.calls.push(Call::Detach);
        }

        fn set_pivot(&mut self, _offset: na::Vector3<f32>) {
            self.calls.push(Call::Pivot);
        }

        fn set_mesh_color(&mut self, mesh: &str, color: Color) {
            self.calls.push(Call::Color(mesh.to_owned(), color));
        }
    }

    impl EventSink for MockHost {
        fn emit(&mut self, event: &ControllerEvent) {
            self.calls.push(Call::Event(*event));
        }
    }

    const DAYDREAM: &str = "Daydream Controller (STANDARD GAMEPAD)";

    fn bound_controller(host: &mut MockHost) -> DaydreamController<MockRegistry> {
        let mut registry = MockRegistry::default();
        registry.connect(DAYDREAM);
        let mut controller = DaydreamController::new(ControllerConfig::default(), registry);
        controller.play(host);
        host.calls.clear();
        controller
    }

    fn press(controller: &mut DaydreamController<MockRegistry>, state: ButtonState) {
        controller.registry_mut().device_mut(DAYDREAM).buttons = vec![state];
    }

    #[test]
    fn presence_transitions_are_edge_triggered() {
        let mut host = MockHost::new();
        let mut controller = DaydreamController::new(ControllerConfig::default(), MockRegistry::default());
        controller.play(&mut host);
        assert!(!controller.is_bound());
        assert!(host.calls.is_empty());

        controller.registry_mut().connect(DAYDREAM);
        for _ in 0..5 {
            controller.on_device_connected(&mut host);
            controller.tick(&mut host);
        }
        assert!(controller.is_bound());
        assert_eq!(host.count(&Call::Attach), 1);

        controller.registry_mut().devices.clear();
        for _ in 0..3 {
            controller.on_device_disconnected(&mut host);
            controller.tick(&mut host);
        }
        assert!(!controller.is_bound());
        assert_eq!(host.count(&Call::Attach), 1);
        assert_eq!(host.count(&Call::Detach), 1);
    }

    #[test]
    fn binds_first_matching_device() {
        let mut host = MockHost::new();
        let mut registry = MockRegistry::default();
        registry.connect("OpenVR Controller 3");
        registry.connect("Daydream Controller A");
        registry.connect("Daydream Controller B");
        let mut controller = DaydreamController::new(ControllerConfig::default(), registry);
        controller.play(&mut host);
        assert_eq!(
            controller.device(),
            Some(&DeviceHandle::new(1, "Daydream Controller A"))
        );
    }

    #[test]
    fn paused_controller_ignores_notifications() {
        let mut host = MockHost::new();
        let mut controller = DaydreamController::new(ControllerConfig::default(), MockRegistry::default());
        controller.play(&mut host);
        controller.pause();
        controller.registry_mut().connect(DAYDREAM);
        controller.on_device_connected(&mut host);
        assert!(!controller.is_bound());

        controller.play(&mut host);
        assert!(controller.is_bound());
    }

    #[test]
    fn model_can_be_disabled() {
        let mut host = MockHost::new();
        let mut registry = MockRegistry::default();
        registry.connect(DAYDREAM);
        let config = ControllerConfig {
            model: false,
            ..ControllerConfig::default()
        };
        let mut controller = DaydreamController::new(config, registry);
        controller.play(&mut host);
        assert!(controller.is_bound());
        assert_eq!(host.count(&Call::Attach), 0);
        controller.on_model_loaded(&mut host, &LoadedModel::default());
        assert_eq!(host.count(&Call::Pivot), 0);
    }

    #[test]
    fn tick_without_device_does_nothing() {
        let mut host = MockHost::new();
        let mut controller = DaydreamController::new(ControllerConfig::default(), MockRegistry::default());
        controller.play(&mut host);
        controller.tick(&mut host);
        assert!(host.calls.is_empty());
        assert!(controller.pose().is_none());
    }

    #[test]
    fn vanished_device_aborts_the_frame() {
        let mut host = MockHost::new();
        let mut controller = bound_controller(&mut host);
        press(&mut controller, ButtonState::new(true, true));
        // gone without a disconnect notification
        controller.registry_mut().devices.clear();
        controller.tick(&mut host);
        assert!(host.calls.is_empty());
        assert!(controller.is_bound());
    }

    #[test]
    fn pose_is_forwarded_before_events() {
        let mut host = MockHost::new();
        let mut controller = bound_controller(&mut host);
        press(&mut controller, ButtonState::new(true, false));
        controller.tick(&mut host);

        assert!(matches!(host.calls[0], Call::Rotation(_)));
        assert!(matches!(host.calls[1], Call::Position(_)));
        assert!(host.calls[2..].iter().all(|c| matches!(c, Call::Event(_))));
        assert_eq!(
            host.event_names(),
            vec!["buttondown", "buttonchanged", "axismove"]
        );
        assert!(controller.pose().is_some());
    }

    #[test]
    fn missing_orientation_uses_identity() {
        let mut host = MockHost::new();
        let mut controller = bound_controller(&mut host);
        controller.registry_mut().device_mut(DAYDREAM).pose = GamepadPose::default();
        controller.tick(&mut host);
        assert_eq!(host.calls[0], Call::Rotation(na::Vector3::zeros()));
        assert_eq!(
            controller.pose().unwrap().orientation,
            na::UnitQuaternion::identity()
        );
    }

    #[test]
    fn rotation_offset_is_added_to_z() {
        let mut host = MockHost::new();
        let mut registry = MockRegistry::default();
        registry.connect(DAYDREAM);
        let config = ControllerConfig {
            rotation_offset: RotationOffset::Degrees(90.0),
            ..ControllerConfig::default()
        };
        let mut controller = DaydreamController::new(config, registry);
        controller.play(&mut host);
        controller.tick(&mut host);
        assert_eq!(
            host.calls[1],
            Call::Rotation(na::Vector3::new(0.0, 0.0, 90.0))
        );
    }

    #[test]
    fn trackpad_scenario_emits_one_changed_event_per_frame() {
        let mut host = MockHost::new();
        let mut controller = bound_controller(&mut host);
        controller.tick(&mut host);
        assert_eq!(host.event_names(), vec!["axismove"]);

        press(&mut controller, ButtonState::new(true, false));
        controller.tick(&mut host);
        assert_eq!(host.event_names(), vec!["buttondown", "buttonchanged"]);

        press(&mut controller, ButtonState::new(true, true));
        controller.tick(&mut host);
        assert_eq!(host.event_names(), vec!["touchstart", "buttonchanged"]);

        press(&mut controller, ButtonState::new(false, false));
        controller.tick(&mut host);
        assert_eq!(
            host.event_names(),
            vec!["buttonup", "touchend", "buttonchanged"]
        );

        controller.tick(&mut host);
        assert!(host.event_names().is_empty());
    }

    #[test]
    fn axis_changes_emit_axismove() {
        let mut host = MockHost::new();
        let mut controller = bound_controller(&mut host);
        controller.tick(&mut host);
        host.calls.clear();

        controller.tick(&mut host);
        assert!(host.event_names().is_empty());

        controller.registry_mut().device_mut(DAYDREAM).axes = [0.0, 1.0e-7];
        controller.tick(&mut host);
        assert_eq!(host.event_names(), vec!["axismove"]);
    }

    #[test]
    fn button_feedback_follows_model_load() {
        let mut host = MockHost::new();
        let mut controller = bound_controller(&mut host);
        let config = controller.config().clone();

        press(&mut controller, ButtonState::new(true, false));
        controller.tick(&mut host);
        assert!(!host.calls.iter().any(|c| matches!(c, Call::Color(..))));

        let model = LoadedModel {
            meshes: vec!["touchpad".to_owned(), "menubutton".to_owned()],
        };
        controller.on_model_loaded(&mut host, &model);
        assert_eq!(host.count(&Call::Pivot), 1);
        host.calls.clear();

        press(&mut controller, ButtonState::new(true, true));
        controller.tick(&mut host);
        assert_eq!(
            host.count(&Call::Color("touchpad".to_owned(), config.button_touched_color)),
            1
        );

        press(&mut controller, ButtonState::new(false, false));
        host.calls.clear();
        controller.tick(&mut host);
        let colors: Vec<_> = host
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Color(..)))
            .cloned()
            .collect();
        assert_eq!(
            colors,
            vec![
                Call::Color("touchpad".to_owned(), config.button_touched_color),
                Call::Color("touchpad".to_owned(), config.button_color),
            ]
        );
    }

    #[test]
    fn feedback_skips_unmapped_buttons() {
        let mut host = MockHost::new();
        let mut controller = bound_controller(&mut host);
        controller.on_model_loaded(
            &mut host,
            &LoadedModel {
                meshes: vec!["touchpad".to_owned()],
            },
        );
        host.calls.clear();
        controller.show_feedback(&mut host, ButtonId::new(3).unwrap(), Feedback::Down);
        controller.show_feedback(&mut host, ButtonId::SYSTEM, Feedback::Down);
        assert!(host.calls.is_empty());
        controller.show_feedback(&mut host, ButtonId::TRACKPAD, Feedback::Down);
        assert_eq!(
            host.calls,
            vec![Call::Color(
                "touchpad".to_owned(),
                controller.config().button_pressed_color
            )]
        );
    }

    #[test]
    fn model_loaded_after_unbind_is_ignored() {
        let mut host = MockHost::new();
        let mut controller = bound_controller(&mut host);
        controller.registry_mut().devices.clear();
        controller.on_device_disconnected(&mut host);
        host.calls.clear();
        controller.on_model_loaded(&mut host, &LoadedModel::default());
        assert!(host.calls.is_empty());
    }

    #[test]
    fn binding_follows_a_flickering_registry() {
        let mut host = MockHost::new();
        let mut inner = MockRegistry::default();
        inner.connect(DAYDREAM);
        let registry = FlickeringRegistry {
            inner,
            queries: Cell::new(0),
        };
        let mut controller = DaydreamController::new(ControllerConfig::default(), registry);
        controller.play(&mut host);
        assert!(controller.is_bound());

        controller.on_device_connected(&mut host);
        assert!(!controller.is_bound());

        for _ in 0..5 {
            controller.on_device_connected(&mut host);
        }
        assert!(controller.is_bound());
        assert_eq!(host.count(&Call::Attach), 2);
        assert_eq!(host.count(&Call::Detach), 1);

        host.calls.clear();
        controller.tick(&mut host);
        assert!(matches!(host.calls[0], Call::Rotation(_)));
    }

    #[test]
    fn unplugging_the_bound_device_switches_to_the_next_match() {
        let mut host = MockHost::new();
        let mut registry = MockRegistry::default();
        registry.connect("Daydream Controller A");
        registry.connect("Daydream Controller B");
        let mut controller = DaydreamController::new(ControllerConfig::default(), registry);
        controller.play(&mut host);
        controller.tick(&mut host);
        assert!(controller.pose().is_some());
        host.calls.clear();

        controller.registry_mut().devices.remove(0);
        controller.on_device_disconnected(&mut host);
        assert_eq!(
            controller.device(),
            Some(&DeviceHandle::new(0, "Daydream Controller B"))
        );
        assert!(controller.pose().is_none());
        assert_eq!(host.count(&Call::Attach), 0);
        assert_eq!(host.count(&Call::Detach), 0);

        controller.tick(&mut host);
        assert!(matches!(host.calls[0], Call::Rotation(_)));
        assert!(controller.pose().is_some());
    }

    #[test]
    fn other_devices_coming_and_going_keep_the_binding() {
        let mut host = MockHost::new();
        let mut registry = MockRegistry::default();
        registry.connect("Daydream Controller A");
        let mut controller = DaydreamController::new(ControllerConfig::default(), registry);
        controller.play(&mut host);
        controller.tick(&mut host);

        controller.registry_mut().devices.insert(
            0,
            DeviceSnapshot {
                id: "Daydream Controller 0".to_owned(),
                ..DeviceSnapshot::default()
            },
        );
        controller.on_device_connected(&mut host);
        assert_eq!(
            controller.device(),
            Some(&DeviceHandle::new(1, "Daydream Controller A"))
        );
        assert!(controller.pose().is_some());
        assert_eq!(host.count(&Call::Attach), 1);
    }

    #[test]
    fn reconnect_rebinds_with_fresh_pose_and_kept_buttons() {
        let mut host = MockHost::new();
        let mut controller = bound_controller(&mut host);
        press(&mut controller, ButtonState::new(true, false));
        controller.tick(&mut host);
        assert_eq!(
            host.event_names(),
            vec!["buttondown", "buttonchanged", "axismove"]
        );

        controller.registry_mut().devices.clear();
        controller.on_device_disconnected(&mut host);
        assert!(!controller.is_bound());

        controller.registry_mut().connect(DAYDREAM);
        controller.on_device_connected(&mut host);
        assert!(controller.is_bound());
        assert_eq!(host.count(&Call::Detach), 1);
        assert_eq!(host.count(&Call::Attach), 1);
        assert!(controller.pose().is_none());
        assert!(controller.button_record(ButtonId::TRACKPAD).pressed);

        press(&mut controller, ButtonState::new(true, false));
        host.calls.clear();
        controller.tick(&mut host);
        assert!(host.event_names().is_empty());
        assert!(controller.pose().is_some());
    }
}
