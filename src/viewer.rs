use crate::config::Color;
use crate::data::HeadSample;
use crate::events::ControllerEvent;
use crate::host::{Camera, EventSink, LoadedModel, ModelBinder, ModelDescriptor, Transform};
use kiss3d::scene::SceneNode;
use kiss3d::window::Window;
use log::*;
use nalgebra as na;
use std::collections::HashMap;

const BUTTON_MESHES: [(&str, [f32; 3]); 3] = [
    ("touchpad", [0.0, 0.012, -0.03]),
    ("menubutton", [0.0, 0.012, 0.01]),
    ("systembutton", [0.0, 0.012, 0.035]),
];

pub fn add_ground_plane(window: &mut Window) {
    let size = 0.5;
    for i in 0..4 {
        for j in 0..4 {
            let mut cube = window.add_cube(size, size, 0.001);
            if (i + j) % 2 == 0 {
                cube.set_color(1.0, 0.3, 0.2);
            } else {
                cube.set_color(0.5, 0.04, 0.17);
            }
            let distance = (1_f32.powi(2) + 1_f32.powi(2)).sqrt();
            let x_ind = j as f32 - distance;
            let y_ind = i as f32 - distance;
            let trans = na::Isometry3::from_parts(
                na::Translation3::new(size * x_ind, 0.0, size * y_ind),
                na::UnitQuaternion::from_euler_angles(0.0, -1.57, -1.57),
            );
            cube.set_local_transformation(trans);
        }
    }
}

/// The controller model is a stand-in built from cubes
pub struct SceneHost {
    pub window: Window,
    hand: SceneNode,
    model: Option<SceneNode>,
    meshes: HashMap<String, SceneNode>,
    loaded: Option<LoadedModel>,
    head: HeadSample,
    events: Vec<ControllerEvent>,
}

impl SceneHost {
    pub fn new(title: &str) -> Self {
        let mut window = Window::new(title);
        window.set_background_color(0.5, 0.5, 0.5);
        window.set_point_size(10.0);
        add_ground_plane(&mut window);
        let hand = window.add_group();
        Self {
            window,
            hand,
            model: None,
            meshes: HashMap::new(),
            loaded: None,
            head: HeadSample::standing(),
            events: Vec::new(),
        }
    }

    pub fn set_head(&mut self, head: HeadSample) {
        self.head = head;
    }

    pub fn take_loaded_model(&mut self) -> Option<LoadedModel> {
        self.loaded.take()
    }

    pub fn drain_events(&mut self) -> std::vec::Drain<'_, ControllerEvent> {
        self.events.drain(..)
    }

    pub fn hand_position(&self) -> na::Point3<f32> {
        na::Point3::from(self.hand.data().local_translation().vector)
    }

    pub fn draw_head(&mut self) {
        let head = na::Point3::from(self.head.position);
        self.window
            .draw_point(&head, &na::Point3::new(1.0, 1.0, 1.0));
        let hand = self.hand_position();
        self.window
            .draw_line(&head, &hand, &na::Point3::new(0.8, 0.8, 0.8));
    }
}

impl Camera for SceneHost {
    fn head_pose(&self) -> HeadSample {
        self.head
    }
}

impl Transform for SceneHost {
    fn set_rotation(&mut self, degrees: na::Vector3<f32>) {
        let rotation = na::UnitQuaternion::from_axis_angle(&na::Vector3::x_axis(), degrees.x.to_radians())
            * na::UnitQuaternion::from_axis_angle(&na::Vector3::y_axis(), degrees.y.to_radians())
            * na::UnitQuaternion::from_axis_angle(&na::Vector3::z_axis(), degrees.z.to_radians());
        self.hand.set_local_rotation(rotation);
    }

    fn set_position(&mut self, position: na::Vector3<f32>) {
        self.hand
            .set_local_translation(na::Translation3::from(position));
    }
}

impl ModelBinder for SceneHost {
    fn attach(&mut self, model: &ModelDescriptor) {
        self.detach();
        info!("Attaching stand-in for {}", model.obj);
        let mut node = self.hand.add_group();
        let mut body = node.add_cube(0.04, 0.02, 0.12);
        body.set_color(0.2, 0.2, 0.2);
        for (name, offset) in BUTTON_MESHES.iter() {
            let mut button = node.add_cube(0.02, 0.005, 0.02);
            button.set_local_translation(na::Translation3::new(offset[0], offset[1], offset[2]));
            self.meshes.insert((*name).to_owned(), button);
        }
        self.model = Some(node);
        self.loaded = Some(LoadedModel {
            meshes: BUTTON_MESHES
                .iter()
                .map(|(name, _)| (*name).to_owned())
                .collect(),
        });
    }

    fn detach(&mut self) {
        if let Some(mut node) = self.model.take() {
            node.unlink();
        }
        self.meshes.clear();
        self.loaded = None;
    }

    fn set_pivot(&mut self, offset: na::Vector3<f32>) {
        if let Some(node) = self.model.as_mut() {
            node.set_local_translation(na::Translation3::from(offset));
        }
    }

    fn set_mesh_color(&mut self, mesh: &str, color: Color) {
        if let Some(node) = self.meshes.get_mut(mesh) {
            let (r, g, b) = color.to_f32();
            node.set_color(r, g, b);
        }
    }
}

impl EventSink for SceneHost {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.push(*event);
    }
}
