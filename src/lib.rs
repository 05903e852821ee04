pub mod arm_model;
pub mod buttons;
pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod events;
pub mod host;
pub mod openvr_adaptor;
pub mod viewer;

pub use arm_model::{ArmModel, ArmModelParams, Hand, ResultPose};
pub use buttons::{ButtonId, ButtonTracker};
pub use config::ControllerConfig;
pub use controller::DaydreamController;
pub use events::ControllerEvent;
