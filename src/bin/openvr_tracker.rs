use daydream_controller::config::ControllerConfig;
use daydream_controller::controller::DaydreamController;
use daydream_controller::data::HeadSample;
use daydream_controller::openvr_adaptor::{self, VrDeviceClass};
use daydream_controller::viewer::SceneHost;

use anyhow::Result;
use log::*;
use nalgebra as na;
use simplelog::{Config, LevelFilter, TermLogger, TerminalMode};

fn main() -> Result<()> {
    TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed)?;
    let mut config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };
    config.id_prefix = openvr_adaptor::CONTROLLER_ID_PREFIX.to_owned();

    let openvr = openvr_adaptor::VrDeviceManager::new()?;
    let mut host = SceneHost::new("OpenVR arm model");
    let mut controller = DaydreamController::new(config, openvr);
    controller.play(&mut host);

    let tracked_color = na::Point3::new(0.0, 0.0, 1.0);
    let error_color = na::Point3::new(1.0, 0.0, 1.0);

    while host.window.render() {
        if controller.registry_mut().update() {
            controller.on_device_connected(&mut host);
        }
        if let Some(model) = host.take_loaded_model() {
            controller.on_model_loaded(&mut host, &model);
        }
        let head = controller
            .registry()
            .head_pose()
            .unwrap_or_else(HeadSample::standing);
        host.set_head(head);
        controller.tick(&mut host);
        host.draw_head();

        if let Some(tracked) = controller
            .registry()
            .get_device_by_class(VrDeviceClass::Controller)
        {
            let extrapolated = host.hand_position();
            host.window.draw_point(&tracked.position, &tracked_color);
            host.window
                .draw_line(&tracked.position, &extrapolated, &error_color);
            trace!(
                "Extrapolation error {:.3}m",
                (tracked.position - extrapolated).norm()
            );
        }

        for event in host.drain_events() {
            info!("{}", event.name());
        }
    }
    Ok(())
}
