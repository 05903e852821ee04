use daydream_controller::config::ControllerConfig;
use daydream_controller::controller::DaydreamController;
use daydream_controller::data::{DeviceSnapshot, HeadSample, Pose};
use daydream_controller::host::{DeviceHandle, DeviceRegistry};
use daydream_controller::viewer::SceneHost;

use anyhow::{anyhow, Result};
use log::*;
use rumqtt::{MqttClient, MqttOptions, Notification, QoS, ReconnectOptions};
use simplelog::{Config, LevelFilter, TermLogger, TerminalMode};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

const TRACKING_TOPIC: &str = "tracking/pose";
const GAMEPAD_TOPIC: &str = "daydream/gamepad";
const DISCONNECT_TOPIC: &str = "daydream/disconnect";
const EVENTS_TOPIC: &str = "daydream/events";

#[derive(Default)]
struct Shared {
    head: Option<HeadSample>,
    gamepads: BTreeMap<String, DeviceSnapshot>,
}

/// Gamepads as last reported over MQTT, ordered by id
struct MqttRegistry {
    shared: Arc<Mutex<Shared>>,
}

impl DeviceRegistry for MqttRegistry {
    fn devices_by_prefix(&self, prefix: &str) -> Vec<DeviceHandle> {
        let shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared
            .gamepads
            .keys()
            .enumerate()
            .filter(|(_, id)| id.starts_with(prefix))
            .map(|(index, id)| DeviceHandle::new(index, id.clone()))
            .collect()
    }

    fn snapshot(&self, device: &DeviceHandle) -> Option<DeviceSnapshot> {
        let shared = self.shared.lock().unwrap_or_else(PoisonError::into_inner);
        shared.gamepads.get(&device.id).cloned()
    }
}

fn subscribe<I>(notifications: I, shared: Arc<Mutex<Shared>>, changed: Arc<AtomicBool>)
where
    I: IntoIterator<Item = Notification> + Send + 'static,
{
    std::thread::spawn(move || {
        for notification in notifications {
            let message = match notification {
                Notification::Publish(message) => message,
                _ => continue,
            };
            let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
            match message.topic_name.as_str() {
                TRACKING_TOPIC => match Pose::deserialize(&message.payload) {
                    Ok(pose) if pose.is_hmd() => shared.head = Some(pose.to_head_sample()),
                    Ok(_) => {}
                    Err(error) => warn!("Bad tracking pose: {}", error),
                },
                GAMEPAD_TOPIC => match DeviceSnapshot::deserialize(&message.payload) {
                    Ok(snapshot) => {
                        if !shared.gamepads.contains_key(&snapshot.id) {
                            info!("Gamepad {:?} connected", snapshot.id);
                            changed.store(true, Ordering::SeqCst);
                        }
                        shared.gamepads.insert(snapshot.id.clone(), snapshot);
                    }
                    Err(error) => warn!("Bad gamepad snapshot: {}", error),
                },
                DISCONNECT_TOPIC => {
                    let id = String::from_utf8_lossy(&message.payload).into_owned();
                    if shared.gamepads.remove(&id).is_some() {
                        info!("Gamepad {:?} disconnected", id);
                        changed.store(true, Ordering::SeqCst);
                    }
                }
                topic => trace!("Ignoring message on {}", topic),
            }
        }
    });
}

fn main() -> Result<()> {
    TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed)?;
    let config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::load(path)?,
        None => ControllerConfig::default(),
    };

    let mqtt_options = MqttOptions::new("daydream_controller", "mqtt.local", 1883)
        .set_reconnect_opts(ReconnectOptions::Always(5));
    let (mut mqtt_client, notifications) = MqttClient::start(mqtt_options)
        .map_err(|e| anyhow!("Failed to connect to MQTT host: {:?}", e))?;
    info!("Connected to MQTT");
    for topic_name in &[TRACKING_TOPIC, GAMEPAD_TOPIC, DISCONNECT_TOPIC] {
        mqtt_client
            .subscribe(*topic_name, QoS::AtMostOnce)
            .map_err(|e| anyhow!("Failed to subscribe to topic {}: {:?}", topic_name, e))?;
        trace!("Subscribing to {}", topic_name);
    }

    let shared = Arc::new(Mutex::new(Shared::default()));
    let changed = Arc::new(AtomicBool::new(false));
    subscribe(notifications, shared.clone(), changed.clone());

    let mut host = SceneHost::new("Daydream arm model");
    let mut controller = DaydreamController::new(
        config,
        MqttRegistry {
            shared: shared.clone(),
        },
    );
    controller.play(&mut host);

    while host.window.render() {
        if changed.swap(false, Ordering::SeqCst) {
            controller.on_device_connected(&mut host);
        }
        if let Some(model) = host.take_loaded_model() {
            controller.on_model_loaded(&mut host, &model);
        }
        let head = shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .head
            .unwrap_or_else(HeadSample::standing);
        host.set_head(head);
        controller.tick(&mut host);
        host.draw_head();

        let events: Vec<_> = host.drain_events().collect();
        for event in events {
            match event.to_json() {
                Ok(json) => {
                    info!("{}", json);
                    if let Err(error) =
                        mqtt_client.publish(EVENTS_TOPIC, QoS::AtMostOnce, false, json)
                    {
                        warn!("Failed to publish event: {:?}", error);
                    }
                }
                Err(error) => warn!("Failed to serialize event: {}", error),
            }
        }
    }
    controller.pause();
    Ok(())
}
