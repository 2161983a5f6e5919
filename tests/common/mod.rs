// SPDX-License-Identifier: GPL-3.0-only

//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use camera_inspector::command::{CommandError, CommandRunner, RunOptions};
use camera_inspector::platform::{
    BrowserDevice, DeviceKind, LiveSettings, MediaDevices, MediaError, MediaStream,
    StreamConstraints,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const LISTING: &str = "\
ioctl: VIDIOC_ENUM_FMT
\tType: Video Capture

\t[0]: 'MJPG' (Motion-JPEG, compressed)
\t\tSize: Discrete 1920x1080
\t\t\tInterval: Discrete 0.033s (30.000 fps)
\t\tSize: Discrete 1280x720
\t\t\tInterval: Discrete 0.017s (60.000 fps)
\t\t\tInterval: Discrete 0.033s (30.000 fps)
\t[1]: 'YUYV' (YUYV 4:2:2)
\t\tSize: Discrete 640x480
\t\t\tInterval: Discrete 0.067s (15.000 fps)
\t\t\tInterval: Discrete 0.033s (30.000 fps)
";

pub struct FakeStream {
    id: String,
    settings: LiveSettings,
    stops: Arc<AtomicUsize>,
}

#[async_trait]
impl MediaStream for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn stop_tracks(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    async fn live_settings(&self) -> Result<LiveSettings, MediaError> {
        Ok(self.settings.clone())
    }
}

/// Media platform with scripted devices and failures
#[derive(Default)]
pub struct FakeMedia {
    pub unsupported: bool,
    pub devices: Vec<BrowserDevice>,
    pub probe_error: Option<MediaError>,
    pub list_error: Option<MediaError>,
    pub failing_devices: HashMap<String, MediaError>,
    pub probe_stops: Arc<AtomicUsize>,
    stream_stops: Mutex<HashMap<String, Arc<AtomicUsize>>>,
    requests: Mutex<Vec<StreamConstraints>>,
}

impl FakeMedia {
    pub fn with_devices(ids: &[&str]) -> Self {
        Self {
            devices: ids
                .iter()
                .map(|id| BrowserDevice::video_input(*id, format!("Camera {}", id)))
                .collect(),
            ..Default::default()
        }
    }

    pub fn probe_stop_count(&self) -> usize {
        self.probe_stops.load(Ordering::SeqCst)
    }

    /// How many times the stream of `device_id` was stopped
    pub fn stream_stop_count(&self, device_id: &str) -> usize {
        self.stream_stops
            .lock()
            .unwrap()
            .get(device_id)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<StreamConstraints> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDevices for FakeMedia {
    fn supports_capture(&self) -> bool {
        !self.unsupported
    }

    async fn list_capture_devices(&self) -> Result<Vec<BrowserDevice>, MediaError> {
        match &self.list_error {
            Some(e) => Err(e.clone()),
            None => Ok(self.devices.clone()),
        }
    }

    async fn acquire_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn MediaStream>, MediaError> {
        self.requests.lock().unwrap().push(constraints.clone());

        let Some(id) = constraints.device_id.clone() else {
            if let Some(e) = &self.probe_error {
                return Err(e.clone());
            }
            return Ok(Box::new(FakeStream {
                id: "probe".to_string(),
                settings: LiveSettings::default(),
                stops: Arc::clone(&self.probe_stops),
            }));
        };

        if let Some(e) = self.failing_devices.get(&id) {
            return Err(e.clone());
        }

        let stops = Arc::clone(
            self.stream_stops
                .lock()
                .unwrap()
                .entry(id.clone())
                .or_default(),
        );
        let mut settings = LiveSettings::from_resolution(
            constraints.ideal_width.unwrap_or(640),
            constraints.ideal_height.unwrap_or(480),
        );
        settings.frame_rate = Some(30.0);
        settings.facing_mode = Some("user".to_string());

        Ok(Box::new(FakeStream {
            id: format!("stream-{}", id),
            settings,
            stops,
        }))
    }
}

pub fn other_device(id: &str) -> BrowserDevice {
    BrowserDevice {
        device_id: id.to_string(),
        label: format!("Audio {}", id),
        kind: DeviceKind::Other,
    }
}

/// Command runner answering from per-path scripts
#[derive(Default)]
pub struct FakeRunner {
    pub device_list: Option<Result<String, CommandError>>,
    pub listings: HashMap<String, Result<String, CommandError>>,
    pub dumps: HashMap<String, Result<String, CommandError>>,
    /// When set, detail dumps wait for a notification before answering
    pub dump_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<(Vec<String>, RunOptions)>>,
}

impl FakeRunner {
    pub fn with_paths(paths: &[&str]) -> Self {
        let list = paths.iter().map(|p| format!("{}\n", p)).collect::<String>();
        Self {
            device_list: Some(Ok(list)),
            listings: paths
                .iter()
                .map(|p| (p.to_string(), Ok(LISTING.to_string())))
                .collect(),
            dumps: paths
                .iter()
                .map(|p| (p.to_string(), Ok(format!("Driver Info:\n\tCard type: {}\n", p))))
                .collect(),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(Vec<String>, RunOptions)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose argv contains `arg`
    pub fn count(&self, arg: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(argv, _)| argv.iter().any(|a| a == arg))
            .count()
    }

    fn device_path(argv: &[String]) -> String {
        argv.iter()
            .position(|a| a == "--device")
            .and_then(|i| argv.get(i + 1))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, argv: &[String], options: RunOptions) -> Result<String, CommandError> {
        self.calls.lock().unwrap().push((argv.to_vec(), options));

        let missing = || Err(CommandError::new("no such device"));
        if argv.iter().any(|a| a == "--list-formats-ext") {
            return self
                .listings
                .get(&Self::device_path(argv))
                .cloned()
                .unwrap_or_else(missing);
        }
        if argv.iter().any(|a| a == "--all") {
            if let Some(gate) = &self.dump_gate {
                gate.notified().await;
            }
            return self
                .dumps
                .get(&Self::device_path(argv))
                .cloned()
                .unwrap_or_else(missing);
        }
        self.device_list
            .clone()
            .unwrap_or_else(|| Err(CommandError::new("ls: cannot access '/dev/video*'")))
    }
}
