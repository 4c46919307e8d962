//! TOML configuration shared by the server and the console.
//!
//! Several files may be given; each one overrides the keys it sets in the
//! files before it. Anything left unset keeps its default.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use rocket::figment::Figment;
use rocket::figment::providers::{Format, Toml};

use crate::common::VendorType;
use crate::dispatcher::DEFAULT_REQUEST_TIMEOUT;
use crate::error::{ConfigError, PtzError};
use crate::lifecycle::{CameraTarget, ControlSpeeds};



pub const DEFAULT_CONFIG_PATH: &str = "/etc/clustervms/ptz-relay.toml";

const MIN_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
#[derive(Debug, Default, PartialEq)]
#[derive(Deserialize)]
#[serde(default)]
pub struct Settings {
	pub video: VideoSettings,
	pub ptz: PtzSettings,
	pub console: ConsoleSettings,
}

#[derive(Clone)]
#[derive(Debug, PartialEq)]
#[derive(Deserialize)]
#[serde(default)]
pub struct VideoSettings {
	/// Served when a viewer does not name a source
	pub default_source_url: String,
	pub ffmpeg_path: String,
}

impl Default for VideoSettings {
	fn default() -> Self {
		Self {
			default_source_url: "rtsp://192.168.0.167:554".to_string(),
			ffmpeg_path: "ffmpeg".to_string(),
		}
	}
}

#[derive(Clone)]
#[derive(Debug, PartialEq)]
#[derive(Deserialize)]
#[serde(default)]
pub struct PtzSettings {
	pub request_timeout_ms: u64,
}

impl Default for PtzSettings {
	fn default() -> Self {
		Self { request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64 }
	}
}

impl PtzSettings {
	/// Cameras get between two seconds and the default to answer, whatever the file says.
	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms).clamp(MIN_REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)
	}
}

#[derive(Clone)]
#[derive(Debug, PartialEq)]
#[derive(Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
	pub camera_address: String,
	pub vendor_type: String,
	pub username: String,
	pub password: String,
	pub move_dwell_ms: u64,
	pub poll_interval_ms: u64,
	pub pan_speed: f64,
	pub tilt_speed: f64,
	pub zoom_speed: f64,
	pub invert_tilt: bool,
}

impl Default for ConsoleSettings {
	fn default() -> Self {
		Self {
			camera_address: "192.168.0.167".to_string(),
			vendor_type: VendorType::Ycc365.name().to_string(),
			username: "admin".to_string(),
			password: String::new(),
			move_dwell_ms: 400,
			poll_interval_ms: 50,
			pan_speed: 0.5,
			tilt_speed: 0.5,
			zoom_speed: 0.5,
			invert_tilt: false,
		}
	}
}

impl ConsoleSettings {
	pub fn target(&self) -> Result<CameraTarget, PtzError> {
		Ok(CameraTarget {
			host_address: self.camera_address.clone(),
			vendor_type: self.vendor_type.parse()?,
			username: self.username.clone(),
			password: self.password.clone(),
		})
	}

	pub fn speeds(&self) -> ControlSpeeds {
		ControlSpeeds {
			pan: self.pan_speed,
			tilt: self.tilt_speed,
			zoom: self.zoom_speed,
			invert_tilt: self.invert_tilt,
		}
	}

	pub fn move_dwell(&self) -> Duration {
		Duration::from_millis(self.move_dwell_ms)
	}

	pub fn poll_interval(&self) -> Duration {
		// tokio intervals panic on zero
		Duration::from_millis(self.poll_interval_ms.max(1))
	}
}

impl Settings {
	/// Read and merge the given files in order.
	pub fn read_config<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
		let mut figment = Figment::new();
		for path in paths {
			let path = path.as_ref();
			if !path.is_file() {
				return Err(ConfigError::Missing(path.display().to_string()));
			}
			info!("Reading config file {}", path.display());
			figment = figment.merge(Toml::file(path));
		}
		Ok(figment.extract()?)
	}

	/// Use the system-wide file when it exists, defaults otherwise.
	pub fn read_default_config_files() -> Result<Self, ConfigError> {
		if Path::new(DEFAULT_CONFIG_PATH).exists() {
			Self::read_config(&[DEFAULT_CONFIG_PATH])
		} else {
			warn!("No config file at {}; using defaults", DEFAULT_CONFIG_PATH);
			Ok(Self::default())
		}
	}

	pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
		Ok(Figment::from(Toml::string(text)).extract()?)
	}
}
