use thiserror::Error;



/// Everything that can go wrong between receiving a PTZ request and hearing back from the camera.
#[derive(Debug, Error)]
pub enum PtzError {
	/// The vendor type is not one of the dialects we support
	#[error("unknown camera vendor type: {0}")]
	UnknownVendor(String),

	/// Connection refused, timeout, DNS failure and the like
	#[error("transport error: {0}")]
	Transport(String),

	/// The camera answered with a status outside 200/202/204
	#[error("camera returned HTTP {status}")]
	UpstreamStatus { status: u16, body: String },

	/// The incoming control request is missing something we need
	#[error("malformed request: {0}")]
	MalformedRequest(String),
}

/// Failures of a video relay session. These end the affected session only.
#[derive(Debug, Error)]
pub enum RelayError {
	#[error("ffmpeg executable not found")]
	FfmpegNotFound,

	#[error("failed to start capture process: {0}")]
	Spawn(std::io::Error),

	#[error("failed to read from video source: {0}")]
	Read(std::io::Error),

	#[error("video source closed the stream")]
	SourceClosed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("config file {0} does not exist")]
	Missing(String),

	#[error("invalid configuration: {0}")]
	Invalid(#[from] rocket::figment::Error),
}
