use std::sync::Arc;

use rocket::http::{ContentType, Status};
use rocket::response::stream::ByteStream;
use rocket::serde::json::{self, json, Json, Value};
use rocket::State;

use log::error;
use serde_json::error::Category;
use url::Url;

use crate::common::{DispatchResult, PtzIntent, PtzRequestContext};
use crate::config::Settings;
use crate::dispatcher::{PtzDispatcher, ReqwestTransport, SoapTransport};
use crate::error::PtzError;
use crate::ffmpeg::FfmpegSource;
use crate::relay::{RelayManager, RelayStatus};



pub type Dispatcher = PtzDispatcher<Box<dyn SoapTransport>>;

/// Body of `POST /api/ptz`. Everything is optional here so that missing fields
/// can be reported as a 400 with a useful message instead of a parse failure.
#[derive(Clone)]
#[derive(Debug, Default)]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PtzControlRequest {
	#[serde(alias = "camera_ip")]
	pub camera_address: Option<String>,
	#[serde(alias = "camera_type")]
	pub vendor_type: Option<String>,
	#[serde(alias = "onvif_user")]
	pub username: Option<String>,
	#[serde(alias = "onvif_password")]
	pub password: Option<String>,
	pub action: Option<String>,
	pub pan: Option<f64>,
	pub tilt: Option<f64>,
	pub zoom: Option<f64>,
}

impl PtzControlRequest {
	pub fn into_context(self) -> Result<PtzRequestContext, PtzError> {
		let host_address = required(self.camera_address, "cameraAddress")?;
		let vendor_type = required(self.vendor_type, "vendorType")?;
		let username = required(self.username, "username")?;
		let password = required(self.password, "password")?;
		let intent = match required(self.action, "action")?.as_str() {
			"move" => PtzIntent::Move {
				pan: self.pan.unwrap_or(0.0),
				tilt: self.tilt.unwrap_or(0.0),
				zoom: self.zoom.unwrap_or(0.0),
			},
			"stop" => PtzIntent::Stop,
			other => return Err(PtzError::MalformedRequest(format!("unknown action '{}'", other))),
		};

		Ok(PtzRequestContext {
			host_address,
			vendor_type,
			username,
			password,
			intent,
		})
	}
}

fn required(value: Option<String>, name: &str) -> Result<String, PtzError> {
	match value {
		Some(value) if !value.trim().is_empty() => Ok(value),
		_ => Err(PtzError::MalformedRequest(format!("missing required field '{}'", name))),
	}
}

#[derive(Clone)]
#[derive(Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PtzControlResponse {
	pub status: String,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub response_text: Option<String>,
}

impl PtzControlResponse {
	fn error(message: impl Into<String>) -> Self {
		Self {
			status: "error".to_string(),
			message: message.into(),
			details: None,
			response_text: None,
		}
	}
}

impl From<DispatchResult> for PtzControlResponse {
	fn from(result: DispatchResult) -> Self {
		if result.is_success() {
			Self {
				status: "success".to_string(),
				message: result.message,
				details: None,
				response_text: Some(result.body_text),
			}
		} else {
			Self {
				details: Some(result.body_text).filter(|body| !body.is_empty()),
				..Self::error(result.message)
			}
		}
	}
}

#[post("/ptz", data = "<request>")]
async fn ptz_control(
	request: Result<Json<PtzControlRequest>, json::Error<'_>>,
	dispatcher: &State<Dispatcher>,
) -> (Status, Json<PtzControlResponse>) {
	let context = match request.map_err(|err| PtzError::MalformedRequest(describe_body_error(&err)))
		.and_then(|request| request.into_inner().into_context())
	{
		Ok(context) => context,
		Err(err) => {
			error!("Rejected PTZ request; {}", err);
			return (Status::BadRequest, Json(PtzControlResponse::error(err.to_string())));
		}
	};

	let result = dispatcher.dispatch(&context).await;
	(Status::new(result.http_status()), Json(result.into()))
}

/// Where and how the body failed to parse. serde's own message quotes the
/// offending value, which may be a password, so it is never passed on.
fn describe_body_error(err: &json::Error<'_>) -> String {
	match err {
		json::Error::Io(_) => "request body could not be read".to_string(),
		json::Error::Parse(_, err) => {
			let kind = match err.classify() {
				Category::Io => "unreadable body",
				Category::Syntax => "invalid JSON",
				Category::Data => "wrong field type",
				Category::Eof => "truncated JSON",
			};
			format!("{} at line {} column {}", kind, err.line(), err.column())
		},
	}
}

#[get("/video-stream?<rtsp>")]
async fn video_feed(
	rtsp: Option<String>,
	relay: &State<RelayManager>,
	settings: &State<Settings>,
) -> Result<(ContentType, ByteStream![Vec<u8>]), (Status, Value)> {
	let source_url = rtsp
		.filter(|url| !url.trim().is_empty())
		.unwrap_or_else(|| settings.video.default_source_url.clone());
	if let Err(err) = Url::parse(&source_url) {
		return Err((Status::BadRequest, json!({
			"status": "error",
			"message": format!("invalid video source URL: {}", err),
		})));
	}

	let mut subscription = relay.subscribe(&source_url).await;
	let content_type = ContentType::new("multipart", "x-mixed-replace").with_params(("boundary", "frame"));
	Ok((content_type, ByteStream! {
		while let Some(frame) = subscription.next_frame().await {
			yield multipart_part(&frame);
		}
	}))
}

#[get("/video-stream/status")]
async fn video_status(relay: &State<RelayManager>) -> Json<Option<RelayStatus>> {
	Json(relay.status().await)
}

fn multipart_part(frame: &[u8]) -> Vec<u8> {
	let mut part = Vec::with_capacity(frame.len() + 64);
	part.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n\r\n");
	part.extend_from_slice(frame);
	part.extend_from_slice(b"\r\n");
	part
}

#[catch(400)]
fn bad_request() -> Value {
	json!({
		"status": "error",
		"message": "Request could not be understood."
	})
}

#[catch(404)]
fn not_found() -> Value {
	json!({
		"status": "error",
		"message": "Resource was not found."
	})
}

#[catch(422)]
fn unprocessable() -> Value {
	json!({
		"status": "error",
		"message": "Request was malformed."
	})
}



pub fn stage(settings: Settings) -> rocket::fairing::AdHoc {
	rocket::fairing::AdHoc::try_on_ignite("PTZ relay", move |rocket| async move {
		let transport = match ReqwestTransport::new(settings.ptz.request_timeout()) {
			Ok(transport) => transport,
			Err(err) => {
				error!("Failed to set up HTTP client for PTZ requests; error was {}", err);
				return Err(rocket);
			}
		};
		let dispatcher: Dispatcher = PtzDispatcher::new(Box::new(transport) as Box<dyn SoapTransport>);
		let relay = RelayManager::new(Arc::new(FfmpegSource::new(&settings.video.ffmpeg_path)));
		Ok(mount(rocket, settings, dispatcher, relay))
	})
}

fn mount(rocket: rocket::Rocket<rocket::Build>, settings: Settings, dispatcher: Dispatcher, relay: RelayManager) -> rocket::Rocket<rocket::Build> {
	rocket
		.manage(settings)
		.manage(dispatcher)
		.manage(relay)
		.register("/", catchers![bad_request, not_found, unprocessable])
		.mount("/api", routes![ptz_control, video_feed, video_status])
		.attach(rocket::fairing::AdHoc::on_shutdown("Stop video relay", |rocket| Box::pin(async move {
			if let Some(relay) = rocket.state::<RelayManager>() {
				relay.shutdown().await;
			}
		})))
}
