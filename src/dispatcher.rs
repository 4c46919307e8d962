use std::time::Duration;

use log::{error, info, warn};
use reqwest::header::CONTENT_TYPE;

use crate::common::{DispatchResult, Outcome, PtzOperation, PtzRequestContext};
use crate::envelope;
use crate::error::PtzError;
use crate::vendor;



pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Statuses a camera uses to acknowledge a PTZ command. Some firmware answers 204 with no body.
const SUCCESS_STATUSES: [u16; 3] = [200, 202, 204];

#[derive(Clone)]
#[derive(Debug, PartialEq, Eq)]
pub struct SoapResponse {
	pub status: u16,
	pub body: String,
}

/// Sends a rendered SOAP envelope somewhere and returns what came back.
#[rocket::async_trait]
pub trait SoapTransport: Send + Sync {
	async fn post(&self, url: &str, content_type: &str, body: String) -> Result<SoapResponse, PtzError>;
}

#[rocket::async_trait]
impl<T: SoapTransport + ?Sized> SoapTransport for Box<T> {
	async fn post(&self, url: &str, content_type: &str, body: String) -> Result<SoapResponse, PtzError> {
		(**self).post(url, content_type, body).await
	}
}

pub struct ReqwestTransport {
	client: reqwest::Client,
}

impl ReqwestTransport {
	pub fn new(timeout: Duration) -> Result<Self, PtzError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|err| PtzError::Transport(err.to_string()))?;
		Ok(Self { client })
	}
}

#[rocket::async_trait]
impl SoapTransport for ReqwestTransport {
	async fn post(&self, url: &str, content_type: &str, body: String) -> Result<SoapResponse, PtzError> {
		let response = self.client
			.post(url)
			.header(CONTENT_TYPE, content_type)
			.body(body)
			.send()
			.await
			.map_err(|err| PtzError::Transport(err.to_string()))?;

		let status = response.status().as_u16();
		let body = match response.text().await {
			Ok(text) => text,
			Err(err) => {
				warn!("Failed to read response body from {}; error was {}", url, err);
				String::new()
			}
		};
		Ok(SoapResponse { status, body })
	}
}

/// Turns a PTZ request into exactly one SOAP call and reports how it went.
/// Holds no per-request state, so one instance can serve any number of concurrent operators.
pub struct PtzDispatcher<T: SoapTransport> {
	transport: T,
}

impl<T: SoapTransport> PtzDispatcher<T> {
	pub fn new(transport: T) -> Self {
		Self { transport }
	}

	/// Never fails: every problem is folded into the returned [`DispatchResult`].
	pub async fn dispatch(&self, context: &PtzRequestContext) -> DispatchResult {
		let profile = match vendor::lookup(&context.vendor_type) {
			Ok(profile) => profile,
			Err(err) => {
				error!("Rejected PTZ request for {}; {}", context.host_address, err);
				return DispatchResult {
					outcome: Outcome::Failure,
					upstream_status: None,
					body_text: String::new(),
					message: "unknown camera vendor type".to_string(),
				};
			}
		};

		let operation = context.intent.operation();
		let body = envelope::operation_body(profile, &context.intent);
		let payload = envelope::build_envelope(profile, &context.username, &context.password, &body);
		let content_type = envelope::content_type(profile, operation);
		let url = format!("http://{}{}", context.host_address, profile.service_path_suffix);

		info!("{} request to {} for {}", operation, url, profile.vendor);
		match self.transport.post(&url, &content_type, payload).await {
			Ok(response) => {
				info!("{} response from {}: {}", operation, url, response.status);
				if SUCCESS_STATUSES.contains(&response.status) {
					DispatchResult {
						outcome: Outcome::Success,
						upstream_status: Some(response.status),
						message: format!("PTZ {} completed: {}", operation, response.status),
						body_text: response.body,
					}
				} else {
					let err = PtzError::UpstreamStatus { status: response.status, body: response.body };
					error!("PTZ {} to {} failed; {}", operation, url, err);
					failure(operation, err)
				}
			},
			Err(err) => {
				error!("PTZ {} to {} failed; {}", operation, url, err);
				failure(operation, err)
			}
		}
	}
}

fn failure(operation: PtzOperation, err: PtzError) -> DispatchResult {
	match err {
		PtzError::UpstreamStatus { status, body } => DispatchResult {
			outcome: Outcome::Failure,
			upstream_status: Some(status),
			body_text: body,
			message: format!("PTZ {} error: {}", operation, status),
		},
		other => DispatchResult {
			outcome: Outcome::Failure,
			upstream_status: None,
			body_text: String::new(),
			message: format!("PTZ {} failed: {}", operation, other),
		},
	}
}
