use std::fmt;
use std::str::FromStr;

use crate::error::PtzError;



/// Camera firmware families we know how to talk to. Each one speaks a slightly
/// different flavour of ONVIF PTZ.
#[derive(Clone, Copy)]
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum VendorType {
	Yoosee,
	Ycc365,
	Y05,
}

impl VendorType {
	pub const ALL: [VendorType; 3] = [VendorType::Yoosee, VendorType::Ycc365, VendorType::Y05];

	pub fn name(&self) -> &'static str {
		match self {
			VendorType::Yoosee => "YOOSEE",
			VendorType::Ycc365 => "YCC365",
			VendorType::Y05 => "Y05",
		}
	}
}

impl fmt::Display for VendorType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for VendorType {
	type Err = PtzError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		VendorType::ALL
			.iter()
			.copied()
			.find(|vendor| vendor.name().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| PtzError::UnknownVendor(s.to_string()))
	}
}

/// How the SOAP envelope for a vendor is laid out.
#[derive(Clone, Copy)]
#[derive(Debug, PartialEq, Eq)]
pub enum Dialect {
	/// `s:` envelope, unprefixed PTZ elements, WS-Security header when required.
	Secured,
	/// `soap:` envelope with `tptz:`/`tt:` prefixed elements and no header.
	Prefixed,
}

#[derive(Debug, PartialEq, Eq)]
pub struct VendorProfile {
	pub vendor: VendorType,
	pub profile_token: &'static str,
	pub service_path_suffix: &'static str,
	pub requires_security_header: bool,
	pub content_type: &'static str,
	pub dialect: Dialect,
}

/// What the operator wants the camera to do.
#[derive(Clone, Copy)]
#[derive(Debug, PartialEq)]
pub enum PtzIntent {
	Move {
		pan: f64,
		tilt: f64,
		zoom: f64,
	},
	Stop,
}

impl PtzIntent {
	pub fn operation(&self) -> PtzOperation {
		match self {
			PtzIntent::Move { .. } => PtzOperation::ContinuousMove,
			PtzIntent::Stop => PtzOperation::Stop,
		}
	}
}

/// The ONVIF PTZ operation an intent maps onto.
#[derive(Clone, Copy)]
#[derive(Debug, PartialEq, Eq)]
pub enum PtzOperation {
	ContinuousMove,
	Stop,
}

impl PtzOperation {
	pub fn name(&self) -> &'static str {
		match self {
			PtzOperation::ContinuousMove => "ContinuousMove",
			PtzOperation::Stop => "Stop",
		}
	}
}

impl fmt::Display for PtzOperation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// One PTZ call. The vendor type travels with the request, it is never read
/// from shared state.
#[derive(Clone)]
pub struct PtzRequestContext {
	pub host_address: String,
	pub vendor_type: String,
	pub username: String,
	pub password: String,
	pub intent: PtzIntent,
}

impl fmt::Debug for PtzRequestContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PtzRequestContext")
			.field("host_address", &self.host_address)
			.field("vendor_type", &self.vendor_type)
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("intent", &self.intent)
			.finish()
	}
}

#[derive(Clone, Copy)]
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
	Success,
	Failure,
}

#[derive(Clone)]
#[derive(Debug, PartialEq)]
pub struct DispatchResult {
	pub outcome: Outcome,
	/// Status returned by the camera; `None` when no response was received.
	pub upstream_status: Option<u16>,
	pub body_text: String,
	pub message: String,
}

impl DispatchResult {
	pub fn is_success(&self) -> bool {
		self.outcome == Outcome::Success
	}

	/// Status to report to our own caller: the camera's, or 500 when the camera never answered.
	pub fn http_status(&self) -> u16 {
		self.upstream_status.unwrap_or(500)
	}
}

#[derive(Clone, Copy)]
#[derive(Debug, PartialEq, Eq)]
#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayState {
	Connecting,
	Streaming,
	Failed,
	Stopped,
}

impl RelayState {
	pub fn is_live(&self) -> bool {
		matches!(self, RelayState::Connecting | RelayState::Streaming)
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vendor_names_parse_case_insensitively() {
		assert_eq!("yoosee".parse::<VendorType>().unwrap(), VendorType::Yoosee);
		assert_eq!("Ycc365".parse::<VendorType>().unwrap(), VendorType::Ycc365);
		assert_eq!("y05".parse::<VendorType>().unwrap(), VendorType::Y05);
		assert!(matches!("VendorD".parse::<VendorType>(), Err(PtzError::UnknownVendor(_))));
		assert!("".parse::<VendorType>().is_err());
	}

	#[test]
	fn context_debug_redacts_password() {
		let context = PtzRequestContext {
			host_address: "192.168.0.167".to_string(),
			vendor_type: "Y05".to_string(),
			username: "admin".to_string(),
			password: "hunter2".to_string(),
			intent: PtzIntent::Stop,
		};
		let printed = format!("{:?}", context);
		assert!(!printed.contains("hunter2"));
		assert!(printed.contains("<redacted>"));
	}

	#[test]
	fn missing_upstream_status_reports_500() {
		let result = DispatchResult {
			outcome: Outcome::Failure,
			upstream_status: None,
			body_text: String::new(),
			message: "connection refused".to_string(),
		};
		assert_eq!(result.http_status(), 500);
	}
}
