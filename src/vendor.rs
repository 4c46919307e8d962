//! Static table of the camera dialects we can drive.

use crate::common::{Dialect, VendorProfile, VendorType};
use crate::error::PtzError;



pub const SOAP_CONTENT_TYPE: &str = "application/soap+xml;charset=UTF8";

static YOOSEE_PROFILE: VendorProfile = VendorProfile {
	vendor: VendorType::Yoosee,
	profile_token: "IPCProfilesToken1",
	service_path_suffix: ":5000/onvif/ptz_service",
	requires_security_header: true,
	content_type: SOAP_CONTENT_TYPE,
	dialect: Dialect::Secured,
};

static YCC365_PROFILE: VendorProfile = VendorProfile {
	vendor: VendorType::Ycc365,
	profile_token: "Profile_1",
	service_path_suffix: "/onvif/PTZ",
	requires_security_header: false,
	content_type: SOAP_CONTENT_TYPE,
	dialect: Dialect::Prefixed,
};

static Y05_PROFILE: VendorProfile = VendorProfile {
	vendor: VendorType::Y05,
	profile_token: "PROFILE_000",
	service_path_suffix: ":6688/onvif/ptz_service",
	requires_security_header: true,
	content_type: SOAP_CONTENT_TYPE,
	dialect: Dialect::Secured,
};

impl VendorType {
	pub fn profile(&self) -> &'static VendorProfile {
		match self {
			VendorType::Yoosee => &YOOSEE_PROFILE,
			VendorType::Ycc365 => &YCC365_PROFILE,
			VendorType::Y05 => &Y05_PROFILE,
		}
	}
}

/// Resolve a vendor identifier (case-insensitive) to its profile. Unknown names are an error, never a default.
pub fn lookup(vendor_type: &str) -> Result<&'static VendorProfile, PtzError> {
	let vendor: VendorType = vendor_type.parse()?;
	Ok(vendor.profile())
}
