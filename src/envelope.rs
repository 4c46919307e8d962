//! SOAP envelopes for the two PTZ dialects.
//!
//! All vendor-specific XML lives here; callers only pick a [`VendorProfile`].

use quick_xml::escape::escape;

use crate::common::{Dialect, PtzIntent, PtzOperation, VendorProfile};
use crate::wsse;



pub const SOAP_ENVELOPE_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const PTZ_WSDL_NS: &str = "http://www.onvif.org/ver20/ptz/wsdl";
pub const ONVIF_SCHEMA_NS: &str = "http://www.onvif.org/ver10/schema";

const PAN_TILT_VELOCITY_SPACE: &str = "http://www.onvif.org/ver10/tptz/PanTiltSpaces/VelocityGenericSpace";
const ZOOM_VELOCITY_SPACE: &str = "http://www.onvif.org/ver10/tptz/ZoomSpaces/VelocityGenericSpace";

/// Render the `<s:Body>` content for an intent. Speeds are written as given, with no rounding or clamping.
pub fn operation_body(profile: &VendorProfile, intent: &PtzIntent) -> String {
	let token = escape(profile.profile_token);
	match (profile.dialect, intent) {
		(Dialect::Secured, PtzIntent::Move { pan, tilt, zoom }) => format!(
			r#"<ContinuousMove xmlns="{wsdl}">
            <ProfileToken>{token}</ProfileToken>
            <Velocity>
                <PanTilt x="{pan}" y="{tilt}" space="{pan_tilt_space}" xmlns="{schema}"/>
                <Zoom x="{zoom}" space="{zoom_space}" xmlns="{schema}"/>
            </Velocity>
        </ContinuousMove>"#,
			wsdl = PTZ_WSDL_NS,
			schema = ONVIF_SCHEMA_NS,
			pan_tilt_space = PAN_TILT_VELOCITY_SPACE,
			zoom_space = ZOOM_VELOCITY_SPACE,
		),
		(Dialect::Secured, PtzIntent::Stop) => format!(
			r#"<Stop xmlns="{wsdl}">
            <ProfileToken>{token}</ProfileToken>
            <PanTilt>true</PanTilt>
            <Zoom>true</Zoom>
        </Stop>"#,
			wsdl = PTZ_WSDL_NS,
		),
		(Dialect::Prefixed, PtzIntent::Move { pan, tilt, zoom }) => format!(
			r#"<tptz:ContinuousMove>
            <tptz:ProfileToken>{token}</tptz:ProfileToken>
            <tptz:Velocity>
                <tt:PanTilt x="{pan}" y="{tilt}"/>
                <tt:Zoom x="{zoom}"/>
            </tptz:Velocity>
        </tptz:ContinuousMove>"#
		),
		(Dialect::Prefixed, PtzIntent::Stop) => format!(
			r#"<tptz:Stop>
            <tptz:ProfileToken>{token}</tptz:ProfileToken>
            <tptz:PanTilt>true</tptz:PanTilt>
            <tptz:Zoom>true</tptz:Zoom>
        </tptz:Stop>"#
		),
	}
}

/// Wrap an operation body in the vendor's envelope, signing it when the vendor demands WS-Security.
pub fn build_envelope(profile: &VendorProfile, username: &str, password: &str, body_xml: &str) -> String {
	match profile.dialect {
		Dialect::Secured => {
			let header = if profile.requires_security_header {
				wsse::sign_header(username, password).to_xml()
			} else {
				String::new()
			};
			format!(
				r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="{soap}"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:xsd="http://www.w3.org/2001/XMLSchema">
    {header}
    <s:Body>
        {body_xml}
    </s:Body>
</s:Envelope>"#,
				soap = SOAP_ENVELOPE_NS,
			)
		},
		Dialect::Prefixed => format!(
			r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="{soap}" xmlns:tptz="{wsdl}" xmlns:tt="{schema}">
    <soap:Body>
        {body_xml}
    </soap:Body>
</soap:Envelope>"#,
			soap = SOAP_ENVELOPE_NS,
			wsdl = PTZ_WSDL_NS,
			schema = ONVIF_SCHEMA_NS,
		),
	}
}

/// Content-Type header for a request. Secured vendors want the SOAP action embedded in it.
pub fn content_type(profile: &VendorProfile, operation: PtzOperation) -> String {
	match profile.dialect {
		Dialect::Secured => format!(r#"{};action="{}/{}""#, profile.content_type, PTZ_WSDL_NS, operation.name()),
		Dialect::Prefixed => profile.content_type.to_string(),
	}
}
