//! WS-Security UsernameToken signing
//!
//! Builds the `<s:Header>` block some cameras require on every PTZ call:
//! `PasswordDigest = base64(sha1(nonce || created || password))`, hashed over
//! the raw UTF-8 bytes of each part (the nonce itself, not its Base64 form).

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use quick_xml::escape::escape;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::{Digest, Sha1};



pub const NONCE_LENGTH: usize = 24;

const WSSE_NS: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
const WSU_NS: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
const PASSWORD_DIGEST_TYPE: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordDigest";
const BASE64_ENCODING_TYPE: &str = "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

/// A signed UsernameToken. Built fresh for every request and never reused.
#[derive(Clone)]
#[derive(Debug, PartialEq, Eq)]
pub struct SecurityHeader {
	pub username: String,
	pub password_digest: String,
	pub nonce_base64: String,
	pub created: String,
}

impl SecurityHeader {
	pub fn to_xml(&self) -> String {
		format!(
			r#"<s:Header>
        <Security s:mustUnderstand="1" xmlns="{wsse}">
            <UsernameToken>
                <Username>{username}</Username>
                <Password Type="{digest_type}">{digest}</Password>
                <Nonce EncodingType="{encoding_type}">{nonce}</Nonce>
                <Created xmlns="{wsu}">{created}</Created>
            </UsernameToken>
        </Security>
    </s:Header>"#,
			wsse = WSSE_NS,
			username = escape(self.username.as_str()),
			digest_type = PASSWORD_DIGEST_TYPE,
			digest = self.password_digest,
			encoding_type = BASE64_ENCODING_TYPE,
			nonce = self.nonce_base64,
			wsu = WSU_NS,
			created = escape(self.created.as_str()),
		)
	}
}

/// Sign with a fresh random nonce and the current UTC time.
pub fn sign_header(username: &str, password: &str) -> SecurityHeader {
	let nonce = generate_nonce();
	let created = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string();
	sign_header_with(username, password, &nonce, &created)
}

pub fn sign_header_with(username: &str, password: &str, nonce: &str, created: &str) -> SecurityHeader {
	SecurityHeader {
		username: username.to_string(),
		password_digest: compute_digest(nonce.as_bytes(), created, password),
		nonce_base64: BASE64.encode(nonce.as_bytes()),
		created: created.to_string(),
	}
}

/// `base64(sha1(nonce || created || password))`
pub fn compute_digest(nonce: &[u8], created: &str, password: &str) -> String {
	let mut hasher = Sha1::new();
	hasher.update(nonce);
	hasher.update(created.as_bytes());
	hasher.update(password.as_bytes());
	BASE64.encode(hasher.finalize())
}

fn generate_nonce() -> String {
	rand::thread_rng()
		.sample_iter(&Alphanumeric)
		.take(NONCE_LENGTH)
		.map(char::from)
		.collect()
}
