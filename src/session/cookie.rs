//! Signed session cookie values
//!
//! A cookie carries `<uuid>.<hex HMAC-SHA256(uuid, secret)>`. The signature
//! stops clients from guessing or forging another browser's session id.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

/// HMAC type alias for SHA-256
type HmacSha256 = Hmac<Sha256>;

pub const COOKIE_NAME: &str = "docuchat_session";

fn mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}

pub fn sign(id: Uuid, secret: &str) -> String {
    let mut mac = mac(secret);
    mac.update(id.as_bytes());
    format!("{}.{}", id, hex::encode(mac.finalize().into_bytes()))
}

/// Session id from a cookie value, if the signature matches
pub fn verify(value: &str, secret: &str) -> Option<Uuid> {
    let (id, signature) = value.split_once('.')?;
    let id = Uuid::parse_str(id).ok()?;
    let signature = hex::decode(signature).ok()?;

    let mut mac = mac(secret);
    mac.update(id.as_bytes());
    // constant-time comparison
    mac.verify_slice(&signature).ok()?;
    Some(id)
}

/// Value of our cookie in a `Cookie` request header
pub fn find_in_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == COOKIE_NAME)
        .map(|(_, value)| value)
}

/// `Set-Cookie` header value for a freshly created session
pub fn set_cookie_header(value: &str) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", COOKIE_NAME, value)
}
