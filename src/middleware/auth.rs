use axum::http::HeaderValue;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::RpcError;

type HmacSha256 = Hmac<Sha256>;

/// Checks the gateway's Basic-Auth credential against the shared secret.
///
/// Only the password part is compared; the username is ignored. Every
/// failure collapses into [`RpcError::Unauthorized`].
#[derive(Clone)]
pub struct Authenticator {
    mac: HmacSha256,
    expected_tag: Vec<u8>,
}

impl Authenticator {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| anyhow::anyhow!("webhook secret cannot key HMAC-SHA256"))?;
        let expected_tag = mac
            .clone()
            .chain_update(secret.as_bytes())
            .finalize()
            .into_bytes()
            .to_vec();
        Ok(Self { mac, expected_tag })
    }

    pub fn verify(&self, header: Option<&HeaderValue>) -> Result<(), RpcError> {
        match self.check(header) {
            Ok(()) => Ok(()),
            Err(reason) => {
                tracing::warn!(reason, "Webhook authentication failed");
                Err(RpcError::Unauthorized)
            }
        }
    }

    fn check(&self, header: Option<&HeaderValue>) -> Result<(), &'static str> {
        let header = header.ok_or("missing authorization header")?;
        let header = header.to_str().map_err(|_| "non-ascii authorization header")?;
        let encoded = header
            .strip_prefix("Basic ")
            .ok_or("authorization scheme is not Basic")?;
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| "credential is not base64")?;
        let decoded = String::from_utf8(decoded).map_err(|_| "credential is not utf-8")?;
        let (_username, password) = decoded
            .split_once(':')
            .ok_or("credential has no password")?;

        // Constant-time comparison via HMAC tag verification
        self.mac
            .clone()
            .chain_update(password.as_bytes())
            .verify_slice(&self.expected_tag)
            .map_err(|_| "password mismatch")
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}
