//! MD5 request signing for the BotVS API.
//!
//! Signature format: `md5_hex("{version}|{method}|{args}|{nonce}|{secret}")`.
//! `args` is the JSON array string exactly as it goes on the wire.

use std::sync::atomic::{AtomicI64, Ordering};

use md5::{Digest, Md5};

use common::Error;

/// Protocol version sent with every request.
pub const API_VERSION: &str = "1.0";

/// Holds the platform access key and the signing secret.
#[derive(Clone)]
pub struct BotvsAuth {
    pub access_key: String,
    secret_key: String,
}

impl std::fmt::Debug for BotvsAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotvsAuth")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

impl BotvsAuth {
    pub fn new(access_key: &str, secret_key: &str) -> Result<Self, Error> {
        if access_key.trim().is_empty() {
            return Err(Error::Config("access key must not be empty".into()));
        }
        if secret_key.trim().is_empty() {
            return Err(Error::Config("secret key must not be empty".into()));
        }

        Ok(Self {
            access_key: access_key.trim().to_string(),
            secret_key: secret_key.trim().to_string(),
        })
    }

    /// Hex MD5 over the pipe-joined signing string.
    pub fn sign(&self, method: &str, args_json: &str, nonce: i64) -> String {
        let message = format!(
            "{}|{}|{}|{}|{}",
            API_VERSION, method, args_json, nonce, self.secret_key
        );
        format!("{:x}", Md5::digest(message.as_bytes()))
    }

    /// Build a fully signed request for one call.
    pub fn sign_request(&self, method: &str, args_json: &str, nonce: i64) -> SignedRequest {
        SignedRequest {
            access_key: self.access_key.clone(),
            method: method.to_string(),
            args: args_json.to_string(),
            nonce,
            sign: self.sign(method, args_json, nonce),
        }
    }
}

/// An outbound request whose signature always matches its fields.
///
/// Fields are read-only; a changed call needs a new `sign_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    access_key: String,
    method: String,
    args: String,
    nonce: i64,
    sign: String,
}

impl SignedRequest {
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn nonce(&self) -> i64 {
        self.nonce
    }

    pub fn sign(&self) -> &str {
        &self.sign
    }

    /// URL-encoded form fields, in wire order. The secret is not among them.
    pub fn form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("version", API_VERSION.to_string()),
            ("access_key", self.access_key.clone()),
            ("method", self.method.clone()),
            ("args", self.args.clone()),
            ("nonce", self.nonce.to_string()),
            ("sign", self.sign.clone()),
        ]
    }
}

/// Millisecond nonces that never repeat within one client.
#[derive(Debug, Default)]
pub struct NonceSource {
    last: AtomicI64,
}

impl NonceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch milliseconds, bumped past the previous nonce if needed.
    pub fn next(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let prev = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev + 1))
            }) {
            Ok(p) | Err(p) => p,
        };
        now.max(prev + 1)
    }
}
