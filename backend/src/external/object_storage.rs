//! S3-compatible object storage presigner
//!
//! Produces AWS Signature V4 query-string presigned URLs (path-style
//! addressing) against a Cloudflare R2 account endpoint. No request is sent.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::StorageConfig;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

#[derive(Debug, Error)]
pub enum PresignError {
    #[error("Storage credentials are not configured")]
    MissingCredentials,

    #[error("Invalid signing key")]
    InvalidKey,
}

/// One object write to presign
#[derive(Debug, Clone)]
pub struct PutObject<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
    pub content_type: &'a str,
}

/// Signs PUT URLs for an R2 account
#[derive(Clone)]
pub struct ObjectStoragePresigner {
    host: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
    expires_in: u64,
}

impl ObjectStoragePresigner {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            host: config.endpoint_host(),
            region: config.region.clone(),
            access_key_id: config.access_key_id.trim().to_string(),
            secret_access_key: config.secret_access_key.trim().to_string(),
            expires_in: config.presign_expiry_secs,
        }
    }

    /// Presigned PUT URL valid for the configured lifetime from now
    pub fn presign_put(&self, object: &PutObject<'_>) -> Result<String, PresignError> {
        self.presign_put_at(object, Utc::now())
    }

    /// Presigned PUT URL signed at a fixed instant
    pub fn presign_put_at(
        &self,
        object: &PutObject<'_>,
        now: DateTime<Utc>,
    ) -> Result<String, PresignError> {
        if self.access_key_id.is_empty() || self.secret_access_key.is_empty() {
            return Err(PresignError::MissingCredentials);
        }

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let short_date = now.format("%Y%m%d").to_string();
        let scope = format!("{}/{}/{}/aws4_request", short_date, self.region, SERVICE);
        let signed_headers = "content-type;host";

        let canonical_uri = format!(
            "/{}/{}",
            uri_encode(object.bucket, true),
            uri_encode(object.key, false)
        );

        // already sorted by parameter name
        let query = [
            ("X-Amz-Algorithm", ALGORITHM.to_string()),
            ("X-Amz-Content-Sha256", UNSIGNED_PAYLOAD.to_string()),
            (
                "X-Amz-Credential",
                format!("{}/{}", self.access_key_id, scope),
            ),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", self.expires_in.to_string()),
            ("X-Amz-SignedHeaders", signed_headers.to_string()),
        ];
        let canonical_query = query
            .iter()
            .map(|(name, value)| format!("{}={}", uri_encode(name, true), uri_encode(value, true)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_headers = format!(
            "content-type:{}\nhost:{}\n",
            object.content_type.trim(),
            self.host
        );

        let canonical_request = format!(
            "PUT\n{}\n{}\n{}\n{}\n{}",
            canonical_uri, canonical_query, canonical_headers, signed_headers, UNSIGNED_PAYLOAD
        );

        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = self.signing_key(&short_date)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        Ok(format!(
            "https://{}{}?{}&X-Amz-Signature={}",
            self.host, canonical_uri, canonical_query, signature
        ))
    }

    fn signing_key(&self, short_date: &str) -> Result<Vec<u8>, PresignError> {
        let secret = format!("AWS4{}", self.secret_access_key);
        let date_key = hmac_sha256(secret.as_bytes(), short_date.as_bytes())?;
        let region_key = hmac_sha256(&date_key, self.region.as_bytes())?;
        let service_key = hmac_sha256(&region_key, SERVICE.as_bytes())?;
        hmac_sha256(&service_key, b"aws4_request")
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, PresignError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| PresignError::InvalidKey)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// RFC 3986 percent-encoding as required by SigV4; `/` is kept in object keys
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
