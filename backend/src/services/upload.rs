//! Presigned upload service
//!
//! Picks the bucket/CDN pair for a request (the default brand, or e-pdv when
//! the caller comes from an e-pdv host) and signs a PUT URL for a fresh key.

use chrono::{DateTime, Datelike, Utc};
use shared::{extension_for_mime_type, PresignedUpload};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};
use crate::external::{ObjectStoragePresigner, PutObject};

const FALLBACK_EPDV_BUCKET: &str = "e-pdv-assets";
const FALLBACK_EPDV_DOMAIN: &str = "https://cdn.e-pdv.com";

/// Bucket and public domain an object is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub bucket_name: String,
    pub public_domain: String,
}

/// Where the request came from, as seen in its headers
#[derive(Debug, Clone, Default)]
pub struct RequestOrigin {
    /// `Origin`, else `Referer`
    pub origin: Option<String>,
    /// `X-Forwarded-Host`, else `Host`
    pub host: Option<String>,
}

pub struct UploadService {
    storage: StorageConfig,
    presigner: ObjectStoragePresigner,
}

impl UploadService {
    pub fn new(storage: StorageConfig) -> Self {
        let presigner = ObjectStoragePresigner::new(&storage);
        Self { storage, presigner }
    }

    /// Presigned PUT for a new object of the tenant
    pub fn presign_upload(
        &self,
        tenant: &str,
        file_type: &str,
        origin: &RequestOrigin,
    ) -> AppResult<PresignedUpload> {
        let key = object_key(tenant, file_type, Utc::now(), Uuid::new_v4());
        let target = self.resolve_target(origin);

        let upload_url = self
            .presigner
            .presign_put(&PutObject {
                bucket: &target.bucket_name,
                key: &key,
                content_type: file_type,
            })
            .map_err(|e| {
                tracing::error!(error = %e, tenant = %tenant, "Failed to generate presigned URL");
                AppError::Storage(e.to_string())
            })?;

        tracing::debug!(tenant = %tenant, bucket = %target.bucket_name, key = %key, "Presigned upload");

        Ok(PresignedUpload {
            upload_url,
            file_url: format!("{}/{}", target.public_domain, key),
            file_key: key,
        })
    }

    pub fn resolve_target(&self, origin: &RequestOrigin) -> UploadTarget {
        if !is_epdv_request(origin) {
            return UploadTarget {
                bucket_name: self.storage.bucket_name.trim().to_string(),
                public_domain: normalize_public_domain(&self.storage.public_domain),
            };
        }

        let bucket = non_empty(self.storage.bucket_name_epdv.as_deref());
        let domain = non_empty(self.storage.public_domain_epdv.as_deref());
        if bucket.is_none() || domain.is_none() {
            tracing::warn!(
                "e-pdv storage settings missing or incomplete; falling back to {} / {}",
                FALLBACK_EPDV_BUCKET,
                FALLBACK_EPDV_DOMAIN
            );
        }

        UploadTarget {
            bucket_name: bucket.unwrap_or(FALLBACK_EPDV_BUCKET).to_string(),
            public_domain: normalize_public_domain(domain.unwrap_or(FALLBACK_EPDV_DOMAIN)),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// `uploads/{tenant}/{YYYY}/{MM}/{uuid}.{ext}`
pub fn object_key(tenant: &str, file_type: &str, now: DateTime<Utc>, id: Uuid) -> String {
    format!(
        "uploads/{}/{}/{:02}/{}.{}",
        tenant.trim().to_lowercase(),
        now.year(),
        now.month(),
        id,
        extension_for_mime_type(file_type)
    )
}

pub fn is_epdv_request(origin: &RequestOrigin) -> bool {
    [origin.origin.as_deref(), origin.host.as_deref()]
        .into_iter()
        .filter_map(extract_hostname)
        .any(|host| is_epdv_hostname(&host))
}

/// Lower-cased host of the first value of a header that may hold a URL or a bare host
pub fn extract_hostname(input: Option<&str>) -> Option<String> {
    let raw = input?.split(',').next()?.trim();
    if raw.is_empty() {
        return None;
    }

    let lower = raw.to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let authority = without_scheme.split(['/', '?', '#']).next().unwrap_or_default();
    let host = authority.rsplit('@').next().unwrap_or_default();

    Some(strip_port(host).to_string())
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

pub fn is_epdv_hostname(hostname: &str) -> bool {
    let host = strip_port(hostname);
    host == "e-pdv.com"
        || host.ends_with(".e-pdv.com")
        || host == "e-pdv.local"
        || host.ends_with(".e-pdv.local")
}

pub fn normalize_public_domain(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}
