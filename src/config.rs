/// Process configuration.
///
/// Every setting is a CLI flag that falls back to the environment
/// variable of the same purpose, so a deployment can be configured
/// entirely through its environment.
use std::sync::Arc;

use clap::{Args, ValueEnum};

use crate::error::{AdminError, Result};
use crate::storage::memory::MemoryStore;
use crate::storage::s3::S3Store;
use crate::storage::ObjectStore;

pub const DEFAULT_CDN_DOMAIN: &str = "cdn.hv6.dev";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    S3,
    Memory,
}

/// Connection settings for the S3 bucket.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Custom endpoint for S3-compatible gateways; AWS when unset.
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Which object store backs the bucket.
    #[arg(long, env = "STORE", value_enum, default_value = "s3")]
    pub store: StoreKind,

    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    pub access_key_id: Option<String>,

    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    #[arg(long, env = "AWS_S3_BUCKET_NAME")]
    pub bucket: Option<String>,

    #[arg(long, env = "S3_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Host serving the bucket contents publicly.
    #[arg(long, env = "CLOUDFRONT_DOMAIN", default_value = DEFAULT_CDN_DOMAIN)]
    pub cdn_domain: String,

    /// The only identity allowed to modify the bucket.
    #[arg(long, env = "ALLOWED_EMAIL")]
    pub allowed_email: String,

    /// HMAC secret used to verify session tokens.
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: String,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub store: StoreKind,
    pub s3: Option<S3Config>,
    pub cdn_domain: String,
    pub allowed_email: String,
    pub session_secret: String,
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AdminError::Config(format!("{name} must be set when using the S3 store")))
}

impl ServerConfig {
    pub fn from_args(args: ServeArgs) -> Result<Self> {
        if args.allowed_email.trim().is_empty() {
            return Err(AdminError::Config("ALLOWED_EMAIL must not be empty".into()));
        }
        if args.session_secret.is_empty() {
            return Err(AdminError::Config("SESSION_SECRET must not be empty".into()));
        }

        let s3 = match args.store {
            StoreKind::S3 => Some(S3Config {
                region: args.region,
                access_key_id: required(args.access_key_id, "AWS_ACCESS_KEY_ID")?,
                secret_access_key: required(args.secret_access_key, "AWS_SECRET_ACCESS_KEY")?,
                bucket: required(args.bucket, "AWS_S3_BUCKET_NAME")?,
                endpoint: args.endpoint,
            }),
            StoreKind::Memory => None,
        };

        Ok(Self {
            bind: args.bind,
            store: args.store,
            s3,
            cdn_domain: args.cdn_domain,
            allowed_email: args.allowed_email.trim().to_string(),
            session_secret: args.session_secret,
        })
    }

    /// Construct the object store handle shared by all requests.
    pub fn build_store(&self) -> Result<Arc<dyn ObjectStore>> {
        match (self.store, &self.s3) {
            (StoreKind::S3, Some(s3)) => Ok(Arc::new(S3Store::new(s3))),
            (StoreKind::S3, None) => Err(AdminError::Config("missing S3 settings".into())),
            (StoreKind::Memory, _) => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(store: StoreKind) -> ServeArgs {
        ServeArgs {
            bind: "127.0.0.1:0".into(),
            store,
            region: "us-east-1".into(),
            access_key_id: None,
            secret_access_key: None,
            bucket: None,
            endpoint: None,
            cdn_domain: DEFAULT_CDN_DOMAIN.into(),
            allowed_email: " owner@example.com ".into(),
            session_secret: "secret".into(),
        }
    }

    #[test]
    fn test_memory_store_needs_no_credentials() {
        let config = ServerConfig::from_args(args(StoreKind::Memory)).unwrap();
        assert!(config.s3.is_none());
        assert_eq!(config.allowed_email, "owner@example.com");
        assert_eq!(config.build_store().unwrap().name(), "memory");
    }

    #[test]
    fn test_s3_store_requires_bucket() {
        let mut a = args(StoreKind::S3);
        a.access_key_id = Some("AKIA".into());
        a.secret_access_key = Some("shh".into());
        let err = ServerConfig::from_args(a).unwrap_err();
        assert!(err.to_string().contains("AWS_S3_BUCKET_NAME"));
    }

    #[test]
    fn test_empty_allowed_email_rejected() {
        let mut a = args(StoreKind::Memory);
        a.allowed_email = "  ".into();
        assert!(ServerConfig::from_args(a).is_err());
    }
}
