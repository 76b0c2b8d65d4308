use std::collections::HashMap;
use std::io::Read;
use std::time::Duration;

use rusty_s3::actions::{ListObjectsV2, S3Action};
use rusty_s3::{Bucket, Credentials, UrlStyle};
use stowage_types::error::{Result, StowageError};

/// Number of retry attempts for idempotent requests.
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 250;
const RETRY_MAX_DELAY_MS: u64 = 4_000;

/// Validity window for the URLs that sign individual backend requests.
/// Caller-facing download URLs get their TTL from the artifact store.
const REQUEST_SIGN_DURATION: Duration = Duration::from_secs(3600);

/// Object storage backend for AWS S3 and S3-compatible services (MinIO,
/// Ceph RGW, ...). Endpoint is always explicit; path-style addressing.
pub struct S3Backend {
    endpoint: url::Url,
    region: String,
    credentials: Credentials,
    agent: ureq::Agent,
}

impl S3Backend {
    pub fn new(
        endpoint: &str,
        region: &str,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> Result<Self> {
        let endpoint = endpoint
            .parse()
            .map_err(|e| StowageError::Config(format!("invalid S3 endpoint URL '{endpoint}': {e}")))?;

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .timeout_read(Duration::from_secs(300))
            .timeout_write(Duration::from_secs(300))
            .build();

        Ok(Self {
            endpoint,
            region: region.to_string(),
            credentials: Credentials::new(access_key_id, secret_access_key),
            agent,
        })
    }

    /// Build from a provider config map. Requires `endpoint` and `region`;
    /// credentials come from `access_key_id`/`secret_access_key` entries or
    /// fall back to the conventional AWS environment variables.
    pub fn from_config(config: &HashMap<String, String>) -> Result<Self> {
        let endpoint = config
            .get("endpoint")
            .ok_or_else(|| StowageError::Config("s3 backend requires 'endpoint'".into()))?;
        let region = config
            .get("region")
            .ok_or_else(|| StowageError::Config("s3 backend requires 'region'".into()))?;
        let access_key_id = config_or_env(config, "access_key_id", "AWS_ACCESS_KEY_ID")?;
        let secret_access_key =
            config_or_env(config, "secret_access_key", "AWS_SECRET_ACCESS_KEY")?;
        Self::new(endpoint, region, &access_key_id, &secret_access_key)
    }

    fn bucket(&self, name: &str) -> Result<Bucket> {
        Bucket::new(
            self.endpoint.clone(),
            UrlStyle::Path,
            name.to_string(),
            self.region.clone(),
        )
        .map_err(|e| StowageError::Config(format!("invalid S3 bucket '{name}': {e}")))
    }

    /// Retry a closure on transient errors with exponential backoff + jitter.
    /// Only used for requests that can be re-issued verbatim.
    fn retry_call<T>(
        &self,
        op_name: &str,
        f: impl Fn() -> std::result::Result<T, ureq::Error>,
    ) -> std::result::Result<T, ureq::Error> {
        let mut delay_ms = RETRY_DELAY_MS;
        let mut last_err = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let jitter = rand::random::<u64>() % delay_ms.max(1);
                std::thread::sleep(Duration::from_millis(delay_ms + jitter));
                delay_ms = (delay_ms * 2).min(RETRY_MAX_DELAY_MS);
            }
            match f() {
                Ok(val) => return Ok(val),
                Err(e) if is_retryable(&e) && attempt < MAX_RETRIES => {
                    tracing::warn!(
                        "S3 {op_name}: transient error (attempt {}/{MAX_RETRIES}), retrying: {e}",
                        attempt + 1,
                    );
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap())
    }
}

fn config_or_env(config: &HashMap<String, String>, key: &str, env: &str) -> Result<String> {
    if let Some(value) = config.get(key) {
        return Ok(value.clone());
    }
    std::env::var(env).map_err(|_| {
        StowageError::Config(format!("s3 backend requires '{key}' (or ${env} in the environment)"))
    })
}

/// Whether an HTTP error is transient and worth retrying.
fn is_retryable(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Transport(_) => true,
        ureq::Error::Status(code, _) => *code == 429 || *code >= 500,
    }
}

impl crate::ObjectStorage for S3Backend {
    fn put_object(&self, bucket: &str, key: &str, body: &mut dyn Read) -> Result<()> {
        let url = self
            .bucket(bucket)?
            .put_object(Some(&self.credentials), key)
            .sign(REQUEST_SIGN_DURATION);

        // The body stream cannot be rewound from here, so puts are not
        // retried.
        self.agent
            .put(url.as_str())
            .send(body)
            .map_err(|e| StowageError::Storage(format!("S3 PUT {key}: {e}")))?;
        Ok(())
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Box<dyn Read + Send>> {
        let url = self
            .bucket(bucket)?
            .get_object(Some(&self.credentials), key)
            .sign(REQUEST_SIGN_DURATION);

        match self.retry_call(&format!("GET {key}"), || {
            self.agent.get(url.as_str()).call()
        }) {
            Ok(resp) => Ok(Box::new(resp.into_reader())),
            Err(ureq::Error::Status(404, _)) => {
                Err(StowageError::NotFound(format!("{bucket}/{key}")))
            }
            Err(e) => Err(StowageError::Storage(format!("S3 GET {key}: {e}"))),
        }
    }

    fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        let url = self
            .bucket(bucket)?
            .head_object(Some(&self.credentials), key)
            .sign(REQUEST_SIGN_DURATION);

        match self.retry_call(&format!("HEAD {key}"), || {
            self.agent.head(url.as_str()).call()
        }) {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(e) => Err(StowageError::Storage(format!("S3 HEAD {key}: {e}"))),
        }
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let bucket = self.bucket(bucket)?;
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut action = bucket.list_objects_v2(Some(&self.credentials));
            action.query_mut().insert("prefix", prefix);
            if let Some(ref token) = continuation_token {
                action.query_mut().insert("continuation-token", token);
            }
            let url = action.sign(REQUEST_SIGN_DURATION);

            let body = self
                .retry_call(&format!("LIST {prefix}"), || {
                    self.agent.get(url.as_str()).call()
                })
                .map_err(|e| StowageError::Storage(format!("S3 LIST {prefix}: {e}")))?
                .into_string()
                .map_err(|e| StowageError::Storage(format!("S3 LIST {prefix}: body read: {e}")))?;

            let parsed = ListObjectsV2::parse_response(&body).map_err(|e| {
                StowageError::Storage(format!("S3 LIST {prefix}: failed to parse response: {e}"))
            })?;

            for obj in &parsed.contents {
                // Skip directory markers
                if !obj.key.ends_with('/') {
                    keys.push(obj.key.clone());
                }
            }

            match parsed.next_continuation_token {
                Some(token) => continuation_token = Some(token),
                None => break,
            }
        }

        Ok(keys)
    }

    fn list_common_prefixes(
        &self,
        bucket: &str,
        prefix: &str,
        delimiter: &str,
    ) -> Result<Vec<String>> {
        let keys = self.list_objects(bucket, prefix)?;
        Ok(crate::common_prefixes_from_keys(prefix, delimiter, &keys))
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        let url = self
            .bucket(bucket)?
            .delete_object(Some(&self.credentials), key)
            .sign(REQUEST_SIGN_DURATION);

        self.retry_call(&format!("DELETE {key}"), || {
            self.agent.delete(url.as_str()).call()
        })
        .map_err(|e| StowageError::Storage(format!("S3 DELETE {key}: {e}")))?;
        Ok(())
    }

    fn create_signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String> {
        let url = self
            .bucket(bucket)?
            .get_object(Some(&self.credentials), key)
            .sign(ttl);
        Ok(url.into())
    }
}
