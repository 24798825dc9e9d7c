use crate::error::{EmbedError, EmbedResult};
use crate::storage::ObjectStore;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Whole-request budget, body transfer included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// S3-compatible store addressed path-style: `{scheme}://{endpoint}/{bucket}/{key}`.
///
/// Requests are unsigned, so buckets must allow anonymous reads.
pub struct HttpObjectStore {
    base: Url,
    agent: ureq::Agent,
}

impl HttpObjectStore {
    /// `endpoint` is `host[:port]`, as in `MINIO_ENDPOINT`; `secure` selects https.
    pub fn new(endpoint: &str, secure: bool) -> EmbedResult<Self> {
        Self::with_timeouts(endpoint, secure, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    pub fn with_timeouts(
        endpoint: &str,
        secure: bool,
        connect: Duration,
        request: Duration,
    ) -> EmbedResult<Self> {
        let scheme = if secure { "https" } else { "http" };
        let trimmed = endpoint.trim_end_matches('/');
        let raw = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("{}://{}", scheme, trimmed)
        };
        let base = Url::parse(&raw)
            .map_err(|e| EmbedError::Storage(format!("invalid endpoint '{}': {}", endpoint, e)))?;

        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect)
            .timeout(request)
            .build();

        Ok(Self { base, agent })
    }

    /// Builds the object URL, percent-encoding each key segment.
    ///
    /// An empty bucket or key names no object and is `NotFound`; otherwise the
    /// URL would address the bucket itself.
    pub fn object_url(&self, bucket: &str, key: &str) -> EmbedResult<Url> {
        if key.is_empty() {
            return Err(EmbedError::NotFound(format!("{}/", bucket)));
        }
        let mut url = self.bucket_url(bucket)?;
        url.path_segments_mut()
            .map_err(|_| EmbedError::Storage(format!("endpoint {} cannot hold a path", self.base)))?
            .extend(key.split('/'));
        Ok(url)
    }

    fn bucket_url(&self, bucket: &str) -> EmbedResult<Url> {
        if bucket.is_empty() {
            return Err(EmbedError::NotFound("empty bucket name".to_string()));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| EmbedError::Storage(format!("endpoint {} cannot hold a path", self.base)))?
            .pop_if_empty()
            .push(bucket);
        Ok(url)
    }
}

/// Maps a ureq failure; 404 becomes `NotFound`, everything else `Storage`.
fn map_error(err: ureq::Error, what: &str) -> EmbedError {
    match err {
        ureq::Error::Status(404, _) => EmbedError::NotFound(what.to_string()),
        ureq::Error::Status(status, _) => {
            EmbedError::Storage(format!("{}: HTTP {}", what, status))
        }
        ureq::Error::Transport(transport) => {
            EmbedError::Storage(format!("{}: {}", what, transport))
        }
    }
}

impl ObjectStore for HttpObjectStore {
    fn stat(&self, bucket: &str, key: &str) -> EmbedResult<()> {
        let url = self.object_url(bucket, key)?;
        debug!("HEAD {}", url);
        self.agent
            .head(url.as_str())
            .call()
            .map(|_| ())
            .map_err(|e| map_error(e, &format!("{}/{}", bucket, key)))
    }

    fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> EmbedResult<()> {
        let url = self.object_url(bucket, key)?;
        debug!("GET {} -> {}", url, dest.display());
        let response = self
            .agent
            .get(url.as_str())
            .call()
            .map_err(|e| map_error(e, &format!("{}/{}", bucket, key)))?;

        let file = File::create(dest)?;
        let mut writer = BufWriter::new(file);
        let mut reader = response.into_reader();
        io::copy(&mut reader, &mut writer)
            .map_err(|e| EmbedError::Storage(format!("download {}/{}: {}", bucket, key, e)))?;
        writer.flush()?;
        Ok(())
    }

    fn bucket_exists(&self, bucket: &str) -> EmbedResult<bool> {
        let url = self.bucket_url(bucket)?;
        match self.agent.head(url.as_str()).call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(e) => Err(map_error(e, bucket)),
        }
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}
