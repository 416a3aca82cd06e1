// crates/security-gate-server/src/object_store.rs
// ============================================================================
// Module: Security Gate Object Store Fetcher
// Description: S3-compatible artifact fetcher for reference-mode replication.
// Purpose: Fetch referenced artifacts with a bounded timeout and size cap.
// Dependencies: security-gate-core, security-gate-config, aws-sdk-s3, tokio
// ============================================================================

//! ## Overview
//! [`ObjectStoreFetcher`] implements the core [`ArtifactFetcher`] contract on
//! top of an S3-compatible client. Each fetch is a single attempt bounded by
//! the configured timeout; bodies are streamed and abandoned as soon as they
//! exceed the configured size cap. Every backend fault collapses into
//! [`FetchError`].
//! Security posture: storage responses are untrusted; sizes are enforced while
//! streaming, not only from declared lengths.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use security_gate_config::ObjectStoreConfig;
use security_gate_config::ObjectStoreProvider;
use security_gate_core::ArtifactFetcher;
use security_gate_core::FetchError;
use security_gate_core::ObjectLocation;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::runtime::Handle;
use tokio::runtime::Runtime;
use tokio::runtime::RuntimeFlavor;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Streaming read chunk size in bytes.
const READ_CHUNK_BYTES: usize = 8192;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Object-store errors.
#[derive(Debug, thiserror::Error)]
pub enum ObjectStoreError {
    /// Invalid configuration.
    #[error("object store invalid: {0}")]
    Invalid(String),
    /// Local I/O or runtime failure.
    #[error("object store io error: {0}")]
    Io(String),
    /// Backend returned an error.
    #[error("object store backend error: {0}")]
    Backend(String),
    /// Fetch did not complete within the timeout.
    #[error("object store fetch timed out after {0} ms")]
    Timeout(u64),
    /// Object exceeds size limits.
    #[error("object too large: {location} ({actual_bytes} > {max_bytes})")]
    TooLarge {
        /// Object location.
        location: String,
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Bytes observed before the read was abandoned.
        actual_bytes: usize,
    },
}

// ============================================================================
// SECTION: Runtime Helpers
// ============================================================================

/// Blocks on an object-store future using a compatible runtime.
fn block_on_with_runtime<F, T>(runtime: &Runtime, future: F) -> Result<T, ObjectStoreError>
where
    F: Future<Output = Result<T, ObjectStoreError>> + Send + 'static,
    T: Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) {
            return tokio::task::block_in_place(|| handle.block_on(future));
        }
        let (tx, rx) = std::sync::mpsc::sync_channel(1);
        std::thread::spawn(move || {
            let result = Runtime::new()
                .map_err(|err| ObjectStoreError::Io(err.to_string()))
                .and_then(|runtime| runtime.block_on(future));
            let _ = tx.send(result);
        });
        return rx.recv().unwrap_or_else(|_| {
            Err(ObjectStoreError::Io("object store thread join failed".to_string()))
        });
    }
    runtime.block_on(future)
}

/// Runs `future` under a timeout.
async fn with_timeout<F, T>(timeout: Duration, future: F) -> Result<T, ObjectStoreError>
where
    F: Future<Output = Result<T, ObjectStoreError>>,
{
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| ObjectStoreError::Timeout(timeout_ms))?
}

/// Reads `reader` to the end, failing once more than `max_bytes` arrive.
async fn read_capped<R>(
    mut reader: R,
    location: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, ObjectStoreError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = Vec::new();
    let mut total_bytes = 0usize;
    let mut chunk = [0u8; READ_CHUNK_BYTES];
    loop {
        let read =
            reader.read(&mut chunk).await.map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        if read == 0 {
            break;
        }
        total_bytes = total_bytes
            .checked_add(read)
            .ok_or_else(|| ObjectStoreError::Io("object size overflow".to_string()))?;
        if total_bytes > max_bytes {
            return Err(ObjectStoreError::TooLarge {
                location: location.to_string(),
                max_bytes,
                actual_bytes: total_bytes,
            });
        }
        buffer.extend_from_slice(&chunk[.. read]);
    }
    Ok(buffer)
}

// ============================================================================
// SECTION: Object Store Client
// ============================================================================

/// Minimal object-store client abstraction.
pub(crate) trait ObjectStoreClient: Send + Sync {
    /// Reads a single object with a size limit.
    fn get(
        &self,
        location: &ObjectLocation,
        max_bytes: usize,
    ) -> Result<Vec<u8>, ObjectStoreError>;
}

/// S3-backed object-store client.
struct S3ObjectStoreClient {
    /// Underlying S3 client.
    client: Client,
    /// Per-fetch timeout.
    timeout: Duration,
    /// Tokio runtime for blocking S3 operations.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for S3ObjectStoreClient {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

impl S3ObjectStoreClient {
    /// Builds a new S3-backed object store client.
    fn new(config: &ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        let runtime = Runtime::new().map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        let region = config.region.clone();
        let endpoint = config.endpoint.clone();
        let shared_config = block_on_with_runtime(&runtime, async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = region {
                loader = loader.region(Region::new(region));
            }
            if let Some(endpoint) = endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            Ok(loader.load().await)
        })?;
        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }
        Ok(Self {
            client: Client::from_conf(s3_builder.build()),
            timeout: Duration::from_millis(config.fetch_timeout_ms),
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Returns the runtime or an error if shutdown.
    fn runtime(&self) -> Result<&Runtime, ObjectStoreError> {
        self.runtime
            .as_ref()
            .map(AsRef::as_ref)
            .ok_or_else(|| ObjectStoreError::Io("object store runtime closed".to_string()))
    }
}

impl ObjectStoreClient for S3ObjectStoreClient {
    fn get(
        &self,
        location: &ObjectLocation,
        max_bytes: usize,
    ) -> Result<Vec<u8>, ObjectStoreError> {
        let client = self.client.clone();
        let bucket = location.bucket.clone();
        let key = location.key.clone();
        let label = location.to_string();
        let timeout = self.timeout;
        block_on_with_runtime(self.runtime()?, async move {
            with_timeout(timeout, async move {
                let output = client
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|err| ObjectStoreError::Backend(err.to_string()))?;
                if let Some(length) = output.content_length() {
                    let actual_bytes = usize::try_from(length).unwrap_or(usize::MAX);
                    if actual_bytes > max_bytes {
                        return Err(ObjectStoreError::TooLarge {
                            location: label,
                            max_bytes,
                            actual_bytes,
                        });
                    }
                }
                read_capped(output.body.into_async_read(), &label, max_bytes).await
            })
            .await
        })
    }
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Object-store-backed artifact fetcher.
pub struct ObjectStoreFetcher {
    /// Object-store client implementation.
    client: Arc<dyn ObjectStoreClient>,
    /// Maximum fetched object size.
    max_object_bytes: usize,
}

impl ObjectStoreFetcher {
    /// Creates a fetcher from object-store configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when configuration or initialization fails.
    pub fn from_config(config: &ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        config.validate().map_err(|err| ObjectStoreError::Invalid(err.to_string()))?;
        let client: Arc<dyn ObjectStoreClient> = match config.provider {
            ObjectStoreProvider::S3 => Arc::new(S3ObjectStoreClient::new(config)?),
        };
        Ok(Self {
            client,
            max_object_bytes: config.max_object_bytes,
        })
    }

    /// Creates a fetcher from a custom object-store client (tests only).
    #[cfg(test)]
    pub(crate) fn from_client(client: Arc<dyn ObjectStoreClient>, max_object_bytes: usize) -> Self {
        Self {
            client,
            max_object_bytes,
        }
    }
}

impl ArtifactFetcher for ObjectStoreFetcher {
    fn fetch(&self, location: &ObjectLocation) -> Result<Vec<u8>, FetchError> {
        self.client
            .get(location, self.max_object_bytes)
            .map_err(|err| FetchError(err.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
