//! S3 adapter.
//!
//! The SDK is async; each call is driven to completion on a current-thread
//! runtime owned by the store, so the gateway stays blocking.

use std::io::{self, Read};
use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, instrument};

use crate::config::{DEFAULT_REGION, S3Config};
use crate::error::{Result, StoreError};
use crate::store::{ObjectBody, ObjectStore};

/// Gateway backed by an S3-compatible service.
pub struct S3Store {
    client: Client,
    runtime: Arc<Runtime>,
    region: String,
}

impl S3Store {
    /// Build the client once; reuse the store for every call.
    pub fn connect(config: &S3Config) -> io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let client = runtime.block_on(build_client(config));
        info!(
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            region = %config.region,
            "object store client initialised"
        );
        Ok(Self {
            client,
            runtime: Arc::new(runtime),
            region: config.region.clone(),
        })
    }
}

async fn build_client(config: &S3Config) -> Client {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
    if let Some((access, secret)) = config.static_credentials() {
        loader = loader.credentials_provider(Credentials::new(
            access, secret, None, None, "statcsv",
        ));
    }
    let shared = loader.load().await;

    let mut builder = aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);
    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint);
    }
    Client::from_conf(builder.build())
}

/// Map SDK errors onto the gateway's three cases.
fn classify<E, R>(
    err: SdkError<E, R>,
    operation: &'static str,
    bucket: &str,
    key: Option<&str>,
) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match (err.code(), key) {
        (Some("NoSuchKey" | "NotFound"), Some(key)) => StoreError::no_such_key(bucket, key),
        (Some("NoSuchBucket"), _) => StoreError::no_such_bucket(bucket),
        (_, key) => {
            let fault = StoreError::fault(operation, bucket, DisplayErrorContext(&err).to_string());
            match key {
                Some(key) => fault.with_key(key),
                None => fault,
            }
        }
    }
}

impl ObjectStore for S3Store {
    #[instrument(level = "debug", skip(self))]
    fn get(&self, bucket: &str, key: &str) -> Result<ObjectBody> {
        let output = self
            .runtime
            .block_on(self.client.get_object().bucket(bucket).key(key).send())
            .map_err(|err| classify(err, "get", bucket, Some(key)))?;
        let content_length = output
            .content_length()
            .and_then(|len| u64::try_from(len).ok());
        debug!(?content_length, "object opened");
        let body = StreamReader {
            runtime: Arc::clone(&self.runtime),
            stream: output.body,
            chunk: Vec::new(),
            pos: 0,
        };
        Ok(ObjectBody::new(body, content_length))
    }

    #[instrument(level = "debug", skip(self, body), fields(bytes = body.len()))]
    fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.runtime
            .block_on(
                self.client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .body(ByteStream::from(body))
                    .send(),
            )
            .map_err(|err| classify(err, "put", bucket, Some(key)))?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn head_bucket(&self, bucket: &str) -> Result<bool> {
        match self
            .runtime
            .block_on(self.client.head_bucket().bucket(bucket).send())
        {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(HeadBucketError::is_not_found)
                    || err.code() == Some("NoSuchBucket") =>
            {
                Ok(false)
            }
            Err(err) => Err(classify(err, "head_bucket", bucket, None)),
        }
    }

    #[instrument(level = "debug", skip(self))]
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let output = self
                .runtime
                .block_on(
                    self.client
                        .list_objects_v2()
                        .bucket(bucket)
                        .prefix(prefix)
                        .set_continuation_token(token.take())
                        .send(),
                )
                .map_err(|err| classify(err, "list", bucket, None))?;
            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );
            match output.next_continuation_token() {
                Some(next) if output.is_truncated().unwrap_or(false) => {
                    token = Some(next.to_string());
                }
                _ => break,
            }
        }
        keys.sort();
        Ok(keys)
    }

    #[instrument(level = "debug", skip(self))]
    fn delete(&self, bucket: &str, key: &str) -> Result<()> {
        self.runtime
            .block_on(self.client.delete_object().bucket(bucket).key(key).send())
            .map_err(|err| classify(err, "delete", bucket, Some(key)))?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        // us-east-1 rejects an explicit location constraint
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        self.runtime
            .block_on(request.send())
            .map_err(|err| classify(err, "create_bucket", bucket, None))?;
        info!(bucket, "bucket created");
        Ok(())
    }
}

/// Blocking `Read` over a streaming object body.
struct StreamReader {
    runtime: Arc<Runtime>,
    stream: ByteStream,
    chunk: Vec<u8>,
    pos: usize,
}

impl Read for StreamReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.chunk.len() {
            match self.runtime.block_on(self.stream.try_next()) {
                Ok(Some(bytes)) => {
                    self.chunk = bytes.to_vec();
                    self.pos = 0;
                }
                Ok(None) => return Ok(0),
                Err(err) => return Err(io::Error::other(err)),
            }
        }
        let n = buf.len().min(self.chunk.len() - self.pos);
        buf[..n].copy_from_slice(&self.chunk[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}
