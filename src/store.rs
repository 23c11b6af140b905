use std::{fmt::Display, path::Path, sync::Arc};

use actix_web::web::Bytes;
use futures_util::{stream::BoxStream, StreamExt};
use object_store::{
    aws::AmazonS3Builder, local::LocalFileSystem, path::Path as ObjectPath, Attribute,
    ObjectStore, PutMultipartOpts, WriteMultipart,
};
use url::Url;
use uuid::Uuid;

use crate::{
    aspect::Orientation,
    config::{Configuration, Filesystem, ObjectStorage},
    error_code::ErrorCode,
    formats::VideoFormat,
};

const CHUNK_SIZE: usize = 1024 * 64;
const MAX_UPLOAD_CONCURRENCY: usize = 4;

#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("Error in object store")]
    ObjectStore(#[source] object_store::Error),

    #[error("Requested object is not found")]
    ObjectNotFound(#[source] object_store::Error),

    #[error("Error reading file to publish")]
    ReadFile(#[source] std::io::Error),

    #[error("Error creating store directory")]
    CreateDir(#[source] std::io::Error),

    #[error("Invalid storage key")]
    InvalidKey(#[source] object_store::path::Error),

    #[error("Invalid public url")]
    Url(#[source] url::ParseError),
}

impl StoreError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ObjectStore(_) => ErrorCode::OBJECT_REQUEST_ERROR,
            Self::ObjectNotFound(_) => ErrorCode::OBJECT_NOT_FOUND,
            Self::ReadFile(_) | Self::CreateDir(_) => ErrorCode::FILE_IO_ERROR,
            Self::InvalidKey(_) | Self::Url(_) => ErrorCode::INVALID_STORAGE_KEY,
        }
    }

    pub(crate) const fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound(_))
    }
}

impl From<object_store::Error> for StoreError {
    fn from(value: object_store::Error) -> Self {
        match value {
            e @ object_store::Error::NotFound { .. } => Self::ObjectNotFound(e),
            e => Self::ObjectStore(e),
        }
    }
}

/// Object key of a published video, `{orientation}/{id}{extension}`
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StorageKey {
    orientation: Orientation,
    id: Uuid,
    extension: &'static str,
}

impl StorageKey {
    pub(crate) fn generate(orientation: Orientation, format: VideoFormat) -> Self {
        StorageKey {
            orientation,
            id: Uuid::new_v4(),
            extension: format.file_extension(),
        }
    }

    pub(crate) const fn orientation(&self) -> Orientation {
        self.orientation
    }

    fn to_path(&self) -> ObjectPath {
        ObjectPath::from_iter([
            self.orientation.as_str().to_string(),
            format!("{}{}", self.id.simple(), self.extension),
        ])
    }
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}{}", self.orientation, self.id.simple(), self.extension)
    }
}

pub(crate) struct StoredObject {
    pub(crate) content_type: Option<String>,
    pub(crate) size: usize,
    pub(crate) stream: BoxStream<'static, Result<Bytes, StoreError>>,
}

#[derive(Clone)]
pub(crate) struct Store {
    inner: Arc<dyn ObjectStore>,
    public_endpoint: Url,
    supports_attributes: bool,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("inner", &self.inner.to_string())
            .field("public_endpoint", &self.public_endpoint.as_str())
            .finish()
    }
}

impl Store {
    pub(crate) fn new(
        inner: Arc<dyn ObjectStore>,
        public_endpoint: Url,
        supports_attributes: bool,
    ) -> Self {
        Store {
            inner,
            public_endpoint: with_trailing_slash(public_endpoint),
            supports_attributes,
        }
    }

    pub(crate) async fn build(config: &Configuration) -> Result<Self, StoreError> {
        match &config.store {
            crate::config::Store::Filesystem(Filesystem {
                path,
                public_endpoint,
            }) => {
                tokio::fs::create_dir_all(path)
                    .await
                    .map_err(StoreError::CreateDir)?;

                let inner = LocalFileSystem::new_with_prefix(path)?;

                let public_endpoint = match public_endpoint {
                    Some(url) => url.clone(),
                    None => format!("http://localhost:{}/assets/", config.server.address.port())
                        .parse()
                        .map_err(StoreError::Url)?,
                };

                Ok(Self::new(Arc::new(inner), public_endpoint, false))
            }
            crate::config::Store::ObjectStorage(ObjectStorage {
                endpoint,
                bucket_name,
                use_path_style,
                region,
                access_key,
                secret_key,
                session_token,
                public_endpoint,
            }) => {
                let mut builder = AmazonS3Builder::new()
                    .with_bucket_name(bucket_name)
                    .with_region(region)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_virtual_hosted_style_request(!use_path_style);

                if let Some(endpoint) = endpoint {
                    builder = builder
                        .with_endpoint(endpoint.as_str())
                        .with_allow_http(endpoint.scheme() == "http");
                }

                if let Some(token) = session_token {
                    builder = builder.with_token(token);
                }

                let public_endpoint = match public_endpoint {
                    Some(url) => url.clone(),
                    None => default_public_endpoint(endpoint.as_ref(), bucket_name, region)?,
                };

                Ok(Self::new(Arc::new(builder.build()?), public_endpoint, true))
            }
        }
    }

    /// Upload the file at `path` under `key`
    #[tracing::instrument(skip(self, key, path), fields(key = %key))]
    pub(crate) async fn publish(
        &self,
        key: &StorageKey,
        content_type: &mime::Mime,
        path: &Path,
    ) -> Result<(), StoreError> {
        let mut opts = PutMultipartOpts::default();

        if self.supports_attributes {
            opts.attributes
                .insert(Attribute::ContentType, content_type.to_string().into());
        }

        let mut file = crate::file::File::open(path)
            .await
            .map_err(StoreError::ReadFile)?;

        let upload = self.inner.put_multipart_opts(&key.to_path(), opts).await?;
        let mut writer = WriteMultipart::new(upload);

        let mut buf = vec![0u8; CHUNK_SIZE];

        loop {
            let n = match file.read_chunk(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    if let Err(abort) = writer.abort().await {
                        tracing::warn!("Failed to abort upload: {abort}");
                    }
                    return Err(StoreError::ReadFile(e));
                }
            };

            if n == 0 {
                break;
            }

            if let Err(e) = writer.wait_for_capacity(MAX_UPLOAD_CONCURRENCY).await {
                if let Err(abort) = writer.abort().await {
                    tracing::warn!("Failed to abort upload: {abort}");
                }
                return Err(e.into());
            }

            writer.write(&buf[..n]);
        }

        writer.finish().await?;

        Ok(())
    }

    /// Open a stored object for streaming
    #[tracing::instrument(skip(self))]
    pub(crate) async fn open(&self, key: &str) -> Result<StoredObject, StoreError> {
        let location = ObjectPath::parse(key).map_err(StoreError::InvalidKey)?;

        let result = self.inner.get(&location).await?;

        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|value| value.to_string());
        let size = result.meta.size;

        let stream = result.into_stream().map(|res| res.map_err(StoreError::from));

        Ok(StoredObject {
            content_type,
            size,
            stream: Box::pin(stream),
        })
    }

    pub(crate) fn public_url(&self, key: &StorageKey) -> Result<Url, StoreError> {
        self.public_endpoint
            .join(&key.to_string())
            .map_err(StoreError::Url)
    }

    pub(crate) async fn health_check(&self) -> Result<(), StoreError> {
        let mut listing = self.inner.list(None);

        if let Some(res) = listing.next().await {
            res?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn inner(&self) -> &Arc<dyn ObjectStore> {
        &self.inner
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    url
}

fn default_public_endpoint(
    endpoint: Option<&Url>,
    bucket_name: &str,
    region: &str,
) -> Result<Url, StoreError> {
    match endpoint {
        Some(endpoint) => with_trailing_slash(endpoint.clone())
            .join(&format!("{bucket_name}/"))
            .map_err(StoreError::Url),
        None => format!("https://{bucket_name}.s3.{region}.amazonaws.com/")
            .parse()
            .map_err(StoreError::Url),
    }
}
