pub(crate) mod sled;

use std::{fmt::Debug, str::FromStr, sync::Arc};

use time::OffsetDateTime;
use url::Url;
use uuid::Uuid;

use crate::{config, error_code::ErrorCode};

pub(crate) type ArcRepo = Arc<dyn VideoRepo>;

#[derive(Debug, thiserror::Error)]
pub(crate) enum RepoError {
    #[error("Error in sled")]
    SledError(#[from] crate::repo::sled::SledError),

    #[error("Video record disappeared during update")]
    VanishedVideo,
}

impl RepoError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::SledError(e) => e.error_code(),
            Self::VanishedVideo => ErrorCode::VIDEO_RECORD_ERROR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub(crate) struct VideoId {
    id: Uuid,
}

impl VideoId {
    pub(crate) fn generate() -> Self {
        VideoId { id: Uuid::now_v7() }
    }

    pub(crate) fn as_bytes(&self) -> &[u8; 16] {
        self.id.as_bytes()
    }
}

impl FromStr for VideoId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(VideoId { id: s.parse()? })
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.id, f)
    }
}

/// A video record and, once an upload has been ingested, where its file lives
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub(crate) struct Video {
    pub(crate) id: VideoId,

    pub(crate) user_id: Uuid,

    pub(crate) title: String,

    pub(crate) description: String,

    pub(crate) video_url: Option<Url>,

    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,

    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

impl Video {
    pub(crate) fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }

    pub(crate) fn with_url(self, video_url: Url) -> Self {
        Video {
            video_url: Some(video_url),
            updated_at: OffsetDateTime::now_utc(),
            ..self
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub(crate) struct NewVideo {
    pub(crate) title: String,

    #[serde(default)]
    pub(crate) description: String,
}

#[async_trait::async_trait(?Send)]
pub(crate) trait VideoRepo: Debug + Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;

    async fn video(&self, id: VideoId) -> Result<Option<Video>, RepoError>;

    async fn create_video(&self, user_id: Uuid, new: NewVideo) -> Result<Video, RepoError>;

    /// Replace an existing record, failing if it no longer exists
    async fn update_video(&self, video: &Video) -> Result<(), RepoError>;
}

pub(crate) fn open(config: &config::Repo) -> Result<ArcRepo, RepoError> {
    match config {
        config::Repo::Sled(config::Sled {
            path,
            cache_capacity,
        }) => {
            let repo = self::sled::SledRepo::build(path, *cache_capacity)?;

            Ok(Arc::new(repo))
        }
    }
}
