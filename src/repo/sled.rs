use std::{
    path::Path,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use sled::{CompareAndSwapError, Db, IVec, Tree};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    error_code::ErrorCode,
    repo::{NewVideo, RepoError, Video, VideoId, VideoRepo},
};

macro_rules! b {
    ($self:ident.$ident:ident, $expr:expr) => {{
        let $ident = $self.$ident.clone();

        let span = tracing::Span::current();

        tokio::task::spawn_blocking(move || span.in_scope(|| $expr))
            .await
            .map_err(SledError::from)
            .map_err(RepoError::from)?
            .map_err(SledError::from)
            .map_err(RepoError::from)?
    }};
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum SledError {
    #[error("Error in database")]
    Sled(#[from] sled::Error),

    #[error("Invalid video record")]
    Video(#[from] serde_json::Error),

    #[error("Operation panicked")]
    Panic,
}

impl SledError {
    pub(super) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Sled(_) => ErrorCode::SLED_ERROR,
            Self::Video(_) => ErrorCode::VIDEO_RECORD_ERROR,
            Self::Panic => ErrorCode::PANIC,
        }
    }
}

impl From<tokio::task::JoinError> for SledError {
    fn from(_: tokio::task::JoinError) -> Self {
        SledError::Panic
    }
}

#[derive(Clone)]
pub(crate) struct SledRepo {
    healthz_count: Arc<AtomicU64>,
    healthz: Tree,
    videos: Tree,
    _db: Db,
}

impl std::fmt::Debug for SledRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledRepo").finish()
    }
}

impl SledRepo {
    #[tracing::instrument]
    pub(crate) fn build(path: &Path, cache_capacity: u64) -> Result<Self, SledError> {
        let db = sled::Config::new()
            .path(path.join("v0.1.0"))
            .cache_capacity(cache_capacity)
            .open()?;

        Self::new(db)
    }

    pub(crate) fn new(db: Db) -> Result<Self, SledError> {
        Ok(SledRepo {
            healthz_count: Arc::new(AtomicU64::new(0)),
            healthz: db.open_tree("reelhouse-healthz-tree")?,
            videos: db.open_tree("reelhouse-videos-tree")?,
            _db: db,
        })
    }
}

#[async_trait::async_trait(?Send)]
impl VideoRepo for SledRepo {
    #[tracing::instrument(level = "trace", skip(self))]
    async fn health_check(&self) -> Result<(), RepoError> {
        let next = self.healthz_count.fetch_add(1, Ordering::Relaxed);

        b!(self.healthz, {
            healthz.insert("healthz", &next.to_be_bytes()[..])
        });

        self.healthz.flush_async().await.map_err(SledError::from)?;

        b!(self.healthz, healthz.get("healthz"));

        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn video(&self, id: VideoId) -> Result<Option<Video>, RepoError> {
        let key = *id.as_bytes();

        let opt = b!(self.videos, videos.get(key));

        let Some(ivec) = opt else {
            return Ok(None);
        };

        let video = serde_json::from_slice(&ivec).map_err(SledError::from)?;

        Ok(Some(video))
    }

    #[tracing::instrument(level = "debug", skip(self, new))]
    async fn create_video(&self, user_id: Uuid, new: NewVideo) -> Result<Video, RepoError> {
        let now = OffsetDateTime::now_utc();

        let video = Video {
            id: VideoId::generate(),
            user_id,
            title: new.title,
            description: new.description,
            video_url: None,
            created_at: now,
            updated_at: now,
        };

        let key = *video.id.as_bytes();
        let value = serde_json::to_vec(&video).map_err(SledError::from)?;

        b!(self.videos, videos.insert(key, value));

        Ok(video)
    }

    #[tracing::instrument(level = "debug", skip(self, video), fields(id = %video.id))]
    async fn update_video(&self, video: &Video) -> Result<(), RepoError> {
        let key = *video.id.as_bytes();
        let value = IVec::from(serde_json::to_vec(video).map_err(SledError::from)?);

        let updated = b!(self.videos, {
            let mut current = videos.get(key)?;

            loop {
                let Some(old) = current else {
                    break Ok::<_, SledError>(false);
                };

                match videos.compare_and_swap(key, Some(old), Some(value.clone()))? {
                    Ok(()) => break Ok(true),
                    Err(CompareAndSwapError { current: actual, .. }) => current = actual,
                }
            }
        });

        if updated {
            Ok(())
        } else {
            Err(RepoError::VanishedVideo)
        }
    }
}
