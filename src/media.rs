use std::{path::Path, sync::Arc};

use tokio::sync::Semaphore;

use crate::{
    config::Media,
    discover::MediaGeometry,
    ffmpeg::FfMpegError,
    formats::VideoFormat,
    process::Tool,
    tmp_file::TmpFile,
};

pub(crate) type ArcMediaTools = Arc<dyn MediaTools>;

/// The external tooling the ingest pipeline depends on
#[async_trait::async_trait(?Send)]
pub(crate) trait MediaTools: std::fmt::Debug + Send + Sync {
    async fn probe(&self, input: &Path) -> Result<MediaGeometry, FfMpegError>;

    async fn faststart(
        &self,
        input: &TmpFile,
        format: VideoFormat,
    ) -> Result<TmpFile, FfMpegError>;
}

/// ffprobe and ffmpeg run as child processes, at most `concurrency` at a time
#[derive(Debug)]
pub(crate) struct Toolchain {
    ffprobe: Tool,
    ffmpeg: Tool,
    timeout: u64,
    permits: Semaphore,
}

impl Toolchain {
    pub(crate) fn new(ffprobe: Tool, ffmpeg: Tool, timeout: u64, concurrency: usize) -> Self {
        Toolchain {
            ffprobe,
            ffmpeg,
            timeout,
            permits: Semaphore::new(concurrency.max(1)),
        }
    }

    pub(crate) fn from_config(media: &Media) -> Self {
        Self::new(
            Tool::new(media.ffprobe_path.clone()),
            Tool::new(media.ffmpeg_path.clone()),
            media.process_timeout,
            media.process_concurrency,
        )
    }
}

#[async_trait::async_trait(?Send)]
impl MediaTools for Toolchain {
    async fn probe(&self, input: &Path) -> Result<MediaGeometry, FfMpegError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FfMpegError::Semaphore)?;

        crate::discover::probe(&self.ffprobe, input, self.timeout).await
    }

    async fn faststart(
        &self,
        input: &TmpFile,
        format: VideoFormat,
    ) -> Result<TmpFile, FfMpegError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FfMpegError::Semaphore)?;

        crate::ffmpeg::faststart(&self.ffmpeg, input, format, self.timeout).await
    }
}
