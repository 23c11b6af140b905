
use crate::{
    error_code::ErrorCode,
    formats::VideoFormat,
    process::{Process, ProcessError, Tool},
    tmp_file::TmpFile,
};

const PROCESSING_SUFFIX: &str = ".processing";

#[derive(Debug, thiserror::Error)]
pub(crate) enum FfMpegError {
    #[error("Error in ffmpeg process")]
    Process(#[source] ProcessError),

    #[error("Invalid output format")]
    Json(#[source] serde_json::Error),

    #[error("First stream has no dimensions")]
    MissingDimensions,

    #[error("No streams in uploaded media")]
    NoStreams,

    #[error("Processed file is missing")]
    MissingOutput(#[source] std::io::Error),

    #[error("Processed file is empty")]
    EmptyOutput,

    #[error("Process limiter is closed")]
    Semaphore,

    #[error("Invalid file path")]
    Path,
}

impl FfMpegError {
    pub(crate) const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Process(e) => e.error_code(),
            Self::Json(_) | Self::MissingDimensions => ErrorCode::PROBE_OUTPUT_INVALID,
            Self::NoStreams => ErrorCode::NO_STREAMS,
            Self::MissingOutput(_) | Self::EmptyOutput => ErrorCode::PROCESSING_VERIFICATION,
            Self::Semaphore => ErrorCode::PROCESS_SEMAPHORE_CLOSED,
            Self::Path => ErrorCode::FILE_IO_ERROR,
        }
    }
}

/// Remux `input` so its index sits at the start of the file
///
/// Streams are copied untouched into `<input>.processing`. A zero exit status isn't trusted on
/// its own: the output must exist and be non-empty. The output is removed again if anything
/// fails.
#[tracing::instrument(skip(ffmpeg, input), fields(input = %input.display()))]
pub(crate) async fn faststart(
    ffmpeg: &Tool,
    input: &TmpFile,
    format: VideoFormat,
    timeout: u64,
) -> Result<TmpFile, FfMpegError> {
    let output = input.with_suffix(PROCESSING_SUFFIX);

    let input_str = input.to_str().ok_or(FfMpegError::Path)?;
    let output_str = output.to_str().ok_or(FfMpegError::Path)?;

    let process = Process::run(
        ffmpeg,
        &[
            "-v",
            "error",
            "-y",
            "-i",
            input_str,
            "-c",
            "copy",
            "-movflags",
            "faststart",
            "-f",
            format.ffmpeg_format(),
            output_str,
        ],
        timeout,
    )
    .map_err(FfMpegError::Process)?;

    process.wait().await.map_err(FfMpegError::Process)?;

    let metadata = tokio::fs::metadata(&*output)
        .await
        .map_err(FfMpegError::MissingOutput)?;

    if metadata.len() == 0 {
        return Err(FfMpegError::EmptyOutput);
    }

    tracing::debug!("Rewrote {} bytes for fast start", metadata.len());

    Ok(output)
}
