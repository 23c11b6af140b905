#[cfg(test)]
mod tests;

use std::path::Path;

use crate::{
    ffmpeg::FfMpegError,
    process::{Process, Tool},
};

/// Dimensions of the first stream ffprobe reports for a file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MediaGeometry {
    pub(crate) width: u32,
    pub(crate) height: u32,
}

#[derive(Debug, serde::Deserialize)]
struct FfProbeOutput {
    #[serde(default)]
    streams: Vec<FfProbeStream>,
}

#[derive(Debug, serde::Deserialize)]
struct FfProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Run ffprobe against `input` and read the geometry of its first stream
///
/// The first stream is used whatever its type. Containers that list audio before video will
/// fail with [`FfMpegError::MissingDimensions`].
#[tracing::instrument(skip(ffprobe))]
pub(crate) async fn probe(
    ffprobe: &Tool,
    input: &Path,
    timeout: u64,
) -> Result<MediaGeometry, FfMpegError> {
    let input_str = input.to_str().ok_or(FfMpegError::Path)?;

    let process = Process::run(
        ffprobe,
        &[
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            input_str,
        ],
        timeout,
    )
    .map_err(FfMpegError::Process)?;

    let output = process.output().await.map_err(FfMpegError::Process)?;

    let output: FfProbeOutput = serde_json::from_slice(&output).map_err(FfMpegError::Json)?;

    parse_geometry(output)
}

fn parse_geometry(output: FfProbeOutput) -> Result<MediaGeometry, FfMpegError> {
    let Some(FfProbeStream { width, height }) = output.streams.into_iter().next() else {
        return Err(FfMpegError::NoStreams);
    };

    match (width, height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            tracing::debug!("Probed {width}x{height}");
            Ok(MediaGeometry { width, height })
        }
        _ => Err(FfMpegError::MissingDimensions),
    }
}
