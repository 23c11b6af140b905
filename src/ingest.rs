
use actix_web::web::Bytes;
use futures_core::Stream;
use url::Url;

use crate::{
    aspect::{AspectRatio, Orientation},
    error::{Error, UploadError},
    file::File,
    formats::VideoFormat,
    future::Timed,
    media::MediaTools,
    store::{StorageKey, Store},
    tmp_file::{TmpDir, TmpFolder},
};

/// How far an upload got before it finished or failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Stage {
    Receiving,
    Buffered,
    Probed,
    Classified,
    Rewritten,
    Published,
}

impl Stage {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Receiving => "receiving",
            Self::Buffered => "buffered",
            Self::Probed => "probed",
            Self::Classified => "classified",
            Self::Rewritten => "rewritten",
            Self::Published => "published",
        }
    }
}

#[derive(Debug)]
pub(crate) struct Ingested {
    pub(crate) key: StorageKey,
    pub(crate) url: Url,
    pub(crate) aspect_ratio: AspectRatio,
}

/// Buffer, probe, classify, rewrite and publish one uploaded video
///
/// Every file written along the way lives in a folder owned by this call, and that folder is
/// removed before returning whether or not ingestion succeeded.
#[tracing::instrument(name = "Ingest", skip(tmp_dir, tools, store, stream))]
pub(crate) async fn ingest<S>(
    tmp_dir: &TmpDir,
    tools: &dyn MediaTools,
    store: &Store,
    stream: S,
    content_type: &mime::Mime,
) -> Result<Ingested, Error>
where
    S: Stream<Item = Result<Bytes, Error>>,
{
    let format = VideoFormat::from_media_type(content_type)
        .ok_or_else(|| UploadError::UnsupportedContentType(content_type.to_string()))?;

    let folder = tmp_dir.tmp_folder().await?;

    let mut stage = Stage::Receiving;

    let res = process(&folder, tools, store, stream, format, &mut stage)
        .timed("reelhouse.ingest.duration")
        .await;

    let cleanup = folder.cleanup().await;

    match res {
        Ok(ingested) => {
            if let Err(e) = cleanup {
                tracing::warn!("Failed to remove temporary folder: {e}");
            }

            metrics::counter!(
                "reelhouse.ingest",
                "stage" => stage.as_str(),
                "orientation" => ingested.key.orientation().as_str(),
            )
            .increment(1);

            tracing::info!(key = %ingested.key, aspect_ratio = %ingested.aspect_ratio, "Ingested");

            Ok(ingested)
        }
        Err(e) => {
            if let Err(cleanup) = cleanup {
                tracing::warn!("Failed to remove temporary folder after failure: {cleanup}");
            }

            metrics::counter!("reelhouse.ingest", "stage" => stage.as_str()).increment(1);

            tracing::warn!(
                stage = stage.as_str(),
                code = e.error_code().as_str(),
                "Ingest failed: {e:?}"
            );

            Err(e)
        }
    }
}

async fn process<S>(
    folder: &TmpFolder,
    tools: &dyn MediaTools,
    store: &Store,
    stream: S,
    format: VideoFormat,
    stage: &mut Stage,
) -> Result<Ingested, Error>
where
    S: Stream<Item = Result<Bytes, Error>>,
{
    let input = folder.tmp_file(Some(format.file_extension()));

    let mut file = File::create(&input).await?;
    let written = file.write_from_stream(stream).await?;
    file.close().await?;

    if written == 0 {
        return Err(UploadError::EmptyUpload.into());
    }

    tracing::debug!("Buffered {written} bytes");
    *stage = Stage::Buffered;

    let geometry = tools.probe(&input).await?;
    *stage = Stage::Probed;

    let aspect_ratio = crate::aspect::classify(geometry.width, geometry.height);
    let orientation = Orientation::from_label(&aspect_ratio.to_string());
    let key = StorageKey::generate(orientation, format);

    tracing::debug!(
        width = geometry.width,
        height = geometry.height,
        %aspect_ratio,
        "Classified"
    );
    *stage = Stage::Classified;

    let processed = tools.faststart(&input, format).await?;
    *stage = Stage::Rewritten;

    store
        .publish(&key, &format.media_type(), &processed)
        .timed("reelhouse.store.publish.duration")
        .await?;
    *stage = Stage::Published;

    for copy in [input, processed] {
        if let Err(e) = copy.cleanup().await {
            tracing::warn!("Failed to remove temporary file: {e}");
        }
    }

    let url = store.public_url(&key)?;

    Ok(Ingested {
        key,
        url,
        aspect_ratio,
    })
}
