use std::path::Path;

use actix_web::web::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub(crate) struct File {
    inner: tokio::fs::File,
}

impl File {
    pub(crate) async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(File {
            inner: tokio::fs::File::open(path).await?,
        })
    }

    pub(crate) async fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(File {
            inner: tokio::fs::File::create(path).await?,
        })
    }

    /// Copy every chunk of `stream` into the file, returning the number of bytes written
    pub(crate) async fn write_from_stream<S, E>(&mut self, stream: S) -> Result<u64, E>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: From<std::io::Error>,
    {
        futures_util::pin_mut!(stream);

        let mut written = 0;

        while let Some(res) = stream.next().await {
            let mut bytes = res?;
            written += bytes.len() as u64;

            self.inner.write_all_buf(&mut bytes).await?;
        }

        Ok(written)
    }

    /// Read up to `buf.len()` bytes, returning 0 at end of file
    pub(crate) async fn read_chunk(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf).await
    }

    /// Flush pending writes so external processes observe the complete file
    pub(crate) async fn close(mut self) -> std::io::Result<()> {
        self.inner.flush().await?;
        self.inner.sync_all().await?;
        Ok(())
    }
}
