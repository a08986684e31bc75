//! Segment retrieval into a single merged container.

use crate::manifest::Segment;
use futures::StreamExt;
use hlsforged_common::{Error, Result};
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Totals for one completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub segments: usize,
    pub bytes: u64,
}

/// Downloads segments in order and appends them to one file.
#[derive(Clone)]
pub struct SegmentFetcher {
    client: reqwest::Client,
}

impl SegmentFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch every segment into `dest`, which must not exist yet.
    ///
    /// `on_progress` receives `floor(100 * done / total)` after each
    /// segment. With no segments it is never called and `dest` is left
    /// empty.
    ///
    /// Any non-success status or transport error aborts the whole fetch;
    /// the partially written file is left for the caller to remove.
    pub async fn fetch_all<F>(
        &self,
        segments: &[Segment],
        dest: &Path,
        mut on_progress: F,
    ) -> Result<FetchSummary>
    where
        F: FnMut(u8) + Send,
    {
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .await?;
        let mut writer = BufWriter::new(file);

        let total = segments.len();
        let mut bytes = 0u64;

        for (done, segment) in segments.iter().enumerate() {
            bytes += self.append_segment(segment, &mut writer).await?;

            let pct = ((done + 1) * 100 / total) as u8;
            on_progress(pct);
            tracing::trace!(
                segment = segment.index,
                total,
                "Fetched segment {}",
                segment.url
            );
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;

        Ok(FetchSummary {
            segments: total,
            bytes,
        })
    }

    async fn append_segment<W>(&self, segment: &Segment, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let url = segment.url.as_str();

        let response = self
            .client
            .get(segment.url.clone())
            .send()
            .await
            .map_err(|e| Error::fetch_failed(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch_failed(url, format!("HTTP {status}")));
        }

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::fetch_failed(url, e))?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        Ok(written)
    }
}
