//! Manifest resolution: HLS playlist URL to an ordered list of segment URLs.

use async_trait::async_trait;
use hlsforged_common::{Error, Result};
use m3u8_rs::{parse_playlist_res, Playlist};
use url::Url;

/// One media segment, in playlist order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub url: Url,
}

/// Turns a manifest reference into the segments it lists.
#[async_trait]
pub trait ManifestResolver: Send + Sync {
    async fn resolve(&self, manifest_url: &str) -> Result<Vec<Segment>>;
}

/// Check that a submitted manifest reference is an absolute http(s) URL.
pub fn validate_manifest_reference(reference: &str) -> Result<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("manifest_reference is required"));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| Error::validation(format!("manifest_reference is not a valid URL: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::validation(format!(
            "manifest_reference must use http or https, got {other}"
        ))),
    }
}

/// Outcome of parsing one playlist document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPlaylist {
    Media(Vec<Segment>),
    /// A master playlist; the URL is its highest-bandwidth variant.
    Master(Url),
}

/// Parse a playlist body, resolving every URI against `base`.
pub fn parse_playlist(base: &Url, body: &[u8]) -> Result<ParsedPlaylist> {
    match parse_playlist_res(body) {
        Ok(Playlist::MediaPlaylist(pl)) => {
            let segments = pl
                .segments
                .iter()
                .enumerate()
                .map(|(index, seg)| {
                    base.join(&seg.uri)
                        .map(|url| Segment { index, url })
                        .map_err(|e| {
                            Error::manifest(format!("invalid segment URI {:?}: {e}", seg.uri))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(ParsedPlaylist::Media(segments))
        }
        Ok(Playlist::MasterPlaylist(pl)) => {
            let variant = pl
                .variants
                .iter()
                .filter(|v| !v.is_i_frame)
                .max_by_key(|v| v.bandwidth)
                .ok_or_else(|| Error::manifest("master playlist has no variants"))?;
            let url = base.join(&variant.uri).map_err(|e| {
                Error::manifest(format!("invalid variant URI {:?}: {e}", variant.uri))
            })?;
            Ok(ParsedPlaylist::Master(url))
        }
        Err(_) => Err(Error::manifest(format!("unparseable playlist at {base}"))),
    }
}

/// Fetches playlists over HTTP.
#[derive(Clone)]
pub struct HttpManifestResolver {
    client: reqwest::Client,
}

impl HttpManifestResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::manifest(format!("failed to fetch {url}: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::manifest(format!(
                "failed to fetch {url}: HTTP {}",
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::manifest(format!("failed to read {url}: {e}")))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl ManifestResolver for HttpManifestResolver {
    async fn resolve(&self, manifest_url: &str) -> Result<Vec<Segment>> {
        let url = Url::parse(manifest_url)
            .map_err(|e| Error::validation(format!("invalid manifest URL {manifest_url:?}: {e}")))?;

        let body = self.fetch(&url).await?;
        match parse_playlist(&url, &body)? {
            ParsedPlaylist::Media(segments) => Ok(segments),
            ParsedPlaylist::Master(variant_url) => {
                tracing::debug!("Following master playlist to variant {}", variant_url);
                let body = self.fetch(&variant_url).await?;
                match parse_playlist(&variant_url, &body)? {
                    ParsedPlaylist::Media(segments) => Ok(segments),
                    ParsedPlaylist::Master(_) => Err(Error::manifest(
                        "variant playlist is itself a master playlist",
                    )),
                }
            }
        }
    }
}
