mod fetcher;

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use image::ImageFormat;
use itertools::Itertools;
use url::Url;

use crate::error::DownloadError;
use crate::search::ImageReference;

pub use fetcher::UReqFetcher;

#[cfg(test)]
pub(crate) use fetcher::MockFetcher;

pub const DEFAULT_CONCURRENCY: usize = 8;

/// What the transport saw for a single GET.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok(Vec<u8>),
    Status(u16),
    InvalidBody,
    NetworkError(String),
}

impl Response {
    pub fn ok(body: Vec<u8>) -> Self {
        Self::Ok(body)
    }

    pub fn status(code: u16) -> Self {
        Self::Status(code)
    }

    pub fn invalid_body() -> Self {
        Self::InvalidBody
    }

    pub fn network_error(message: impl Into<String>) -> Self {
        Self::NetworkError(message.into())
    }
}

/// Blocking HTTP GET transport shared by the resolver and every download task.
pub trait HttpFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Response;
}

impl<T: HttpFetcher + ?Sized> HttpFetcher for Arc<T> {
    fn fetch(&self, url: &str) -> Response {
        (**self).fetch(url)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Success {
        position: usize,
        url: String,
        file: PathBuf,
        bytes: usize,
    },
    Failure {
        position: usize,
        url: String,
        file_name: String,
        reason: DownloadError,
    },
}

impl DownloadOutcome {
    /// 0-based index of the reference this outcome belongs to.
    pub fn position(&self) -> usize {
        match self {
            Self::Success { position, .. } | Self::Failure { position, .. } => *position,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub failed: usize,
}

impl Summary {
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|outcome| outcome.is_success()).count();

        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} downloaded, {} failed",
            self.succeeded,
            self.total(),
            self.failed
        )
    }
}

/// Downloads resolved references into `path`, one file per position.
#[derive(Clone)]
pub struct Downloader<T: HttpFetcher> {
    fetcher: T,
    path: PathBuf,
    concurrency: usize,
}

impl<T> Downloader<T>
where
    T: HttpFetcher + Clone + 'static,
{
    pub fn with_fetcher(path: impl Into<PathBuf>, fetcher: T) -> Self {
        Downloader {
            fetcher,
            path: path.into(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Caps the number of downloads in flight. Values below 1 are treated as 1.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn file_name(position: usize) -> String {
        format!("imagen_{}.jpg", position + 1)
    }

    /// Downloads every reference and returns one outcome per reference,
    /// ordered by position. Resolves only once all downloads have finished.
    pub async fn fetch_all(&self, references: &[ImageReference]) -> Vec<DownloadOutcome> {
        if references.is_empty() {
            tracing::debug!("no references, skipping download");
            return Vec::new();
        }

        if let Err(error) = tokio::fs::create_dir_all(&self.path).await {
            tracing::error!(path = %self.path.display(), error = %error, "Failed to create output directory");

            let reason = DownloadError::from(error);

            return references
                .iter()
                .enumerate()
                .map(|(position, reference)| DownloadOutcome::Failure {
                    position,
                    url: reference.as_str().to_string(),
                    file_name: Self::file_name(position),
                    reason: reason.clone(),
                })
                .collect_vec();
        }

        tracing::info!(
            count = references.len(),
            concurrency = self.concurrency,
            path = %self.path.display(),
            "Starting downloads"
        );

        // ureq blocks, so each download runs on the blocking pool; the
        // buffer bounds how many of those are in flight.
        let outcomes: Vec<DownloadOutcome> = stream::iter(references.iter().cloned().enumerate())
            .map(|(position, reference)| {
                let downloader = self.clone();

                async move {
                    let url = reference.as_str().to_string();

                    tokio::task::spawn_blocking(move || downloader.download_one(position, &reference))
                        .await
                        .unwrap_or_else(|error| {
                            tracing::error!(position, url = %url, error = %error, "Download task panicked");

                            DownloadOutcome::Failure {
                                position,
                                url,
                                file_name: Self::file_name(position),
                                reason: DownloadError::Task(error.to_string()),
                            }
                        })
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        outcomes
            .into_iter()
            .sorted_by_key(DownloadOutcome::position)
            .collect_vec()
    }

    /// Blocking download of a single reference to its positional file name.
    pub fn download_one(&self, position: usize, reference: &ImageReference) -> DownloadOutcome {
        let file_name = Self::file_name(position);
        let url = reference.as_str();

        match self.save(url, &file_name) {
            Ok((file, bytes)) => {
                tracing::info!(position, file = %file.display(), bytes, "Download completed");

                DownloadOutcome::Success {
                    position,
                    url: url.to_string(),
                    file,
                    bytes,
                }
            }
            Err(reason) => {
                tracing::warn!(position, url, file = %file_name, error = %reason, "Download failed");

                DownloadOutcome::Failure {
                    position,
                    url: url.to_string(),
                    file_name,
                    reason,
                }
            }
        }
    }

    fn save(&self, url: &str, file_name: &str) -> Result<(PathBuf, usize), DownloadError> {
        let url = Url::parse(url).map_err(|_| DownloadError::InvalidUrl)?;

        let body = match self.fetcher.fetch(url.as_str()) {
            Response::Ok(body) => body,
            Response::Status(code) => return Err(DownloadError::Status(code)),
            Response::InvalidBody => return Err(DownloadError::InvalidBody),
            Response::NetworkError(message) => return Err(DownloadError::Network(message)),
        };

        match image::guess_format(&body) {
            Ok(ImageFormat::Jpeg) => {}
            Ok(format) => {
                tracing::debug!(file = file_name, ?format, "Content is not JPEG, keeping .jpg name")
            }
            Err(_) => tracing::debug!(file = file_name, "Content is not a recognized image format"),
        }

        let file_path = self.path.join(file_name);

        fs::write(&file_path, &body)?;

        Ok((file_path, body.len()))
    }
}
