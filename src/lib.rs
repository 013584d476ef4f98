pub mod config;
pub mod downloader;
pub mod error;
pub mod search;

pub use config::Config;
pub use downloader::{
    DownloadOutcome, Downloader, HttpFetcher, Response, Summary, UReqFetcher, DEFAULT_CONCURRENCY,
};
pub use error::{DownloadError, Error, ResolveError, Result};
pub use search::{ImageReference, Resolver, SearchRequest};

/// Runs one search and download cycle over the network.
pub async fn run(config: &Config) -> Result<Summary> {
    let fetcher = UReqFetcher::new(config.connect_timeout, config.read_timeout);

    run_with_fetcher(config, fetcher).await
}

/// Same as [`run`], over the given transport.
pub async fn run_with_fetcher<T>(config: &Config, fetcher: T) -> Result<Summary>
where
    T: HttpFetcher + Clone + 'static,
{
    let request = config.search_request()?;

    let resolver =
        Resolver::with_fetcher(config.api_key.as_str(), &config.endpoint, fetcher.clone())?;
    let search = request.clone();
    let references = tokio::task::spawn_blocking(move || resolver.resolve(&search)).await??;

    if references.is_empty() {
        tracing::info!(query = request.query(), "Nothing to download");
        return Ok(Summary::default());
    }

    let downloader =
        Downloader::with_fetcher(&config.output_dir, fetcher).concurrency(config.concurrency);
    let outcomes = downloader.fetch_all(&references).await;
    let summary = Summary::from_outcomes(&outcomes);

    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        path = %config.output_dir.display(),
        "Downloads finished: {summary}"
    );

    Ok(summary)
}
