//! External resolver: probes queued remote references concurrently.
//!
//! The validation core only produces the pending batch; this module is the
//! collaborator that resolves it. Worker threads pull URLs from a channel,
//! issue a HEAD request (falling back to GET when HEAD is rejected), and
//! classify the outcome. The core never sees this concurrency.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;

use crate::error::Error;

/// Request timeout per probe.
const TIMEOUT_SECS: u64 = 10;

/// Redirect chain limit before a probe counts as an error.
const MAX_REDIRECTS: usize = 5;

/// Outcome of probing one external URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transport-level failure: timeout, DNS, TLS, connection refused.
    Error(String),
    /// The URL answered with a success or redirect status.
    Reachable,
    /// The URL answered with a client or server error status.
    Unreachable(u16),
}

/// One probed URL and its outcome.
#[derive(Debug, Clone)]
pub struct ExternalResult {
    /// How the probe ended.
    pub outcome: Outcome,
    /// The URL that was probed.
    pub url: String,
}

/// Probe a batch of URLs with `jobs` worker threads. The batch should be
/// deduplicated by the caller; results come back in completion order.
///
/// # Errors
///
/// Returns `Error::HttpClient` if the HTTP client cannot be constructed.
pub fn resolve(urls: &[String], jobs: usize) -> Result<Vec<ExternalResult>, Error> {
    let client = Client::builder()
        .timeout(Duration::from_secs(TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(concat!("hrefcheck/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::HttpClient {
            reason: e.to_string(),
        })?;

    let (work_tx, work_rx) = crossbeam_channel::unbounded::<String>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<ExternalResult>();

    for url in urls {
        // Receiver outlives all senders here; send cannot fail.
        let _ = work_tx.send(url.clone());
    }
    drop(work_tx);

    std::thread::scope(|scope| {
        for _ in 0..jobs.max(1) {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let client = client.clone();
            scope.spawn(move || {
                while let Ok(url) = work_rx.recv() {
                    let outcome = probe(&client, &url);
                    let _ = result_tx.send(ExternalResult { outcome, url });
                }
            });
        }
    });
    drop(result_tx);

    Ok(result_rx.iter().collect())
}

/// Probe one URL. HEAD first; some servers reject HEAD outright, so a
/// non-2xx/3xx answer is retried once as GET before being classified.
fn probe(client: &Client, url: &str) -> Outcome {
    let head = match client.head(url).send() {
        Ok(response) => response,
        Err(e) => return categorize_error(&e),
    };

    let status = head.status();
    if status.is_success() || status.is_redirection() {
        return Outcome::Reachable;
    }

    match client.get(url).send() {
        Ok(response) => classify_status(response.status()),
        Err(e) => categorize_error(&e),
    }
}

/// Map a final response status to an outcome.
fn classify_status(status: StatusCode) -> Outcome {
    if status.is_success() || status.is_redirection() {
        Outcome::Reachable
    } else {
        Outcome::Unreachable(status.as_u16())
    }
}

/// Map a transport error to a short description for the diagnostic.
fn categorize_error(error: &reqwest::Error) -> Outcome {
    let description = if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    };
    Outcome::Error(description)
}
