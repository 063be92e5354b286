// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! One-shot weather dataset loading.
//!
//! The dataset is fetched once, from a local file or an http(s) URL, on a
//! tokio runtime in a background thread. The finished overlay layer (or the
//! error) is handed back to the UI over a channel.

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use log::{error, info, warn};
use thiserror::Error;
use weather_cluster::{ClusterConfig, ClusterLayer, Dataset, DatasetError, FeatureFactory, RecordPolicy};

/// Errors that can occur while loading the dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP error: {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to start loader runtime: {0}")]
    Runtime(std::io::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

impl LoadError {
    /// Whether another fetch attempt could succeed.
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Http(_) | Self::Status(_))
    }
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    File(PathBuf),
    Url(String),
}

impl DatasetSource {
    /// Interpret a config/CLI value: http(s) URLs are fetched, anything
    /// else is a file path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            Self::Url(value.to_string())
        } else {
            Self::File(PathBuf::from(value))
        }
    }

    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        match self {
            Self::File(path) => tokio::fs::read(path).await.map_err(|source| LoadError::Io {
                path: path.clone(),
                source,
            }),
            Self::Url(url) => {
                let response = reqwest::get(url).await?;
                if !response.status().is_success() {
                    return Err(LoadError::Status(response.status()));
                }
                Ok(response.bytes().await?.to_vec())
            }
        }
    }
}

impl std::fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Options for a dataset load.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    /// Extra attempts after a failed fetch.
    pub retries: u32,
    /// Delay before the first retry; doubled on every further retry.
    pub backoff: Duration,
    pub policy: RecordPolicy,
    pub cluster: ClusterConfig,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            retries: 0,
            backoff: Duration::from_millis(500),
            policy: RecordPolicy::default(),
            cluster: ClusterConfig::default(),
        }
    }
}

/// Fetch the dataset and build the cluster layer.
///
/// Fetch failures are retried up to `options.retries` times with exponential
/// backoff. Decoding and validation failures are not retried.
pub async fn load_layer(source: &DatasetSource, options: LoadOptions) -> Result<ClusterLayer, LoadError> {
    let mut attempt = 0;
    let bytes = loop {
        match source.fetch().await {
            Ok(bytes) => break bytes,
            Err(e) if e.is_retryable() && attempt < options.retries => {
                let delay = options.backoff.saturating_mul(2_u32.saturating_pow(attempt));
                attempt += 1;
                warn!(
                    "Dataset fetch from {} failed ({}), retry {} of {} in {:?}",
                    source, e, attempt, options.retries, delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    };

    let dataset = Dataset::from_slice(&bytes)?;
    let layer = ClusterLayer::from_dataset(&dataset, FeatureFactory::new(options.policy), options.cluster)?;
    Ok(layer)
}

/// Start the one-shot load on a background thread.
///
/// Exactly one result is sent on the returned channel; `on_done` runs right
/// after it is sent so the UI can repaint.
pub fn spawn_load<F>(
    source: DatasetSource,
    options: LoadOptions,
    on_done: F,
) -> mpsc::Receiver<Result<ClusterLayer, LoadError>>
where
    F: FnOnce() + Send + 'static,
{
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        info!("Loading weather dataset from {}", source);
        let result = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt.block_on(load_layer(&source, options)),
            Err(e) => Err(LoadError::Runtime(e)),
        };

        match &result {
            Ok(layer) => info!("Weather dataset loaded: {} cities", layer.index().len()),
            Err(e) => error!("Weather dataset load failed: {}", e),
        }

        if tx.send(result).is_err() {
            warn!("Dataset loaded after the map window closed");
        }
        on_done();
    });

    rx
}
