use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Client, Request};
use tokio::time::Instant;
use tracing::debug;

use crate::config::EndpointSpec;
use crate::error::{HttpError, RequestError};
use crate::generator::{GeneratorRegistry, seeded_rng};
use crate::metrics::ResultRecord;
use crate::scheduler::RequestSender;

use super::client::build_client;
use super::target::{join_url, resolve_path, with_query};

/// Builds and sends one request per call, turning every outcome into a
/// [`ResultRecord`].
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
    registry: Arc<GeneratorRegistry>,
    timeout: Duration,
}

impl RequestExecutor {
    /// Creates an executor with its own client.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn new(registry: Arc<GeneratorRegistry>, timeout: Duration) -> Result<Self, HttpError> {
        Ok(Self {
            client: build_client(timeout)?,
            registry,
            timeout,
        })
    }

    /// Runs one attempt against `base_url`.
    ///
    /// Generation, URL and transport failures yield an error record with
    /// status 0. Any received response, whatever its status, is a plain
    /// response record. Elapsed time stops when the response head arrives;
    /// the body is drained afterwards so the connection can be reused.
    pub async fn execute(&self, base_url: &str, endpoint: &EndpointSpec) -> ResultRecord {
        let started = Instant::now();
        let mut url = join_url(base_url, &endpoint.path);

        let request = match self.build_request(base_url, endpoint, &mut url) {
            Ok(request) => request,
            Err(err) => return failure(url, endpoint, &err, started),
        };

        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status().as_u16();
                let elapsed = started.elapsed();
                if let Err(err) = drain_response_body(response).await {
                    debug!("Failed to drain response body: {}", err);
                }
                ResultRecord::response(url, endpoint.method.clone(), status, elapsed)
            }
            Err(err) => {
                let err = RequestError::from_transport(err, self.timeout);
                failure(url, endpoint, &err, started)
            }
        }
    }

    fn build_request(
        &self,
        base_url: &str,
        endpoint: &EndpointSpec,
        url: &mut String,
    ) -> Result<Request, RequestError> {
        let mut rng = seeded_rng().map_err(|err| RequestError::Random { source: err })?;

        let path = resolve_path(
            &endpoint.path,
            &endpoint.path_parameters,
            &self.registry,
            &mut rng,
        )?;
        *url = join_url(base_url, &path);

        let target = with_query(url.as_str(), &endpoint.query_parameters, &self.registry, &mut rng)?;
        *url = target.to_string();

        let body = match endpoint.body.as_ref() {
            Some(spec) => {
                let value = spec
                    .evaluate_with(&self.registry, &mut rng)
                    .map_err(|err| RequestError::Body { source: err })?;
                Some(
                    serde_json::to_vec(&value)
                        .map_err(|err| RequestError::BodyEncode { source: err })?,
                )
            }
            None => None,
        };

        let mut builder = self
            .client
            .request(endpoint.method.clone(), target)
            .headers(endpoint.headers.clone());
        if let Some(body) = body {
            if !endpoint.headers.contains_key(CONTENT_TYPE) {
                builder = builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            builder = builder.body(body);
        }
        builder.build().map_err(|err| RequestError::Build {
            source: err.without_url(),
        })
    }
}

#[async_trait]
impl RequestSender for RequestExecutor {
    async fn send(&self, base_url: &str, endpoint: &EndpointSpec) -> ResultRecord {
        self.execute(base_url, endpoint).await
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}

fn failure(url: String, endpoint: &EndpointSpec, err: &RequestError, started: Instant) -> ResultRecord {
    debug!("Request to endpoint '{}' failed: {}", endpoint.name, err);
    ResultRecord::error(url, endpoint.method.clone(), err.to_string(), started.elapsed())
}
