use crate::config::Config;
use crate::errors::{Error, Result};
use crate::metrics::{UPSTREAM_FAILURES_TOTAL, UPSTREAM_LATENCY_SECONDS, UPSTREAM_REQUESTS_TOTAL};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::debug;

pub const SENSORS_PATH: &str = "/api/v1/sensors";
pub const TELEMETRY_LAST_PATH: &str = "/api/v1/telemetry/last";
pub const TELEMETRY_HISTORY_PATH: &str = "/api/v1/telemetry/history";
pub const ALARMS_ACTUAL_PATH: &str = "/api/v1/alarms/actual";
pub const MEASUREMENTS_LAST_PATH: &str = "/api/v1/measurements/last";

// Sent as `ApiKey`; header names are case-insensitive on the wire.
const API_KEY_HEADER: &str = "apikey";

/// Client for the Aranet Cloud REST API.
///
/// One `reqwest::Client` is shared by every request so connections are
/// pooled; no timeout is set beyond the transport default.
#[derive(Debug, Clone)]
pub struct AranetClient {
    http: reqwest::Client,
    base_url: String,
}

impl AranetClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut api_key = HeaderValue::from_str(&config.aranet_api_key).map_err(|_| {
            Error::InvalidConfig {
                key: "ARANET_API_KEY",
                value: "***".to_string(),
            }
        })?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.aranet_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issues one GET and decodes the JSON body.
    ///
    /// Query pairs are forwarded in order, duplicates included. A non-2xx
    /// status becomes [`Error::Upstream`] carrying the response text.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        UPSTREAM_REQUESTS_TOTAL.inc();
        let start = Instant::now();

        let result = self.get_inner(path, query).await;

        let elapsed = start.elapsed().as_secs_f64();
        UPSTREAM_LATENCY_SECONDS.observe(elapsed);
        match &result {
            Ok(_) => debug!("GET {} ok in {:.3}s", path, elapsed),
            Err(e) => {
                UPSTREAM_FAILURES_TOTAL.inc();
                debug!("GET {} failed in {:.3}s: {}", path, elapsed, e);
            }
        }

        result
    }

    async fn get_inner<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let response = self.http.get(self.url(path)).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> Config {
        Config {
            port: 0,
            aranet_base_url: base_url.to_string(),
            aranet_api_key: "secret".to_string(),
        }
    }

    #[test]
    fn test_url_joins_base_and_path() {
        let client = AranetClient::new(&config("https://aranet.cloud/")).unwrap();

        assert_eq!(
            client.url(MEASUREMENTS_LAST_PATH),
            "https://aranet.cloud/api/v1/measurements/last"
        );
    }

    #[test]
    fn test_rejects_unencodable_api_key() {
        let mut config = config("https://aranet.cloud");
        config.aranet_api_key = "bad\nkey".to_string();

        assert!(matches!(
            AranetClient::new(&config),
            Err(Error::InvalidConfig { key: "ARANET_API_KEY", .. })
        ));
    }

    #[test]
    fn test_unreachable_upstream() {
        tokio_test::block_on(async {
            let port = std::net::TcpListener::bind("127.0.0.1:0")
                .unwrap()
                .local_addr()
                .unwrap()
                .port();
            let client = AranetClient::new(&config(&format!("http://127.0.0.1:{}", port))).unwrap();

            let result = client.get::<serde_json::Value>(SENSORS_PATH, &[]).await;

            assert!(matches!(result, Err(Error::Http(_))));
        });
    }
}
