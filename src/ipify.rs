use std::future::Future;

use reqwest::StatusCode;

use crate::config::Settings;
use crate::data::{GeoResponse, IpifyErrorBody, LookupResult};
use crate::error::{ConfigError, LookupError};
use crate::logging::redact_api_key;

/// Resolves an IP address or domain to a location.
pub trait GeoLookup {
    fn lookup(&self, query: &str) -> impl Future<Output = Result<LookupResult, LookupError>>;
}

/// Client for the ipify Geolocation API.
#[derive(Clone)]
pub struct IpifyClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl IpifyClient {
    /// Fails before any request is made when no API key is configured.
    pub fn new(settings: &Settings) -> Result<IpifyClient, ConfigError> {
        let api_key = settings.require_api_key()?.to_string();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ConfigError::HttpClient)?;

        Ok(IpifyClient {
            http,
            endpoint: settings.endpoint.clone(),
            api_key,
        })
    }

    pub fn request_url(&self, query: &str) -> String {
        format!(
            "{}?apiKey={}&ipAddress={}",
            self.endpoint,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query.trim())
        )
    }
}

impl GeoLookup for IpifyClient {
    async fn lookup(&self, query: &str) -> Result<LookupResult, LookupError> {
        if self.api_key.is_empty() {
            return Err(LookupError::MissingApiKey);
        }

        let url = self.request_url(query);
        log::info!("Looking up {:?} via {}", query, redact_api_key(&url));

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        log::debug!(
            "Response {} (first 300 chars): {}",
            status,
            text.chars().take(300).collect::<String>()
        );

        parse_response(status, &text)
    }
}

/// Turns a status and body into a result, classifying every failure.
pub fn parse_response(status: StatusCode, body: &str) -> Result<LookupResult, LookupError> {
    if !status.is_success() {
        let message = match serde_json::from_str::<IpifyErrorBody>(body) {
            Ok(err) => err.messages,
            Err(_) => body.trim().chars().take(200).collect(),
        };
        return Err(LookupError::Remote { status, message });
    }

    let response: GeoResponse = serde_json::from_str(body)?;
    Ok(LookupResult::from(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_key(key: Option<&str>) -> Settings {
        Settings {
            api_key: key.map(str::to_string),
            endpoint: "https://geo.ipify.org/api/v2/country,city".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn construction_requires_api_key() {
        assert!(matches!(
            IpifyClient::new(&settings_with_key(None)),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(IpifyClient::new(&settings_with_key(Some("k"))).is_ok());
    }

    #[test]
    fn url_carries_key_and_encoded_query() {
        let client = IpifyClient::new(&settings_with_key(Some("at_abc"))).unwrap();
        assert_eq!(
            client.request_url("8.8.8.8"),
            "https://geo.ipify.org/api/v2/country,city?apiKey=at_abc&ipAddress=8.8.8.8"
        );
        assert_eq!(
            client.request_url(" example.com/a b "),
            "https://geo.ipify.org/api/v2/country,city?apiKey=at_abc&ipAddress=example.com%2Fa%20b"
        );
        assert_eq!(
            client.request_url("2001:4860:4860::8888"),
            "https://geo.ipify.org/api/v2/country,city?apiKey=at_abc&ipAddress=2001%3A4860%3A4860%3A%3A8888"
        );
    }

    #[test]
    fn parses_success_body() {
        let body = r#"{"ip":"8.8.8.8","isp":"Google LLC","location":{"city":"Mountain View","timezone":"-08:00","lat":37.4056,"lng":-122.0775}}"#;
        let result = parse_response(StatusCode::OK, body).unwrap();
        assert_eq!(result.city, "Mountain View");
        assert_eq!(result.isp, "Google LLC");
    }

    #[test]
    fn non_success_status_is_remote_error() {
        let body = r#"{"code":422,"messages":"Input correct IPv4 or IPv6 address."}"#;
        match parse_response(StatusCode::UNPROCESSABLE_ENTITY, body) {
            Err(LookupError::Remote { status, message }) => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(message, "Input correct IPv4 or IPv6 address.");
            }
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn non_json_error_body_is_kept_as_message() {
        match parse_response(StatusCode::BAD_GATEWAY, "  upstream down\n") {
            Err(LookupError::Remote { message, .. }) => assert_eq!(message, "upstream down"),
            other => panic!("expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn malformed_success_body_is_parse_error() {
        assert!(matches!(
            parse_response(StatusCode::OK, "<html>oops</html>"),
            Err(LookupError::Parse(_))
        ));
        assert!(matches!(
            parse_response(StatusCode::OK, r#"{"ip":"8.8.8.8"}"#),
            Err(LookupError::Parse(_))
        ));
    }
}
