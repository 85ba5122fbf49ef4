//! A rate-limited REST client for the Discord API.

#[macro_use]
extern crate log;

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, ClientBuilder, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::ser::Serialize;
use serde_json::Value;
use tokio::time::timeout;
use url::Url;

use accord_model::{
    channel::Channel,
    gateway::GatewayInfo,
    voice::VoiceRegion,
    Snowflake,
    User,
};

pub use crate::errors::{Error, Result};
pub use crate::ratelimit::{Bucket, RateLimitHeaders, Ratelimiter};
pub use crate::views::*;

mod constants;
mod errors;
mod ratelimit;
mod views;

/// How the response body of a request should be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Etf,
}

/// The main client used to interface with the various components of the Discord API.
#[derive(Clone, Debug)]
pub struct RestClient {
    /// The bot token for this user.
    pub token: String,
    /// The base URL of the client. May be changed to accommodate an external proxy.
    pub base_url: String,
    pub http: ReqwestClient,
    ratelimiter: Option<Arc<Ratelimiter>>,
}

impl RestClient {
    /// Creates a new REST client with the provided token.
    ///
    /// The second argument denotes whether to use the built-in rate limiter.
    /// A distributed deployment would disable it in favour of an external
    /// limiter shared across services.
    pub fn new(token: String, using_ratelimiter: bool) -> Self {
        let token = if token.starts_with("Bot ") {
            token
        } else {
            format!("Bot {}", token)
        };
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&token).expect("Invalid characters in bot token");
        let agent = HeaderValue::from_static(constants::USER_AGENT);
        headers.insert("Authorization", value);
        headers.insert("User-Agent", agent);

        // redirects are resolved by hand so the policy below can be applied
        let http = ClientBuilder::new()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        RestClient {
            token,
            http,
            base_url: constants::BASE_URL.to_string(),
            ratelimiter: if using_ratelimiter {
                Some(Arc::new(Ratelimiter::new()))
            } else {
                None
            },
        }
    }

    /// Changes the base URL for all requests made by this client.
    /// Here, you may specify a URL to an HTTP rate limiter proxy.
    pub fn set_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    /// Opens a ChannelView for the provided channel snowflake.
    pub fn channel(&self, id: Snowflake) -> ChannelView {
        ChannelView::new(id, self.clone())
    }

    /// Opens a GuildView for the provided guild snowflake.
    pub fn guild(&self, id: Snowflake) -> GuildView {
        GuildView::new(id, self.clone())
    }

    /// Fetches the websocket URL used to connect to the gateway.
    pub async fn get_gateway(&self) -> Result<GatewayInfo> {
        self.request(Endpoint::new(Method::GET, String::from("/gateway"))).await
    }

    /// Gets a User object for the provided snowflake.
    pub async fn get_user(&self, id: Snowflake) -> Result<User> {
        self.request(Endpoint::new(Method::GET, format!("/users/{}", id))).await
    }

    /// Opens a new DM channel with the provided user ID.
    pub async fn create_dm(&self, user: Snowflake) -> Result<Channel> {
        let json = serde_json::json!({ "recipient_id": user });
        self.request(
            Endpoint::new(Method::POST, String::from("/users/@me/channels")).json(json),
        )
        .await
    }

    /// Obtains a list of Discord voice regions.
    pub async fn get_voice_regions(&self) -> Result<Vec<VoiceRegion>> {
        self.request(Endpoint::new(Method::GET, String::from("/voice/regions"))).await
    }

    /// Makes a request to the provided Discord API endpoint.
    ///
    /// The request is gated on the endpoint's bucket, retried on transport
    /// failures, watchdog timeouts and 429s, and follows same-origin
    /// redirects without releasing the bucket. At most five attempts are
    /// made before the request fails.
    pub async fn request<T>(&self, endpt: Endpoint) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let route = normalize(&endpt.route);
        let bucket = match &endpt.bucket {
            Some(bucket) if !bucket.is_empty() => normalize(bucket),
            _ => route.clone(),
        };

        if let Some(limiter) = &self.ratelimiter {
            limiter.acquire(&bucket).await;
        }

        let base = Url::parse(&self.base_url)?;
        let mut url = Url::parse(&format!("{}{}", self.base_url, route))?;
        let mut timed_out = false;

        for attempt in 0..constants::MAX_ATTEMPTS {
            let mut req = self.http.request(endpt.method.clone(), url.clone());
            if !endpt.query.is_empty() {
                req = req.query(&endpt.query);
            }
            if let Some(body) = &endpt.json {
                req = req.json(body);
            }

            let watchdog = Duration::from_secs(constants::REQUEST_TIMEOUT_SECS);
            let resp = match timeout(watchdog, req.send()).await {
                Err(_) => {
                    warn!("Request to {} timed out on attempt {}.", route, attempt + 1);
                    timed_out = true;
                    continue;
                }
                Ok(Err(err)) => {
                    warn!("Transport error on {} (attempt {}): {}.", route, attempt + 1, err);
                    continue;
                }
                Ok(Ok(resp)) => resp,
            };

            let status = resp.status();
            if status.is_redirection() {
                let location = resp
                    .headers()
                    .get("location")
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| Error::BadRedirect(String::from("(missing Location)")))?;
                url = resolve_redirect(&base, &url, location)?;
                debug!("Following redirect for {} to {}.", route, url);
                continue;
            }

            let limits = RateLimitHeaders::parse(resp.headers());
            if let Some(limiter) = &self.ratelimiter {
                if limiter.update(&bucket, status.as_u16(), &limits).await {
                    continue;
                }
            } else if status.as_u16() == 429 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }

            return decode_response(status, resp, endpt.format).await;
        }

        Err(if timed_out { Error::RequestTimeout } else { Error::RetryExhausted })
    }
}

async fn decode_response<T>(status: StatusCode, resp: reqwest::Response, format: ResponseFormat) -> Result<T>
where
    T: DeserializeOwned,
{
    if status.is_success() {
        let bytes = resp.bytes().await?;
        if status.as_u16() == 204 || bytes.is_empty() {
            // no content maps to unit (or any other null-deserializable type)
            return serde_json::from_str("null").map_err(Error::from);
        }
        return match format {
            ResponseFormat::Json => serde_json::from_slice(&bytes).map_err(Error::from),
            ResponseFormat::Etf => accord_etf::from_bytes(&bytes).map_err(Error::from),
        };
    }

    if status.as_u16() == 401 {
        return Err(Error::InvalidToken);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Http { status: status.as_u16(), body })
}

fn normalize(route: &str) -> String {
    if route.starts_with('/') {
        route.to_string()
    } else {
        format!("/{}", route)
    }
}

/// Resolves a redirect target against the endpoint base.
///
/// Absolute URLs are accepted only on the same origin as the base;
/// server-relative URLs only under the API base path; document-relative
/// URLs resolve against the current URL. Anything else is refused.
pub fn resolve_redirect(base: &Url, current: &Url, location: &str) -> Result<Url> {
    match Url::parse(location) {
        Ok(absolute) => {
            let same_origin = absolute.scheme() == base.scheme()
                && absolute.host_str() == base.host_str()
                && absolute.port_or_known_default() == base.port_or_known_default();
            if same_origin {
                Ok(absolute)
            } else {
                Err(Error::BadRedirect(location.to_string()))
            }
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if location.starts_with('/') {
                if location.starts_with(constants::API_BASE_PATH)
                    || location.starts_with(base.path())
                {
                    base.join(location).map_err(Error::from)
                } else {
                    Err(Error::BadRedirect(location.to_string()))
                }
            } else {
                current.join(location).map_err(|_| Error::BadRedirect(location.to_string()))
            }
        }
        Err(_) => Err(Error::BadRedirect(location.to_string())),
    }
}

/// A structure representing a Discord API endpoint, in the context of an HTTP request.
#[derive(Debug)]
pub struct Endpoint {
    pub(crate) method: Method,
    pub(crate) route: String,
    pub(crate) bucket: Option<String>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) json: Option<Value>,
    pub(crate) format: ResponseFormat,
}

impl Endpoint {
    /// Creates a new endpoint from the given HTTP method and route.
    pub fn new(method: Method, route: String) -> Self {
        Endpoint {
            method,
            route,
            bucket: None,
            query: Vec::new(),
            json: None,
            format: ResponseFormat::Json,
        }
    }

    /// Files this endpoint under the given rate-limit bucket instead of its route.
    pub fn bucket(mut self, bucket: String) -> Self {
        self.bucket = Some(bucket);
        self
    }

    /// Adds a JSON body to the request.
    pub fn json<T: Serialize>(mut self, payload: T) -> Self {
        self.json = serde_json::to_value(payload).ok();
        self
    }

    /// Adds a query parameter to the request.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Requests the response body in ETF rather than JSON.
    pub fn etf(mut self) -> Self {
        self.format = ResponseFormat::Etf;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://discordapp.com/api/v6").unwrap()
    }

    fn current() -> Url {
        Url::parse("https://discordapp.com/api/v6/channels/1/messages").unwrap()
    }

    #[test]
    fn absolute_redirects_must_share_the_origin() {
        let ok = resolve_redirect(&base(), &current(), "https://discordapp.com/api/v6/other");
        assert_eq!(ok.unwrap().path(), "/api/v6/other");

        match resolve_redirect(&base(), &current(), "https://elsewhere.example/api/v6/other") {
            Err(Error::BadRedirect(_)) => {}
            other => panic!("expected BadRedirect, got {:?}", other),
        }
    }

    #[test]
    fn server_relative_redirects_must_stay_under_the_api_base() {
        let ok = resolve_redirect(&base(), &current(), "/api/v6/users/1").unwrap();
        assert_eq!(ok.as_str(), "https://discordapp.com/api/v6/users/1");

        match resolve_redirect(&base(), &current(), "/elsewhere") {
            Err(Error::BadRedirect(_)) => {}
            other => panic!("expected BadRedirect, got {:?}", other),
        }
    }

    #[test]
    fn document_relative_redirects_resolve_against_the_current_url() {
        let ok = resolve_redirect(&base(), &current(), "pins").unwrap();
        assert_eq!(ok.as_str(), "https://discordapp.com/api/v6/channels/1/pins");
    }

    #[test]
    fn schemeless_garbage_is_refused() {
        match resolve_redirect(&base(), &current(), "https:///nonsense") {
            Err(Error::BadRedirect(_)) => {}
            other => panic!("expected BadRedirect, got {:?}", other),
        }
    }
}
