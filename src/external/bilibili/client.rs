use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, ORIGIN, REFERER, USER_AGENT};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::types::{ArcSearchData, BiliEnvelope, NavData};
use super::wbi::WbiKeys;
use crate::error::{AppError, AppResult};
use crate::external::source::{Video, VideoSource};
use crate::external::user_agent::random_user_agent;

const PLATFORM: &str = "bilibili";

const DEFAULT_API_BASE: &str = "https://api.bilibili.com";
const SIGNED_LISTING_PATH: &str = "/x/space/wbi/arc/search";
const LEGACY_LISTING_PATH: &str = "/x/space/arc/search";
const NAV_PATH: &str = "/x/web-interface/nav";

const SITE_ORIGIN: &str = "https://www.bilibili.com";
const ACCEPT_JSON: &str = "application/json, text/plain, */*";

/// API code returned when the request was flagged as abusive
const RATE_LIMITED_CODE: i64 = -412;

/// Client for an author's upload listing on the Bilibili web API
pub struct BilibiliClient {
    http: reqwest::Client,
    api_base: String,
    sign_requests: bool,
    wbi_keys: Mutex<Option<WbiKeys>>,
}

impl BilibiliClient {
    pub fn new(http: reqwest::Client, sign_requests: bool) -> Self {
        Self {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            sign_requests,
            wbi_keys: Mutex::new(None),
        }
    }

    /// Point the client at another host, e.g. a local stub server
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn make_error(message: impl Into<String>, source: Option<anyhow::Error>) -> AppError {
        AppError::ExternalApi {
            platform: PLATFORM.into(),
            message: message.into(),
            source,
        }
    }

    fn malformed(message: impl Into<String>) -> AppError {
        AppError::MalformedResponse {
            platform: PLATFORM.into(),
            message: message.into(),
        }
    }

    /// GET `url` and decode the envelope; HTTP 412/429 count as rate-limiting.
    async fn get_envelope<T: DeserializeOwned>(
        &self,
        url: &str,
        context: &str,
    ) -> AppResult<BiliEnvelope<T>> {
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .header(REFERER, SITE_ORIGIN)
            .header(ORIGIN, SITE_ORIGIN)
            .header(ACCEPT, ACCEPT_JSON)
            .send()
            .await
            .map_err(|e| {
                Self::make_error(format!("{context} request failed: {e}"), Some(e.into()))
            })?;

        let status = resp.status();
        if status == StatusCode::PRECONDITION_FAILED || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::RateLimited {
                platform: PLATFORM.into(),
                code: i64::from(status.as_u16()),
            });
        }

        let resp = resp.error_for_status().map_err(|e| {
            Self::make_error(format!("{context} HTTP error: {e}"), Some(e.into()))
        })?;

        resp.json::<BiliEnvelope<T>>().await.map_err(|e| {
            Self::make_error(format!("{context} invalid JSON: {e}"), Some(e.into()))
        })
    }

    /// Signing keys, fetched from `nav` once per session
    async fn wbi_keys(&self) -> AppResult<WbiKeys> {
        let mut cached = self.wbi_keys.lock().await;
        if let Some(keys) = cached.as_ref() {
            return Ok(keys.clone());
        }

        let url = format!("{}{}", self.api_base, NAV_PATH);
        // nav answers -101 for anonymous sessions but still carries the keys
        let envelope: BiliEnvelope<NavData> = self.get_envelope(&url, "nav").await?;
        let nav = envelope
            .data
            .ok_or_else(|| Self::malformed("nav response has no data"))?;
        let keys = WbiKeys::from_urls(&nav.wbi_img.img_url, &nav.wbi_img.sub_url)
            .ok_or_else(|| Self::malformed("nav response has empty wbi_img urls"))?;

        tracing::debug!("Fetched WBI signing keys");
        *cached = Some(keys.clone());
        Ok(keys)
    }

    async fn listing_url(&self, mid: &str, page_size: u32) -> AppResult<String> {
        let params = [
            ("mid", mid.to_string()),
            ("ps", page_size.to_string()),
            ("pn", "1".to_string()),
            ("tid", "0".to_string()),
            ("order", "pubdate".to_string()),
            ("platform", "web".to_string()),
        ];

        if self.sign_requests {
            let keys = self.wbi_keys().await?;
            let query = keys.sign(&params, jiff::Timestamp::now().as_second());
            return Ok(format!("{}{}?{}", self.api_base, SIGNED_LISTING_PATH, query));
        }

        let base = format!("{}{}", self.api_base, LEGACY_LISTING_PATH);
        let url = reqwest::Url::parse_with_params(&base, &params)
            .map_err(|e| Self::make_error(format!("invalid listing URL: {e}"), Some(e.into())))?;
        Ok(url.into())
    }
}

#[async_trait]
impl VideoSource for BilibiliClient {
    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn list_recent(&self, mid: &str, page_size: u32) -> AppResult<Vec<Video>> {
        let url = self.listing_url(mid, page_size).await?;
        let context = format!("list_recent({mid})");
        let envelope: BiliEnvelope<ArcSearchData> = self.get_envelope(&url, &context).await?;

        match envelope.code {
            0 => {}
            RATE_LIMITED_CODE => {
                return Err(AppError::RateLimited {
                    platform: PLATFORM.into(),
                    code: envelope.code,
                });
            }
            code => {
                return Err(AppError::Api {
                    platform: PLATFORM.into(),
                    code,
                    message: envelope.message,
                });
            }
        }

        let vlist = envelope
            .data
            .and_then(|data| data.list)
            .and_then(|list| list.vlist)
            .ok_or_else(|| Self::malformed(format!("{context}: data.list.vlist missing")))?;

        Ok(vlist
            .into_iter()
            .map(|item| Video {
                bvid: item.bvid,
                title: item.title,
                author: item.author,
                created: item.created,
            })
            .collect())
    }

    async fn reset_session(&self) {
        *self.wbi_keys.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, headers, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    fn listing_body() -> serde_json::Value {
        json!({
            "code": 0,
            "message": "0",
            "data": {"list": {"vlist": [
                {"bvid": "BV1new", "title": "Newest", "author": "Tester", "created": 1700000100},
                {"bvid": "BV1old", "title": "Older", "author": "Tester", "created": 1700000000}
            ]}}
        })
    }

    fn nav_body() -> serde_json::Value {
        json!({
            "code": -101,
            "message": "not logged in",
            "data": {"wbi_img": {
                "img_url": "https://i0.hdslb.com/bfs/wbi/7cd084941338484aae1ad9425b84077c.png",
                "sub_url": "https://i0.hdslb.com/bfs/wbi/4932caff0ff746eab6f01bf08b70ac45.png"
            }}
        })
    }

    /// Server answering the unsigned listing endpoint with `response`
    async fn listing_server(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LEGACY_LISTING_PATH))
            .respond_with(response)
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    async fn unsigned_listing(response: ResponseTemplate) -> AppResult<Vec<Video>> {
        let server = listing_server(response).await;
        BilibiliClient::new(http(), false)
            .with_api_base(server.uri())
            .list_recent("1", 5)
            .await
    }

    #[test]
    fn test_platform_is_bilibili() {
        assert_eq!(BilibiliClient::new(http(), false).platform(), "bilibili");
    }

    #[test]
    fn test_make_error_keeps_source() {
        match BilibiliClient::make_error("boom", Some(anyhow::anyhow!("io"))) {
            AppError::ExternalApi {
                platform, source, ..
            } => {
                assert_eq!(platform, "bilibili");
                assert!(source.is_some());
            }
            other => panic!("Expected ExternalApi error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unsigned_listing_parses_videos() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LEGACY_LISTING_PATH))
            .and(query_param("mid", "9617619"))
            .and(query_param("ps", "5"))
            .and(header("referer", SITE_ORIGIN))
            .and(header("origin", SITE_ORIGIN))
            .and(headers("accept", ACCEPT_JSON.split(", ").collect()))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
            .expect(1)
            .mount(&server)
            .await;
        let client = BilibiliClient::new(http(), false).with_api_base(server.uri());

        let videos = client.list_recent("9617619", 5).await.unwrap();

        assert_eq!(videos.len(), 2);
        assert_eq!(videos[0].bvid, "BV1new");
        assert_eq!(videos[0].author, "Tester");
        assert_eq!(videos[1].created, 1700000000);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(
            requests[0].url.query(),
            Some("mid=9617619&ps=5&pn=1&tid=0&order=pubdate&platform=web")
        );
        let agent = requests[0].headers.get("user-agent").unwrap().to_str().unwrap();
        assert!(agent.starts_with("Mozilla/5.0"));
    }

    #[tokio::test]
    async fn test_signed_listing_fetches_keys_once_per_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(NAV_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(nav_body()))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SIGNED_LISTING_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(listing_body()))
            .expect(3)
            .mount(&server)
            .await;
        let client = BilibiliClient::new(http(), true).with_api_base(server.uri());

        client.list_recent("1", 5).await.unwrap();
        client.list_recent("2", 5).await.unwrap();
        client.reset_session().await;
        client.list_recent("3", 5).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
        assert_eq!(
            paths,
            vec![NAV_PATH, SIGNED_LISTING_PATH, SIGNED_LISTING_PATH, NAV_PATH, SIGNED_LISTING_PATH]
        );

        let query = requests[1].url.query().unwrap_or_default();
        assert!(query.starts_with("mid=1&"));
        assert!(query.contains("&wts=") && query.contains("&w_rid="));
        assert!(requests[4].url.query().unwrap_or_default().starts_with("mid=3&"));
    }

    #[tokio::test]
    async fn test_api_rate_limit_code() {
        let body = json!({"code": -412, "message": "request was banned", "data": null});
        match unsigned_listing(ResponseTemplate::new(200).set_body_json(body)).await {
            Err(AppError::RateLimited { code, .. }) => assert_eq!(code, -412),
            other => panic!("Expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_429_is_rate_limit() {
        match unsigned_listing(ResponseTemplate::new(429)).await {
            Err(AppError::RateLimited { code, .. }) => assert_eq!(code, 429),
            other => panic!("Expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hard_api_error_is_not_retryable() {
        let body = json!({"code": -404, "message": "nothing here", "data": null});
        let err = unsigned_listing(ResponseTemplate::new(200).set_body_json(body))
            .await
            .unwrap_err();

        assert!(!err.is_retryable());
        match err {
            AppError::Api { code, message, .. } => {
                assert_eq!(code, -404);
                assert_eq!(message, "nothing here");
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_payload_is_malformed() {
        let body = json!({"code": 0, "message": "0", "data": {"page": {}}});
        let err = unsigned_listing(ResponseTemplate::new(200).set_body_json(body))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_transport_error() {
        let err = unsigned_listing(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalApi { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_server_error_is_transport_error() {
        let err = unsigned_listing(ResponseTemplate::new(503)).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApi { .. }));
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_list_recent_real_api() {
        let client = BilibiliClient::new(http(), true);
        let videos = client.list_recent("9617619", 5).await.unwrap();
        assert!(videos.len() <= 5);
    }
}
