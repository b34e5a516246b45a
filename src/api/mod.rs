use crate::models::{Block, PageSummary};
use crate::storage::TOKEN_KEY;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ApiErrorKind {
    Unauthorized,
    Network,
    Http,
    Parse,
}

#[derive(Clone, Debug)]
pub(crate) struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl ApiError {
    fn network(e: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Network,
            message: e.to_string(),
        }
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        Self {
            kind: ApiErrorKind::Parse,
            message: e.to_string(),
        }
    }

    fn unauthorized() -> Self {
        Self {
            kind: ApiErrorKind::Unauthorized,
            message: "Unauthorized".to_string(),
        }
    }

    fn http(status: reqwest::StatusCode, body: String, ctx: &str) -> Self {
        Self {
            kind: ApiErrorKind::Http,
            message: format!("{ctx} ({status}): {body}"),
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct EnvConfig {
    pub api_url: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        let default_api_url = "http://localhost:6690".to_string();

        // Deployment injects `window.ENV.API_URL`; fall back for local dev.
        #[cfg(target_arch = "wasm32")]
        if let Some(window) = web_sys::window() {
            if let Some(env) = window.get("ENV") {
                if !env.is_undefined() && env.is_object() {
                    if let Ok(api_url) = js_sys::Reflect::get(&env, &"API_URL".into()) {
                        if let Some(url_str) = api_url.as_string() {
                            return Self { api_url: url_str };
                        }
                    }
                }
            }
        }

        Self {
            api_url: default_api_url,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn get_api_url() -> String {
    EnvConfig::new().api_url
}

/// Full page payload as loaded from the backend.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct PageDetail {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub meta_title: String,
    #[serde(default)]
    pub og_image: String,
    #[serde(default)]
    pub noindex: bool,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Optimistic-concurrency token; echoed back on save.
    pub updated_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct SavePageRequest {
    pub page_id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub meta_title: String,
    pub og_image: String,
    pub noindex: bool,
    pub blocks: Vec<Block>,
    /// The `updated-at` the client last observed. The backend rejects the
    /// save with 409 when its stored value differs.
    pub expected_updated_at: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "kebab-case")]
struct SavedResponse {
    updated_at: String,
}

/// Server copy returned with a 409 so the operator can choose a side.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ConflictResponse {
    pub server_title: String,
    #[serde(default)]
    pub server_blocks: Vec<Block>,
    pub server_updated_at: String,
}

#[derive(Clone, Debug)]
pub(crate) enum SaveOutcome {
    Saved { updated_at: String },
    Conflict(ConflictResponse),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "kebab-case")]
struct CreatePageRequest {
    title: String,
}

#[derive(Clone)]
pub(crate) struct ApiClient {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
}

impl ApiClient {
    #[allow(dead_code)]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            token: None,
        }
    }

    pub fn load_from_storage() -> Self {
        let base_url = get_api_url();
        let token = crate::storage::load_string_from_storage(TOKEN_KEY);
        Self { base_url, token }
    }

    pub(crate) fn get_auth_token(&self) -> Option<String> {
        self.token.clone()
    }

    fn with_auth_headers(
        mut req: reqwest::RequestBuilder,
        token: Option<String>,
    ) -> reqwest::RequestBuilder {
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        req
    }

    async fn request_api<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&impl serde::Serialize>,
    ) -> ApiResult<T> {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.base_url, path);
        let mut req = client.post(url);
        req = Self::with_auth_headers(req, self.get_auth_token());

        if let Some(b) = body {
            req = req.json(b);
        }

        let res = req.send().await.map_err(ApiError::network)?;

        if res.status().is_success() {
            res.json().await.map_err(ApiError::parse)
        } else if res.status().as_u16() == 401 {
            Err(ApiError::unauthorized())
        } else {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            Err(ApiError::http(status, body, "Request failed"))
        }
    }

    pub async fn get_page(&self, page_id: &str) -> ApiResult<PageDetail> {
        self.request_api(
            "/pagecraft/get-page",
            Some(&serde_json::json!({ "page-id": page_id })),
        )
        .await
    }

    /// Submit the sanitized tree together with the last observed save token.
    ///
    /// A 409 is not an error at this boundary: the body carries the server's
    /// copy and becomes `SaveOutcome::Conflict` for the session to resolve.
    pub async fn save_page(&self, req_body: &SavePageRequest) -> ApiResult<SaveOutcome> {
        let client = reqwest::Client::new();
        let url = format!("{}/pagecraft/save-page", self.base_url);
        let req = Self::with_auth_headers(client.post(url), self.get_auth_token()).json(req_body);

        let res = req.send().await.map_err(ApiError::network)?;
        let status = res.status();

        if status.is_success() {
            let saved: SavedResponse = res.json().await.map_err(ApiError::parse)?;
            return Ok(SaveOutcome::Saved {
                updated_at: saved.updated_at,
            });
        }

        if status.as_u16() == 409 {
            let conflict: ConflictResponse = res.json().await.map_err(ApiError::parse)?;
            return Ok(SaveOutcome::Conflict(conflict));
        }

        if status.as_u16() == 401 {
            return Err(ApiError::unauthorized());
        }

        let body = res.text().await.unwrap_or_default();
        Err(ApiError::http(status, body, "Save failed"))
    }

    pub(crate) fn parse_page_list_response(data: serde_json::Value) -> Vec<PageSummary> {
        let list = data
            .get("page-list")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();

        let mut out: Vec<PageSummary> = Vec::with_capacity(list.len());
        for item in list {
            if let Ok(page) = serde_json::from_value::<PageSummary>(item) {
                if !page.id.trim().is_empty() {
                    out.push(page);
                }
            }
        }
        out
    }

    pub async fn get_page_list(&self) -> ApiResult<Vec<PageSummary>> {
        let data: serde_json::Value = self
            .request_api("/pagecraft/get-page-list", Some(&serde_json::json!({})))
            .await?;
        Ok(Self::parse_page_list_response(data))
    }

    pub async fn create_page(&self, title: &str) -> ApiResult<PageSummary> {
        let data: serde_json::Value = self
            .request_api(
                "/pagecraft/new-page",
                Some(&CreatePageRequest {
                    title: title.to_string(),
                }),
            )
            .await?;

        // Accept both a wrapped and a bare summary.
        let item = data.get("page").cloned().unwrap_or(data);
        serde_json::from_value::<PageSummary>(item)
            .map_err(|e| ApiError::parse(format!("Create page response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlockType, PageMeta};

    #[test]
    fn test_page_detail_contract_deserialize() {
        let json = r#"{
            "id": "pg-1",
            "title": "Landing",
            "slug": "landing",
            "updated-at": "2026-08-01T10:00:00Z",
            "blocks": [
                {"id": "blk-1", "type": "heading", "content": {"text": "Hi", "level": 1}}
            ]
        }"#;
        let page: PageDetail = serde_json::from_str(json).expect("page should parse");
        assert_eq!(page.id, "pg-1");
        assert_eq!(page.updated_at, "2026-08-01T10:00:00Z");
        assert_eq!(page.blocks.len(), 1);
        assert_eq!(page.blocks[0].kind(), BlockType::Heading);
        assert!(!page.noindex);
    }

    #[test]
    fn test_save_request_serializes_expected_token() {
        let req = SavePageRequest {
            page_id: "pg-1".to_string(),
            title: "Landing".to_string(),
            slug: String::new(),
            description: String::new(),
            meta_title: String::new(),
            og_image: String::new(),
            noindex: false,
            blocks: vec![],
            expected_updated_at: "2026-08-01T10:00:00Z".to_string(),
        };
        let v = serde_json::to_value(&req).expect("serialize");
        assert_eq!(v["page-id"], "pg-1");
        assert_eq!(v["expected-updated-at"], "2026-08-01T10:00:00Z");
        assert!(v["blocks"].is_array());
    }

    #[test]
    fn test_conflict_response_contract_deserialize() {
        let json = r#"{
            "server-title": "Landing (edited elsewhere)",
            "server-blocks": [{"id": "blk-9", "type": "text", "content": {"html": "<p>s</p>"}}],
            "server-updated-at": "2026-08-01T11:00:00Z"
        }"#;
        let c: ConflictResponse = serde_json::from_str(json).expect("conflict should parse");
        assert_eq!(c.server_blocks.len(), 1);
        assert_eq!(c.server_updated_at, "2026-08-01T11:00:00Z");
    }

    #[test]
    fn test_parse_page_list_skips_malformed_entries() {
        let data = serde_json::json!({
            "page-list": [
                {"id": "pg-1", "title": "Home", "slug": "home", "updated-at": "t1"},
                {"title": "missing id"},
                {"id": "", "title": "blank id"}
            ]
        });
        let pages = ApiClient::parse_page_list_response(data);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].id, "pg-1");
    }

    #[test]
    fn test_page_meta_defaults() {
        let meta = PageMeta::default();
        assert!(meta.title.is_empty());
        assert!(!meta.noindex);
    }

    #[test]
    fn test_api_client_auth_token() {
        let mut client = ApiClient::new("http://localhost:6690".to_string());
        assert!(client.get_auth_token().is_none());
        client.token = Some("jwt".to_string());
        assert_eq!(client.get_auth_token().as_deref(), Some("jwt"));
    }
}
