#![deny(clippy::unwrap_used)]

//! Typed client for the storefront REST API.
//!
//! Catalog reads are anonymous. Everything the dashboard does needs an
//! [`AuthToken`], which callers pass in explicitly on every call.

use derive_more::Deref;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::multipart::{Form, Part};
use reqwest::Method;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use store_types::category::{Category, CategoryDraft};
use store_types::product::{NewProduct, Product, ProductUpdate};
use store_types::todo::{Todo, TodoPayload};
use store_types::user::Profile;

mod error;
mod middleware;

pub use error::ApiError;
pub use middleware::LogRequests;

/// Same set `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Bearer credential issued by `POST /api/auth/login`.
#[derive(Deref, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken(pub String);

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    token: String,
}

#[derive(Serialize)]
struct RecoveryRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
}

#[derive(Clone)]
pub struct ApiClient {
    base: String,
    client: ClientWithMiddleware,
}

impl ApiClient {
    pub fn new(base_url: &str, client: reqwest::Client) -> Result<Self, ApiError> {
        let base = url::Url::parse(base_url).map_err(ApiError::InvalidUrl)?;
        let client = ClientBuilder::new(client).with(LogRequests).build();
        Ok(Self {
            base: base.as_str().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn request(&self, method: Method, path: &str, token: Option<&AuthToken>) -> RequestBuilder {
        let req = self.client.request(method, format!("{}{path}", self.base));
        match token {
            Some(token) => req.bearer_auth(token.as_str()),
            None => req,
        }
    }

    /// Name of a media item as expected by the delete endpoint: the
    /// `<base>/api/images/` prefix is dropped and the rest percent-encoded.
    pub fn image_name(&self, media_url: &str) -> String {
        let prefix = format!("{}/api/images/", self.base);
        let name = media_url.strip_prefix(&prefix).unwrap_or(media_url);
        utf8_percent_encode(name, COMPONENT).to_string()
    }

    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        send_json(self.request(Method::GET, "/api/products", None)).await
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        send_json(self.request(Method::GET, "/api/categories", None)).await
    }

    /// Products then categories, one after the other. No retries.
    pub async fn catalog(&self) -> Result<(Vec<Product>, Vec<Category>), ApiError> {
        let products = self.products().await?;
        let categories = self.categories().await?;
        Ok((products, categories))
    }

    pub async fn product(&self, slug: &str) -> Result<Product, ApiError> {
        let path = format!("/api/products/{}", utf8_percent_encode(slug, COMPONENT));
        send_json(self.request(Method::GET, &path, None)).await
    }

    pub async fn create_product(&self, token: &AuthToken, product: &NewProduct) -> Result<(), ApiError> {
        send_empty(self.request(Method::POST, "/api/products", Some(token)).json(product)).await
    }

    pub async fn update_product(
        &self,
        token: &AuthToken,
        slug: &str,
        product: &ProductUpdate,
    ) -> Result<(), ApiError> {
        let path = format!("/api/products/edit/{}", utf8_percent_encode(slug, COMPONENT));
        send_empty(self.request(Method::PATCH, &path, Some(token)).json(product)).await
    }

    pub async fn delete_product(&self, token: &AuthToken, id: u64) -> Result<(), ApiError> {
        let path = format!("/api/products/delete/{id}");
        send_empty(self.request(Method::DELETE, &path, Some(token))).await
    }

    pub async fn category(&self, token: &AuthToken, slug: &str) -> Result<Category, ApiError> {
        let path = format!("/api/categories/{}", utf8_percent_encode(slug, COMPONENT));
        send_json(self.request(Method::GET, &path, Some(token))).await
    }

    pub async fn create_category(&self, token: &AuthToken, category: &CategoryDraft) -> Result<(), ApiError> {
        send_empty(self.request(Method::POST, "/api/categories", Some(token)).json(category)).await
    }

    pub async fn update_category(
        &self,
        token: &AuthToken,
        slug: &str,
        category: &CategoryDraft,
    ) -> Result<(), ApiError> {
        let path = format!("/api/categories/edit/{}", utf8_percent_encode(slug, COMPONENT));
        send_empty(self.request(Method::PATCH, &path, Some(token)).json(category)).await
    }

    pub async fn delete_category(&self, token: &AuthToken, id: &str) -> Result<(), ApiError> {
        let path = format!("/api/categories/delete/{}", utf8_percent_encode(id, COMPONENT));
        send_empty(self.request(Method::DELETE, &path, Some(token))).await
    }

    pub async fn images(&self, token: &AuthToken) -> Result<Vec<String>, ApiError> {
        send_json(self.request(Method::GET, "/api/images", Some(token))).await
    }

    pub async fn upload_image(
        &self,
        token: &AuthToken,
        file_name: String,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        let mut part = Part::bytes(bytes).file_name(file_name);
        if let Some(mime) = mime {
            part = part.mime_str(mime)?;
        }
        let form = Form::new().part("file", part);
        send_empty(
            self.request(Method::POST, "/api/images/upload", Some(token))
                .multipart(form),
        )
        .await
    }

    pub async fn delete_image(&self, token: &AuthToken, media_url: &str) -> Result<(), ApiError> {
        let path = format!("/api/images/delete/{}", self.image_name(media_url));
        send_empty(self.request(Method::DELETE, &path, Some(token))).await
    }

    pub async fn todos(&self, token: &AuthToken) -> Result<Vec<Todo>, ApiError> {
        send_json(self.request(Method::GET, "/api/todos", Some(token))).await
    }

    pub async fn create_todo(&self, token: &AuthToken, todo: &TodoPayload) -> Result<Todo, ApiError> {
        send_json(self.request(Method::POST, "/api/todos", Some(token)).json(todo)).await
    }

    pub async fn update_todo(
        &self,
        token: &AuthToken,
        id: &str,
        todo: &TodoPayload,
    ) -> Result<Todo, ApiError> {
        let path = format!("/api/todos/edit/{}", utf8_percent_encode(id, COMPONENT));
        send_json(self.request(Method::PATCH, &path, Some(token)).json(todo)).await
    }

    pub async fn delete_todo(&self, token: &AuthToken, id: &str) -> Result<(), ApiError> {
        let path = format!("/api/todos/delete/{}", utf8_percent_encode(id, COMPONENT));
        send_empty(self.request(Method::DELETE, &path, Some(token))).await
    }

    pub async fn users(&self, token: &AuthToken) -> Result<Vec<Profile>, ApiError> {
        send_json(self.request(Method::GET, "/api/users", Some(token))).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthToken, ApiError> {
        let res: LoginResponse = send_json(
            self.request(Method::POST, "/api/auth/login", None)
                .json(&Credentials { email, password }),
        )
        .await?;
        Ok(AuthToken(res.token))
    }

    pub async fn send_recovery_email(&self, email: &str) -> Result<(), ApiError> {
        self.recovery("/api/send-email", email, None, None).await
    }

    pub async fn verify_recovery_code(&self, email: &str, code: &str) -> Result<(), ApiError> {
        self.recovery("/api/verify-code", email, Some(code), None).await
    }

    pub async fn reset_password(&self, email: &str, code: &str, password: &str) -> Result<(), ApiError> {
        self.recovery("/api/reset-password", email, Some(code), Some(password))
            .await
    }

    async fn recovery(
        &self,
        path: &str,
        email: &str,
        code: Option<&str>,
        password: Option<&str>,
    ) -> Result<(), ApiError> {
        let body = RecoveryRequest {
            email,
            code,
            password,
        };
        send_empty(self.request(Method::POST, path, None).json(&body)).await
    }
}

async fn checked(req: RequestBuilder) -> Result<reqwest::Response, ApiError> {
    let res = req.send().await?;
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(ApiError::from_status(status, &body))
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
    let bytes = checked(req).await?.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ApiError::Decode)
}

async fn send_empty(req: RequestBuilder) -> Result<(), ApiError> {
    checked(req).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::AUTHORIZATION;

    fn client() -> ApiClient {
        ApiClient::new("https://api.agnelle.test/", reqwest::Client::new()).expect("client")
    }

    #[test]
    fn rejects_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", reqwest::Client::new()),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn trims_trailing_slash_from_base() {
        assert_eq!(client().base_url(), "https://api.agnelle.test");
    }

    #[test]
    fn catalog_reads_are_anonymous() {
        let req = client()
            .request(Method::GET, "/api/products", None)
            .build()
            .expect("request");
        assert_eq!(req.url().as_str(), "https://api.agnelle.test/api/products");
        assert!(req.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn dashboard_calls_carry_bearer_token() {
        let token = AuthToken("abc123".to_string());
        let req = client()
            .request(Method::DELETE, "/api/todos/delete/4", Some(&token))
            .build()
            .expect("request");
        assert_eq!(req.method(), Method::DELETE);
        assert_eq!(
            req.headers().get(AUTHORIZATION).and_then(|h| h.to_str().ok()),
            Some("Bearer abc123")
        );
    }

    #[test]
    fn image_name_strips_prefix_and_encodes() {
        let c = client();
        assert_eq!(
            c.image_name("https://api.agnelle.test/api/images/bolsa azul (1).webp"),
            "bolsa%20azul%20(1).webp"
        );
        assert_eq!(c.image_name("outra/imagem.png"), "outra%2Fimagem.png");
    }

    #[test]
    fn token_is_redacted_in_debug_output() {
        let token = AuthToken("secret".to_string());
        assert_eq!(format!("{token:?}"), "AuthToken(***)");
    }

    #[test]
    fn recovery_body_skips_absent_fields() {
        let body = RecoveryRequest {
            email: "a@b.c",
            code: None,
            password: None,
        };
        assert_eq!(
            serde_json::to_value(&body).expect("serialize"),
            serde_json::json!({"email": "a@b.c"})
        );
    }
}
