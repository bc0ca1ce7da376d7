use actix_session::{Session, SessionExt};
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::ContentType,
    FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use anyhow::anyhow;
use askama::Template;
use derive_more::{Display, Error};
use futures::future::{ready, LocalBoxFuture, Ready};
use log_error::LogError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use store_api::{ApiError, AuthToken};

pub mod catalog;
pub mod landing;

pub type Response = Result<HttpResponse, ControllerError>;

/// Session key holding the [`AuthToken`] of the signed-in staff member.
pub const TOKEN_KEY: &str = "token";
const TOASTS_KEY: &str = "toasts";

#[derive(Debug, Display, Error)]
pub enum ControllerError {
    NotFound,
    Unauthorized,
    Forbidden,
    #[error(ignore)]
    InternalServerError(anyhow::Error),
    #[error(ignore)]
    #[display("Invalid field {field}")]
    InvalidInput {
        field: String,
        msg: String,
    },
}

impl From<anyhow::Error> for ControllerError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalServerError(err)
    }
}

impl From<ApiError> for ControllerError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::Unauthorized,
            ApiError::Forbidden => Self::Forbidden,
            ApiError::NotFound => Self::NotFound,
            err => Self::InternalServerError(anyhow::Error::new(err)),
        }
    }
}

impl actix_web::error::ResponseError for ControllerError {
    fn error_response(&self) -> HttpResponse {
        log::warn!("{self:?}\n");
        use ControllerError::*;
        match self {
            NotFound => NotFoundPage {}
                .render()
                .log_error("Unable to render error template")
                .map(|res| {
                    HttpResponse::NotFound()
                        .content_type(ContentType::html())
                        .body(res)
                })
                .unwrap_or_else(|| HttpResponse::NotFound().body(())),
            Unauthorized => see_other("/login"),
            Forbidden => ForbiddenPage {}
                .render()
                .log_error("Unable to render error template")
                .map(|res| {
                    HttpResponse::Forbidden()
                        .content_type(ContentType::html())
                        .body(res)
                })
                .unwrap_or_else(|| HttpResponse::Forbidden().body(())),
            InternalServerError(err) => InternalServerErrorPage {
                error: format!("{err:?}"),
            }
            .render()
            .log_error("Unable to render error template")
            .map(|res| {
                HttpResponse::InternalServerError()
                    .content_type(ContentType::html())
                    .body(res)
            })
            .unwrap_or_else(|| HttpResponse::InternalServerError().body(err.to_string())),
            InvalidInput { field, msg } => {
                HttpResponse::BadRequest().body(format!("{field}\n{msg}"))
            }
        }
    }
}

#[derive(Template)]
#[template(path = "500.html")]
pub struct InternalServerErrorPage {
    error: String,
}

#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundPage {}

#[derive(Template)]
#[template(path = "403.html")]
pub struct ForbiddenPage {}

pub async fn not_found() -> Response {
    Err(ControllerError::NotFound)
}

/// Bearer token of the signed-in staff member, put into request extensions
/// by [`SessionMiddleware`]. Extracting it on a request without a session
/// token redirects to the login page.
#[derive(Clone, Debug)]
pub struct Identity {
    pub token: AuthToken,
}

impl FromRequest for Identity {
    type Error = ControllerError;
    type Future = Ready<Result<Self, Self::Error>>;

    #[inline]
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .ok_or(ControllerError::Unauthorized),
        )
    }
}

pub struct SessionMiddlewareFactory {}

impl<S, B: 'static> Transform<S, ServiceRequest> for SessionMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = SessionMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddleware {
            service: Arc::new(service),
        }))
    }
}

pub struct SessionMiddleware<S> {
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        Box::pin(async move {
            let session = req.extract::<Session>().await?;
            match session.get::<AuthToken>(TOKEN_KEY) {
                Ok(Some(token)) => {
                    req.extensions_mut().insert(Identity { token });
                }
                Err(err) => {
                    log::error!("Unable to extract token from session:\n{err:?}");
                }
                _ => (),
            }
            let res = service.call(req).await?;
            let rejected = res
                .response()
                .error()
                .and_then(|e| e.as_error::<ControllerError>())
                .is_some_and(|e| matches!(e, ControllerError::Unauthorized));
            if rejected {
                res.request().get_session().remove(TOKEN_KEY);
            }
            Ok(res)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToastKind {
    Success,
    Error,
}

/// One-shot notification shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub description: Option<String>,
}

impl Toast {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
            description: None,
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
            description: None,
        }
    }

    pub fn describe<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == ToastKind::Error
    }
}

pub fn push_toast(session: &Session, toast: Toast) {
    let mut toasts = session
        .get::<Vec<Toast>>(TOASTS_KEY)
        .log_error("Unable to read toasts from session")
        .flatten()
        .unwrap_or_default();
    toasts.push(toast);
    session
        .insert(TOASTS_KEY, toasts)
        .log_error("Unable to store toast in session");
}

pub fn take_toasts(session: &Session) -> Vec<Toast> {
    session
        .remove_as::<Vec<Toast>>(TOASTS_KEY)
        .and_then(|t| t.log_error("Unable to decode toasts from session"))
        .unwrap_or_default()
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header(("Location", location))
        .finish()
}

pub fn render_template(t: impl Template) -> Result<HttpResponse, ControllerError> {
    let result = t
        .render()
        .map_err(|x| ControllerError::InternalServerError(anyhow!(x)))?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(result))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub label: String,
    pub url: Option<String>,
    pub current: bool,
}

enum PaginationItem {
    Page(usize),
    Gap,
}

fn build_pagination_items(current: usize, total: usize) -> Vec<PaginationItem> {
    if total <= 7 {
        return (1..=total).map(PaginationItem::Page).collect();
    }
    if current <= 3 {
        let mut items = (1..=4).map(PaginationItem::Page).collect::<Vec<_>>();
        items.push(PaginationItem::Gap);
        items.push(PaginationItem::Page(total));
        return items;
    }
    if current >= total.saturating_sub(2) {
        let mut items = vec![PaginationItem::Page(1), PaginationItem::Gap];
        for p in (total.saturating_sub(3))..=total {
            items.push(PaginationItem::Page(p));
        }
        return items;
    }
    vec![
        PaginationItem::Page(1),
        PaginationItem::Gap,
        PaginationItem::Page(current.saturating_sub(1)),
        PaginationItem::Page(current),
        PaginationItem::Page(current + 1),
        PaginationItem::Gap,
        PaginationItem::Page(total),
    ]
}

/// One link per page, `1..=total`.
pub fn page_links<F: Fn(usize) -> String>(current: usize, total: usize, url: F) -> Vec<PageLink> {
    (1..=total)
        .map(|p| PageLink {
            label: p.to_string(),
            url: Some(url(p)),
            current: p == current,
        })
        .collect()
}

/// Previous/next arrows around a gapped list of page numbers.
pub fn compact_page_links<F: Fn(usize) -> String>(
    current: usize,
    total: usize,
    url: F,
) -> Vec<PageLink> {
    let mut links = vec![];
    if total <= 1 {
        return links;
    }
    if current > 1 {
        links.push(PageLink {
            label: "«".to_string(),
            url: Some(url(current - 1)),
            current: false,
        });
    }
    for item in build_pagination_items(current, total) {
        match item {
            PaginationItem::Page(p) => links.push(PageLink {
                label: p.to_string(),
                url: Some(url(p)),
                current: p == current,
            }),
            PaginationItem::Gap => links.push(PageLink {
                label: "...".to_string(),
                url: None,
                current: false,
            }),
        }
    }
    if current < total {
        links.push(PageLink {
            label: "»".to_string(),
            url: Some(url(current + 1)),
            current: false,
        });
    }
    links
}
