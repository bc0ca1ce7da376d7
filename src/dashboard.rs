//! Staff dashboard. Every handler here requires an [`Identity`]; every
//! mutation answers with a redirect and a flash toast.
//!
//! [`Identity`]: crate::control::Identity

use crate::control::{
    compact_page_links, push_toast, render_template, take_toasts, ControllerError, Identity,
    PageLink, Response, Toast,
};
use crate::{empty_string_as_none, empty_string_as_none_parse};
use actix_session::Session;
use actix_web::get;
use actix_web::web::Data;
use askama::Template;
use serde::Deserialize;
use store_api::{ApiClient, ApiError};
use store_types::fold;
use store_types::todo::Todo;
use url::form_urlencoded;

pub mod categories;
pub mod media;
pub mod products;
pub mod todos;
pub mod users;

pub const ROWS_PER_PAGE: usize = 10;

/// `?filtro=&page=` of the dashboard tables.
#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub filtro: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none_parse")]
    pub page: Option<usize>,
}

/// One page of a name-filtered table.
pub struct Table<T> {
    pub rows: Vec<T>,
    pub filter: String,
    pub total: usize,
    pub page_links: Vec<PageLink>,
}

impl<T> Table<T> {
    pub fn new<F: Fn(&T) -> &str>(items: Vec<T>, name: F, query: &TableQuery, base: &str) -> Self {
        let filter = query.filtro.clone().unwrap_or_default();
        let needle = fold(filter.trim());
        let matching = items
            .into_iter()
            .filter(|i| needle.is_empty() || fold(name(i)).contains(&needle))
            .collect::<Vec<_>>();
        let total = matching.len();
        let pages = total.div_ceil(ROWS_PER_PAGE).max(1);
        let page = query.page.unwrap_or(1).clamp(1, pages);
        let rows = matching
            .into_iter()
            .skip((page - 1) * ROWS_PER_PAGE)
            .take(ROWS_PER_PAGE)
            .collect();
        let page_links = compact_page_links(page, pages, |p| {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            if !filter.trim().is_empty() {
                serializer.append_pair("filtro", &filter);
            }
            serializer.append_pair("page", &p.to_string());
            format!("{base}?{}", serializer.finish())
        });
        Self {
            rows,
            filter,
            total,
            page_links,
        }
    }
}

/// Turns the outcome of a dashboard mutation into a toast. An expired
/// token is passed on so that the request ends up on the login page.
pub fn report<T>(
    session: &Session,
    result: Result<T, ApiError>,
    success: Toast,
    failure: Toast,
) -> Result<Option<T>, ControllerError> {
    match result {
        Ok(v) => {
            push_toast(session, success);
            Ok(Some(v))
        }
        Err(ApiError::Unauthorized) => Err(ControllerError::Unauthorized),
        Err(err) => {
            log::warn!("{}: {err}", failure.message);
            push_toast(session, failure);
            Ok(None)
        }
    }
}

/// Reads a dashboard section. A failed read renders the section empty with
/// an error toast on the current page; an expired token is passed on.
pub fn section<T: Default>(
    toasts: &mut Vec<Toast>,
    result: Result<T, ApiError>,
    failure: Toast,
) -> Result<T, ControllerError> {
    match result {
        Ok(v) => Ok(v),
        Err(ApiError::Unauthorized) => Err(ControllerError::Unauthorized),
        Err(err) => {
            log::warn!("{}: {err}", failure.message);
            toasts.push(failure);
            Ok(T::default())
        }
    }
}

pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

#[derive(Template)]
#[template(path = "dashboard/index.html")]
struct DashboardPage {
    todos: Vec<Todo>,
    images: Vec<String>,
    category_counts: Vec<CategoryCount>,
    toasts: Vec<Toast>,
}

#[get("/dashboard")]
pub async fn index(identity: Identity, api: Data<ApiClient>, session: Session) -> Response {
    let token = &identity.token;
    let mut toasts = take_toasts(&session);
    let todos = section(
        &mut toasts,
        api.todos(token).await,
        Toast::error("Erro").describe("Não foi possível carregar as tarefas."),
    )?;
    let images = section(
        &mut toasts,
        api.images(token).await,
        Toast::error("❌ Erro").describe("Não foi possível carregar as imagens."),
    )?;
    let (products, categories) = section(
        &mut toasts,
        api.catalog().await,
        Toast::error("❌ Erro ao carregar categorias")
            .describe("Não foi possível carregar as categorias disponíveis."),
    )?;
    let category_counts = categories
        .iter()
        .map(|c| {
            let folded = fold(&c.name);
            CategoryCount {
                name: c.name.clone(),
                count: products.iter().filter(|p| p.has_category(&folded)).count(),
            }
        })
        .collect();
    render_template(DashboardPage {
        todos,
        images,
        category_counts,
        toasts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("Bolsa {i}")).collect()
    }

    #[test]
    fn table_pages_by_ten() {
        let q = TableQuery {
            filtro: None,
            page: Some(2),
        };
        let t = Table::new(names(25), |s| s.as_str(), &q, "/dashboard/produtos");
        assert_eq!(t.total, 25);
        assert_eq!(t.rows.len(), 10);
        assert_eq!(t.rows[0], "Bolsa 11");
        assert_eq!(
            t.page_links.last().and_then(|l| l.url.as_deref()),
            Some("/dashboard/produtos?page=3")
        );
    }

    #[test]
    fn table_filters_by_folded_name() {
        let items = vec!["Chaveiro Coração".to_string(), "Bolsa".to_string()];
        let q = TableQuery {
            filtro: Some("coracao".to_string()),
            page: None,
        };
        let t = Table::new(items, |s| s.as_str(), &q, "/dashboard/produtos");
        assert_eq!(t.rows, ["Chaveiro Coração"]);
        assert!(t.page_links.is_empty());
    }

    #[test]
    fn table_clamps_page_into_range() {
        let q = TableQuery {
            filtro: Some("bolsa".to_string()),
            page: Some(9),
        };
        let t = Table::new(names(12), |s| s.as_str(), &q, "/x");
        assert_eq!(t.rows.len(), 2);
        assert!(t
            .page_links
            .iter()
            .any(|l| l.current && l.url.as_deref() == Some("/x?filtro=bolsa&page=2")));
    }

    #[test]
    fn expired_token_is_not_swallowed_by_sections() {
        let mut toasts = vec![];
        let res: Result<Vec<Todo>, _> = section(&mut toasts, Err(ApiError::Unauthorized), Toast::error("x"));
        assert!(matches!(res, Err(ControllerError::Unauthorized)));
        let res: Result<Vec<Todo>, _> = section(&mut toasts, Err(ApiError::NotFound), Toast::error("x"));
        assert!(matches!(res, Ok(v) if v.is_empty()));
        assert_eq!(toasts.len(), 1);
    }
}
