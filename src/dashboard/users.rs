use crate::control::{render_template, take_toasts, ControllerError, Identity, Response, Toast};
use actix_session::Session;
use actix_web::{get, web::Data};
use askama::Template;
use store_api::{ApiClient, ApiError};
use store_types::user::Profile;

#[derive(Template)]
#[template(path = "dashboard/users.html")]
struct UsersPage {
    users: Vec<Profile>,
    error: Option<String>,
    toasts: Vec<Toast>,
}

/// Splits a failed listing into the inline message and the toast shown
/// next to it.
fn listing_error(err: &ApiError) -> (String, Toast) {
    let inline = match err {
        ApiError::Forbidden => "Acesso negado. Verifique seu token de autenticação.",
        _ => "Falha ao carregar usuários.",
    };
    let description = err
        .api_message()
        .unwrap_or("Não foi possível carregar os usuários");
    (inline.to_string(), Toast::error("❌ Erro").describe(description))
}

#[get("/dashboard/usuarios")]
pub async fn users_page(identity: Identity, api: Data<ApiClient>, session: Session) -> Response {
    let mut toasts = take_toasts(&session);
    let (users, error) = match api.users(&identity.token).await {
        Ok(users) => (users, None),
        Err(ApiError::Unauthorized) => return Err(ControllerError::Unauthorized),
        Err(err) => {
            log::warn!("Unable to list users: {err}");
            let (inline, toast) = listing_error(&err);
            toasts.push(toast);
            (vec![], Some(inline))
        }
    };
    render_template(UsersPage {
        users,
        error,
        toasts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_listing_asks_to_check_token() {
        let (inline, toast) = listing_error(&ApiError::Forbidden);
        assert_eq!(inline, "Acesso negado. Verifique seu token de autenticação.");
        assert!(toast.is_error());
    }

    #[test]
    fn other_failures_prefer_api_message() {
        let err = ApiError::Status {
            status: 500,
            message: "banco indisponível".to_string(),
        };
        let (inline, toast) = listing_error(&err);
        assert_eq!(inline, "Falha ao carregar usuários.");
        assert_eq!(toast.description.as_deref(), Some("banco indisponível"));
    }
}
