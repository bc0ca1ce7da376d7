use crate::control::{push_toast, render_template, see_other, take_toasts, Identity, Response, Toast};
use crate::dashboard::products::Choice;
use crate::dashboard::{report, section, Table, TableQuery};
use actix_session::Session;
use actix_web::{
    get, post,
    web::{Data, Form, Path, Query},
};
use askama::Template;
use serde::Deserialize;
use store_api::ApiClient;
use store_types::category::{Category, CategoryDraft, CategoryDraftError};
use store_types::display_date;

const LIST_URL: &str = "/dashboard/categorias";
const ADD_URL: &str = "/dashboard/categorias/adicionar-categoria";

fn edit_url(slug: &str) -> String {
    format!("/dashboard/categorias/editar-categoria/{slug}")
}

fn draft_error_toast(err: CategoryDraftError) -> Toast {
    match err {
        CategoryDraftError::MissingName => {
            Toast::error("❌ Erro").describe("Por favor, informe o nome da categoria.")
        }
        CategoryDraftError::MissingImage => {
            Toast::error("❌ Erro").describe("Por favor, selecione uma imagem para a categoria.")
        }
    }
}

pub struct CategoryRow {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub date: String,
}

impl From<Category> for CategoryRow {
    fn from(c: Category) -> Self {
        Self {
            date: display_date(&c.date),
            id: c.id,
            name: c.name,
            slug: c.category_slug,
            image: c.image,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard/categories.html")]
struct CategoriesPage {
    table: Table<CategoryRow>,
    toasts: Vec<Toast>,
}

#[get("/dashboard/categorias")]
pub async fn categories_page(
    _identity: Identity,
    query: Query<TableQuery>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let mut toasts = take_toasts(&session);
    let categories = section(
        &mut toasts,
        api.categories().await,
        Toast::error("❌ Erro").describe("Não foi possível carregar as categorias"),
    )?;
    let rows = categories
        .into_iter()
        .map(CategoryRow::from)
        .collect::<Vec<_>>();
    render_template(CategoriesPage {
        table: Table::new(rows, |r| r.name.as_str(), &query, LIST_URL),
        toasts,
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
}

#[derive(Template)]
#[template(path = "dashboard/category_form.html")]
struct CategoryFormPage {
    heading: String,
    action: String,
    name: String,
    images: Vec<Choice>,
    toasts: Vec<Toast>,
}

impl CategoryFormPage {
    fn new(heading: &str, action: String, current: CategoryDto, library: Vec<String>, toasts: Vec<Toast>) -> Self {
        let mut all_images = library;
        if !current.image.is_empty() && !all_images.contains(&current.image) {
            all_images.push(current.image.clone());
        }
        let images = all_images
            .into_iter()
            .map(|value| Choice {
                checked: value == current.image,
                value,
            })
            .collect();
        Self {
            heading: heading.to_string(),
            action,
            name: current.name,
            images,
            toasts,
        }
    }
}

#[get("/dashboard/categorias/adicionar-categoria")]
pub async fn add_category_page(identity: Identity, api: Data<ApiClient>, session: Session) -> Response {
    let mut toasts = take_toasts(&session);
    let images = section(
        &mut toasts,
        api.images(&identity.token).await,
        Toast::error("❌ Erro").describe("Não foi possível carregar as imagens."),
    )?;
    render_template(CategoryFormPage::new(
        "Adicionar categoria",
        ADD_URL.to_string(),
        CategoryDto::default(),
        images,
        toasts,
    ))
}

#[post("/dashboard/categorias/adicionar-categoria")]
pub async fn add_category(
    identity: Identity,
    form: Form<CategoryDto>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let draft = match CategoryDraft::validate(&form.name, &form.image) {
        Ok(d) => d,
        Err(err) => {
            push_toast(&session, draft_error_toast(err));
            return Ok(see_other(ADD_URL));
        }
    };
    let created = report(
        &session,
        api.create_category(&identity.token, &draft).await,
        Toast::success("✅ Sucesso").describe("Categoria adicionada com sucesso!"),
        Toast::error("❌ Erro ao adicionar categoria.")
            .describe("Ocorreu um erro ao adicionar categoria. Tente novamente."),
    )?;
    match created {
        Some(()) => Ok(see_other(LIST_URL)),
        None => Ok(see_other(ADD_URL)),
    }
}

#[get("/dashboard/categorias/editar-categoria/{slug}")]
pub async fn edit_category_page(
    identity: Identity,
    slug: Path<String>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let category = api.category(&identity.token, &slug).await?;
    let mut toasts = take_toasts(&session);
    let images = section(
        &mut toasts,
        api.images(&identity.token).await,
        Toast::error("❌ Erro").describe("Não foi possível carregar as imagens."),
    )?;
    render_template(CategoryFormPage::new(
        "Editar categoria",
        edit_url(&slug),
        CategoryDto {
            name: category.name,
            image: category.image,
        },
        images,
        toasts,
    ))
}

#[post("/dashboard/categorias/editar-categoria/{slug}")]
pub async fn edit_category(
    identity: Identity,
    slug: Path<String>,
    form: Form<CategoryDto>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let draft = match CategoryDraft::validate(&form.name, &form.image) {
        Ok(d) => d,
        Err(err) => {
            push_toast(&session, draft_error_toast(err));
            return Ok(see_other(&edit_url(&slug)));
        }
    };
    let updated = report(
        &session,
        api.update_category(&identity.token, &slug, &draft).await,
        Toast::success("✅ Sucesso").describe("Categoria atualizada com sucesso!"),
        Toast::error("❌ Erro ao atualizar categoria.")
            .describe("Ocorreu um erro ao atualizar a categoria. Tente novamente."),
    )?;
    match updated {
        Some(()) => Ok(see_other(LIST_URL)),
        None => Ok(see_other(&edit_url(&slug))),
    }
}

#[post("/dashboard/categorias/{id}/excluir")]
pub async fn delete_category(
    identity: Identity,
    id: Path<String>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    report(
        &session,
        api.delete_category(&identity.token, &id).await,
        Toast::success("✅ Categoria excluída com sucesso!"),
        Toast::error("❌ Erro ao deletar categoria.").describe("Tente novamente mais tarde."),
    )?;
    Ok(see_other(LIST_URL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_image_is_checked_and_kept() {
        let page = CategoryFormPage::new(
            "Editar categoria",
            edit_url("bolsas"),
            CategoryDto {
                name: "Bolsas".to_string(),
                image: "https://api/img/old.webp".to_string(),
            },
            vec!["https://api/img/new.webp".to_string()],
            vec![],
        );
        let checked = page
            .images
            .iter()
            .filter(|c| c.checked)
            .map(|c| c.value.as_str())
            .collect::<Vec<_>>();
        assert_eq!(checked, ["https://api/img/old.webp"]);
        assert_eq!(page.images.len(), 2);
        assert_eq!(page.action, "/dashboard/categorias/editar-categoria/bolsas");
    }

    #[test]
    fn missing_image_toast_matches_form_rule() {
        let toast = draft_error_toast(CategoryDraftError::MissingImage);
        assert!(toast.is_error());
        assert_eq!(
            toast.description.as_deref(),
            Some("Por favor, selecione uma imagem para a categoria.")
        );
    }

    #[test]
    fn row_uses_display_date() {
        let c: Category = serde_json::from_value(serde_json::json!({
            "id": 4, "name": "Chaveiros", "categorySlug": "chaveiros",
            "date": "2024-12-25", "image": "https://api/img/c.webp"
        }))
        .expect("category");
        let row = CategoryRow::from(c);
        assert_eq!(row.id, "4");
        assert_eq!(row.date, "25/12/2024");
    }
}
