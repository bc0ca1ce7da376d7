use crate::control::{render_template, see_other, take_toasts, Identity, Response, Toast};
use crate::dashboard::{report, section, Table, TableQuery};
use actix_session::Session;
use actix_web::{
    get, post,
    web::{Bytes, Data, Path, Query},
};
use askama::Template;
use store_api::ApiClient;
use store_types::category::Category;
use store_types::display_date;
use store_types::price::Brl;
use store_types::product::{FieldError, Product, ProductDraft};
use url::form_urlencoded;

const LIST_URL: &str = "/dashboard/produtos";
const ADD_URL: &str = "/dashboard/produtos/adicionar-produto";

pub struct ProductRow {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub price: Brl,
    pub categories: String,
    pub date: String,
    pub image: Option<String>,
    pub image_count: usize,
}

/// Image paths stored relative to the API are served from the API host.
fn absolute_image(api_base: &str, image: &str) -> String {
    if image.starts_with("http") {
        image.to_string()
    } else {
        format!("{api_base}/{}", image.trim_start_matches('/'))
    }
}

impl ProductRow {
    fn new(p: Product, api_base: &str) -> Self {
        Self {
            id: p.id,
            price: p.effective_price().brl(),
            categories: p.categories.join(", "),
            date: display_date(&p.date),
            image: p.images.first().map(|i| absolute_image(api_base, i)),
            image_count: p.images.len(),
            name: p.name,
            slug: p.slug,
        }
    }
}

#[derive(Template)]
#[template(path = "dashboard/products.html")]
struct ProductsPage {
    table: Table<ProductRow>,
    toasts: Vec<Toast>,
}

#[get("/dashboard/produtos")]
pub async fn products_page(
    _identity: Identity,
    query: Query<TableQuery>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let mut toasts = take_toasts(&session);
    let products = section(
        &mut toasts,
        api.products().await,
        Toast::error("❌ Erro").describe("Não foi possível carregar os produtos."),
    )?;
    let rows = products
        .into_iter()
        .map(|p| ProductRow::new(p, api.base_url()))
        .collect::<Vec<_>>();
    render_template(ProductsPage {
        table: Table::new(rows, |r| r.name.as_str(), &query, LIST_URL),
        toasts,
    })
}

/// Raw product form as posted. Images and categories arrive as repeated
/// fields, one per ticked checkbox.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub size: String,
    pub price: String,
    pub images: Vec<String>,
    pub categories: Vec<String>,
}

impl ProductForm {
    pub fn parse(body: &[u8]) -> Self {
        let mut form = ProductForm::default();
        for (key, value) in form_urlencoded::parse(body) {
            match key.as_ref() {
                "name" => form.name = value.into_owned(),
                "size" => form.size = value.into_owned(),
                "price" => form.price = value.into_owned(),
                "images" => form.images.push(value.into_owned()),
                "categories" => form.categories.push(value.into_owned()),
                _ => (),
            }
        }
        form
    }

    fn from_product(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            size: p.size.clone(),
            price: p.price.brl().amount(),
            images: p.images.clone(),
            categories: p.categories.clone(),
        }
    }

    pub fn validate(&self) -> Result<ProductDraft, Vec<FieldError>> {
        ProductDraft::validate(
            &self.name,
            &self.size,
            &self.price,
            self.images.clone(),
            self.categories.clone(),
        )
    }
}

pub struct Choice {
    pub value: String,
    pub checked: bool,
}

#[derive(Template)]
#[template(path = "dashboard/product_form.html")]
struct ProductFormPage {
    heading: String,
    action: String,
    form: ProductForm,
    images: Vec<Choice>,
    categories: Vec<Choice>,
    errors: Vec<FieldError>,
    toasts: Vec<Toast>,
}

impl ProductFormPage {
    fn new(
        heading: &str,
        action: String,
        form: ProductForm,
        library: Vec<String>,
        categories: &[Category],
        errors: Vec<FieldError>,
        toasts: Vec<Toast>,
    ) -> Self {
        // Current images stay pickable even when missing from the library
        let mut all_images = library;
        for image in &form.images {
            if !all_images.contains(image) {
                all_images.push(image.clone());
            }
        }
        let images = all_images
            .into_iter()
            .map(|value| Choice {
                checked: form.images.contains(&value),
                value,
            })
            .collect();
        let categories = categories
            .iter()
            .map(|c| Choice {
                checked: form.categories.contains(&c.name),
                value: c.name.clone(),
            })
            .collect();
        Self {
            heading: heading.to_string(),
            action,
            form,
            images,
            categories,
            errors,
            toasts,
        }
    }
}

/// Media library and category list the product form picks from.
async fn form_choices(
    api: &ApiClient,
    identity: &Identity,
    toasts: &mut Vec<Toast>,
) -> Result<(Vec<String>, Vec<Category>), crate::control::ControllerError> {
    let images = section(
        toasts,
        api.images(&identity.token).await,
        Toast::error("❌ Erro").describe("Não foi possível carregar as imagens."),
    )?;
    let categories = section(
        toasts,
        api.categories().await,
        Toast::error("❌ Erro ao carregar categorias")
            .describe("Não foi possível carregar as categorias disponíveis."),
    )?;
    Ok((images, categories))
}

#[get("/dashboard/produtos/adicionar-produto")]
pub async fn add_product_page(identity: Identity, api: Data<ApiClient>, session: Session) -> Response {
    let mut toasts = take_toasts(&session);
    let (images, categories) = form_choices(&api, &identity, &mut toasts).await?;
    render_template(ProductFormPage::new(
        "Novo produto",
        ADD_URL.to_string(),
        ProductForm::default(),
        images,
        &categories,
        vec![],
        toasts,
    ))
}

#[post("/dashboard/produtos/adicionar-produto")]
pub async fn add_product(
    identity: Identity,
    body: Bytes,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let form = ProductForm::parse(&body);
    let mut toasts = vec![];
    let (images, categories) = form_choices(&api, &identity, &mut toasts).await?;
    let draft = match form.validate() {
        Ok(d) => d,
        Err(errors) => {
            return render_template(ProductFormPage::new(
                "Novo produto",
                ADD_URL.to_string(),
                form,
                images,
                &categories,
                errors,
                toasts,
            ))
        }
    };
    let created = report(
        &session,
        api.create_product(&identity.token, &draft.into_new(&categories))
            .await,
        Toast::success("✅ Produto publicado com sucesso!"),
        Toast::error("❌ Erro ao publicar produto.").describe(
            "Este produto já existe ou não pode ser adicionado. Tente novamente mais tarde.",
        ),
    )?;
    match created {
        Some(()) => Ok(see_other(LIST_URL)),
        None => {
            // Refused by the API; keep what was typed
            toasts.extend(take_toasts(&session));
            render_template(ProductFormPage::new(
                "Novo produto",
                ADD_URL.to_string(),
                form,
                images,
                &categories,
                vec![],
                toasts,
            ))
        }
    }
}

fn edit_url(slug: &str) -> String {
    format!("/dashboard/produtos/editar-produto/{slug}")
}

#[get("/dashboard/produtos/editar-produto/{slug}")]
pub async fn edit_product_page(
    identity: Identity,
    slug: Path<String>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let product = api.product(&slug).await?;
    let mut toasts = take_toasts(&session);
    let (images, categories) = form_choices(&api, &identity, &mut toasts).await?;
    render_template(ProductFormPage::new(
        "Editar produto",
        edit_url(&slug),
        ProductForm::from_product(&product),
        images,
        &categories,
        vec![],
        toasts,
    ))
}

#[post("/dashboard/produtos/editar-produto/{slug}")]
pub async fn edit_product(
    identity: Identity,
    slug: Path<String>,
    body: Bytes,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let form = ProductForm::parse(&body);
    let draft = match form.validate() {
        Ok(d) => d,
        Err(errors) => {
            let mut toasts = vec![];
            let (images, categories) = form_choices(&api, &identity, &mut toasts).await?;
            return render_template(ProductFormPage::new(
                "Editar produto",
                edit_url(&slug),
                form,
                images,
                &categories,
                errors,
                toasts,
            ));
        }
    };
    let updated = report(
        &session,
        api.update_product(&identity.token, &slug, &draft.into_update())
            .await,
        Toast::success("✅ Produto atualizado com sucesso!"),
        Toast::error("❌ Erro ao atualizar produto.").describe("Tente novamente mais tarde."),
    )?;
    match updated {
        Some(()) => Ok(see_other(LIST_URL)),
        None => {
            let mut toasts = take_toasts(&session);
            let (images, categories) = form_choices(&api, &identity, &mut toasts).await?;
            render_template(ProductFormPage::new(
                "Editar produto",
                edit_url(&slug),
                form,
                images,
                &categories,
                vec![],
                toasts,
            ))
        }
    }
}

#[post("/dashboard/produtos/{id}/excluir")]
pub async fn delete_product(
    identity: Identity,
    id: Path<u64>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    report(
        &session,
        api.delete_product(&identity.token, *id).await,
        Toast::success("✅ Produto excluído com sucesso!"),
        Toast::error("❌ Erro ao deletar Produto.").describe("Tente novamente mais tarde."),
    )?;
    Ok(see_other(LIST_URL))
}
