use crate::control::{push_toast, render_template, see_other, take_toasts, Identity, Response, Toast};
use crate::dashboard::{report, section};
use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_session::Session;
use actix_web::{
    get, post,
    web::{Data, Form},
};
use anyhow::Context;
use askama::Template;
use mime::IMAGE;
use serde::Deserialize;
use store_api::ApiClient;

const LIST_URL: &str = "/dashboard/midias";

#[derive(Template)]
#[template(path = "dashboard/media.html")]
struct MediaPage {
    images: Vec<String>,
    toasts: Vec<Toast>,
}

#[get("/dashboard/midias")]
pub async fn media_page(identity: Identity, api: Data<ApiClient>, session: Session) -> Response {
    let mut toasts = take_toasts(&session);
    let images = section(
        &mut toasts,
        api.images(&identity.token).await,
        Toast::error("❌ Erro").describe("Não foi possível carregar as imagens."),
    )?;
    render_template(MediaPage { images, toasts })
}

#[derive(Template)]
#[template(path = "dashboard/media_upload.html")]
struct MediaUploadPage {
    toasts: Vec<Toast>,
}

#[get("/dashboard/midias/adicionar-midia")]
pub async fn upload_page(_identity: Identity, session: Session) -> Response {
    render_template(MediaUploadPage {
        toasts: take_toasts(&session),
    })
}

#[derive(MultipartForm, Debug)]
pub struct UploadForm {
    file: TempFile,
    back: Option<Text<String>>,
}

/// Where to land after an upload; only dashboard pages are accepted.
fn back_location(back: Option<&str>) -> &str {
    match back {
        Some(b) if b == "/dashboard" || b.starts_with("/dashboard/") => b,
        _ => LIST_URL,
    }
}

#[post("/dashboard/midias/adicionar-midia")]
pub async fn upload(
    identity: Identity,
    form: MultipartForm<UploadForm>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let UploadForm { file, back } = form.into_inner();
    let back = back.map(|b| b.into_inner());
    let back = back_location(back.as_deref());
    let file_name = match file.file_name.clone().filter(|n| !n.trim().is_empty()) {
        Some(name) if file.size > 0 => name,
        _ => {
            push_toast(
                &session,
                Toast::error("❌ Erro").describe("Por favor, selecione uma imagem para enviar."),
            );
            return Ok(see_other(back));
        }
    };
    if let Some(content_type) = &file.content_type {
        if content_type.type_() != IMAGE {
            push_toast(
                &session,
                Toast::error("❌ Erro ao enviar imagem").describe("Apenas imagens são aceitas."),
            );
            return Ok(see_other(back));
        }
    }
    let bytes = tokio::fs::read(file.file.path())
        .await
        .context("Unable to read uploaded file")?;
    let mime = file.content_type.as_ref().map(|m| m.essence_str().to_string());
    report(
        &session,
        api.upload_image(&identity.token, file_name, mime.as_deref(), bytes)
            .await,
        Toast::success("✅ Sucesso").describe("Imagem carregada com sucesso!"),
        Toast::error("❌ Erro ao enviar imagem").describe("Esta imagem já existe. Tente novamente."),
    )?;
    Ok(see_other(back))
}

#[derive(Deserialize)]
pub struct DeleteMediaDto {
    pub url: String,
}

#[post("/dashboard/midias/excluir")]
pub async fn delete(
    identity: Identity,
    form: Form<DeleteMediaDto>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    report(
        &session,
        api.delete_image(&identity.token, &form.url).await,
        Toast::success("✅ Imagem excluída com sucesso!").describe("A imagem foi removida da biblioteca."),
        Toast::error("❌ Erro ao excluir imagem.").describe("Tente novamente mais tarde."),
    )?;
    Ok(see_other(LIST_URL))
}
