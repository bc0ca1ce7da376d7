use crate::control::{see_other, Identity, Response, Toast};
use crate::dashboard::report;
use actix_session::Session;
use actix_web::{
    post,
    web::{Data, Form, Path},
};
use serde::Deserialize;
use store_api::ApiClient;
use store_types::todo::{Todo, TodoPayload};

#[derive(Deserialize)]
pub struct NewTodoDto {
    pub title: String,
}

#[post("/dashboard/todos")]
pub async fn add_todo(
    identity: Identity,
    form: Form<NewTodoDto>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let Some(todo) = TodoPayload::new(&form.title) else {
        return Ok(see_other("/dashboard"));
    };
    report(
        &session,
        api.create_todo(&identity.token, &todo).await,
        Toast::success("Tarefa atualizada!").describe("Sua lista de tarefas foi atualizada com sucesso."),
        Toast::error("Erro").describe("Houve um problema ao adicionar a tarefa."),
    )?;
    Ok(see_other("/dashboard"))
}

/// Current state of the todo as rendered, so the toggle can be sent
/// without reading the list back first.
#[derive(Deserialize)]
pub struct ToggleTodoDto {
    pub title: String,
    #[serde(default)]
    pub checked: bool,
}

#[post("/dashboard/todos/{id}/toggle")]
pub async fn toggle_todo(
    identity: Identity,
    id: Path<String>,
    form: Form<ToggleTodoDto>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    let ToggleTodoDto { title, checked } = form.into_inner();
    let todo = Todo {
        id: id.into_inner(),
        title,
        checked,
    };
    report(
        &session,
        api.update_todo(&identity.token, &todo.id, &todo.toggled()).await,
        Toast::success("Tarefa atualizada!").describe("Sua lista de tarefas foi atualizada com sucesso."),
        Toast::error("Erro").describe("Houve um erro ao atualizar a tarefa."),
    )?;
    Ok(see_other("/dashboard"))
}

#[post("/dashboard/todos/{id}/delete")]
pub async fn delete_todo(
    identity: Identity,
    id: Path<String>,
    api: Data<ApiClient>,
    session: Session,
) -> Response {
    report(
        &session,
        api.delete_todo(&identity.token, &id).await,
        Toast::success("Tarefa atualizada!").describe("Sua lista de tarefas foi atualizada com sucesso."),
        Toast::error("Erro").describe("Houve um problema ao deletar a tarefa."),
    )?;
    Ok(see_other("/dashboard"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchecked_box_is_absent_from_form() {
        let dto: ToggleTodoDto = serde_json::from_str(r#"{"title": "Comprar linha"}"#).expect("dto");
        assert!(!dto.checked);
        let todo = Todo {
            id: "1".to_string(),
            title: dto.title,
            checked: dto.checked,
        };
        assert!(todo.toggled().checked);
    }
}
