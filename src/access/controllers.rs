use crate::access::{validate_code, validate_email, validate_new_password, RecoveryError};
use crate::control::{
    push_toast, render_template, see_other, take_toasts, Identity, Response, Toast, TOKEN_KEY,
};
use actix_session::Session;
use actix_web::{
    get, post,
    web::{Data, Form, Query},
};
use anyhow::Context as AnyhowContext;
use askama::Template;
use serde::Deserialize;
use store_api::ApiClient;

const RECOVERY_EMAIL_KEY: &str = "recovery_email";
const RECOVERY_CODE_KEY: &str = "recovery_code";

fn recovery_toast(err: RecoveryError) -> Toast {
    let toast = Toast::error(err.to_string());
    match err.description() {
        Some(d) => toast.describe(d),
        None => toast,
    }
}

#[derive(Deserialize)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

#[post("/login")]
pub async fn log_in(form: Form<LoginDto>, session: Session, api: Data<ApiClient>) -> Response {
    match api.login(form.email.trim(), &form.password).await {
        Ok(token) => {
            session.renew();
            session
                .insert(TOKEN_KEY, token)
                .context("Unable to insert token into session")?;
            Ok(see_other("/dashboard"))
        }
        Err(err) if err.is_rejection() => {
            log::info!("Login rejected for {}", form.email.trim());
            Ok(see_other("/login?invalid"))
        }
        Err(err) => {
            log::warn!("Unable to log in: {err}");
            push_toast(
                &session,
                Toast::error("❌ Erro ao entrar.").describe("Tente novamente mais tarde."),
            );
            Ok(see_other("/login"))
        }
    }
}

#[get("/logout")]
pub async fn log_out(session: Session) -> Response {
    session.clear();
    Ok(see_other("/login"))
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginPage {
    err: bool,
    toasts: Vec<Toast>,
}

#[derive(Deserialize)]
struct LoginQuery {
    invalid: Option<String>,
}

#[get("/login")]
pub async fn login_page(
    q: Query<LoginQuery>,
    identity: Option<Identity>,
    session: Session,
) -> Response {
    if identity.is_some() {
        return Ok(see_other("/dashboard"));
    }
    render_template(LoginPage {
        err: q.invalid.is_some(),
        toasts: take_toasts(&session),
    })
}

#[derive(Template)]
#[template(path = "recovery.html")]
struct RecoveryPage {
    email: Option<String>,
    toasts: Vec<Toast>,
}

#[get("/login/senha")]
pub async fn recovery_page(session: Session) -> Response {
    let email = session
        .get::<String>(RECOVERY_EMAIL_KEY)
        .context("Unable to read recovery e-mail from session")?;
    render_template(RecoveryPage {
        email,
        toasts: take_toasts(&session),
    })
}

#[derive(Deserialize)]
pub struct RecoveryEmailDto {
    pub email: String,
}

#[post("/login/senha")]
pub async fn send_recovery_email(
    form: Form<RecoveryEmailDto>,
    session: Session,
    api: Data<ApiClient>,
) -> Response {
    let email = match validate_email(&form.email) {
        Ok(e) => e,
        Err(err) => {
            push_toast(&session, recovery_toast(err));
            return Ok(see_other("/login/senha"));
        }
    };
    match api.send_recovery_email(email).await {
        Ok(()) => {
            session
                .insert(RECOVERY_EMAIL_KEY, email)
                .context("Unable to insert recovery e-mail into session")?;
            session.remove(RECOVERY_CODE_KEY);
            push_toast(
                &session,
                Toast::success("✅ E-mail enviado!")
                    .describe("Verifique seu e-mail para o código de confirmação."),
            );
        }
        Err(err) if err.is_rejection() => {
            push_toast(
                &session,
                Toast::error("❌ E-mail não encontrado.").describe("Este e-mail não está cadastrado."),
            );
        }
        Err(err) => {
            log::warn!("Unable to send recovery e-mail: {err}");
            push_toast(
                &session,
                Toast::error("❌ Erro ao enviar o código.").describe("Tente novamente mais tarde."),
            );
        }
    }
    Ok(see_other("/login/senha"))
}

#[derive(Deserialize)]
pub struct RecoveryCodeDto {
    pub code: String,
}

#[post("/login/senha/verificar")]
pub async fn verify_recovery_code(
    form: Form<RecoveryCodeDto>,
    session: Session,
    api: Data<ApiClient>,
) -> Response {
    let email = match session
        .get::<String>(RECOVERY_EMAIL_KEY)
        .context("Unable to read recovery e-mail from session")?
    {
        Some(e) => e,
        None => return Ok(see_other("/login/senha")),
    };
    let code = match validate_code(&form.code) {
        Ok(c) => c,
        Err(err) => {
            push_toast(&session, recovery_toast(err));
            return Ok(see_other("/login/senha"));
        }
    };
    match api.verify_recovery_code(&email, code).await {
        Ok(()) => {
            session
                .insert(RECOVERY_CODE_KEY, code)
                .context("Unable to insert recovery code into session")?;
            push_toast(
                &session,
                Toast::success("✅ Código verificado!").describe("Você pode agora redefinir sua senha."),
            );
            Ok(see_other("/login/senha/redefinir-senha"))
        }
        Err(err) if err.is_rejection() => {
            push_toast(
                &session,
                Toast::error("❌ Código inválido.")
                    .describe("O código informado é incorreto. Tente novamente."),
            );
            Ok(see_other("/login/senha"))
        }
        Err(err) => {
            log::warn!("Unable to verify recovery code: {err}");
            push_toast(
                &session,
                Toast::error("❌ Erro na verificação.").describe("Tente novamente mais tarde."),
            );
            Ok(see_other("/login/senha"))
        }
    }
}

/// E-mail and verified code carried between the recovery steps.
fn recovery_state(session: &Session) -> Result<Option<(String, String)>, anyhow::Error> {
    let email = session
        .get::<String>(RECOVERY_EMAIL_KEY)
        .context("Unable to read recovery e-mail from session")?;
    let code = session
        .get::<String>(RECOVERY_CODE_KEY)
        .context("Unable to read recovery code from session")?;
    Ok(email.zip(code))
}

#[derive(Template)]
#[template(path = "reset_password.html")]
struct ResetPasswordPage {
    email: String,
    toasts: Vec<Toast>,
}

#[get("/login/senha/redefinir-senha")]
pub async fn reset_password_page(session: Session) -> Response {
    match recovery_state(&session)? {
        Some((email, _)) => render_template(ResetPasswordPage {
            email,
            toasts: take_toasts(&session),
        }),
        None => Ok(see_other("/login/senha")),
    }
}

#[derive(Deserialize)]
pub struct ResetPasswordDto {
    pub password: String,
    pub confirm_password: String,
}

#[post("/login/senha/redefinir-senha")]
pub async fn reset_password(
    form: Form<ResetPasswordDto>,
    session: Session,
    api: Data<ApiClient>,
) -> Response {
    let (email, code) = match recovery_state(&session)? {
        Some(state) => state,
        None => return Ok(see_other("/login/senha")),
    };
    let password = match validate_new_password(&form.password, &form.confirm_password) {
        Ok(p) => p,
        Err(err) => {
            push_toast(&session, recovery_toast(err));
            return Ok(see_other("/login/senha/redefinir-senha"));
        }
    };
    match api.reset_password(&email, &code, password).await {
        Ok(()) => {
            session.remove(RECOVERY_EMAIL_KEY);
            session.remove(RECOVERY_CODE_KEY);
            push_toast(
                &session,
                Toast::success("✅ Senha alterada com sucesso!")
                    .describe("Agora você pode fazer login com sua nova senha."),
            );
            Ok(see_other("/login"))
        }
        Err(err) => {
            log::warn!("Unable to reset password: {err}");
            push_toast(
                &session,
                Toast::error("❌ Erro ao alterar a senha.").describe("Tente novamente mais tarde."),
            );
            Ok(see_other("/login/senha/redefinir-senha"))
        }
    }
}
