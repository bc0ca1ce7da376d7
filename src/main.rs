use actix_multipart::form::MultipartFormConfig;
use actix_session::storage::CookieSessionStore;
use actix_session::SessionMiddleware;
use actix_web::cookie::Key;
use actix_web::middleware::TrailingSlash;
use actix_web::{middleware::DefaultHeaders, web::Data, web::FormConfig, App, HttpServer};
use agnelle::{access, control, dashboard, Settings};
use anyhow::Context as AnyhowContext;
use rand::{distributions, Rng};
use reqwest::header::{HeaderMap, HeaderValue};
use std::env;
use std::io::Write;
use std::time::Duration;
use store_api::ApiClient;

static DEFAULT_ACCEPT_ENCODING: &str = "br;q=1.0, gzip;q=0.6, deflate;q=0.4, *;q=0.2";

#[actix_web::main]
async fn main() -> Result<(), anyhow::Error> {
    if let Err(env::VarError::NotPresent) = env::var("RUST_LOG") {
        env::set_var("RUST_LOG", "INFO");
    }
    pretty_env_logger::formatted_timed_builder()
        .parse_default_env()
        .init();

    match std::fs::File::open(".env") {
        Ok(_) => envmnt::load_file(".env")?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            std::fs::File::create(".env")?;
            envmnt::load_file(".env")?;
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to open .env file: {err}"));
        }
    }

    let settings = Settings::from_env();
    log::info!("Using store API at {}", settings.api_base_url);

    let secret_key = match envmnt::get_parse("SESSION_KEY") {
        Ok(v) => v,
        Err(envmnt::errors::EnvmntError::Missing(_)) => {
            let key = rand::thread_rng()
                .sample_iter(distributions::Alphanumeric)
                .take(64)
                .map(char::from)
                .collect::<String>();
            let mut f = std::fs::File::options().append(true).open(".env")?;
            f.write_all(format!("\nSESSION_KEY={key}\n").as_bytes())?;
            key
        }
        Err(err) => {
            return Err(anyhow::anyhow!("Unable to read secret key: {err}"));
        }
    };
    let secret_key = Key::from(secret_key.as_bytes());

    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT_ENCODING,
        HeaderValue::from_static(DEFAULT_ACCEPT_ENCODING),
    );
    let client = reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(60))
        .use_rustls_tls()
        .default_headers(headers)
        .build()
        .context("Unable to build HTTP client")?;
    let api = ApiClient::new(&settings.api_base_url, client)
        .context("API_BASE_URL is not a valid URL")?;

    let bind = (settings.bind_addr.clone(), settings.port);
    let api = Data::new(api);
    let settings = Data::new(settings);

    HttpServer::new(move || {
        App::new()
            .app_data(FormConfig::default().limit(256 * 1024))
            .app_data(MultipartFormConfig::default().total_limit(20 * 1024 * 1024))
            .app_data(api.clone())
            .app_data(settings.clone())
            .wrap(DefaultHeaders::new().add(("X-Content-Type-Options", "nosniff")))
            .wrap(actix_web::middleware::Compress::default())
            .wrap(control::SessionMiddlewareFactory {})
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_http_only(true)
                    .cookie_secure(false)
                    .build(),
            )
            .wrap(actix_web::middleware::NormalizePath::new(
                TrailingSlash::Trim,
            ))
            .service(actix_files::Files::new("/static", "static"))
            .service(control::landing::index)
            .service(control::catalog::catalog)
            .service(access::controllers::log_in)
            .service(access::controllers::log_out)
            .service(access::controllers::login_page)
            .service(access::controllers::recovery_page)
            .service(access::controllers::send_recovery_email)
            .service(access::controllers::verify_recovery_code)
            .service(access::controllers::reset_password_page)
            .service(access::controllers::reset_password)
            .service(dashboard::index)
            .service(dashboard::todos::add_todo)
            .service(dashboard::todos::toggle_todo)
            .service(dashboard::todos::delete_todo)
            .service(dashboard::products::products_page)
            .service(dashboard::products::add_product_page)
            .service(dashboard::products::add_product)
            .service(dashboard::products::edit_product_page)
            .service(dashboard::products::edit_product)
            .service(dashboard::products::delete_product)
            .service(dashboard::categories::categories_page)
            .service(dashboard::categories::add_category_page)
            .service(dashboard::categories::add_category)
            .service(dashboard::categories::edit_category_page)
            .service(dashboard::categories::edit_category)
            .service(dashboard::categories::delete_category)
            .service(dashboard::media::media_page)
            .service(dashboard::media::upload_page)
            .service(dashboard::media::upload)
            .service(dashboard::media::delete)
            .service(dashboard::users::users_page)
            .default_service(actix_web::web::route().to(control::not_found))
    })
    .bind(&bind)
    .with_context(|| format!("Failed to bind server to {}:{}. Is the port already in use?", bind.0, bind.1))?
    .run()
    .await?;
    Ok(())
}
