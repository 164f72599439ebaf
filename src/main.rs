use std::sync::Arc;
use std::{env, str::FromStr};

use actix_identity::IdentityMiddleware;
use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::{
    cookie::Key,
    middleware,
    web::{self, Data},
    App, HttpResponse, HttpServer,
};
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
    SqlitePool,
};

mod actions;
mod db;
mod errors;
mod routes;
mod seed;
mod structs;
mod utils;
mod validation;

/// Signal that cached data for a view path is stale. The server has no
/// materialised view cache of its own, so the default implementation only
/// logs; tests swap in a recording one.
pub trait PathInvalidator: Send + Sync {
    fn invalidate(&self, path: &str);
}

pub struct LogInvalidator;

impl PathInvalidator for LogInvalidator {
    fn invalidate(&self, path: &str) {
        log::debug!("view data for {path} marked stale");
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub invalidator: Arc<dyn PathInvalidator>,
}

fn get_session_key() -> Key {
    let key_str = env::var("SESSION_KEY").unwrap_or_else(|_| {
        log::error!("FATAL: SESSION_KEY environment variable not set");
        std::process::exit(1);
    });
    Key::from(key_str.as_bytes())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://acme_dashboard.db".to_owned());

    let opts = SqliteConnectOptions::from_str(&database_url)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .read_only(false)
        .busy_timeout(std::time::Duration::from_secs(5));

    let db_pool = SqlitePool::connect_with(opts)
        .await
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    sqlx::migrate!().run(&db_pool).await.expect("Migrate Error");

    info!("Database migrated successfully");

    // `acme-dashboard seed` loads the fixture data and exits.
    if env::args().nth(1).as_deref() == Some("seed") {
        seed::run(&db_pool).await?;
        return Ok(());
    }

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());

    info!("Starting HTTP server on http://{bind_addr}/");

    HttpServer::new(move || {
        App::new()
            // enable automatic response compression - usually register this first
            .wrap(middleware::Compress::default())
            .wrap(IdentityMiddleware::default())
            .wrap(SessionMiddleware::new(
                CookieSessionStore::default(),
                get_session_key(),
            ))
            // enable logger - always register Actix Web Logger middleware last
            .wrap(middleware::Logger::default())
            .service(routes::dashboard_handler)
            .service(routes::invoices_handler)
            .service(routes::edit_invoice_handler)
            .service(routes::customers_handler)
            .service(routes::create_invoice_handler)
            .service(routes::update_invoice_handler)
            .service(routes::delete_invoice_handler)
            .service(routes::login_handler)
            .service(routes::logout_handler)
            .app_data(Data::new(AppState {
                db_pool: db_pool.clone(),
                invalidator: Arc::new(LogInvalidator),
            }))
            .default_service(web::to(default_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}

async fn default_handler() -> HttpResponse {
    HttpResponse::NotFound().body("Not Found")
}
