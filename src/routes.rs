use actix_identity::Identity;
use actix_web::{
    get, post,
    web::{self, Data},
    HttpMessage, HttpRequest, HttpResponse, Responder,
};
use serde::Deserialize;

use crate::actions::{self, ActionOutcome, AuthOutcome, Credentials};
use crate::db;
use crate::errors::AppError;
use crate::validation::{self, RawInvoiceForm};
use crate::AppState;

const INVOICES_PATH: &str = "/dashboard/invoices";

#[get("/dashboard")]
pub async fn dashboard_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    if identity.is_none() {
        return Ok(HttpResponse::Unauthorized().body("Unauthorized"));
    }

    let revenue = db::fetch_revenue(&state.db_pool).await?;
    let latest_invoices = db::fetch_latest_invoices(&state.db_pool).await?;
    let cards = db::fetch_card_data(&state.db_pool).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "cards": cards,
        "revenue": revenue,
        "latest_invoices": latest_invoices,
    })))
}

fn default_page() -> i64 {
    1
}

#[derive(Deserialize, Debug)]
pub struct ListQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_page")]
    pub page: i64,
}

#[get("/dashboard/invoices")]
pub async fn invoices_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
    web::Query(params): web::Query<ListQuery>,
) -> Result<impl Responder, AppError> {
    if identity.is_none() {
        return Ok(HttpResponse::Unauthorized().body("Unauthorized"));
    }

    let invoices = db::fetch_filtered_invoices(&state.db_pool, &params.query, params.page).await?;
    let total_pages = db::fetch_invoices_pages(&state.db_pool, &params.query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "invoices": invoices,
        "total_pages": total_pages,
    })))
}

#[get("/dashboard/invoices/{id}/edit")]
pub async fn edit_invoice_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    if identity.is_none() {
        return Ok(HttpResponse::Unauthorized().body("Unauthorized"));
    }

    let id = match validation::parse_invoice_id(&path.into_inner()) {
        Ok(id) => id,
        Err(errors) => {
            return Ok(HttpResponse::UnprocessableEntity()
                .json(serde_json::json!({ "errors": errors })))
        }
    };

    let invoice = db::fetch_invoice_by_id(&state.db_pool, id)
        .await?
        .ok_or(AppError::NotFound)?;
    let customers = db::fetch_customers(&state.db_pool).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "invoice": invoice,
        "customers": customers,
    })))
}

#[get("/customers")]
pub async fn customers_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    if identity.is_none() {
        return Ok(HttpResponse::Unauthorized().body("Unauthorized"));
    }

    let customers = db::fetch_customers(&state.db_pool).await?;
    Ok(HttpResponse::Ok().json(customers))
}

/// Shared tail of every invoice mutation: only a confirmed `Completed`
/// invalidates the list view and redirects back to it.
fn finish_mutation(state: &AppState, outcome: ActionOutcome) -> HttpResponse {
    match outcome {
        ActionOutcome::Completed => {
            state.invalidator.invalidate(INVOICES_PATH);
            HttpResponse::SeeOther()
                .append_header(("Location", INVOICES_PATH))
                .finish()
        }
        ActionOutcome::Rejected(form_state) => {
            HttpResponse::UnprocessableEntity().json(form_state)
        }
    }
}

#[post("/dashboard/invoices")]
pub async fn create_invoice_handler(
    web::Form(form): web::Form<RawInvoiceForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
) -> Result<impl Responder, AppError> {
    if identity.is_none() {
        return Ok(HttpResponse::Unauthorized().body("Unauthorized"));
    }

    let outcome = actions::create_invoice(&state.db_pool, &form).await;
    Ok(finish_mutation(&state, outcome))
}

#[post("/dashboard/invoices/{id}")]
pub async fn update_invoice_handler(
    web::Form(form): web::Form<RawInvoiceForm>,
    state: Data<AppState>,
    identity: Option<Identity>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    if identity.is_none() {
        return Ok(HttpResponse::Unauthorized().body("Unauthorized"));
    }

    let outcome = actions::update_invoice(&state.db_pool, &path.into_inner(), &form).await;
    Ok(finish_mutation(&state, outcome))
}

#[post("/dashboard/invoices/{id}/delete")]
pub async fn delete_invoice_handler(
    state: Data<AppState>,
    identity: Option<Identity>,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    if identity.is_none() {
        return Ok(HttpResponse::Unauthorized().body("Unauthorized"));
    }

    let outcome = actions::delete_invoice(&state.db_pool, &path.into_inner()).await;
    Ok(finish_mutation(&state, outcome))
}

#[post("/login")]
pub async fn login_handler(
    web::Form(form): web::Form<Credentials>,
    state: Data<AppState>,
    request: HttpRequest,
) -> Result<impl Responder, AppError> {
    match actions::authenticate(&state.db_pool, &form).await {
        AuthOutcome::SignedIn(user) => {
            Identity::login(&request.extensions(), user.id)?;
            Ok(HttpResponse::SeeOther()
                .append_header(("Location", "/dashboard"))
                .body("Login successful"))
        }
        AuthOutcome::Denied(message) => Ok(HttpResponse::Unauthorized().body(message)),
    }
}

#[post("/logout")]
pub async fn logout_handler(identity: Identity) -> impl Responder {
    identity.logout();
    HttpResponse::SeeOther()
        .append_header(("Location", "/login"))
        .finish()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use actix_identity::IdentityMiddleware;
    use actix_session::{storage::CookieSessionStore, SessionMiddleware};
    use actix_web::{
        body::MessageBody,
        cookie::Key,
        dev::{ServiceFactory, ServiceRequest, ServiceResponse},
        http::StatusCode,
        test, App, Error,
    };
    use sqlx::SqlitePool;

    use super::*;
    use crate::db::test_support::*;
    use crate::utils::hash_password;
    use crate::PathInvalidator;

    struct RecordingInvalidator(Mutex<Vec<String>>);

    impl PathInvalidator for RecordingInvalidator {
        fn invalidate(&self, path: &str) {
            self.0.lock().unwrap().push(path.to_owned());
        }
    }

    fn test_app(
        pool: SqlitePool,
        invalidator: Arc<RecordingInvalidator>,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody>,
            Error = Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), Key::from(&[0; 64]))
                    .cookie_secure(false)
                    .build(),
            )
            .app_data(Data::new(AppState {
                db_pool: pool,
                invalidator,
            }))
            .service(dashboard_handler)
            .service(invoices_handler)
            .service(edit_invoice_handler)
            .service(customers_handler)
            .service(create_invoice_handler)
            .service(update_invoice_handler)
            .service(delete_invoice_handler)
            .service(login_handler)
            .service(logout_handler)
    }

    /// Log in and hand back the session cookies for follow-up requests.
    macro_rules! login_cookies {
        ($app:expr) => {{
            let req = test::TestRequest::post()
                .uri("/login")
                .set_form(&[("email", "amy@burns.com"), ("password", "open-sesame-123")])
                .to_request();
            let resp = test::call_service($app, req).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            resp.response()
                .cookies()
                .map(|c| c.into_owned())
                .collect::<Vec<_>>()
        }};
    }

    async fn seeded(pool: &SqlitePool) {
        insert_customer(pool, "c1", "Amy Burns", "amy@burns.com").await;
        let hash = hash_password("open-sesame-123").unwrap();
        insert_user(pool, "amy@burns.com", &hash).await;
    }

    #[actix_web::test]
    async fn anonymous_requests_are_rejected() {
        let pool = pool().await;
        seeded(&pool).await;
        let invalidator = Arc::new(RecordingInvalidator(Mutex::new(Vec::new())));
        let app = test::init_service(test_app(pool, invalidator)).await;

        for uri in ["/dashboard", "/dashboard/invoices", "/customers"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }

        let req = test::TestRequest::post()
            .uri("/dashboard/invoices")
            .set_form(&[("customer_id", "c1"), ("amount", "10"), ("status", "paid")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn login_with_wrong_password_returns_the_fixed_message() {
        let pool = pool().await;
        seeded(&pool).await;
        let invalidator = Arc::new(RecordingInvalidator(Mutex::new(Vec::new())));
        let app = test::init_service(test_app(pool, invalidator)).await;

        let req = test::TestRequest::post()
            .uri("/login")
            .set_form(&[("email", "amy@burns.com"), ("password", "wrong")])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = test::read_body(resp).await;
        assert_eq!(body, "Invalid credentials.");
    }

    #[actix_web::test]
    async fn create_form_persists_invalidates_and_redirects() {
        let pool = pool().await;
        seeded(&pool).await;
        let invalidator = Arc::new(RecordingInvalidator(Mutex::new(Vec::new())));
        let app = test::init_service(test_app(pool.clone(), invalidator.clone())).await;

        let cookies = login_cookies!(&app);
        let mut req = test::TestRequest::post()
            .uri("/dashboard/invoices")
            .set_form(&[("customer_id", "c1"), ("amount", "45.50"), ("status", "paid")]);
        for cookie in cookies {
            req = req.cookie(cookie);
        }
        let resp = test::call_service(&app, req.to_request()).await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            resp.headers().get("Location").unwrap(),
            "/dashboard/invoices"
        );
        assert_eq!(
            *invalidator.0.lock().unwrap(),
            vec!["/dashboard/invoices".to_owned()]
        );

        let (amount, status, date): (i64, String, String) =
            sqlx::query_as("SELECT amount, status, date FROM invoices WHERE customer_id = 'c1'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(amount, 4550);
        assert_eq!(status, "paid");
        let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(date, today);
    }

    #[actix_web::test]
    async fn invalid_create_returns_form_state_and_no_invalidation() {
        let pool = pool().await;
        seeded(&pool).await;
        let invalidator = Arc::new(RecordingInvalidator(Mutex::new(Vec::new())));
        let app = test::init_service(test_app(pool, invalidator.clone())).await;

        let cookies = login_cookies!(&app);
        let mut req = test::TestRequest::post()
            .uri("/dashboard/invoices")
            .set_form(&[("customer_id", "c1"), ("amount", "0"), ("status", "paid")]);
        for cookie in cookies {
            req = req.cookie(cookie);
        }
        let resp = test::call_service(&app, req.to_request()).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body["message"],
            "Missing Fields. Failed to Create Invoice."
        );
        assert_eq!(
            body["errors"]["amount"][0],
            "Please enter an amount greater than $0."
        );
        assert!(invalidator.0.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn edit_view_returns_invoice_in_dollars_with_customer_list() {
        let pool = pool().await;
        seeded(&pool).await;
        let id = insert_invoice(&pool, "c1", 4550, "paid", "2024-03-01").await;
        let invalidator = Arc::new(RecordingInvalidator(Mutex::new(Vec::new())));
        let app = test::init_service(test_app(pool, invalidator)).await;

        let cookies = login_cookies!(&app);
        let mut req = test::TestRequest::get().uri(&format!("/dashboard/invoices/{id}/edit"));
        for cookie in cookies {
            req = req.cookie(cookie);
        }
        let resp = test::call_service(&app, req.to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["invoice"]["amount"], 45.5);
        assert_eq!(body["customers"][0]["name"], "Amy Burns");
    }
}
