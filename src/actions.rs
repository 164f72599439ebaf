use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db;
use crate::structs::User;
use crate::utils::verify_password;
use crate::validation::{parse_invoice_form, parse_invoice_id, FieldErrors, RawInvoiceForm};

/// Form state returned to the client when a mutation does not complete:
/// field errors from validation, or a summary message, or both.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFormState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InvoiceFormState {
    fn invalid(errors: FieldErrors, message: &str) -> Self {
        Self {
            errors: Some(errors),
            message: Some(message.to_owned()),
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            errors: None,
            message: Some(message.to_owned()),
        }
    }
}

/// Outcome of an invoice mutation. `Completed` means persistence is
/// confirmed; view invalidation and the redirect are the caller's job and
/// happen strictly afterwards. Validation and storage failures both land
/// in `Rejected` — storage errors never escape an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Rejected(InvoiceFormState),
}

pub async fn create_invoice(pool: &SqlitePool, form: &RawInvoiceForm) -> ActionOutcome {
    let payload = match parse_invoice_form(form) {
        Ok(payload) => payload,
        Err(errors) => {
            return ActionOutcome::Rejected(InvoiceFormState::invalid(
                errors,
                "Missing Fields. Failed to Create Invoice.",
            ))
        }
    };

    // The invoice date is set here, once, and never updated afterwards.
    let date = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();

    match db::insert_invoice(
        pool,
        &payload.customer_id,
        payload.amount_cents,
        payload.status,
        &date,
    )
    .await
    {
        Ok(invoice) => {
            log::info!("Invoice created: {invoice:?}");
            ActionOutcome::Completed
        }
        Err(e) => {
            log::error!("Database error: {e}");
            ActionOutcome::Rejected(InvoiceFormState::failed(
                "Database Error: Failed to Create Invoice.",
            ))
        }
    }
}

pub async fn update_invoice(pool: &SqlitePool, id: &str, form: &RawInvoiceForm) -> ActionOutcome {
    let id = match parse_invoice_id(id) {
        Ok(id) => id,
        Err(errors) => {
            return ActionOutcome::Rejected(InvoiceFormState::invalid(
                errors,
                "Missing Fields. Failed to Update Invoice.",
            ))
        }
    };

    let payload = match parse_invoice_form(form) {
        Ok(payload) => payload,
        Err(errors) => {
            return ActionOutcome::Rejected(InvoiceFormState::invalid(
                errors,
                "Missing Fields. Failed to Update Invoice.",
            ))
        }
    };

    match db::update_invoice_row(
        pool,
        id,
        &payload.customer_id,
        payload.amount_cents,
        payload.status,
    )
    .await
    {
        Ok(rows) if rows > 0 => ActionOutcome::Completed,
        Ok(_) => {
            log::error!("Update of invoice {id} matched no row");
            ActionOutcome::Rejected(InvoiceFormState::failed(
                "Database Error: Failed to Update Invoice.",
            ))
        }
        Err(e) => {
            log::error!("Database error: {e}");
            ActionOutcome::Rejected(InvoiceFormState::failed(
                "Database Error: Failed to Update Invoice.",
            ))
        }
    }
}

pub async fn delete_invoice(pool: &SqlitePool, id: &str) -> ActionOutcome {
    let id = match parse_invoice_id(id) {
        Ok(id) => id,
        Err(errors) => {
            return ActionOutcome::Rejected(InvoiceFormState::invalid(
                errors,
                "Failed to Delete Invoice.",
            ))
        }
    };

    match db::delete_invoice_row(pool, id).await {
        Ok(rows) if rows > 0 => ActionOutcome::Completed,
        Ok(_) => {
            log::error!("Delete of invoice {id} matched no row");
            ActionOutcome::Rejected(InvoiceFormState::failed(
                "Database Error: Failed to Delete Invoice.",
            ))
        }
        Err(e) => {
            log::error!("Database error: {e}");
            ActionOutcome::Rejected(InvoiceFormState::failed(
                "Database Error: Failed to Delete Invoice.",
            ))
        }
    }
}

pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const AUTH_FAILED: &str = "Something went wrong.";

#[derive(Deserialize, Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// What the login handler needs to know: who signed in, or which fixed
/// denial message to show. Session side effects stay at the boundary.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    SignedIn(User),
    Denied(&'static str),
}

pub async fn authenticate(pool: &SqlitePool, credentials: &Credentials) -> AuthOutcome {
    let user = match db::get_user(pool, &credentials.email).await {
        Ok(user) => user,
        // Already logged with full detail inside get_user.
        Err(_) => return AuthOutcome::Denied(AUTH_FAILED),
    };

    let Some(user) = user else {
        return AuthOutcome::Denied(INVALID_CREDENTIALS);
    };

    match verify_password(&credentials.password, &user.password) {
        Ok(true) => AuthOutcome::SignedIn(user),
        Ok(false) => AuthOutcome::Denied(INVALID_CREDENTIALS),
        Err(e) => {
            log::error!("Stored password hash for {} is unusable: {e}", user.email);
            AuthOutcome::Denied(AUTH_FAILED)
        }
    }
}
