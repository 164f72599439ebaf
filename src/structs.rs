use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Payment state of an invoice. Stored lowercase in the `status` column.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Argon2 PHC hash, never the plaintext password.
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Invoice {
    pub id: i64,
    pub customer_id: String,
    /// Amount owed in cents.
    pub amount: i64,
    pub status: InvoiceStatus,
    /// ISO date, `YYYY-MM-DD`. Set at creation, immutable afterwards.
    pub date: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct Revenue {
    pub month: String,
    pub revenue: i64,
}

/// `{id, name}` pair for the customer selection dropdown.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct CustomerField {
    pub id: String,
    pub name: String,
}

/// One of the five most recent invoices, flattened with the customer's
/// public fields and the amount pre-formatted for display.
#[derive(Serialize, Debug, Clone)]
pub struct LatestInvoice {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub amount: String,
}

/// A row of the filterable invoice table, customer fields attached directly.
#[derive(Serialize, Debug, Clone, FromRow)]
pub struct InvoicesTableRow {
    pub id: i64,
    pub customer_id: String,
    pub amount: i64,
    pub status: InvoiceStatus,
    pub date: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// Invoice as loaded into the edit form: amount in dollars, not cents.
#[derive(Serialize, Debug, Clone)]
pub struct InvoiceForm {
    pub id: i64,
    pub customer_id: String,
    pub amount: f64,
    pub status: InvoiceStatus,
}

/// Dashboard card aggregates. Sums arrive formatted as currency strings.
#[derive(Serialize, Debug, Clone)]
pub struct CardData {
    pub number_of_invoices: i64,
    pub number_of_customers: i64,
    pub total_paid_invoices: String,
    pub total_pending_invoices: String,
}
