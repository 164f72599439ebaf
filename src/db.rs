use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::structs::{
    CardData, CustomerField, Invoice, InvoiceForm, InvoiceStatus, InvoicesTableRow, LatestInvoice,
    Revenue, User,
};
use crate::utils::format_currency;

pub const ITEMS_PER_PAGE: i64 = 6;

/// Case-sensitive substring match of the search query against invoice date,
/// invoice status, customer name, or customer email. `instr` rather than
/// `LIKE`: SQLite `LIKE` is case-insensitive for ASCII.
const INVOICE_FILTER: &str = "instr(invoices.date, ?1) > 0 \
     OR instr(invoices.status, ?1) > 0 \
     OR instr(customers.name, ?1) > 0 \
     OR instr(customers.email, ?1) > 0";

pub async fn fetch_revenue(pool: &SqlitePool) -> Result<Vec<Revenue>, AppError> {
    sqlx::query_as::<_, Revenue>("SELECT month, revenue FROM revenue")
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Database error: {e}");
            AppError::Database("Failed to fetch revenue data.")
        })
}

pub async fn fetch_latest_invoices(pool: &SqlitePool) -> Result<Vec<LatestInvoice>, AppError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        amount: i64,
        name: String,
        email: String,
        image_url: String,
    }

    let rows = sqlx::query_as::<_, Row>(
        "SELECT invoices.id, invoices.amount, customers.name, customers.email, customers.image_url \
         FROM invoices \
         JOIN customers ON customers.id = invoices.customer_id \
         ORDER BY invoices.date DESC \
         LIMIT 5",
    )
    .fetch_all(pool)
    .await
    .map_err(|e| {
        log::error!("Database error: {e}");
        AppError::Database("Failed to fetch the latest invoices.")
    })?;

    Ok(rows
        .into_iter()
        .map(|row| LatestInvoice {
            id: row.id,
            name: row.name,
            email: row.email,
            image_url: row.image_url,
            amount: format_currency(row.amount),
        })
        .collect())
}

/// The four dashboard aggregates, issued concurrently and joined.
pub async fn fetch_card_data(pool: &SqlitePool) -> Result<CardData, AppError> {
    let invoice_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices").fetch_one(pool);
    let customer_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers").fetch_one(pool);
    let paid_sum =
        sqlx::query_scalar::<_, Option<i64>>("SELECT SUM(amount) FROM invoices WHERE status = 'paid'")
            .fetch_one(pool);
    let pending_sum = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT SUM(amount) FROM invoices WHERE status = 'pending'",
    )
    .fetch_one(pool);

    let (number_of_invoices, number_of_customers, paid, pending) =
        tokio::try_join!(invoice_count, customer_count, paid_sum, pending_sum).map_err(|e| {
            log::error!("Database error: {e}");
            AppError::Database("Failed to fetch card data.")
        })?;

    Ok(CardData {
        number_of_invoices,
        number_of_customers,
        total_paid_invoices: format_currency(paid.unwrap_or(0)),
        total_pending_invoices: format_currency(pending.unwrap_or(0)),
    })
}

/// Page `page` (1-indexed, size 6) of invoices matching `query`, newest
/// first, customer fields flattened onto each row.
pub async fn fetch_filtered_invoices(
    pool: &SqlitePool,
    query: &str,
    page: i64,
) -> Result<Vec<InvoicesTableRow>, AppError> {
    let offset = (page.max(1) - 1) * ITEMS_PER_PAGE;

    let sql = format!(
        "SELECT invoices.id, invoices.customer_id, invoices.amount, invoices.status, \
                invoices.date, customers.name, customers.email, customers.image_url \
         FROM invoices \
         JOIN customers ON customers.id = invoices.customer_id \
         WHERE {INVOICE_FILTER} \
         ORDER BY invoices.date DESC \
         LIMIT ?2 OFFSET ?3"
    );

    sqlx::query_as::<_, InvoicesTableRow>(&sql)
        .bind(query)
        .bind(ITEMS_PER_PAGE)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Database error: {e}");
            AppError::Database("Failed to fetch invoices.")
        })
}

/// Total page count for `query`, ceiling division by the page size.
pub async fn fetch_invoices_pages(pool: &SqlitePool, query: &str) -> Result<i64, AppError> {
    let sql = format!(
        "SELECT COUNT(*) \
         FROM invoices \
         JOIN customers ON customers.id = invoices.customer_id \
         WHERE {INVOICE_FILTER}"
    );

    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(query)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Database error: {e}");
            AppError::Database("Failed to fetch total number of invoices.")
        })?;

    Ok((count + ITEMS_PER_PAGE - 1) / ITEMS_PER_PAGE)
}

/// Single invoice shaped for the edit form, amount converted to dollars.
pub async fn fetch_invoice_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<InvoiceForm>, AppError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        customer_id: String,
        amount: i64,
        status: InvoiceStatus,
    }

    let row = sqlx::query_as::<_, Row>(
        "SELECT id, customer_id, amount, status FROM invoices WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        log::error!("Database error: {e}");
        AppError::Database("Failed to fetch invoice.")
    })?;

    Ok(row.map(|row| InvoiceForm {
        id: row.id,
        customer_id: row.customer_id,
        amount: row.amount as f64 / 100.0,
        status: row.status,
    }))
}

pub async fn fetch_customers(pool: &SqlitePool) -> Result<Vec<CustomerField>, AppError> {
    sqlx::query_as::<_, CustomerField>("SELECT id, name FROM customers ORDER BY name ASC")
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Database error: {e}");
            AppError::Database("Failed to fetch all customers.")
        })
}

/// Authentication path only: first user matching `email`, if any.
pub async fn get_user(pool: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    sqlx::query_as::<_, User>("SELECT id, name, email, password FROM users WHERE email = ?1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch user: {e}");
            AppError::Database("Failed to fetch user.")
        })
}

pub async fn insert_invoice(
    pool: &SqlitePool,
    customer_id: &str,
    amount_cents: i64,
    status: InvoiceStatus,
    date: &str,
) -> Result<Invoice, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        "INSERT INTO invoices (customer_id, amount, status, date) \
         VALUES (?1, ?2, ?3, ?4) RETURNING *",
    )
    .bind(customer_id)
    .bind(amount_cents)
    .bind(status)
    .bind(date)
    .fetch_one(pool)
    .await
}

/// Updates customer, amount, and status only; the date is immutable.
/// Returns rows affected so the caller can spot a missing invoice.
pub async fn update_invoice_row(
    pool: &SqlitePool,
    id: i64,
    customer_id: &str,
    amount_cents: i64,
    status: InvoiceStatus,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE invoices SET customer_id = ?1, amount = ?2, status = ?3 WHERE id = ?4")
            .bind(customer_id)
            .bind(amount_cents)
            .bind(status)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

pub async fn delete_invoice_row(pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
