use std::collections::BTreeMap;

use serde::Deserialize;

use crate::structs::InvoiceStatus;

/// Invoice form input as submitted. Every field is optional so a missing
/// field surfaces as a field error rather than a deserialization failure.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct RawInvoiceForm {
    pub customer_id: Option<String>,
    pub amount: Option<String>,
    pub status: Option<String>,
}

/// Field name -> error messages. Fields that validated have no entry.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

/// Validated invoice input, amount already converted to cents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoicePayload {
    pub customer_id: String,
    pub amount_cents: i64,
    pub status: InvoiceStatus,
}

/// Validate a submitted invoice form. Create and update share this shape;
/// the invoice date is never user-supplied.
pub fn parse_invoice_form(form: &RawInvoiceForm) -> Result<InvoicePayload, FieldErrors> {
    let mut errors = FieldErrors::new();

    let customer_id = match form.customer_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Some(id.to_owned()),
        _ => {
            push_error(&mut errors, "customer_id", "Please select a customer.");
            None
        }
    };

    let amount_cents = match form
        .amount
        .as_deref()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
    {
        Some(amount) if amount.is_finite() && amount > 0.0 => {
            Some((amount * 100.0).round() as i64)
        }
        _ => {
            push_error(&mut errors, "amount", "Please enter an amount greater than $0.");
            None
        }
    };

    let status = match form.status.as_deref() {
        Some("pending") => Some(InvoiceStatus::Pending),
        Some("paid") => Some(InvoiceStatus::Paid),
        _ => {
            push_error(&mut errors, "status", "Please select an invoice status.");
            None
        }
    };

    match (customer_id, amount_cents, status) {
        (Some(customer_id), Some(amount_cents), Some(status)) => Ok(InvoicePayload {
            customer_id,
            amount_cents,
            status,
        }),
        _ => Err(errors),
    }
}

/// Parse a route invoice id. A malformed id is a validation failure and is
/// never forwarded to storage.
pub fn parse_invoice_id(raw: &str) -> Result<i64, FieldErrors> {
    raw.trim().parse::<i64>().map_err(|_| {
        let mut errors = FieldErrors::new();
        push_error(&mut errors, "id", "Invalid invoice id.");
        errors
    })
}

fn push_error(errors: &mut FieldErrors, field: &'static str, message: &str) {
    errors.entry(field).or_default().push(message.to_owned());
}
