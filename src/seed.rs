//! One-shot fixture loader, run via `acme-dashboard seed`. Skips loading
//! when data is already present so a re-run does not duplicate rows.

use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::utils::hash_password;

const USERS: &[(&str, &str, &str, &str)] = &[(
    "410544b2-4001-4271-9855-fec4b6a6442a",
    "User",
    "user@nextmail.com",
    "123456",
)];

const CUSTOMERS: &[(&str, &str, &str)] = &[
    ("d6e15727-9fe1-4961-8c5b-ea44a9bd81aa", "Evil Rabbit", "evil@rabbit.com"),
    ("3958dc9e-712f-4377-85e9-fec4b6a6442a", "Delba de Oliveira", "delba@oliveira.com"),
    ("3958dc9e-742f-4377-85e9-fec4b6a6442a", "Lee Robinson", "lee@robinson.com"),
    ("76d65c26-f784-44a2-ac19-586678f7c2f2", "Michael Novotny", "michael@novotny.com"),
    ("cc27c14a-0acf-4f4a-a6c9-d45682c144b9", "Amy Burns", "amy@burns.com"),
    ("13d07535-c59e-4157-a011-f8d2ef4e0cbb", "Balazs Orban", "balazs@orban.com"),
];

// (customer index, amount in cents, status, date)
const INVOICES: &[(usize, i64, &str, &str)] = &[
    (0, 15795, "pending", "2022-12-06"),
    (1, 20348, "pending", "2022-11-14"),
    (4, 3040, "paid", "2022-10-29"),
    (3, 44800, "paid", "2023-09-10"),
    (5, 34577, "pending", "2023-08-05"),
    (2, 54246, "pending", "2023-07-16"),
    (0, 666, "pending", "2023-06-27"),
    (3, 32545, "paid", "2023-06-09"),
    (4, 1250, "paid", "2023-06-17"),
    (5, 8546, "paid", "2023-06-07"),
    (1, 500, "paid", "2023-08-19"),
    (5, 8945, "paid", "2023-06-03"),
    (2, 1000, "paid", "2022-06-05"),
];

const REVENUE: &[(&str, i64)] = &[
    ("Jan", 2000),
    ("Feb", 1800),
    ("Mar", 2200),
    ("Apr", 2500),
    ("May", 2300),
    ("Jun", 3200),
    ("Jul", 3500),
    ("Aug", 3700),
    ("Sep", 2500),
    ("Oct", 2800),
    ("Nov", 3000),
    ("Dec", 4800),
];

pub async fn run(pool: &SqlitePool) -> Result<(), AppError> {
    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Database error: {e}");
            AppError::Database("Failed to seed database.")
        })?;
    if existing > 0 {
        log::info!("Seed data already present, nothing to do");
        return Ok(());
    }

    for (id, name, email, password) in USERS {
        // Fixture passwords are hashed like real ones.
        let hash = hash_password(password).map_err(|e| AppError::Password(e.to_string()))?;
        sqlx::query("INSERT INTO users (id, name, email, password) VALUES (?1, ?2, ?3, ?4)")
            .bind(id)
            .bind(name)
            .bind(email)
            .bind(hash)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Error seeding users: {e}");
                AppError::Database("Failed to seed database.")
            })?;
    }
    log::info!("Seeded {} users", USERS.len());

    for (id, name, email) in CUSTOMERS {
        let image_url = format!(
            "/customers/{}.png",
            name.to_lowercase().replace(' ', "-")
        );
        sqlx::query("INSERT INTO customers (id, name, email, image_url) VALUES (?1, ?2, ?3, ?4)")
            .bind(id)
            .bind(name)
            .bind(email)
            .bind(image_url)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Error seeding customers: {e}");
                AppError::Database("Failed to seed database.")
            })?;
    }
    log::info!("Seeded {} customers", CUSTOMERS.len());

    for (customer, amount, status, date) in INVOICES {
        sqlx::query(
            "INSERT INTO invoices (customer_id, amount, status, date) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(CUSTOMERS[*customer].0)
        .bind(amount)
        .bind(status)
        .bind(date)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Error seeding invoices: {e}");
            AppError::Database("Failed to seed database.")
        })?;
    }
    log::info!("Seeded {} invoices", INVOICES.len());

    for (month, revenue) in REVENUE {
        sqlx::query("INSERT INTO revenue (month, revenue) VALUES (?1, ?2)")
            .bind(month)
            .bind(revenue)
            .execute(pool)
            .await
            .map_err(|e| {
                log::error!("Error seeding revenue: {e}");
                AppError::Database("Failed to seed database.")
            })?;
    }
    log::info!("Seeded {} revenue rows", REVENUE.len());

    Ok(())
}
