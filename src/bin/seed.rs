use bookstore_api::{config::AppConfig, db::create_pool, services::auth_service::hash_password};

const BOOKS: &[(&str, &str, i64, i64)] = &[
    ("Edge of the Tides", "Marisa Holloway", 1899, 699),
    ("Fragments of Yesterday", "Daniel K. Mercer", 2450, 999),
    ("The Last Station North", "Irene Caldwell", 1575, 550),
    ("Glass Cities", "Noah Feldman", 3199, 1250),
    ("Patterns in the Dust", "Alicia Navarro", 1250, 499),
    ("Learning Data Structures in Python", "Priya Raman", 3550, 1399),
    ("Networking Essentials", "Caleb J. Park", 2999, 1150),
    ("Clean Web APIs", "Sandra Liu", 2750, 1050),
    ("Algorithms in Plain English", "Mark R. Jensen", 3399, 1299),
    ("A Short Guide to Databases", "Reena Shah", 2199, 850),
    ("Event-Driven Systems", "Hassan El-Amin", 3899, 1550),
    ("Rentals, Returns, and Receipts", "Martin Blake", 1450, 525),
    ("The Bookshop on Alder Lane", "Emily Tran", 1699, 650),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    ensure_user(&pool, "manager", "manager@example.com", "manager123", "manager").await?;
    ensure_user(&pool, "customer", "customer@example.com", "customer123", "customer").await?;
    seed_books(&pool).await?;

    println!("Seed completed");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<()> {
    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (username) DO NOTHING
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .execute(pool)
    .await?;

    println!("Ensured user {username} (role={role})");
    Ok(())
}

async fn seed_books(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for (title, author, buy_price, rent_price) in BOOKS {
        // One row per title+author; reruns skip existing books.
        sqlx::query(
            r#"
            INSERT INTO books (title, author, buy_price, rent_price)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (
                SELECT 1 FROM books WHERE title = $1 AND author = $2
            )
            "#,
        )
        .bind(title)
        .bind(author)
        .bind(buy_price)
        .bind(rent_price)
        .execute(pool)
        .await?;
    }

    println!("Seeded books");
    Ok(())
}
