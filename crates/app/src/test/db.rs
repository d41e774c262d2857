//! Per-test PostgreSQL databases inside one shared container.

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::{OnceCell, mpsc};
use uuid::Uuid;

const USER: &str = "bazaar_test";
const PASSWORD: &str = "bazaar_test_password";

static POSTGRES_CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);

/// Databases waiting to be dropped once their `TestDb` goes away.
static DROP_QUEUE: Lazy<OnceCell<mpsc::UnboundedSender<String>>> = Lazy::new(OnceCell::new);

/// Names are interpolated into DDL, so only `[a-z0-9_]` is accepted.
fn is_safe_database_name(name: &str) -> bool {
    (1..=63).contains(&name.len())
        && name.starts_with("bazaar_")
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

fn unique_database_name() -> String {
    format!("bazaar_{}", Uuid::now_v7().simple())
}

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(USER)
        .with_password(PASSWORD)
        .with_db_name("bazaar_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

async fn database_url(database: &str) -> String {
    let container = POSTGRES_CONTAINER.get_or_init(start_container).await;

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");

    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    format!("postgresql://{USER}:{PASSWORD}@{host}:{port}/{database}")
}

async fn spawn_drop_worker() -> mpsc::UnboundedSender<String> {
    let (sender, mut receiver) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(name) = receiver.recv().await {
            if !is_safe_database_name(&name) {
                continue;
            }

            if let Ok(mut conn) = PgConnection::connect(&database_url("postgres").await).await {
                let _dropped = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{name}\" WITH (FORCE)"))
                    .execute(&mut conn)
                    .await;
                let _closed = conn.close().await;
            }
        }
    });

    sender
}

/// A freshly migrated database owned by a single test.
///
/// Services commit normally; isolation comes from every test having its own
/// database, which is dropped in the background when this value is dropped.
#[derive(Debug)]
pub struct TestDb {
    pool: PgPool,
    name: String,
}

impl Drop for TestDb {
    fn drop(&mut self) {
        if let Some(sender) = DROP_QUEUE.get() {
            let _queued = sender.send(self.name.clone());
        }
    }
}

impl TestDb {
    pub async fn new() -> Self {
        DROP_QUEUE.get_or_init(spawn_drop_worker).await;

        let name = unique_database_name();

        let mut admin = PgConnection::connect(&database_url("postgres").await)
            .await
            .expect("Failed to connect to postgres database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut admin)
            .await
            .expect("Failed to create test database");

        admin.close().await.expect("Failed to close admin connection");

        let pool = PgPool::connect(&database_url(&name).await)
            .await
            .expect("Failed to create pool for database");

        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations on database");

        Self { pool, name }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_safe() {
        let name = unique_database_name();

        assert!(is_safe_database_name(&name), "{name} rejected");
        assert_ne!(name, unique_database_name());
    }

    #[test]
    fn unsafe_names_are_rejected() {
        assert!(!is_safe_database_name(""));
        assert!(!is_safe_database_name("postgres"));
        assert!(!is_safe_database_name("bazaar_\"; DROP TABLE products"));
        assert!(!is_safe_database_name(&format!("bazaar_{}", "a".repeat(60))));
    }

    #[tokio::test]
    #[ignore = "requires docker"]
    async fn migrations_create_the_pricing_schema() {
        let test_db = TestDb::new().await;

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_name IN ('products', 'bundles', 'discounts', 'sales', 'price_adjustments')",
        )
        .fetch_one(test_db.pool())
        .await
        .expect("Failed to query information schema");

        assert_eq!(tables, 5);
    }
}
