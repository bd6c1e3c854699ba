//! PostgreSQL test infrastructure.
//!
//! One PostgreSQL container is started per test binary and shared by every test; each test
//! gets its own freshly created database so tests can run in parallel.

use std::sync::OnceLock;

use postgres::{Client, NoTls};
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

/// Default credentials for testcontainers-modules postgres
const PG_USER: &str = "postgres";
const PG_PASSWORD: &str = "postgres";
const PG_DB: &str = "postgres";

/// Host port of the shared container.
static POSTGRES_PORT: OnceLock<u16> = OnceLock::new();

fn postgres_port() -> u16 {
    *POSTGRES_PORT.get_or_init(|| {
        // The runtime only manages the container; the drivers under test are blocking.
        let rt = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
        let port = rt.block_on(async {
            let container = Postgres::default()
                .start()
                .await
                .expect("failed to start postgres container");
            let port = container
                .get_host_port_ipv4(5432)
                .await
                .expect("failed to get postgres port");
            // Keep the container running for the rest of the test binary.
            std::mem::forget(container);
            port
        });
        std::mem::forget(rt);
        port
    })
}

fn url_with_db(db: &str) -> String {
    format!(
        "postgres://{}:{}@127.0.0.1:{}/{}",
        PG_USER,
        PG_PASSWORD,
        postgres_port(),
        db
    )
}

/// An isolated database inside the shared container.
pub struct TestDatabase {
    /// Connection URL pointing at this database.
    pub url: String,
    /// Database name, as reported by `current_database()`.
    pub name: String,
}

/// Create a fresh, uniquely named database.
pub fn fresh_postgres_db() -> TestDatabase {
    let mut admin =
        Client::connect(&url_with_db(PG_DB), NoTls).expect("failed to connect as admin");

    let name = format!("test_{}", Uuid::new_v4().simple());
    admin
        .batch_execute(&format!("CREATE DATABASE \"{}\"", name))
        .expect("failed to create test database");

    TestDatabase {
        url: url_with_db(&name),
        name,
    }
}
