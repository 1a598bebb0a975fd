use tonrally::adapter::outbound::sqlite::{create_pool, run_migrations, DbPool, SqliteContestStore};

/// Migrated SQLite database in a temp file that lives as long as the value.
pub struct TempDb {
    _file: tempfile::NamedTempFile,
    pool: DbPool,
}

impl TempDb {
    pub fn create() -> Self {
        let file = tempfile::NamedTempFile::new().expect("create temp db file");
        let pool = create_pool(file.path().to_str().expect("temp path is utf-8"))
            .expect("create connection pool");
        run_migrations(&pool).expect("run migrations");
        Self { _file: file, pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn store(&self) -> SqliteContestStore {
        SqliteContestStore::new(self.pool.clone())
    }
}
