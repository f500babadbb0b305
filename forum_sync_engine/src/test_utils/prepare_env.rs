use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

use crate::{db_types::ForumSettings, SqliteForumDatabase, SqliteLinkStateStore};

/// A fresh pair of stores, backed by their own throwaway SQLite files.
pub struct TestStores {
    pub forum: SqliteForumDatabase,
    pub links: SqliteLinkStateStore,
}

impl TestStores {
    pub async fn close(&self) {
        self.forum.close().await;
        self.links.close().await;
    }

    /// Closes the pools and deletes both database files.
    pub async fn tear_down(self) {
        self.close().await;
        for url in [self.forum.url(), self.links.url()] {
            if let Err(e) = Sqlite::drop_database(url).await {
                warn!("🚀️ Could not drop test database {url}: {e}");
            }
        }
    }
}

/// Loads `.env.test`, starts the logger, and creates new, fully migrated forum and link state databases.
pub async fn prepare_test_env(settings: ForumSettings) -> TestStores {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    let forum_url = random_db_path("forum");
    let links_url = random_db_path("links");
    create_database(&forum_url).await;
    create_database(&links_url).await;
    let forum = SqliteForumDatabase::new_with_url(&forum_url, 5, settings)
        .await
        .expect("Error creating connection to forum database");
    forum.create_schema().await.expect("Error creating forum schema");
    let links = SqliteLinkStateStore::new_with_url(&links_url, 5).await.expect("Error creating link state store");
    links.run_migrations().await.expect("Error running link state migrations");
    info!("🚀️ Migrations complete");
    TestStores { forum, links }
}

pub fn random_db_path(prefix: &str) -> String {
    let path = std::env::temp_dir().join(format!("fsm_test_{prefix}_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn create_database(url: &str) {
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("Error dropping database {url}: {e:?}");
        }
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// Inserts a `t_contest` row for the match, so that its comment counter can be observed.
pub async fn add_contest(forum: &SqliteForumDatabase, match_id: &str) {
    sqlx::query("INSERT INTO t_contest (tcid, comments) VALUES ($1, 0)")
        .bind(match_id)
        .execute(forum.pool())
        .await
        .expect("Error inserting contest");
}
