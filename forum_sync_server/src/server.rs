use std::{future::Future, pin::Pin, sync::Arc};

use forum_sync_engine::{
    EventHandler,
    ForumSyncApi,
    MatchEvent,
    SqliteForumDatabase,
    SqliteLinkStateStore,
    TemplateRenderer,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::io::{AsyncBufRead, BufReader};

use crate::{config::ServerConfig, errors::ServerError, ingest::run_ingestion};

pub type SqliteSyncApi = ForumSyncApi<SqliteForumDatabase, SqliteLinkStateStore>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let api = Arc::new(create_sync_api(&config).await?);
    let stdin = BufReader::new(tokio::io::stdin());
    run_pipeline(Arc::clone(&api), &config, stdin).await?;
    api.forum().close().await;
    api.links().close().await;
    info!("🚀️ Database connections closed");
    Ok(())
}

/// Connects to both databases, brings the link state schema up to date and compiles the post template.
pub async fn create_sync_api(config: &ServerConfig) -> Result<SqliteSyncApi, ServerError> {
    let template = config.load_post_template()?;
    let renderer = Arc::new(TemplateRenderer::new(&template)?);

    if config.create_forum_schema {
        ensure_database_exists(&config.forum_database_url).await?;
    }
    let forum =
        SqliteForumDatabase::new_with_url(&config.forum_database_url, config.max_connections, config.forum)
            .await
            .map_err(|e| ServerError::InitializeError(format!("Could not connect to the forum database. {e}")))?;
    if config.create_forum_schema {
        forum.create_schema().await.map_err(|e| ServerError::MigrationError("forum", e.to_string()))?;
        info!("🚀️ Forum schema is in place");
    }

    ensure_database_exists(&config.link_state_database_url).await?;
    let links = SqliteLinkStateStore::new_with_url(&config.link_state_database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not connect to the link state database. {e}")))?;
    links.run_migrations().await.map_err(|e| ServerError::MigrationError("link state", e.to_string()))?;
    info!("🚀️ Link state migrations complete");

    Ok(ForumSyncApi::new(forum, links, renderer).with_event_timeout(config.event_timeout))
}

/// Builds the worker pool that hands every queued event to the API.
pub fn create_event_pool(api: Arc<SqliteSyncApi>, queue_size: usize, workers: usize) -> EventHandler<MatchEvent> {
    let handler = Arc::new(move |event: MatchEvent| {
        let api = Arc::clone(&api);
        Box::pin(async move { api.handle(event).await }) as Pin<Box<dyn Future<Output = ()> + Send>>
    });
    EventHandler::new(queue_size, workers, handler)
}

/// Feeds messages from `input` through the worker pool until the input ends or Ctrl-C is pressed. Either way, events
/// that are already queued are handled before this returns.
pub async fn run_pipeline<R>(api: Arc<SqliteSyncApi>, config: &ServerConfig, input: R) -> Result<(), ServerError>
where R: AsyncBufRead + Unpin {
    let pool = create_event_pool(api, config.queue_size, config.worker_count);
    let producer = pool.subscribe();
    let workers = tokio::spawn(pool.start_handler());
    info!("🚀️ Listening for match events");
    tokio::select! {
        stats = run_ingestion(input, producer) => {
            info!("🚀️ Input closed after {} events. Finishing the queued ones.", stats.published);
        },
        _ = shutdown_signal() => {
            info!("🚀️ Ctrl-C received. Finishing the queued events.");
        },
    }
    workers.await.map_err(|e| ServerError::Unspecified(format!("The worker pool did not shut down cleanly. {e}")))?;
    info!("🚀️ All workers have stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("🚀️ Could not listen for Ctrl-C. The server will stop when its input is closed. {e}");
        std::future::pending::<()>().await;
    }
}

async fn ensure_database_exists(url: &str) -> Result<(), ServerError> {
    let exists = Sqlite::database_exists(url)
        .await
        .map_err(|e| ServerError::InitializeError(format!("Could not check database {url}. {e}")))?;
    if !exists {
        Sqlite::create_database(url)
            .await
            .map_err(|e| ServerError::InitializeError(format!("Could not create database {url}. {e}")))?;
        info!("🚀️ Created database {url}");
    }
    Ok(())
}
