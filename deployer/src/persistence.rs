use crate::deployment::deploy_layer::{self, LogRecorder, LogType};
use crate::deployment::{DeploymentInfo, Log, State};
use crate::error::Result;

use std::path::Path;

use serde_json::json;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{Sqlite, SqlitePool};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

const DB_PATH: &str = "deployer.sqlite";

#[derive(Clone)]
pub struct Persistence {
    pool: SqlitePool,
    log_send: UnboundedSender<deploy_layer::Log>,
}

impl Persistence {
    /// Creates a persistent storage solution (i.e., SQL database). This
    /// function creates all necessary tables and sets up a database connection
    /// pool - new connections should be made by cloning [`Persistence`] rather
    /// than repeatedly calling [`Persistence::new`].
    pub async fn new() -> (Self, JoinHandle<()>) {
        if !Path::new(DB_PATH).exists() {
            Sqlite::create_database(DB_PATH).await.unwrap();
        }

        let pool = SqlitePool::connect(DB_PATH).await.unwrap();
        Self::from_pool(pool).await
    }

    #[allow(dead_code)]
    async fn new_in_memory() -> (Self, JoinHandle<()>) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> (Self, JoinHandle<()>) {
        sqlx::query("
            CREATE TABLE IF NOT EXISTS deployments (
                name TEXT PRIMARY KEY, -- Name of the service being deployed.
                state INTEGER          -- Enum indicating the current state of the deployment.
            );

            CREATE TABLE IF NOT EXISTS logs (
                name TEXT,         -- The service that this log line pertains to.
                timestamp INTEGER, -- Unix eopch timestamp.
                state INTEGER,     -- The state of the deployment at the time at which the log text was produced.
                level TEXT,        -- The log level
                file TEXT,         -- The file log took place in
                line INTEGER,       -- The line log took place on
                fields TEXT        -- Log fields object.
            );
        ").execute(&pool).await.unwrap();

        let (log_send, mut log_recv): (UnboundedSender<deploy_layer::Log>, _) =
            mpsc::unbounded_channel();

        let pool_cloned = pool.clone();

        // The logs are received on a non-async thread.
        // This moves them to an async thread
        let handle = tokio::spawn(async move {
            while let Some(log) = log_recv.recv().await {
                match log.r#type {
                    LogType::Event => insert_log(&pool_cloned, log).await.unwrap(),
                    LogType::State => {
                        insert_log(
                            &pool_cloned,
                            Log {
                                name: log.name.clone(),
                                timestamp: log.timestamp.clone(),
                                state: log.state.clone(),
                                level: log.level.clone(),
                                file: log.file.clone(),
                                line: log.line,
                                fields: json!("NEW STATE"),
                            },
                        )
                        .await
                        .unwrap();
                        update_deployment(&pool_cloned, log).await.unwrap();
                    }
                };
            }
        });

        let persistence = Self { pool, log_send };

        (persistence, handle)
    }

    pub async fn update_deployment(&self, info: impl Into<DeploymentInfo>) -> Result<()> {
        update_deployment(&self.pool, info).await
    }

    pub async fn get_deployment(&self, name: &str) -> Result<Option<DeploymentInfo>> {
        get_deployment(&self.pool, name).await
    }

    pub async fn delete_deployment(&self, name: &str) -> Result<Option<DeploymentInfo>> {
        let info = self.get_deployment(name).await?;

        let _ = sqlx::query("DELETE FROM deployments WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await;

        Ok(info)
    }

    pub async fn get_all_deployments(&self) -> Result<Vec<DeploymentInfo>> {
        sqlx::query_as("SELECT * FROM deployments")
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    pub async fn get_all_runnable_deployments(&self) -> Result<Vec<DeploymentInfo>> {
        sqlx::query_as("SELECT * FROM deployments WHERE state = ? OR state = ?")
            .bind(State::Built)
            .bind(State::Running)
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn insert_log(&self, log: impl Into<Log>) -> Result<()> {
        insert_log(&self.pool, log).await
    }

    async fn get_deployment_logs(&self, name: &str) -> Result<Vec<Log>> {
        get_deployment_logs(&self.pool, name).await
    }
}

async fn update_deployment(pool: &SqlitePool, info: impl Into<DeploymentInfo>) -> Result<()> {
    let info = info.into();

    // TODO: Handle moving to 'active_deployments' table for State::Running.

    sqlx::query("INSERT OR REPLACE INTO deployments (name, state) VALUES (?, ?)")
        .bind(info.name)
        .bind(info.state)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(Into::into)
}

async fn get_deployment(pool: &SqlitePool, name: &str) -> Result<Option<DeploymentInfo>> {
    sqlx::query_as("SELECT * FROM deployments WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
}

async fn insert_log(pool: &SqlitePool, log: impl Into<Log>) -> Result<()> {
    let log = log.into();

    sqlx::query("INSERT INTO logs (name, timestamp, state, level, file, line, fields) VALUES (?, ?, ?, ?, ?, ?, ?)")
        .bind(log.name)
        .bind(log.timestamp)
        .bind(log.state)
        .bind(log.level)
        .bind(log.file)
        .bind(log.line)
        .bind(log.fields)
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(Into::into)
}

async fn get_deployment_logs(pool: &SqlitePool, name: &str) -> Result<Vec<Log>> {
    sqlx::query_as("SELECT * FROM logs WHERE name = ?")
        .bind(name)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
}

impl LogRecorder for Persistence {
    fn record(&self, log: deploy_layer::Log) {
        self.log_send
            .send(log)
            .expect("failed to move log to async thread");
    }
}
