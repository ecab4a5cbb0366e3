//! The single vehicle a rider has chosen to follow.
//!
//! The chosen id is persisted through a key-value collaborator so tracking
//! survives restarts; display state is always re-derived from the latest
//! Live Data Store snapshot, never cached.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::models::Vehicle;
use crate::store::LiveDataStore;

const TRACKED_VEHICLE_KEY: &str = "tracked_vehicle";

/// Durable key-value store for session state.
pub trait SessionStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

impl<K: SessionStore + Send + Sync> SessionStore for Arc<K> {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        (**self).remove(key)
    }
}

/// SQLite-backed session store.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open (creating if needed) the session database at `path` and
    /// initialize its schema.
    pub async fn new(path: &str) -> Result<Self> {
        let database_url = format!("sqlite://{}?mode=rwc", path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .context("Failed to connect to session database")?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create session table")?;

        tracing::debug!("Session schema initialized");
        Ok(())
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let query = sqlx::query_as::<_, (String,)>("SELECT value FROM session WHERE key = ?")
            .bind(key.to_string());
        async move {
            let row = query
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read session key")?;
            Ok(row.map(|(value,)| value))
        }
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send {
        let query = sqlx::query("INSERT OR REPLACE INTO session (key, value) VALUES (?, ?)")
            .bind(key.to_string())
            .bind(value.to_string());
        async move {
            query
                .execute(&self.pool)
                .await
                .context("Failed to write session key")?;
            Ok(())
        }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        let query = sqlx::query("DELETE FROM session WHERE key = ?").bind(key.to_string());
        async move {
            query
                .execute(&self.pool)
                .await
                .context("Failed to delete session key")?;
            Ok(())
        }
    }
}

/// In-memory session store for ephemeral runs and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let value = self.entries.lock().unwrap().get(key).cloned();
        async move { Ok(value) }
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        async move { Ok(()) }
    }

    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        self.entries.lock().unwrap().remove(key);
        async move { Ok(()) }
    }
}

/// Display state of the tracked vehicle, re-derived per snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedView {
    Untracked,
    /// The tracked vehicle appears in the latest snapshot
    Active { vehicle: Vehicle },
    /// Tracked, but absent from the latest snapshot. Carries no position:
    /// "no longer reporting" must be distinguishable from "last known
    /// position".
    Inactive { vehicle_id: String },
}

impl std::fmt::Display for TrackedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackedView::Untracked => f.write_str("No vehicle tracked"),
            TrackedView::Active { vehicle } => write!(f, "Tracking {}", vehicle),
            TrackedView::Inactive { vehicle_id } => write!(
                f,
                "Vehicle {} is not currently active or reporting",
                vehicle_id
            ),
        }
    }
}

pub struct TrackedVehicleSession<K> {
    store: Arc<LiveDataStore>,
    persist: K,
    tracked: Option<String>,
}

impl<K: SessionStore> TrackedVehicleSession<K> {
    /// Restore the session, picking up a previously persisted vehicle id.
    pub async fn load(store: Arc<LiveDataStore>, persist: K) -> Result<Self> {
        let tracked = persist.get(TRACKED_VEHICLE_KEY).await?;
        if let Some(id) = &tracked {
            tracing::info!(vehicle_id = %id, "Restored tracked vehicle");
        }
        Ok(Self {
            store,
            persist,
            tracked,
        })
    }

    /// Follow `vehicle_id`, replacing any previously tracked vehicle.
    pub async fn track(&mut self, vehicle_id: &str) -> Result<()> {
        self.persist.set(TRACKED_VEHICLE_KEY, vehicle_id).await?;
        self.tracked = Some(vehicle_id.to_string());
        tracing::info!(vehicle_id, "Tracking vehicle");
        Ok(())
    }

    /// Stop following the current vehicle, if any.
    pub async fn stop_tracking(&mut self) -> Result<()> {
        self.persist.remove(TRACKED_VEHICLE_KEY).await?;
        if let Some(id) = self.tracked.take() {
            tracing::info!(vehicle_id = %id, "Stopped tracking");
        }
        Ok(())
    }

    pub fn tracked_id(&self) -> Option<&str> {
        self.tracked.as_deref()
    }

    /// Re-derive the display state from the current vehicle snapshot.
    pub async fn view(&self) -> TrackedView {
        let Some(id) = &self.tracked else {
            return TrackedView::Untracked;
        };
        match self.store.find_vehicle(id).await {
            Some(vehicle) => TrackedView::Active { vehicle },
            None => TrackedView::Inactive {
                vehicle_id: id.clone(),
            },
        }
    }

    /// Coordinates to center the map on, when the tracked vehicle is active
    /// and reporting a position. Read-only: never mutates tracking state.
    pub async fn center_on_tracked(&self) -> Option<(f64, f64)> {
        let id = self.tracked.as_deref()?;
        self.store.find_vehicle(id).await?.position()
    }
}
