//! Single source of truth for the latest fetched live data.
//!
//! Each slice (vehicles, trip updates) is an immutable snapshot behind its
//! own lock: replaces swap the whole `Arc`, so readers either see the old
//! list or the new one, never a half-written mix.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{StopTimeUpdate, TripUpdate, Vehicle};

#[derive(Debug, Default)]
pub struct LiveDataStore {
    vehicles: RwLock<Arc<Vec<Vehicle>>>,
    trip_updates: RwLock<Arc<Vec<TripUpdate>>>,
}

impl LiveDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the vehicle snapshot wholesale. No merging with the previous
    /// list; a vehicle absent from `vehicles` is gone.
    pub async fn set_vehicles(&self, vehicles: Vec<Vehicle>) {
        *self.vehicles.write().await = Arc::new(vehicles);
    }

    /// Replace the trip-update snapshot wholesale.
    pub async fn set_trip_updates(&self, trip_updates: Vec<TripUpdate>) {
        *self.trip_updates.write().await = Arc::new(trip_updates);
    }

    /// Current vehicle snapshot (cheap `Arc` clone).
    pub async fn vehicles(&self) -> Arc<Vec<Vehicle>> {
        self.vehicles.read().await.clone()
    }

    /// Current trip-update snapshot (cheap `Arc` clone).
    pub async fn trip_updates(&self) -> Arc<Vec<TripUpdate>> {
        self.trip_updates.read().await.clone()
    }

    /// Look up a vehicle in the current snapshot. Absence is normal, not an
    /// error.
    pub async fn find_vehicle(&self, id: &str) -> Option<Vehicle> {
        self.vehicles
            .read()
            .await
            .iter()
            .find(|v| v.id == id)
            .cloned()
    }

    pub async fn find_trip_update(&self, trip_id: &str) -> Option<TripUpdate> {
        self.trip_updates
            .read()
            .await
            .iter()
            .find(|t| t.trip_id == trip_id)
            .cloned()
    }

    pub async fn find_stop_update(&self, trip_id: &str, stop_id: &str) -> Option<StopTimeUpdate> {
        self.trip_updates
            .read()
            .await
            .iter()
            .find(|t| t.trip_id == trip_id)
            .and_then(|t| t.stop_update(stop_id))
            .cloned()
    }

    pub async fn vehicle_count(&self) -> usize {
        self.vehicles.read().await.len()
    }
}
