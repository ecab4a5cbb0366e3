//! Periodic fetch-and-replace cycles for the two live data slices.
//!
//! Each slice is one spawned task on its own interval. A failed fetch keeps
//! the previous snapshot (stale-but-consistent beats blank); a successful
//! fetch replaces the slice and broadcasts a typed update event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::FeedSource;
use crate::store::LiveDataStore;

/// Broadcast when a slice of the Live Data Store has been replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent {
    Vehicles,
    TripUpdates,
}

/// Poll cadences. Configuration, not policy: both cycles can be retimed
/// independently.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub vehicles_every: Duration,
    pub trip_updates_every: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            vehicles_every: Duration::from_secs(30),
            trip_updates_every: Duration::from_secs(60),
        }
    }
}

/// Per-slice fetch ordering guard.
///
/// Every fetch is stamped before it starts; only results newer than the last
/// applied stamp may replace the slice, so a slow early fetch can never
/// overwrite fresher data.
#[derive(Debug, Default)]
struct SliceGate {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl SliceGate {
    fn stamp(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn try_apply(&self, stamp: u64) -> bool {
        self.applied.fetch_max(stamp, Ordering::SeqCst) < stamp
    }
}

pub struct Poller<S> {
    source: Arc<S>,
    store: Arc<LiveDataStore>,
    config: PollerConfig,
    events: broadcast::Sender<UpdateEvent>,
    vehicle_gate: Arc<SliceGate>,
    trip_gate: Arc<SliceGate>,
    vehicle_task: Option<JoinHandle<()>>,
    trip_task: Option<JoinHandle<()>>,
}

impl<S: FeedSource + Send + Sync + 'static> Poller<S> {
    pub fn new(source: Arc<S>, store: Arc<LiveDataStore>, config: PollerConfig) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            source,
            store,
            config,
            events,
            vehicle_gate: Arc::new(SliceGate::default()),
            trip_gate: Arc::new(SliceGate::default()),
            vehicle_task: None,
            trip_task: None,
        }
    }

    /// Subscribe to slice-replaced notifications. Fire-and-forget on the
    /// sending side; a lagging subscriber only misses events, never blocks
    /// the poller.
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.events.subscribe()
    }

    /// Start (or restart) both cycles. The first tick of each fires
    /// immediately, so a fresh start also serves as the initial load.
    pub fn start(&mut self) {
        self.start_vehicle_cycle();
        self.start_trip_update_cycle();
    }

    /// Start the vehicle cycle, cancelling any previously scheduled one so
    /// restarts never accumulate duplicate timers.
    pub fn start_vehicle_cycle(&mut self) {
        if let Some(task) = self.vehicle_task.take() {
            task.abort();
        }

        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let gate = Arc::clone(&self.vehicle_gate);
        let events = self.events.clone();
        let every = self.config.vehicles_every;

        self.vehicle_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // A fetch that outlives its tick just delays the next one
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let stamp = gate.stamp();
                match source.fetch_vehicles().await {
                    Ok(vehicles) => {
                        if gate.try_apply(stamp) {
                            let count = vehicles.len();
                            store.set_vehicles(vehicles).await;
                            tracing::info!(count, "Vehicle snapshot replaced");
                            let _ = events.send(UpdateEvent::Vehicles);
                        } else {
                            tracing::debug!(stamp, "Discarding stale vehicle fetch");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Vehicle poll failed, keeping previous snapshot");
                    }
                }
            }
        }));
    }

    /// Start the trip-update cycle; same restart semantics as the vehicle
    /// cycle.
    pub fn start_trip_update_cycle(&mut self) {
        if let Some(task) = self.trip_task.take() {
            task.abort();
        }

        let source = Arc::clone(&self.source);
        let store = Arc::clone(&self.store);
        let gate = Arc::clone(&self.trip_gate);
        let events = self.events.clone();
        let every = self.config.trip_updates_every;

        self.trip_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let stamp = gate.stamp();
                match source.fetch_trip_updates().await {
                    Ok(updates) => {
                        if gate.try_apply(stamp) {
                            let count = updates.len();
                            store.set_trip_updates(updates).await;
                            tracing::info!(count, "Trip-update snapshot replaced");
                            let _ = events.send(UpdateEvent::TripUpdates);
                        } else {
                            tracing::debug!(stamp, "Discarding stale trip-update fetch");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Trip-update poll failed, keeping previous snapshot");
                    }
                }
            }
        }));
    }

    /// Cancel both cycles. In-flight requests are dropped, not errored.
    pub fn stop(&mut self) {
        if let Some(task) = self.vehicle_task.take() {
            task.abort();
        }
        if let Some(task) = self.trip_task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.vehicle_task.is_some() || self.trip_task.is_some()
    }
}

impl<S> Drop for Poller<S> {
    fn drop(&mut self) {
        if let Some(task) = self.vehicle_task.take() {
            task.abort();
        }
        if let Some(task) = self.trip_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::{StopTimeUpdate, TripUpdate, Vehicle};
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;

    fn vehicle(id: &str) -> Vehicle {
        Vehicle {
            id: id.to_string(),
            route_id: Some("3".to_string()),
            latitude: Some(51.0),
            longitude: Some(-114.0),
            bearing: 90.0,
            current_status: Some(2),
            occupancy_status: Some(1),
            timestamp: Some(1_700_000_000),
        }
    }

    fn decode_failure() -> FetchError {
        FetchError::Status {
            endpoint: "vehicles",
            status: reqwest::StatusCode::BAD_GATEWAY,
        }
    }

    /// Feed that replays scripted responses; once exhausted, every further
    /// fetch fails so stray ticks can never disturb the store.
    struct ScriptedFeed {
        vehicle_responses: Mutex<VecDeque<Result<Vec<Vehicle>, FetchError>>>,
        trip_responses: Mutex<VecDeque<Result<Vec<TripUpdate>, FetchError>>>,
    }

    impl ScriptedFeed {
        fn new(
            vehicles: Vec<Result<Vec<Vehicle>, FetchError>>,
            trips: Vec<Result<Vec<TripUpdate>, FetchError>>,
        ) -> Self {
            Self {
                vehicle_responses: Mutex::new(vehicles.into()),
                trip_responses: Mutex::new(trips.into()),
            }
        }
    }

    impl FeedSource for ScriptedFeed {
        fn fetch_vehicles(
            &self,
        ) -> impl Future<Output = Result<Vec<Vehicle>, FetchError>> + Send {
            let next = self
                .vehicle_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(decode_failure()));
            async move { next }
        }

        fn fetch_trip_updates(
            &self,
        ) -> impl Future<Output = Result<Vec<TripUpdate>, FetchError>> + Send {
            let next = self
                .trip_responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(decode_failure()));
            async move { next }
        }
    }

    #[test]
    fn gate_rejects_results_older_than_the_last_applied() {
        let gate = SliceGate::default();
        let early = gate.stamp();
        let late = gate.stamp();

        assert!(gate.try_apply(late));
        // The slower, earlier-started fetch completes second and is dropped
        assert!(!gate.try_apply(early));
        // Re-applying the same stamp is also a no-op
        assert!(!gate.try_apply(late));
        assert!(gate.try_apply(gate.stamp()));
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_loads_and_broadcasts() {
        let store = Arc::new(LiveDataStore::new());
        let feed = Arc::new(ScriptedFeed::new(
            vec![Ok(vec![vehicle("v1"), vehicle("v2")])],
            vec![Ok(vec![TripUpdate {
                trip_id: "t1".into(),
                stop_time_updates: vec![],
            }])],
        ));

        let mut poller = Poller::new(feed, Arc::clone(&store), PollerConfig::default());
        let mut events = poller.subscribe();
        poller.start();

        let mut seen = Vec::new();
        for _ in 0..2 {
            seen.push(events.recv().await.unwrap());
        }
        assert!(seen.contains(&UpdateEvent::Vehicles));
        assert!(seen.contains(&UpdateEvent::TripUpdates));
        assert_eq!(store.vehicle_count().await, 2);
        assert!(store.find_trip_update("t1").await.is_some());

        poller.stop();
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_poll_keeps_previous_snapshot() {
        let store = Arc::new(LiveDataStore::new());
        let feed = Arc::new(ScriptedFeed::new(
            vec![Ok(vec![vehicle("v1")]), Err(decode_failure())],
            vec![],
        ));

        let mut poller = Poller::new(
            feed,
            Arc::clone(&store),
            PollerConfig {
                vehicles_every: Duration::from_secs(30),
                trip_updates_every: Duration::from_secs(3600),
            },
        );
        let mut events = poller.subscribe();
        poller.start_vehicle_cycle();

        assert_eq!(events.recv().await.unwrap(), UpdateEvent::Vehicles);
        assert!(store.find_vehicle("v1").await.is_some());

        // Second tick fails; the snapshot must be untouched and no event sent
        tokio::time::advance(Duration::from_secs(31)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(store.find_vehicle("v1").await.is_some());
        assert_eq!(store.vehicle_count().await, 1);
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));

        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_the_scheduled_cycle() {
        let store = Arc::new(LiveDataStore::new());
        let feed = Arc::new(ScriptedFeed::new(
            vec![
                Ok(vec![vehicle("v1")]),
                Ok(vec![vehicle("v2")]),
                Ok(vec![vehicle("v3")]),
            ],
            vec![],
        ));

        let mut poller = Poller::new(feed, Arc::clone(&store), PollerConfig::default());
        let mut events = poller.subscribe();

        poller.start_vehicle_cycle();
        assert_eq!(events.recv().await.unwrap(), UpdateEvent::Vehicles);

        // Restarting cancels the old timer and fires a fresh immediate tick
        poller.start_vehicle_cycle();
        assert_eq!(events.recv().await.unwrap(), UpdateEvent::Vehicles);
        assert!(store.find_vehicle("v2").await.is_some());
        assert!(store.find_vehicle("v1").await.is_none());

        // Only one live cycle remains: a single tick yields a single event
        tokio::time::advance(Duration::from_secs(31)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(events.try_recv().unwrap(), UpdateEvent::Vehicles);
        assert!(store.find_vehicle("v3").await.is_some());
        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));

        poller.stop();
    }
}
