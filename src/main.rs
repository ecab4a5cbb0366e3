use std::sync::Arc;

use anyhow::Result;

use transit_companion::api::{PredictionSource, TransitClient};
use transit_companion::config::Config;
use transit_companion::poller::{Poller, UpdateEvent};
use transit_companion::reconciler::{PredictionRequest, Reconciler};
use transit_companion::session::{SqliteSessionStore, TrackedVehicleSession};
use transit_companion::store::LiveDataStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Transit Companion live monitor");
    tracing::info!(api = %config.api_base, "Backend");

    let store = Arc::new(LiveDataStore::new());
    let client = Arc::new(TransitClient::new(&config.api_base));

    let persist = SqliteSessionStore::new(&config.db_path).await?;
    let mut session = TrackedVehicleSession::load(Arc::clone(&store), persist).await?;
    if let Some(vehicle_id) = &config.track_vehicle {
        session.track(vehicle_id).await?;
    }

    let reconciler = Reconciler::new(Arc::clone(&store), Arc::clone(&client));

    let mut poller = Poller::new(client, Arc::clone(&store), config.poller());
    let mut events = poller.subscribe();
    poller.start();
    tracing::info!(
        vehicles_every = ?config.vehicles_every,
        trip_updates_every = ?config.trip_updates_every,
        "Polling started"
    );

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(UpdateEvent::Vehicles) => {
                    println!("\n🚌 {} vehicles reporting", store.vehicle_count().await);
                    println!("{}", session.view().await);
                }
                Ok(UpdateEvent::TripUpdates) => {
                    show_delays(&store, &reconciler).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Update stream interrupted");
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                poller.stop();
                break;
            }
        }
    }

    Ok(())
}

/// Print delay status for the first stop of each live trip, the pairs a stop
/// board would display.
async fn show_delays<P>(store: &Arc<LiveDataStore>, reconciler: &Reconciler<P>)
where
    P: PredictionSource + Send + Sync + 'static,
{
    const MAX_DISPLAYED_TRIPS: usize = 10;

    let requests: Vec<PredictionRequest> = store
        .trip_updates()
        .await
        .iter()
        .take(MAX_DISPLAYED_TRIPS)
        .filter_map(|trip| {
            trip.stop_time_updates
                .first()
                .map(|stop| PredictionRequest::new(trip.trip_id.as_str(), stop.stop_id.as_str()))
        })
        .collect();

    if requests.is_empty() {
        println!("\n⚠️  No active trips in the latest update");
        return;
    }

    let readings = reconciler.coarse_pass(&requests).await;
    println!("\n📊 Schedule status ({} trips):", readings.len());
    for reading in &readings {
        println!(
            "  Trip {} at stop {}: {}",
            reading.trip_id, reading.stop_id, reading.status
        );
    }

    for view in reconciler.fine_pass(&requests).await {
        println!(
            "  Trip {} at stop {}: predicted {} ({})",
            view.trip_id,
            view.stop_id,
            view.predicted_time.as_deref().unwrap_or("N/A"),
            view.crowding
        );
    }
}
