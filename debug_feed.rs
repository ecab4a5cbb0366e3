// One-shot probe for the live-data endpoints: fetch each feed once and dump
// what came back. Useful for checking a backend before pointing the monitor
// at it.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::var("TRANSIT_API_BASE")
        .unwrap_or_else(|_| "http://localhost:5000".to_string());

    let vehicles = fetch(&format!("{}/api/vehicles", base)).await?;
    println!("Vehicles: {} entities", vehicles.len());
    for (i, vehicle) in vehicles.iter().enumerate() {
        println!("\n--- Vehicle {} ---", i);
        println!("ID: {}", field(vehicle, "id"));
        println!("Route: {}", field(vehicle, "route_id"));
        println!(
            "Position: {}, {}",
            field(vehicle, "latitude"),
            field(vehicle, "longitude")
        );
        println!("Bearing: {}", field(vehicle, "bearing"));
        println!("Status: {}", field(vehicle, "current_status"));
        println!("Occupancy: {}", field(vehicle, "occupancy_status"));
        println!("Timestamp: {}", field(vehicle, "timestamp"));
    }

    let trips = fetch(&format!("{}/api/trips", base)).await?;
    println!("\nTrip updates: {} entities", trips.len());
    for (i, trip) in trips.iter().enumerate() {
        println!("\n--- Trip {} ---", i);
        println!("Trip ID: {}", field(trip, "trip_id"));

        let stops = trip
            .get("stop_time_updates")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        println!("Stop updates: {}", stops.len());
        for stop in stops.iter().take(3) {
            println!(
                "  Stop {}: arrival delay {:?}, departure delay {:?}",
                field(stop, "stop_id"),
                stop.get("arrival_delay"),
                stop.get("departure_delay")
            );
        }
        if stops.len() > 3 {
            println!("  ... and {} more stops", stops.len() - 3);
        }
    }

    Ok(())
}

async fn fetch(url: &str) -> anyhow::Result<Vec<serde_json::Value>> {
    println!("Fetching from: {}", url);
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("{} returned {}", url, status);
    }
    Ok(response.json().await?)
}

fn field(value: &serde_json::Value, name: &str) -> String {
    value
        .get(name)
        .map(|v| v.to_string())
        .unwrap_or_else(|| "absent".to_string())
}
