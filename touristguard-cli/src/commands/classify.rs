//! Classify command - one-off zone lookup for a coordinate.

use touristguard::geofence::{classify, GeoPoint, GeofenceStore};

use super::tracking::describe;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the classify command.
pub struct ClassifyArgs {
    pub lat: f64,
    pub lon: f64,
    pub json: bool,
    pub verbose: bool,
}

/// Run the classify command.
pub fn run(args: ClassifyArgs) -> Result<(), CliError> {
    let point = GeoPoint::new(args.lat, args.lon);
    if !point.is_valid() {
        return Err(CliError::Config(format!(
            "Invalid coordinate {}, latitude must be within ±90 and longitude within ±180",
            point
        )));
    }

    let runner = CliRunner::new(args.verbose)?;
    runner.log_startup("classify");
    let runtime = runner.runtime()?;
    let client = runner.api_client()?;

    let snapshot = runtime.block_on(async {
        let store = GeofenceStore::new(client);
        store.refresh().await.map_err(CliError::Geofences)?;
        Ok::<_, CliError>(store.current())
    })?;

    let result = classify(point, &snapshot);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::Config(format!("Failed to encode result: {}", e)))?;
        println!("{}", json);
    } else {
        println!(
            "Zones: {} loaded, {} active",
            snapshot.zones().len(),
            snapshot.active_count()
        );
        println!("{}", describe(&result));
    }

    Ok(())
}
