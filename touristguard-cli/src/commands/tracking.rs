//! Foreground tracking loop shared by `activate` and `run`.
//!
//! Prints state changes and zone transitions until Ctrl+C, then stops the
//! session (draining the delivery queue) and prints a summary.
//!
//! The stored identity is re-read every [`IDENTITY_CHECK_INTERVAL`]. When a
//! `reset` (or an `activate` for another identity) from a different process
//! has replaced it, tracking stops as though Ctrl+C had been pressed.

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use touristguard::geofence::{RiskLevel, ZoneClassification};
use touristguard::identity::IdentityToken;
use touristguard::session::{SessionHandle, SessionSummary};

use crate::error::CliError;
use crate::runner::TrackingHost;

/// How often the stored identity is compared with the tracked one.
pub const IDENTITY_CHECK_INTERVAL: Duration = Duration::from_secs(2);

/// Follow `session` until Ctrl+C, then stop it.
pub async fn follow(host: TrackingHost, session: SessionHandle) -> Result<(), CliError> {
    println!("Tracking identity {}", session.identity());
    if let Some(name) = session.profile().and_then(|p| p.display_name.as_deref()) {
        println!("  Tourist: {}", name);
    }
    println!();
    println!("Press Ctrl+C to stop tracking");
    println!();

    let mut states = session.watch_state();
    let mut classifications = session.subscribe_classifications();
    let mut last_zone: Option<(Vec<String>, Option<RiskLevel>)> = None;
    let mut classifications_open = true;
    let mut identity_check = tokio::time::interval(IDENTITY_CHECK_INTERVAL);
    identity_check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, stopping tracking");
                break;
            }
            _ = identity_check.tick() => match host.controller.stored_identity() {
                Ok(stored) => {
                    if identity_replaced(session.identity(), stored.as_ref()) {
                        tracing::info!(
                            identity = %session.identity(),
                            stored = ?stored.as_ref().map(IdentityToken::as_str),
                            "Stored identity changed by another process, stopping tracking"
                        );
                        println!("Identity {} was reset elsewhere", session.identity());
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to re-read stored identity"),
            },
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                println!("Session {}", state);
                if !state.is_tracking() {
                    break;
                }
            }
            received = classifications.recv(), if classifications_open => match received {
                Ok(classification) => {
                    let zone = zone_key(&classification);
                    if last_zone.as_ref() != Some(&zone) {
                        println!("{}", describe(&classification));
                        last_zone = Some(zone);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Classification output lagged");
                }
                Err(RecvError::Closed) => classifications_open = false,
            },
        }
    }

    println!();
    println!("Stopping, delivering queued locations...");
    let summary = host.controller.stop().await?;
    host.shutdown().await;

    if let Some(summary) = summary {
        print_summary(&summary);
    }
    Ok(())
}

/// Returns true once the store no longer holds the tracked identity.
fn identity_replaced(tracked: &IdentityToken, stored: Option<&IdentityToken>) -> bool {
    stored != Some(tracked)
}

fn zone_key(classification: &ZoneClassification) -> (Vec<String>, Option<RiskLevel>) {
    let ids = classification
        .zone_ids()
        .into_iter()
        .map(str::to_string)
        .collect();
    (ids, classification.highest_risk)
}

/// One-line description of a classification.
pub fn describe(classification: &ZoneClassification) -> String {
    match classification.highest_risk {
        None => format!("{} - outside all zones", classification.point),
        Some(risk) => {
            let names: Vec<&str> = classification
                .containing_zones
                .iter()
                .map(|z| z.name.as_str())
                .collect();
            format!(
                "{} - {} risk ({})",
                classification.point,
                risk,
                names.join(", ")
            )
        }
    }
}

fn print_summary(summary: &SessionSummary) {
    let stats = &summary.stats;
    println!();
    println!("Session summary for {}", summary.identity);
    println!("  Uptime:        {}s", stats.uptime.as_secs());
    println!("  Samples:       {}", stats.samples);
    println!("  Delivered:     {}", stats.delivery.delivered);
    println!("  Retried:       {}", stats.delivery.retried);
    println!("  Dropped:       {}", stats.delivery.dropped);
    if summary.drain.discarded > 0 {
        println!(
            "  Not delivered: {} (still failing at shutdown)",
            summary.drain.discarded
        );
    }
    println!("  Degradations:  {}", stats.degradations);
}

#[cfg(test)]
mod tests {
    use super::*;
    use touristguard::geofence::{classify, GeoPoint, Geofence, GeofenceSnapshot};

    fn snapshot() -> GeofenceSnapshot {
        GeofenceSnapshot::new(
            1,
            vec![Geofence::circle(
                "z1",
                "Old Fort",
                RiskLevel::High,
                GeoPoint::new(28.0, 77.0),
                500.0,
            )],
        )
    }

    #[test]
    fn test_describe_inside_zone() {
        let result = classify(GeoPoint::new(28.0, 77.0), &snapshot());
        let line = describe(&result);
        assert!(line.contains("high risk"));
        assert!(line.contains("Old Fort"));
    }

    #[test]
    fn test_identity_replaced() {
        let tracked = IdentityToken::parse("TID-1").unwrap();
        let other = IdentityToken::parse("TID-2").unwrap();

        assert!(!identity_replaced(&tracked, Some(&tracked)));
        assert!(identity_replaced(&tracked, None));
        assert!(identity_replaced(&tracked, Some(&other)));
    }

    #[test]
    fn test_describe_outside_zones() {
        let result = classify(GeoPoint::new(10.0, 10.0), &snapshot());
        assert!(describe(&result).ends_with("outside all zones"));
    }
}
