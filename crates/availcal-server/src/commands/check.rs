//! `availcal check`: one aggregation, printed to stdout.

use availcal_core::AvailabilitySnapshot;

use crate::api::AvailabilityResponse;
use crate::config::AppConfig;
use crate::error::{ServerError, ServerResult};

use super::build_aggregator;

/// Aggregates once. Fails only if every source failed.
pub async fn run(config: &AppConfig, json: bool) -> ServerResult<()> {
    let aggregator = build_aggregator(config)?;
    let snapshot = aggregator.aggregate().await?;

    if json {
        let body = serde_json::to_string_pretty(&AvailabilityResponse::from(&snapshot))
            .map_err(|e| ServerError::config(format!("failed to serialize result: {}", e)))?;
        println!("{}", body);
    } else {
        print!("{}", render(&snapshot));
    }
    Ok(())
}

fn render(snapshot: &AvailabilitySnapshot) -> String {
    let width = snapshot
        .sources()
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for source in snapshot.sources() {
        let detail = match source.error {
            Some(ref error) => error.clone(),
            None => format!(
                "{} events, {} skipped, {} days",
                source.events, source.skipped_entries, source.booked_days
            ),
        };
        out.push_str(&format!(
            "{:width$}  {:12}  {}\n",
            source.name,
            source.status.as_str(),
            detail
        ));
    }

    let failed = snapshot.sources().iter().filter(|s| !s.is_ok()).count();
    out.push_str(&format!("\n{} booked days", snapshot.len()));
    if failed > 0 {
        out.push_str(&format!(" (partial: {} of {} sources failed)", failed, snapshot.sources().len()));
    }
    out.push('\n');

    for day in snapshot.booked_days() {
        out.push_str(&format!("{}\n", day));
    }
    out
}
