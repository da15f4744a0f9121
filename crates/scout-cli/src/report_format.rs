//! Turns a `Report` into the user-visible CLI output (spec section 7:
//! "selected connectors; per-connector latency/cost/count/status;
//! candidates found; final entities; persistence outcomes; and an
//! enumerated error list. No stack traces in user output.").

use scout_orchestrator::Report;

pub fn print_human(report: &Report) {
    println!("lens: {} ({})", report.lens_id, report.lens_hash);
    println!("selected connectors: {}", report.selected_connectors.join(", "));
    println!();

    let mut names: Vec<&String> = report.connector_metrics.keys().collect();
    names.sort();
    for name in names {
        let m = &report.connector_metrics[name];
        let latency_ms = m.latency.map(|d| d.as_millis()).unwrap_or(0);
        println!(
            "  {name}: status={status} latency_ms={latency_ms} cost_usd={cost:.4} candidates={count}",
            status = m.status.as_str(),
            cost = m.cost_usd,
            count = m.candidate_count,
        );
    }
    println!();

    println!("candidates gathered: {}", report.candidate_count);
    println!("entities produced: {}", report.entities.len());
    println!("persisted: {}", report.persisted);

    if !report.errors.is_empty() {
        println!();
        println!("errors:");
        for err in &report.errors {
            println!("  [{}] {}: {}", err.kind, err.source, err.message);
        }
    }
}

/// Machine-readable form of the same report, for scripting.
pub fn to_json(report: &Report) -> serde_json::Value {
    serde_json::json!({
        "lens_id": report.lens_id,
        "lens_hash": report.lens_hash,
        "selected_connectors": report.selected_connectors,
        "candidate_count": report.candidate_count,
        "entity_count": report.entities.len(),
        "persisted": report.persisted,
        "errors": report.errors.iter().map(|e| serde_json::json!({
            "source": e.source,
            "kind": e.kind,
            "message": e.message,
        })).collect::<Vec<_>>(),
    })
}
