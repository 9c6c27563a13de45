//! `cnav decompose` — show how an intention splits into dimensions
//! without touching the corpus. Useful for tuning intention phrasing.

use anyhow::Result;
use chrono::Utc;

use convergence_navigator_core::decompose;

pub fn run_decompose(intention: &str, json: bool) -> Result<()> {
    let dimensions = decompose::decompose(intention, Utc::now())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dimensions)?);
        return Ok(());
    }

    println!("Intention: {intention}");
    println!("Confidence: {:.2}", dimensions.confidence);
    match &dimensions.temporal {
        Some(temporal) => println!(
            "temporal:    {:?} {} .. {} ({} days)",
            temporal.kind,
            temporal.start_date.format("%Y-%m-%d"),
            temporal.end_date.format("%Y-%m-%d"),
            temporal.day_window
        ),
        None => println!("temporal:    (none)"),
    }
    println!(
        "semantic:    {}",
        if dimensions.semantic.is_empty() {
            "(none)".to_string()
        } else {
            dimensions.semantic.join(", ")
        }
    );
    println!(
        "categorical: {}",
        if dimensions.categorical.is_empty() {
            "(none)".to_string()
        } else {
            dimensions.categorical.join(", ")
        }
    );
    println!(
        "analytical:  {}",
        dimensions.analytical.as_deref().unwrap_or("(none)")
    );
    Ok(())
}
