//! Example: ingest a handful of events and recommend for one profile
//!
//! Run with: cargo run --example recommend
//!
//! Uses the model-free hashing encoder so it runs offline. Swap in
//! `FastEmbedEncoder::new()?` for real sentence embeddings (first run
//! downloads the model, ~30MB).

use rendez_core::{
    EngineConfig, EventRecord, HashingEncoder, HnswStore, InMemorySource, RecommendationEngine,
    UserProfile,
};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let events = vec![
        EventRecord::new(
            "Robotics Workshop",
            "Innovation Lab",
            "Hands-on robotics and automation workshop with technology demos",
            "Technology students",
        ),
        EventRecord::new(
            "Painting Exhibition",
            "Art Gallery",
            "Watercolor landscape painting exhibition",
            "Arts students",
        ),
        EventRecord::new(
            "Robotics Workshop Session 2",
            "Innovation Lab",
            "Hands-on robotics and automation workshop with technology demos",
            "Technology students",
        ),
        EventRecord::new(
            "Career Fair",
            "Sports Hall",
            "Meet recruiters from software and hardware companies",
            "Final year students",
        ),
    ];

    let engine = RecommendationEngine::new(
        Arc::new(HashingEncoder::default()),
        HnswStore::new(),
        InMemorySource::new(events),
        EngineConfig::default(),
    )?;

    let report = engine.ensure_ready()?;
    println!(
        "Ingested {} events ({} skipped as duplicates)",
        report.inserted, report.skipped
    );

    let profile = UserProfile::new("Asha", "Female", "Student")
        .with_department("Computer Science")
        .with_year(2)
        .with_interests(vec!["Technology".into(), "Business".into()]);

    println!("\nRecommendations for {}:", profile.name);
    for pick in engine.recommend(&profile, None, Some(5))? {
        println!("  {:>6.3}  {}", pick.score, pick.event.title);
    }

    Ok(())
}
