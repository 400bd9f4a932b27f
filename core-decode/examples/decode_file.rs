//! # Decode File Example
//!
//! Decodes an audio file into in-memory arrays and prints what the host
//! would have received.
//!
//! Run with: `cargo run --example decode_file --package core-decode -- song.mp3`

use bridge_desktop::{MemoryArrayStore, TracingOutlet};
use bridge_traits::LogLevel;
use core_decode::{ArrayDecoder, DecodeConfig};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: decode_file <audio file>")?;

    let store = Arc::new(MemoryArrayStore::new());
    store.create("left", 1);
    store.create("right", 1);

    let config = CoreConfig::builder()
        .object_name("decode_file")
        .array_store(store.clone())
        .outlet(Arc::new(TracingOutlet))
        .build()?;
    let decoder = ArrayDecoder::with_config(config, DecodeConfig::default())?;

    let info = decoder.open(&path)?;
    println!("{}", serde_json::to_string_pretty(&info)?);

    let bound = decoder.bind("left", Some("right"));
    println!("Bound arrays: {:?}", bound);

    let report = decoder.decode();
    println!(
        "Decoded {} samples in {} reads ({} clamped writes)",
        report.samples, report.iterations, report.overruns
    );

    // Peak per channel
    for name in ["left", "right"].iter().take(info.channels as usize) {
        let data = store.snapshot(name).unwrap_or_default();
        let peak = data.iter().fold(0.0f32, |acc, v| acc.max(v.abs()));
        println!("{name}: {} samples, peak {:.3}", data.len(), peak);
    }

    Ok(())
}
