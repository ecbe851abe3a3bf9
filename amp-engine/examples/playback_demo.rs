//! # Player Engine Demo
//!
//! Loads a synthesized clip from memory, plays it through a ring-buffer
//! output, and prints the lifecycle events a host would react to.
//!
//! Run with: `cargo run --example playback_demo --package amp-engine`

use amp_engine::{
    EngineConfig, LoadRequest, PlayOptions, PlayerEngine, RingBuffer, RingOutput,
};
use amp_media::MediaSource;
use amp_runtime::events::PlayerEvent;
use amp_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// Synthesize a one-second 440 Hz stereo WAV entirely in memory.
fn sine_wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..44100 {
            let t = i as f32 / 44100.0;
            let sample =
                ((std::f32::consts::TAU * 440.0 * t).sin() * 0.3 * i16::MAX as f32) as i16;
            writer.write_sample(sample).unwrap();
            writer.write_sample(sample).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[tokio::main]
async fn main() -> amp_engine::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info),
    )
    .ok();

    println!("Player engine demo\n");

    // Ring-buffer output: a real host would drain this from its audio
    // device callback. Here a task plays the consumer.
    let buffer = RingBuffer::new(44100 * 2);
    let output = RingOutput::new(buffer.clone());
    let consumer = tokio::spawn(async move {
        let mut scratch = vec![0.0f32; 4096];
        loop {
            buffer.read(&mut scratch);
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    });

    let engine = PlayerEngine::new(
        EngineConfig::builder().output(Arc::new(output)).build()?,
    )?;

    // Watch the lifecycle
    let mut events = engine.events();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event {
                PlayerEvent::Position { position, .. } => {
                    println!("  position: {:.2}s", position.as_secs_f64());
                }
                other => println!("  event: {}", other.description()),
            }
            if matches!(event, PlayerEvent::Released { .. }) {
                break;
            }
        }
    });

    println!("Loading clip from memory...");
    engine
        .load(LoadRequest::new("demo", MediaSource::memory(sine_wav())))
        .await?;
    println!(
        "Loaded (duration: {:?})\n",
        engine.duration("demo")?.unwrap_or_default()
    );

    engine.set_volume("demo", 0.8)?;
    engine.play("demo", PlayOptions::new())?;

    // Let half the clip play, then jump around
    tokio::time::sleep(Duration::from_millis(300)).await;
    engine.seek("demo", Duration::from_millis(800)).await?;

    // Wait for completion, then clean up
    while engine.state("demo")? != amp_engine::PlayerState::Completed {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    engine.release("demo").await?;
    watcher.await.ok();
    consumer.abort();

    println!("\nDemo complete.");

    Ok(())
}
