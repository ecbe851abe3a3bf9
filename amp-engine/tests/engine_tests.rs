//! End-to-end tests for the player engine against real WAV fixtures.
//!
//! These exercise the full registry surface the way a host plugin would:
//! load by id, control by id, watch the event bus, release.

use amp_engine::{
    EngineConfig, EngineError, LoadRequest, NullOutput, PlayOptions, PlayerEngine, PlayerState,
};
use amp_media::error::Result as MediaResult;
use amp_media::traits::{AudioFormat, AudioOutput, AudioSink};
use amp_media::MediaSource;
use amp_runtime::events::{EventStream, PlayerEvent};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

const SAMPLE_RATE: u32 = 44100;

/// Output capturing all written samples, for asserting on what "played".
#[derive(Clone, Default)]
struct CaptureOutput {
    samples: Arc<Mutex<Vec<f32>>>,
}

impl CaptureOutput {
    fn sample_count(&self) -> usize {
        self.samples.lock().len()
    }
}

#[async_trait]
impl AudioOutput for CaptureOutput {
    async fn open(&self, _format: AudioFormat) -> MediaResult<Box<dyn AudioSink>> {
        Ok(Box::new(CaptureSink {
            samples: Arc::clone(&self.samples),
        }))
    }
}

struct CaptureSink {
    samples: Arc<Mutex<Vec<f32>>>,
}

#[async_trait]
impl AudioSink for CaptureSink {
    async fn write(&mut self, samples: &[f32]) -> MediaResult<()> {
        self.samples.lock().extend_from_slice(samples);
        tokio::task::yield_now().await;
        Ok(())
    }

    async fn flush(&mut self) -> MediaResult<()> {
        Ok(())
    }

    async fn discard(&mut self) -> MediaResult<()> {
        Ok(())
    }

    async fn close(&mut self) -> MediaResult<()> {
        Ok(())
    }
}

/// Write a mono 16-bit WAV tone fixture.
fn write_wav(dir: &TempDir, name: &str, frames: usize) -> PathBuf {
    let path = dir.path().join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for i in 0..frames {
        let t = i as f32 / SAMPLE_RATE as f32;
        let sample = ((std::f32::consts::TAU * 220.0 * t).sin() * 0.5 * i16::MAX as f32) as i16;
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();

    path
}

fn engine_with(output: Arc<dyn AudioOutput>) -> PlayerEngine {
    let config = EngineConfig::builder().output(output).build().unwrap();
    PlayerEngine::new(config).unwrap()
}

async fn next_matching(
    stream: &mut EventStream,
    what: &str,
) -> PlayerEvent {
    timeout(Duration::from_secs(5), stream.recv())
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", what))
        .unwrap()
}

#[tokio::test]
async fn load_play_complete_lifecycle() {
    let dir = TempDir::new().unwrap();
    let frames = SAMPLE_RATE as usize / 10; // 0.1s
    let path = write_wav(&dir, "clip.wav", frames);

    let output = CaptureOutput::default();
    let engine = engine_with(Arc::new(output.clone()));
    let mut events = engine.events();

    engine
        .load(LoadRequest::new("clip", MediaSource::local(&path)))
        .await
        .unwrap();

    assert!(engine.contains("clip"));
    assert_eq!(engine.state("clip").unwrap(), PlayerState::Idle);

    // Loaded event carries the duration
    match next_matching(&mut events, "Loaded").await {
        PlayerEvent::Loaded { audio_id, duration } => {
            assert_eq!(audio_id, "clip");
            assert_eq!(duration.unwrap().as_millis(), 100);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(engine.duration("clip").unwrap().unwrap().as_millis(), 100);

    engine.play("clip", PlayOptions::new()).unwrap();

    loop {
        match next_matching(&mut events, "Completed").await {
            PlayerEvent::Completed { audio_id } => {
                assert_eq!(audio_id, "clip");
                break;
            }
            _ => continue,
        }
    }

    // Whole clip reached the output, position rewound
    assert_eq!(output.sample_count(), frames);
    assert_eq!(engine.state("clip").unwrap(), PlayerState::Completed);
    assert_eq!(engine.position("clip").unwrap(), Duration::ZERO);

    engine.release("clip").await.unwrap();
    assert!(!engine.contains("clip"));
}

#[tokio::test]
async fn duplicate_load_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir, "clip.wav", 1024);

    let engine = engine_with(Arc::new(NullOutput::new()));

    engine
        .load(LoadRequest::new("dup", MediaSource::local(&path)))
        .await
        .unwrap();

    let result = engine
        .load(LoadRequest::new("dup", MediaSource::local(&path)))
        .await;
    assert!(matches!(result, Err(EngineError::PlayerExists(id)) if id == "dup"));

    engine.release_all().await;
}

#[tokio::test]
async fn controls_on_unknown_player_fail() {
    let engine = engine_with(Arc::new(NullOutput::new()));

    assert!(matches!(
        engine.play("ghost", PlayOptions::new()),
        Err(EngineError::UnknownPlayer(_))
    ));
    assert!(matches!(
        engine.pause("ghost"),
        Err(EngineError::UnknownPlayer(_))
    ));
    assert!(matches!(
        engine.seek("ghost", Duration::ZERO).await,
        Err(EngineError::UnknownPlayer(_))
    ));
    assert!(matches!(
        engine.set_volume("ghost", 0.5),
        Err(EngineError::UnknownPlayer(_))
    ));
    assert!(matches!(
        engine.release("ghost").await,
        Err(EngineError::UnknownPlayer(_))
    ));
}

#[tokio::test]
async fn load_failure_rolls_back_registration() {
    let engine = engine_with(Arc::new(NullOutput::new()));

    let result = engine
        .load(LoadRequest::new(
            "missing",
            MediaSource::local("/nonexistent/audio.wav"),
        ))
        .await;

    match result {
        Err(EngineError::LoadFailed { audio_id, .. }) => assert_eq!(audio_id, "missing"),
        other => panic!("expected LoadFailed, got {:?}", other.err()),
    }
    assert!(!engine.contains("missing"));

    // The id is free for a successful retry
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir, "clip.wav", 1024);
    engine
        .load(LoadRequest::new("missing", MediaSource::local(&path)))
        .await
        .unwrap();

    engine.release_all().await;
}

#[cfg(not(feature = "remote-sources"))]
#[tokio::test]
async fn remote_source_requires_feature() {
    let engine = engine_with(Arc::new(NullOutput::new()));

    let result = engine
        .load(LoadRequest::new(
            "stream",
            MediaSource::remote("https://example.com/a.mp3"),
        ))
        .await;

    assert!(matches!(result, Err(EngineError::RemoteSourcesDisabled)));
    assert!(!engine.contains("stream"));
}

#[tokio::test]
async fn release_frees_the_audio_id() {
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir, "clip.wav", 2048);

    let engine = engine_with(Arc::new(NullOutput::new()));
    let mut events = engine.events();

    engine
        .load(LoadRequest::new("temp", MediaSource::local(&path)))
        .await
        .unwrap();
    engine.release("temp").await.unwrap();

    assert!(!engine.contains("temp"));
    assert!(matches!(
        engine.play("temp", PlayOptions::new()),
        Err(EngineError::UnknownPlayer(_))
    ));

    // Released event observed
    loop {
        match next_matching(&mut events, "Released").await {
            PlayerEvent::Released { audio_id } => {
                assert_eq!(audio_id, "temp");
                break;
            }
            _ => continue,
        }
    }

    // The id can be loaded again
    engine
        .load(LoadRequest::new("temp", MediaSource::local(&path)))
        .await
        .unwrap();
    engine.release_all().await;
}

#[tokio::test]
async fn release_all_clears_every_player() {
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir, "clip.wav", 1024);

    let engine = engine_with(Arc::new(NullOutput::new()));

    for id in ["a", "b", "c"] {
        engine
            .load(LoadRequest::new(id, MediaSource::local(&path)))
            .await
            .unwrap();
    }
    assert_eq!(engine.audio_ids().len(), 3);

    engine.release_all().await;
    assert!(engine.audio_ids().is_empty());
}

#[tokio::test]
async fn pause_and_resume_by_id() {
    let dir = TempDir::new().unwrap();
    // Long enough that it is still playing when we pause
    let path = write_wav(&dir, "clip.wav", SAMPLE_RATE as usize * 10);

    let output = CaptureOutput::default();
    let engine = engine_with(Arc::new(output.clone()));

    engine
        .load(LoadRequest::new("bgm", MediaSource::local(&path)))
        .await
        .unwrap();
    engine.play("bgm", PlayOptions::new()).unwrap();

    timeout(Duration::from_secs(5), async {
        while output.sample_count() == 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();

    engine.pause("bgm").unwrap();
    assert_eq!(engine.state("bgm").unwrap(), PlayerState::Paused);

    let position = engine.position("bgm").unwrap();
    assert!(position > Duration::ZERO);

    engine.play("bgm", PlayOptions::new()).unwrap();
    assert_eq!(engine.state("bgm").unwrap(), PlayerState::Playing);

    engine.release_all().await;
}

#[tokio::test]
async fn seek_moves_position() {
    let dir = TempDir::new().unwrap();
    let path = write_wav(&dir, "clip.wav", SAMPLE_RATE as usize); // 1s

    let engine = engine_with(Arc::new(NullOutput::new()));

    engine
        .load(LoadRequest::new("clip", MediaSource::local(&path)))
        .await
        .unwrap();

    engine.seek("clip", Duration::from_millis(500)).await.unwrap();
    assert_eq!(
        engine.position("clip").unwrap(),
        Duration::from_millis(500)
    );

    // Beyond the known duration is an error
    let result = engine.seek("clip", Duration::from_secs(5)).await;
    assert!(matches!(result, Err(EngineError::SeekOutOfBounds(_))));

    engine.release_all().await;
}

#[tokio::test]
async fn volume_validation_and_scaling() {
    let dir = TempDir::new().unwrap();
    let frames = SAMPLE_RATE as usize / 20;
    let path = write_wav(&dir, "clip.wav", frames);

    let output = CaptureOutput::default();
    let engine = engine_with(Arc::new(output.clone()));
    let mut events = engine.events();

    engine
        .load(LoadRequest::new("quiet", MediaSource::local(&path)))
        .await
        .unwrap();

    assert!(matches!(
        engine.set_volume("quiet", 1.5),
        Err(EngineError::InvalidVolume(_))
    ));

    engine.set_volume("quiet", 0.0).unwrap();
    engine.play("quiet", PlayOptions::new()).unwrap();

    loop {
        if let PlayerEvent::Completed { .. } = next_matching(&mut events, "Completed").await {
            break;
        }
    }

    // Muted playback emits only silence
    assert_eq!(output.sample_count(), frames);
    assert!(output.samples.lock().iter().all(|s| *s == 0.0));

    engine.release_all().await;
}

#[tokio::test]
async fn looping_clip_keeps_playing() {
    let dir = TempDir::new().unwrap();
    let frames = SAMPLE_RATE as usize / 50; // very short clip
    let path = write_wav(&dir, "loop.wav", frames);

    let output = CaptureOutput::default();
    let engine = engine_with(Arc::new(output.clone()));
    let completions = engine.events();

    engine
        .load(LoadRequest::new("loop", MediaSource::local(&path)).looping(true))
        .await
        .unwrap();
    engine.play("loop", PlayOptions::new()).unwrap();

    // Wait until the clip has wrapped around at least twice
    timeout(Duration::from_secs(5), async {
        while output.sample_count() < frames * 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(engine.state("loop").unwrap(), PlayerState::Playing);

    // No completion events for a looping clip
    let mut filtered = completions.filter(|e| matches!(e, PlayerEvent::Completed { .. }));
    assert!(filtered.try_recv().is_none());

    engine.release_all().await;
}

#[tokio::test]
async fn play_from_start_restarts_clip() {
    let dir = TempDir::new().unwrap();
    let frames = SAMPLE_RATE as usize / 10;
    let path = write_wav(&dir, "clip.wav", frames);

    let output = CaptureOutput::default();
    let engine = engine_with(Arc::new(output.clone()));
    let mut events = engine.events();

    engine
        .load(LoadRequest::new("clip", MediaSource::local(&path)))
        .await
        .unwrap();

    engine.seek("clip", Duration::from_millis(50)).await.unwrap();
    engine.play("clip", PlayOptions::from_start()).unwrap();

    loop {
        if let PlayerEvent::Completed { .. } = next_matching(&mut events, "Completed").await {
            break;
        }
    }

    // Restarting from the beginning plays the full clip, not the tail
    assert_eq!(output.sample_count(), frames);

    engine.release_all().await;
}
