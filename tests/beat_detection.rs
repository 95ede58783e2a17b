use pulseframe::audio::{beat, decode};
use std::f32::consts::TAU;
use std::path::Path;

/// Write a WAV click track: decaying 1 kHz bursts every `interval`
/// seconds over `duration` seconds.
fn write_click_track(path: &Path, interval: f64, duration: f64) {
    let sample_rate = 22_050u32;
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let total = (duration * sample_rate as f64) as usize;
    let mut samples = vec![0.0f32; total];
    let mut t = 0.0;
    while t < duration {
        let start = (t * sample_rate as f64) as usize;
        let end = (start + sample_rate as usize / 50).min(total);
        for (i, s) in samples[start..end].iter_mut().enumerate() {
            let phase = i as f32 / sample_rate as f32 * 1000.0 * TAU;
            *s = phase.sin() * (1.0 - i as f32 / (end - start) as f32) * 0.9;
        }
        t += interval;
    }

    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for s in samples {
        writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn test_decode_wav_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("clicks.wav");
    write_click_track(&wav, 0.5, 4.0);

    let buffer = decode::decode_mono(&wav).expect("decode failed");
    assert_eq!(buffer.sample_rate, 22_050);
    assert!((buffer.duration_secs() - 4.0).abs() < 0.1);
    // The bursts must survive decoding.
    let peak = buffer.samples.iter().cloned().fold(0.0f32, f32::max);
    assert!(peak > 0.5, "peak {} too low", peak);
}

#[test]
fn test_beat_track_click_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("clicks.wav");
    write_click_track(&wav, 0.5, 8.0);

    let buffer = decode::decode_mono(&wav).unwrap();
    let analysis = beat::analyze(&buffer);

    assert!(
        (analysis.tempo_bpm - 120.0).abs() < 10.0,
        "expected ~120 BPM for 0.5s clicks, got {:.2}",
        analysis.tempo_bpm
    );
    assert!(analysis.beat_times.len() >= 12);
    for pair in analysis.beat_times.windows(2) {
        assert!(pair[1] > pair[0], "beat times must increase");
    }
    // Detected beats should land near the click grid.
    let hits = analysis
        .beat_times
        .iter()
        .filter(|&&bt| {
            let nearest = (bt / 0.5).round() * 0.5;
            (bt - nearest).abs() < 0.1
        })
        .count();
    assert!(
        hits * 2 >= analysis.beat_times.len(),
        "only {}/{} beats near the click grid",
        hits,
        analysis.beat_times.len()
    );
}

#[test]
fn test_strength_follows_beats() {
    let dir = tempfile::tempdir().unwrap();
    let wav = dir.path().join("clicks.wav");
    write_click_track(&wav, 0.5, 6.0);

    let buffer = decode::decode_mono(&wav).unwrap();
    let analysis = beat::analyze(&buffer);

    // The anchor beat sits on the strongest onset, so its normalized
    // strength is at (or near) the envelope peak.
    let (best_idx, &best) = analysis
        .beat_strengths
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .expect("no beats detected");
    assert!(best > 0.9, "strongest beat only {:.3}", best);

    // Querying just after that beat reports its strength.
    let t = analysis.beat_times[best_idx] + 0.01;
    assert!((analysis.strength_at(t) - best).abs() < 1e-9);
}
