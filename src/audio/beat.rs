// PULSEFRAME Beat Tracking
//
// Onset-energy analysis used to drive the slideshow effects. Works on
// the mono buffer from `decode`: short-time RMS energy per hop, a
// positive energy-flux onset envelope, an autocorrelation tempo
// estimate and beat positions picked on the tempo grid.

use serde::Serialize;

use super::decode::AudioBuffer;

/// Samples per analysis hop (~11.6 ms at 44.1 kHz).
const HOP: usize = 512;

/// Beat strength reported before the first detected beat.
const DEFAULT_STRENGTH: f64 = 0.1;

#[derive(Debug, Clone, Serialize)]
pub struct BeatAnalysis {
    pub duration: f64,
    pub tempo_bpm: f64,
    pub beat_times: Vec<f64>,
    /// Onset value at each beat, in [0, 1].
    pub beat_strengths: Vec<f64>,
    #[serde(skip)]
    pub onset_env: Vec<f64>,
    #[serde(skip)]
    pub hop_secs: f64,
}

impl BeatAnalysis {
    /// Onset strength of the most recent beat at or before `t`.
    /// Before the first beat a small floor value is returned.
    pub fn strength_at(&self, t: f64) -> f64 {
        match self
            .beat_times
            .partition_point(|&bt| bt <= t)
            .checked_sub(1)
        {
            Some(idx) => self.beat_strengths[idx],
            None => DEFAULT_STRENGTH,
        }
    }
}

/// RMS energy of each hop-sized chunk.
fn energy_per_hop(samples: &[f32]) -> Vec<f64> {
    samples
        .chunks(HOP)
        .map(|chunk| {
            let sum_squares: f64 = chunk.iter().map(|&s| (s as f64).powi(2)).sum();
            (sum_squares / chunk.len() as f64).sqrt()
        })
        .collect()
}

/// Positive energy flux between consecutive hops, normalized to [0, 1].
fn onset_envelope(energies: &[f64]) -> Vec<f64> {
    let mut onset = vec![0.0; energies.len()];
    for i in 1..energies.len() {
        onset[i] = (energies[i] - energies[i - 1]).max(0.0);
    }
    let peak = onset.iter().cloned().fold(0.0, f64::max);
    if peak > 0.0 {
        for v in &mut onset {
            *v /= peak;
        }
    }
    onset
}

/// Log-domain tempo prior centered at 120 BPM, so the autocorrelation
/// peak at a half or double tempo harmonic does not win outright.
fn tempo_prior(bpm: f64) -> f64 {
    let x = (bpm / 120.0).log2();
    (-0.5 * (x / 1.0).powi(2)).exp()
}

/// Autocorrelation tempo estimate over the 30-240 BPM lag range.
/// Returns 0.0 when the envelope carries no energy.
fn estimate_tempo(onset: &[f64], hop_secs: f64) -> f64 {
    if onset.iter().all(|&v| v == 0.0) {
        return 0.0;
    }

    let min_lag = (((60.0 / 240.0) / hop_secs).round() as usize).max(1);
    let max_lag = (((60.0 / 30.0) / hop_secs).round() as usize).min(onset.len() / 2);
    if max_lag <= min_lag {
        return 0.0;
    }

    let mut best_lag = min_lag;
    let mut best_score = f64::MIN;
    for lag in min_lag..=max_lag {
        let n = onset.len() - lag;
        let corr: f64 = (0..n).map(|i| onset[i] * onset[i + lag]).sum::<f64>() / n as f64;
        let bpm = 60.0 / (lag as f64 * hop_secs);
        let score = corr * tempo_prior(bpm);
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }

    60.0 / (best_lag as f64 * hop_secs)
}

/// Pick beat positions on the tempo grid: anchor on the strongest
/// onset, then walk outward one period at a time, snapping each
/// predicted beat to the local onset maximum within a quarter-period
/// window.
fn pick_beats(onset: &[f64], period_hops: f64) -> Vec<usize> {
    if period_hops < 1.0 || onset.is_empty() {
        return vec![];
    }

    let anchor = onset
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let window = (period_hops / 4.0).round() as isize;

    let snap = |predicted: f64| -> usize {
        let center = predicted.round() as isize;
        let lo = (center - window).max(0) as usize;
        let hi = ((center + window) as usize).min(onset.len() - 1);
        (lo..=hi)
            .max_by(|&a, &b| onset[a].total_cmp(&onset[b]))
            .unwrap_or(center.max(0) as usize)
    };

    let mut beats = Vec::new();

    // Backward from the anchor to the start.
    let mut predicted = anchor as f64;
    while predicted >= 0.0 {
        beats.push(snap(predicted));
        predicted -= period_hops;
    }
    beats.reverse();

    // Forward from the anchor to the end.
    let mut predicted = anchor as f64 + period_hops;
    while (predicted.round() as usize) < onset.len() {
        beats.push(snap(predicted));
        predicted += period_hops;
    }

    beats.dedup();
    beats
}

/// Full beat analysis of a decoded buffer.
pub fn analyze(audio: &AudioBuffer) -> BeatAnalysis {
    let hop_secs = HOP as f64 / audio.sample_rate.max(1) as f64;
    let duration = audio.duration_secs();

    let energies = energy_per_hop(&audio.samples);
    let onset_env = onset_envelope(&energies);
    let tempo_bpm = estimate_tempo(&onset_env, hop_secs);

    let (beat_times, beat_strengths) = if tempo_bpm > 0.0 {
        let period_hops = (60.0 / tempo_bpm) / hop_secs;
        let beats = pick_beats(&onset_env, period_hops);
        (
            beats.iter().map(|&i| i as f64 * hop_secs).collect(),
            beats.iter().map(|&i| onset_env[i]).collect(),
        )
    } else {
        (vec![], vec![])
    };

    BeatAnalysis {
        duration,
        tempo_bpm,
        beat_times,
        beat_strengths,
        onset_env,
        hop_secs,
    }
}
