// PULSEFRAME Audio Decode

use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::info;

/// Decoded audio, down-mixed to mono.
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file (mp3/wav/flac/ogg/...) to mono f32 samples.
/// Multi-channel input is averaged per sample frame.
pub fn decode_mono(path: &Path) -> Result<AudioBuffer> {
    info!("[AUDIO] Decoding {:?}", path);

    let file = File::open(path).with_context(|| format!("Failed to open audio file {:?}", path))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("Unrecognized audio format: {:?}", path))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No decodable audio track found")?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Unsupported audio codec")?;

    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e).context("Failed reading audio packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                let channels = spec.channels.count().max(1);

                // (Re)allocate the staging buffer when a packet needs
                // more room than the one before it.
                let needs_realloc = sample_buf
                    .as_ref()
                    .map_or(true, |b| b.capacity() < decoded.capacity() * channels);
                if needs_realloc {
                    sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
                }

                if let Some(buf) = sample_buf.as_mut() {
                    buf.copy_interleaved_ref(decoded);
                    for frame in buf.samples().chunks(channels) {
                        let sum: f32 = frame.iter().sum();
                        samples.push(sum / channels as f32);
                    }
                }
            }
            // Skip over malformed packets, as symphonia recommends.
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e).context("Audio decode failed"),
        }
    }

    info!(
        "[AUDIO] Decoded {:.2}s at {} Hz",
        samples.len() as f64 / sample_rate as f64,
        sample_rate
    );

    Ok(AudioBuffer {
        samples,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_of_empty_buffer() {
        let buf = AudioBuffer {
            samples: vec![],
            sample_rate: 44_100,
        };
        assert_eq!(buf.duration_secs(), 0.0);
    }

    #[test]
    fn test_duration_math() {
        let buf = AudioBuffer {
            samples: vec![0.0; 22_050],
            sample_rate: 44_100,
        };
        assert!((buf.duration_secs() - 0.5).abs() < 1e-9);
    }
}
