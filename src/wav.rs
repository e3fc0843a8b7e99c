//! Functions for loading and saving WAV files.

use std::path::Path;

use log::{debug, warn};

use crate::dsp::{self, Signal};
use crate::err;


/// Load wav file, return `Signal` and specs.
pub fn load_wav(filename: &Path) -> err::Result<(Signal, hound::WavSpec)> {
    debug!("Loading WAV: {}", filename.display());

    let mut reader = hound::WavReader::open(filename)?;
    let spec = reader.spec();

    if spec.channels != 1 {
        warn!("WAV file has {} channels (probably stereo), processing only the \
            first one", spec.channels);
    }

    debug!("WAV specifications: {:?}", spec);

    // Convert samples to float, also if there is more than one channel, the
    // samples are interleaved so we drop samples from extra channels using
    // filter_map()
    let input_samples: Signal = match spec.sample_format {
        hound::SampleFormat::Int => {
            reader.samples::<i32>()
                .collect::<Result<Vec<i32>, hound::Error>>()?
                .iter()
                .enumerate()
                .filter_map(|(i, x)|
                    match i % spec.channels as usize {
                        0 => Some(*x as f32),
                        _ => None,
                    }
                )
                .collect()
        }
        hound::SampleFormat::Float => {
            reader.samples::<f32>()
                .collect::<Result<Vec<f32>, hound::Error>>()?
                .iter()
                .enumerate()
                .filter_map(|(i, x)|
                    match i % spec.channels as usize {
                        0 => Some(*x),
                        _ => None,
                    }
                )
                .collect()
        }
    };

    debug!("Finished reading WAV");

    Ok((input_samples, spec))
}

/// Load headerless signed 16 bit little-endian PCM.
///
/// The sample rate is whatever the caller says it is, there is no header to
/// check it against.
pub fn load_raw(filename: &Path) -> err::Result<Signal> {
    debug!("Loading raw PCM: {}", filename.display());

    let bytes = std::fs::read(filename)?;
    if bytes.len() < 2 {
        return Err(err::Error::TooShort(format!(
            "Raw PCM file '{}' has {} bytes", filename.display(), bytes.len())));
    }
    if bytes.len() % 2 != 0 {
        warn!("Raw PCM file has an odd number of bytes, ignoring the last one");
    }

    let signal: Signal = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32)
        .collect();

    debug!("Finished reading raw PCM, {} samples", signal.len());

    Ok(signal)
}

/// Write signal to file, normalized to 32 bit float samples.
///
/// Used to export intermediate steps, so the signal can be any range and
/// gets scaled by its maximum.
pub fn write_wav(filename: &Path, signal: &Signal, spec: hound::WavSpec) -> err::Result<()> {
    debug!("Normalizing samples and writing WAV to '{}'", filename.display());

    if spec.bits_per_sample != 32 || spec.sample_format != hound::SampleFormat::Float {
        return Err(err::Error::Internal(
            format!("Can't write WAV with spec {:?}", spec)
        ));
    }

    let max = *dsp::get_max(&signal)?;
    debug!("Max: {}", max);

    let mut writer = hound::WavWriter::create(filename, spec)?;

    for sample in signal.iter() {
        writer.write_sample(*sample / max)?;
    }

    writer.finalize()?;

    debug!("Finished writing WAV");

    Ok(())
}

#[cfg(test)]
mod tests {

    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_load_raw() {
        let path = temp_path("sstv_decode_test_load_raw.pcm");

        let samples: [i16; 4] = [0, -32768, 32767, 256];
        let mut bytes: Vec<u8> = Vec::new();
        for sample in samples.iter() {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        std::fs::write(&path, &bytes).unwrap();

        let signal = load_raw(&path).unwrap();
        assert_eq!(signal, vec![0., -32768., 32767., 256.]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_raw_empty() {
        let path = temp_path("sstv_decode_test_load_raw_empty.pcm");
        std::fs::write(&path, &[]).unwrap();

        assert!(load_raw(&path).is_err());

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_wav_roundtrip() {
        let path = temp_path("sstv_decode_test_roundtrip.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 15000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let signal: Signal = vec![0., 0.25, -0.5, 1., 2.];
        write_wav(&path, &signal, spec).unwrap();

        let (loaded, loaded_spec) = load_wav(&path).unwrap();
        assert_eq!(loaded_spec.sample_rate, 15000);
        // Written normalized by the maximum
        assert_eq!(loaded.len(), 5);
        approx::assert_relative_eq!(loaded[3], 0.5, max_relative = 1e-6);
        approx::assert_relative_eq!(loaded[4], 1., max_relative = 1e-6);

        std::fs::remove_file(&path).unwrap();
    }
}
