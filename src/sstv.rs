//! Core of the program.
//!
//! This module has the high-level functions for decoding SSTV.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config;
use crate::context::{Context, Step};
use crate::decode::{Decoder, Frame};
use crate::dsp;
use crate::err;
use crate::frequency::Rate;
use crate::modes;
use crate::wav;


/// Nominal sample rate of SSTV recordings, in Hertz.
///
/// Other rates work too, the mode catalogue is computed from the real rate,
/// but most captures are made at this one.
pub const NOMINAL_RATE: u32 = 15000;

/// Decode every SSTV image in a recording and write them as PNG.
pub fn decode(settings: &config::Settings) -> err::Result<()> {

    info!("Reading input file");

    let input = Path::new(&settings.input_filename);
    let (signal, rate) = if settings.raw_input {
        (wav::load_raw(input)?, Rate::hz(settings.raw_rate))
    } else {
        let (signal, spec) = wav::load_wav(input)?;
        (signal, Rate::hz(spec.sample_rate))
    };

    if rate.get_hz() != NOMINAL_RATE {
        info!("Input rate is {}Hz instead of the usual {}Hz, \
            adjusting mode timings", rate.get_hz(), NOMINAL_RATE);
    }

    let fir = settings.hilbert == config::Hilbert::Fir;
    let mut context = Context::decode(settings.wav_steps, fir);

    context.step(Step::signal("input", &signal, Some(rate)))?;

    info!("Demodulating");

    let frequencies = if fir {
        dsp::instantaneous_frequency_fir(
            &mut context,
            &signal,
            rate,
            settings.fir_atten,
            settings.fir_delta_freq,
        )?
    } else {
        dsp::instantaneous_frequency(&mut context, &signal, rate)?
    };

    info!("Decoding");

    let mut decoder = Decoder::new(modes::catalogue(rate));
    let mut frames: Vec<Frame> = Vec::new();

    for freq in frequencies.iter() {
        if let Some(frame) = decoder.step(*freq) {
            info!("Decoded a {} image", frame.mode.name);
            frames.push(frame);
        }
    }
    if let Some(frame) = decoder.finish() {
        info!("Recording ended mid-image, keeping the partial {} image",
            frame.mode.name);
        frames.push(frame);
    }

    if frames.is_empty() {
        return Err(err::Error::Internal(
            "No SSTV transmission found in the recording".to_string()));
    }

    for (index, frame) in frames.iter().enumerate() {
        let filename = output_filename(&settings.output_filename, index, frames.len());

        if !frame.complete {
            warn!("Image '{}' is incomplete", filename.display());
        }
        info!("Writing PNG to '{}'", filename.display());

        frame.raster.to_image().save(&filename)?;
    }

    Ok(())
}

/// Output path for the nth decoded image.
///
/// A recording with a single image keeps the given name, one with several
/// gets a number before the extension.
fn output_filename(base: &str, index: usize, total: usize) -> PathBuf {
    if total == 1 {
        return PathBuf::from(base);
    }

    let path = Path::new(base);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
    let numbered = match path.extension().and_then(|e| e.to_str()) {
        Some(extension) => format!("{}_{}.{}", stem, index + 1, extension),
        None => format!("{}_{}", stem, index + 1),
    };

    path.with_file_name(numbered)
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_output_filename() {
        assert_eq!(
            output_filename("./output.png", 0, 1),
            PathBuf::from("./output.png")
        );
        assert_eq!(
            output_filename("./output.png", 0, 2),
            PathBuf::from("./output_1.png")
        );
        assert_eq!(
            output_filename("./output.png", 1, 2),
            PathBuf::from("./output_2.png")
        );
        assert_eq!(
            output_filename("dir/image", 1, 3),
            PathBuf::from("dir/image_2")
        );
    }
}
