//! Contains the Context struct.
//!
//! Keeps track of the demodulation steps and exports their results as WAV
//! files when asked to. I don't want to clutter the functions in the `dsp`
//! module with code for WAV export, so they just hand each intermediate
//! signal to the `Context` and this decides whether to save it or do
//! nothing.

use std::path::Path;

use log::debug;

use crate::dsp::Signal;
use crate::err;
use crate::frequency::Rate;
use crate::wav;


/// Different kinds of steps available.
#[derive(Debug, PartialEq)]
enum Variant {
    Signal,
    Filter,
}

/// Represents a step of the demodulation process.
///
/// The references only need to be valid until calling `Context::step()`.
#[derive(Debug)]
pub struct Step<'a> {
    variant: Variant,
    id: &'a str,
    signal: &'a Signal,
    rate: Option<Rate>,
}

impl<'a> Step<'a> {

    /// Create a signal step.
    pub fn signal(id: &'a str, signal: &'a Signal, rate: Option<Rate>) -> Step<'a> {
        Step {
            variant: Variant::Signal,
            id,
            signal,
            rate,
        }
    }

    /// Create a filter step.
    pub fn filter(id: &'a str, filter: &'a Signal) -> Step<'a> {
        Step {
            variant: Variant::Filter,
            id,
            signal: filter,
            rate: None,
        }
    }
}

/// Holds information about each expected step.
struct StepMetadata {
    id: &'static str,
    filename: &'static str,
    variant: Variant,
}

/// Decides what to do with the intermediate signals of the decoding process.
///
/// Steps arrive in a known order, the metadata says which filename each one
/// gets. Steps that don't match the expected one are ignored, it means a
/// different demodulator path is running.
pub struct Context {
    steps_metadata: Vec<StepMetadata>,

    /// If we are exporting the steps as WAV files.
    pub export_steps: bool,

    /// Current step index.
    index: usize,
}

impl Context {

    /// Export step.
    pub fn step(&mut self, step: Step) -> err::Result<()> {
        if !self.export_steps {
            return Ok(());
        }

        debug!("Got step: {}", step.id);

        // Metadata about the step we expect to receive
        let metadata = match self.steps_metadata.get(self.index) {
            Some(metadata) => metadata,
            None => {
                debug!("Ignoring step \"{}\", no more steps expected", step.id);
                return Ok(());
            },
        };

        if step.id != metadata.id {
            debug!("Ignoring step \"{}\", expecting \"{}\"", step.id, metadata.id);
            return Ok(());
        }
        self.index += 1;

        if step.variant != metadata.variant {
            return Err(err::Error::Internal(format!(
                "Expected variant {:?}, got {:?}", metadata.variant, step.variant)));
        }

        let rate = match step.variant {
            // Filters have no meaningful sample rate
            Variant::Filter => 1,
            Variant::Signal => match step.rate {
                Some(rate) => rate.get_hz(),
                None => return Err(err::Error::Internal(format!(
                    "Unknown rate for step \"{}\"", step.id))),
            },
        };

        let writer_spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut filename = metadata.filename.to_string();
        filename.push_str(".wav");

        wav::write_wav(Path::new(filename.as_str()), &step.signal, writer_spec)
    }

    /// Create `Context` for a decoding process.
    ///
    /// `fir` says whether the FIR Hilbert demodulator runs, it has an extra
    /// filter design step.
    pub fn decode(export_steps: bool, fir: bool) -> Self {

        let mut steps_metadata = vec![
            StepMetadata {
                id: "input",
                filename: "00_input",
                variant: Variant::Signal,
            },
        ];

        if fir {
            steps_metadata.push(StepMetadata {
                id: "hilbert_filter",
                filename: "01_hilbert_filter",
                variant: Variant::Filter,
            });
        }

        steps_metadata.push(StepMetadata {
            id: "frequencies",
            filename: "02_frequencies",
            variant: Variant::Signal,
        });
        steps_metadata.push(StepMetadata {
            id: "smoothed",
            filename: "03_smoothed",
            variant: Variant::Signal,
        });

        Self {
            steps_metadata,
            export_steps,
            index: 0,
        }
    }
}
