//! The decoder state machine.
//!
//! Consumes the smoothed instantaneous-frequency stream one sample at a time
//! and produces decoded frames. Mode detection is done by measuring the
//! interval between confirmed sync pulses and looking it up in the
//! catalogue, no VIS decoding. Once locked, pixels are sampled
//! synchronously: the running sample index alone decides which pixel is on
//! the wire, while an exponential average over the measured sync intervals
//! tracks the real line period so clock mismatch doesn't shear the image.

use log::{debug, info};

use crate::modes::{self, Family, Mode, Target};
use crate::raster::Raster;
use crate::sync::{SyncDetector, SyncPulse};


/// Tone mapped to black, in Hertz.
pub const BLACK_FREQ: f32 = 1500.;

/// Tone mapped to white, in Hertz.
pub const WHITE_FREQ: f32 = 2300.;

/// Out-of-tolerance sync pulses tolerated before aborting an image.
///
/// Reloaded on every in-tolerance pulse. Without any pulses at all the
/// synchronous sampler just keeps going, the image still ends at the last
/// row or at the end of the stream.
const DECODE_TIMEOUT: u32 = 10000;

/// Relative tolerance when comparing sync intervals to a line length.
const LINE_TOLERANCE: f64 = 0.01;

/// Weight of the previous estimate in the line period average.
const SLANT_KEEP: f64 = 0.7;

/// Out-of-tolerance confirmations before giving up on an adopted mode.
const CONFIRM_FAILURES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
    /// Measuring sync intervals until one matches a catalogued mode.
    DetectSync,
    /// A second in-tolerance interval locks the mode.
    ConfirmSync,
    /// Initialises the image counters, consumes one sample.
    WaitStart,
    /// Decoding pixels.
    DecodeLine,
}

/// A decoded image.
pub struct Frame {
    pub mode: Mode,
    pub raster: Raster,
    /// False when the stream ended or timed out mid-image.
    pub complete: bool,
}

/// Owns all decoding state, fed one frequency sample at a time.
pub struct Decoder {
    catalogue: Vec<Mode>,
    sync: SyncDetector,
    state: State,
    index: usize,

    mode: Option<Mode>,
    raster: Option<Raster>,
    mean_line_samples: f64,
    first_sync_index: usize,
    image_sample: u64,
    pixel_accumulator: f32,
    pixel_count: u32,
    last_x: usize,
    timeout: u32,
    confirm_count: u32,
}

impl Decoder {
    pub fn new(catalogue: Vec<Mode>) -> Self {
        Self {
            catalogue,
            sync: SyncDetector::new(),
            state: State::DetectSync,
            index: 0,
            mode: None,
            raster: None,
            mean_line_samples: 0.,
            first_sync_index: 0,
            image_sample: 0,
            pixel_accumulator: 0.,
            pixel_count: 0,
            last_x: 0,
            timeout: 0,
            confirm_count: 0,
        }
    }

    /// Currently adopted mode, if any.
    pub fn mode(&self) -> Option<&Mode> {
        self.mode.as_ref()
    }

    #[cfg(test)]
    fn mean_line_samples(&self) -> f64 {
        self.mean_line_samples
    }

    /// Feed one frequency sample, returns a frame when an image completes.
    pub fn step(&mut self, freq: f32) -> Option<Frame> {
        let pulse = self.sync.step(freq);

        let frame = match self.state {
            State::DetectSync => {
                self.detect_sync(pulse);
                None
            }
            State::ConfirmSync => {
                self.confirm_sync(pulse);
                None
            }
            State::WaitStart => {
                self.start_image();
                None
            }
            State::DecodeLine => self.decode_line(freq, pulse),
        };

        self.index += 1;
        frame
    }

    /// Flush at end of stream, emits a partial frame if mid-image.
    pub fn finish(&mut self) -> Option<Frame> {
        match self.state {
            State::DecodeLine => {
                let mode = self.mode?;
                self.take_frame(mode, false)
            }
            _ => None,
        }
    }

    fn detect_sync(&mut self, pulse: Option<SyncPulse>) {
        let pulse = match pulse {
            Some(pulse) => pulse,
            None => return,
        };

        if let Some(mode) = modes::match_line_length(&self.catalogue, pulse.interval as f64) {
            debug!("Sync interval {} matches {}", pulse.interval, mode.name);
            self.mean_line_samples = mode.line_samples;
            self.timeout = mode.line_samples.round() as u32;
            self.confirm_count = 0;
            self.mode = Some(*mode);
            self.state = State::ConfirmSync;
        }
    }

    fn confirm_sync(&mut self, pulse: Option<SyncPulse>) {
        let pulse = match pulse {
            Some(pulse) => pulse,
            None => return,
        };
        let nominal = match self.mode {
            Some(mode) => mode.line_samples,
            None => return,
        };

        if in_tolerance(pulse.interval as f64, nominal) {
            self.first_sync_index = pulse.index;
            self.state = State::WaitStart;
        } else {
            self.confirm_count += 1;
            if self.confirm_count == CONFIRM_FAILURES {
                debug!("Sync intervals didn't repeat, dropping mode");
                self.mode = None;
                self.state = State::DetectSync;
            }
        }
    }

    fn start_image(&mut self) {
        let mode = match self.mode {
            Some(mode) => mode,
            None => return,
        };

        info!("Detected mode {}", mode.name);

        self.raster = Some(Raster::new(mode.width, mode.height));
        self.image_sample = 0;
        self.pixel_accumulator = 0.;
        self.pixel_count = 0;
        self.last_x = 0;
        self.state = State::DecodeLine;
    }

    fn decode_line(&mut self, freq: f32, pulse: Option<SyncPulse>) -> Option<Frame> {
        let mode = match self.mode {
            Some(mode) => mode,
            None => return None,
        };

        let position = mode.position(self.image_sample, self.mean_line_samples);

        // Commit the finished pixel when the sampler moves to a new column.
        // The accumulator covered the column we are leaving.
        if let Some(target) = position.target {
            if target.x != self.last_x && self.pixel_count > 0 {
                let value = (self.pixel_accumulator / self.pixel_count as f32) as i32;
                if let Some(raster) = self.raster.as_mut() {
                    raster.set(Target { x: self.last_x, ..target }, value);
                }
                self.pixel_accumulator = 0.;
                self.pixel_count = 0;
                self.last_x = target.x;
            }
        }

        // End of image
        if position.line >= mode.height {
            return self.take_frame(mode, true);
        }

        // Slant tracking: in-tolerance syncs measure the true line period
        // across everything decoded so far. A run of out-of-tolerance pulses
        // with no good one in between means the signal is gone.
        if let Some(pulse) = pulse {
            if in_tolerance(pulse.interval as f64, self.mean_line_samples) {
                let elapsed = (pulse.index - self.first_sync_index) as f64;
                let num_lines = (elapsed / self.mean_line_samples).round();
                if num_lines >= 1. {
                    self.mean_line_samples = SLANT_KEEP * self.mean_line_samples
                        + (1. - SLANT_KEEP) * elapsed / num_lines;
                }
                self.timeout = DECODE_TIMEOUT;
            } else {
                self.timeout = self.timeout.saturating_sub(1);
                if self.timeout == 0 {
                    debug!("Too many stray sync pulses, aborting image");
                    return self.take_frame(mode, false);
                }
            }
        }

        // Accumulate brightness for the current pixel
        let clamped = freq.max(BLACK_FREQ).min(WHITE_FREQ);
        self.pixel_accumulator += 256. * (clamped - BLACK_FREQ) / (WHITE_FREQ - BLACK_FREQ);
        self.pixel_count += 1;
        self.image_sample += 1;

        None
    }

    fn take_frame(&mut self, mode: Mode, complete: bool) -> Option<Frame> {
        self.mode = None;
        self.state = State::DetectSync;

        let mut raster = self.raster.take()?;
        if mode.family == Family::Pd {
            raster.ycbcr_to_rgb();
        }

        Some(Frame { mode, raster, complete })
    }
}

fn in_tolerance(observed: f64, expected: f64) -> bool {
    observed > (1. - LINE_TOLERANCE) * expected && observed < (1. + LINE_TOLERANCE) * expected
}
