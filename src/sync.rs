//! Horizontal sync pulse detection.
//!
//! Works on the smoothed frequency stream. Sync tones sit at 1200Hz and
//! every displayable tone at 1500Hz or above, so a fixed discriminator in
//! between separates them cleanly.

/// Frequencies below this are counted as sync tone, in Hertz.
pub const SYNC_THRESHOLD: f32 = 1300.;

/// Below-threshold samples needed to confirm a pulse.
///
/// About 0.33ms at 15kHz, well under the shortest catalogued sync pulse and
/// well over anything noise produces.
const CONFIRM_DWELL: u32 = 5;

#[derive(Debug, PartialEq)]
enum State {
    Idle,
    InPulse,
}

/// A confirmed sync pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncPulse {
    /// Absolute sample index where the pulse was confirmed.
    pub index: usize,
    /// Samples since the previous confirmed pulse.
    pub interval: usize,
}

/// Detects sync pulses one frequency sample at a time.
pub struct SyncDetector {
    state: State,
    dwell: u32,
    previous: f32,
    last_confirmed: usize,
    index: usize,
}

impl SyncDetector {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            dwell: 0,
            previous: SYNC_THRESHOLD,
            last_confirmed: 0,
            index: 0,
        }
    }

    /// Feed one frequency sample, in Hertz.
    ///
    /// A pulse starts on a downward crossing of the threshold and is
    /// confirmed after dwelling below it. Brief spikes inside the pulse only
    /// step the dwell counter back, they don't restart it.
    pub fn step(&mut self, freq: f32) -> Option<SyncPulse> {
        let mut pulse = None;

        match self.state {
            State::Idle => {
                if self.previous >= SYNC_THRESHOLD && freq < SYNC_THRESHOLD {
                    self.state = State::InPulse;
                    self.dwell = 0;
                }
            }
            State::InPulse => {
                if freq < SYNC_THRESHOLD {
                    self.dwell += 1;
                } else {
                    self.dwell = self.dwell.saturating_sub(1);
                }

                if self.dwell == CONFIRM_DWELL {
                    pulse = Some(SyncPulse {
                        index: self.index,
                        interval: self.index - self.last_confirmed,
                    });
                    self.last_confirmed = self.index;
                    self.state = State::Idle;
                }
            }
        }

        self.previous = freq;
        self.index += 1;
        pulse
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn run(detector: &mut SyncDetector, samples: &[f32]) -> Vec<SyncPulse> {
        samples.iter().filter_map(|freq| detector.step(*freq)).collect()
    }

    fn tone(freq: f32, len: usize) -> Vec<f32> {
        std::iter::repeat(freq).take(len).collect()
    }

    #[test]
    fn test_detects_pulse() {
        let mut detector = SyncDetector::new();

        let mut samples = tone(1500., 100);
        samples.extend(tone(1200., 73));
        samples.extend(tone(1500., 100));

        let pulses = run(&mut detector, &samples);
        assert_eq!(pulses.len(), 1);
        // Crossing at sample 100, confirmed five samples later
        assert_eq!(pulses[0].index, 105);
    }

    #[test]
    fn test_interval_between_pulses() {
        let mut detector = SyncDetector::new();

        let mut samples: Vec<f32> = Vec::new();
        for _line in 0..3 {
            samples.extend(tone(1200., 73));
            samples.extend(tone(1800., 6620));
        }

        let pulses = run(&mut detector, &samples);
        assert_eq!(pulses.len(), 3);
        assert_eq!(pulses[1].interval, 6693);
        assert_eq!(pulses[2].interval, 6693);
    }

    #[test]
    fn test_tolerates_spike_inside_pulse() {
        let mut detector = SyncDetector::new();

        let mut samples = tone(1500., 50);
        samples.extend(tone(1200., 3));
        samples.push(1600.); // one bad sample
        samples.extend(tone(1200., 20));
        samples.extend(tone(1500., 50));

        let pulses = run(&mut detector, &samples);
        assert_eq!(pulses.len(), 1);
    }

    #[test]
    fn test_ignores_tones_above_threshold() {
        let mut detector = SyncDetector::new();

        // Leader tone and black level never cross the discriminator
        let mut samples = tone(1900., 7500);
        samples.extend(tone(1500., 15000));

        assert!(run(&mut detector, &samples).is_empty());
    }
}
