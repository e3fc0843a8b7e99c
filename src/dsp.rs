//! Functions for digital signal processing.
//!
//! The demodulator turns audio samples into a stream of smoothed
//! instantaneous frequencies in Hertz, one per input sample minus the first.
//! SSTV maps those frequencies to pixel brightness, so this stream is all the
//! decoder needs.
//!
//! There are two ways of building the analytic signal: an FFT Hilbert
//! transform over the whole recording (the reference), and a FIR Hilbert
//! transformer with matched group delay that could run streaming. Both have a
//! startup transient of some tens of samples, the decoder tolerates it
//! because it never locks before seeing two sync pulses.

use std::f32::consts::PI;

use log::debug;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::context::{Context, Step};
use crate::err;
use crate::filters::{self, Filter};
use crate::frequency::{Freq, Rate};


/// Represents a signal, it's just a `Vec<f32>`.
pub type Signal = Vec<f32>;

/// Weight of the previous output in the one-pole smoothing filter.
const SMOOTHING: f32 = 0.93;

/// Get biggest sample in signal.
pub fn get_max(vector: &Signal) -> err::Result<&f32> {
    if vector.is_empty() {
        return Err(err::Error::Internal(
            "Can't get maximum of a zero length vector".to_string()));
    }

    let mut max: &f32 = &vector[0];
    for sample in vector {
        if sample > max {
            max = sample;
        }
    }

    Ok(max)
}

/// Analytic signal of the input.
///
/// FFT Hilbert transform over the whole buffer: keep DC and Nyquist, double
/// the positive frequencies and zero the negative ones.
pub fn analytic_signal(signal: &Signal) -> err::Result<Vec<Complex<f32>>> {
    if signal.len() < 2 {
        return Err(err::Error::TooShort(format!(
            "Need at least 2 samples to form an analytic signal, got {}",
            signal.len()
        )));
    }

    let n = signal.len();
    let mut buffer: Vec<Complex<f32>> = signal.iter().map(|x| Complex::new(*x, 0.)).collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    for x in buffer.iter_mut().take((n + 1) / 2).skip(1) {
        *x *= 2.;
    }
    for x in buffer.iter_mut().skip(n / 2 + 1) {
        *x = Complex::new(0., 0.);
    }

    planner.plan_fft_inverse(n).process(&mut buffer);
    for x in buffer.iter_mut() {
        *x /= n as f32;
    }

    Ok(buffer)
}

/// Convert one forward phase difference to Hertz.
///
/// The difference is folded modulo pi, not 2 pi: only positive frequencies
/// are of interest in SSTV audio, so negative increments fold into the
/// positive band instead of producing negative frequencies.
fn phase_to_frequency(prev: f32, curr: f32, rate: Rate) -> f32 {
    (curr - prev).rem_euclid(PI) * rate.get_hz() as f32 / (2. * PI)
}

/// Forward phase differences of a phase stream, in Hertz.
fn frequencies_from_phases(phases: &[f32], rate: Rate) -> Signal {
    phases
        .windows(2)
        .map(|pair| phase_to_frequency(pair[0], pair[1], rate))
        .collect()
}

/// One-pole IIR lowpass used to smooth the frequency stream.
///
/// `y[n] = alpha*y[n-1] + (1-alpha)*x[n]`, starting from zero.
pub fn smooth(signal: &Signal, alpha: f32) -> Signal {
    let mut output: Signal = Vec::with_capacity(signal.len());

    let mut last = 0_f32;
    for x in signal {
        last = last * alpha + x * (1. - alpha);
        output.push(last);
    }

    output
}

/// Demodulate to smoothed instantaneous frequency, batch Hilbert transform.
pub fn instantaneous_frequency(
    context: &mut Context,
    signal: &Signal,
    rate: Rate,
) -> err::Result<Signal> {

    debug!("Demodulating with batch Hilbert transform");

    let analytic = analytic_signal(signal)?;
    let phases: Vec<f32> = analytic.iter().map(|x| x.arg()).collect();

    let frequencies = frequencies_from_phases(&phases, rate);
    context.step(Step::signal("frequencies", &frequencies, Some(rate)))?;

    let smoothed = smooth(&frequencies, SMOOTHING);
    context.step(Step::signal("smoothed", &smoothed, Some(rate)))?;

    debug!("Demodulation finished");
    Ok(smoothed)
}

/// Demodulate to smoothed instantaneous frequency, FIR Hilbert transformer.
///
/// The imaginary branch is the convolution with the transformer, the real
/// branch is the input delayed by the filter group delay so both stay
/// aligned. Processes the whole buffer here, but nothing needs more state
/// than the last `taps` samples so it can be turned into a streaming
/// implementation.
pub fn instantaneous_frequency_fir(
    context: &mut Context,
    signal: &Signal,
    rate: Rate,
    atten: f32,
    delta_freq: f32,
) -> err::Result<Signal> {

    if signal.len() < 2 {
        return Err(err::Error::TooShort(format!(
            "Need at least 2 samples to form an analytic signal, got {}",
            signal.len()
        )));
    }

    let coeff = filters::Hilbert {
        atten,
        delta_w: Freq::hz(delta_freq, rate),
    }
    .design();
    context.step(Step::filter("hilbert_filter", &coeff))?;

    debug!("Demodulating with {} tap FIR Hilbert transformer", coeff.len());

    let delay = (coeff.len() - 1) / 2;

    let mut phases: Vec<f32> = Vec::with_capacity(signal.len());
    for i in 0..signal.len() {
        let mut imag = 0_f32;
        for (j, c) in coeff.iter().enumerate() {
            // Every other tap is zero
            if *c != 0. && j <= i {
                imag += c * signal[i - j];
            }
        }
        let real = if i >= delay { signal[i - delay] } else { 0. };
        phases.push(imag.atan2(real));
    }

    let frequencies = frequencies_from_phases(&phases, rate);
    context.step(Step::signal("frequencies", &frequencies, Some(rate)))?;

    let smoothed = smooth(&frequencies, SMOOTHING);
    context.step(Step::signal("smoothed", &smoothed, Some(rate)))?;

    debug!("Demodulation finished");
    Ok(smoothed)
}

#[cfg(test)]
mod tests {

    use super::*;

    /// Synthesize a tone as i16 samples converted to float.
    fn tone(freq: f32, rate: u32, len: usize) -> Signal {
        (0..len)
            .map(|i| {
                let phase = 2. * PI * freq * i as f32 / rate as f32;
                (phase.cos() * 10000.).round()
            })
            .collect()
    }

    #[test]
    fn test_analytic_signal() {
        // 100 whole cycles so there is no spectral leakage
        let signal = tone(1000., 15000, 1500);
        let analytic = analytic_signal(&signal).unwrap();

        // Away from the edges the magnitude should be the tone amplitude and
        // the imaginary part should lag the real one by 90 degrees
        for i in 200..1300 {
            approx::assert_relative_eq!(
                analytic[i].norm(), 10000.,
                max_relative = 0.01
            );

            let expected_im = (2. * PI * 1000. * i as f32 / 15000.).sin() * 10000.;
            assert!((analytic[i].im - expected_im).abs() < 200.);
        }
    }

    #[test]
    fn test_analytic_signal_too_short() {
        assert!(analytic_signal(&vec![]).is_err());
        assert!(analytic_signal(&vec![123.]).is_err());
    }

    #[test]
    fn test_phase_folding() {
        let rate = Rate::hz(15000);

        // Positive increments map directly to Hertz
        approx::assert_relative_eq!(
            phase_to_frequency(0.3, 0.5, rate),
            0.2 * 15000. / (2. * PI),
            max_relative = 1e-5
        );

        // Negative increments fold into the positive band instead of giving
        // negative frequencies
        approx::assert_relative_eq!(
            phase_to_frequency(0.5, 0.3, rate),
            (PI - 0.2) * 15000. / (2. * PI),
            max_relative = 1e-4
        );
    }

    #[test]
    fn test_smooth() {
        let signal: Signal = std::iter::repeat(100.).take(200).collect();
        let smoothed = smooth(&signal, 0.93);

        // Starts from zero and converges to the input
        approx::assert_relative_eq!(smoothed[0], 7., max_relative = 1e-5);
        assert!(smoothed[30] > 80.);
        assert!(smoothed[199] > 99.9 && smoothed[199] <= 100.);
    }

    #[test]
    fn test_instantaneous_frequency() {
        let mut context = Context::decode(false, false);
        let signal = tone(1900., 15000, 3000);

        let frequencies =
            instantaneous_frequency(&mut context, &signal, Rate::hz(15000)).unwrap();

        assert_eq!(frequencies.len(), signal.len() - 1);
        for i in 500..2500 {
            assert!(
                (frequencies[i] - 1900.).abs() < 10.,
                "frequency {} at sample {}",
                frequencies[i],
                i
            );
        }
    }

    #[test]
    fn test_fir_agrees_with_batch() {
        let signal = tone(1500., 15000, 3000);
        let rate = Rate::hz(15000);

        let mut context = Context::decode(false, false);
        let batch = instantaneous_frequency(&mut context, &signal, rate).unwrap();

        let mut context = Context::decode(false, true);
        let fir =
            instantaneous_frequency_fir(&mut context, &signal, rate, 40., 300.).unwrap();

        for i in 500..2500 {
            assert!(
                (batch[i] - fir[i]).abs() < 15.,
                "batch {} vs fir {} at sample {}",
                batch[i],
                fir[i],
                i
            );
        }
    }
}
