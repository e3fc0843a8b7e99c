//! Filter definitions.

use std::f32::consts::PI;

use log::debug;

use crate::dsp::Signal;
use crate::frequency::Freq;

/// Some kind of filter
pub trait Filter {
    /// Design filter from parameters.
    fn design(&self) -> Signal;
}

/// FIR Hilbert transformer, windowed by a kaiser window.
///
/// Type III design: odd length, antisymmetric, zero taps at even indices.
/// Attenuation in positive decibels. The response is flat except for two
/// transition bands of width `delta_w`, one around zero and one around pi
/// radians per second.
///
/// Convolving a signal with this filter gives the imaginary part of its
/// analytic signal, delayed by `(len - 1) / 2` samples. The real part has to
/// be delayed by the same amount for the pair to stay aligned.
#[derive(Clone, PartialEq)]
pub struct Hilbert {
    pub atten: f32,
    pub delta_w: Freq,
}

impl Filter for Hilbert {
    fn design(&self) -> Signal {
        debug!(
            "Designing Hilbert filter, \
               attenuation: {}dB, delta_w: pi*{}rad/s",
            self.atten,
            self.delta_w.get_pi_rad()
        );

        let window = kaiser(self.atten, self.delta_w);

        if window.len() % 2 == 0 {
            panic!("Kaiser window length should be odd");
        }

        let mut filter: Signal = Vec::with_capacity(window.len());

        let m = window.len() as i32;

        for n in -(m - 1) / 2..=(m - 1) / 2 {
            if n % 2 == 0 {
                filter.push(0.);
            } else {
                filter.push(2. / (n as f32 * PI));
            }
        }

        debug!("Hilbert filter design finished, length: {}", m);

        product(filter, &window)
    }
}

/// Design Kaiser window from parameters.
///
/// The length depends on the parameters given, and it's always odd.
fn kaiser(atten: f32, delta_w: Freq) -> Signal {
    use crate::misc::bessel_i0 as bessel;

    debug!(
        "Designing Kaiser window, \
           attenuation: {}dB, delta_w: pi*{}rad/s",
        atten,
        delta_w.get_pi_rad()
    );

    let beta: f32;
    if atten > 50. {
        beta = 0.1102 * (atten - 8.7);
    } else if atten < 21. {
        beta = 0.;
    } else {
        beta = 0.5842 * (atten - 21.).powf(0.4) + 0.07886 * (atten - 21.);
    }

    // Filter length, we want an odd length
    let mut length: i32 = ((atten - 8.) / (2.285 * delta_w.get_rad())).ceil() as i32 + 1;
    if length % 2 == 0 {
        length += 1;
    }

    let mut window: Signal = Vec::with_capacity(length as usize);

    for n in -(length - 1) / 2..=(length - 1) / 2 {
        let n = n as f32;
        let m = length as f32;
        window.push(bessel(beta * (1. - (n / (m / 2.)).powi(2)).sqrt()) / bessel(beta))
    }

    debug!(
        "Kaiser window design finished, beta: {}, length: {}",
        beta, length
    );

    window
}

/// Product of two vectors, element by element.
fn product(mut v1: Signal, v2: &Signal) -> Signal {
    if v1.len() != v2.len() {
        panic!("Both vectors must have the same length");
    }

    for i in 0..v1.len() {
        v1[i] *= v2[i];
    }

    v1
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::frequency::Rate;

    /// Calculate absolute value of fft
    fn abs_fft(signal: &Signal) -> Signal {
        use rustfft::num_complex::Complex;
        use rustfft::FftPlanner;

        let mut buffer: Vec<Complex<f32>> = signal.iter().map(|x| Complex::new(*x, 0.)).collect();

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(buffer.len());
        fft.process(&mut buffer); // Result is in buffer

        buffer.iter().map(|x| x.norm()).collect()
    }

    #[test]
    fn test_hilbert_shape() {
        let coeff = Hilbert {
            atten: 40.,
            delta_w: Freq::hz(300., Rate::hz(15000)),
        }
        .design();

        // Odd length, enough taps for 15kHz audio
        assert!(coeff.len() % 2 == 1);
        assert!(coeff.len() >= 65);

        // Antisymmetric with zeros on even taps
        let m = coeff.len();
        for i in 0..m {
            approx::assert_ulps_eq!(coeff[i], -coeff[m - 1 - i]);
            if (i as i32 - (m as i32 - 1) / 2) % 2 == 0 {
                assert_eq!(coeff[i], 0.);
            }
        }
    }

    #[test]
    fn test_hilbert_response() {
        let coeff = Hilbert {
            atten: 40.,
            delta_w: Freq::hz(300., Rate::hz(15000)),
        }
        .design();
        let fft = abs_fft(&coeff);

        let delta_w = Freq::hz(300., Rate::hz(15000));

        for (i, v) in fft.iter().enumerate() {
            let w = Freq::pi_rad(2. * (i as f32) / (fft.len() as f32));

            // Passband between the two transition bands, check only below pi
            if w > delta_w * 2. && w < Freq::pi_rad(1.) - delta_w * 2. {
                assert!(
                    *v > 0.9 && *v < 1.1,
                    "passband magnitude {} at pi*{}rad/s",
                    v,
                    w.get_pi_rad()
                );
            }
        }

        // Blocks DC
        assert!(fft[0] < 0.05);
    }
}
