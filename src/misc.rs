// Lookup table for numbers used in Bessel function.
// 1 / (n! * 2^n)^2
const BESSEL_TABLE: [f32; 9] = [
    1.0,
    0.25,
    0.015625,
    0.00043402777777777775,
    6.781684027777777e-06,
    6.781684027777778e-08,
    4.709502797067901e-10,
    2.4028075495244395e-12,
    9.385966990329842e-15,
];

/// First Kind modified Bessel function of order zero.
///
/// From https://dsp.stackexchange.com/questions/37714/kaiser-window-approximation/37715#37715
pub fn bessel_i0(x: f32) -> f32 {
    let mut result: f32 = 0.;
    let limit: usize = 8;

    for k in (1..=limit).rev() {
        result += BESSEL_TABLE[k];
        result *= x.powi(2);
    }

    result + 1.
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    pub fn test_bessel_i0() {
        let tolerance = 0.001; // 0.1%

        // Compare values with results from GNU Octave
        approx::assert_relative_eq!(bessel_i0(0.),  1.00000000000000, max_relative = tolerance);
        approx::assert_relative_eq!(bessel_i0(0.5), 1.06348337074132, max_relative = tolerance);
        approx::assert_relative_eq!(bessel_i0(1.),  1.26606587775201, max_relative = tolerance);
        approx::assert_relative_eq!(bessel_i0(2.),  2.27958530233607, max_relative = tolerance);
        approx::assert_relative_eq!(bessel_i0(3.),  4.88079258586502, max_relative = tolerance);
        approx::assert_relative_eq!(bessel_i0(4.),  11.3019219521363, max_relative = tolerance);
        approx::assert_relative_eq!(bessel_i0(5.),  27.2398718236044, max_relative = tolerance);
        approx::assert_relative_eq!(bessel_i0(6.),  67.2344069764780, max_relative = tolerance);
        approx::assert_relative_eq!(bessel_i0(7.),  168.593908510290, max_relative = tolerance);
    }
}
