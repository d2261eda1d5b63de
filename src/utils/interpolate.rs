//! Sub-sample interpolation.

// -------------------------------------------------------------------------------------------------

/// Given a previous frame `y0`, a current frame `y1`, the two next frames `y2`, `y3` and a
/// `fraction` from 0.0 to 1.0 between the current and next frame, get an approximated frame.
///
/// This is the 4-point, 3rd-order Hermite interpolation x-form algorithm from "Polynomial
/// Interpolators for High-Quality Resampling of Oversampled Audio" by Olli Niemitalo, p. 43:
/// http://yehar.com/blog/wp-content/uploads/2009/08/deip.pdf
#[inline]
pub fn hermite(fraction: f32, y0: f32, y1: f32, y2: f32, y3: f32) -> f32 {
    debug_assert!((0.0..=1.0).contains(&fraction));
    let c0 = y1;
    let c1 = (y2 - y0) * 0.5;
    let c2 = y0 - y1 * 2.5 + y2 * 2.0 - y3 * 0.5;
    let c3 = (y3 - y0) * 0.5 + (y1 - y2) * 1.5;
    ((c3 * fraction + c2) * fraction + c1) * fraction + c0
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_sample_points() {
        assert_eq!(hermite(0.0, 4.0, 1.0, 2.0, 3.0), 1.0);
        assert!((hermite(1.0, 4.0, 1.0, 2.0, 3.0) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn linear_ramps_stay_linear() {
        for i in 0..=10 {
            let fraction = i as f32 / 10.0;
            let value = hermite(fraction, -1.0, 0.0, 1.0, 2.0);
            assert!((value - fraction).abs() < 1e-6, "{value} != {fraction}");
        }
    }

    #[test]
    fn constant_signal() {
        for i in 0..=4 {
            let fraction = i as f32 / 4.0;
            assert!((hermite(fraction, 0.5, 0.5, 0.5, 0.5) - 0.5).abs() < 1e-6);
        }
    }
}
