/// Conversion between amplitude gains and decibels.
///
/// Mixture SNRs in scene metadata are in dB, but everything applied to samples is a linear amplitude factor, hence the
/// `/ 20`.
pub trait DbExt {
    fn db_to_gain(self) -> Self;
    fn gain_to_db(self) -> Self;
}

impl DbExt for f64 {
    fn db_to_gain(self) -> f64 {
        10.0f64.powf(self / 20.0)
    }

    fn gain_to_db(self) -> f64 {
        20.0 * self.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::DbExt;
    use crate::close_floats::*;

    #[test]
    fn test_conversions() {
        close_floats64(0.5f64.gain_to_db(), -6.0, 0.03);
        close_floats64((-6.0f64).db_to_gain(), 0.5, 0.03);
        assert_eq!(0.0f64.db_to_gain(), 1.0);
        close_floats64((-20.0f64).db_to_gain(), 0.1, 1e-12);
    }
}
