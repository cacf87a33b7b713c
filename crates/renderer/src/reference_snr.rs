use std::sync::Arc;

use scene_dsp::{DspError, Signal, SnrMetric};

/// Derives the interferer gain for a scene from one channel's target and interferer.
///
/// Only the stretch where both were actually playing counts: the padding added around the target before convolution
/// is trimmed off both ends first.
#[derive(Clone)]
pub struct ReferenceSnrEstimator {
    metric: Arc<dyn SnrMetric + Send + Sync>,
    pre_samples: usize,
    post_samples: usize,
}

impl std::fmt::Debug for ReferenceSnrEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceSnrEstimator")
            .field("pre_samples", &self.pre_samples)
            .field("post_samples", &self.post_samples)
            .finish_non_exhaustive()
    }
}

impl ReferenceSnrEstimator {
    pub fn new(
        metric: Arc<dyn SnrMetric + Send + Sync>,
        pre_samples: usize,
        post_samples: usize,
    ) -> ReferenceSnrEstimator {
        ReferenceSnrEstimator {
            metric,
            pre_samples,
            post_samples,
        }
    }

    /// The linear gain which, applied to `noise_at_ear`, levels it with `target_at_ear` under the metric.
    pub fn estimate(&self, target_at_ear: &Signal, noise_at_ear: &Signal) -> Result<f64, DspError> {
        compute_snr(
            &*self.metric,
            target_at_ear,
            noise_at_ear,
            self.pre_samples,
            self.post_samples,
        )
    }
}

fn steady_state(signal: &Signal, pre_samples: usize, post_samples: usize) -> Signal {
    let end = signal.len().saturating_sub(post_samples);
    let start = pre_samples.min(end);
    signal.slice(start..end)
}

/// Trim `pre_samples` off the front and `post_samples` off the back of both signals and score what is left.
///
/// The trimmed segments must be the same length.  The result is a ratio, not dB.
pub fn compute_snr(
    metric: &dyn SnrMetric,
    target_at_ear: &Signal,
    noise_at_ear: &Signal,
    pre_samples: usize,
    post_samples: usize,
) -> Result<f64, DspError> {
    let target = steady_state(target_at_ear, pre_samples, post_samples);
    let noise = steady_state(noise_at_ear, pre_samples, post_samples);

    if target.len() != noise.len() {
        return Err(DspError::LengthMismatch {
            target: target.len(),
            noise: noise.len(),
        });
    }

    metric.snr(&target, &noise)
}

#[cfg(test)]
mod tests {
    use scene_dsp::close_floats::*;
    use scene_dsp::BetterEarSnr;

    use super::*;

    #[test]
    fn test_length_mismatch() {
        let err = compute_snr(
            &BetterEarSnr::default(),
            &Signal::Mono(vec![1.0; 1000]),
            &Signal::Mono(vec![1.0; 900]),
            0,
            0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DspError::LengthMismatch {
                target: 1000,
                noise: 900
            }
        ));
    }

    #[test]
    fn test_padding_is_ignored() {
        // Loud junk in the pre and post regions of the noise must not count.
        let mut noise = vec![100.0; 10];
        noise.extend(std::iter::repeat(0.5).take(20));
        noise.extend(vec![100.0; 5]);
        let mut target = vec![0.0; 10];
        target.extend(std::iter::repeat(1.0).take(20));
        target.extend(vec![0.0; 5]);

        let estimator = ReferenceSnrEstimator::new(Arc::new(BetterEarSnr::default()), 10, 5);
        let gain = estimator
            .estimate(&Signal::Mono(target), &Signal::Mono(noise))
            .unwrap();
        close_floats64(gain, 2.0, 1e-9);
    }

    #[test]
    fn test_trim_past_the_end_is_empty() {
        let s = Signal::Mono(vec![1.0; 4]);
        assert!(steady_state(&s, 3, 3).is_empty());
        assert_eq!(steady_state(&s, 1, 0).len(), 3);
    }
}
