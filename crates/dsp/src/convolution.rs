//! Linear convolution.
//!
//! Room impulse responses run to tens of thousands of taps against signals of several seconds, so the renderer
//! convolves in the frequency domain.  The direct form is kept as the reference the FFT path is checked against.
use std::fmt;

use realfft::RealFftPlanner;

use crate::error::DspError;

/// Full-length FFT convolution, caching FFT plans between calls.
///
/// Output of [FftConvolver::convolve] is always `signal.len() + kernel.len() - 1` samples, matching a direct
/// evaluation of the sum up to floating point error.
pub struct FftConvolver {
    planner: RealFftPlanner<f64>,
}

impl fmt::Debug for FftConvolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftConvolver").finish_non_exhaustive()
    }
}

impl Default for FftConvolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FftConvolver {
    pub fn new() -> FftConvolver {
        FftConvolver {
            planner: RealFftPlanner::new(),
        }
    }

    /// Convolve `signal` with `kernel`.  Either being empty gives an empty output.
    pub fn convolve(&mut self, signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>, DspError> {
        if signal.is_empty() || kernel.is_empty() {
            return Ok(vec![]);
        }

        let output_len = signal.len() + kernel.len() - 1;
        // Even lengths keep the last bin a true Nyquist bin.
        let fft_len = output_len.next_power_of_two().max(2);

        let r2c = self.planner.plan_fft_forward(fft_len);
        let c2r = self.planner.plan_fft_inverse(fft_len);

        let mut signal_time = r2c.make_input_vec();
        signal_time[..signal.len()].copy_from_slice(signal);
        let mut kernel_time = r2c.make_input_vec();
        kernel_time[..kernel.len()].copy_from_slice(kernel);

        let mut signal_freq = r2c.make_output_vec();
        let mut kernel_freq = r2c.make_output_vec();
        r2c.process(&mut signal_time, &mut signal_freq)?;
        r2c.process(&mut kernel_time, &mut kernel_freq)?;

        for (s, k) in signal_freq.iter_mut().zip(kernel_freq.iter()) {
            *s *= *k;
        }

        // The inverse transform rejects nonzero imaginary parts in the DC and Nyquist bins.  They are zero up to
        // rounding, so make them exactly zero.
        if let Some(first) = signal_freq.first_mut() {
            first.im = 0.0;
        }
        if let Some(last) = signal_freq.last_mut() {
            last.im = 0.0;
        }

        let mut output = c2r.make_output_vec();
        c2r.process(&mut signal_freq, &mut output)?;

        // realfft leaves the inverse unnormalized.
        let scale = 1.0 / fft_len as f64;
        output.truncate(output_len);
        for x in output.iter_mut() {
            *x *= scale;
        }

        Ok(output)
    }
}

/// One-shot FFT convolution.  Prefer an [FftConvolver] when convolving repeatedly.
pub fn convolve_fft(signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>, DspError> {
    FftConvolver::new().convolve(signal, kernel)
}

/// Evaluate a full convolution by directly evaluating the sum.
///
/// Complexity is `theta(M*N)`.  Used to validate the FFT path and for very short kernels in benchmarks.
pub fn convolve_direct(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    if signal.is_empty() || kernel.is_empty() {
        return vec![];
    }

    let mut output = vec![0.0f64; signal.len() + kernel.len() - 1];
    for (i, s) in signal.iter().enumerate() {
        for (j, k) in kernel.iter().enumerate() {
            output[i + j] += s * k;
        }
    }
    output
}
