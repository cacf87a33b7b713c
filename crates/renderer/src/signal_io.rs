//! Reading and writing wave files.
//!
//! Samples are `f64` in `[-1, 1]` in memory regardless of how they are stored.  Reads are strict about the sample rate,
//! since every convolution downstream assumes one rate; writes only warn, so that deliberately resampled exports work.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};

use scene_dsp::{ChannelFormat, Signal};

#[derive(Debug, thiserror::Error)]
pub enum SignalIoError {
    #[error("Unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Unable to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Unable to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Wav file {path} was expected to have {expected} channels but has {found}")]
    ChannelMismatch {
        path: PathBuf,
        expected: ChannelFormat,
        found: u16,
    },

    #[error("Sampling rate is not {expected} for {path} (found {found})")]
    SampleRateMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("Sample {value} at index {index} does not fit in {bits}-bit PCM when writing {path}")]
    Clip {
        path: PathBuf,
        index: usize,
        value: f64,
        bits: u16,
    },
}

impl SignalIoError {
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            SignalIoError::Read { .. } | SignalIoError::Write { .. } | SignalIoError::CreateDir { .. }
        )
    }
}

/// The sample encodings outputs can be written in.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    #[default]
    Float32,
    Pcm16,
    Pcm24,
}

impl OutputEncoding {
    fn bits(&self) -> u16 {
        match self {
            OutputEncoding::Float32 => 32,
            OutputEncoding::Pcm16 => 16,
            OutputEncoding::Pcm24 => 24,
        }
    }
}

/// Convert float samples to fixed point.
///
/// Samples are scaled by `2^(bits - 1)` and truncated toward zero.  Anything that lands outside the integer range is a
/// [SignalIoError::Clip] rather than being wrapped or clamped.  The input is never modified.
pub fn to_fixed_point(
    samples: impl Iterator<Item = f64>,
    bits: u16,
    path: &Path,
) -> Result<Vec<i32>, SignalIoError> {
    let scale = (1i64 << (bits - 1)) as f64;
    let min = -scale;
    let max = scale - 1.0;

    samples
        .enumerate()
        .map(|(index, value)| {
            let scaled = (value * scale).trunc();
            if !(min..=max).contains(&scaled) {
                return Err(SignalIoError::Clip {
                    path: path.to_path_buf(),
                    index,
                    value,
                    bits,
                });
            }
            Ok(scaled as i32)
        })
        .collect()
}

/// A signal converted to one output encoding, ready to be written.
///
/// Converting is where clipping is detected, so converting every output of a scene before writing any of them means a
/// clip leaves the previous outputs alone.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodedSignal {
    channels: u16,
    encoding: OutputEncoding,
    samples: EncodedSamples,
}

#[derive(Clone, Debug, PartialEq)]
enum EncodedSamples {
    Float(Vec<f32>),
    Fixed(Vec<i32>),
}

impl EncodedSignal {
    /// Convert `signal`.  `path` is only used to report clipping.
    pub fn new(
        signal: &Signal,
        encoding: OutputEncoding,
        path: &Path,
    ) -> Result<EncodedSignal, SignalIoError> {
        let samples = match encoding {
            OutputEncoding::Float32 => {
                EncodedSamples::Float(signal.samples().map(|s| s as f32).collect())
            }
            OutputEncoding::Pcm16 | OutputEncoding::Pcm24 => {
                EncodedSamples::Fixed(to_fixed_point(signal.samples(), encoding.bits(), path)?)
            }
        };

        Ok(EncodedSignal {
            channels: signal.channel_format().get_channel_count().get() as u16,
            encoding,
            samples,
        })
    }
}

/// Wave file access pinned to one sample rate.
#[derive(Copy, Clone, Debug)]
pub struct WavIo {
    sample_rate: u32,
}

impl WavIo {
    pub fn new(sample_rate: u32) -> WavIo {
        WavIo { sample_rate }
    }

    /// Read up to `frames` frames (all remaining if `None`) starting `offset` frames in.
    ///
    /// If `expected` is given, the file must have that layout.  Either way, files with more than two channels are
    /// refused, since nothing in a scene is wider than a binaural pair.
    pub fn read(
        &self,
        path: impl AsRef<Path>,
        offset: u32,
        frames: Option<usize>,
        expected: Option<ChannelFormat>,
    ) -> Result<Signal, SignalIoError> {
        let path = path.as_ref();
        let read_err = |source| SignalIoError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = WavReader::open(path).map_err(read_err)?;
        let spec = reader.spec();

        let format = match (ChannelFormat::from_channel_count(spec.channels as usize), expected) {
            (Some(found), Some(wanted)) if found != wanted => None,
            (found, _) => found,
        };
        let format = format.ok_or_else(|| SignalIoError::ChannelMismatch {
            path: path.to_path_buf(),
            expected: expected.unwrap_or(ChannelFormat::Stereo),
            found: spec.channels,
        })?;

        if spec.sample_rate != self.sample_rate {
            return Err(SignalIoError::SampleRateMismatch {
                path: path.to_path_buf(),
                expected: self.sample_rate,
                found: spec.sample_rate,
            });
        }

        if offset != 0 {
            reader.seek(offset).map_err(|e| read_err(hound::Error::IoError(e)))?;
        }

        let sample_limit = frames
            .map(|f| f * spec.channels as usize)
            .unwrap_or(usize::MAX);
        let samples = read_samples(&mut reader, spec, sample_limit).map_err(read_err)?;

        log::trace!(
            "Read {} samples of {} from {}",
            samples.len(),
            format,
            path.display()
        );

        // hound only yields whole frames unless the file itself is truncated mid-frame.
        Signal::from_interleaved(format, samples).map_err(|e| {
            read_err(hound::Error::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            )))
        })
    }

    /// Write `signal` to `path` at `sample_rate`.
    ///
    /// A sample rate other than the configured one is allowed, with a warning.  Nothing is created if the signal
    /// doesn't fit the encoding.
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        signal: &Signal,
        sample_rate: u32,
        encoding: OutputEncoding,
    ) -> Result<(), SignalIoError> {
        let path = path.as_ref();
        let encoded = EncodedSignal::new(signal, encoding, path)?;
        self.write_encoded(path, &encoded, sample_rate)
    }

    /// Write samples already converted with [EncodedSignal::new].
    pub fn write_encoded(
        &self,
        path: impl AsRef<Path>,
        encoded: &EncodedSignal,
        sample_rate: u32,
    ) -> Result<(), SignalIoError> {
        let path = path.as_ref();
        let write_err = |source| SignalIoError::Write {
            path: path.to_path_buf(),
            source,
        };

        if sample_rate != self.sample_rate {
            log::warn!(
                "Sampling rate mismatch: {} with sample rate={}",
                path.display(),
                sample_rate
            );
        }

        let spec = WavSpec {
            channels: encoded.channels,
            sample_rate,
            bits_per_sample: encoded.encoding.bits(),
            sample_format: match encoded.samples {
                EncodedSamples::Float(_) => SampleFormat::Float,
                EncodedSamples::Fixed(_) => SampleFormat::Int,
            },
        };

        let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
        match &encoded.samples {
            EncodedSamples::Float(samples) => {
                for s in samples.iter() {
                    writer.write_sample(*s).map_err(write_err)?;
                }
            }
            EncodedSamples::Fixed(samples) => {
                for s in samples.iter() {
                    writer.write_sample(*s).map_err(write_err)?;
                }
            }
        }

        // Catch any errors from hound.
        writer.finalize().map_err(write_err)?;
        Ok(())
    }
}

fn read_samples(
    reader: &mut WavReader<BufReader<File>>,
    spec: WavSpec,
    limit: usize,
) -> Result<Vec<f64>, hound::Error> {
    match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .take(limit)
            .map(|s| s.map(|s| s as f64))
            .collect(),
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .take(limit)
                .map(|s| s.map(|s| s as f64 * scale))
                .collect()
        }
    }
}
