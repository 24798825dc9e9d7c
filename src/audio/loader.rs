use crate::error::{EmbedError, EmbedResult};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Mono audio at a known sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub signal: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(signal: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            signal,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.signal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signal.is_empty()
    }

    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.signal.len() as f32 / self.sample_rate as f32
    }
}

/// Decodes `path` to mono and resamples it to `target_sr`.
///
/// Multi-channel audio is averaged down to one channel. Packets that fail to
/// decode are skipped; anything else that stops decoding is a [`EmbedError::Decode`]
/// carrying the decoder's message.
pub fn load_audio<P: AsRef<Path>>(path: P, target_sr: u32) -> EmbedResult<Waveform> {
    let path = path.as_ref();
    let src = File::open(path)
        .map_err(|e| EmbedError::Storage(format!("cannot open {}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_err(path, e))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| {
            EmbedError::Decode(format!("{}: no supported audio tracks", path.display()))
        })?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(path, e))?;

    let track_id = track.id;
    let mut source_sr = track.codec_params.sample_rate.unwrap_or(0);
    let mut samples: Vec<f32> = Vec::new();

    // Decode all packets
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(err) => match end_of_stream(path, err) {
                None => break,
                Some(err) => return Err(err),
            },
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                source_sr = spec.rate;
                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);

                let channels = spec.channels.count();
                let buf_samples = sample_buf.samples();
                if channels <= 1 {
                    samples.extend_from_slice(buf_samples);
                } else {
                    for frame in buf_samples.chunks(channels) {
                        let sum: f32 = frame.iter().sum();
                        samples.push(sum / channels as f32);
                    }
                }
            }
            Err(Error::IoError(_)) | Err(Error::DecodeError(_)) => {
                debug!("{}: skipping undecodable packet", path.display());
            }
            Err(err) => return Err(decode_err(path, err)),
        }
    }

    if samples.is_empty() || source_sr == target_sr {
        return Ok(Waveform::new(samples, target_sr));
    }
    if source_sr == 0 {
        return Err(EmbedError::Decode(format!(
            "{}: unknown source sample rate",
            path.display()
        )));
    }

    let signal = resample(samples, source_sr, target_sr)?;
    Ok(Waveform::new(signal, target_sr))
}

/// Band-limited sinc resampling of a mono buffer.
///
/// `SincFixedIn` already compensates its filter delay, so output sample 0 lines
/// up with input sample 0. The result holds exactly
/// `ceil(len * target_sr / source_sr)` samples.
pub fn resample(samples: Vec<f32>, source_sr: u32, target_sr: u32) -> EmbedResult<Vec<f32>> {
    let ratio = target_sr as f64 / source_sr as f64;
    let expected = (samples.len() as f64 * ratio).ceil() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(|e| EmbedError::Decode(format!("resampler setup failed: {}", e)))?;

    let waves_in = vec![samples];
    let mut out = resampler
        .process(&waves_in, None)
        .map_err(|e| EmbedError::Decode(format!("resampling failed: {}", e)))?
        .remove(0);

    // The first call holds back the delayed samples; flush them.
    let tail = resampler
        .process_partial::<Vec<f32>>(None, None)
        .map_err(|e| EmbedError::Decode(format!("resampling failed: {}", e)))?;
    out.extend_from_slice(&tail[0]);

    out.truncate(expected);
    out.resize(expected, 0.0);
    Ok(out)
}

/// Classifies a demuxer error: `None` for a clean end of input, otherwise the
/// error to return. Chained streams (`ResetRequired`) are rejected rather than
/// embedded from a partial read.
fn end_of_stream(path: &Path, err: Error) -> Option<EmbedError> {
    match err {
        Error::IoError(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof => None,
        Error::ResetRequired => Some(EmbedError::Decode(format!(
            "{}: track list changed mid-stream (chained streams are not supported)",
            path.display()
        ))),
        err => Some(decode_err(path, err)),
    }
}

fn decode_err(path: &Path, err: Error) -> EmbedError {
    EmbedError::Decode(format!("{}: {}", path.display(), err))
}
