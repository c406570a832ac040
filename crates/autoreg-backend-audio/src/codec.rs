//! Mu-law companding and bit-depth quantization.
//!
//! Samples live in `[-1, 1]`. Quantization maps that range linearly onto the
//! integer codes `0..=2^bit - 1`; mu-law companding (with `mu = 2^bit`) is
//! applied before quantization and inverted after dequantization. The
//! functions here are the exact inverses of the training-side encoders, so
//! generated samples are comparable to training targets.

use crate::decoder::Decoded;

/// Largest code representable with `bit` bits.
pub fn max_code(bit: u32) -> u32 {
    (1u32 << bit) - 1
}

/// Width of one quantization step in the `[-1, 1]` domain.
pub fn quantization_step(bit: u32) -> f64 {
    2.0 / max_code(bit) as f64
}

/// Quantizes a sample in `[-1, 1]` to an integer code.
///
/// Out-of-range input is clipped.
pub fn encode_single(x: f64, bit: u32) -> u32 {
    let max = max_code(bit) as f64;
    let scaled = (x.clamp(-1.0, 1.0) + 1.0) / 2.0 * max;
    scaled.round().clamp(0.0, max) as u32
}

/// Maps an integer code back onto `[-1, 1]`.
pub fn decode_single(code: u32, bit: u32) -> f64 {
    code as f64 / max_code(bit) as f64 * 2.0 - 1.0
}

/// Mu-law compands a sample; `mu` is the number of levels (`2^bit`).
pub fn encode_mulaw(x: f64, mu: u32) -> f64 {
    let m = (mu - 1) as f64;
    x.signum() * (m * x.abs()).ln_1p() / m.ln_1p()
}

/// Inverts [`encode_mulaw`].
pub fn decode_mulaw(x: f64, mu: u32) -> f64 {
    let m = (mu - 1) as f64;
    x.signum() * ((x.abs() * m.ln_1p()).exp() - 1.0) / m
}

/// Full forward pipeline: optional mu-law, then quantization.
pub fn encode_sample(x: f64, bit: u32, mulaw: bool) -> u32 {
    let companded = if mulaw {
        encode_mulaw(x.clamp(-1.0, 1.0), 1u32 << bit)
    } else {
        x
    };
    encode_single(companded, bit)
}

/// Full inverse pipeline: dequantization, then optional inverse mu-law.
pub fn decode_sample(code: u32, bit: u32, mulaw: bool) -> f64 {
    decode_value(decode_single(code, bit), bit, mulaw)
}

/// Converts a continuous model output into a sample.
///
/// Used by Gaussian decoding, which skips quantization.
pub fn decode_value(x: f64, bit: u32, mulaw: bool) -> f64 {
    let x = x.clamp(-1.0, 1.0);
    if mulaw {
        // exp/ln can land one ulp outside the unit range at the endpoints
        decode_mulaw(x, 1u32 << bit).clamp(-1.0, 1.0)
    } else {
        x
    }
}

/// Codec parameters bound to one model configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformCodec {
    /// Code width in bits.
    pub bit_size: u32,
    /// Whether mu-law companding is applied.
    pub mulaw: bool,
}

impl WaveformCodec {
    /// Creates a codec.
    pub fn new(bit_size: u32, mulaw: bool) -> Self {
        Self { bit_size, mulaw }
    }

    /// Code representing silence (amplitude 0).
    pub fn silence_code(&self) -> u32 {
        self.encode(0.0)
    }

    /// Encodes an amplitude to a code.
    pub fn encode(&self, x: f64) -> u32 {
        encode_sample(x, self.bit_size, self.mulaw)
    }

    /// Decodes a code to an amplitude.
    pub fn decode(&self, code: u32) -> f64 {
        decode_sample(code, self.bit_size, self.mulaw)
    }

    /// Converts a decoded model output to an amplitude.
    pub fn decode_output(&self, decoded: Decoded) -> f64 {
        match decoded {
            Decoded::Code(code) => self.decode(code),
            Decoded::Value(x) => decode_value(x, self.bit_size, self.mulaw),
        }
    }
}
