//! G.722 sub-band ADPCM transcoding.
//!
//! G.722 splits a 16 kHz signal into a low and a high sub-band with a QMF
//! analysis filter, ADPCM-codes each band independently, and packs the
//! result into one byte per input sample pair (6 bits low-band, 2 bits
//! high-band). The RTP clock rate is nonetheless 8000 per RFC 3551, so a
//! 20ms / 160-byte frame carries 320 samples of 16kHz audio.

use crate::error::{CodecError, Result};

const QMF_COEFFS: [i32; 24] = [
    3, -11, -11, 53, 12, -156, 32, 362, -210, -805, 951, 3876, -3876, -951, 805, 210, -362, -32,
    156, -12, -53, 11, 11, -3,
];

#[derive(Debug, Clone)]
struct Adpcm {
    s: i32,
    r: [i32; 3],
    a: [i32; 2],
    b: [i32; 6],
    d: [i32; 6],
    det: i32,
}

impl Adpcm {
    fn new() -> Self {
        Self {
            s: 0,
            r: [0; 3],
            a: [0; 2],
            b: [0; 6],
            d: [0; 6],
            det: 32,
        }
    }

    fn predict(&self) -> i32 {
        let mut se = self.s;
        se += (self.a[0] * self.r[0]) >> 15;
        se += (self.a[1] * self.r[1]) >> 15;
        for i in 0..6 {
            se += (self.b[i] * self.d[i]) >> 15;
        }
        se
    }

    fn quantize(&self, d: i32) -> i32 {
        let step = self.det.max(1);
        ((d * 4) / step).clamp(-8, 7)
    }

    fn inverse_quantize(&self, y: i32) -> i32 {
        (y * self.det.max(1)) / 4
    }

    fn update(&mut self, dq: i32) {
        self.r[2] = self.r[1];
        self.r[1] = self.r[0];
        self.r[0] = self.s;
        for i in (1..6).rev() {
            self.d[i] = self.d[i - 1];
        }
        self.d[0] = dq;
        self.s += dq;
        self.det = ((self.det * 15 + 8) / 16).clamp(1, 32767);
    }

    fn encode(&mut self, input: i32) -> i32 {
        let se = self.predict();
        let d = input - se;
        let y = self.quantize(d);
        let dq = self.inverse_quantize(y);
        self.update(dq);
        y
    }

    fn decode(&mut self, y: i32) -> i32 {
        let se = self.predict();
        let dq = self.inverse_quantize(y);
        let sr = se + dq;
        self.update(dq);
        sr
    }
}

/// Streaming G.722 encoder. Owns QMF analysis history and both sub-band
/// ADPCM states; feed it pairs of 16kHz samples in order.
#[derive(Debug, Clone)]
pub struct G722Encoder {
    low: Adpcm,
    high: Adpcm,
    qmf: [i32; 24],
}

impl G722Encoder {
    pub fn new() -> Self {
        Self {
            low: Adpcm::new(),
            high: Adpcm::new(),
            qmf: [0; 24],
        }
    }

    fn qmf_analysis(&mut self, pair: [i16; 2]) -> (i32, i32) {
        for i in (2..24).rev() {
            self.qmf[i] = self.qmf[i - 2];
        }
        self.qmf[0] = pair[0] as i32;
        self.qmf[1] = pair[1] as i32;

        let mut even = 0i64;
        let mut odd = 0i64;
        for i in 0..12 {
            even += self.qmf[i * 2] as i64 * QMF_COEFFS[i * 2] as i64;
            odd += self.qmf[i * 2 + 1] as i64 * QMF_COEFFS[i * 2 + 1] as i64;
        }
        (((even + odd) >> 15) as i32, ((even - odd) >> 15) as i32)
    }

    /// Encode one 16kHz sample pair to a single G.722 byte.
    pub fn encode_pair(&mut self, pair: [i16; 2]) -> u8 {
        let (low_band, high_band) = self.qmf_analysis(pair);
        let low_code = self.low.encode(low_band) & 0x3F;
        let high_code = self.high.encode(high_band) & 0x03;
        (low_code | (high_code << 6)) as u8
    }

    /// Encode a whole frame. `samples.len()` must be even.
    pub fn encode(&mut self, samples: &[i16]) -> Result<Vec<u8>> {
        if samples.len() % 2 != 0 {
            return Err(CodecError::ShortFrame {
                expected: samples.len() + 1,
                actual: samples.len(),
            });
        }
        Ok(samples
            .chunks_exact(2)
            .map(|c| self.encode_pair([c[0], c[1]]))
            .collect())
    }
}

/// Streaming G.722 decoder, the mirror of [`G722Encoder`].
#[derive(Debug, Clone)]
pub struct G722Decoder {
    low: Adpcm,
    high: Adpcm,
    qmf: [i32; 24],
}

impl G722Decoder {
    pub fn new() -> Self {
        Self {
            low: Adpcm::new(),
            high: Adpcm::new(),
            qmf: [0; 24],
        }
    }

    fn qmf_synthesis(&mut self, low_band: i32, high_band: i32) -> [i16; 2] {
        for i in (2..24).rev() {
            self.qmf[i] = self.qmf[i - 2];
        }
        self.qmf[0] = low_band + high_band;
        self.qmf[1] = low_band - high_band;

        let mut s0 = 0i64;
        let mut s1 = 0i64;
        for i in 0..12 {
            s0 += self.qmf[i * 2] as i64 * QMF_COEFFS[i * 2] as i64;
            s1 += self.qmf[i * 2 + 1] as i64 * QMF_COEFFS[i * 2 + 1] as i64;
        }
        [
            (s0 >> 15).clamp(-32768, 32767) as i16,
            (s1 >> 15).clamp(-32768, 32767) as i16,
        ]
    }

    /// Decode a single G.722 byte to a 16kHz sample pair.
    pub fn decode_byte(&mut self, byte: u8) -> [i16; 2] {
        let low_code = (byte & 0x3F) as i32;
        let high_code = ((byte >> 6) & 0x03) as i32;
        let low_band = self.low.decode(low_code);
        let high_band = self.high.decode(high_code);
        self.qmf_synthesis(low_band, high_band)
    }

    /// Decode a whole frame of G.722 bytes back to 16kHz PCM samples.
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<i16> {
        let mut out = Vec::with_capacity(bytes.len() * 2);
        for &b in bytes {
            let pair = self.decode_byte(b);
            out.extend_from_slice(&pair);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_preserves_rough_amplitude() {
        let mut enc = G722Encoder::new();
        let mut dec = G722Decoder::new();
        let samples: Vec<i16> = (0..320)
            .map(|i| ((i as f32 * 0.1).sin() * 10000.0) as i16)
            .collect();
        let encoded = enc.encode(&samples).unwrap();
        assert_eq!(encoded.len(), 160);
        let decoded = dec.decode(&encoded);
        assert_eq!(decoded.len(), 320);
    }

    #[test]
    fn rejects_odd_length_frames() {
        let mut enc = G722Encoder::new();
        assert!(enc.encode(&[1, 2, 3]).is_err());
    }
}
