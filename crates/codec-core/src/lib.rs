//! Narrowband audio transcoding (PCMA/PCMU/G.722 <-> 16-bit linear PCM)
//! and Goertzel-based DTMF tone detection.
//!
//! This crate has no knowledge of SIP, SDP, or RTP: it deals only in raw
//! sample buffers and codec bytes, and is pulled in by `ue-rtp-core` for
//! the media bridge and by the inband DTMF path of the receiver.

pub mod dtmf;
pub mod error;
pub mod g711;
pub mod g722;
pub mod types;

pub use error::{CodecError, Result};
pub use types::AudioCodec;

/// Samples per 20ms frame at 8kHz - the RTP packetization unit this whole
/// client is built around (`RTP_PAYLOAD_SIZE` in the wire spec).
pub const RTP_FRAME_SAMPLES: usize = 160;

/// Number of consecutive telephone-event-less RTP packets collected before
/// running Goertzel over the reassembled PCM.
pub const DTMF_PACKETS_COUNT: usize = 3;

/// Transcode a block of encoded bytes for `codec` into 16-bit linear PCM.
pub fn decode_to_pcm(codec: AudioCodec, bytes: &[u8]) -> Vec<i16> {
    match codec {
        AudioCodec::Pcmu => g711::decode_mulaw(bytes),
        AudioCodec::Pcma => g711::decode_alaw(bytes),
        AudioCodec::G722 => {
            let mut dec = g722::G722Decoder::new();
            dec.decode(bytes)
        }
    }
}

/// Transcode a block of 16-bit linear PCM into `codec`'s encoded bytes.
pub fn encode_from_pcm(codec: AudioCodec, pcm: &[i16]) -> Result<Vec<u8>> {
    match codec {
        AudioCodec::Pcmu => Ok(g711::encode_mulaw(pcm)),
        AudioCodec::Pcma => Ok(g711::encode_alaw(pcm)),
        AudioCodec::G722 => {
            let mut enc = g722::G722Encoder::new();
            enc.encode(pcm)
        }
    }
}
