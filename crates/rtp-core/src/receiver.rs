use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{trace, warn};
use ue_codec_core::dtmf::{detect_dtmf, telephone_event_to_symbol};
use ue_codec_core::{decode_to_pcm, AudioCodec, DTMF_PACKETS_COUNT};

use crate::packet::RtpHeader;
use crate::telephone_event::TelephoneEventPayload;

/// A DTMF digit surfaced from either path: telephone-event or inband
/// Goertzel detection over the decoded media stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DtmfEvent(pub &'static str);

/// Reads datagrams from one media socket, discarding anything not from
/// the negotiated remote, and extracts DTMF via whichever path is active
/// for this call.
pub struct RtpReceiver {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
    codec: AudioCodec,
    telephone_event_pt: Option<u8>,
    dtmf_tx: mpsc::Sender<DtmfEvent>,
    last_telephone_event_timestamp: Option<u32>,
    inband_collecting: bool,
    inband_buffer: Vec<u8>,
}

impl RtpReceiver {
    pub fn new(
        socket: Arc<UdpSocket>,
        remote: SocketAddr,
        codec: AudioCodec,
        telephone_event_pt: Option<u8>,
        dtmf_tx: mpsc::Sender<DtmfEvent>,
    ) -> Self {
        Self {
            socket,
            remote,
            codec,
            telephone_event_pt,
            dtmf_tx,
            last_telephone_event_timestamp: None,
            inband_collecting: false,
            inband_buffer: Vec::new(),
        }
    }

    /// Run until the socket errors out (peer teardown closes it first).
    pub async fn run(mut self) {
        let mut buf = [0u8; 2048];
        loop {
            let (len, from) = match self.socket.recv_from(&mut buf).await {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(%err, "rtp receive failed, stopping receiver");
                    return;
                }
            };
            if from != self.remote {
                trace!(%from, expected = %self.remote, "dropping datagram from unexpected source");
                continue;
            }
            self.on_packet(&buf[..len]);
        }
    }

    /// Feed one already-received datagram through the telephone-event /
    /// inband dispatch. Exposed directly (rather than only through
    /// [`Self::run`]) so a caller that already owns the socket loop can
    /// drive it without an extra hop through a real UDP datagram.
    pub fn on_packet(&mut self, bytes: &[u8]) {
        let Ok(header) = RtpHeader::parse(bytes) else {
            trace!("dropping short rtp packet");
            return;
        };
        let payload = &bytes[crate::packet::RTP_HEADER_SIZE..];

        if self.telephone_event_pt == Some(header.payload_type) {
            self.handle_telephone_event(header, payload);
        } else {
            self.handle_inband(header, payload);
        }
    }

    fn handle_telephone_event(&mut self, header: RtpHeader, payload: &[u8]) {
        let Some(_te) = TelephoneEventPayload::parse(payload) else { return };
        if self.last_telephone_event_timestamp == Some(header.timestamp) {
            return;
        }
        self.last_telephone_event_timestamp = Some(header.timestamp);

        if let Some(symbol) = telephone_event_to_symbol(payload[0]) {
            let _ = self.dtmf_tx.try_send(DtmfEvent(symbol));
        }
    }

    fn handle_inband(&mut self, header: RtpHeader, payload: &[u8]) {
        if header.marker {
            self.inband_collecting = true;
            self.inband_buffer.clear();
        }
        if !self.inband_collecting {
            return;
        }

        self.inband_buffer.extend_from_slice(payload);
        let frames_collected = self.inband_buffer.len() / crate::sender::RTP_PAYLOAD_SIZE;
        if frames_collected < DTMF_PACKETS_COUNT {
            return;
        }

        let pcm = decode_to_pcm(self.codec, &self.inband_buffer);
        self.inband_collecting = false;
        self.inband_buffer.clear();

        if let Some(digit) = detect_dtmf(&pcm) {
            if let Some(symbol) = digit_to_static_str(digit) {
                let _ = self.dtmf_tx.try_send(DtmfEvent(symbol));
            }
        }
    }
}

fn digit_to_static_str(c: char) -> Option<&'static str> {
    match c {
        '1' => Some("1"),
        '2' => Some("2"),
        '3' => Some("3"),
        '4' => Some("4"),
        '5' => Some("5"),
        '6' => Some("6"),
        '7' => Some("7"),
        '8' => Some("8"),
        '9' => Some("9"),
        '0' => Some("0"),
        '*' => Some("*"),
        '#' => Some("#"),
        'A' => Some("A"),
        'B' => Some("B"),
        'C' => Some("C"),
        'D' => Some("D"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_mapping_covers_keypad() {
        for c in ['1', '2', '3', 'A', '*', '#', '0'] {
            assert!(digit_to_static_str(c).is_some());
        }
        assert!(digit_to_static_str('Z').is_none());
    }

    #[tokio::test]
    async fn telephone_event_repeat_timestamp_is_ignored() {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let remote: SocketAddr = "127.0.0.1:1".parse().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let mut receiver = RtpReceiver::new(socket, remote, AudioCodec::Pcmu, Some(101), tx);

        let header = RtpHeader { marker: false, payload_type: 101, sequence_number: 1, timestamp: 8000, ssrc: 1 };
        let payload = TelephoneEventPayload { event: 1, end_of_event: false, volume: 0, duration: 160 }.to_bytes();
        let mut packet = header.to_bytes().to_vec();
        packet.extend_from_slice(&payload);

        receiver.on_packet(&packet);
        receiver.on_packet(&packet);

        assert_eq!(rx.try_recv().unwrap().0, "1");
        assert!(rx.try_recv().is_err());
    }
}
