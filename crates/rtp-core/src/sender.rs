use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, trace};
use ue_codec_core::AudioCodec;

use crate::packet::{build_packet, RtpHeader};

pub const RTP_PAYLOAD_SIZE: usize = 160;
const TICK: Duration = Duration::from_millis(20);

/// Signals the sender's control channel can carry mid-stream.
#[derive(Debug, Clone)]
pub enum SenderControl {
    Stop,
    ChangePayload(AudioCodec, Arc<[u8]>),
}

/// Outcome of a sender loop exiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderExit {
    /// Stopped by an explicit control signal.
    Stopped,
    /// Ran off the end of the clip with no loop flag set.
    EndOfClip,
}

/// Shared flag the session engine flips when the remote side is holding;
/// the sender checks it every tick instead of needing its own channel.
#[derive(Default, Clone)]
pub struct HoldFlag(Arc<AtomicBool>);

impl HoldFlag {
    pub fn new(holding: bool) -> Self {
        Self(Arc::new(AtomicBool::new(holding)))
    }

    pub fn set(&self, holding: bool) {
        self.0.store(holding, Ordering::Relaxed);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Drives one outbound RTP stream at the fixed 20 ms cadence, reading
/// from an already-encoded clip and padding with codec silence once the
/// clip runs out.
pub struct RtpSender {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
    ssrc: u32,
    codec: AudioCodec,
    clip: Arc<[u8]>,
    hold: HoldFlag,
    control_rx: mpsc::Receiver<SenderControl>,
    loop_clip: bool,
}

impl RtpSender {
    pub fn new(
        socket: Arc<UdpSocket>,
        remote: SocketAddr,
        ssrc: u32,
        codec: AudioCodec,
        clip: Arc<[u8]>,
        hold: HoldFlag,
        control_rx: mpsc::Receiver<SenderControl>,
        loop_clip: bool,
    ) -> Self {
        Self { socket, remote, ssrc, codec, clip, hold, control_rx, loop_clip }
    }

    /// Run the 20 ms ticker until a stop signal arrives or the clip ends
    /// without the loop flag set.
    pub async fn run(mut self) -> SenderExit {
        let mut ticker = interval(TICK);
        let mut sequence_number: u16 = 0;
        let mut timestamp: u32 = 0;
        let mut offset: usize = 0;
        let mut first_packet_of_burst = true;

        loop {
            tokio::select! {
                control = self.control_rx.recv() => {
                    match control {
                        Some(SenderControl::Stop) | None => return SenderExit::Stopped,
                        Some(SenderControl::ChangePayload(codec, clip)) => {
                            debug!(?codec, "sender restarting with new payload");
                            self.codec = codec;
                            self.clip = clip;
                            offset = 0;
                            first_packet_of_burst = true;
                        }
                    }
                }
                _ = ticker.tick() => {
                    timestamp = timestamp.wrapping_add(RTP_PAYLOAD_SIZE as u32);
                    sequence_number = sequence_number.wrapping_add(1);

                    let (frame, end_of_clip) = self.next_frame(offset);
                    offset = if end_of_clip { 0 } else { offset + RTP_PAYLOAD_SIZE };

                    if !self.hold.get() {
                        let header = RtpHeader {
                            marker: first_packet_of_burst,
                            payload_type: self.codec.payload_type(),
                            sequence_number,
                            timestamp,
                            ssrc: self.ssrc,
                        };
                        let packet = build_packet(header, &frame);
                        if let Err(err) = self.socket.send_to(&packet, self.remote).await {
                            trace!(%err, "rtp send failed");
                        }
                    }
                    first_packet_of_burst = false;

                    if end_of_clip && !self.loop_clip {
                        return SenderExit::EndOfClip;
                    }
                }
            }
        }
    }

    fn next_frame(&self, offset: usize) -> (Vec<u8>, bool) {
        let mut frame = vec![self.codec.silence_byte(); RTP_PAYLOAD_SIZE];
        let available = self.clip.len().saturating_sub(offset);
        let end_of_clip = available <= RTP_PAYLOAD_SIZE;
        let take = available.min(RTP_PAYLOAD_SIZE);
        if take > 0 {
            frame[..take].copy_from_slice(&self.clip[offset..offset + take]);
        }
        (frame, end_of_clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_flag_defaults_to_not_holding() {
        let flag = HoldFlag::default();
        assert!(!flag.get());
        flag.set(true);
        assert!(flag.get());
    }

    #[test]
    fn next_frame_pads_with_silence_past_end() {
        let sender = RtpSender {
            socket: unreachable_socket(),
            remote: "127.0.0.1:1".parse().unwrap(),
            ssrc: 1,
            codec: AudioCodec::Pcmu,
            clip: Arc::from(vec![1u8, 2, 3]),
            hold: HoldFlag::default(),
            control_rx: mpsc::channel(1).1,
            loop_clip: false,
        };
        let (frame, end_of_clip) = sender.next_frame(0);
        assert!(end_of_clip);
        assert_eq!(&frame[..3], &[1, 2, 3]);
        assert_eq!(frame[3], AudioCodec::Pcmu.silence_byte());
    }

    fn unreachable_socket() -> Arc<UdpSocket> {
        // Tests only exercise next_frame(), which never touches the socket.
        Arc::new(
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(UdpSocket::bind("127.0.0.1:0"))
                .unwrap(),
        )
    }
}
