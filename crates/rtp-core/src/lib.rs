//! RFC 3550 RTP send/receive for a single 20 ms-cadence audio stream:
//! the packet codec, the media port pool, the lazily-encoded clip
//! repository, RFC 4733 telephone-events, and the sender/receiver loops
//! that bridge to `ue-codec-core` for transcoding and DTMF detection.

pub mod error;
pub mod media_repository;
pub mod packet;
pub mod port_pool;
pub mod receiver;
pub mod sender;
pub mod telephone_event;

pub use error::{Result, RtpError};
pub use media_repository::{MediaClip, MediaRepository};
pub use packet::{build_packet, RtpHeader, RTP_HEADER_SIZE};
pub use port_pool::MediaPortPool;
pub use receiver::{DtmfEvent, RtpReceiver};
pub use sender::{HoldFlag, RtpSender, SenderControl, SenderExit, RTP_PAYLOAD_SIZE};
pub use telephone_event::TelephoneEventPayload;
