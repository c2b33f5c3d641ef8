use crate::error::{Result, SdpError};
use crate::types::{Connection, Direction, MediaDescription, Origin, SessionDescription};
use ue_codec_core::AudioCodec;

/// `NegotiateMode(local, remote)` per spec.md §4.5's direction algebra
/// table. `sendrecv` composes with the peer's direction as-is; anything
/// that commits one side to not-send or not-receive propagates through.
pub fn negotiate_direction(local: Direction, remote: Direction) -> Direction {
    use Direction::*;
    match (local, remote) {
        (SendRecv, SendRecv) => SendRecv,
        (SendRecv, SendOnly) => RecvOnly,
        (SendRecv, RecvOnly) => SendOnly,
        (SendRecv, Inactive) => Inactive,

        (SendOnly, SendRecv) => SendOnly,
        (SendOnly, SendOnly) => Inactive,
        (SendOnly, RecvOnly) => SendOnly,
        (SendOnly, Inactive) => Inactive,

        (RecvOnly, SendRecv) => RecvOnly,
        (RecvOnly, SendOnly) => RecvOnly,
        (RecvOnly, RecvOnly) => Inactive,
        (RecvOnly, Inactive) => Inactive,

        (Inactive, _) => Inactive,
    }
}

/// A chosen audio media line to answer with: codec, reserved local port,
/// and negotiated direction.
#[derive(Debug, Clone)]
pub struct ChosenMedia {
    pub codec: AudioCodec,
    pub telephone_event_pt: Option<u8>,
    pub negotiated_direction: Direction,
}

/// Select the first audio media line that is RTP/AVP, has a nonzero port,
/// an IN IP4 connection, 8kHz mono, and a codec we support.
/// Mirrors spec.md §4.4 step 2's inbound-INVITE media selection.
pub fn select_compatible_media<'a>(
    offer: &'a SessionDescription,
) -> Option<(&'a MediaDescription, AudioCodec)> {
    offer.media.iter().find_map(|m| {
        if m.media_type != "audio" || !m.is_rtp_avp() || m.port == 0 {
            return None;
        }
        let conn = offer.effective_connection(m)?;
        if conn.is_zeroed() {
            return None;
        }
        let codec = m.first_supported_codec()?;
        Some((m, codec))
    })
}

/// Build our local answer/offer SDP: our own origin, connection, chosen
/// codec, negotiated direction, fixed 20ms ptime, and telephone-event
/// passthrough if offered. `local_direction` is our side's stance before
/// negotiation (e.g. `sendrecv` normally, `sendonly` while holding).
pub fn build_sdp(
    username: &str,
    local_addr: &str,
    session_id: u64,
    session_version: u64,
    local_port: u16,
    codec: AudioCodec,
    telephone_event_pt: Option<u8>,
    negotiated_direction: Direction,
) -> SessionDescription {
    let mut media = MediaDescription::new_audio(local_port);
    media.payload_types.push(codec.payload_type());
    media
        .rtpmap
        .push((codec.payload_type(), codec.rtpmap_name().to_string(), codec.clock_rate()));
    if let Some(pt) = telephone_event_pt {
        media.payload_types.push(pt);
        media.rtpmap.push((pt, "telephone-event".to_string(), 8000));
        media.fmtp.push((pt, "0-16".to_string()));
        media.telephone_event_pt = Some(pt);
    }
    media.ptime = Some(20);
    media.direction = Some(negotiated_direction);

    SessionDescription {
        origin: Origin {
            username: username.to_string(),
            session_id,
            session_version,
            address: local_addr.to_string(),
        },
        session_name: "-".to_string(),
        connection: Some(Connection::new(local_addr)),
        direction: None,
        media: vec![media],
    }
}

/// Validate an inbound offer against spec.md §4.4's inbound-INVITE
/// preconditions: compatible media must exist, and ptime (if stated) must
/// be exactly 20ms.
pub fn validate_offer(offer: &SessionDescription) -> Result<(&MediaDescription, AudioCodec)> {
    let (media, codec) = select_compatible_media(offer).ok_or(SdpError::NoCompatibleMedia)?;
    let ptime = offer.effective_ptime(media);
    if ptime != 20 {
        return Err(SdpError::UnsupportedPtime(ptime));
    }
    Ok((media, codec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use Direction::*;

    #[test]
    fn direction_table_matches_spec() {
        assert_eq!(negotiate_direction(SendRecv, SendRecv), SendRecv);
        assert_eq!(negotiate_direction(SendRecv, SendOnly), RecvOnly);
        assert_eq!(negotiate_direction(SendRecv, RecvOnly), SendOnly);
        assert_eq!(negotiate_direction(SendRecv, Inactive), Inactive);

        assert_eq!(negotiate_direction(SendOnly, SendRecv), SendOnly);
        assert_eq!(negotiate_direction(SendOnly, SendOnly), Inactive);
        assert_eq!(negotiate_direction(SendOnly, RecvOnly), SendOnly);
        assert_eq!(negotiate_direction(SendOnly, Inactive), Inactive);

        assert_eq!(negotiate_direction(RecvOnly, SendRecv), RecvOnly);
        assert_eq!(negotiate_direction(RecvOnly, SendOnly), RecvOnly);
        assert_eq!(negotiate_direction(RecvOnly, RecvOnly), Inactive);
        assert_eq!(negotiate_direction(RecvOnly, Inactive), Inactive);

        for remote in [SendRecv, SendOnly, RecvOnly, Inactive] {
            assert_eq!(negotiate_direction(Inactive, remote), Inactive);
        }
    }

    #[test]
    fn rejects_non_20ms_ptime() {
        let offer = crate::parser::parse(
            "v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\ns=-\r\nc=IN IP4 10.0.0.1\r\nt=0 0\r\nm=audio 40000 RTP/AVP 0\r\na=rtpmap:0 PCMU/8000\r\na=ptime:30\r\n",
        )
        .unwrap();
        assert!(matches!(validate_offer(&offer), Err(SdpError::UnsupportedPtime(30))));
    }
}
