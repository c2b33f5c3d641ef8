use nom::bytes::complete::tag;
use nom::character::complete::anychar;
use nom::combinator::rest;
use nom::sequence::preceded;
use nom::IResult;

use crate::error::{Result, SdpError};
use crate::types::{Connection, Direction, MediaDescription, Origin, SessionDescription};

/// `<type>=<value>`, e.g. `o=- 123 1 IN IP4 192.0.2.1`.
fn type_value_line(input: &str) -> IResult<&str, (char, &str)> {
    let (input, kind) = anychar(input)?;
    let (input, value) = preceded(tag("="), rest)(input)?;
    Ok((input, (kind, value)))
}

fn parse_line_kind(line: &str) -> Option<(char, &str)> {
    type_value_line(line).ok().map(|(_, parsed)| parsed)
}

/// Parse a full SDP body (LF or CRLF-separated `type=value` lines) into a
/// [`SessionDescription`]. Unknown/unsupported line types are ignored, as
/// RFC 4566 requires lenient forward compatibility.
pub fn parse(body: &str) -> Result<SessionDescription> {
    let mut origin: Option<Origin> = None;
    let mut session_name = String::new();
    let mut session_connection: Option<Connection> = None;
    let mut session_direction: Option<Direction> = None;
    let mut media: Vec<MediaDescription> = Vec::new();

    for raw_line in body.lines() {
        let line = raw_line.trim_end_matches('\r');
        let Some((kind, value)) = parse_line_kind(line) else { continue };
        let current = media.last_mut();

        match kind {
            'o' => origin = Some(parse_origin(value)?),
            's' => session_name = value.to_string(),
            'c' => {
                let conn = parse_connection(value)?;
                match current {
                    Some(m) => m.connection = Some(conn),
                    None => session_connection = Some(conn),
                }
            }
            'm' => media.push(parse_media(value)?),
            'a' => parse_attribute(value, current, &mut session_direction),
            _ => { /* v=, t=, and anything else we don't act on */ }
        }
    }

    Ok(SessionDescription {
        origin: origin.ok_or(SdpError::MissingField("o="))?,
        session_name,
        connection: session_connection,
        direction: session_direction,
        media,
    })
}

fn parse_origin(value: &str) -> Result<Origin> {
    // username sess-id sess-version nettype addrtype unicast-address
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() < 6 {
        return Err(SdpError::MalformedLine(format!("o={value}")));
    }
    Ok(Origin {
        username: parts[0].to_string(),
        session_id: parts[1]
            .parse()
            .map_err(|_| SdpError::MalformedLine(format!("o={value}")))?,
        session_version: parts[2]
            .parse()
            .map_err(|_| SdpError::MalformedLine(format!("o={value}")))?,
        address: parts[5].to_string(),
    })
}

fn parse_connection(value: &str) -> Result<Connection> {
    // nettype addrtype connection-address, e.g. "IN IP4 192.0.2.1"
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() < 3 || parts[0] != "IN" || parts[1] != "IP4" {
        return Err(SdpError::InvalidConnection(value.to_string()));
    }
    Ok(Connection::new(parts[2]))
}

fn parse_media(value: &str) -> Result<MediaDescription> {
    // media port proto fmt...
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(SdpError::MalformedLine(format!("m={value}")));
    }
    let port: u16 = parts[1]
        .parse()
        .map_err(|_| SdpError::MalformedLine(format!("m={value}")))?;
    let payload_types: Vec<u8> = parts[3..].iter().filter_map(|p| p.parse().ok()).collect();

    let mut m = MediaDescription::new_audio(port);
    m.media_type = parts[0].to_string();
    m.protocol = parts[2].to_string();
    m.payload_types = payload_types;
    Ok(m)
}

fn parse_attribute(
    value: &str,
    current_media: Option<&mut MediaDescription>,
    session_direction: &mut Option<Direction>,
) {
    if let Some(direction) = Direction::parse(value) {
        match current_media {
            Some(m) => m.direction = Some(direction),
            None => *session_direction = Some(direction),
        }
        return;
    }

    let Some(m) = current_media else { return };

    if let Some(rest) = value.strip_prefix("ptime:") {
        m.ptime = rest.trim().parse().ok();
    } else if let Some(rest) = value.strip_prefix("rtpmap:") {
        if let Some((pt_str, spec)) = rest.split_once(' ') {
            if let Ok(pt) = pt_str.parse::<u8>() {
                let spec_parts: Vec<&str> = spec.split('/').collect();
                let name = spec_parts.first().copied().unwrap_or("").to_string();
                let clock: u32 = spec_parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(8000);
                if name.eq_ignore_ascii_case("telephone-event") {
                    m.telephone_event_pt = Some(pt);
                }
                m.rtpmap.push((pt, name, clock));
            }
        }
    } else if let Some(rest) = value.strip_prefix("fmtp:") {
        if let Some((pt_str, params)) = rest.split_once(' ') {
            if let Ok(pt) = pt_str.parse::<u8>() {
                m.fmtp.push((pt, params.to_string()));
            }
        }
    }
}
