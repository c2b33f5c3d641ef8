use crate::types::SessionDescription;
use std::fmt::Write as _;

/// Serialize a [`SessionDescription`] to wire-format SDP (CRLF-terminated
/// lines), matching the field order `v= o= s= c= t= m= a=...` that
/// spec.md §4.1 requires when an answer is built.
pub fn write(sdp: &SessionDescription) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "v=0\r");
    let _ = writeln!(
        out,
        "o={} {} {} IN IP4 {}\r",
        sdp.origin.username, sdp.origin.session_id, sdp.origin.session_version, sdp.origin.address
    );
    let _ = writeln!(out, "s={}\r", if sdp.session_name.is_empty() { "-" } else { &sdp.session_name });
    if let Some(conn) = &sdp.connection {
        let _ = writeln!(out, "c=IN IP4 {}\r", conn.address);
    }
    let _ = writeln!(out, "t=0 0\r");

    for m in &sdp.media {
        let pts: Vec<String> = m.payload_types.iter().map(|pt| pt.to_string()).collect();
        let _ = writeln!(out, "m={} {} {} {}\r", m.media_type, m.port, m.protocol, pts.join(" "));
        if let Some(conn) = &m.connection {
            let _ = writeln!(out, "c=IN IP4 {}\r", conn.address);
        }
        for (pt, name, clock) in &m.rtpmap {
            let _ = writeln!(out, "a=rtpmap:{pt} {name}/{clock}\r");
        }
        for (pt, params) in &m.fmtp {
            let _ = writeln!(out, "a=fmtp:{pt} {params}\r");
        }
        if let Some(ptime) = m.ptime {
            let _ = writeln!(out, "a=ptime:{ptime}\r");
        }
        if let Some(direction) = m.direction {
            let _ = writeln!(out, "a={}\r", direction.attribute_name());
        }
    }

    // Normalize to CRLF (writeln appends \n after our manual \r).
    out
}
