use crate::body::Body;
use crate::header::Headers;
use crate::message::{Message, SideFields, StartLine};

/// Build a response to `request`: copies Via (every value, in order),
/// From, To, Call-ID, and CSeq, per the response-construction rule in
/// spec.md §4.1/§4.4. `to_tag` is injected onto the To header when given
/// and the request's own To carries no tag yet (dialog creation on a
/// 180/200); pass `None` for a response within a dialog that already has
/// one, or for a stateless rejection that never establishes a dialog.
pub fn build_response(request: &Message, status_code: u16, reason_phrase: &str, to_tag: Option<&str>) -> Message {
    let mut headers = Headers::new();
    for via in request.headers.get_all("Via") {
        headers.append("Via", via.clone());
    }
    if let Some(from) = request.headers.get("From") {
        headers.append("From", from.to_string());
    }
    let to = request.headers.get("To").unwrap_or("").to_string();
    headers.append("To", with_to_tag(&to, to_tag));
    if let Some(call_id) = request.headers.get("Call-ID") {
        headers.append("Call-ID", call_id.to_string());
    }
    if let Some(cseq) = request.headers.get("CSeq") {
        headers.append("CSeq", cseq.to_string());
    }

    let side = SideFields {
        call_id: request.side.call_id.clone(),
        from_tag: request.side.from_tag.clone(),
        to_tag: to_tag.map(str::to_string).or_else(|| request.side.to_tag.clone()),
        via_branch: request.side.via_branch.clone(),
        cseq_number: request.side.cseq_number,
        cseq_method: request.side.cseq_method,
        max_forwards: None,
        contact_uri: None,
        record_route_uris: request.side.record_route_uris.clone(),
    };

    Message {
        start_line: StartLine::Response { status_code, reason_phrase: reason_phrase.to_string() },
        headers,
        body: Body::empty(),
        side,
        cached_bytes: None,
    }
}

fn with_to_tag(to_header: &str, to_tag: Option<&str>) -> String {
    match to_tag {
        Some(tag) if !to_header.contains("tag=") => format!("{to_header};tag={tag}"),
        _ => to_header.to_string(),
    }
}

/// Set (replacing any existing value) the response's Contact header, per
/// spec.md §4.4's dialog-establishing-response rule.
pub fn add_contact(msg: &mut Message, contact_uri: &str) {
    msg.headers.set("Contact", format!("<{contact_uri}>"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Headers as H;
    use crate::method::Method;

    fn sample_invite() -> Message {
        let mut headers = H::new();
        headers.append("Via", "SIP/2.0/UDP 10.0.0.2:5060;branch=z9hG4bK-1");
        headers.append("From", "<sip:caller@remote>;tag=tag-remote");
        headers.append("To", "<sip:ivr@local>");
        headers.append("Call-ID", "call-1");
        headers.append("CSeq", "1 INVITE");
        Message {
            start_line: StartLine::Request { method: Method::Invite, request_uri: "sip:ivr@local".into() },
            headers,
            body: Body::empty(),
            side: SideFields { call_id: "call-1".into(), from_tag: Some("tag-remote".into()), ..SideFields::default() },
            cached_bytes: None,
        }
    }

    #[test]
    fn injects_to_tag_once() {
        let request = sample_invite();
        let response = build_response(&request, 180, "Ringing", Some("tag-local"));
        assert_eq!(response.headers.get("To"), Some("<sip:ivr@local>;tag=tag-local"));
        assert_eq!(response.headers.get("Via"), request.headers.get("Via"));
        assert_eq!(response.status_code(), Some(180));
    }

    #[test]
    fn does_not_double_tag_an_already_tagged_to() {
        let mut request = sample_invite();
        request.headers.set("To", "<sip:ivr@local>;tag=existing");
        let response = build_response(&request, 200, "OK", Some("tag-local"));
        assert_eq!(response.headers.get("To"), Some("<sip:ivr@local>;tag=existing"));
    }

    #[test]
    fn contact_is_set_not_appended() {
        let request = sample_invite();
        let mut response = build_response(&request, 200, "OK", Some("tag-local"));
        add_contact(&mut response, "sip:ivr@10.0.0.3:5060");
        add_contact(&mut response, "sip:ivr@10.0.0.3:5060");
        assert_eq!(response.headers.get_all("Contact").len(), 1);
    }
}
