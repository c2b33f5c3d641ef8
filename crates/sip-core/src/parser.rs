use nom::bytes::complete::{tag, take_till1};
use nom::character::complete::{digit1, space1};
use nom::combinator::{opt, rest};
use nom::sequence::preceded;
use nom::IResult;
use tracing::warn;

use crate::body::{Body, BodyType, ContentPart, MULTIPART_BOUNDARY};
use crate::error::{Result, SipError};
use crate::header::Headers;
use crate::message::{Message, SideFields, StartLine, MAGIC_COOKIE};
use crate::method::Method;
use crate::uri::Uri;

/// Parse the first complete SIP PDU out of `buf`, returning the decoded
/// [`Message`] and whatever bytes followed it (for a caller that may have
/// received several concatenated PDUs in one UDP datagram).
///
/// Per spec.md §4.1: a PDU is malformed (and rejected with no reply) if
/// any mandatory header is missing, CSeq/Content-Length repeats, the
/// Via-branch lacks the magic cookie (a warning, not a failure), or the
/// stated Content-Length exceeds what's actually in the buffer.
pub fn parse(buf: &[u8]) -> Result<(Message, &[u8])> {
    let separator = find_header_body_separator(buf).ok_or(SipError::Fragmented)?;
    let preamble = &buf[..separator];
    let rest = &buf[separator + 4..];

    let preamble_str = std::str::from_utf8(preamble).map_err(|_| SipError::MalformedStartLine("non-utf8 preamble".into()))?;
    let mut lines = preamble_str.split("\r\n");
    let start_line_str = lines.next().unwrap_or("");

    let start_line = parse_start_line(start_line_str)?;

    let mut headers = Headers::new();
    let mut seen_cseq = false;
    let mut seen_content_length = false;
    let mut side = SideFields::default();

    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (name, value) = header_line(line)
            .map(|(_, parsed)| parsed)
            .map_err(|_| SipError::MalformedHeader(line.to_string()))?;
        let name = name.trim();
        let value = value.trim();
        let lower = name.to_ascii_lowercase();

        if lower == "cseq" {
            if seen_cseq {
                return Err(SipError::DuplicateHeader("CSeq"));
            }
            seen_cseq = true;
        }
        if lower == "content-length" {
            if seen_content_length {
                return Err(SipError::DuplicateHeader("Content-Length"));
            }
            seen_content_length = true;
        }

        extract_side_field(&mut side, &lower, value, &start_line)?;
        headers.append(name, value);
    }

    validate_mandatory_headers(&headers, &start_line)?;

    let content_length = headers
        .get("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(rest.len());

    if rest.len() < content_length {
        return Err(SipError::BodyTooShort { expected: content_length, actual: rest.len() });
    }

    let body_bytes = &rest[..content_length];
    let remaining = &rest[content_length..];

    let body = if body_bytes.is_empty() {
        Body::empty()
    } else {
        parse_body(&headers, body_bytes)
    };

    Ok((
        Message {
            start_line,
            headers,
            body,
            side,
            cached_bytes: None,
        },
        remaining,
    ))
}

fn find_header_body_separator(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// `SIP/2.0 <code> <reason...>`.
fn status_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, code) = preceded(tag("SIP/2.0 "), digit1)(input)?;
    let (input, reason) = opt(preceded(space1, rest))(input)?;
    Ok((input, (code, reason.unwrap_or(""))))
}

/// `<method> <request-uri> <version>`.
fn request_line(input: &str) -> IResult<&str, (&str, &str, &str)> {
    let (input, method_token) = take_till1(|c| c == ' ')(input)?;
    let (input, _) = space1(input)?;
    let (input, request_uri) = take_till1(|c| c == ' ')(input)?;
    let (input, _) = space1(input)?;
    let (input, version) = rest(input)?;
    Ok((input, (method_token, request_uri, version)))
}

fn header_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, name) = take_till1(|c| c == ':')(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, value) = rest(input)?;
    Ok((input, (name, value)))
}

fn parse_start_line(line: &str) -> Result<StartLine> {
    if let Ok((_, (code_str, reason))) = status_line(line) {
        let code: u16 = code_str.parse().map_err(|_| SipError::MalformedStartLine(line.to_string()))?;
        if !(100..=699).contains(&code) {
            return Err(SipError::InvalidStatusCode(code));
        }
        return Ok(StartLine::Response { status_code: code, reason_phrase: reason.to_string() });
    }

    let (method_token, request_uri, version) = request_line(line)
        .map(|(_, parsed)| parsed)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| SipError::MalformedStartLine(line.to_string()))?;

    if version != "SIP/2.0" || request_uri.is_empty() {
        return Err(SipError::MalformedStartLine(line.to_string()));
    }
    let method = Method::parse(method_token).ok_or_else(|| SipError::InvalidMethod(method_token.to_string()))?;

    Ok(StartLine::Request { method, request_uri: request_uri.to_string() })
}

fn extract_side_field(side: &mut SideFields, lower_name: &str, value: &str, start_line: &StartLine) -> Result<()> {
    match lower_name {
        "call-id" => side.call_id = value.to_string(),
        "from" => side.from_tag = extract_tag(value),
        "to" => side.to_tag = extract_tag(value),
        "via" => {
            let branch = value
                .split(';')
                .find_map(|p| p.trim().strip_prefix("branch="))
                .map(str::to_string);
            if let Some(branch) = &branch {
                if !branch.starts_with(MAGIC_COOKIE) {
                    warn!(branch = %branch, "Via branch missing z9hG4bK magic cookie");
                }
            }
            side.via_branch = branch;
        }
        "cseq" => {
            let mut parts = value.split_whitespace();
            let number: u32 = parts
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| SipError::MalformedHeader(format!("CSeq: {value}")))?;
            let method_token = parts.next().unwrap_or("");
            let method = Method::parse(method_token).ok_or_else(|| SipError::InvalidMethod(method_token.to_string()))?;

            if let StartLine::Request { method: line_method, .. } = start_line {
                if method != *line_method {
                    return Err(SipError::CSeqMethodMismatch {
                        header: method.to_string(),
                        line: line_method.to_string(),
                    });
                }
            }
            side.cseq_number = Some(number);
            side.cseq_method = Some(method);
        }
        "max-forwards" => {
            let n: i64 = value
                .parse()
                .map_err(|_| SipError::MalformedHeader(format!("Max-Forwards: {value}")))?;
            if !(0..=255).contains(&n) {
                return Err(SipError::MaxForwardsOutOfRange(n));
            }
            side.max_forwards = Some(n as u8);
        }
        "contact" => side.contact_uri = Uri::parse(value),
        "record-route" => {
            if let Some(uri) = Uri::parse(value) {
                side.record_route_uris.push(uri);
            }
        }
        _ => {}
    }
    Ok(())
}

fn extract_tag(header_value: &str) -> Option<String> {
    header_value
        .split(';')
        .find_map(|p| p.trim().strip_prefix("tag="))
        .map(str::to_string)
}

fn validate_mandatory_headers(headers: &Headers, start_line: &StartLine) -> Result<()> {
    for required in ["via", "from", "to", "call-id", "cseq"] {
        if !headers.contains(required) {
            return Err(SipError::MissingHeader(match required {
                "via" => "Via",
                "from" => "From",
                "to" => "To",
                "call-id" => "Call-ID",
                _ => "CSeq",
            }));
        }
    }
    if let StartLine::Request { method: Method::Invite, .. } = start_line {
        if !headers.contains("max-forwards") {
            return Err(SipError::MissingHeader("Max-Forwards"));
        }
        if !headers.contains("contact") {
            return Err(SipError::MissingHeader("Contact"));
        }
    }
    Ok(())
}

fn parse_body(headers: &Headers, bytes: &[u8]) -> Body {
    let content_type = headers.get("content-type").unwrap_or("");
    let body_type = BodyType::from_content_type(content_type);

    if body_type.is_multipart() {
        let boundary = content_type
            .split(';')
            .find_map(|p| p.trim().strip_prefix("boundary="))
            .map(|b| b.trim_matches('"'))
            .unwrap_or(MULTIPART_BOUNDARY);
        parse_multipart(bytes, boundary)
    } else {
        Body::single(body_type, bytes.to_vec())
    }
}

fn parse_multipart(bytes: &[u8], boundary: &str) -> Body {
    let text = String::from_utf8_lossy(bytes);
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();

    for segment in text.split(&delimiter) {
        let segment = segment.trim_start_matches("\r\n");
        if segment.is_empty() || segment.starts_with("--") {
            continue;
        }
        let Some(sep) = segment.find("\r\n\r\n") else { continue };
        let (seg_headers_str, seg_body) = segment.split_at(sep);
        let seg_body = &seg_body[4..];

        let mut seg_headers = Headers::new();
        for line in seg_headers_str.split("\r\n") {
            if let Some((name, value)) = line.split_once(':') {
                seg_headers.append(name.trim(), value.trim());
            }
        }

        let content_type = seg_headers.get("content-type");
        let Some(content_type) = content_type else {
            warn!("multipart segment missing Content-Type, skipping");
            continue;
        };
        let body_type = BodyType::from_content_type(content_type);
        let trimmed = seg_body.trim_end_matches("\r\n").as_bytes().to_vec();
        parts.push((
            body_type,
            ContentPart { headers: seg_headers, bytes: trimmed },
        ));
    }

    Body { parts }
}
