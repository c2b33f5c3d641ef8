use std::collections::BTreeMap;

/// Well-known SIP header names, carrying their canonical (mixed-case,
/// RFC 3261) spelling for serialization even though storage keys on the
/// lower-cased form. An O(1) bi-map in spirit: `name()` goes enum ->
/// canonical string, `from_name()` goes lowercase string -> enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderName {
    Via,
    From,
    To,
    CallId,
    CSeq,
    Contact,
    MaxForwards,
    ContentLength,
    ContentType,
    RecordRoute,
    Route,
    Require,
    RSeq,
    RAck,
    WwwAuthenticate,
    ProxyAuthenticate,
    Authorization,
    ProxyAuthorization,
    Allow,
    Reason,
    Warning,
    Expires,
    PAssociatedUri,
    MimeVersion,
    /// Any header not in the well-known set, stored with its original
    /// spelling for canonical re-serialization.
    Other(&'static str),
}

impl HeaderName {
    pub const fn canonical(self) -> &'static str {
        match self {
            HeaderName::Via => "Via",
            HeaderName::From => "From",
            HeaderName::To => "To",
            HeaderName::CallId => "Call-ID",
            HeaderName::CSeq => "CSeq",
            HeaderName::Contact => "Contact",
            HeaderName::MaxForwards => "Max-Forwards",
            HeaderName::ContentLength => "Content-Length",
            HeaderName::ContentType => "Content-Type",
            HeaderName::RecordRoute => "Record-Route",
            HeaderName::Route => "Route",
            HeaderName::Require => "Require",
            HeaderName::RSeq => "RSeq",
            HeaderName::RAck => "RAck",
            HeaderName::WwwAuthenticate => "WWW-Authenticate",
            HeaderName::ProxyAuthenticate => "Proxy-Authenticate",
            HeaderName::Authorization => "Authorization",
            HeaderName::ProxyAuthorization => "Proxy-Authorization",
            HeaderName::Allow => "Allow",
            HeaderName::Reason => "Reason",
            HeaderName::Warning => "Warning",
            HeaderName::Expires => "Expires",
            HeaderName::PAssociatedUri => "P-Associated-URI",
            HeaderName::MimeVersion => "MIME-Version",
            HeaderName::Other(name) => name,
        }
    }

    pub fn lower(self) -> String {
        self.canonical().to_ascii_lowercase()
    }

    /// Known canonical order Via/From/To/Call-ID/CSeq/Contact come in on
    /// the wire, per spec.md §4.1's serialize contract.
    pub fn wire_order_rank(lower_name: &str) -> usize {
        const ORDER: &[&str] = &[
            "via",
            "from",
            "to",
            "call-id",
            "cseq",
            "contact",
            "max-forwards",
            "record-route",
            "route",
        ];
        ORDER.iter().position(|n| *n == lower_name).unwrap_or(ORDER.len())
    }
}

/// Ordered, case-insensitive, multi-valued SIP header collection. Storage
/// key is always lower-case; original per-header canonical spelling for
/// `Other` entries is preserved on the stored `(canonical, values)` pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    // Insertion order preserved via Vec of (lower_name, canonical_name, values).
    entries: Vec<(String, String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under `name`, creating the slot in insertion order
    /// if this is the first occurrence, else pushing onto the existing
    /// multi-valued list.
    pub fn append(&mut self, canonical_name: impl Into<String>, value: impl Into<String>) {
        let canonical_name = canonical_name.into();
        let lower = canonical_name.to_ascii_lowercase();
        if let Some(entry) = self.entries.iter_mut().find(|(l, _, _)| *l == lower) {
            entry.2.push(value.into());
        } else {
            self.entries.push((lower, canonical_name, vec![value.into()]));
        }
    }

    /// Replace all values of `name` with a single value.
    pub fn set(&mut self, canonical_name: impl Into<String>, value: impl Into<String>) {
        let canonical_name = canonical_name.into();
        let lower = canonical_name.to_ascii_lowercase();
        self.entries.retain(|(l, _, _)| *l != lower);
        self.entries.push((lower, canonical_name, vec![value.into()]));
    }

    /// First value for `name`, case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        let lower = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(l, _, _)| *l == lower)
            .and_then(|(_, _, v)| v.first())
            .map(String::as_str)
    }

    /// All values for `name`, in insertion order.
    pub fn get_all(&self, name: &str) -> &[String] {
        let lower = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(l, _, _)| *l == lower)
            .map(|(_, _, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        !self.get_all(name).is_empty()
    }

    pub fn remove(&mut self, name: &str) {
        let lower = name.to_ascii_lowercase();
        self.entries.retain(|(l, _, _)| *l != lower);
    }

    /// Iterate `(canonical_name, value)` pairs in insertion order, each
    /// multi-valued header flattened to one pair per value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(_, canon, values)| values.iter().map(move |v| (canon.as_str(), v.as_str())))
    }

    /// Group entries by a stable serialization order: the well-known
    /// wire order first, then everything else (including `P-*` last),
    /// preserving insertion order within each bucket.
    pub fn ordered_for_wire(&self) -> Vec<(&str, &str)> {
        let mut grouped: BTreeMap<usize, Vec<(&str, &str)>> = BTreeMap::new();
        for (lower, canon, values) in &self.entries {
            let is_p_header = lower.starts_with("p-");
            let rank = if is_p_header {
                usize::MAX
            } else {
                HeaderName::wire_order_rank(lower)
            };
            for v in values {
                grouped.entry(rank).or_default().push((canon.as_str(), v.as_str()));
            }
        }
        grouped.into_values().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_lookup() {
        let mut h = Headers::new();
        h.append("Call-ID", "abc123");
        assert_eq!(h.get("call-id"), Some("abc123"));
        assert_eq!(h.get("CALL-ID"), Some("abc123"));
    }

    #[test]
    fn multi_valued_preserves_order() {
        let mut h = Headers::new();
        h.append("Via", "first");
        h.append("Via", "second");
        assert_eq!(h.get_all("via"), &["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn wire_order_puts_p_headers_last() {
        let mut h = Headers::new();
        h.append("P-Associated-URI", "tel:1");
        h.append("Via", "z9hG4bK1");
        h.append("From", "sip:a@b");
        let ordered = h.ordered_for_wire();
        assert_eq!(ordered[0].0, "Via");
        assert_eq!(ordered.last().unwrap().0, "P-Associated-URI");
    }
}
