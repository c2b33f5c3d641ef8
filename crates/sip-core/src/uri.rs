use std::fmt;

/// A minimal SIP/SIPS/tel URI: enough to route and compare, not a full
/// RFC 3261 ABNF implementation (no escaped-char table, no generic-param
/// grammar beyond `;name=value`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    pub scheme: String,
    pub user: Option<String>,
    pub host: String,
    pub port: Option<u16>,
    pub params: Vec<(String, String)>,
}

impl Uri {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            user: None,
            host: host.into(),
            port: None,
            params: Vec::new(),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Parse a bracketed-or-bare URI, e.g. `<sip:alice@example.com;tag=x>`
    /// or `sip:13001@ims.example:5060`.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let inner = input
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .unwrap_or(input);

        let (scheme, rest) = inner.split_once(':')?;
        let scheme = scheme.to_ascii_lowercase();
        if !matches!(scheme.as_str(), "sip" | "sips" | "tel") {
            return None;
        }

        // Split off ;params (after any @host part) from the user/host portion.
        let mut param_parts = rest.split(';');
        let userhost = param_parts.next().unwrap_or("");
        let params: Vec<(String, String)> = param_parts
            .filter_map(|p| {
                let (k, v) = p.split_once('=').unwrap_or((p, ""));
                Some((k.to_string(), v.to_string()))
            })
            .collect();

        let (user, hostport) = match userhost.split_once('@') {
            Some((u, h)) => (Some(u.to_string()), h),
            None => (None, userhost),
        };

        let (host, port) = match hostport.split_once(':') {
            Some((h, p)) => (h.to_string(), p.parse().ok()),
            None => (hostport.to_string(), None),
        };

        Some(Self {
            scheme,
            user,
            host,
            port,
            params,
        })
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        write!(f, "{}", self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        for (k, v) in &self.params {
            if v.is_empty() {
                write!(f, ";{k}")?;
            } else {
                write!(f, ";{k}={v}")?;
            }
        }
        Ok(())
    }
}
