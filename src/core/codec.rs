//! Wi-Fi QR payload codec
//!
//! Grammar written and read here:
//!
//! ```text
//! WIFI:T:<auth>;S:<ssid>;[P:<password>;][H:true];
//! ```
//!
//! `\`, `;`, `,`, `"` and `:` inside the SSID and password are escaped with a
//! backslash. `H:` is only written for hidden networks; the payload always
//! ends with the terminating `;`.

use crate::core::{
    error::{ParseError, ParseResult},
    types::{AuthType, WifiCredentials},
};

/// Prefix every Wi-Fi payload starts with
pub const WIFI_PREFIX: &str = "WIFI:";

const ESCAPED_CHARS: [char; 5] = ['\\', ';', ',', '"', ':'];

/// Text embedded in a Wi-Fi QR code
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Payload(String);

impl Payload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for Payload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encoder and parser for the `WIFI:` payload convention
pub struct PayloadCodec;

impl PayloadCodec {
    /// Build the payload for the given credentials
    ///
    /// The SSID is not validated here; callers check
    /// [`WifiCredentials::validate`] first.
    pub fn encode(credentials: &WifiCredentials) -> Payload {
        let mut out = String::with_capacity(
            WIFI_PREFIX.len() + credentials.ssid.len() + credentials.password.len() + 24,
        );
        out.push_str(WIFI_PREFIX);

        out.push_str("T:");
        escape_into(credentials.auth_type.as_str(), &mut out);
        out.push(';');

        out.push_str("S:");
        escape_into(&credentials.ssid, &mut out);
        out.push(';');

        if !credentials.auth_type.is_open() {
            out.push_str("P:");
            escape_into(&credentials.password, &mut out);
            out.push(';');
        }

        if credentials.hidden {
            out.push_str("H:true");
        }
        out.push(';');

        Payload(out)
    }

    /// Parse payload text back into credentials
    ///
    /// Anything after the `WIFI:` prefix is accepted: unknown fields are
    /// skipped and missing ones take their defaults.
    pub fn decode(text: &str) -> ParseResult<WifiCredentials> {
        let body = text
            .strip_prefix(WIFI_PREFIX)
            .ok_or(ParseError::NotWifiFormat)?;

        let mut credentials = WifiCredentials::default();

        for field in split_fields(body) {
            if let Some(value) = field.strip_prefix("T:") {
                credentials.auth_type = AuthType::new(unescape(value));
            } else if let Some(value) = field.strip_prefix("S:") {
                credentials.ssid = unescape(value);
            } else if let Some(value) = field.strip_prefix("P:") {
                credentials.password = unescape(value);
            } else if let Some(value) = field.strip_prefix("H:") {
                credentials.hidden = unescape(value).eq_ignore_ascii_case("true");
            }
        }

        Ok(credentials)
    }
}

fn escape_into(value: &str, out: &mut String) {
    for c in value.chars() {
        if ESCAPED_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Split on `;` that is not preceded by an escaping backslash
///
/// Fields keep their escapes; empty fields are dropped.
fn split_fields(body: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut chars = body.char_indices();

    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            ';' => {
                if idx > start {
                    fields.push(&body[start..idx]);
                }
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < body.len() {
        fields.push(&body[start..]);
    }

    fields
}

/// Any `\x` becomes `x`; a lone trailing backslash stays literal
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }

    out
}
