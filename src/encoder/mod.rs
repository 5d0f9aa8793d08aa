//! Structured fields to canonical QR payload text.
//!
//! Every grammar here is the text carried by the rendered symbol and must stay
//! byte-compatible with third-party readers. Missing fields encode as empty
//! strings so a live preview can render a half-filled form.

pub mod calendar;

use crate::models::{FieldSet, PayloadType};
use crate::utils::percent::encode_component;
use serde::{Deserialize, Serialize};

/// How free-text values containing grammar delimiters are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapePolicy {
    /// Values are written verbatim. A `;` inside an SSID corrupts the payload,
    /// exactly as the generators this format originates from do.
    #[default]
    Compatible,
    /// Backslash-escape delimiters (`\ ; , :`) and line breaks inside
    /// Wi-Fi, vCard and event values.
    Escaped,
}

/// Pure payload encoder
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadEncoder {
    escape: EscapePolicy,
}

impl PayloadEncoder {
    /// Encoder with [`EscapePolicy::Compatible`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder with an explicit escape policy
    pub fn with_escape_policy(escape: EscapePolicy) -> Self {
        Self { escape }
    }

    /// Active escape policy
    pub fn escape_policy(&self) -> EscapePolicy {
        self.escape
    }

    /// Encode `fields` as a `payload_type` payload. Never fails.
    pub fn encode(&self, payload_type: PayloadType, fields: &FieldSet) -> String {
        let payload = match payload_type {
            PayloadType::Url => sanitize(fields.get("url")),
            PayloadType::Text => sanitize(fields.get("text")),
            PayloadType::Wifi => self.encode_wifi(fields),
            PayloadType::VCard => self.encode_vcard(fields),
            PayloadType::Email => format!(
                "mailto:{}?subject={}&body={}",
                sanitize(fields.get("to")),
                encode_component(&sanitize(fields.get("subject"))),
                encode_component(&sanitize(fields.get("body"))),
            ),
            PayloadType::Sms => format!(
                "SMSTO:{}:{}",
                sanitize(fields.get("phone")),
                encode_component(&sanitize(fields.get("message"))),
            ),
            PayloadType::Phone => format!("tel:{}", sanitize(fields.get("phone"))),
            PayloadType::Geo => format!(
                "geo:{},{}",
                coordinate(fields.get("latitude")),
                coordinate(fields.get("longitude")),
            ),
            PayloadType::Event => self.encode_event(fields),
            PayloadType::Bitcoin => format!(
                "bitcoin:{}?amount={}",
                sanitize(fields.get("address")),
                sanitize(fields.get("amount").trim()),
            ),
            PayloadType::Upi => format!(
                "upi://pay?pa={}&pn={}&am={}&cu=INR",
                sanitize(fields.get("vpa")),
                encode_component(&sanitize(fields.get("name"))),
                sanitize(fields.get("amount").trim()),
            ),
        };
        tracing::trace!(%payload_type, len = payload.len(), "encoded payload");
        payload
    }

    fn encode_wifi(&self, fields: &FieldSet) -> String {
        let special = &['\\', ';', ',', ':', '"'];
        format!(
            "WIFI:T:{};S:{};P:{};;",
            sanitize(fields.get("encryption")),
            self.text(fields.get("ssid"), special),
            self.text(fields.get("password"), special),
        )
    }

    fn encode_vcard(&self, fields: &FieldSet) -> String {
        let special = &['\\', ';', ','];
        let first = self.text(fields.get("firstName"), special);
        let last = self.text(fields.get("lastName"), special);
        [
            "BEGIN:VCARD".to_string(),
            "VERSION:3.0".to_string(),
            format!("N:{last};{first}"),
            format!("FN:{first} {last}"),
            format!("ORG:{}", self.text(fields.get("organization"), special)),
            format!("TITLE:{}", self.text(fields.get("title"), special)),
            format!("TEL;TYPE=WORK,VOICE:{}", sanitize(fields.get("phone"))),
            format!("EMAIL:{}", sanitize(fields.get("email"))),
            format!("URL:{}", sanitize(fields.get("website"))),
            "END:VCARD".to_string(),
        ]
        .join("\n")
    }

    fn encode_event(&self, fields: &FieldSet) -> String {
        let special = &['\\', ';', ','];
        let instant = |key: &str| {
            let value = fields.get(key);
            match calendar::parse_instant(value) {
                Some(dt) => calendar::to_basic_utc(&dt),
                None => {
                    if !value.trim().is_empty() {
                        tracing::debug!(field = key, value, "event instant not understood; left blank");
                    }
                    String::new()
                }
            }
        };
        [
            "BEGIN:VEVENT".to_string(),
            format!("SUMMARY:{}", self.text(fields.get("summary"), special)),
            format!("LOCATION:{}", self.text(fields.get("location"), special)),
            format!("DTSTART:{}", instant("start")),
            format!("DTEND:{}", instant("end")),
            "END:VEVENT".to_string(),
        ]
        .join("\n")
    }

    fn text(&self, value: &str, special: &[char]) -> String {
        let value = sanitize(value);
        match self.escape {
            EscapePolicy::Compatible => value,
            EscapePolicy::Escaped => escape(&value, special),
        }
    }
}

/// Drop control characters a QR byte segment should not carry; TAB, LF and CR stay.
fn sanitize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

fn escape(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Decimal degrees exactly as typed; `0` when absent or not a number
fn coordinate(value: &str) -> String {
    let value = sanitize(value);
    let value = value.trim();
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => value.to_string(),
        _ => "0".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(t: PayloadType, pairs: &[(&str, &str)]) -> String {
        PayloadEncoder::new().encode(t, &pairs.iter().copied().collect())
    }

    #[test]
    fn test_wifi() {
        let payload = encode(
            PayloadType::Wifi,
            &[("ssid", "HomeNet"), ("password", "secret123"), ("encryption", "WPA")],
        );
        assert_eq!(payload, "WIFI:T:WPA;S:HomeNet;P:secret123;;");
    }

    #[test]
    fn test_geo() {
        let payload = encode(PayloadType::Geo, &[("latitude", "12.97"), ("longitude", "77.59")]);
        assert_eq!(payload, "geo:12.97,77.59");
        assert_eq!(encode(PayloadType::Geo, &[]), "geo:0,0");
        assert_eq!(encode(PayloadType::Geo, &[("latitude", "north")]), "geo:0,0");
    }

    #[test]
    fn test_geo_keeps_typed_digits() {
        let payload = encode(PayloadType::Geo, &[("latitude", " 90.0"), ("longitude", "77.50 ")]);
        assert_eq!(payload, "geo:90.0,77.50");
        let payload = encode(PayloadType::Geo, &[("latitude", "+12.97"), ("longitude", "-0.000")]);
        assert_eq!(payload, "geo:+12.97,-0.000");
        assert_eq!(encode(PayloadType::Geo, &[("latitude", "NaN"), ("longitude", "inf")]), "geo:0,0");
    }

    #[test]
    fn test_vcard_layout() {
        let payload = encode(
            PayloadType::VCard,
            &[
                ("firstName", "Ada"),
                ("lastName", "Lovelace"),
                ("phone", "+441234"),
                ("email", "ada@example.com"),
                ("organization", "Analytical Engines"),
                ("title", "Programmer"),
                ("website", "https://ada.example"),
            ],
        );
        let lines: Vec<&str> = payload.lines().collect();
        assert_eq!(
            lines,
            vec![
                "BEGIN:VCARD",
                "VERSION:3.0",
                "N:Lovelace;Ada",
                "FN:Ada Lovelace",
                "ORG:Analytical Engines",
                "TITLE:Programmer",
                "TEL;TYPE=WORK,VOICE:+441234",
                "EMAIL:ada@example.com",
                "URL:https://ada.example",
                "END:VCARD",
            ]
        );
    }

    #[test]
    fn test_email_and_sms_are_url_encoded() {
        assert_eq!(
            encode(
                PayloadType::Email,
                &[("to", "a@b.c"), ("subject", "Hi there"), ("body", "x&y=z")]
            ),
            "mailto:a@b.c?subject=Hi%20there&body=x%26y%3Dz"
        );
        assert_eq!(
            encode(PayloadType::Sms, &[("phone", "+15550100"), ("message", "On my way!")]),
            "SMSTO:+15550100:On%20my%20way!"
        );
    }

    #[test]
    fn test_simple_intents() {
        assert_eq!(encode(PayloadType::Phone, &[("phone", "+911234567890")]), "tel:+911234567890");
        assert_eq!(encode(PayloadType::Url, &[("url", "https://example.com")]), "https://example.com");
        assert_eq!(
            encode(PayloadType::Bitcoin, &[("address", "bc1qxyz"), ("amount", "0.005")]),
            "bitcoin:bc1qxyz?amount=0.005"
        );
        assert_eq!(
            encode(PayloadType::Upi, &[("vpa", "shop@upi"), ("name", "Tea Stall"), ("amount", "20")]),
            "upi://pay?pa=shop@upi&pn=Tea%20Stall&am=20&cu=INR"
        );
    }

    #[test]
    fn test_event_instants() {
        let payload = encode(
            PayloadType::Event,
            &[
                ("summary", "Launch"),
                ("location", "Hall 1"),
                ("start", "2025-01-01T12:00:00Z"),
            ],
        );
        assert_eq!(
            payload,
            "BEGIN:VEVENT\nSUMMARY:Launch\nLOCATION:Hall 1\nDTSTART:20250101T120000Z\nDTEND:\nEND:VEVENT"
        );
    }

    #[test]
    fn test_all_day_event_starts_at_midnight() {
        let payload = encode(
            PayloadType::Event,
            &[("summary", "Holiday"), ("start", "2025-01-01"), ("end", "soon")],
        );
        assert_eq!(
            payload,
            "BEGIN:VEVENT\nSUMMARY:Holiday\nLOCATION:\nDTSTART:20250101T000000Z\nDTEND:\nEND:VEVENT"
        );
    }

    #[test]
    fn test_control_bytes_stripped() {
        let payload = encode(PayloadType::Text, &[("text", "a\u{0}b\u{7}c\nd")]);
        assert_eq!(payload, "abc\nd");
    }

    #[test]
    fn test_escaped_policy() {
        let fields: FieldSet = [("ssid", "Cafe;Guest"), ("password", "p:w"), ("encryption", "WPA")]
            .into_iter()
            .collect();
        let compatible = PayloadEncoder::new().encode(PayloadType::Wifi, &fields);
        assert_eq!(compatible, "WIFI:T:WPA;S:Cafe;Guest;P:p:w;;");

        let escaped = PayloadEncoder::with_escape_policy(EscapePolicy::Escaped)
            .encode(PayloadType::Wifi, &fields);
        assert_eq!(escaped, r"WIFI:T:WPA;S:Cafe\;Guest;P:p\:w;;");
    }

    #[test]
    fn test_deterministic() {
        let fields: FieldSet = [("summary", "x"), ("start", "2025-06-01T09:30")].into_iter().collect();
        let encoder = PayloadEncoder::new();
        assert_eq!(
            encoder.encode(PayloadType::Event, &fields),
            encoder.encode(PayloadType::Event, &fields)
        );
    }
}
