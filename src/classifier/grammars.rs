//! One matcher per payload grammar.
//!
//! `Ok(None)` means the input does not carry this grammar's marker;
//! `Err` means it does but the body is malformed. The classifier treats both
//! as "no match" and moves on.

use super::GrammarError;
use super::lexer::{
    property, query_pairs, query_value, split_unescaped, strip_prefix_ci, unescape,
    unfolded_lines,
};
use crate::encoder::calendar;
use crate::models::{DecodedResult, Encryption, PayloadType};
use crate::utils::percent::decode_component;

pub(super) type MatchResult = Result<Option<DecodedResult>, GrammarError>;

pub(super) fn wifi(raw: &str) -> MatchResult {
    let Some(body) = strip_prefix_ci(raw.trim(), "WIFI:") else {
        return Ok(None);
    };

    let mut ssid = None;
    let mut password = String::new();
    let mut encryption = String::new();
    for token in split_unescaped(body, ';') {
        let Some((key, value)) = token.split_once(':') else {
            continue;
        };
        match key.trim().to_ascii_uppercase().as_str() {
            "S" => ssid = Some(unescape(value)),
            "P" => password = unescape(value),
            "T" => {
                encryption = Encryption::parse_lenient(value)
                    .map(|e| e.as_str().to_string())
                    .unwrap_or_else(|| value.to_string())
            }
            _ => {}
        }
    }

    let ssid = ssid.ok_or(GrammarError::MissingField("S"))?;
    Ok(Some(DecodedResult::new(
        PayloadType::Wifi,
        [("ssid", ssid), ("password", password), ("encryption", encryption)],
    )))
}

pub(super) fn vcard(raw: &str) -> MatchResult {
    let lines = unfolded_lines(raw.trim());
    if !lines
        .first()
        .is_some_and(|l| l.trim().eq_ignore_ascii_case("BEGIN:VCARD"))
    {
        return Ok(None);
    }

    let mut first = None;
    let mut last = None;
    let mut formatted = None;
    let mut phone = None;
    let mut email = None;
    let mut organization = None;
    let mut title = None;
    let mut website = None;

    for line in &lines[1..] {
        let Some((name, value)) = property(line) else {
            continue;
        };
        match name.as_str() {
            "N" => {
                let parts = split_unescaped(value, ';');
                last = parts.first().map(|p| unescape(p));
                first = parts.get(1).map(|p| unescape(p));
            }
            "FN" => formatted = Some(unescape(value)),
            "TEL" => {
                phone.get_or_insert_with(|| unescape(value));
            }
            "EMAIL" => {
                email.get_or_insert_with(|| unescape(value));
            }
            "ORG" => {
                organization = split_unescaped(value, ';').first().map(|p| unescape(p));
            }
            "TITLE" => title = Some(unescape(value)),
            "URL" => {
                website.get_or_insert_with(|| unescape(value));
            }
            "END" => break,
            _ => {}
        }
    }

    // Cards without a structured name still carry FN
    if first.is_none() && last.is_none() {
        if let Some(full) = formatted {
            let (f, l) = full.split_once(' ').unwrap_or((full.as_str(), ""));
            first = Some(f.to_string());
            last = Some(l.to_string());
        }
    }

    Ok(Some(DecodedResult::new(
        PayloadType::VCard,
        [
            ("firstName", first.unwrap_or_default()),
            ("lastName", last.unwrap_or_default()),
            ("phone", phone.unwrap_or_default()),
            ("email", email.unwrap_or_default()),
            ("organization", organization.unwrap_or_default()),
            ("title", title.unwrap_or_default()),
            ("website", website.unwrap_or_default()),
        ],
    )))
}

pub(super) fn event(raw: &str) -> MatchResult {
    let lines = unfolded_lines(raw.trim());
    let Some(begin) = lines
        .iter()
        .position(|l| l.trim().eq_ignore_ascii_case("BEGIN:VEVENT"))
    else {
        return Ok(None);
    };

    let mut summary = String::new();
    let mut location = String::new();
    let mut start = String::new();
    let mut end = String::new();
    for line in &lines[begin + 1..] {
        let Some((name, value)) = property(line) else {
            continue;
        };
        match name.as_str() {
            "SUMMARY" => summary = unescape(value),
            "LOCATION" => location = unescape(value),
            "DTSTART" => start = instant(value),
            "DTEND" => end = instant(value),
            "END" => break,
            _ => {}
        }
    }

    Ok(Some(DecodedResult::new(
        PayloadType::Event,
        [
            ("summary", summary),
            ("location", location),
            ("start", start),
            ("end", end),
        ],
    )))
}

fn instant(value: &str) -> String {
    let value = value.trim();
    calendar::parse_ical(value)
        .map(|dt| calendar::to_display(&dt))
        .unwrap_or_else(|| value.to_string())
}

pub(super) fn email(raw: &str) -> MatchResult {
    let raw = raw.trim();
    if let Some(rest) = strip_prefix_ci(raw, "mailto:") {
        let (to, query) = rest.split_once('?').unwrap_or((rest, ""));
        let pairs = query_pairs(query)?;
        return Ok(Some(DecodedResult::new(
            PayloadType::Email,
            [
                ("to", decode_component(to)?),
                ("subject", query_value(&pairs, "subject")),
                ("body", query_value(&pairs, "body")),
            ],
        )));
    }

    if let Some(rest) = strip_prefix_ci(raw, "MATMSG:") {
        let mut to = String::new();
        let mut subject = String::new();
        let mut body = String::new();
        for token in split_unescaped(rest, ';') {
            let Some((key, value)) = token.split_once(':') else {
                continue;
            };
            match key.trim().to_ascii_uppercase().as_str() {
                "TO" => to = unescape(value),
                "SUB" => subject = unescape(value),
                "BODY" => body = unescape(value),
                _ => {}
            }
        }
        return Ok(Some(DecodedResult::new(
            PayloadType::Email,
            [("to", to), ("subject", subject), ("body", body)],
        )));
    }

    Ok(None)
}

pub(super) fn sms(raw: &str) -> MatchResult {
    let raw = raw.trim();
    if let Some(rest) = strip_prefix_ci(raw, "SMSTO:") {
        let (phone, message) = rest.split_once(':').unwrap_or((rest, ""));
        return Ok(Some(DecodedResult::new(
            PayloadType::Sms,
            [("phone", phone.to_string()), ("message", decode_component(message)?)],
        )));
    }

    if let Some(rest) = strip_prefix_ci(raw, "sms:") {
        let (phone, query) = rest.split_once('?').unwrap_or((rest, ""));
        let pairs = query_pairs(query)?;
        return Ok(Some(DecodedResult::new(
            PayloadType::Sms,
            [("phone", phone.to_string()), ("message", query_value(&pairs, "body"))],
        )));
    }

    Ok(None)
}

pub(super) fn phone(raw: &str) -> MatchResult {
    Ok(strip_prefix_ci(raw.trim(), "tel:")
        .map(|number| DecodedResult::new(PayloadType::Phone, [("phone", number.trim())])))
}

pub(super) fn geo(raw: &str) -> MatchResult {
    let Some(rest) = strip_prefix_ci(raw.trim(), "geo:") else {
        return Ok(None);
    };
    let coords = rest.split(['?', ';']).next().unwrap_or(rest);
    let mut parts = coords.split(',').map(str::trim);
    let latitude = parts.next().ok_or(GrammarError::MissingField("latitude"))?;
    let longitude = parts.next().ok_or(GrammarError::MissingField("longitude"))?;

    check_degrees(latitude, 90.0, "latitude")?;
    check_degrees(longitude, 180.0, "longitude")?;

    Ok(Some(DecodedResult::new(
        PayloadType::Geo,
        [("latitude", latitude), ("longitude", longitude)],
    )))
}

fn check_degrees(value: &str, limit: f64, field: &'static str) -> Result<(), GrammarError> {
    let degrees: f64 = value
        .parse()
        .map_err(|_| GrammarError::BadNumber(value.to_string()))?;
    if !degrees.is_finite() || degrees.abs() > limit {
        return Err(GrammarError::OutOfRange(field));
    }
    Ok(())
}

pub(super) fn bitcoin(raw: &str) -> MatchResult {
    let Some(rest) = strip_prefix_ci(raw.trim(), "bitcoin:") else {
        return Ok(None);
    };
    let (address, query) = rest.split_once('?').unwrap_or((rest, ""));
    let pairs = query_pairs(query)?;
    Ok(Some(DecodedResult::new(
        PayloadType::Bitcoin,
        [("address", address.to_string()), ("amount", query_value(&pairs, "amount"))],
    )))
}

pub(super) fn upi(raw: &str) -> MatchResult {
    let Some(query) = strip_prefix_ci(raw.trim(), "upi://pay?") else {
        return Ok(None);
    };
    let pairs = query_pairs(query)?;
    Ok(Some(DecodedResult::new(
        PayloadType::Upi,
        [
            ("vpa", query_value(&pairs, "pa")),
            ("name", query_value(&pairs, "pn")),
            ("amount", query_value(&pairs, "am")),
        ],
    )))
}

pub(super) fn url(raw: &str) -> MatchResult {
    let candidate = raw.trim();
    if candidate.is_empty() || candidate.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Ok(None);
    }

    let host = ["http://", "https://", "ftp://"]
        .iter()
        .find_map(|scheme| strip_prefix_ci(candidate, scheme))
        .or_else(|| strip_prefix_ci(candidate, "www.").map(|_| candidate));
    let Some(rest) = host else {
        return Ok(None);
    };

    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let hostname = authority.rsplit('@').next().unwrap_or(authority);
    let hostname = hostname.split(':').next().unwrap_or(hostname);
    if hostname.is_empty() || !(hostname.contains('.') || hostname.eq_ignore_ascii_case("localhost")) {
        return Err(GrammarError::MissingField("host"));
    }

    Ok(Some(DecodedResult::new(PayloadType::Url, [("url", candidate)])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wifi_any_order_and_nopass() {
        let result = wifi("WIFI:S:Cafe;T:nopass;P:;;").unwrap().unwrap();
        assert_eq!(result.detail("ssid"), Some("Cafe"));
        assert_eq!(result.detail("encryption"), Some("None"));
        assert_eq!(result.detail("password"), Some(""));
    }

    #[test]
    fn test_wifi_without_ssid_is_error() {
        assert!(wifi("WIFI:T:WPA;;").is_err());
        assert!(wifi("hello").unwrap().is_none());
    }

    #[test]
    fn test_vcard_fn_fallback() {
        let result = vcard("BEGIN:VCARD\r\nVERSION:2.1\r\nFN:Grace Hopper\r\nTEL;CELL:+1555\r\nEND:VCARD")
            .unwrap()
            .unwrap();
        assert_eq!(result.detail("firstName"), Some("Grace"));
        assert_eq!(result.detail("lastName"), Some("Hopper"));
        assert_eq!(result.detail("phone"), Some("+1555"));
        assert_eq!(result.detail("website"), Some(""));
    }

    #[test]
    fn test_event_inside_calendar() {
        let raw = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nSUMMARY:Standup\nDTSTART:20250101T120000Z\nEND:VEVENT\nEND:VCALENDAR";
        let result = event(raw).unwrap().unwrap();
        assert_eq!(result.detail("summary"), Some("Standup"));
        assert_eq!(result.detail("start"), Some("2025-01-01T12:00:00Z"));
        assert_eq!(result.detail("end"), Some(""));
    }

    #[test]
    fn test_matmsg_email() {
        let result = email("MATMSG:TO:a@b.c;SUB:Hi;BODY:See you;;").unwrap().unwrap();
        assert_eq!(result.detail("to"), Some("a@b.c"));
        assert_eq!(result.detail("subject"), Some("Hi"));
        assert_eq!(result.detail("body"), Some("See you"));
    }

    #[test]
    fn test_malformed_escape_is_error() {
        assert!(email("mailto:a@b.c?subject=%E0%A4").is_err());
        assert!(sms("SMSTO:123:50%").is_err());
    }

    #[test]
    fn test_sms_uri_form() {
        let result = sms("sms:+15550100?body=Hello%20there").unwrap().unwrap();
        assert_eq!(result.detail("phone"), Some("+15550100"));
        assert_eq!(result.detail("message"), Some("Hello there"));
    }

    #[test]
    fn test_geo_variants() {
        let result = geo("geo:12.97,77.59,920;u=35").unwrap().unwrap();
        assert_eq!(result.detail("latitude"), Some("12.97"));
        assert_eq!(result.detail("longitude"), Some("77.59"));
        assert!(geo("geo:91,0").is_err());
        assert!(geo("geo:abc,0").is_err());
        assert!(geo("geo:12").is_err());
    }

    #[test]
    fn test_url_shapes() {
        assert!(url("https://example.com/path?q=1").unwrap().is_some());
        assert!(url("www.example.com").unwrap().is_some());
        assert!(url("http://localhost:8080").unwrap().is_some());
        assert!(url("https://").is_err());
        assert!(url("example.com").unwrap().is_none());
        assert!(url("https://exa mple.com").unwrap().is_none());
    }
}
