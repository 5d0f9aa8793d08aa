//! Payload kinds and Wi-Fi encryption schemes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of structured data a QR payload carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    /// Web address, carried verbatim
    Url,
    /// Free text, carried verbatim
    Text,
    /// Wi-Fi network credentials
    Wifi,
    /// vCard 3.0 contact card
    VCard,
    /// `mailto:` intent
    Email,
    /// `SMSTO:` intent
    Sms,
    /// `tel:` intent
    Phone,
    /// `geo:` coordinate
    Geo,
    /// iCalendar `VEVENT`
    Event,
    /// BIP-21 bitcoin payment request
    Bitcoin,
    /// UPI payment request (INR)
    Upi,
}

impl PayloadType {
    /// Every payload type, in declaration order
    pub const ALL: [PayloadType; 11] = [
        PayloadType::Url,
        PayloadType::Text,
        PayloadType::Wifi,
        PayloadType::VCard,
        PayloadType::Email,
        PayloadType::Sms,
        PayloadType::Phone,
        PayloadType::Geo,
        PayloadType::Event,
        PayloadType::Bitcoin,
        PayloadType::Upi,
    ];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadType::Url => "url",
            PayloadType::Text => "text",
            PayloadType::Wifi => "wifi",
            PayloadType::VCard => "vcard",
            PayloadType::Email => "email",
            PayloadType::Sms => "sms",
            PayloadType::Phone => "phone",
            PayloadType::Geo => "geo",
            PayloadType::Event => "event",
            PayloadType::Bitcoin => "bitcoin",
            PayloadType::Upi => "upi",
        }
    }

    /// Field keys for this type, in display order
    pub fn field_keys(&self) -> &'static [&'static str] {
        match self {
            PayloadType::Url => &["url"],
            PayloadType::Text => &["text"],
            PayloadType::Wifi => &["ssid", "password", "encryption"],
            PayloadType::VCard => &[
                "firstName",
                "lastName",
                "phone",
                "email",
                "organization",
                "title",
                "website",
            ],
            PayloadType::Email => &["to", "subject", "body"],
            PayloadType::Sms => &["phone", "message"],
            PayloadType::Phone => &["phone"],
            PayloadType::Geo => &["latitude", "longitude"],
            PayloadType::Event => &["summary", "location", "start", "end"],
            PayloadType::Bitcoin => &["address", "amount"],
            PayloadType::Upi => &["vpa", "name", "amount"],
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a payload type name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payload type: {0}")]
pub struct UnknownPayloadType(pub String);

impl FromStr for PayloadType {
    type Err = UnknownPayloadType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        PayloadType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| UnknownPayloadType(s.to_string()))
    }
}

/// Wi-Fi authentication scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encryption {
    /// WPA/WPA2/WPA3 personal
    #[serde(rename = "WPA")]
    Wpa,
    /// Legacy WEP
    #[serde(rename = "WEP")]
    Wep,
    /// Open network
    None,
}

impl Encryption {
    /// Token written after `T:` in a Wi-Fi payload
    pub fn as_str(&self) -> &'static str {
        match self {
            Encryption::Wpa => "WPA",
            Encryption::Wep => "WEP",
            Encryption::None => "None",
        }
    }

    /// Lenient parse used when reading scanned payloads.
    /// `nopass` and an empty token both mean an open network.
    pub fn parse_lenient(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "WPA" | "WPA2" | "WPA3" | "SAE" => Some(Encryption::Wpa),
            "WEP" => Some(Encryption::Wep),
            "NONE" | "NOPASS" | "" => Some(Encryption::None),
            _ => None,
        }
    }
}
