//! Read-only rendering of a [`DecodedResult`].

use crate::models::{DecodedResult, PayloadType};
use std::fmt;

/// Marker shown for empty or missing values
pub const NOT_PROVIDED: &str = "Not provided";

/// Neutral copy for input no grammar recognized
pub const UNRECOGNIZED_MESSAGE: &str = "Could not decode this content into a known format.";

/// Display value of a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayValue {
    /// Non-blank value
    Provided(String),
    /// Empty or absent value
    NotProvided,
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayValue::Provided(value) => f.write_str(value),
            DisplayValue::NotProvided => f.write_str(NOT_PROVIDED),
        }
    }
}

/// One labelled row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedField {
    /// Field key in [`DecodedResult::details`]
    pub key: &'static str,
    /// Human label
    pub label: &'static str,
    /// Value or the not-provided marker
    pub value: DisplayValue,
}

/// Renderable view of a classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// A grammar matched
    Recognized {
        /// Matched type
        payload_type: PayloadType,
        /// Heading for the card
        title: &'static str,
        /// Every field of the type, in field order
        fields: Vec<PresentedField>,
    },
    /// Nothing matched
    Unrecognized {
        /// Neutral explanation
        message: &'static str,
    },
}

impl Presentation {
    /// `(label, display value)` rows; empty for unrecognized input
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        match self {
            Presentation::Recognized { fields, .. } => fields
                .iter()
                .map(|f| (f.label, f.value.to_string()))
                .collect(),
            Presentation::Unrecognized { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presentation::Recognized { title, fields, .. } => {
                writeln!(f, "{title}")?;
                for field in fields {
                    writeln!(f, "  {}: {}", field.label, field.value)?;
                }
                Ok(())
            }
            Presentation::Unrecognized { message } => writeln!(f, "{message}"),
        }
    }
}

/// Formats classifier output for display
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultPresenter;

impl ResultPresenter {
    /// Create a presenter
    pub fn new() -> Self {
        Self
    }

    /// Build the presentation for `result`
    pub fn present(&self, result: &DecodedResult) -> Presentation {
        let Some(payload_type) = result.payload_type else {
            return Presentation::Unrecognized {
                message: UNRECOGNIZED_MESSAGE,
            };
        };

        let fields = payload_type
            .field_keys()
            .iter()
            .map(|&key| {
                let value = match result.detail(key).map(str::trim) {
                    Some(v) if !v.is_empty() => DisplayValue::Provided(v.to_string()),
                    _ => DisplayValue::NotProvided,
                };
                PresentedField {
                    key,
                    label: field_label(key),
                    value,
                }
            })
            .collect();

        Presentation::Recognized {
            payload_type,
            title: type_title(payload_type),
            fields,
        }
    }
}

fn type_title(payload_type: PayloadType) -> &'static str {
    match payload_type {
        PayloadType::Url => "Website",
        PayloadType::Text => "Text",
        PayloadType::Wifi => "Wi-Fi Network",
        PayloadType::VCard => "Contact Card",
        PayloadType::Email => "Email",
        PayloadType::Sms => "SMS",
        PayloadType::Phone => "Phone Number",
        PayloadType::Geo => "Location",
        PayloadType::Event => "Calendar Event",
        PayloadType::Bitcoin => "Bitcoin Payment",
        PayloadType::Upi => "UPI Payment",
    }
}

fn field_label(key: &str) -> &'static str {
    match key {
        "url" => "URL",
        "text" => "Text",
        "ssid" => "Network Name",
        "password" => "Password",
        "encryption" => "Security",
        "firstName" => "First Name",
        "lastName" => "Last Name",
        "phone" => "Phone",
        "email" => "Email",
        "organization" => "Organization",
        "title" => "Job Title",
        "website" => "Website",
        "to" => "To",
        "subject" => "Subject",
        "body" => "Body",
        "message" => "Message",
        "latitude" => "Latitude",
        "longitude" => "Longitude",
        "summary" => "Title",
        "location" => "Location",
        "start" => "Starts",
        "end" => "Ends",
        "address" => "Address",
        "amount" => "Amount",
        "vpa" => "UPI ID",
        "name" => "Payee Name",
        _ => "Value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_field_listed_with_marker() {
        let result = DecodedResult::new(PayloadType::Wifi, [("ssid", "HomeNet"), ("password", "")]);
        let presentation = ResultPresenter::new().present(&result);
        assert_eq!(
            presentation.rows(),
            vec![
                ("Network Name", "HomeNet".to_string()),
                ("Password", NOT_PROVIDED.to_string()),
                ("Security", NOT_PROVIDED.to_string()),
            ]
        );
    }

    #[test]
    fn test_unrecognized() {
        let presentation = ResultPresenter::new().present(&DecodedResult::unrecognized());
        assert_eq!(
            presentation,
            Presentation::Unrecognized {
                message: UNRECOGNIZED_MESSAGE
            }
        );
        assert!(presentation.rows().is_empty());
    }

    #[test]
    fn test_labels_cover_every_key() {
        for t in PayloadType::ALL {
            for key in t.field_keys() {
                assert_ne!(field_label(key), "Value", "missing label for {key}");
            }
        }
    }

    #[test]
    fn test_display() {
        let result = DecodedResult::new(PayloadType::Phone, [("phone", "+1555")]);
        let text = ResultPresenter::new().present(&result).to_string();
        assert_eq!(text, "Phone Number\n  Phone: +1555\n");
    }
}
