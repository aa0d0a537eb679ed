//! Shared deterministic types for the listing wizard.
//!
//! These types define stable contracts between core components and the
//! persistence collaborator. Field names serialize in camelCase to match the
//! payload accepted by the listing store.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::WizardError;

/// Every field the listing wizard collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    Category,
    Location,
    GuestCount,
    RoomCount,
    BathroomCount,
    ImageSrc,
    Price,
    Title,
    Description,
}

impl FieldName {
    pub const ALL: [FieldName; 9] = [
        FieldName::Category,
        FieldName::Location,
        FieldName::GuestCount,
        FieldName::RoomCount,
        FieldName::BathroomCount,
        FieldName::ImageSrc,
        FieldName::Price,
        FieldName::Title,
        FieldName::Description,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Location => "location",
            Self::GuestCount => "guestCount",
            Self::RoomCount => "roomCount",
            Self::BathroomCount => "bathroomCount",
            Self::ImageSrc => "imageSrc",
            Self::Price => "price",
            Self::Title => "title",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| WizardError::UnknownField(s.to_string()))
    }
}

/// Shape of the value a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Location,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Number => f.write_str("number"),
            Self::Location => f.write_str("location"),
        }
    }
}

/// Presentation hint attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatHint {
    Plain,
    Count,
    Currency,
    Image,
    Country,
}

/// A country picked in the location step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySelection {
    /// ISO 3166-1 alpha-2 code.
    pub value: String,
    pub label: String,
    pub flag: String,
    /// `[latitude, longitude]` used to centre the map.
    pub latlng: (f64, f64),
    pub region: String,
}

/// Current value of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(u64),
    Location(Option<CountrySelection>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Number(_) => FieldKind::Number,
            Self::Location(_) => FieldKind::Location,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }
}

/// Static description of a field, fixed at wizard construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: FieldName,
    pub default_value: FieldValue,
    pub required: bool,
    pub format_hint: FormatHint,
}

impl FieldDescriptor {
    pub fn kind(&self) -> FieldKind {
        self.default_value.kind()
    }
}

/// Full field snapshot handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub category: String,
    pub location: Option<CountrySelection>,
    pub guest_count: u64,
    pub room_count: u64,
    pub bathroom_count: u64,
    pub image_src: String,
    pub price: u64,
    pub title: String,
    pub description: String,
}

/// A persisted listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub user_id: String,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    #[serde(flatten)]
    pub draft: ListingDraft,
}

/// A platform user and their favorite set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub favorite_ids: Vec<String>,
}

/// Kind of user-visible toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Failure,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failure => f.write_str("failure"),
        }
    }
}

/// Outcome of the single persistence call made at the terminal step.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionResult {
    Success(Listing),
    Failure(String),
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_names_parse_from_payload_keys() {
        for name in FieldName::ALL {
            assert_eq!(name.as_str().parse::<FieldName>(), Ok(name));
        }
        assert_eq!(
            "guests".parse::<FieldName>(),
            Err(WizardError::UnknownField("guests".to_string()))
        );
    }

    #[test]
    fn field_values_deserialize_by_shape() {
        let text: FieldValue = serde_json::from_str("\"Cabin\"").expect("text");
        let number: FieldValue = serde_json::from_str("100").expect("number");
        let absent: FieldValue = serde_json::from_str("null").expect("null");
        let location: FieldValue = serde_json::from_str(
            r#"{"value":"NL","label":"Netherlands","flag":"NL","latlng":[52.5,5.75],"region":"Europe"}"#,
        )
        .expect("location");

        assert_eq!(text, FieldValue::text("Cabin"));
        assert_eq!(number, FieldValue::Number(100));
        assert_eq!(absent, FieldValue::Location(None));
        assert!(matches!(location, FieldValue::Location(Some(ref c)) if c.value == "NL"));
    }

    #[test]
    fn listing_flattens_draft_fields() {
        let listing = Listing {
            id: "abc".to_string(),
            user_id: "u1".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            draft: ListingDraft {
                category: "Beach".to_string(),
                location: None,
                guest_count: 2,
                room_count: 1,
                bathroom_count: 1,
                image_src: String::new(),
                price: 90,
                title: "Hut".to_string(),
                description: "Small".to_string(),
            },
        };
        let value = serde_json::to_value(&listing).expect("serialize");
        assert_eq!(value["guestCount"], 2);
        assert_eq!(value["userId"], "u1");
    }
}
