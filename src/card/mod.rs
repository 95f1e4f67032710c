//! Teams MessageCard document
//!
//! Provides:
//! - Wire types for the legacy connector card schema
//! - Theme palette keyed by build status
//! - The card builder

mod builder;

pub use builder::{format_elapsed, parse_custom_fact, CardBuilder};

use serde::Serialize;

pub const CARD_TYPE: &str = "MessageCard";
pub const CARD_CONTEXT: &str = "http://schema.org/extensions";
pub const OPEN_URI_ACTION: &str = "OpenUri";
pub const DEFAULT_TARGET_OS: &str = "default";

/// Card accent color, chosen from the build status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeColor {
    Green,
    Red,
    Blue,
}

impl ThemeColor {
    pub fn for_status(status: &str) -> Self {
        match status {
            "failure" => ThemeColor::Red,
            "building" => ThemeColor::Blue,
            _ => ThemeColor::Green,
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            ThemeColor::Green => "96FF33",
            ThemeColor::Red => "FF5733",
            ThemeColor::Blue => "002BFF",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCard {
    #[serde(rename = "@type")]
    pub card_type: String,
    #[serde(rename = "@context")]
    pub context: String,
    pub theme_color: String,
    pub summary: String,
    pub sections: Vec<Section>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub potential_action: Vec<Action>,
}

impl MessageCard {
    /// Facts of the first section, in display order
    pub fn facts(&self) -> &[Fact] {
        self.sections
            .first()
            .map(|s| s.facts.as_slice())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl MessageCard {
    pub fn fact(&self, name: &str) -> Option<&Fact> {
        self.facts().iter().find(|f| f.name == name)
    }

    pub fn action(&self, name: &str) -> Option<&Action> {
        self.potential_action.iter().find(|a| a.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub activity_image: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub activity_title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub activity_subtitle: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub activity_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub facts: Vec<Fact>,
    pub markdown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fact {
    pub name: String,
    pub value: String,
}

impl Fact {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Action {
    #[serde(rename = "@type")]
    pub action_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<OpenUriTarget>>,
}

impl Action {
    /// Link-opening action with a single default target
    pub fn open_uri(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            action_type: OPEN_URI_ACTION.to_string(),
            name: name.into(),
            targets: Some(vec![OpenUriTarget {
                os: DEFAULT_TARGET_OS.to_string(),
                uri: uri.into(),
            }]),
        }
    }

    /// First target URI, if any
    #[cfg(test)]
    pub fn uri(&self) -> Option<&str> {
        self.targets
            .as_ref()
            .and_then(|t| t.first())
            .map(|t| t.uri.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenUriTarget {
    pub os: String,
    pub uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_theme_color_palette() {
        assert_eq!(ThemeColor::for_status("failure").hex(), "FF5733");
        assert_eq!(ThemeColor::for_status("building").hex(), "002BFF");
        assert_eq!(ThemeColor::for_status("success").hex(), "96FF33");
        assert_eq!(ThemeColor::for_status("killed").hex(), "96FF33");
        assert_eq!(ThemeColor::for_status("").hex(), "96FF33");
    }

    #[test]
    fn test_card_serialization_omits_empty_fields() {
        let card = MessageCard {
            card_type: CARD_TYPE.to_string(),
            context: CARD_CONTEXT.to_string(),
            theme_color: "96FF33".to_string(),
            summary: "acme/widgets".to_string(),
            sections: vec![Section {
                activity_image: String::new(),
                activity_title: "acme/widgets (main)".to_string(),
                activity_subtitle: "SUCCESS".to_string(),
                activity_text: String::new(),
                facts: vec![Fact::new("Build Number", "42")],
                markdown: false,
            }],
            potential_action: vec![Action::open_uri("Open repository", "https://git/acme/widgets")],
        };

        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(
            value,
            json!({
                "@type": "MessageCard",
                "@context": "http://schema.org/extensions",
                "themeColor": "96FF33",
                "summary": "acme/widgets",
                "sections": [{
                    "activityTitle": "acme/widgets (main)",
                    "activitySubtitle": "SUCCESS",
                    "facts": [{ "name": "Build Number", "value": "42" }],
                    "markdown": false
                }],
                "potentialAction": [{
                    "@type": "OpenUri",
                    "name": "Open repository",
                    "targets": [{ "os": "default", "uri": "https://git/acme/widgets" }]
                }]
            })
        );
    }

    #[test]
    fn test_action_without_targets_omits_field() {
        let action = Action {
            action_type: OPEN_URI_ACTION.to_string(),
            name: "Nowhere".to_string(),
            targets: None,
        };

        let value = serde_json::to_value(&action).unwrap();
        assert!(value.get("targets").is_none());
        assert_eq!(action.uri(), None);
    }
}
