//! Package model
//!
//! Internet access packages as exposed by the backend, plus the draft the
//! admin package form edits.

use serde::{Deserialize, Serialize};

/// Internet access package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: i64,
    pub name: String,
    /// Human readable duration, only present on the public list
    #[serde(default)]
    pub duration: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub minutes: i64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_active() -> bool {
    true
}

/// Local state of the package add/edit form
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageDraft {
    /// Set when editing an existing package
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub minutes: i64,
    pub active: bool,
}

impl Default for PackageDraft {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            description: String::new(),
            price: 0.0,
            minutes: 0,
            active: true,
        }
    }
}

impl From<&Package> for PackageDraft {
    fn from(package: &Package) -> Self {
        Self {
            id: Some(package.id),
            name: package.name.clone(),
            description: package.description.clone(),
            price: package.price,
            minutes: package.minutes,
            active: package.active,
        }
    }
}

/// Raw package form fields as posted by the browser
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub minutes: String,
    /// Checkboxes are only submitted when ticked
    #[serde(default)]
    pub active: Option<String>,
}

impl PackageForm {
    /// Build a draft, coercing numeric fields the way the form does on change
    pub fn into_draft(self, id: Option<i64>) -> PackageDraft {
        PackageDraft {
            id,
            name: self.name,
            description: self.description,
            price: coerce_number(&self.price),
            minutes: coerce_number(&self.minutes) as i64,
            active: self.active.is_some(),
        }
    }
}

/// Parse a numeric form field, falling back to zero
pub fn coerce_number(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Label a package length in minutes with the largest whole-ish unit
pub fn format_duration(minutes: i64) -> String {
    let m = minutes as f64;
    if minutes < 60 {
        format!("{} minutes", minutes)
    } else if minutes < 1440 {
        format!("{} hour(s)", m / 60.0)
    } else if minutes < 10080 {
        format!("{} day(s)", m / 1440.0)
    } else {
        format!("{} week(s)", m / 10080.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_package_deserializes() {
        let json = r#"{"id":1,"name":"1 Hour","duration":"1 hour","price":20,"description":"Browse","minutes":60}"#;
        let package: Package = serde_json::from_str(json).unwrap();

        assert_eq!(package.id, 1);
        assert_eq!(package.duration.as_deref(), Some("1 hour"));
        assert_eq!(package.price, 20.0);
        assert!(package.active);
        assert!(package.created_at.is_none());
    }

    #[test]
    fn test_form_coerces_numbers() {
        let form = PackageForm {
            name: "Daily".to_string(),
            description: "24 hours".to_string(),
            price: "50.5".to_string(),
            minutes: "abc".to_string(),
            active: None,
        };
        let draft = form.into_draft(Some(4));

        assert_eq!(draft.id, Some(4));
        assert_eq!(draft.price, 50.5);
        assert_eq!(draft.minutes, 0);
        assert!(!draft.active);
    }

    #[test]
    fn test_checkbox_present_means_active() {
        let form = PackageForm {
            active: Some("on".to_string()),
            ..Default::default()
        };
        assert!(form.into_draft(None).active);
    }

    #[test]
    fn test_new_draft_skips_id() {
        let json = serde_json::to_value(PackageDraft::default()).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["active"], true);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30 minutes");
        assert_eq!(format_duration(60), "1 hour(s)");
        assert_eq!(format_duration(90), "1.5 hour(s)");
        assert_eq!(format_duration(1440), "1 day(s)");
        assert_eq!(format_duration(10080), "1 week(s)");
    }
}
