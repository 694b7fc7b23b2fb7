use serde::{Deserialize, Serialize};

/// Single rule mapping a raw column value (cost center) to a payable flag and a region label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Parameter {
    /// Match key, compared trimmed and case-insensitively
    pub value: String,
    /// Region name; empty means the value itself is the region
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub payable: bool,
}

impl Parameter {
    pub fn new(value: impl Into<String>, label: impl Into<String>, payable: bool) -> Self {
        Parameter {
            value: value.into(),
            label: label.into(),
            payable,
        }
    }
}

/// Named, reusable set of classification parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub created_at: String,
}

impl Profile {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Profile {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            parameters,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Find a profile by id, falling back to a case-insensitive name match
pub fn find_profile<'a>(profiles: &'a [Profile], id_or_name: &str) -> Option<&'a Profile> {
    profiles
        .iter()
        .find(|p| p.id == id_or_name)
        .or_else(|| profiles.iter().find(|p| p.name.eq_ignore_ascii_case(id_or_name)))
}

/// Profiles used when nothing has been saved yet
pub fn default_profiles() -> Vec<Profile> {
    let parameters = [
        ("01", "FR", true),
        ("01|100", "FR", true),
        ("05", "Eurotherm", true),
        ("06", "UK", true),
        ("07", "DK", true),
        ("08", "AU", true),
        ("30", "NAM", true),
        ("31", "SOLAR", true),
        ("32", "NAM", true),
        ("33", "NAM", true),
        ("34", "NAM", true),
        ("50", "CN", true),
        ("51", "CN", true),
        ("52", "CN", true),
        ("53", "CN", true),
        ("54", "CN", true),
        ("70", "JP", true),
        ("130", "AU", true),
        ("131", "", false),
        ("132", "", false),
        ("150", "CN", false),
        ("DEFAULT", "", false),
        ("DEFAULT|100", "", false),
    ]
    .into_iter()
    .map(|(value, label, payable)| Parameter::new(value, label, payable))
    .collect();

    vec![Profile {
        id: format!("selectric_{}", chrono::Utc::now().timestamp_millis()),
        name: "SElectric".to_string(),
        description: "Schneider Electric cost center profile".to_string(),
        parameters,
        created_at: chrono::Utc::now().to_rfc3339(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles() {
        let profiles = default_profiles();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].name, "SElectric");
        assert!(profiles[0].id.starts_with("selectric_"));
        assert_eq!(profiles[0].parameters.len(), 23);
        assert!(profiles[0].parameters.iter().any(|p| p.value == "30" && p.label == "NAM"));
    }

    #[test]
    fn test_profile_json_shape() {
        let profile = Profile::new("Test", "", vec![Parameter::new("30", "NAM", true)]);
        let json = serde_json::to_value(&profile).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["parameters"][0]["payable"], true);

        let parsed: Profile = serde_json::from_str(
            r#"{"id":"p1","name":"Minimal","parameters":[{"value":"99"}],"createdAt":"2024-03-05T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.parameters[0].label, "");
        assert!(!parsed.parameters[0].payable);
    }

    #[test]
    fn test_find_profile() {
        let profiles = default_profiles();
        let id = profiles[0].id.clone();
        assert!(find_profile(&profiles, &id).is_some());
        assert!(find_profile(&profiles, "selectric").is_some());
        assert!(find_profile(&profiles, "missing").is_none());
    }
}
