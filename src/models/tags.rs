//! Tag taxonomy documents.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

/// A top-level tag type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagType {
    /// Type identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A skill tag that belongs to a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagSkill {
    /// Skill identifier.
    pub id: String,
    /// Owning [`TagType`] identifier.
    pub type_id: String,
    /// Display name.
    pub name: String,
}

/// The full taxonomy: types and their skills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagLabels {
    /// Tag types.
    #[serde(default, deserialize_with = "list_or_empty")]
    pub types: Vec<TagType>,
    /// Skills.
    #[serde(default, deserialize_with = "list_or_empty")]
    pub skills: Vec<TagSkill>,
}

impl TagLabels {
    /// Drops skills whose type does not exist.
    #[must_use]
    pub fn without_orphan_skills(mut self) -> Self {
        let type_ids: HashSet<&str> = self.types.iter().map(|t| t.id.as_str()).collect();
        let skills = self
            .skills
            .iter()
            .filter(|s| type_ids.contains(s.type_id.as_str()))
            .cloned()
            .collect();
        self.skills = skills;
        self
    }
}

/// Reads a list field, treating a non-list value as empty.
fn list_or_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Array(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orphan_skills_are_dropped() {
        let labels = TagLabels {
            types: vec![TagType {
                id: "t1".to_string(),
                name: "Sport".to_string(),
            }],
            skills: vec![
                TagSkill {
                    id: "s1".to_string(),
                    type_id: "t1".to_string(),
                    name: "Climbing".to_string(),
                },
                TagSkill {
                    id: "s2".to_string(),
                    type_id: "gone".to_string(),
                    name: "Orphan".to_string(),
                },
            ],
        };
        let cleaned = labels.without_orphan_skills();
        assert_eq!(cleaned.skills.len(), 1);
        assert_eq!(cleaned.skills[0].id, "s1");
    }

    #[test]
    fn test_non_list_fields_read_as_empty() {
        let labels: TagLabels =
            serde_json::from_str(r#"{"types": "oops", "skills": null}"#).unwrap_or_else(|_| TagLabels {
                types: vec![TagType {
                    id: "sentinel".to_string(),
                    name: String::new(),
                }],
                skills: Vec::new(),
            });
        assert!(labels.types.is_empty());
        assert!(labels.skills.is_empty());
    }
}
