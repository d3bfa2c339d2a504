use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Namespaced identifier for registry entries: `namespace:path`.
///
/// Namespaces and paths are limited to lowercase ASCII letters, digits and
/// `_ - .`; paths may additionally contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    namespace: String,
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceIdError {
    #[error("resource id '{raw}' is missing the ':' separator")]
    MissingSeparator { raw: String },
    #[error("resource id '{raw}' has an empty {part}")]
    EmptyPart { raw: String, part: &'static str },
    #[error("resource id '{raw}' contains invalid character '{found}' in its {part}")]
    InvalidChar {
        raw: String,
        part: &'static str,
        found: char,
    },
}

impl ResourceId {
    pub fn new(namespace: &str, path: &str) -> Result<Self, ResourceIdError> {
        let raw = format!("{namespace}:{path}");
        validate_part(&raw, "namespace", namespace, is_namespace_char)?;
        validate_part(&raw, "path", path, is_path_char)?;
        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    pub fn parse(raw: &str) -> Result<Self, ResourceIdError> {
        let (namespace, path) =
            raw.split_once(':')
                .ok_or_else(|| ResourceIdError::MissingSeparator {
                    raw: raw.to_string(),
                })?;
        Self::new(namespace, path)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

fn validate_part(
    raw: &str,
    part: &'static str,
    value: &str,
    allowed: fn(char) -> bool,
) -> Result<(), ResourceIdError> {
    if value.is_empty() {
        return Err(ResourceIdError::EmptyPart {
            raw: raw.to_string(),
            part,
        });
    }
    if let Some(found) = value.chars().find(|ch| !allowed(*ch)) {
        return Err(ResourceIdError::InvalidChar {
            raw: raw.to_string(),
            part,
            found,
        });
    }
    Ok(())
}

fn is_namespace_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-' | '.')
}

fn is_path_char(ch: char) -> bool {
    is_namespace_char(ch) || ch == '/'
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceId {
    type Err = ResourceIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl Serialize for ResourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_namespace_and_path() {
        let id = ResourceId::parse("mowziesmobs:music.frostmaw_theme").expect("valid id");
        assert_eq!(id.namespace(), "mowziesmobs");
        assert_eq!(id.path(), "music.frostmaw_theme");
        assert_eq!(id.to_string(), "mowziesmobs:music.frostmaw_theme");
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert_eq!(
            ResourceId::parse("frostmaw"),
            Err(ResourceIdError::MissingSeparator {
                raw: "frostmaw".to_string()
            })
        );
    }

    #[test]
    fn parse_rejects_empty_parts_and_uppercase() {
        assert!(matches!(
            ResourceId::parse(":theme"),
            Err(ResourceIdError::EmptyPart {
                part: "namespace",
                ..
            })
        ));
        assert!(matches!(
            ResourceId::parse("mod:"),
            Err(ResourceIdError::EmptyPart { part: "path", .. })
        ));
        assert!(matches!(
            ResourceId::parse("Mod:theme"),
            Err(ResourceIdError::InvalidChar { found: 'M', .. })
        ));
    }

    #[test]
    fn path_allows_slashes_but_namespace_does_not() {
        assert!(ResourceId::parse("ambient:tracks/day").is_ok());
        assert!(ResourceId::parse("amb/ient:day").is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let id = ResourceId::parse("boss_music:theme.umvuthi").expect("valid id");
        let json = serde_json::to_string(&id).expect("encode");
        assert_eq!(json, "\"boss_music:theme.umvuthi\"");
        let decoded: ResourceId = serde_json::from_str(&json).expect("decode");
        assert_eq!(decoded, id);
        assert!(serde_json::from_str::<ResourceId>("\"nope\"").is_err());
    }
}
