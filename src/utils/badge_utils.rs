use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ProfileServerError;

//The registry replaces any directory scanning: badges.json is the single
//authority for which badges exist and in which order they match and render.
pub const MANIFEST_FILE: &str = "badges.json";

#[derive(Debug, Deserialize, Clone)]
pub struct ManifestEntry {
    pub name: String,
    pub file: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Badge {
    pub name: String,
    pub url: String,
}

#[derive(Debug)]
pub struct BadgeRegistry {
    entries: Vec<ManifestEntry>,
}

impl BadgeRegistry {
    pub fn load(badge_dir: &Path) -> Result<BadgeRegistry, ProfileServerError> {
        let manifest_path = badge_dir.join(MANIFEST_FILE);

        if !manifest_path.exists() {
            warn!("No badge manifest at {:?}, starting with an empty registry", manifest_path);
            return Ok(BadgeRegistry { entries: Vec::new() });
        }

        let manifest = std::fs::read_to_string(&manifest_path);

        if let Err(error) = manifest {
            return Err(ProfileServerError::Internal(format!(
                "Failed to read badge manifest: {}",
                error
            )));
        }

        let entries: Result<Vec<ManifestEntry>, serde_json::Error> =
            serde_json::from_str(&manifest.unwrap());

        match entries {
            Err(error) => Err(ProfileServerError::Internal(format!(
                "Failed to parse badge manifest: {}",
                error
            ))),
            Ok(entries) => {
                for entry in &entries {
                    if !badge_dir.join(&entry.file).exists() {
                        warn!("Badge asset missing on disk: {}", entry.file);
                    }
                }

                info!("Loaded {} badge(s) from manifest", entries.len());
                Ok(BadgeRegistry { entries })
            }
        }
    }

    pub fn from_entries(entries: Vec<ManifestEntry>) -> BadgeRegistry {
        BadgeRegistry { entries }
    }

    //First case-insensitive match in manifest order.
    pub fn resolve(&self, name: &str) -> Option<Badge> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| Badge {
                name: entry.name.clone(),
                url: format!("badges/{}", entry.file),
            })
    }

    //Unmatched names are silently dropped from the rendered set.
    pub fn resolve_set(&self, names: &[String]) -> Vec<Badge> {
        names.iter().filter_map(|name| self.resolve(name)).collect()
    }

    pub fn assignable(&self) -> Vec<Badge> {
        self.entries
            .iter()
            .map(|entry| Badge {
                name: entry.name.clone(),
                url: format!("badges/{}", entry.file),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BadgeRegistry {
        BadgeRegistry::from_entries(vec![
            ManifestEntry {
                name: "Early".to_string(),
                file: "early.png".to_string(),
            },
            ManifestEntry {
                name: "VIP".to_string(),
                file: "vip.png".to_string(),
            },
            ManifestEntry {
                name: "Staff".to_string(),
                file: "staff.webp".to_string(),
            },
        ])
    }

    #[test]
    fn resolution_is_case_insensitive() {
        let registry = registry();

        assert_eq!(registry.resolve("vip").unwrap().name, "VIP");
        assert_eq!(registry.resolve("EARLY").unwrap().url, "badges/early.png");
    }

    #[test]
    fn unknown_names_resolve_to_none() {
        assert!(registry().resolve("ghost").is_none());
    }

    #[test]
    fn resolve_set_drops_unmatched_and_keeps_manifest_assets() {
        let resolved = registry().resolve_set(&[
            "staff".to_string(),
            "ghost".to_string(),
            "early".to_string(),
        ]);

        let names: Vec<String> = resolved.iter().map(|badge| badge.name.clone()).collect();
        assert_eq!(names, vec!["Staff", "Early"]);
    }

    #[test]
    fn assignable_preserves_manifest_order() {
        let names: Vec<String> = registry()
            .assignable()
            .iter()
            .map(|badge| badge.name.clone())
            .collect();

        assert_eq!(names, vec!["Early", "VIP", "Staff"]);
    }
}
