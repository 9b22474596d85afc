// Dataset profiles: which fields and status values a table uses

use crate::record::{FieldValue, Fields};
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A recognized value of the status field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusStyle {
    /// Exact field value, e.g. "Taslak"
    pub value: String,
    /// Terminal colour name used when rendering the value
    pub color: String,
    /// Statistics bucket this value is counted in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
}

/// Describes the well-known fields of one table.
///
/// The dashboard otherwise treats fields opaquely; only the fields named here
/// drive statistics, colouring and new-record defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub name: String,
    pub title_field: String,
    pub status_field: String,
    /// Field used for the "this week" count, stamped on creation
    pub date_field: String,
    /// Counter field zeroed on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count_field: Option<String>,
    pub statuses: Vec<StatusStyle>,
    #[serde(default = "default_neutral_color")]
    pub neutral_color: String,
    /// Columns shown in table output, in order
    #[serde(default)]
    pub columns: Vec<String>,
    /// Initial contents of the creation form
    #[serde(default)]
    pub draft_defaults: Fields,
}

fn default_neutral_color() -> String {
    "white".to_string()
}

impl DatasetProfile {
    /// Turkish news table
    pub fn news() -> Self {
        let mut draft_defaults = Fields::new();
        for field in ["Başlık", "Özet", "Yazar", "Kategori", "URL"] {
            draft_defaults.insert(field.to_string(), FieldValue::text(""));
        }
        draft_defaults.insert("Durum".to_string(), FieldValue::text("Taslak"));
        draft_defaults.insert("Etiketler".to_string(), FieldValue::Tags(Vec::new()));

        Self {
            name: "news".to_string(),
            title_field: "Başlık".to_string(),
            status_field: "Durum".to_string(),
            date_field: "Tarih".to_string(),
            view_count_field: Some("Görüntülenme".to_string()),
            statuses: vec![
                status("Yayınlandı", "green", Some("published")),
                status("Taslak", "yellow", Some("draft")),
                status("İnceleme", "blue", None),
            ],
            neutral_color: default_neutral_color(),
            columns: ["Başlık", "Yazar", "Kategori", "Durum", "Tarih", "Görüntülenme"]
                .map(String::from)
                .to_vec(),
            draft_defaults,
        }
    }

    /// Customer table
    pub fn customer() -> Self {
        let mut draft_defaults = Fields::new();
        for field in ["Name", "Email", "Company"] {
            draft_defaults.insert(field.to_string(), FieldValue::text(""));
        }
        draft_defaults.insert("Status".to_string(), FieldValue::text("Pending"));
        draft_defaults.insert("Tags".to_string(), FieldValue::Tags(Vec::new()));

        Self {
            name: "customer".to_string(),
            title_field: "Name".to_string(),
            status_field: "Status".to_string(),
            date_field: "Date".to_string(),
            view_count_field: None,
            statuses: vec![
                status("Active", "green", Some("active")),
                status("Pending", "yellow", Some("pending")),
                status("Inactive", "red", None),
            ],
            neutral_color: default_neutral_color(),
            columns: ["Name", "Email", "Company", "Status", "Date"].map(String::from).to_vec(),
            draft_defaults,
        }
    }

    /// Look up a built-in profile by name
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "news" => Some(Self::news()),
            "customer" => Some(Self::customer()),
            _ => None,
        }
    }

    /// Load a profile from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).with_context(|| format!("Failed to read profile {}", path.display()))?;
        let profile: Self =
            serde_yaml::from_str(&raw).with_context(|| format!("Failed to parse profile {}", path.display()))?;
        debug!(path = %path.display(), name = %profile.name, "Loaded dataset profile");
        Ok(profile)
    }

    /// Write this profile as YAML
    pub fn write_yaml_file(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize profile")?;
        fs::write(path, yaml).with_context(|| format!("Failed to write profile {}", path.display()))?;
        Ok(())
    }

    /// Default profile location: `<config dir>/tabledash/profile.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tabledash").join("profile.yaml"))
    }

    /// Pick the profile to run with.
    ///
    /// An explicit file wins, then the default file if it exists, then the
    /// named built-in.
    pub fn resolve(name: &str, file: Option<&Path>) -> Result<Self> {
        if let Some(path) = file {
            return Self::from_yaml_file(path);
        }
        if let Some(path) = Self::default_path().filter(|p| p.exists()) {
            return Self::from_yaml_file(&path);
        }
        Self::builtin(name).ok_or_else(|| eyre!("Unknown profile '{}' (expected news or customer)", name))
    }

    /// Statistics buckets as `(key, status value)` pairs
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.statuses
            .iter()
            .filter_map(|s| s.bucket.as_deref().map(|key| (key, s.value.as_str())))
    }

    /// Colour name for a status value; unknown values get the neutral colour
    pub fn status_color(&self, value: &str) -> &str {
        self.statuses
            .iter()
            .find(|s| s.value == value)
            .map(|s| s.color.as_str())
            .unwrap_or(self.neutral_color.as_str())
    }
}

impl Default for DatasetProfile {
    fn default() -> Self {
        Self::news()
    }
}

fn status(value: &str, color: &str, bucket: Option<&str>) -> StatusStyle {
    StatusStyle {
        value: value.to_string(),
        color: color.to_string(),
        bucket: bucket.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_profiles() {
        assert_eq!(DatasetProfile::builtin("news").unwrap().status_field, "Durum");
        assert_eq!(DatasetProfile::builtin("customer").unwrap().status_field, "Status");
        assert!(DatasetProfile::builtin("dark").is_none());
    }

    #[test]
    fn test_news_buckets() {
        let profile = DatasetProfile::news();
        let buckets: Vec<_> = profile.buckets().collect();
        assert_eq!(buckets, vec![("published", "Yayınlandı"), ("draft", "Taslak")]);
    }

    #[test]
    fn test_status_color() {
        let profile = DatasetProfile::news();
        assert_eq!(profile.status_color("Yayınlandı"), "green");
        assert_eq!(profile.status_color("İnceleme"), "blue");
        assert_eq!(profile.status_color("Arşiv"), "white");
    }

    #[test]
    fn test_news_draft_defaults() {
        let profile = DatasetProfile::news();
        assert_eq!(profile.draft_defaults.get("Durum"), Some(&FieldValue::text("Taslak")));
        assert_eq!(profile.draft_defaults.get("Etiketler"), Some(&FieldValue::Tags(vec![])));
        assert!(!profile.draft_defaults.contains_key("Tarih"));
    }

    #[test]
    fn test_yaml_file_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("profile.yaml");

        let profile = DatasetProfile::customer();
        profile.write_yaml_file(&path).unwrap();

        let loaded = DatasetProfile::from_yaml_file(&path).unwrap();
        assert_eq!(loaded, profile);
    }

    #[test]
    fn test_resolve_prefers_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.yaml");
        std::fs::write(
            &path,
            "name: tickets\ntitle_field: Subject\nstatus_field: State\ndate_field: Opened\nstatuses:\n  - value: Open\n    color: red\n    bucket: open\n",
        )
        .unwrap();

        let profile = DatasetProfile::resolve("news", Some(&path)).unwrap();
        assert_eq!(profile.name, "tickets");
        assert_eq!(profile.neutral_color, "white");
        assert!(profile.draft_defaults.is_empty());
        assert_eq!(profile.buckets().collect::<Vec<_>>(), vec![("open", "Open")]);
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let temp = TempDir::new().unwrap();
        assert!(DatasetProfile::from_yaml_file(&temp.path().join("nope.yaml")).is_err());
    }
}
