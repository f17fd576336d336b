//! Core data models for the command catalog.
//!
//! A [`CommandRecord`] is the root entity. Its embedding and its text-index
//! entry are derived artifacts owned by the store and never edited directly.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CatalogError;

/// Declares a closed, lowercase-serialized enum with `as_str`, `Display`,
/// and a `FromStr` that reports unknown values as validation errors.
macro_rules! closed_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? } default $default:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(CatalogError::Validation(format!(
                        "unknown {} '{}' (expected one of: {})",
                        stringify!($name),
                        other,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

closed_enum!(
    /// Shell the command runs in.
    ExecutionMode { Clish => "clish", Expert => "expert", Both => "both" } default Expert
);

closed_enum!(
    CommandType {
        Show => "show",
        Config => "config",
        Diagnostic => "diagnostic",
        Debug => "debug",
        Maintenance => "maintenance",
    } default Show
);

closed_enum!(
    /// Which appliance role the command targets.
    TargetDevice { Gateway => "gateway", Management => "management", Any => "any" } default Any
);

closed_enum!(
    /// How disruptive running the command is.
    Impact {
        None => "none",
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    } default Low
);

/// One positional or flag argument of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandArgument {
    pub argument: String,
    #[serde(default)]
    pub description: String,
}

/// A stored catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<CommandArgument>,
    pub category: String,
    pub version: Option<String>,
    /// Comma-joined keyword tags, e.g. `"cluster,ha,failover"`.
    pub keywords: String,
    pub mode: ExecutionMode,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    pub device: TargetDevice,
    pub executable: bool,
    pub impact: Impact,
    /// Ids of related commands. Not checked against the catalog.
    pub related: Vec<i64>,
    pub deprecated: bool,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub updated_at: i64,
}

impl CommandRecord {
    /// Text fed to the embedding provider: `name + " " + description`.
    pub fn searchable_text(&self) -> String {
        searchable_text(&self.name, self.description.as_deref())
    }

    /// Required-field problems, empty when the record is well-formed.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("name is empty".to_string());
        }
        if self.category.trim().is_empty() {
            problems.push("category is empty".to_string());
        }
        problems
    }
}

pub fn searchable_text(name: &str, description: Option<&str>) -> String {
    format!("{} {}", name, description.unwrap_or("")).trim().to_string()
}

/// Optional restrictions on which records a search may return.
///
/// Stores apply them while selecting candidates, so the candidate cap and
/// the lexical fallback both operate on matching records only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Compared ASCII case-insensitively.
    pub category: Option<String>,
    /// Records targeting [`TargetDevice::Any`] match every device.
    pub device: Option<TargetDevice>,
    /// Records runnable in [`ExecutionMode::Both`] match every mode.
    pub mode: Option<ExecutionMode>,
    pub include_deprecated: bool,
}

impl SearchFilters {
    pub fn matches(&self, record: &CommandRecord) -> bool {
        if record.deprecated && !self.include_deprecated {
            return false;
        }
        if let Some(category) = &self.category {
            if !record.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(device) = self.device {
            if record.device != device && record.device != TargetDevice::Any {
                return false;
            }
        }
        if let Some(mode) = self.mode {
            if record.mode != mode && record.mode != ExecutionMode::Both {
                return false;
            }
        }
        true
    }
}

/// Fields for creating a record. Id and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCommand {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<CommandArgument>,
    pub category: String,
    pub version: Option<String>,
    pub keywords: String,
    pub mode: ExecutionMode,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    pub device: TargetDevice,
    pub executable: bool,
    pub impact: Impact,
    pub related: Vec<i64>,
    pub deprecated: bool,
}

impl Default for NewCommand {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            arguments: Vec::new(),
            category: String::new(),
            version: None,
            keywords: String::new(),
            mode: ExecutionMode::default(),
            command_type: CommandType::default(),
            device: TargetDevice::default(),
            executable: true,
            impact: Impact::default(),
            related: Vec::new(),
            deprecated: false,
        }
    }
}

impl NewCommand {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = keywords.into();
        self
    }

    /// Trim text fields and reject empty required fields.
    pub fn normalized(mut self) -> Result<Self, CatalogError> {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self.description = normalize_optional(self.description);
        self.version = normalize_optional(self.version);
        self.keywords = normalize_keywords(&self.keywords);
        if self.name.is_empty() {
            return Err(CatalogError::Validation("name must not be empty".into()));
        }
        if self.category.is_empty() {
            return Err(CatalogError::Validation("category must not be empty".into()));
        }
        Ok(self)
    }
}

/// Partial update: `None` leaves the field unchanged.
///
/// For `description` and `version`, `Some("")` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub arguments: Option<Vec<CommandArgument>>,
    pub category: Option<String>,
    pub version: Option<String>,
    pub keywords: Option<String>,
    pub mode: Option<ExecutionMode>,
    #[serde(rename = "type")]
    pub command_type: Option<CommandType>,
    pub device: Option<TargetDevice>,
    pub executable: Option<bool>,
    pub impact: Option<Impact>,
    pub related: Option<Vec<i64>>,
    pub deprecated: Option<bool>,
}

impl CommandUpdate {
    pub fn is_empty(&self) -> bool {
        *self == CommandUpdate::default()
    }

    /// Produce the post-update record. Does not touch timestamps.
    pub fn apply_to(&self, record: &CommandRecord) -> Result<CommandRecord, CatalogError> {
        let mut next = record.clone();
        if let Some(name) = &self.name {
            next.name = name.trim().to_string();
            if next.name.is_empty() {
                return Err(CatalogError::Validation("name must not be empty".into()));
            }
        }
        if let Some(category) = &self.category {
            next.category = category.trim().to_string();
            if next.category.is_empty() {
                return Err(CatalogError::Validation("category must not be empty".into()));
            }
        }
        if let Some(description) = &self.description {
            next.description = normalize_optional(Some(description.clone()));
        }
        if let Some(version) = &self.version {
            next.version = normalize_optional(Some(version.clone()));
        }
        if let Some(arguments) = &self.arguments {
            next.arguments = arguments.clone();
        }
        if let Some(keywords) = &self.keywords {
            next.keywords = normalize_keywords(keywords);
        }
        if let Some(mode) = self.mode {
            next.mode = mode;
        }
        if let Some(command_type) = self.command_type {
            next.command_type = command_type;
        }
        if let Some(device) = self.device {
            next.device = device;
        }
        if let Some(executable) = self.executable {
            next.executable = executable;
        }
        if let Some(impact) = self.impact {
            next.impact = impact;
        }
        if let Some(related) = &self.related {
            next.related = related.clone();
        }
        if let Some(deprecated) = self.deprecated {
            next.deprecated = deprecated;
        }
        Ok(next)
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_keywords(keywords: &str) -> String {
    keywords
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// A ranked search result, matching the public `search` response shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<CommandArgument>,
    pub category: String,
    pub mode: ExecutionMode,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    pub device: TargetDevice,
    pub impact: Impact,
    pub score: f64,
}

impl SearchHit {
    pub fn from_record(record: &CommandRecord, score: f64) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            arguments: record.arguments.clone(),
            category: record.category.clone(),
            mode: record.mode,
            command_type: record.command_type,
            device: record.device,
            impact: record.impact,
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> CommandRecord {
        CommandRecord {
            id: 1,
            name: "cphaprob".into(),
            description: Some("Show cluster member state".into()),
            arguments: vec![],
            category: "clusterxl".into(),
            version: None,
            keywords: "cluster,ha".into(),
            mode: ExecutionMode::Expert,
            command_type: CommandType::Show,
            device: TargetDevice::Gateway,
            executable: true,
            impact: Impact::None,
            related: vec![],
            deprecated: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_enum_parse_is_case_insensitive() {
        assert_eq!("CLISH".parse::<ExecutionMode>().unwrap(), ExecutionMode::Clish);
        assert_eq!(" high ".parse::<Impact>().unwrap(), Impact::High);
    }

    #[test]
    fn test_enum_parse_rejects_unknown() {
        let err = "router".parse::<TargetDevice>().unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(err.to_string().contains("gateway"));
    }

    #[test]
    fn test_searchable_text_without_description() {
        let mut r = record();
        r.description = None;
        assert_eq!(r.searchable_text(), "cphaprob");
        assert_eq!(record().searchable_text(), "cphaprob Show cluster member state");
    }

    #[test]
    fn test_new_command_normalization() {
        let cmd = NewCommand::new("  fw ctl  ", " firewall ")
            .with_keywords(" kernel, ,debug ,")
            .with_description("   ")
            .normalized()
            .unwrap();
        assert_eq!(cmd.name, "fw ctl");
        assert_eq!(cmd.category, "firewall");
        assert_eq!(cmd.keywords, "kernel,debug");
        assert_eq!(cmd.description, None);
    }

    #[test]
    fn test_new_command_requires_name_and_category() {
        assert!(NewCommand::new("", "x").normalized().is_err());
        assert!(NewCommand::new("x", " ").normalized().is_err());
    }

    #[test]
    fn test_update_absent_means_unchanged() {
        let update = CommandUpdate {
            impact: Some(Impact::High),
            ..Default::default()
        };
        let next = update.apply_to(&record()).unwrap();
        assert_eq!(next.impact, Impact::High);
        assert_eq!(next.name, "cphaprob");
        assert_eq!(next.description, record().description);
    }

    #[test]
    fn test_update_empty_description_clears() {
        let update = CommandUpdate {
            description: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(update.apply_to(&record()).unwrap().description, None);
    }

    #[test]
    fn test_update_rejects_empty_name() {
        let update = CommandUpdate {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(update.apply_to(&record()).is_err());
    }

    #[test]
    fn test_problems_reports_empty_fields() {
        let mut r = record();
        r.category = String::new();
        assert_eq!(r.problems(), vec!["category is empty".to_string()]);
        assert!(record().problems().is_empty());
    }

    #[test]
    fn test_new_command_deserializes_type_field() {
        let cmd: NewCommand = serde_json::from_str(
            r#"{"name": "cpstat", "category": "monitoring", "type": "diagnostic", "impact": "none"}"#,
        )
        .unwrap();
        assert_eq!(cmd.command_type, CommandType::Diagnostic);
        assert_eq!(cmd.impact, Impact::None);
        assert_eq!(cmd.mode, ExecutionMode::Expert);
    }
}
