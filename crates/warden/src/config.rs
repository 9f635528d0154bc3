use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use warden_core::{ChannelId, RestrictionId, UserId};
use warden_policy::{CommandDeclaration, BUILTIN_RESTRICTIONS};

use crate::error::{RootError, RootResult};

/// What startup does when a command's restrictions are rejected.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvalidCommandAction {
    /// Refuse to start at all.
    #[default]
    Abort,
    /// Leave the rejected command unregistered and start the others.
    Skip,
}

/// Configuration for command registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default)]
    pub on_invalid: InvalidCommandAction,
}

/// Configuration for log output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "warden=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// Parameterised restriction kinds that can be declared in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestrictionKind {
    Permission { permission: String },
    Role { role: String },
    User { user: UserId },
    Channel { channel: ChannelId },
}

impl RestrictionKind {
    fn parameter(&self) -> &str {
        match self {
            RestrictionKind::Permission { permission } => permission,
            RestrictionKind::Role { role } => role,
            RestrictionKind::User { user } => user.as_str(),
            RestrictionKind::Channel { channel } => channel.as_str(),
        }
    }
}

/// A restriction registered under an operator-chosen id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestrictionDefinition {
    pub id: RestrictionId,
    #[serde(flatten)]
    pub kind: RestrictionKind,
}

/// Top-level configuration for the warden binary.
///
/// Loaded from a TOML file (typically `~/.warden/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WardenConfig {
    #[serde(default)]
    pub registration: RegistrationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Restrictions available to commands in addition to the built-ins.
    #[serde(default)]
    pub restrictions: Vec<RestrictionDefinition>,

    /// Commands and their restriction declarations.
    #[serde(default)]
    pub commands: Vec<CommandDeclaration>,
}

/// Returns `$HOME/<suffix>` if HOME is available, otherwise `./<suffix>`.
fn dirs_or_default(suffix: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(suffix))
        .unwrap_or_else(|_| PathBuf::from(suffix))
}

impl WardenConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> RootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(RootError::Io)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> RootResult<Self> {
        let config: WardenConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> RootResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RootError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(RootError::Io)?;
        }
        std::fs::write(path, contents).map_err(RootError::Io)?;
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Restriction combinations are not checked here; that happens when
    /// the commands are registered.
    pub fn validate(&self) -> RootResult<()> {
        if self.logging.filter.trim().is_empty() {
            return Err(RootError::Config("logging.filter must not be empty".into()));
        }

        let mut ids = HashSet::new();
        for restriction in &self.restrictions {
            let id = restriction.id.as_str();
            if id.trim().is_empty() {
                return Err(RootError::Config("restriction id must not be empty".into()));
            }
            if BUILTIN_RESTRICTIONS.contains(&id) {
                return Err(RootError::Config(format!(
                    "restriction '{}' shadows a built-in restriction",
                    id
                )));
            }
            if !ids.insert(id) {
                return Err(RootError::Config(format!(
                    "restriction '{}' is defined more than once",
                    id
                )));
            }
            if restriction.kind.parameter().trim().is_empty() {
                return Err(RootError::Config(format!(
                    "restriction '{}' has an empty parameter",
                    id
                )));
            }
        }

        for command in &self.commands {
            if command.name.as_str().trim().is_empty() {
                return Err(RootError::Config("command name must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Return the path to the default config file location.
    pub fn default_config_path() -> PathBuf {
        dirs_or_default(".warden/config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_policy::CombiningPolicy;

    const SAMPLE: &str = r#"
[registration]
on_invalid = "skip"

[logging]
filter = "warden=debug"

[[restrictions]]
id = "can-ban"
kind = "permission"
permission = "ban_members"

[[restrictions]]
id = "moderator"
kind = "role"
role = "Moderator"

[[restrictions]]
id = "mod-channel"
kind = "channel"
channel = "mod-log"

[[commands]]
name = "ping"

[[commands]]
name = "ban"
restrictions = ["guild-owner", "can-ban"]
policy = "or"

[[commands.groups]]
restrictions = ["moderator", "mod-channel"]
policy = "and"
"#;

    #[test]
    fn test_default_config() {
        let config = WardenConfig::default();
        assert_eq!(config.registration.on_invalid, InvalidCommandAction::Abort);
        assert_eq!(config.logging.filter, "warden=info");
        assert!(config.restrictions.is_empty());
        assert!(config.commands.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_toml() {
        let config = WardenConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.registration.on_invalid, InvalidCommandAction::Skip);
        assert_eq!(config.logging.filter, "warden=debug");
        assert_eq!(config.restrictions.len(), 3);
        assert_eq!(
            config.restrictions[0].kind,
            RestrictionKind::Permission {
                permission: "ban_members".into()
            }
        );
        assert_eq!(
            config.restrictions[2].kind,
            RestrictionKind::Channel {
                channel: ChannelId::new("mod-log")
            }
        );

        assert_eq!(config.commands.len(), 2);
        assert!(config.commands[0].declarations.is_empty());
        let ban = &config.commands[1];
        assert_eq!(ban.name.as_str(), "ban");
        assert_eq!(ban.declarations.policy, Some(CombiningPolicy::Or));
        assert_eq!(ban.declarations.groups.len(), 1);
        assert_eq!(ban.declarations.groups[0].policy, Some(CombiningPolicy::And));
    }

    #[test]
    fn test_config_rejects_unknown_kind() {
        let toml_str = r#"
[[restrictions]]
id = "x"
kind = "astrology"
sign = "leo"
"#;
        assert!(WardenConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_config_rejects_misspelled_command_key() {
        let toml_str = r#"
[[commands]]
name = "shutdown"
restriction = ["guild-owner"]
"#;
        match WardenConfig::from_toml(toml_str) {
            Err(RootError::Config(message)) => assert!(message.contains("restriction")),
            other => panic!("expected a parse error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_config_rejects_misspelled_nested_group_key() {
        let toml_str = r#"
[[commands]]
name = "purge"
restrictions = ["guild-owner"]
policy = "or"

[[commands.groups]]
restrictions = ["moderator", "mod-channel"]
polcy = "and"
"#;
        assert!(WardenConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn test_config_validate_shadowed_builtin() {
        let mut config = WardenConfig::default();
        config.restrictions.push(RestrictionDefinition {
            id: RestrictionId::new("guild-owner"),
            kind: RestrictionKind::Role {
                role: "Owner".into(),
            },
        });
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("built-in"));
    }

    #[test]
    fn test_config_validate_duplicate_restriction() {
        let mut config = WardenConfig::default();
        for _ in 0..2 {
            config.restrictions.push(RestrictionDefinition {
                id: RestrictionId::new("moderator"),
                kind: RestrictionKind::Role {
                    role: "Moderator".into(),
                },
            });
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_empty_parameter() {
        let mut config = WardenConfig::default();
        config.restrictions.push(RestrictionDefinition {
            id: RestrictionId::new("can-ban"),
            kind: RestrictionKind::Permission {
                permission: " ".into(),
            },
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_empty_command_name() {
        let mut config = WardenConfig::default();
        config.commands.push(CommandDeclaration::unrestricted(""));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_empty_log_filter() {
        let mut config = WardenConfig::default();
        config.logging.filter = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = WardenConfig::load(Path::new("/nonexistent/config.toml")).unwrap();
        assert!(config.commands.is_empty());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = std::env::temp_dir().join("warden-test-config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.toml");

        let mut config = WardenConfig::default();
        config.registration.on_invalid = InvalidCommandAction::Skip;
        config.restrictions.push(RestrictionDefinition {
            id: RestrictionId::new("can-ban"),
            kind: RestrictionKind::Permission {
                permission: "ban_members".into(),
            },
        });
        config.commands.push(CommandDeclaration::new(
            "ban",
            warden_policy::RestrictionGroup::single("guild-owner"),
        ));

        config.save(&path).unwrap();
        let loaded = WardenConfig::load(&path).unwrap();

        assert_eq!(loaded.registration.on_invalid, InvalidCommandAction::Skip);
        assert_eq!(loaded.restrictions, config.restrictions);
        assert_eq!(loaded.commands, config.commands);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_default_config_path() {
        let path = WardenConfig::default_config_path();
        assert!(path.ends_with(".warden/config.toml"));
    }
}
