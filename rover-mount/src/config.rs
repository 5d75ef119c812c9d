use mlua::{FromLua, Lua, Value};
use std::path::Path;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Mounting configuration.
///
/// Can be read from a Lua table:
///
/// ```lua
/// return {
///     pool_capacity = 256,
///     coalesce_transactions = true,
///     animate_presentations = false,
///     log_level = "debug",
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MountConfig {
    /// Maximum recycled instances kept per component type
    pub pool_capacity: usize,
    /// Merge superseded updates across queued transactions before applying
    pub coalesce_transactions: bool,
    /// Global switch for animated present/dismiss transitions
    pub animate_presentations: bool,
    pub log_level: String,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 1024,
            coalesce_transactions: true,
            animate_presentations: true,
            log_level: "info".to_string(),
        }
    }
}

impl MountConfig {
    /// Evaluates a Lua chunk that returns a config table
    pub fn from_lua_source(source: &str, name: &str) -> mlua::Result<Self> {
        let lua = Lua::new();
        let value = lua.load(source).set_name(name).eval::<Value>()?;
        MountConfig::from_lua(value, &lua)
    }

    pub fn load_lua_file(path: &Path) -> mlua::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            mlua::Error::RuntimeError(format!(
                "Failed to load config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        MountConfig::from_lua_source(&content, &path.display().to_string())
    }
}

impl FromLua for MountConfig {
    fn from_lua(value: Value, _lua: &Lua) -> mlua::Result<Self> {
        let defaults = MountConfig::default();
        let config = match value {
            Value::Nil => return Ok(defaults),
            Value::Table(config) => config,
            other => {
                return Err(mlua::Error::RuntimeError(format!(
                    "mount config should be a table, got {}",
                    other.type_name()
                )));
            }
        };

        let pool_capacity = match config.get::<Value>("pool_capacity")? {
            Value::Nil => defaults.pool_capacity,
            Value::Integer(n) if n >= 0 => n as usize,
            Value::Number(n) if n >= 0.0 => n as usize,
            _ => {
                return Err(mlua::Error::RuntimeError(
                    "pool_capacity must be a non-negative number".to_string(),
                ));
            }
        };

        let log_level = match config.get::<Value>("log_level")? {
            Value::Nil => defaults.log_level,
            Value::String(s) => {
                let level = s.to_str()?.to_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(mlua::Error::RuntimeError(format!(
                        "log_level must be one of: {}",
                        LOG_LEVELS.join(", ")
                    )));
                }
                level
            }
            _ => {
                return Err(mlua::Error::RuntimeError(
                    "log_level should be a string".to_string(),
                ));
            }
        };

        Ok(MountConfig {
            pool_capacity,
            coalesce_transactions: match config.get::<Value>("coalesce_transactions")? {
                Value::Boolean(b) => b,
                _ => defaults.coalesce_transactions,
            },
            animate_presentations: match config.get::<Value>("animate_presentations")? {
                Value::Boolean(b) => b,
                _ => defaults.animate_presentations,
            },
            log_level,
        })
    }
}
