//! 容器配置
//!
//! 可以在代码中构建，也可以从 TOML 读取：
//!
//! ```toml
//! allow-bean-definition-overriding = false
//! allow-circular-references = true
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::error::ApplicationResult;
use crate::logging::LoggingConfig;

/// 容器配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ContainerConfig {
    /// 同名定义是否允许覆盖（默认：true）
    pub allow_bean_definition_overriding: bool,

    /// 是否暴露早期引用以解决 setter 循环依赖（默认：true）
    ///
    /// 关闭后，setter 形式的循环依赖也会以循环依赖错误失败。
    pub allow_circular_references: bool,

    /// 早期引用已被注入而最终对象被包装时，是否仍然允许（默认：false）
    pub allow_raw_injection_despite_wrapping: bool,

    pub logging: LoggingConfig,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            allow_bean_definition_overriding: true,
            allow_circular_references: true,
            allow_raw_injection_despite_wrapping: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl ContainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> ApplicationResult<Self> {
        toml::from_str(content).context("Failed to parse container configuration")
    }

    pub fn from_file(path: impl AsRef<Path>) -> ApplicationResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file '{}'", path.display()))?;
        tracing::debug!("Loaded container configuration from '{}'", path.display());
        Self::from_toml_str(&content)
    }

    pub fn allow_bean_definition_overriding(mut self, allow: bool) -> Self {
        self.allow_bean_definition_overriding = allow;
        self
    }

    pub fn allow_circular_references(mut self, allow: bool) -> Self {
        self.allow_circular_references = allow;
        self
    }

    pub fn allow_raw_injection_despite_wrapping(mut self, allow: bool) -> Self {
        self.allow_raw_injection_despite_wrapping = allow;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_defaults() {
        let config = ContainerConfig::default();
        assert!(config.allow_bean_definition_overriding);
        assert!(config.allow_circular_references);
        assert!(!config.allow_raw_injection_despite_wrapping);
    }

    #[test]
    fn test_from_toml_with_partial_keys() {
        let config = ContainerConfig::from_toml_str(
            r#"
            allow-circular-references = false

            [logging]
            level = "warn"
            "#,
        )
        .unwrap();

        assert!(!config.allow_circular_references);
        assert!(config.allow_bean_definition_overriding);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let err = ContainerConfig::from_toml_str("allow-circular-references = \"maybe\"").unwrap_err();
        assert!(err.to_string().contains("container configuration"));
    }

    #[test]
    fn test_missing_file() {
        assert!(ContainerConfig::from_file("/nonexistent/beanstalk.toml").is_err());
    }
}
