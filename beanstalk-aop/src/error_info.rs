//! 错误信息结构
//!
//! 提供结构化的错误信息传递给切面

use std::error::Error;

/// 结构化的错误信息
///
/// 用于在 after_throwing 通知中传递更丰富的错误信息
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// 错误消息
    pub message: String,

    /// 错误类型名称
    pub error_type: String,

    /// 错误源链（cause chain）
    pub source_chain: Vec<String>,
}

impl ErrorInfo {
    /// 从标准错误创建 ErrorInfo
    pub fn from_error<E: Error>(error: &E) -> Self {
        let mut source_chain = Vec::new();
        let mut current = error.source();
        while let Some(source) = current {
            source_chain.push(source.to_string());
            current = source.source();
        }

        Self {
            message: error.to_string(),
            error_type: std::any::type_name::<E>().to_string(),
            source_chain,
        }
    }

    /// 从方法调用返回的 `anyhow::Error` 创建
    ///
    /// 容器错误保留其类型名，其余错误记为 `anyhow::Error`。
    pub fn from_anyhow(error: &anyhow::Error) -> Self {
        let error_type = if error.is::<beanstalk_core::ContainerError>() {
            std::any::type_name::<beanstalk_core::ContainerError>()
        } else {
            std::any::type_name::<anyhow::Error>()
        };

        Self {
            message: error.to_string(),
            error_type: error_type.to_string(),
            source_chain: error.chain().skip(1).map(|cause| cause.to_string()).collect(),
        }
    }

    /// 创建简单的 ErrorInfo（只包含消息）
    pub fn simple(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: "Unknown".to_string(),
            source_chain: Vec::new(),
        }
    }

    /// 获取完整的错误描述（包含源链）
    pub fn full_description(&self) -> String {
        if self.source_chain.is_empty() {
            self.message.clone()
        } else {
            format!(
                "{}\nCaused by:\n  {}",
                self.message,
                self.source_chain.join("\n  ")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_from_anyhow_keeps_cause_chain() {
        let error = Err::<(), _>(anyhow::anyhow!("disk full"))
            .context("write failed")
            .unwrap_err();
        let info = ErrorInfo::from_anyhow(&error);

        assert_eq!(info.message, "write failed");
        assert_eq!(info.source_chain, vec!["disk full"]);
        assert_eq!(info.full_description(), "write failed\nCaused by:\n  disk full");
    }

    #[test]
    fn test_container_error_type_is_recorded() {
        let error = anyhow::Error::new(beanstalk_core::ContainerError::BeanNotFound("x".into()));
        let info = ErrorInfo::from_anyhow(&error);
        assert!(info.error_type.ends_with("ContainerError"));
        assert!(info.source_chain.is_empty());
    }

    #[test]
    fn test_simple() {
        let info = ErrorInfo::simple("boom");
        assert_eq!(info.error_type, "Unknown");
        assert_eq!(info.full_description(), "boom");
    }
}
