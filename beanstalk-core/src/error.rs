//! 容器错误类型
//!
//! 容器内部使用 `ContainerError` 表达可区分的失败类别；
//! 用户提供的构造函数、setter、方法与回调统一返回 `anyhow::Result`，
//! 由容器在边界处包装并附加 Bean 名称作为上下文。

use std::fmt;

/// 容器统一结果类型
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;

/// 应用层结果类型（日志初始化、demo 等）
pub type ApplicationResult<T> = anyhow::Result<T>;

/// 单个销毁回调的失败记录
#[derive(Debug, Clone)]
pub struct DestroyFailure {
    pub bean_name: String,
    pub message: String,
}

impl fmt::Display for DestroyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.bean_name, self.message)
    }
}

/// 容器错误
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// 未知的 Bean 名称或别名
    #[error("No bean named '{0}' is defined")]
    BeanNotFound(String),

    /// 实例化、属性填充或初始化过程中的任何失败
    #[error("Error creating bean with name '{name}': {source}")]
    BeanCreation {
        name: String,
        #[source]
        source: Box<ContainerError>,
    },

    /// 无法解析的构造器循环依赖，或原型 Bean 的重入创建
    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    /// 字面量转换失败或对象类型不匹配
    #[error("Type mismatch for {target}: expected {expected}, found {found}")]
    TypeMismatch {
        target: String,
        expected: String,
        found: String,
    },

    /// 没有可用的代理策略
    #[error("Cannot create proxy for '{target}': {reason}")]
    ProxyCreation { target: String, reason: String },

    /// 一个或多个销毁回调失败
    #[error("{} destroy callback(s) failed: {}", failures.len(), join_failures(failures))]
    DestroyInvocation { failures: Vec<DestroyFailure> },

    #[error("Bean definition '{0}' already exists and overriding is disabled")]
    BeanAlreadyExists(String),

    #[error("Cannot {0}: configuration is frozen")]
    DefinitionFrozen(String),

    #[error("Expected a single bean of type '{type_name}' but found {candidates:?}")]
    NoUniqueBean {
        type_name: String,
        candidates: Vec<String>,
    },

    #[error("No scope registered for scope name '{0}'")]
    NoSuchScope(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn join_failures(failures: &[DestroyFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ContainerError {
    /// 以 Bean 名称包装错误；循环依赖错误保持原样继续向上传播
    pub fn wrap_creation(name: &str, error: ContainerError) -> ContainerError {
        match error {
            ContainerError::CircularDependency(_) => error,
            other => ContainerError::BeanCreation {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// 将用户代码返回的错误转换为容器错误，保留已有的容器错误类型
    pub fn from_user(error: anyhow::Error) -> ContainerError {
        match error.downcast::<ContainerError>() {
            Ok(container_error) => container_error,
            Err(other) => ContainerError::Other(other),
        }
    }

    /// 剥去所有 BeanCreation 包装后的根错误
    pub fn root_cause(&self) -> &ContainerError {
        let mut current = self;
        while let ContainerError::BeanCreation { source, .. } = current {
            current = source;
        }
        current
    }

    pub fn is_circular(&self) -> bool {
        matches!(self.root_cause(), ContainerError::CircularDependency(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContainerError::BeanNotFound(_))
    }

    pub fn is_type_mismatch(&self) -> bool {
        matches!(self.root_cause(), ContainerError::TypeMismatch { .. })
    }
}
