//! AOP 错误类型

use beanstalk_core::ContainerError;

/// AOP 统一结果类型
pub type AopResult<T> = std::result::Result<T, AopError>;

/// 切点表达式解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointcutParseError {
    #[error("Pointcut expression is empty")]
    Empty,

    #[error("Unexpected end of pointcut expression '{0}'")]
    UnexpectedEnd(String),

    #[error("Unexpected '{token}' at position {position} in pointcut expression '{expression}'")]
    UnexpectedToken {
        expression: String,
        token: String,
        position: usize,
    },

    #[error("Unknown pointcut designator '{0}', expected execution or within")]
    UnknownDesignator(String),

    #[error("Malformed method signature '{0}'")]
    MalformedSignature(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// AOP 运行期错误
#[derive(Debug, thiserror::Error)]
pub enum AopError {
    #[error(transparent)]
    Parse(#[from] PointcutParseError),

    /// 同一个拦截位置上重复调用 `proceed()`
    #[error("proceed() has already been called at position {position} of the interceptor chain for {method}")]
    ProceedAlreadyCalled { method: String, position: usize },

    /// 目标类没有与代理方法签名相同的方法
    #[error("Method {method} is not implemented by target class '{class}'")]
    NoSuchTargetMethod { method: String, class: String },

    #[error(transparent)]
    Container(#[from] ContainerError),
}
