//! 通知（Advice）定义
//!
//! 定义了在连接点执行的各种动作。[`Advice`] 是带标签的变体，
//! 拦截链按变体分派，不做运行期类型判断。

use std::fmt;
use std::sync::Arc;

use beanstalk_core::{InvokeResult, Value};

use crate::error_info::ErrorInfo;
use crate::invocation::MethodInvocation;
use crate::joinpoint::JoinPoint;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceType {
    /// 前置通知
    Before,
    /// 后置通知（无论成功还是失败都执行）
    After,
    /// 返回后通知（成功返回时执行）
    AfterReturning,
    /// 异常通知（抛出异常时执行）
    AfterThrowing,
    /// 环绕通知（可以控制方法执行）
    Around,
}

impl fmt::Display for AdviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdviceType::Before => "before",
            AdviceType::After => "after",
            AdviceType::AfterReturning => "after-returning",
            AdviceType::AfterThrowing => "after-throwing",
            AdviceType::Around => "around",
        };
        f.write_str(name)
    }
}

/// 前置通知
///
/// 在目标方法执行前调用；返回错误时目标方法不会执行，错误传播给调用方
pub trait BeforeAdvice: Send + Sync {
    fn before(&self, join_point: &JoinPoint) -> anyhow::Result<()>;
}

/// 返回后通知
///
/// 在目标方法成功返回后调用，可以读取返回值
pub trait AfterReturningAdvice: Send + Sync {
    fn after_returning(&self, join_point: &JoinPoint, result: &Value) -> anyhow::Result<()>;
}

/// 异常通知
///
/// 在目标方法返回错误时调用，原错误继续传播
pub trait AfterThrowingAdvice: Send + Sync {
    fn after_throwing(&self, join_point: &JoinPoint, error: &ErrorInfo);
}

/// 后置通知
///
/// 在目标方法执行后调用（无论成功还是失败）
pub trait AfterAdvice: Send + Sync {
    fn after(&self, join_point: &JoinPoint);
}

/// 环绕通知
///
/// 通过 [`MethodInvocation::proceed`] 控制目标方法是否执行，可以改写结果或错误
pub trait MethodInterceptor: Send + Sync {
    fn invoke(&self, invocation: &mut MethodInvocation) -> InvokeResult;
}

impl<F> BeforeAdvice for F
where
    F: Fn(&JoinPoint) -> anyhow::Result<()> + Send + Sync,
{
    fn before(&self, join_point: &JoinPoint) -> anyhow::Result<()> {
        self(join_point)
    }
}

impl<F> AfterReturningAdvice for F
where
    F: Fn(&JoinPoint, &Value) -> anyhow::Result<()> + Send + Sync,
{
    fn after_returning(&self, join_point: &JoinPoint, result: &Value) -> anyhow::Result<()> {
        self(join_point, result)
    }
}

impl<F> AfterThrowingAdvice for F
where
    F: Fn(&JoinPoint, &ErrorInfo) + Send + Sync,
{
    fn after_throwing(&self, join_point: &JoinPoint, error: &ErrorInfo) {
        self(join_point, error)
    }
}

impl<F> AfterAdvice for F
where
    F: Fn(&JoinPoint) + Send + Sync,
{
    fn after(&self, join_point: &JoinPoint) {
        self(join_point)
    }
}

impl<F> MethodInterceptor for F
where
    F: Fn(&mut MethodInvocation) -> InvokeResult + Send + Sync,
{
    fn invoke(&self, invocation: &mut MethodInvocation) -> InvokeResult {
        self(invocation)
    }
}

/// 通知
#[derive(Clone)]
pub enum Advice {
    Before(Arc<dyn BeforeAdvice>),
    AfterReturning(Arc<dyn AfterReturningAdvice>),
    AfterThrowing(Arc<dyn AfterThrowingAdvice>),
    After(Arc<dyn AfterAdvice>),
    Around(Arc<dyn MethodInterceptor>),
}

impl Advice {
    pub fn before<F>(f: F) -> Self
    where
        F: Fn(&JoinPoint) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Advice::Before(Arc::new(f))
    }

    pub fn after_returning<F>(f: F) -> Self
    where
        F: Fn(&JoinPoint, &Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Advice::AfterReturning(Arc::new(f))
    }

    pub fn after_throwing<F>(f: F) -> Self
    where
        F: Fn(&JoinPoint, &ErrorInfo) + Send + Sync + 'static,
    {
        Advice::AfterThrowing(Arc::new(f))
    }

    pub fn after<F>(f: F) -> Self
    where
        F: Fn(&JoinPoint) + Send + Sync + 'static,
    {
        Advice::After(Arc::new(f))
    }

    pub fn around<F>(f: F) -> Self
    where
        F: Fn(&mut MethodInvocation) -> InvokeResult + Send + Sync + 'static,
    {
        Advice::Around(Arc::new(f))
    }

    /// 获取通知类型
    pub fn advice_type(&self) -> AdviceType {
        match self {
            Advice::Before(_) => AdviceType::Before,
            Advice::AfterReturning(_) => AdviceType::AfterReturning,
            Advice::AfterThrowing(_) => AdviceType::AfterThrowing,
            Advice::After(_) => AdviceType::After,
            Advice::Around(_) => AdviceType::Around,
        }
    }

    pub fn is_around(&self) -> bool {
        matches!(self, Advice::Around(_))
    }
}

impl fmt::Debug for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Advice::{:?}", self.advice_type())
    }
}
