//! Beanstalk AOP - 面向切面编程支持
//!
//! 在运行期为容器中的对象生成代理，在方法调用前后执行有序的通知链：
//! - 多种通知类型（Before、AfterReturning、AfterThrowing、After、Around）
//! - 切点表达式（execution / within / && / || / !）与编程式切点
//! - 接口代理与子类代理
//! - 通过 BeanPostProcessor 自动为命中通知器的 Bean 创建代理

pub mod advice;
pub mod advised;
pub mod advisor;
pub mod aop_utils;
pub mod aspect;
pub mod auto_proxy;
pub mod error;
pub mod error_info;
pub mod invocation;
pub mod joinpoint;
pub mod pointcut;
pub mod proxy;
pub mod registry;
pub mod target;

// 重新导出核心类型
pub use advice::{
    Advice, AdviceType, AfterAdvice, AfterReturningAdvice, AfterThrowingAdvice, BeforeAdvice,
    MethodInterceptor,
};
pub use advised::{AdviceChain, AdvisedConfig};
pub use advisor::Advisor;
pub use aspect::{aspect_advisor, Aspect, ExceptionHandlingAspect, LoggingAspect, PerformanceAspect};
pub use auto_proxy::AutoProxyCreator;
pub use error::{AopError, AopResult, PointcutParseError};
pub use error_info::ErrorInfo;
pub use invocation::MethodInvocation;
pub use joinpoint::JoinPoint;
pub use pointcut::{
    ClassFilter, ExpressionPointcut, MethodMatcher, NameMatchMethodPointcut, NamePattern, ParamPattern,
    Pointcut, PointcutExpression, TruePointcut,
};
pub use proxy::{build_proxy, AopProxy, ProxyFactory, ProxyKind};
pub use registry::AdvisorRegistry;
pub use target::{PrototypeTargetSource, SingletonTargetSource, TargetSource};

/// 预导入模块
pub mod prelude {
    pub use crate::advice::*;
    pub use crate::advised::AdvisedConfig;
    pub use crate::advisor::Advisor;
    pub use crate::aop_utils;
    pub use crate::aspect::{Aspect, ExceptionHandlingAspect, LoggingAspect, PerformanceAspect};
    pub use crate::auto_proxy::AutoProxyCreator;
    pub use crate::error_info::ErrorInfo;
    pub use crate::invocation::MethodInvocation;
    pub use crate::joinpoint::JoinPoint;
    pub use crate::pointcut::{ExpressionPointcut, NameMatchMethodPointcut, Pointcut, PointcutExpression, TruePointcut};
    pub use crate::proxy::{build_proxy, ProxyFactory};
    pub use crate::registry::AdvisorRegistry;
    pub use crate::target::{PrototypeTargetSource, SingletonTargetSource, TargetSource};
}
