//! 切面（Aspect）定义
//!
//! 切面是横切关注点的模块化：一个切点表达式加上一组可选的通知回调。
//! 注册时被适配为一个环绕通知器。

use std::sync::Arc;

use beanstalk_core::{InvokeResult, Value, DEFAULT_PROCESSOR_ORDER};

use crate::advice::{Advice, MethodInterceptor};
use crate::advisor::Advisor;
use crate::error_info::ErrorInfo;
use crate::invocation::MethodInvocation;
use crate::joinpoint::JoinPoint;
use crate::pointcut::PointcutExpression;

/// 切面 Trait
///
/// 实现此 trait 以定义切面逻辑
pub trait Aspect: Send + Sync {
    /// 切面名称
    fn name(&self) -> &str;

    /// 切点表达式
    fn pointcut(&self) -> &PointcutExpression;

    /// 多个切面命中同一方法时，数字越小越靠外
    fn order(&self) -> i32 {
        DEFAULT_PROCESSOR_ORDER
    }

    /// 前置通知（可选实现），返回错误时目标方法不会执行
    fn before(&self, _join_point: &JoinPoint) -> anyhow::Result<()> {
        Ok(())
    }

    /// 后置通知（可选实现）
    fn after(&self, _join_point: &JoinPoint) {}

    /// 返回后通知（可选实现）
    fn after_returning(&self, _join_point: &JoinPoint, _result: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    /// 异常通知（可选实现）
    fn after_throwing(&self, _join_point: &JoinPoint, _error: &ErrorInfo) {}
}

struct AspectInterceptor {
    aspect: Arc<dyn Aspect>,
}

impl MethodInterceptor for AspectInterceptor {
    fn invoke(&self, invocation: &mut MethodInvocation) -> InvokeResult {
        self.aspect.before(invocation.join_point())?;

        let result = match invocation.proceed() {
            Ok(value) => self
                .aspect
                .after_returning(invocation.join_point(), &value)
                .map(|_| value),
            Err(error) => {
                self.aspect
                    .after_throwing(invocation.join_point(), &ErrorInfo::from_anyhow(&error));
                Err(error)
            }
        };

        self.aspect.after(invocation.join_point());
        result
    }
}

/// 把切面适配为通知器
pub fn aspect_advisor(aspect: Arc<dyn Aspect>) -> Advisor {
    let name = aspect.name().to_string();
    let order = aspect.order();
    let pointcut = Arc::new(aspect.pointcut().clone());
    Advisor::new(name, pointcut, Advice::Around(Arc::new(AspectInterceptor { aspect }))).with_order(order)
}

// ============================================================================
// 预定义的常用切面
// ============================================================================

/// 日志切面 - 记录方法调用
pub struct LoggingAspect {
    log_args: bool,
    log_result: bool,
    pointcut: PointcutExpression,
}

impl LoggingAspect {
    pub fn new(pointcut: PointcutExpression) -> Self {
        Self {
            log_args: false,
            log_result: false,
            pointcut,
        }
    }

    pub fn with_args(mut self) -> Self {
        self.log_args = true;
        self
    }

    pub fn with_result(mut self) -> Self {
        self.log_result = true;
        self
    }
}

impl Aspect for LoggingAspect {
    fn name(&self) -> &str {
        "LoggingAspect"
    }

    fn pointcut(&self) -> &PointcutExpression {
        &self.pointcut
    }

    fn before(&self, join_point: &JoinPoint) -> anyhow::Result<()> {
        if self.log_args {
            tracing::info!("→ Entering: {} with args {:?}", join_point.signature(), join_point.args());
        } else {
            tracing::info!("→ Entering: {}", join_point.signature());
        }
        Ok(())
    }

    fn after_returning(&self, join_point: &JoinPoint, result: &Value) -> anyhow::Result<()> {
        if self.log_result {
            tracing::info!("  {} returned {:?}", join_point.signature(), result);
        }
        Ok(())
    }

    fn after(&self, join_point: &JoinPoint) {
        let elapsed = join_point.started().elapsed();
        tracing::info!("← Exiting: {} (took {:?})", join_point.signature(), elapsed);
    }
}

/// 性能监控切面
pub struct PerformanceAspect {
    threshold_ms: u128,
    pointcut: PointcutExpression,
}

impl PerformanceAspect {
    pub fn new(threshold_ms: u128, pointcut: PointcutExpression) -> Self {
        Self {
            threshold_ms,
            pointcut,
        }
    }

    pub fn threshold_ms(&self) -> u128 {
        self.threshold_ms
    }
}

impl Aspect for PerformanceAspect {
    fn name(&self) -> &str {
        "PerformanceAspect"
    }

    fn pointcut(&self) -> &PointcutExpression {
        &self.pointcut
    }

    fn after(&self, join_point: &JoinPoint) {
        let elapsed = join_point.started().elapsed().as_millis();
        if elapsed > self.threshold_ms {
            tracing::warn!(
                "⚠️ Slow method detected: {} took {}ms (threshold: {}ms)",
                join_point.signature(),
                elapsed,
                self.threshold_ms
            );
        }
    }
}

/// 异常处理切面
pub struct ExceptionHandlingAspect {
    pointcut: PointcutExpression,
}

impl ExceptionHandlingAspect {
    pub fn new(pointcut: PointcutExpression) -> Self {
        Self { pointcut }
    }
}

impl Aspect for ExceptionHandlingAspect {
    fn name(&self) -> &str {
        "ExceptionHandlingAspect"
    }

    fn pointcut(&self) -> &PointcutExpression {
        &self.pointcut
    }

    fn after_throwing(&self, join_point: &JoinPoint, error: &ErrorInfo) {
        tracing::error!(
            "❌ Exception in {}: {}",
            join_point.signature(),
            error.full_description()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyFactory;
    use anyhow::anyhow;
    use beanstalk_core::{ClassDescriptor, ObjectRef, ValueType};
    use parking_lot::Mutex;

    struct Inventory;

    struct Recording {
        pointcut: PointcutExpression,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Aspect for Recording {
        fn name(&self) -> &str {
            "Recording"
        }

        fn pointcut(&self) -> &PointcutExpression {
            &self.pointcut
        }

        fn before(&self, join_point: &JoinPoint) -> anyhow::Result<()> {
            self.log.lock().push(format!("before {}", join_point.method_name()));
            Ok(())
        }

        fn after(&self, join_point: &JoinPoint) {
            self.log.lock().push(format!("after {}", join_point.method_name()));
        }

        fn after_returning(&self, _join_point: &JoinPoint, result: &Value) -> anyhow::Result<()> {
            self.log.lock().push(format!("returned {}", result));
            Ok(())
        }

        fn after_throwing(&self, _join_point: &JoinPoint, error: &ErrorInfo) {
            self.log.lock().push(format!("threw {}", error.message));
        }
    }

    fn inventory() -> ObjectRef {
        let class = ClassDescriptor::builder::<Inventory>()
            .method("count", &[], |_: &Inventory, _| Ok(Value::Int(3)))
            .method("remove", &[ValueType::Int], |_: &Inventory, _| Err(anyhow!("out of stock")))
            .build();
        ObjectRef::from_value(Inventory, class)
    }

    #[test]
    fn test_aspect_callbacks_around_success_and_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let aspect = Arc::new(Recording {
            pointcut: PointcutExpression::parse("within(Inventory)").unwrap(),
            log: Arc::clone(&log),
        });
        let proxy = ProxyFactory::new(inventory())
            .add_advisor(aspect_advisor(aspect))
            .get_proxy()
            .unwrap();

        assert_eq!(proxy.invoke("count", &[]).unwrap(), Value::Int(3));
        assert!(proxy.invoke("remove", &[Value::Int(1)]).is_err());
        assert_eq!(
            *log.lock(),
            vec![
                "before count",
                "returned 3",
                "after count",
                "before remove",
                "threw out of stock",
                "after remove"
            ]
        );
    }

    #[test]
    fn test_predefined_aspects_pass_results_through() {
        let pointcut = PointcutExpression::All;
        let proxy = ProxyFactory::new(inventory())
            .add_advisor(aspect_advisor(Arc::new(LoggingAspect::new(pointcut.clone()).with_args().with_result())))
            .add_advisor(aspect_advisor(Arc::new(PerformanceAspect::new(0, pointcut.clone()))))
            .add_advisor(aspect_advisor(Arc::new(ExceptionHandlingAspect::new(pointcut))))
            .get_proxy()
            .unwrap();

        assert_eq!(proxy.invoke("count", &[]).unwrap(), Value::Int(3));
        let err = proxy.invoke("remove", &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.to_string(), "out of stock");
    }

    #[test]
    fn test_advisor_carries_aspect_order() {
        struct Ordered(PointcutExpression);
        impl Aspect for Ordered {
            fn name(&self) -> &str {
                "Ordered"
            }
            fn pointcut(&self) -> &PointcutExpression {
                &self.0
            }
            fn order(&self) -> i32 {
                5
            }
        }
        let advisor = aspect_advisor(Arc::new(Ordered(PointcutExpression::All)));
        assert_eq!(advisor.name(), "Ordered");
        assert_eq!(advisor.order(), 5);
        assert!(advisor.advice().is_around());
    }
}
