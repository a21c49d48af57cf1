//! 方法调用与拦截链执行
//!
//! 链按位置推进：
//! - 环绕通知拿到 [`MethodInvocation`]，自行决定是否以及何时调用 `proceed()`
//! - 相邻的非环绕通知作为一组执行：前置通知按链顺序先执行，随后继续推进，
//!   得到结果后按链顺序执行返回后 / 异常通知，最后执行后置通知
//! - 链末尾是连接点，即对目标方法的真实调用
//!
//! 每个位置只能 `proceed()` 一次，重复调用返回错误而不会再次执行连接点。

use std::fmt;

use beanstalk_core::{InvokeResult, Method, ObjectRef, Value};

use crate::advice::Advice;
use crate::advised::AdviceChain;
use crate::error::AopError;
use crate::error_info::ErrorInfo;
use crate::joinpoint::JoinPoint;

/// 一次被拦截的方法调用
pub struct MethodInvocation {
    join_point: JoinPoint,
    chain: AdviceChain,
    cursor: usize,
    consumed: Vec<bool>,
}

impl MethodInvocation {
    pub fn new(join_point: JoinPoint, chain: AdviceChain) -> Self {
        let positions = chain.len() + 1;
        Self {
            join_point,
            chain,
            cursor: 0,
            consumed: vec![false; positions],
        }
    }

    pub fn join_point(&self) -> &JoinPoint {
        &self.join_point
    }

    pub fn method(&self) -> &Method {
        self.join_point.method()
    }

    pub fn arguments(&self) -> &[Value] {
        self.join_point.args()
    }

    /// 替换后续通知和目标方法看到的实参
    pub fn set_arguments(&mut self, args: Vec<Value>) {
        self.join_point.set_args(args);
    }

    pub fn target(&self) -> &ObjectRef {
        self.join_point.target()
    }

    /// 执行链上的下一个位置
    pub fn proceed(&mut self) -> InvokeResult {
        let position = self.cursor;
        if self.consumed[position] {
            return Err(AopError::ProceedAlreadyCalled {
                method: self.join_point.signature().to_string(),
                position,
            }
            .into());
        }
        self.consumed[position] = true;

        let chain = AdviceChain::clone(&self.chain);
        let result = if position == chain.len() {
            self.invoke_join_point()
        } else if let Advice::Around(interceptor) = &chain[position] {
            self.cursor = position + 1;
            interceptor.invoke(self)
        } else {
            let end = chain[position..]
                .iter()
                .position(Advice::is_around)
                .map(|offset| position + offset)
                .unwrap_or(chain.len());
            self.cursor = end;
            self.run_simple_advices(&chain[position..end])
        };

        self.cursor = position;
        result
    }

    fn invoke_join_point(&self) -> InvokeResult {
        tracing::trace!("Invoking join point {}", self.join_point.signature());
        self.join_point
            .target()
            .invoke_method(self.join_point.method(), self.join_point.args())
    }

    fn run_simple_advices(&mut self, run: &[Advice]) -> InvokeResult {
        for advice in run {
            if let Advice::Before(before) = advice {
                before.before(&self.join_point)?;
            }
        }

        let result = match self.proceed() {
            Ok(value) => self.after_returning(run, value),
            Err(error) => {
                let info = ErrorInfo::from_anyhow(&error);
                for advice in run {
                    if let Advice::AfterThrowing(after_throwing) = advice {
                        after_throwing.after_throwing(&self.join_point, &info);
                    }
                }
                Err(error)
            }
        };

        for advice in run {
            if let Advice::After(after) = advice {
                after.after(&self.join_point);
            }
        }
        result
    }

    fn after_returning(&self, run: &[Advice], value: Value) -> InvokeResult {
        for advice in run {
            if let Advice::AfterReturning(after_returning) = advice {
                after_returning.after_returning(&self.join_point, &value)?;
            }
        }
        Ok(value)
    }
}

impl fmt::Debug for MethodInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInvocation")
            .field("join_point", &self.join_point)
            .field("chain", &self.chain)
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use anyhow::anyhow;
    use beanstalk_core::{ClassDescriptor, ValueType};
    use parking_lot::Mutex;

    struct Calculator {
        calls: Mutex<u32>,
    }

    fn invocation(name: &str, args: Vec<Value>, chain: Vec<Advice>) -> (MethodInvocation, Arc<Calculator>) {
        let class = ClassDescriptor::builder::<Calculator>()
            .method("double", &[ValueType::Int], |c: &Calculator, args| {
                *c.calls.lock() += 1;
                Ok(Value::Int(args.int(0)? * 2))
            })
            .method("fail", &[], |c: &Calculator, _| {
                *c.calls.lock() += 1;
                Err(anyhow!("calculation failed"))
            })
            .build();
        let target = ObjectRef::from_value(Calculator { calls: Mutex::new(0) }, Arc::clone(&class));
        let method = class
            .methods()
            .iter()
            .find(|m| m.method.name() == name)
            .map(|m| m.method.clone())
            .unwrap();
        let calculator = target.downcast::<Calculator>().unwrap();
        let join_point = JoinPoint::new(method, args, target.clone(), target);
        (MethodInvocation::new(join_point, chain.into()), calculator)
    }

    fn recorder() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn test_empty_chain_invokes_join_point() {
        let (mut invocation, calculator) = invocation("double", vec![Value::Int(21)], vec![]);
        assert_eq!(invocation.proceed().unwrap(), Value::Int(42));
        assert_eq!(*calculator.calls.lock(), 1);
    }

    #[test]
    fn test_around_can_rewrite_arguments_and_result() {
        let around = Advice::around(|invocation: &mut MethodInvocation| {
            invocation.set_arguments(vec![Value::Int(5)]);
            let value = invocation.proceed()?;
            Ok(Value::Int(value.as_i64().unwrap_or(0) + 1))
        });
        let (mut invocation, _) = invocation("double", vec![Value::Int(1)], vec![around]);
        assert_eq!(invocation.proceed().unwrap(), Value::Int(11));
    }

    #[test]
    fn test_second_proceed_fails() {
        let around = Advice::around(|invocation: &mut MethodInvocation| {
            invocation.proceed()?;
            invocation.proceed()
        });
        let (mut invocation, calculator) = invocation("double", vec![Value::Int(1)], vec![around]);
        let err = invocation.proceed().unwrap_err();
        assert!(err.to_string().contains("proceed() has already been called"));
        assert_eq!(*calculator.calls.lock(), 1);
    }

    #[test]
    fn test_around_may_skip_join_point() {
        let around = Advice::around(|_: &mut MethodInvocation| Ok(Value::Int(-1)));
        let (mut invocation, calculator) = invocation("double", vec![Value::Int(1)], vec![around]);
        assert_eq!(invocation.proceed().unwrap(), Value::Int(-1));
        assert_eq!(*calculator.calls.lock(), 0);
    }

    #[test]
    fn test_failure_runs_after_throwing_and_after() {
        let log = recorder();
        let (l1, l2, l3, l4) = (log.clone(), log.clone(), log.clone(), log.clone());
        let chain = vec![
            Advice::before(move |_| {
                l1.lock().push("before".into());
                Ok(())
            }),
            Advice::after_returning(move |_, _| {
                l2.lock().push("after_returning".into());
                Ok(())
            }),
            Advice::after_throwing(move |_, error| l3.lock().push(format!("after_throwing: {}", error.message))),
            Advice::after(move |_| l4.lock().push("after".into())),
        ];
        let (mut invocation, _) = invocation("fail", vec![], chain);

        let err = invocation.proceed().unwrap_err();
        assert_eq!(err.to_string(), "calculation failed");
        assert_eq!(
            *log.lock(),
            vec!["before", "after_throwing: calculation failed", "after"]
        );
    }

    #[test]
    fn test_before_failure_prevents_join_point() {
        let chain = vec![Advice::before(|_| Err(anyhow!("access denied")))];
        let (mut invocation, calculator) = invocation("double", vec![Value::Int(1)], chain);
        assert_eq!(invocation.proceed().unwrap_err().to_string(), "access denied");
        assert_eq!(*calculator.calls.lock(), 0);
    }

    #[test]
    fn test_around_nests_around_simple_advices() {
        let log = recorder();
        let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
        let chain = vec![
            Advice::before(move |_| {
                l1.lock().push("outer.before".into());
                Ok(())
            }),
            Advice::around(move |invocation: &mut MethodInvocation| {
                l2.lock().push("around.enter".into());
                let result = invocation.proceed();
                l2.lock().push("around.exit".into());
                result
            }),
            Advice::after_returning(move |_, value| {
                l3.lock().push(format!("inner.after_returning {}", value));
                Ok(())
            }),
        ];
        let (mut invocation, _) = invocation("double", vec![Value::Int(4)], chain);

        assert_eq!(invocation.proceed().unwrap(), Value::Int(8));
        assert_eq!(
            *log.lock(),
            vec!["outer.before", "around.enter", "inner.after_returning 8", "around.exit"]
        );
    }
}
