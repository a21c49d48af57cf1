//! 通知器（Advisor）：切点与通知的组合

use std::fmt;
use std::sync::Arc;

use beanstalk_core::{ClassDescriptor, Method, DEFAULT_PROCESSOR_ORDER};

use crate::advice::Advice;
use crate::error::PointcutParseError;
use crate::pointcut::{self, ExpressionPointcut, Pointcut, TruePointcut};

/// 通知器
#[derive(Clone)]
pub struct Advisor {
    name: String,
    pointcut: Arc<dyn Pointcut>,
    advice: Advice,
    order: i32,
}

impl Advisor {
    pub fn new(name: impl Into<String>, pointcut: Arc<dyn Pointcut>, advice: Advice) -> Self {
        Self {
            name: name.into(),
            pointcut,
            advice,
            order: DEFAULT_PROCESSOR_ORDER,
        }
    }

    /// 以切点表达式创建
    pub fn with_expression(
        name: impl Into<String>,
        expression: &str,
        advice: Advice,
    ) -> Result<Self, PointcutParseError> {
        let pointcut = ExpressionPointcut::parse(expression)?;
        Ok(Self::new(name, Arc::new(pointcut), advice))
    }

    /// 作用于所有方法
    pub fn for_all(name: impl Into<String>, advice: Advice) -> Self {
        Self::new(name, Arc::new(TruePointcut), advice)
    }

    /// 数字越小越靠前，只在注册表排序时使用
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pointcut(&self) -> &Arc<dyn Pointcut> {
        &self.pointcut
    }

    pub fn advice(&self) -> &Advice {
        &self.advice
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    /// 是否命中 `class` 上的 `method`
    pub fn matches(&self, method: &Method, class: &ClassDescriptor) -> bool {
        pointcut::matches(self.pointcut.as_ref(), method, class)
    }
}

impl fmt::Debug for Advisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advisor")
            .field("name", &self.name)
            .field("pointcut", &self.pointcut)
            .field("advice", &self.advice.advice_type())
            .field("order", &self.order)
            .finish()
    }
}
