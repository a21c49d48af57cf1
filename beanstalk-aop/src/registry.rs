//! 通知器注册表
//!
//! 自动代理创建器从这里查找可作用于某个类的通知器。
//! 注册表属于某个容器的装配，而不是进程级的全局状态。

use std::sync::Arc;

use beanstalk_core::ClassDescriptor;
use parking_lot::RwLock;

use crate::advisor::Advisor;
use crate::aop_utils;
use crate::aspect::{aspect_advisor, Aspect};

/// 通知器注册表
#[derive(Default)]
pub struct AdvisorRegistry {
    advisors: RwLock<Vec<Advisor>>,
}

impl AdvisorRegistry {
    /// 创建新的注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册通知器，按 `order()` 稳定排序
    pub fn register(&self, advisor: Advisor) {
        tracing::debug!("Registering advisor: {} (order {})", advisor.name(), advisor.order());
        let mut advisors = self.advisors.write();
        advisors.push(advisor);
        advisors.sort_by_key(Advisor::order);
    }

    /// 注册切面
    pub fn register_aspect(&self, aspect: Arc<dyn Aspect>) {
        tracing::debug!("Registering aspect: {}", aspect.name());
        self.register(aspect_advisor(aspect));
    }

    /// 批量注册通知器
    pub fn register_all(&self, advisors: impl IntoIterator<Item = Advisor>) {
        for advisor in advisors {
            self.register(advisor);
        }
    }

    /// 所有通知器，按顺序排列
    pub fn advisors(&self) -> Vec<Advisor> {
        self.advisors.read().clone()
    }

    /// 可作用于 `class` 的通知器
    pub fn eligible_advisors(&self, class: &ClassDescriptor) -> Vec<Advisor> {
        aop_utils::find_eligible_advisors(&self.advisors.read(), class)
    }

    /// 获取注册的通知器数量
    pub fn len(&self) -> usize {
        self.advisors.read().len()
    }

    /// 检查是否没有注册任何通知器
    pub fn is_empty(&self) -> bool {
        self.advisors.read().is_empty()
    }

    /// 清除所有通知器
    pub fn clear(&self) {
        self.advisors.write().clear();
    }
}
