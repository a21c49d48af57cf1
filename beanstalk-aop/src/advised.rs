//! 代理配置
//!
//! [`AdvisedConfig`] 持有目标源和有序的通知器列表，
//! 并按 (方法, 目标类) 缓存解析好的通知链。添加或移除通知器会清空缓存。

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use beanstalk_core::{ClassDescriptor, Method};
use parking_lot::{Mutex, RwLock};

use crate::advice::Advice;
use crate::advisor::Advisor;
use crate::target::TargetSource;

/// 一次调用适用的通知，按通知器注册顺序排列
pub type AdviceChain = Arc<[Advice]>;

#[derive(Clone, PartialEq, Eq, Hash)]
struct ChainKey {
    method: Method,
    class: TypeId,
}

/// 代理配置
pub struct AdvisedConfig {
    target_source: Arc<dyn TargetSource>,
    advisors: RwLock<Vec<Advisor>>,
    chain_cache: Mutex<HashMap<ChainKey, AdviceChain>>,
    proxy_target_class: bool,
}

impl AdvisedConfig {
    pub fn new(target_source: Arc<dyn TargetSource>) -> Self {
        Self {
            target_source,
            advisors: RwLock::new(Vec::new()),
            chain_cache: Mutex::new(HashMap::new()),
            proxy_target_class: false,
        }
    }

    pub fn with_advisors(self, advisors: Vec<Advisor>) -> Self {
        *self.advisors.write() = advisors;
        self
    }

    /// 强制使用子类代理
    pub fn proxy_target_class(mut self, force: bool) -> Self {
        self.proxy_target_class = force;
        self
    }

    pub fn is_proxy_target_class(&self) -> bool {
        self.proxy_target_class
    }

    pub fn target_source(&self) -> &Arc<dyn TargetSource> {
        &self.target_source
    }

    pub fn target_class(&self) -> Arc<ClassDescriptor> {
        self.target_source.target_class()
    }

    pub fn advisors(&self) -> Vec<Advisor> {
        self.advisors.read().clone()
    }

    pub fn advisor_count(&self) -> usize {
        self.advisors.read().len()
    }

    pub fn add_advisor(&self, advisor: Advisor) {
        let mut advisors = self.advisors.write();
        tracing::debug!("Adding advisor '{}' to proxy of '{}'", advisor.name(), self.target_class().name());
        advisors.push(advisor);
        self.chain_cache.lock().clear();
    }

    /// 按名称移除通知器，返回是否移除
    pub fn remove_advisor(&self, name: &str) -> bool {
        let mut advisors = self.advisors.write();
        let before = advisors.len();
        advisors.retain(|advisor| advisor.name() != name);
        let removed = advisors.len() != before;
        if removed {
            tracing::debug!("Removed advisor '{}' from proxy of '{}'", name, self.target_class().name());
            self.chain_cache.lock().clear();
        }
        removed
    }

    /// 解析 `class` 上 `method` 的通知链
    ///
    /// 结果被缓存；返回的链是快照，执行通知时不持有任何锁。
    pub fn chain_for(&self, method: &Method, class: &ClassDescriptor) -> AdviceChain {
        let key = ChainKey {
            method: method.clone(),
            class: class.type_id(),
        };
        if let Some(chain) = self.chain_cache.lock().get(&key) {
            return Arc::clone(chain);
        }

        // 持有读锁直到写入缓存，保证不会缓存到已过期的通知器列表
        let advisors = self.advisors.read();
        let chain: AdviceChain = advisors
            .iter()
            .filter(|advisor| advisor.matches(method, class))
            .map(|advisor| advisor.advice().clone())
            .collect();
        tracing::trace!("Resolved {} advice(s) for {}", chain.len(), method);
        self.chain_cache.lock().insert(key, Arc::clone(&chain));
        chain
    }

    pub fn cached_chain_count(&self) -> usize {
        self.chain_cache.lock().len()
    }
}

impl fmt::Debug for AdvisedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisedConfig")
            .field("target_class", &self.target_class().name())
            .field("advisors", &*self.advisors.read())
            .field("proxy_target_class", &self.proxy_target_class)
            .finish()
    }
}
