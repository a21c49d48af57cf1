//! Bean 作用域
//!
//! 单例和原型由容器直接处理，其他作用域通过 [`Scope`] trait 插入，
//! 容器只按名称把获取请求分派给已注册的作用域实现。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use crate::constants::{SCOPE_PROTOTYPE, SCOPE_SINGLETON};
use crate::error::ContainerResult;
use crate::object::ObjectRef;

/// 作用域销毁回调
pub type DestructionCallback = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// 自定义作用域
pub trait Scope: Send + Sync {
    /// 返回作用域内名为 `name` 的对象，不存在时调用 `factory` 创建
    fn get(
        &self,
        name: &str,
        factory: &mut dyn FnMut() -> ContainerResult<ObjectRef>,
    ) -> ContainerResult<ObjectRef>;

    /// 从作用域移除对象并返回它
    fn remove(&self, name: &str) -> Option<ObjectRef>;

    /// 注册对象销毁时执行的回调
    fn register_destruction_callback(&self, name: &str, callback: DestructionCallback);

    /// 当前会话标识（如果有）
    fn conversation_id(&self) -> Option<String> {
        None
    }
}

/// 解析后的作用域策略
#[derive(Clone)]
pub enum ScopeStrategy {
    /// 每个名称一个共享实例，由暂存缓存管理
    Singleton,
    /// 每次请求都创建新实例，销毁由调用方负责
    Prototype,
    /// 已注册的自定义作用域
    Custom(String, Arc<dyn Scope>),
}

impl ScopeStrategy {
    pub fn name(&self) -> &str {
        match self {
            ScopeStrategy::Singleton => SCOPE_SINGLETON,
            ScopeStrategy::Prototype => SCOPE_PROTOTYPE,
            ScopeStrategy::Custom(name, _) => name,
        }
    }
}

impl fmt::Debug for ScopeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScopeStrategy({})", self.name())
    }
}

#[derive(Default)]
struct ThreadBucket {
    objects: HashMap<String, ObjectRef>,
    callbacks: HashMap<String, DestructionCallback>,
}

/// 线程作用域：每个线程一个实例
///
/// 对象在 `remove` 或 `clear_current_thread` 时运行销毁回调。
#[derive(Default)]
pub struct ThreadScope {
    buckets: Mutex<HashMap<ThreadId, ThreadBucket>>,
}

impl ThreadScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// 清空当前线程的所有对象，返回失败的销毁回调
    pub fn clear_current_thread(&self) -> Vec<(String, anyhow::Error)> {
        let bucket = self.buckets.lock().remove(&thread::current().id());
        let mut failures = Vec::new();
        if let Some(bucket) = bucket {
            for (name, callback) in bucket.callbacks {
                if let Err(e) = callback() {
                    tracing::warn!("Destruction callback for thread-scoped bean '{}' failed: {}", name, e);
                    failures.push((name, e));
                }
            }
        }
        failures
    }

    /// 当前线程持有的对象数量
    pub fn len(&self) -> usize {
        self.buckets
            .lock()
            .get(&thread::current().id())
            .map(|b| b.objects.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Scope for ThreadScope {
    fn get(
        &self,
        name: &str,
        factory: &mut dyn FnMut() -> ContainerResult<ObjectRef>,
    ) -> ContainerResult<ObjectRef> {
        let thread_id = thread::current().id();
        if let Some(existing) = self
            .buckets
            .lock()
            .get(&thread_id)
            .and_then(|b| b.objects.get(name))
        {
            return Ok(existing.clone());
        }

        // 工厂可能递归访问本作用域，调用期间不持有锁
        let created = factory()?;

        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(thread_id).or_default();
        Ok(bucket
            .objects
            .entry(name.to_string())
            .or_insert(created)
            .clone())
    }

    fn remove(&self, name: &str) -> Option<ObjectRef> {
        let (object, callback) = {
            let mut buckets = self.buckets.lock();
            let bucket = buckets.get_mut(&thread::current().id())?;
            (bucket.objects.remove(name), bucket.callbacks.remove(name))
        };
        if let Some(callback) = callback {
            if let Err(e) = callback() {
                tracing::warn!("Destruction callback for thread-scoped bean '{}' failed: {}", name, e);
            }
        }
        object
    }

    fn register_destruction_callback(&self, name: &str, callback: DestructionCallback) {
        self.buckets
            .lock()
            .entry(thread::current().id())
            .or_default()
            .callbacks
            .insert(name.to_string(), callback);
    }

    fn conversation_id(&self) -> Option<String> {
        Some(format!("{:?}", thread::current().id()))
    }
}
