//! 单例暂存缓存
//!
//! 每个单例名称处于四种状态之一：不存在、工厂待定（持有可生成早期引用的闭包）、
//! 早期暴露（尚未初始化完成的实例）、就绪。三种非空表示任一时刻最多存在一种，
//! 提升到某一状态时清除其余两种。
//!
//! 所有状态变更都在同一把互斥锁内完成；创建过程由一把可重入的创建锁串行化，
//! 保证同一名称的工厂闭包最多执行一次，且创建线程递归请求依赖时不会死锁。
//! 早期引用只对正在创建该单例的线程可见，其他线程会在创建锁上等待就绪对象。

use std::collections::{HashMap, HashSet};
use std::thread::{self, ThreadId};

use parking_lot::{Mutex, ReentrantMutex};

use crate::error::{ContainerError, ContainerResult, DestroyFailure};
use crate::object::ObjectRef;

/// 生成早期引用的工厂
pub type EarlyReferenceFactory = Box<dyn FnOnce() -> ContainerResult<ObjectRef> + Send>;

/// 单例销毁回调
pub type DisposableCallback = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// 单例在缓存中的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedState {
    Absent,
    FactoryPending,
    EarlyExposed,
    Ready,
}

#[derive(Default)]
struct CacheState {
    ready: HashMap<String, ObjectRef>,
    early: HashMap<String, ObjectRef>,
    factories: HashMap<String, EarlyReferenceFactory>,
    /// 成为就绪的顺序
    registered: Vec<String>,
    /// 正在创建的名称及创建线程，按进入顺序
    in_creation: Vec<(String, ThreadId)>,
    /// 按注册顺序保存的销毁回调
    disposables: Vec<(String, DisposableCallback)>,
    /// name -> 依赖 name 的 Bean
    dependents: HashMap<String, HashSet<String>>,
    /// name -> name 依赖的 Bean
    dependencies: HashMap<String, HashSet<String>>,
    in_destruction: bool,
}

impl CacheState {
    fn creator_of(&self, name: &str) -> Option<ThreadId> {
        self.in_creation
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, thread)| *thread)
    }

    fn creation_chain(&self) -> Vec<String> {
        self.in_creation.iter().map(|(n, _)| n.clone()).collect()
    }

    fn clear_representations(&mut self, name: &str) {
        self.ready.remove(name);
        self.early.remove(name);
        self.factories.remove(name);
        self.registered.retain(|n| n != name);
    }
}

/// 创建标记守卫
///
/// 离开作用域时（包括失败和 panic）清除名称的创建中标记。
struct CreationGuard<'a> {
    cache: &'a StagedObjectCache,
    name: &'a str,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.cache.state.lock();
        if let Some(pos) = state.in_creation.iter().rposition(|(n, _)| n == self.name) {
            state.in_creation.remove(pos);
        }
    }
}

/// 单例暂存缓存
pub struct StagedObjectCache {
    state: Mutex<CacheState>,
    creation_lock: ReentrantMutex<()>,
}

impl Default for StagedObjectCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StagedObjectCache {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            creation_lock: ReentrantMutex::new(()),
        }
    }

    pub fn state_of(&self, name: &str) -> StagedState {
        let state = self.state.lock();
        if state.ready.contains_key(name) {
            StagedState::Ready
        } else if state.early.contains_key(name) {
            StagedState::EarlyExposed
        } else if state.factories.contains_key(name) {
            StagedState::FactoryPending
        } else {
            StagedState::Absent
        }
    }

    pub fn get_ready(&self, name: &str) -> Option<ObjectRef> {
        self.state.lock().ready.get(name).cloned()
    }

    pub fn contains_ready(&self, name: &str) -> bool {
        self.state.lock().ready.contains_key(name)
    }

    /// 查找单例
    ///
    /// 就绪对象总是返回；`allow_early` 时，正在由当前线程创建的单例返回早期引用，
    /// 必要时调用工厂把工厂待定提升为早期暴露。工厂在锁外执行。
    pub fn get_singleton(&self, name: &str, allow_early: bool) -> ContainerResult<Option<ObjectRef>> {
        let factory = {
            let mut state = self.state.lock();
            if let Some(ready) = state.ready.get(name) {
                return Ok(Some(ready.clone()));
            }
            if !allow_early || state.creator_of(name) != Some(thread::current().id()) {
                return Ok(None);
            }
            if let Some(early) = state.early.get(name) {
                return Ok(Some(early.clone()));
            }
            match state.factories.remove(name) {
                Some(factory) => factory,
                None => return Ok(None),
            }
        };

        let early = factory()?;

        let mut state = self.state.lock();
        if let Some(ready) = state.ready.get(name) {
            return Ok(Some(ready.clone()));
        }
        tracing::trace!("Promoted singleton '{}' to early-exposed", name);
        state.early.insert(name.to_string(), early.clone());
        Ok(Some(early))
    }

    /// 返回就绪单例，不存在时调用 `create` 创建并提升为就绪
    ///
    /// 同名单例并发请求时只有一个线程执行 `create`，其余线程等待结果。
    /// 当前线程已在创建该名称且没有早期引用可用时返回循环依赖错误。
    /// 创建失败时名称回到不存在状态。
    pub fn get_or_create<F>(&self, name: &str, create: F) -> ContainerResult<ObjectRef>
    where
        F: FnOnce() -> ContainerResult<ObjectRef>,
    {
        if let Some(ready) = self.get_ready(name) {
            return Ok(ready);
        }

        let _creation = self.creation_lock.lock();

        {
            let mut state = self.state.lock();
            if let Some(ready) = state.ready.get(name) {
                return Ok(ready.clone());
            }
            if state.in_destruction {
                return Err(ContainerError::BeanCreation {
                    name: name.to_string(),
                    source: Box::new(ContainerError::Other(anyhow::anyhow!(
                        "Singleton bean creation not allowed while singletons of this container are in destruction"
                    ))),
                });
            }
            if state.creator_of(name).is_some() {
                let mut chain = state.creation_chain();
                chain.push(name.to_string());
                return Err(ContainerError::CircularDependency(format!(
                    "Requested bean '{}' is currently in creation: is there an unresolvable circular reference? ({})",
                    name,
                    chain.join(" -> ")
                )));
            }
            state
                .in_creation
                .push((name.to_string(), thread::current().id()));
        }

        let _guard = CreationGuard { cache: self, name };

        match create() {
            Ok(object) => {
                self.add_ready(name, object.clone());
                Ok(object)
            }
            Err(e) => {
                tracing::debug!("Rolling back singleton '{}' after failed creation", name);
                // 已经拿到早期引用的单例一并销毁
                let mut failures = Vec::new();
                self.destroy_singleton(name, &mut failures);
                for failure in &failures {
                    tracing::warn!(
                        "Failed to destroy '{}' while rolling back '{}': {}",
                        failure.bean_name,
                        name,
                        failure.message
                    );
                }
                Err(e)
            }
        }
    }

    /// 登记工厂待定状态
    pub fn add_singleton_factory(&self, name: &str, factory: EarlyReferenceFactory) {
        let mut state = self.state.lock();
        if !state.ready.contains_key(name) {
            state.early.remove(name);
            state.factories.insert(name.to_string(), factory);
        }
    }

    /// 提升为就绪
    pub fn add_ready(&self, name: &str, object: ObjectRef) {
        let mut state = self.state.lock();
        state.early.remove(name);
        state.factories.remove(name);
        state.ready.insert(name.to_string(), object);
        if !state.registered.iter().any(|n| n == name) {
            state.registered.push(name.to_string());
        }
    }

    /// 注册外部创建的单例
    pub fn register_manual(&self, name: &str, object: ObjectRef) -> ContainerResult<()> {
        {
            let state = self.state.lock();
            if state.ready.contains_key(name) {
                return Err(ContainerError::BeanAlreadyExists(name.to_string()));
            }
        }
        self.add_ready(name, object);
        Ok(())
    }

    /// 清除名称的所有缓存表示
    pub fn remove(&self, name: &str) {
        self.state.lock().clear_representations(name);
    }

    pub fn early_reference(&self, name: &str) -> Option<ObjectRef> {
        self.state.lock().early.get(name).cloned()
    }

    pub fn is_in_creation(&self, name: &str) -> bool {
        self.state.lock().creator_of(name).is_some()
    }

    /// 当前线程正在创建该名称
    pub fn is_created_by_current_thread(&self, name: &str) -> bool {
        self.state.lock().creator_of(name) == Some(thread::current().id())
    }

    pub fn creation_chain(&self) -> Vec<String> {
        self.state.lock().creation_chain()
    }

    pub fn register_disposable(&self, name: &str, callback: DisposableCallback) {
        let mut state = self.state.lock();
        state.disposables.retain(|(n, _)| n != name);
        state.disposables.push((name.to_string(), callback));
    }

    /// 登记 `dependent` 依赖 `name`
    pub fn register_dependent(&self, name: &str, dependent: &str) {
        if name == dependent {
            return;
        }
        let mut state = self.state.lock();
        state
            .dependents
            .entry(name.to_string())
            .or_default()
            .insert(dependent.to_string());
        state
            .dependencies
            .entry(dependent.to_string())
            .or_default()
            .insert(name.to_string());
    }

    pub fn dependents_of(&self, name: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut dependents: Vec<String> = state
            .dependents
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        dependents.sort();
        dependents
    }

    pub fn dependencies_of(&self, name: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut dependencies: Vec<String> = state
            .dependencies
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        dependencies.sort();
        dependencies
    }

    /// `dependent` 是否直接或间接依赖 `name`
    pub fn is_dependent(&self, name: &str, dependent: &str) -> bool {
        let state = self.state.lock();
        let mut seen = HashSet::new();
        let mut stack = vec![name.to_string()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(direct) = state.dependents.get(&current) {
                if direct.contains(dependent) {
                    return true;
                }
                stack.extend(direct.iter().cloned());
            }
        }
        false
    }

    /// 销毁单个单例，先销毁依赖它的单例
    pub fn destroy_singleton(&self, name: &str, failures: &mut Vec<DestroyFailure>) {
        let (disposable, dependents) = {
            let mut state = self.state.lock();
            state.clear_representations(name);
            let disposable = state
                .disposables
                .iter()
                .position(|(n, _)| n == name)
                .map(|pos| state.disposables.remove(pos).1);
            let dependents = state.dependents.remove(name).unwrap_or_default();
            (disposable, dependents)
        };

        let mut dependents: Vec<String> = dependents.into_iter().collect();
        dependents.sort();
        for dependent in dependents {
            self.destroy_singleton(&dependent, failures);
        }

        if let Some(callback) = disposable {
            tracing::debug!("Invoking destroy callback for bean '{}'", name);
            if let Err(e) = callback() {
                tracing::warn!("Destroy method on bean with name '{}' threw an exception: {}", name, e);
                failures.push(DestroyFailure {
                    bean_name: name.to_string(),
                    message: e.to_string(),
                });
            }
        }

        let mut state = self.state.lock();
        if let Some(deps) = state.dependencies.remove(name) {
            for dep in deps {
                if let Some(set) = state.dependents.get_mut(&dep) {
                    set.remove(name);
                }
            }
        }
    }

    /// 按注册的逆序销毁所有单例，单个回调失败不影响其余回调
    pub fn destroy_all(&self) -> Vec<DestroyFailure> {
        let names: Vec<String> = {
            let mut state = self.state.lock();
            state.in_destruction = true;
            state.disposables.iter().map(|(n, _)| n.clone()).collect()
        };
        tracing::debug!("Destroying singletons in reverse registration order: {:?}", names);

        let mut failures = Vec::new();
        for name in names.iter().rev() {
            self.destroy_singleton(name, &mut failures);
        }

        let mut state = self.state.lock();
        state.ready.clear();
        state.early.clear();
        state.factories.clear();
        state.registered.clear();
        state.dependents.clear();
        state.dependencies.clear();
        state.disposables.clear();
        state.in_destruction = false;
        failures
    }

    /// 就绪单例名称，按就绪顺序
    pub fn singleton_names(&self) -> Vec<String> {
        self.state.lock().registered.clone()
    }

    pub fn singleton_count(&self) -> usize {
        self.state.lock().registered.len()
    }
}
