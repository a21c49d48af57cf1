//! Bean 定义注册表
//!
//! 按名称保存定义并记录注册顺序，同时维护别名表。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::anyhow;
use parking_lot::RwLock;

use crate::bean::BeanDefinition;
use crate::error::{ContainerError, ContainerResult};

#[derive(Default)]
struct RegistryState {
    definitions: HashMap<String, BeanDefinition>,
    /// 注册顺序
    names: Vec<String>,
    /// alias -> name
    aliases: HashMap<String, String>,
}

/// 定义注册表
pub struct DefinitionRegistry {
    state: RwLock<RegistryState>,
    frozen: AtomicBool,
    allow_overriding: bool,
}

impl DefinitionRegistry {
    pub fn new(allow_overriding: bool) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            frozen: AtomicBool::new(false),
            allow_overriding,
        }
    }

    fn ensure_mutable(&self, action: &str) -> ContainerResult<()> {
        if self.is_frozen() {
            return Err(ContainerError::DefinitionFrozen(action.to_string()));
        }
        Ok(())
    }

    /// 注册定义，返回被覆盖的旧定义
    pub fn register(
        &self,
        name: &str,
        definition: BeanDefinition,
    ) -> ContainerResult<Option<BeanDefinition>> {
        if name.trim().is_empty() {
            return Err(ContainerError::Other(anyhow!("Bean name must not be empty")));
        }
        self.ensure_mutable(&format!("register bean definition '{}'", name))?;

        let mut state = self.state.write();
        if state.definitions.contains_key(name) && !self.allow_overriding {
            return Err(ContainerError::BeanAlreadyExists(name.to_string()));
        }
        if state.aliases.remove(name).is_some() {
            tracing::debug!("Bean definition '{}' replaces an alias with the same name", name);
        }

        let previous = state.definitions.insert(name.to_string(), definition);
        match &previous {
            Some(old) => {
                tracing::info!(
                    "Overriding bean definition for bean '{}' (was class '{}')",
                    name,
                    old.class().name()
                );
            }
            None => state.names.push(name.to_string()),
        }
        Ok(previous)
    }

    pub fn remove(&self, name: &str) -> ContainerResult<BeanDefinition> {
        self.ensure_mutable(&format!("remove bean definition '{}'", name))?;
        let mut state = self.state.write();
        let removed = state
            .definitions
            .remove(name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))?;
        state.names.retain(|n| n != name);
        state.aliases.retain(|_, target| target != name);
        Ok(removed)
    }

    /// 修改定义，返回修改前的副本
    pub fn update<F>(&self, name: &str, action: &str, f: F) -> ContainerResult<BeanDefinition>
    where
        F: FnOnce(&mut BeanDefinition),
    {
        self.ensure_mutable(action)?;
        let mut state = self.state.write();
        let definition = state
            .definitions
            .get_mut(name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))?;
        let before = definition.clone();
        f(definition);
        Ok(before)
    }

    pub fn get(&self, name: &str) -> Option<BeanDefinition> {
        self.state.read().definitions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.read().definitions.contains_key(name)
    }

    /// 按注册顺序返回名称
    pub fn names(&self) -> Vec<String> {
        self.state.read().names.clone()
    }

    pub fn count(&self) -> usize {
        self.state.read().definitions.len()
    }

    /// 注册别名，拒绝形成环的别名
    pub fn register_alias(&self, name: &str, alias: &str) -> ContainerResult<()> {
        self.ensure_mutable(&format!("register alias '{}'", alias))?;
        let mut state = self.state.write();

        if alias == name {
            state.aliases.remove(alias);
            return Ok(());
        }
        if let Some(existing) = state.aliases.get(alias) {
            if existing == name {
                return Ok(());
            }
            if !self.allow_overriding {
                return Err(ContainerError::Other(anyhow!(
                    "Cannot register alias '{}' for name '{}': it is already registered for name '{}'",
                    alias,
                    name,
                    existing
                )));
            }
        }
        if state.definitions.contains_key(alias) {
            return Err(ContainerError::Other(anyhow!(
                "Cannot register alias '{}' for name '{}': a bean definition with that name exists",
                alias,
                name
            )));
        }
        if Self::chain_reaches(&state.aliases, name, alias) {
            return Err(ContainerError::CircularDependency(format!(
                "Cannot register alias '{}' for name '{}': circular reference - '{}' is a direct or indirect alias for '{}' already",
                alias, name, name, alias
            )));
        }

        tracing::trace!("Registered alias '{}' for bean '{}'", alias, name);
        state.aliases.insert(alias.to_string(), name.to_string());
        Ok(())
    }

    /// 从 `from` 出发沿别名链能否到达 `target`
    fn chain_reaches(aliases: &HashMap<String, String>, from: &str, target: &str) -> bool {
        let mut current = from;
        for _ in 0..=aliases.len() {
            match aliases.get(current) {
                Some(next) if next == target => return true,
                Some(next) => current = next,
                None => return false,
            }
        }
        false
    }

    fn resolve(aliases: &HashMap<String, String>, name: &str) -> String {
        let mut canonical = name.to_string();
        // 别名注册时已拒绝环，链长不会超过别名数量
        for _ in 0..=aliases.len() {
            match aliases.get(&canonical) {
                Some(target) => canonical = target.clone(),
                None => break,
            }
        }
        canonical
    }

    /// 沿别名链解析规范名称
    pub fn canonical_name(&self, name: &str) -> String {
        Self::resolve(&self.state.read().aliases, name)
    }

    /// 直接或间接指向 `name` 的所有别名
    pub fn aliases_of(&self, name: &str) -> Vec<String> {
        let state = self.state.read();
        let mut result: Vec<String> = state
            .aliases
            .keys()
            .filter(|alias| Self::resolve(&state.aliases, alias) == name)
            .cloned()
            .collect();
        result.sort();
        result
    }

    pub fn is_alias(&self, name: &str) -> bool {
        self.state.read().aliases.contains_key(name)
    }

    pub fn freeze(&self) {
        self.frozen.store(true, Ordering::SeqCst);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassDescriptor;

    struct Repo;

    fn definition() -> BeanDefinition {
        BeanDefinition::new(ClassDescriptor::builder::<Repo>().default_constructor(|| Repo).build())
    }

    #[test]
    fn test_registration_order_and_override() {
        let registry = DefinitionRegistry::new(true);
        assert!(registry.register("b", definition()).unwrap().is_none());
        assert!(registry.register("a", definition()).unwrap().is_none());
        assert!(registry.register("b", definition().prototype()).unwrap().is_some());

        assert_eq!(registry.names(), vec!["b", "a"]);
        assert!(registry.get("b").unwrap().is_prototype());
    }

    #[test]
    fn test_override_disabled() {
        let registry = DefinitionRegistry::new(false);
        registry.register("repo", definition()).unwrap();
        let err = registry.register("repo", definition()).unwrap_err();
        assert!(matches!(err, ContainerError::BeanAlreadyExists(_)));
    }

    #[test]
    fn test_alias_chain_and_cycle() {
        let registry = DefinitionRegistry::new(true);
        registry.register("dataSource", definition()).unwrap();
        registry.register_alias("dataSource", "ds").unwrap();
        registry.register_alias("ds", "primaryDs").unwrap();

        assert_eq!(registry.canonical_name("primaryDs"), "dataSource");
        assert_eq!(registry.aliases_of("dataSource"), vec!["ds", "primaryDs"]);
        assert!(registry.register_alias("primaryDs", "ds").unwrap_err().is_circular());
    }

    #[test]
    fn test_frozen_registry_rejects_changes() {
        let registry = DefinitionRegistry::new(true);
        registry.register("repo", definition()).unwrap();
        registry.freeze();

        let err = registry.register("other", definition()).unwrap_err();
        assert!(matches!(err, ContainerError::DefinitionFrozen(_)));
        assert!(registry.remove("repo").is_err());
        assert!(registry.update("repo", "set scope", |d| d.set_scope("prototype")).is_err());
        assert!(registry.contains("repo"));
    }
}
