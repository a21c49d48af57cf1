//! Bean 定义
//!
//! 描述如何构造、装配和销毁一个 Bean。定义本身不含名称，名称是注册表中的键。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::class::ClassDescriptor;
use crate::constants::{SCOPE_PROTOTYPE, SCOPE_SINGLETON};
use crate::value::Value;

/// 指向另一个 Bean 的符号引用，在构造或属性填充时才解析
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BeanReference {
    name: String,
}

impl BeanReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 构造器参数或属性的值
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// 字面量，按声明类型转换
    Literal(String),
    /// Bean 引用
    Reference(BeanReference),
    /// 已经是运行期值
    Value(Value),
}

impl PropertyValue {
    pub fn literal(value: impl Into<String>) -> Self {
        PropertyValue::Literal(value.into())
    }

    pub fn reference(name: impl Into<String>) -> Self {
        PropertyValue::Reference(BeanReference::new(name))
    }

    pub fn value(value: impl Into<Value>) -> Self {
        PropertyValue::Value(value.into())
    }

    pub fn as_reference(&self) -> Option<&BeanReference> {
        match self {
            PropertyValue::Reference(r) => Some(r),
            _ => None,
        }
    }
}

/// 属性规格：属性名加值
#[derive(Debug, Clone)]
pub struct PropertySpec {
    pub name: String,
    pub value: PropertyValue,
}

/// 未显式指定的对象属性的自动装配方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutowireMode {
    #[default]
    No,
    ByName,
    ByType,
}

/// Bean 定义
#[derive(Clone)]
pub struct BeanDefinition {
    class: Arc<ClassDescriptor>,
    scope: String,
    constructor_args: Vec<PropertyValue>,
    properties: Vec<PropertySpec>,
    init_method: Option<String>,
    destroy_method: Option<String>,
    attributes: HashMap<String, String>,
    lazy_init: bool,
    depends_on: Vec<String>,
    primary: bool,
    autowire_candidate: bool,
    autowire: AutowireMode,
    description: Option<String>,
}

impl BeanDefinition {
    /// 创建新的 Bean 定义，默认单例作用域
    pub fn new(class: Arc<ClassDescriptor>) -> Self {
        Self {
            class,
            scope: SCOPE_SINGLETON.to_string(),
            constructor_args: Vec::new(),
            properties: Vec::new(),
            init_method: None,
            destroy_method: None,
            attributes: HashMap::new(),
            lazy_init: false,
            depends_on: Vec::new(),
            primary: false,
            autowire_candidate: true,
            autowire: AutowireMode::No,
            description: None,
        }
    }

    /// 设置作用域名称
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn prototype(self) -> Self {
        self.with_scope(SCOPE_PROTOTYPE)
    }

    /// 追加构造器参数，按添加顺序对应参数位置
    pub fn with_constructor_arg(mut self, value: PropertyValue) -> Self {
        self.constructor_args.push(value);
        self
    }

    pub fn with_constructor_ref(self, bean_name: impl Into<String>) -> Self {
        self.with_constructor_arg(PropertyValue::reference(bean_name))
    }

    pub fn with_constructor_literal(self, literal: impl Into<String>) -> Self {
        self.with_constructor_arg(PropertyValue::literal(literal))
    }

    /// 追加属性规格，按添加顺序应用
    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.push(PropertySpec {
            name: name.into(),
            value,
        });
        self
    }

    pub fn with_property_ref(self, name: impl Into<String>, bean_name: impl Into<String>) -> Self {
        self.with_property(name, PropertyValue::reference(bean_name))
    }

    pub fn with_property_literal(self, name: impl Into<String>, literal: impl Into<String>) -> Self {
        self.with_property(name, PropertyValue::literal(literal))
    }

    pub fn with_property_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_property(name, PropertyValue::value(value))
    }

    /// 设置初始化方法名
    pub fn with_init_method(mut self, method: impl Into<String>) -> Self {
        self.init_method = Some(method.into());
        self
    }

    /// 设置销毁方法名
    pub fn with_destroy_method(mut self, method: impl Into<String>) -> Self {
        self.destroy_method = Some(method.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// 设置延迟初始化（仅对单例有效）
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy_init = lazy;
        self
    }

    /// 在本 Bean 之前必须初始化的 Bean
    pub fn with_depends_on(mut self, names: Vec<String>) -> Self {
        self.depends_on = names;
        self
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_autowire_candidate(mut self, candidate: bool) -> Self {
        self.autowire_candidate = candidate;
        self
    }

    pub fn with_autowire(mut self, mode: AutowireMode) -> Self {
        self.autowire = mode;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn class(&self) -> &Arc<ClassDescriptor> {
        &self.class
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn is_singleton(&self) -> bool {
        self.scope == SCOPE_SINGLETON
    }

    pub fn is_prototype(&self) -> bool {
        self.scope == SCOPE_PROTOTYPE
    }

    pub fn constructor_args(&self) -> &[PropertyValue] {
        &self.constructor_args
    }

    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    pub fn init_method(&self) -> Option<&str> {
        self.init_method.as_deref()
    }

    pub fn destroy_method(&self) -> Option<&str> {
        self.destroy_method.as_deref()
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn is_lazy_init(&self) -> bool {
        self.lazy_init
    }

    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_autowire_candidate(&self) -> bool {
        self.autowire_candidate
    }

    pub fn autowire(&self) -> AutowireMode {
        self.autowire
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// 构造器参数中引用的 Bean 名称
    pub fn constructor_references(&self) -> impl Iterator<Item = &str> {
        self.constructor_args
            .iter()
            .filter_map(|arg| arg.as_reference().map(BeanReference::name))
    }

    pub(crate) fn set_scope(&mut self, scope: impl Into<String>) {
        self.scope = scope.into();
    }

    pub(crate) fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("class", &self.class.name())
            .field("scope", &self.scope)
            .field("constructor_args", &self.constructor_args)
            .field("properties", &self.properties)
            .field("init_method", &self.init_method)
            .field("destroy_method", &self.destroy_method)
            .field("lazy_init", &self.lazy_init)
            .field("depends_on", &self.depends_on)
            .field("primary", &self.primary)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    #[test]
    fn test_definition_builder() {
        let class = ClassDescriptor::builder::<Plain>()
            .default_constructor(|| Plain)
            .build();
        let def = BeanDefinition::new(class)
            .prototype()
            .with_constructor_ref("repo")
            .with_constructor_literal("8080")
            .with_property_ref("cache", "cacheManager")
            .with_property_literal("timeout", "30")
            .with_init_method("start")
            .with_destroy_method("stop")
            .with_attribute("owner", "billing")
            .with_depends_on(vec!["migrations".to_string()]);

        assert!(def.is_prototype());
        assert!(!def.is_singleton());
        assert_eq!(def.constructor_args().len(), 2);
        assert_eq!(def.constructor_references().collect::<Vec<_>>(), vec!["repo"]);
        assert_eq!(def.properties()[0].name, "cache");
        assert!(def.has_property("timeout"));
        assert_eq!(def.init_method(), Some("start"));
        assert_eq!(def.destroy_method(), Some("stop"));
        assert_eq!(def.attribute("owner"), Some("billing"));
        assert_eq!(def.depends_on(), ["migrations".to_string()]);
        assert!(def.is_autowire_candidate());
    }
}
