//! 构造器解析
//!
//! 有显式参数时选第一个参数个数相同且每个位置都能转换的构造器；
//! 否则按参数个数从多到少尝试自动装配，所有参数都能解析的构造器才被接受，
//! 最后回退到无参构造器。

use std::sync::Arc;

use anyhow::anyhow;

use crate::bean::{BeanDefinition, PropertyValue};
use crate::class::{Args, ClassDescriptor, ConstructorDescriptor};
use crate::container::Container;
use crate::error::{ContainerError, ContainerResult};
use crate::object::ObjectRef;
use crate::value::{Value, ValueType};

pub(crate) struct ConstructorResolver<'c> {
    container: &'c Container,
}

impl<'c> ConstructorResolver<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self { container }
    }

    /// 选择构造器并创建原始实例
    pub(crate) fn instantiate(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        explicit_args: Option<&[Value]>,
    ) -> ContainerResult<ObjectRef> {
        let class = definition.class();
        if class.constructors().is_empty() {
            return Err(ContainerError::Other(anyhow!(
                "Class '{}' declares no constructors",
                class.name()
            )));
        }

        let (constructor, args) = match explicit_args {
            Some(args) if !args.is_empty() => self.select_explicit(class, args.to_vec())?,
            _ if !definition.constructor_args().is_empty() => {
                let values = self.resolve_definition_args(bean_name, definition)?;
                self.select_explicit(class, values)?
            }
            _ => self.autowire_constructor(bean_name, class)?,
        };

        tracing::trace!(
            "Instantiating bean '{}' with {}-argument constructor of '{}'",
            bean_name,
            constructor.arity(),
            class.name()
        );
        let instance = (constructor.instantiate)(Args::new(&args)).map_err(ContainerError::from_user)?;
        Ok(ObjectRef::new(instance, Arc::clone(class)))
    }

    fn resolve_definition_args(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
    ) -> ContainerResult<Vec<Value>> {
        definition
            .constructor_args()
            .iter()
            .map(|arg| match arg {
                PropertyValue::Literal(literal) => Ok(Value::Str(literal.clone())),
                PropertyValue::Value(value) => Ok(value.clone()),
                PropertyValue::Reference(reference) => self
                    .container
                    .resolve_reference(bean_name, reference)
                    .map(Value::Object),
            })
            .collect()
    }

    fn select_explicit<'a>(
        &self,
        class: &'a ClassDescriptor,
        values: Vec<Value>,
    ) -> ContainerResult<(&'a ConstructorDescriptor, Vec<Value>)> {
        let mut mismatch = None;
        for constructor in class.constructors().iter().filter(|c| c.arity() == values.len()) {
            match self.convert_all(class, constructor, &values) {
                Ok(converted) => return Ok((constructor, converted)),
                Err(e) => mismatch = Some(e),
            }
        }
        Err(mismatch.unwrap_or_else(|| {
            ContainerError::Other(anyhow!(
                "No constructor of '{}' accepts {} argument(s)",
                class.name(),
                values.len()
            ))
        }))
    }

    fn convert_all(
        &self,
        class: &ClassDescriptor,
        constructor: &ConstructorDescriptor,
        values: &[Value],
    ) -> ContainerResult<Vec<Value>> {
        let converter = self.container.type_converter();
        constructor
            .params
            .iter()
            .zip(values)
            .map(|(param, value)| {
                converter.convert(value.clone(), &param.ty).map_err(|e| ContainerError::TypeMismatch {
                    target: format!("constructor parameter '{}' of '{}'", param.name, class.name()),
                    expected: e.expected,
                    found: e.found,
                })
            })
            .collect()
    }

    fn autowire_constructor<'a>(
        &self,
        bean_name: &str,
        class: &'a ClassDescriptor,
    ) -> ContainerResult<(&'a ConstructorDescriptor, Vec<Value>)> {
        let mut candidates: Vec<&ConstructorDescriptor> = class
            .constructors()
            .iter()
            .filter(|c| c.arity() > 0)
            .collect();
        candidates.sort_by(|a, b| b.arity().cmp(&a.arity()));

        for constructor in candidates {
            if let Some(names) = self.dependency_names(bean_name, constructor) {
                let mut args = Vec::with_capacity(names.len());
                for name in &names {
                    args.push(Value::Object(self.container.fetch_dependency(bean_name, name)?));
                }
                return Ok((constructor, args));
            }
        }

        class
            .default_constructor()
            .map(|c| (c, Vec::new()))
            .ok_or_else(|| {
                ContainerError::Other(anyhow!(
                    "No default constructor found for '{}' and no constructor could be satisfied",
                    class.name()
                ))
            })
    }

    /// 每个参数都能解析为 Bean 名称时返回名称列表
    fn dependency_names(&self, bean_name: &str, constructor: &ConstructorDescriptor) -> Option<Vec<String>> {
        constructor
            .params
            .iter()
            .map(|param| match &param.ty {
                ValueType::Object(ty) => {
                    let resolved = self.container.resolve_dependency_name(bean_name, &param.name, ty);
                    if resolved.is_none() {
                        tracing::trace!(
                            "Parameter '{}' of type '{}' for bean '{}' is unresolvable",
                            param.name,
                            ty,
                            bean_name
                        );
                    }
                    resolved
                }
                _ => None,
            })
            .collect()
    }
}
