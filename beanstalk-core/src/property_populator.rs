//! 属性填充
//!
//! 按注册顺序应用属性规格。字面量转换为属性声明的类型，Bean 引用通过容器解析，
//! 写入时优先使用 setter，没有 setter 时直接写字段。

use anyhow::anyhow;

use crate::bean::{AutowireMode, BeanDefinition, PropertyValue};
use crate::class::PropertyDescriptor;
use crate::container::Container;
use crate::error::{ContainerError, ContainerResult};
use crate::object::ObjectRef;
use crate::value::{Value, ValueType};

pub(crate) struct PropertyPopulator<'c> {
    container: &'c Container,
}

impl<'c> PropertyPopulator<'c> {
    pub(crate) fn new(container: &'c Container) -> Self {
        Self { container }
    }

    pub(crate) fn populate(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        bean: &ObjectRef,
    ) -> ContainerResult<()> {
        if definition.autowire() != AutowireMode::No {
            self.autowire_properties(bean_name, definition, bean)?;
        }

        let class = bean.class();
        for spec in definition.properties() {
            let descriptor = class.property(&spec.name).ok_or_else(|| {
                ContainerError::Other(anyhow!(
                    "Invalid property '{}' of bean class [{}]: no such property",
                    spec.name,
                    class.name()
                ))
            })?;
            let value = self.resolve_value(bean_name, descriptor, &spec.value)?;
            tracing::trace!("Applying property '{}' to bean '{}'", spec.name, bean_name);
            Self::assign(bean, descriptor, value)?;
        }
        Ok(())
    }

    fn resolve_value(
        &self,
        bean_name: &str,
        descriptor: &PropertyDescriptor,
        value: &PropertyValue,
    ) -> ContainerResult<Value> {
        let raw = match value {
            PropertyValue::Literal(literal) => Value::Str(literal.clone()),
            PropertyValue::Value(value) => value.clone(),
            PropertyValue::Reference(reference) => {
                Value::Object(self.container.resolve_reference(bean_name, reference)?)
            }
        };
        self.container
            .type_converter()
            .convert(raw, &descriptor.ty)
            .map_err(|e| ContainerError::TypeMismatch {
                target: format!("property '{}' of bean '{}'", descriptor.name, bean_name),
                expected: e.expected,
                found: e.found,
            })
    }

    fn assign(bean: &ObjectRef, descriptor: &PropertyDescriptor, value: Value) -> ContainerResult<()> {
        let writer = descriptor
            .setter
            .as_ref()
            .or(descriptor.field.as_ref())
            .ok_or_else(|| {
                ContainerError::Other(anyhow!(
                    "Property '{}' of bean class [{}] is not writable",
                    descriptor.name,
                    bean.class_name()
                ))
            })?;
        writer(bean, value).map_err(ContainerError::from_user)
    }

    /// 为未显式指定的对象属性自动装配
    fn autowire_properties(
        &self,
        bean_name: &str,
        definition: &BeanDefinition,
        bean: &ObjectRef,
    ) -> ContainerResult<()> {
        let class = bean.class();
        for descriptor in class.properties() {
            let ValueType::Object(ty) = &descriptor.ty else {
                continue;
            };
            if definition.has_property(&descriptor.name) || !descriptor.is_writable() {
                continue;
            }

            let candidate = match definition.autowire() {
                AutowireMode::ByName => {
                    let name = descriptor.name.as_str();
                    (name != bean_name && self.container.is_type_match(name, ty)).then(|| name.to_string())
                }
                AutowireMode::ByType => {
                    let candidates = self.container.autowire_candidates(ty, bean_name);
                    match candidates.len() {
                        0 => None,
                        1 => candidates.into_iter().next(),
                        _ => Some(self.container.primary_candidate(&candidates).ok_or_else(|| {
                            ContainerError::NoUniqueBean {
                                type_name: ty.name().to_string(),
                                candidates: candidates.clone(),
                            }
                        })?),
                    }
                }
                AutowireMode::No => None,
            };

            if let Some(dependency) = candidate {
                tracing::trace!(
                    "Autowiring property '{}' of bean '{}' with bean '{}'",
                    descriptor.name,
                    bean_name,
                    dependency
                );
                let object = self.container.fetch_dependency(bean_name, &dependency)?;
                Self::assign(bean, descriptor, Value::Object(object))?;
            }
        }
        Ok(())
    }
}
