//! 值模型与类型转换
//!
//! 容器在构造器参数、属性和方法调用之间传递的统一值表示。
//! 标量以原生类型保存，对象以 [`ObjectRef`] 保存，
//! 字面量字符串在注入前由 [`TypeConverter`] 转换为声明的类型。

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::object::ObjectRef;
use crate::utils::naming;

/// 运行期类型标识
///
/// 相等性只比较 `TypeId`，名称仅用于日志、错误信息和命名约定。
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// 获取类型 `T` 的标识，`T` 可以是 `dyn Trait`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: naming::simple_type_name(std::any::type_name::<T>()),
        }
    }

    /// 使用自定义显示名称
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 参数、属性的声明类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Unit,
    Str,
    Int,
    Float,
    Bool,
    /// 某个类或契约的实例
    Object(TypeInfo),
    /// 接受任意值，不做转换
    Any,
}

impl ValueType {
    pub fn object<T: ?Sized + 'static>() -> Self {
        ValueType::Object(TypeInfo::of::<T>())
    }

    /// 标量类型无法通过自动装配解析
    pub fn is_simple(&self) -> bool {
        !matches!(self, ValueType::Object(_) | ValueType::Any)
    }

    pub fn object_type(&self) -> Option<&TypeInfo> {
        match self {
            ValueType::Object(info) => Some(info),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Unit => write!(f, "()"),
            ValueType::Str => write!(f, "str"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Object(info) => write!(f, "{}", info.name()),
            ValueType::Any => write!(f, "any"),
        }
    }
}

/// 运行期值
#[derive(Clone)]
pub enum Value {
    Unit,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Object(ObjectRef),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// 将对象值还原为具体类型
    pub fn downcast<T: std::any::Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.as_object().and_then(|obj| obj.downcast::<T>())
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// 值的种类描述，用于错误信息
    pub fn kind(&self) -> String {
        match self {
            Value::Unit => "()".to_string(),
            Value::Str(s) => format!("str \"{}\"", s),
            Value::Int(i) => format!("int {}", i),
            Value::Float(x) => format!("float {}", x),
            Value::Bool(b) => format!("bool {}", b),
            Value::Object(obj) => obj.class().name().to_string(),
        }
    }

    /// 不经转换即可作为 `ty` 使用
    pub fn conforms_to(&self, ty: &ValueType) -> bool {
        match (self, ty) {
            (_, ValueType::Any) => true,
            (Value::Unit, ValueType::Unit) => true,
            (Value::Str(_), ValueType::Str) => true,
            (Value::Int(_), ValueType::Int) => true,
            (Value::Float(_), ValueType::Float) => true,
            (Value::Bool(_), ValueType::Bool) => true,
            (Value::Object(obj), ValueType::Object(info)) => obj.is_instance_of(info),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => ObjectRef::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "Unit"),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Object(obj) => write!(f, "Object({:?})", obj),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Str(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

/// 转换失败
#[derive(Debug, Clone, thiserror::Error)]
#[error("cannot convert {found} to {expected}")]
pub struct ConversionError {
    pub expected: String,
    pub found: String,
}

impl ConversionError {
    fn new(value: &Value, target: &ValueType) -> Self {
        Self {
            expected: target.to_string(),
            found: value.kind(),
        }
    }
}

/// 类型转换器
///
/// 把字面量或已解析的值转换为参数、属性声明的类型。
pub trait TypeConverter: Send + Sync {
    fn convert(&self, value: Value, target: &ValueType) -> Result<Value, ConversionError>;
}

/// 默认类型转换器
///
/// - 字符串可转换为整数、浮点数和布尔值（`true/yes/1`、`false/no/0`）
/// - 整数可拓宽为浮点数，小数部分为零的浮点数可收窄为整数
/// - 标量可转换为字符串
/// - 对象只做可赋值性检查
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTypeConverter;

impl DefaultTypeConverter {
    fn parse_bool(s: &str) -> Option<bool> {
        match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl TypeConverter for DefaultTypeConverter {
    fn convert(&self, value: Value, target: &ValueType) -> Result<Value, ConversionError> {
        if value.conforms_to(target) {
            return Ok(value);
        }

        let converted = match (&value, target) {
            (Value::Str(s), ValueType::Int) => s.trim().parse::<i64>().ok().map(Value::Int),
            (Value::Str(s), ValueType::Float) => s.trim().parse::<f64>().ok().map(Value::Float),
            (Value::Str(s), ValueType::Bool) => Self::parse_bool(s).map(Value::Bool),
            (Value::Int(i), ValueType::Float) => Some(Value::Float(*i as f64)),
            (Value::Float(x), ValueType::Int) if x.fract() == 0.0 => Some(Value::Int(*x as i64)),
            (Value::Int(i), ValueType::Str) => Some(Value::Str(i.to_string())),
            (Value::Float(x), ValueType::Str) => Some(Value::Str(x.to_string())),
            (Value::Bool(b), ValueType::Str) => Some(Value::Str(b.to_string())),
            _ => None,
        };

        converted.ok_or_else(|| ConversionError::new(&value, target))
    }
}
