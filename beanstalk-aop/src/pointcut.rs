//! 切点（Pointcut）表达式系统
//!
//! 切点由类过滤器和方法匹配器组成。匹配规则：
//! - 类过滤器先作用于目标类，不匹配时再依次尝试目标类实现的契约
//! - 方法匹配器先作用于目标类上的方法，不匹配时尝试契约上同签名的方法
//! - 两者都匹配（经由任一途径）才算命中
//!
//! 表达式语法：
//!
//! ```text
//! execution([返回类型] [类型.]方法(参数))   参数：(..) 任意，() 无参，(str, *) 逐个匹配
//! within(类型)
//! a && b,  a || b,  !a,  (a)
//! ```
//!
//! 名称中的 `*` 匹配任意字符序列。

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use beanstalk_core::{ClassDescriptor, Method, TypeInfo, ValueType};
use regex::Regex;

use crate::error::PointcutParseError;

/// 类过滤器
pub trait ClassFilter: Send + Sync {
    fn matches_type(&self, ty: &TypeInfo) -> bool;
}

/// 方法匹配器
pub trait MethodMatcher: Send + Sync {
    /// `target` 是方法所在的类或契约
    fn matches_method(&self, method: &Method, target: &TypeInfo) -> bool;
}

/// 切点 Trait
pub trait Pointcut: Send + Sync + fmt::Debug {
    fn class_filter(&self) -> &dyn ClassFilter;

    fn method_matcher(&self) -> &dyn MethodMatcher;
}

/// 类过滤器是否匹配目标类或它实现的任一契约
pub fn matches_class(pointcut: &dyn Pointcut, class: &ClassDescriptor) -> bool {
    let filter = pointcut.class_filter();
    filter.matches_type(class.info())
        || class
            .all_contracts()
            .iter()
            .any(|contract| filter.matches_type(contract.info()))
}

/// 切点是否命中 `class` 上的 `method`
pub fn matches(pointcut: &dyn Pointcut, method: &Method, class: &ClassDescriptor) -> bool {
    if !matches_class(pointcut, class) {
        return false;
    }
    let matcher = pointcut.method_matcher();
    if matcher.matches_method(method, class.info()) {
        return true;
    }
    class.all_contracts().iter().any(|contract| {
        contract
            .find_method(method)
            .map(|declared| matcher.matches_method(declared, contract.info()))
            .unwrap_or(false)
    })
}

/// 通配符名称模式
#[derive(Clone, PartialEq, Eq)]
pub struct NamePattern {
    source: String,
}

impl NamePattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            source: pattern.into(),
        }
    }

    pub fn any() -> Self {
        Self::new("*")
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// 支持的模式：
    /// - `*` - 匹配任意字符串
    /// - `User*` - 以 User 开头
    /// - `*Service` - 以 Service 结尾
    /// - `*Service*` - 包含 Service
    pub fn matches(&self, text: &str) -> bool {
        if self.source == "*" {
            return true;
        }
        if !self.source.contains('*') {
            return self.source == text;
        }
        wildcard_match(self.source.as_bytes(), text.as_bytes())
    }
}

fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&b| b == b'*')
}

impl fmt::Display for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Debug for NamePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// 参数列表模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamPattern {
    /// `(..)`
    Any,
    /// `()`
    Empty,
    /// `(str, *, User)`，按位置匹配参数类型名
    List(Vec<NamePattern>),
}

impl ParamPattern {
    pub fn matches(&self, params: &[ValueType]) -> bool {
        match self {
            ParamPattern::Any => true,
            ParamPattern::Empty => params.is_empty(),
            ParamPattern::List(patterns) => {
                patterns.len() == params.len()
                    && patterns
                        .iter()
                        .zip(params)
                        .all(|(pattern, param)| pattern.matches(&param.to_string()))
            }
        }
    }
}

impl fmt::Display for ParamPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamPattern::Any => f.write_str(".."),
            ParamPattern::Empty => Ok(()),
            ParamPattern::List(patterns) => {
                let names: Vec<&str> = patterns.iter().map(NamePattern::as_str).collect();
                f.write_str(&names.join(", "))
            }
        }
    }
}

/// 自定义匹配函数
pub type MatchFn = Arc<dyn Fn(&Method, &TypeInfo) -> bool + Send + Sync>;

/// 切点表达式
#[derive(Clone)]
pub enum PointcutExpression {
    /// 匹配所有方法
    All,

    /// 匹配特定类型的所有方法，即 `within(UserService)`
    TypePattern(NamePattern),

    /// 匹配特定方法名
    MethodPattern(NamePattern),

    /// 匹配特定类型的特定方法，即 `execution(* UserService.get_user(..))`
    Execution {
        type_pattern: NamePattern,
        method_pattern: NamePattern,
        params: ParamPattern,
    },

    /// 使用正则表达式匹配类型
    TypeRegex(Regex),

    /// 使用正则表达式匹配方法
    MethodRegex(Regex),

    /// 自定义匹配函数
    Custom(MatchFn),

    /// 与运算（AND）
    And(Box<PointcutExpression>, Box<PointcutExpression>),

    /// 或运算（OR）
    Or(Box<PointcutExpression>, Box<PointcutExpression>),

    /// 非运算（NOT）
    Not(Box<PointcutExpression>),
}

impl PointcutExpression {
    /// 解析表达式
    pub fn parse(expression: &str) -> Result<Self, PointcutParseError> {
        Parser::new(expression).parse()
    }

    /// 解析 execution 签名，如 `* UserService.get_user(..)`
    pub fn execution(signature: &str) -> Result<Self, PointcutParseError> {
        parse_execution(signature)
    }

    pub fn within(type_pattern: &str) -> Self {
        PointcutExpression::TypePattern(NamePattern::new(type_pattern))
    }

    pub fn method(method_pattern: &str) -> Self {
        PointcutExpression::MethodPattern(NamePattern::new(method_pattern))
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Method, &TypeInfo) -> bool + Send + Sync + 'static,
    {
        PointcutExpression::Custom(Arc::new(f))
    }

    /// 与运算
    pub fn and(self, other: PointcutExpression) -> Self {
        PointcutExpression::And(Box::new(self), Box::new(other))
    }

    /// 或运算
    pub fn or(self, other: PointcutExpression) -> Self {
        PointcutExpression::Or(Box::new(self), Box::new(other))
    }

    /// 非运算
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        PointcutExpression::Not(Box::new(self))
    }
}

impl ClassFilter for PointcutExpression {
    /// 只依据类型判断是否可能命中；无法只靠类型判断的部分视为可能命中
    fn matches_type(&self, ty: &TypeInfo) -> bool {
        match self {
            PointcutExpression::TypePattern(pattern) => pattern.matches(ty.name()),
            PointcutExpression::Execution { type_pattern, .. } => type_pattern.matches(ty.name()),
            PointcutExpression::TypeRegex(regex) => regex.is_match(ty.name()),
            PointcutExpression::And(left, right) => left.matches_type(ty) && right.matches_type(ty),
            PointcutExpression::Or(left, right) => left.matches_type(ty) || right.matches_type(ty),
            PointcutExpression::All
            | PointcutExpression::MethodPattern(_)
            | PointcutExpression::MethodRegex(_)
            | PointcutExpression::Custom(_)
            | PointcutExpression::Not(_) => true,
        }
    }
}

impl MethodMatcher for PointcutExpression {
    fn matches_method(&self, method: &Method, target: &TypeInfo) -> bool {
        match self {
            PointcutExpression::All => true,
            PointcutExpression::TypePattern(pattern) => pattern.matches(target.name()),
            PointcutExpression::MethodPattern(pattern) => pattern.matches(method.name()),
            PointcutExpression::Execution {
                type_pattern,
                method_pattern,
                params,
            } => {
                type_pattern.matches(target.name())
                    && method_pattern.matches(method.name())
                    && params.matches(method.params())
            }
            PointcutExpression::TypeRegex(regex) => regex.is_match(target.name()),
            PointcutExpression::MethodRegex(regex) => regex.is_match(method.name()),
            PointcutExpression::Custom(func) => func(method, target),
            PointcutExpression::And(left, right) => {
                left.matches_method(method, target) && right.matches_method(method, target)
            }
            PointcutExpression::Or(left, right) => {
                left.matches_method(method, target) || right.matches_method(method, target)
            }
            PointcutExpression::Not(expr) => !expr.matches_method(method, target),
        }
    }
}

impl Pointcut for PointcutExpression {
    fn class_filter(&self) -> &dyn ClassFilter {
        self
    }

    fn method_matcher(&self) -> &dyn MethodMatcher {
        self
    }
}

impl FromStr for PointcutExpression {
    type Err = PointcutParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for PointcutExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointcutExpression::All => write!(f, "All"),
            PointcutExpression::TypePattern(p) => write!(f, "TypePattern({})", p),
            PointcutExpression::MethodPattern(p) => write!(f, "MethodPattern({})", p),
            PointcutExpression::Execution {
                type_pattern,
                method_pattern,
                params,
            } => write!(f, "Execution({}.{}({}))", type_pattern, method_pattern, params),
            PointcutExpression::TypeRegex(r) => write!(f, "TypeRegex({})", r.as_str()),
            PointcutExpression::MethodRegex(r) => write!(f, "MethodRegex({})", r.as_str()),
            PointcutExpression::Custom(_) => write!(f, "Custom(...)"),
            PointcutExpression::And(l, r) => write!(f, "And({:?}, {:?})", l, r),
            PointcutExpression::Or(l, r) => write!(f, "Or({:?}, {:?})", l, r),
            PointcutExpression::Not(e) => write!(f, "Not({:?})", e),
        }
    }
}

/// 由表达式字符串构建的切点，保留原始文本用于日志
#[derive(Debug, Clone)]
pub struct ExpressionPointcut {
    source: String,
    expression: PointcutExpression,
}

impl ExpressionPointcut {
    pub fn parse(source: &str) -> Result<Self, PointcutParseError> {
        Ok(Self {
            source: source.trim().to_string(),
            expression: PointcutExpression::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expression(&self) -> &PointcutExpression {
        &self.expression
    }
}

impl Pointcut for ExpressionPointcut {
    fn class_filter(&self) -> &dyn ClassFilter {
        &self.expression
    }

    fn method_matcher(&self) -> &dyn MethodMatcher {
        &self.expression
    }
}

impl fmt::Display for ExpressionPointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// 按方法名匹配，不限制类
#[derive(Debug, Clone, Default)]
pub struct NameMatchMethodPointcut {
    names: Vec<NamePattern>,
}

impl NameMatchMethodPointcut {
    pub fn new(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|name| NamePattern::new(*name)).collect(),
        }
    }

    pub fn add_method_name(mut self, name: &str) -> Self {
        self.names.push(NamePattern::new(name));
        self
    }
}

impl ClassFilter for NameMatchMethodPointcut {
    fn matches_type(&self, _ty: &TypeInfo) -> bool {
        true
    }
}

impl MethodMatcher for NameMatchMethodPointcut {
    fn matches_method(&self, method: &Method, _target: &TypeInfo) -> bool {
        self.names.iter().any(|name| name.matches(method.name()))
    }
}

impl Pointcut for NameMatchMethodPointcut {
    fn class_filter(&self) -> &dyn ClassFilter {
        self
    }

    fn method_matcher(&self) -> &dyn MethodMatcher {
        self
    }
}

/// 匹配所有类的所有方法
#[derive(Debug, Clone, Copy, Default)]
pub struct TruePointcut;

impl ClassFilter for TruePointcut {
    fn matches_type(&self, _ty: &TypeInfo) -> bool {
        true
    }
}

impl MethodMatcher for TruePointcut {
    fn matches_method(&self, _method: &Method, _target: &TypeInfo) -> bool {
        true
    }
}

impl Pointcut for TruePointcut {
    fn class_filter(&self) -> &dyn ClassFilter {
        self
    }

    fn method_matcher(&self) -> &dyn MethodMatcher {
        self
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn parse(mut self) -> Result<PointcutExpression, PointcutParseError> {
        if self.source.trim().is_empty() {
            return Err(PointcutParseError::Empty);
        }
        let expression = self.parse_or()?;
        self.skip_whitespace();
        if self.pos < self.source.len() {
            return Err(self.unexpected());
        }
        Ok(expression)
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> PointcutParseError {
        match self.rest().chars().next() {
            Some(c) => PointcutParseError::UnexpectedToken {
                expression: self.source.to_string(),
                token: c.to_string(),
                position: self.pos,
            },
            None => PointcutParseError::UnexpectedEnd(self.source.to_string()),
        }
    }

    fn parse_or(&mut self) -> Result<PointcutExpression, PointcutParseError> {
        let mut left = self.parse_and()?;
        while self.eat("||") {
            left = left.or(self.parse_and()?);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<PointcutExpression, PointcutParseError> {
        let mut left = self.parse_unary()?;
        while self.eat("&&") {
            left = left.and(self.parse_unary()?);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<PointcutExpression, PointcutParseError> {
        if self.eat("!") {
            return Ok(self.parse_unary()?.not());
        }
        if self.eat("(") {
            let inner = self.parse_or()?;
            if !self.eat(")") {
                return Err(self.unexpected());
            }
            return Ok(inner);
        }
        self.parse_designator()
    }

    fn parse_designator(&mut self) -> Result<PointcutExpression, PointcutParseError> {
        self.skip_whitespace();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.unexpected());
        }
        let designator = &rest[..len];
        self.pos += len;
        if !self.eat("(") {
            return Err(match designator {
                "execution" | "within" => self.unexpected(),
                other => PointcutParseError::UnknownDesignator(other.to_string()),
            });
        }
        let body = self.take_balanced()?;
        match designator {
            "execution" => parse_execution(body),
            "within" => Ok(PointcutExpression::TypePattern(parse_name(body.trim())?)),
            other => Err(PointcutParseError::UnknownDesignator(other.to_string())),
        }
    }

    /// 读取到与已消费的 `(` 配对的 `)` 为止
    fn take_balanced(&mut self) -> Result<&'a str, PointcutParseError> {
        let start = self.pos;
        let mut depth = 1usize;
        for (offset, c) in self.rest().char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = start + offset + 1;
                        return Ok(&self.source[start..start + offset]);
                    }
                }
                _ => {}
            }
        }
        Err(PointcutParseError::UnexpectedEnd(self.source.to_string()))
    }
}

fn parse_name(pattern: &str) -> Result<NamePattern, PointcutParseError> {
    if pattern.is_empty() {
        return Err(PointcutParseError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: "pattern is empty".to_string(),
        });
    }
    if let Some(c) = pattern
        .chars()
        .find(|c| !(c.is_alphanumeric() || *c == '_' || *c == '*'))
    {
        return Err(PointcutParseError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: format!("unexpected character '{}'", c),
        });
    }
    Ok(NamePattern::new(pattern))
}

fn parse_execution(signature: &str) -> Result<PointcutExpression, PointcutParseError> {
    let signature = signature.trim();
    let malformed = || PointcutParseError::MalformedSignature(signature.to_string());

    let open = signature.find('(').ok_or_else(malformed)?;
    if !signature.ends_with(')') {
        return Err(malformed());
    }
    // 方法名必须紧贴参数列表
    let head = &signature[..open];
    if head.trim().is_empty() || head.ends_with(char::is_whitespace) {
        return Err(malformed());
    }
    let params = signature[open + 1..signature.len() - 1].trim();

    // 返回类型不参与方法身份，只校验格式
    let parts: Vec<&str> = head.split_whitespace().collect();
    let qualified = match parts.as_slice() {
        [qualified] => *qualified,
        [_return_type, qualified] => *qualified,
        _ => return Err(malformed()),
    };

    let (type_pattern, method_pattern) = match qualified
        .rsplit_once("::")
        .or_else(|| qualified.rsplit_once('.'))
    {
        Some((ty, method)) => (parse_name(ty)?, parse_name(method)?),
        None => (NamePattern::any(), parse_name(qualified)?),
    };

    let params = match params {
        ".." => ParamPattern::Any,
        "" => ParamPattern::Empty,
        list => {
            let patterns = list
                .split(',')
                .map(|p| match p.trim() {
                    "" | ".." => Err(malformed()),
                    name => parse_name(name),
                })
                .collect::<Result<Vec<_>, _>>()?;
            ParamPattern::List(patterns)
        }
    };

    Ok(PointcutExpression::Execution {
        type_pattern,
        method_pattern,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanstalk_core::{ContractDescriptor, Value};

    struct UserService;
    struct OrderRepository;
    trait Finder: Send + Sync {}

    impl Finder for UserService {}

    fn method<T: 'static>(name: &str, params: Vec<ValueType>) -> Method {
        Method::new(TypeInfo::of::<T>(), name, params)
    }

    fn check(expression: &str, name: &str, params: Vec<ValueType>) -> bool {
        let expr = PointcutExpression::parse(expression).unwrap();
        expr.matches_method(&method::<UserService>(name, params), &TypeInfo::of::<UserService>())
    }

    #[test]
    fn test_wildcards() {
        assert!(NamePattern::new("*").matches("anything"));
        assert!(NamePattern::new("User*").matches("UserService"));
        assert!(NamePattern::new("*Service").matches("UserService"));
        assert!(NamePattern::new("*ser*").matches("UserService"));
        assert!(NamePattern::new("U*r*e").matches("UserService"));
        assert!(!NamePattern::new("User*").matches("OrderService"));
        assert!(!NamePattern::new("find").matches("find_all"));
        assert!(NamePattern::new("a.b").matches("a.b"));
        assert!(!NamePattern::new("a.b").matches("axb"));
    }

    #[test]
    fn test_execution() {
        assert!(check("execution(* UserService.find*(..))", "find_by_id", vec![ValueType::Int]));
        assert!(!check("execution(* UserService.find*(..))", "save", vec![]));
        assert!(check("execution(* *Service.*(..))", "save", vec![]));
        assert!(!check("execution(* Order*.*(..))", "save", vec![]));
        assert!(check("execution(save())", "save", vec![]));
        assert!(!check("execution(save())", "save", vec![ValueType::Str]));
        assert!(check("execution(* UserService::save(str, *))", "save", vec![ValueType::Str, ValueType::Int]));
        assert!(!check("execution(* save(str, *))", "save", vec![ValueType::Str]));
        assert!(check(
            "execution(* save(User*))",
            "save",
            vec![ValueType::object::<UserService>()]
        ));
    }

    #[test]
    fn test_boolean_operators() {
        assert!(check("within(User*) && execution(* find(..))", "find", vec![]));
        assert!(!check("within(User*) && !execution(* find(..))", "find", vec![]));
        assert!(check("within(Order*) || execution(* find(..))", "find", vec![]));
        assert!(check("!(within(Order*) || execution(* save(..)))", "find", vec![]));
        assert!(!check("!within(UserService)", "find", vec![]));
    }

    #[test]
    fn test_class_filter_is_conservative() {
        let expr = PointcutExpression::parse("within(User*) && !execution(* find(..))").unwrap();
        assert!(expr.matches_type(&TypeInfo::of::<UserService>()));
        assert!(!expr.matches_type(&TypeInfo::of::<OrderRepository>()));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(PointcutExpression::parse("  "), Err(PointcutParseError::Empty)));
        assert!(matches!(
            PointcutExpression::parse("target(Foo)"),
            Err(PointcutParseError::UnknownDesignator(ref d)) if d == "target"
        ));
        assert!(matches!(
            PointcutExpression::parse("execution(* find(..)"),
            Err(PointcutParseError::UnexpectedEnd(_))
        ));
        assert!(matches!(
            PointcutExpression::parse("execution(* a b c())"),
            Err(PointcutParseError::MalformedSignature(_))
        ));
        assert!(matches!(
            PointcutExpression::parse("execution(* (..))"),
            Err(PointcutParseError::MalformedSignature(_))
        ));
        assert!(matches!(
            PointcutExpression::parse("execution((..))"),
            Err(PointcutParseError::MalformedSignature(_))
        ));
        assert!(matches!(
            PointcutExpression::parse("execution(* User.(..))"),
            Err(PointcutParseError::InvalidPattern { .. })
        ));
        assert!(matches!(
            PointcutExpression::parse("within(User) &&"),
            Err(PointcutParseError::UnexpectedEnd(_))
        ));
        assert!(matches!(
            PointcutExpression::parse("within(User) within(Order)"),
            Err(PointcutParseError::UnexpectedToken { position: 13, .. })
        ));
        assert!(matches!(
            PointcutExpression::parse("within(a-b)"),
            Err(PointcutParseError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_contract_fallback() {
        let finder = ContractDescriptor::builder::<dyn Finder>()
            .method("find", &[ValueType::Int])
            .build();
        let class = beanstalk_core::ClassDescriptor::builder::<UserService>()
            .method("find", &[ValueType::Int], |_: &UserService, _| Ok(Value::Unit))
            .method("save", &[], |_: &UserService, _| Ok(Value::Unit))
            .implements::<dyn Finder, _>(&finder, |s| s as Arc<dyn Finder>)
            .build();

        let pointcut = ExpressionPointcut::parse("execution(* Finder.*(..))").unwrap();
        let find = &class.methods()[0].method;
        let save = &class.methods()[1].method;
        assert!(matches_class(&pointcut, &class));
        assert!(matches(&pointcut, find, &class));
        assert!(!matches(&pointcut, save, &class));
        assert_eq!(pointcut.to_string(), "execution(* Finder.*(..))");
    }

    #[test]
    fn test_programmatic_pointcuts() {
        let find = method::<UserService>("find_all", vec![]);
        let user = TypeInfo::of::<UserService>();
        assert!(NameMatchMethodPointcut::new(&["find*"]).matches_method(&find, &user));
        assert!(!NameMatchMethodPointcut::new(&["save"]).matches_method(&find, &user));
        assert!(TruePointcut.matches_method(&find, &user));

        let regex = PointcutExpression::MethodRegex(Regex::new("^find_").unwrap())
            .and(PointcutExpression::custom(|m, _| m.params().is_empty()));
        assert!(regex.matches_method(&find, &user));
        assert!(PointcutExpression::within("User*").matches_method(&find, &user));
        assert!(PointcutExpression::method("find_all").matches_method(&find, &user));
        assert!(PointcutExpression::execution("* UserService.find_all()").unwrap().matches_method(&find, &user));
    }
}
