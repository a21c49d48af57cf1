//! 连接点（JoinPoint）定义
//!
//! 连接点表示一次被拦截的方法调用

use std::fmt;
use std::time::Instant;

use beanstalk_core::{Method, ObjectRef, Value};
use once_cell::sync::OnceCell;

/// 连接点信息
///
/// 包含方法调用时的上下文信息：被调用的方法、实参、目标对象、代理对象和开始时间
pub struct JoinPoint {
    method: Method,
    args: Vec<Value>,
    target: ObjectRef,
    proxy: ObjectRef,
    started: Instant,
    signature: OnceCell<String>,
}

impl JoinPoint {
    pub fn new(method: Method, args: Vec<Value>, target: ObjectRef, proxy: ObjectRef) -> Self {
        Self {
            method,
            args,
            target,
            proxy,
            started: Instant::now(),
            signature: OnceCell::new(),
        }
    }

    /// 目标类上被调用的方法
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn method_name(&self) -> &str {
        self.method.name()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub(crate) fn set_args(&mut self, args: Vec<Value>) {
        self.args = args;
    }

    /// 目标对象
    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    /// 调用所经过的代理
    pub fn proxy(&self) -> &ObjectRef {
        &self.proxy
    }

    pub fn target_type(&self) -> &str {
        self.target.class_name()
    }

    /// 调用开始时间
    pub fn started(&self) -> Instant {
        self.started
    }

    /// 获取完整的方法签名，如 `UserService::find(int)`
    pub fn signature(&self) -> &str {
        self.signature.get_or_init(|| {
            let params: Vec<String> = self.method.params().iter().map(|p| p.to_string()).collect();
            format!("{}::{}({})", self.target.class_name(), self.method.name(), params.join(", "))
        })
    }
}

impl fmt::Debug for JoinPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JoinPoint")
            .field("signature", &self.signature())
            .field("args", &self.args)
            .field("target", &self.target)
            .field("started", &self.started)
            .finish()
    }
}

impl fmt::Display for JoinPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}
