use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;

use beanstalk_aop::prelude::*;
use beanstalk_core::prelude::*;
use parking_lot::Mutex;

// ==================== 契约 ====================

/// 下单接口，代理以它的形式对外暴露
trait OrderApi: Send + Sync {
    fn place_order(&self, item: &str, quantity: i64) -> anyhow::Result<String>;
}

/// 接口代理上的契约实现，调用经过拦截链
struct OrderApiDelegate(ObjectRef);

impl OrderApi for OrderApiDelegate {
    fn place_order(&self, item: &str, quantity: i64) -> anyhow::Result<String> {
        let value = self
            .0
            .invoke("place_order", &[Value::from(item), Value::Int(quantity)])?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("place_order returned {}", value.kind()))
    }
}

fn order_api_contract() -> Arc<ContractDescriptor> {
    ContractDescriptor::builder::<dyn OrderApi>()
        .method("place_order", &[ValueType::Str, ValueType::Int])
        .delegate(|proxy| Arc::new(OrderApiDelegate(proxy)) as Arc<dyn OrderApi>)
        .build()
}

// ==================== 业务对象 ====================

/// 订单仓库 - 普通单例，带销毁回调
struct OrderRepository {
    rows: Mutex<Vec<String>>,
}

fn order_repository_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<OrderRepository>()
        .default_constructor(|| OrderRepository {
            rows: Mutex::new(Vec::new()),
        })
        .method("save", &[ValueType::Str], |r: &OrderRepository, args| {
            r.rows.lock().push(args.str(0)?.to_string());
            Ok(Value::Unit)
        })
        .method("count", &[], |r: &OrderRepository, _| Ok(Value::Int(r.rows.lock().len() as i64)))
        .on_destroy(|r: &OrderRepository| {
            println!("👋 OrderRepository closing with {} row(s)", r.rows.lock().len());
            Ok(())
        })
        .build()
}

/// 发票号 - 原型，每次获取都是新实例
struct InvoiceNumber {
    number: i64,
}

static NEXT_INVOICE: AtomicI64 = AtomicI64::new(1000);

fn invoice_number_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<InvoiceNumber>()
        .default_constructor(|| InvoiceNumber {
            number: NEXT_INVOICE.fetch_add(1, Ordering::SeqCst),
        })
        .final_method("value", &[], |i: &InvoiceNumber, _| Ok(Value::Str(format!("INV-{}", i.number))))
        .build()
}

/// 订单服务 - 构造器注入仓库，setter 注入审计服务（与审计服务互相引用）
struct OrderService {
    repository: ObjectRef,
    audit: OnceLock<ObjectRef>,
    container: OnceLock<Weak<Container>>,
}

impl OrderService {
    fn next_invoice(&self) -> anyhow::Result<String> {
        let container = self
            .container
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| anyhow!("container is gone"))?;
        let invoice = container.get_bean("invoiceNumber")?;
        let value = invoice.invoke("value", &[])?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("invoice number is {}", value.kind()))
    }
}

impl OrderApi for OrderService {
    fn place_order(&self, item: &str, quantity: i64) -> anyhow::Result<String> {
        if quantity <= 0 {
            return Err(anyhow!("quantity must be positive, got {}", quantity));
        }
        let invoice = self.next_invoice()?;
        let row = format!("{} x{} ({})", item, quantity, invoice);
        self.repository.invoke("save", &[Value::Str(row.clone())])?;
        if let Some(audit) = self.audit.get() {
            audit.invoke("record", &[Value::Str(row)])?;
        }
        Ok(invoice)
    }
}

fn set_once(cell: &OnceLock<ObjectRef>, value: Value) -> anyhow::Result<()> {
    let object = value.into_object().ok_or_else(|| anyhow!("expected an object"))?;
    cell.set(object).map_err(|_| anyhow!("property already set"))
}

fn order_service_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<OrderService>()
        .constructor(
            &[("repository", ValueType::object::<OrderRepository>())],
            |args| {
                Ok(OrderService {
                    repository: args.object(0)?,
                    audit: OnceLock::new(),
                    container: OnceLock::new(),
                })
            },
        )
        .property("audit", ValueType::object::<AuditService>(), |s: &OrderService, v: Value| {
            set_once(&s.audit, v)
        })
        .container_aware(|s: &OrderService, container: &Arc<Container>| {
            let _ = s.container.set(Arc::downgrade(container));
        })
        .method("place_order", &[ValueType::Str, ValueType::Int], |s: &OrderService, args| {
            Ok(Value::Str(s.place_order(args.str(0)?, args.int(1)?)?))
        })
        .implements::<dyn OrderApi, _>(&order_api_contract(), |s| s as Arc<dyn OrderApi>)
        .build()
}

/// 审计服务 - 持有订单服务的引用，注入的是早期暴露的代理
struct AuditService {
    orders: OnceLock<ObjectRef>,
    entries: Mutex<Vec<String>>,
}

fn audit_service_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<AuditService>()
        .default_constructor(|| AuditService {
            orders: OnceLock::new(),
            entries: Mutex::new(Vec::new()),
        })
        .property("orders", ValueType::object::<dyn OrderApi>(), |a: &AuditService, v: Value| {
            set_once(&a.orders, v)
        })
        .method("record", &[ValueType::Str], |a: &AuditService, args| {
            a.entries.lock().push(args.str(0)?.to_string());
            Ok(Value::Unit)
        })
        .after_properties_set(|a: &AuditService| {
            let orders = a.orders.get().map(|o| o.class_name().to_string()).unwrap_or_default();
            println!("🔗 AuditService wired to {}", orders);
            Ok(())
        })
        .build()
}

/// 请求上下文 - 线程作用域
struct RequestContext {
    thread_name: String,
}

fn request_context_class() -> Arc<ClassDescriptor> {
    ClassDescriptor::builder::<RequestContext>()
        .default_constructor(|| RequestContext {
            thread_name: thread::current().name().unwrap_or("unnamed").to_string(),
        })
        .build()
}

// ==================== 切面 ====================

/// 审计切面 - 记录下单调用的结果
struct AuditingAspect {
    pointcut: PointcutExpression,
    trail: Mutex<Vec<String>>,
}

impl Aspect for AuditingAspect {
    fn name(&self) -> &str {
        "AuditingAspect"
    }

    fn pointcut(&self) -> &PointcutExpression {
        &self.pointcut
    }

    fn order(&self) -> i32 {
        10
    }

    fn after_returning(&self, join_point: &JoinPoint, result: &Value) -> anyhow::Result<()> {
        self.trail
            .lock()
            .push(format!("{} -> {:?}", join_point.signature(), result));
        Ok(())
    }

    fn after_throwing(&self, join_point: &JoinPoint, error: &ErrorInfo) {
        self.trail
            .lock()
            .push(format!("{} !! {}", join_point.signature(), error.message));
    }
}

// ==================== 主程序 ====================

fn register_beans(container: &Container) -> ContainerResult<()> {
    container.register_bean_definition("orderRepository", BeanDefinition::new(order_repository_class()))?;
    container.register_bean_definition(
        "invoiceNumber",
        BeanDefinition::new(invoice_number_class()).prototype(),
    )?;
    container.register_bean_definition(
        "orderService",
        BeanDefinition::new(order_service_class())
            .with_constructor_ref("orderRepository")
            .with_property_ref("audit", "auditService")
            .with_description("places orders and numbers invoices"),
    )?;
    container.register_bean_definition(
        "auditService",
        BeanDefinition::new(audit_service_class()).with_property_ref("orders", "orderService"),
    )?;
    container.register_scope("thread", Arc::new(ThreadScope::new()))?;
    container.register_bean_definition(
        "requestContext",
        BeanDefinition::new(request_context_class()).with_scope("thread"),
    )?;
    Ok(())
}

fn main() -> ApplicationResult<()> {
    LoggingConfig::from_env().init()?;

    println!("\n╔════════════════════════════════════════════════════╗");
    println!("║     Beanstalk - Container & AOP Demo               ║");
    println!("╚════════════════════════════════════════════════════╝\n");

    // 切面注册
    let auditing = Arc::new(AuditingAspect {
        pointcut: PointcutExpression::parse("execution(* OrderService.place_*(..))")?,
        trail: Mutex::new(Vec::new()),
    });
    let registry = Arc::new(AdvisorRegistry::new());
    registry.register_aspect(Arc::clone(&auditing) as Arc<dyn Aspect>);
    registry.register_aspect(Arc::new(
        LoggingAspect::new(PointcutExpression::parse("within(OrderRepository)")?).with_args(),
    ));

    let container = Container::with_config(ContainerConfig::new());
    container.add_bean_post_processor(Arc::new(AutoProxyCreator::new(registry)));
    register_beans(&container)?;
    container.validate_dependencies()?;
    container.refresh()?;

    println!("\n📦 Singletons: {:?}", container.singleton_names());

    {
        let orders = container.get_contract::<dyn OrderApi>("orderService")?;
        let first = orders.place_order("keyboard", 2)?;
        let second = orders.place_order("monitor", 1)?;
        println!("🧾 Placed orders {} and {}", first, second);

        if let Err(e) = orders.place_order("mouse", 0) {
            println!("⚠️  Rejected order: {}", e);
        }

        let service = container.get_bean("orderService")?;
        println!(
            "🔷 orderService is a proxy: {} ({})",
            aop_utils::is_aop_proxy(&service),
            service.class_name()
        );
        let repository = container.get_bean("orderRepository")?;
        println!("🗄️  Repository rows: {:?}", repository.invoke("count", &[])?);
    }

    println!("\n📝 Audit trail:");
    for entry in auditing.trail.lock().iter() {
        println!("   {}", entry);
    }

    // 线程作用域：同一线程共享实例，不同线程各自一份
    let handles: Vec<_> = (0..2)
        .map(|i| {
            let container = Arc::clone(&container);
            thread::Builder::new()
                .name(format!("worker-{}", i))
                .spawn(move || -> ContainerResult<(String, bool)> {
                    let first = container.get_bean("requestContext")?;
                    let again = container.get_bean("requestContext")?;
                    let name = first
                        .downcast::<RequestContext>()
                        .map(|c| c.thread_name.clone())
                        .unwrap_or_default();
                    Ok((name, ObjectRef::ptr_eq(&first, &again)))
                })
        })
        .collect::<Result<_, _>>()?;
    for handle in handles {
        let (name, shared) = handle
            .join()
            .map_err(|_| anyhow!("request thread panicked"))??;
        println!("🧵 requestContext on {}: same instance within thread = {}", name, shared);
    }

    println!("\n╔════════════════════════════════════════════════════╗");
    println!("║           Shutting Down Container                  ║");
    println!("╚════════════════════════════════════════════════════╝\n");

    container.destroy_singletons()?;

    println!("\n✅ Shutdown complete!");
    Ok(())
}
