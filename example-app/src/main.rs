//! # 示例应用程序
//!
//! 演示如何使用 Lorn DI 装配一个小型服务图

use clap::Parser;
use di_abstractions::{Dependency, ServiceDescriptor, StaticDiscovery};
use di_impl::ServiceContext;
use infrastructure_composition::{ContainerBootstrapper, ContainerSettings, LoggingConfig};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "example-app")]
#[command(about = "Lorn DI 示例应用")]
struct Args {
    /// 配置文件路径（扩展名可省略）
    #[arg(short, long, default_value = infrastructure_composition::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// 使用的问候语言限定符，不指定时使用默认实现
    #[arg(short, long)]
    language: Option<String>,

    /// 并发解析的任务数
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// 以 JSON 输出已注册服务
    #[arg(long)]
    dump: bool,

    /// 使用开发环境日志配置
    #[arg(long)]
    dev: bool,
}

/// 问候服务
trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello, {}!", name)
    }
}

struct ChineseGreeter;

impl Greeter for ChineseGreeter {
    fn greet(&self, name: &str) -> String {
        format!("你好，{}！", name)
    }
}

/// 请求编号生成器
#[derive(Default)]
struct RequestIds {
    next: AtomicU64,
}

impl RequestIds {
    fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// 审计日志（可选依赖）
struct AuditLog;

impl AuditLog {
    fn record(&self, id: u64, message: &str) {
        info!("审计 #{}: {}", id, message);
    }
}

/// 欢迎服务，组合所有问候实现
struct WelcomeService {
    greeters: Vec<Arc<dyn Greeter>>,
    ids: Arc<RequestIds>,
    audit: Option<Arc<AuditLog>>,
}

impl WelcomeService {
    fn welcome(&self, name: &str) -> Vec<String> {
        let id = self.ids.next();
        let lines: Vec<String> = self.greeters.iter().map(|g| g.greet(name)).collect();
        if let Some(audit) = &self.audit {
            audit.record(id, &format!("欢迎 {}", name));
        }
        lines
    }
}

fn greeters() -> StaticDiscovery {
    StaticDiscovery::new("greeters")
        .with(ServiceDescriptor::instance_as::<dyn Greeter>(Arc::new(EnglishGreeter)).named("en"))
        .with(ServiceDescriptor::instance_as::<dyn Greeter>(Arc::new(ChineseGreeter)).named("zh"))
}

fn welcome_service() -> ServiceDescriptor {
    ServiceDescriptor::factory::<WelcomeService, _>(
        vec![
            Dependency::all::<dyn Greeter>(),
            Dependency::one::<RequestIds>(),
            Dependency::optional::<AuditLog>(),
        ],
        |deps| {
            Ok(WelcomeService {
                greeters: deps.take_all::<dyn Greeter>()?,
                ids: deps.take_one::<RequestIds>()?,
                audit: deps.take_optional::<AuditLog>()?,
            })
        },
    )
}

fn build_context(args: &Args) -> anyhow::Result<ServiceContext> {
    let mut settings = ContainerSettings::load(&args.config)?;
    if args.dev {
        settings.logging = LoggingConfig::development();
    }

    let context = ContainerBootstrapper::from_settings(settings)
        .with_logging(true)
        .add_discovery(greeters())
        .register(ServiceDescriptor::instance(RequestIds::default()))
        .register(ServiceDescriptor::instance(AuditLog))
        .register(welcome_service())
        .bootstrap()?;
    Ok(context)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let context = build_context(&args)?;
    info!("启动 Lorn DI 示例应用");

    match context.find_one::<dyn Greeter>(args.language.as_deref()) {
        Ok(Some(greeter)) => println!("{}", greeter.greet("Lorn")),
        Ok(None) => warn!("未找到语言 {:?} 的问候实现", args.language),
        Err(e) => warn!("无法选择问候实现: {}", e),
    }

    // 并发解析同一个服务，所有任务拿到同一个实例
    let mut tasks = Vec::with_capacity(args.workers);
    for worker in 0..args.workers {
        let context = context.clone();
        tasks.push(tokio::task::spawn_blocking(move || {
            let service = context.get::<WelcomeService>(None)?;
            Ok::<_, anyhow::Error>(service.welcome(&format!("worker-{}", worker)))
        }));
    }
    for task in tasks {
        for line in task.await?? {
            println!("{}", line);
        }
    }

    let stats = context.stats();
    info!(
        "已注册 {} 个服务, 已实例化 {} 个, 工厂调用 {} 次",
        stats.registered_services, stats.realized_services, stats.factory_invocations
    );

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&context.registered_services())?);
    }

    Ok(())
}
