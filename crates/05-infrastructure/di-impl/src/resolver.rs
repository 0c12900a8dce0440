//! 依赖解析器实现
//!
//! 把未实例化的条目转换为已实例化的条目：递归解析依赖、检测循环依赖，
//! 并保证每个条目的工厂最多成功调用一次。

use crate::registry::{ServiceEntry, ServiceRegistry};
use di_abstractions::{
    Dependency, DependencyKind, ResolveContext, ResolvedDependencies, ResolvedDependency,
    ServiceFactory, ServiceInstance, ServiceSource,
};
use infrastructure_common::{DependencyError, DependencyResult, ServiceKey};
use parking_lot::MutexGuard;
use std::sync::Arc;
use tracing::{debug, debug_span};

/// 依赖解析器
///
/// 除了调用方传入的 [`ResolveContext`] 之外不持有任何状态。
pub struct ServiceResolver<'r> {
    registry: &'r ServiceRegistry,
}

impl<'r> ServiceResolver<'r> {
    /// 创建新的解析器
    pub fn new(registry: &'r ServiceRegistry) -> Self {
        Self { registry }
    }

    /// 获取条目的实例，未实例化时在当前线程完成实例化
    ///
    /// 循环检查在获取条目锁之前进行，同一线程重入同一条目时报告
    /// [`DependencyError::CircularDependency`] 而不是自锁。
    pub fn materialize(
        &self,
        entry: &Arc<ServiceEntry>,
        context: &mut ResolveContext,
    ) -> DependencyResult<ServiceInstance> {
        let factory = match entry.descriptor().source() {
            ServiceSource::Instance(instance) => return Ok(instance.clone()),
            ServiceSource::Factory(factory) => Arc::clone(factory),
        };
        if let Some(instance) = entry.realized() {
            return Ok(instance.clone());
        }

        context.push(entry.key())?;
        let result = self.realize(entry, factory.as_ref(), context);
        context.pop();
        result
    }

    fn realize(
        &self,
        entry: &ServiceEntry,
        factory: &dyn ServiceFactory,
        context: &mut ResolveContext,
    ) -> DependencyResult<ServiceInstance> {
        let span = debug_span!("resolve", service = %entry.key(), depth = context.depth());
        let _enter = span.enter();

        if entry.is_owned_by_current_thread() {
            let path = std::iter::once(entry.key()).chain(context.chain());
            return Err(DependencyError::CircularDependency {
                cycle: ServiceKey::path_names(path),
            });
        }
        let _guard = self.lock(entry)?;
        let _owner = OwnerGuard::acquire(entry);
        if let Some(instance) = entry.realized() {
            debug!("服务已由其他线程实例化");
            return Ok(instance.clone());
        }

        let mut values = Vec::with_capacity(factory.dependencies().len());
        for dependency in factory.dependencies() {
            values.push(self.resolve_dependency(dependency, context)?);
        }

        let declared = entry.key().type_info;
        let instance = factory.create(ResolvedDependencies::new(declared, values))?;
        self.registry.record_factory_invocation();
        if instance.type_info() != declared {
            return Err(DependencyError::TypeMismatch {
                expected: declared.name().to_string(),
                actual: instance.type_info().name().to_string(),
            });
        }

        let instance = entry.instance.get_or_init(|| instance).clone();
        debug!("服务实例化完成");
        Ok(instance)
    }

    fn resolve_dependency(
        &self,
        dependency: &Dependency,
        context: &mut ResolveContext,
    ) -> DependencyResult<ResolvedDependency> {
        debug!("解析依赖: {}", dependency);
        match dependency.kind {
            DependencyKind::One => {
                let entry = self
                    .registry
                    .lookup_one(dependency.type_info, &dependency.qualifier)?;
                Ok(ResolvedDependency::One(self.materialize(&entry, context)?))
            }
            DependencyKind::Optional => {
                match self
                    .registry
                    .lookup_one(dependency.type_info, &dependency.qualifier)
                {
                    Ok(entry) => Ok(ResolvedDependency::Optional(Some(
                        self.materialize(&entry, context)?,
                    ))),
                    Err(error) if error.is_no_such_service() => {
                        Ok(ResolvedDependency::Optional(None))
                    }
                    Err(error) => Err(error),
                }
            }
            DependencyKind::All => {
                let entries = self
                    .registry
                    .lookup_all(dependency.type_info, &dependency.qualifier);
                let mut instances = Vec::with_capacity(entries.len());
                for entry in &entries {
                    instances.push(self.materialize(entry, context)?);
                }
                Ok(ResolvedDependency::All(instances))
            }
        }
    }

    /// 获取条目的解析锁，配置了超时时间时最多等待该时长
    fn lock<'e>(&self, entry: &'e ServiceEntry) -> DependencyResult<MutexGuard<'e, ()>> {
        match self.registry.config().resolution_timeout() {
            Some(timeout) => entry.resolution_lock.try_lock_for(timeout).ok_or_else(|| {
                DependencyError::ResolutionTimeout {
                    type_name: entry.key().type_info.name().to_string(),
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }
            }),
            None => Ok(entry.resolution_lock.lock()),
        }
    }
}

/// 在持有解析锁期间记录所属线程
struct OwnerGuard<'e> {
    entry: &'e ServiceEntry,
}

impl<'e> OwnerGuard<'e> {
    fn acquire(entry: &'e ServiceEntry) -> Self {
        *entry.owner.lock() = Some(std::thread::current().id());
        Self { entry }
    }
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        *self.entry.owner.lock() = None;
    }
}
