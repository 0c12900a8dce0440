//! 服务注册表实现

use crate::resolver::ServiceResolver;
use dashmap::DashMap;
use di_abstractions::{
    ContainerConfig, ContainerStats, ResolveContext, ServiceDescriptor, ServiceInstance,
    ServiceSource,
};
use infrastructure_common::{DependencyError, DependencyResult, Qualifier, ServiceKey, TypeInfo};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use tracing::{debug, info, warn};

/// 注册表中的一个服务条目
///
/// 持有不可变的描述符以及运行时状态：工厂描述符在首次实例化之前处于未实例化状态，
/// 实例描述符注册时即已实例化。实例一旦发布便不再改变。
pub struct ServiceEntry {
    descriptor: ServiceDescriptor,
    sequence: usize,
    pub(crate) instance: OnceCell<ServiceInstance>,
    pub(crate) resolution_lock: Mutex<()>,
    /// 持有解析锁的线程
    pub(crate) owner: Mutex<Option<ThreadId>>,
}

impl ServiceEntry {
    fn new(descriptor: ServiceDescriptor, sequence: usize) -> Self {
        let instance = match descriptor.source() {
            ServiceSource::Instance(instance) => OnceCell::with_value(instance.clone()),
            ServiceSource::Factory(_) => OnceCell::new(),
        };
        Self {
            descriptor,
            sequence,
            instance,
            resolution_lock: Mutex::new(()),
            owner: Mutex::new(None),
        }
    }

    /// 服务描述符
    pub fn descriptor(&self) -> &ServiceDescriptor {
        &self.descriptor
    }

    /// 注册键
    pub fn key(&self) -> &ServiceKey {
        self.descriptor.key()
    }

    /// 全局注册序号
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// 已发布的实例
    pub fn realized(&self) -> Option<&ServiceInstance> {
        self.instance.get()
    }

    /// 是否已实例化
    pub fn is_realized(&self) -> bool {
        self.instance.get().is_some()
    }

    /// 当前线程是否正在解析该条目
    pub(crate) fn is_owned_by_current_thread(&self) -> bool {
        *self.owner.lock() == Some(std::thread::current().id())
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("key", self.key())
            .field("sequence", &self.sequence)
            .field("realized", &self.is_realized())
            .finish()
    }
}

/// 服务注册表
///
/// 按声明类型索引，每个类型下的条目按注册顺序排列。
/// 同一 (类型, 限定符) 最多注册一次，条目从不删除。
pub struct ServiceRegistry {
    /// 类型索引
    index: DashMap<TypeId, Vec<Arc<ServiceEntry>>>,
    /// 容器配置
    config: ContainerConfig,
    next_sequence: AtomicUsize,
    factory_invocations: AtomicU64,
    resolution_errors: AtomicU64,
}

impl ServiceRegistry {
    /// 创建新的注册表
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            index: DashMap::new(),
            config,
            next_sequence: AtomicUsize::new(0),
            factory_invocations: AtomicU64::new(0),
            resolution_errors: AtomicU64::new(0),
        }
    }

    /// 容器配置
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 注册服务描述符
    ///
    /// (类型, 限定符) 已存在时返回 [`DependencyError::DuplicateRegistration`]；
    /// 工厂声明的产出类型与注册类型不一致时返回 [`DependencyError::TypeMismatch`]。
    /// 检查与插入在同一个分片写锁内完成。
    pub fn register(&self, descriptor: ServiceDescriptor) -> DependencyResult<Arc<ServiceEntry>> {
        let key = descriptor.key().clone();
        if let ServiceSource::Factory(factory) = descriptor.source() {
            if factory.service_type() != key.type_info {
                return Err(DependencyError::TypeMismatch {
                    expected: key.type_info.name().to_string(),
                    actual: factory.service_type().name().to_string(),
                });
            }
        }
        let entry = {
            let mut entries = self.index.entry(key.type_info.id()).or_default();
            if entries.iter().any(|entry| entry.key() == &key) {
                warn!("拒绝重复注册: {}", key);
                return Err(DependencyError::duplicate(&key));
            }
            let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
            let entry = Arc::new(ServiceEntry::new(descriptor, sequence));
            entries.push(Arc::clone(&entry));
            entry
        };

        if self.config.log_registrations {
            info!(
                "注册服务: {} (实例: {}, 依赖数: {})",
                key,
                entry.descriptor().is_instance(),
                entry.descriptor().dependencies().len()
            );
        } else {
            debug!("注册服务: {}", key);
        }
        Ok(entry)
    }

    /// 注册外部构造好的实例
    pub fn register_instance(
        &self,
        instance: ServiceInstance,
        qualifier: Qualifier,
    ) -> DependencyResult<Arc<ServiceEntry>> {
        self.register(ServiceDescriptor::from_instance(instance).with_qualifier(qualifier))
    }

    /// 查找唯一的服务条目
    ///
    /// - 指定限定符：返回该限定符对应的条目；
    /// - 未指定限定符：优先返回未限定的条目，否则在仅有一个候选时返回该候选；
    ///   多个候选且都带限定符时返回 [`DependencyError::AmbiguousService`]。
    pub fn lookup_one(
        &self,
        type_info: TypeInfo,
        qualifier: &Qualifier,
    ) -> DependencyResult<Arc<ServiceEntry>> {
        let candidates = self.candidates(type_info);
        let key = ServiceKey::new(type_info, qualifier.clone());

        if let Some(entry) = candidates.iter().find(|entry| entry.key() == &key) {
            return Ok(Arc::clone(entry));
        }
        if !qualifier.is_default() {
            return Err(DependencyError::no_such_service(&key));
        }

        match candidates.as_slice() {
            [] => Err(DependencyError::no_such_service(&key)),
            [only] => {
                debug!("未限定查找 {} 回退到唯一候选 {}", type_info, only.key());
                Ok(Arc::clone(only))
            }
            _ => Err(DependencyError::AmbiguousService {
                type_name: type_info.name().to_string(),
                candidates: candidates
                    .iter()
                    .map(|entry| entry.key().qualifier.to_string())
                    .collect(),
            }),
        }
    }

    /// 查找所有匹配的服务条目，按注册顺序返回
    ///
    /// 未指定限定符时返回该类型下的全部条目。结果可以为空。
    pub fn lookup_all(&self, type_info: TypeInfo, qualifier: &Qualifier) -> Vec<Arc<ServiceEntry>> {
        let candidates = self.candidates(type_info);
        match qualifier {
            Qualifier::Default => candidates,
            Qualifier::Named(_) => candidates
                .into_iter()
                .filter(|entry| &entry.key().qualifier == qualifier)
                .collect(),
        }
    }

    /// 获取条目的实例，首次访问时通过解析器实例化
    pub fn materialize(&self, entry: &Arc<ServiceEntry>) -> DependencyResult<ServiceInstance> {
        if let Some(instance) = entry.realized() {
            return Ok(instance.clone());
        }

        let mut context = ResolveContext::new(self.config.max_resolution_depth);
        let result = ServiceResolver::new(self).materialize(entry, &mut context);
        if let Err(error) = &result {
            self.resolution_errors.fetch_add(1, Ordering::Relaxed);
            warn!("服务 {} 解析失败: {}", entry.key(), error);
        }
        result
    }

    /// 是否存在匹配的注册
    pub fn contains(&self, type_info: TypeInfo, qualifier: &Qualifier) -> bool {
        !self.lookup_all(type_info, qualifier).is_empty()
    }

    /// 所有条目，按全局注册顺序排列
    pub fn entries(&self) -> Vec<Arc<ServiceEntry>> {
        let mut entries: Vec<Arc<ServiceEntry>> = self
            .index
            .iter()
            .flat_map(|item| item.value().clone())
            .collect();
        entries.sort_by_key(|entry| entry.sequence());
        entries
    }

    /// 统计信息
    pub fn stats(&self) -> ContainerStats {
        let entries = self.entries();
        ContainerStats {
            registered_services: entries.len(),
            realized_services: entries.iter().filter(|entry| entry.is_realized()).count(),
            factory_invocations: self.factory_invocations.load(Ordering::Relaxed),
            resolution_errors: self.resolution_errors.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_factory_invocation(&self) {
        self.factory_invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// 复制出候选列表后立即释放分片锁，解析期间不持有索引锁
    fn candidates(&self, type_info: TypeInfo) -> Vec<Arc<ServiceEntry>> {
        self.index
            .get(&type_info.id())
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("types", &self.index.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
