//! 静态依赖检查
//!
//! 只读取描述符声明的依赖，不调用任何工厂。

use crate::registry::{ServiceEntry, ServiceRegistry};
use di_abstractions::DependencyKind;
use infrastructure_common::{DependencyError, ServiceKey};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// 依赖图节点
#[derive(Debug, Clone)]
struct DependencyGraphNode {
    key: ServiceKey,
    /// 依赖的注册键，按声明顺序
    dependencies: Vec<ServiceKey>,
}

pub(crate) fn validate(registry: &ServiceRegistry) -> Result<(), Vec<DependencyError>> {
    let entries = registry.entries();
    let mut errors = Vec::new();
    let graph = build_dependency_graph(registry, &entries, &mut errors);

    if registry.config().enable_circular_dependency_detection {
        errors.extend(detect_circular_dependencies(&graph));
    }

    if errors.is_empty() {
        debug!("依赖检查通过, 共 {} 个服务", entries.len());
        Ok(())
    } else {
        warn!("依赖检查发现 {} 个问题", errors.len());
        Err(errors)
    }
}

fn build_dependency_graph(
    registry: &ServiceRegistry,
    entries: &[Arc<ServiceEntry>],
    errors: &mut Vec<DependencyError>,
) -> Vec<DependencyGraphNode> {
    entries
        .iter()
        .map(|entry| {
            let mut dependencies = Vec::new();
            for dependency in entry.descriptor().dependencies() {
                match dependency.kind {
                    DependencyKind::All => dependencies.extend(
                        registry
                            .lookup_all(dependency.type_info, &dependency.qualifier)
                            .iter()
                            .map(|target| target.key().clone()),
                    ),
                    DependencyKind::One | DependencyKind::Optional => {
                        match registry.lookup_one(dependency.type_info, &dependency.qualifier) {
                            Ok(target) => dependencies.push(target.key().clone()),
                            Err(error)
                                if dependency.kind == DependencyKind::Optional
                                    && error.is_no_such_service() => {}
                            Err(error) => errors.push(DependencyError::UnsatisfiedDependency {
                                service: entry.key().to_string(),
                                dependency: dependency.to_string(),
                                source: Box::new(error),
                            }),
                        }
                    }
                }
            }
            DependencyGraphNode {
                key: entry.key().clone(),
                dependencies,
            }
        })
        .collect()
}

/// 深度优先搜索所有可达的循环，每个循环只报告一次
fn detect_circular_dependencies(graph: &[DependencyGraphNode]) -> Vec<DependencyError> {
    let nodes: HashMap<&ServiceKey, &DependencyGraphNode> =
        graph.iter().map(|node| (&node.key, node)).collect();
    let mut visited = HashSet::new();
    let mut visiting = Vec::new();
    let mut cycles = Vec::new();

    for node in graph {
        if !visited.contains(&node.key) {
            dfs_check(&node.key, &nodes, &mut visited, &mut visiting, &mut cycles);
        }
    }

    cycles
        .into_iter()
        .map(|cycle| DependencyError::CircularDependency { cycle })
        .collect()
}

fn dfs_check<'g>(
    current: &'g ServiceKey,
    nodes: &HashMap<&'g ServiceKey, &'g DependencyGraphNode>,
    visited: &mut HashSet<&'g ServiceKey>,
    visiting: &mut Vec<&'g ServiceKey>,
    cycles: &mut Vec<Vec<String>>,
) {
    if let Some(start) = visiting.iter().position(|key| *key == current) {
        let path = visiting[start..].iter().copied().chain(std::iter::once(current));
        cycles.push(ServiceKey::path_names(path));
        return;
    }
    if visited.contains(current) {
        return;
    }

    visiting.push(current);
    if let Some(&node) = nodes.get(current) {
        for dependency in &node.dependencies {
            dfs_check(dependency, nodes, visited, visiting, cycles);
        }
    }
    visiting.pop();
    visited.insert(current);
}
