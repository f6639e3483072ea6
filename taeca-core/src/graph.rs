//! # Dependency Graph
//!
//! Lazily rebuilt resources with explicit invalidation.
//!
//! ## Nodes
//!
//! - **Source** nodes hold values the host writes with [`DependencyGraph::set`].
//!   They are never dirty.
//! - **Derived** nodes hold a cached value, a dirty flag and a rebuild
//!   function over their declared dependencies.
//!
//! ## Rules
//!
//! - Marking a node dirty dirties everything downstream of it. A node that is
//!   already dirty is not revisited, so propagation ends on any graph.
//! - Reading a dirty node first reads its dependencies, then rebuilds it
//!   once. Further reads return the cache until the next invalidation.
//! - A failed rebuild leaves the node dirty with its previous value, and
//!   nothing downstream is rebuilt from it. The next read retries.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{TaecaError, TaecaResult};

/// Index of a node in the graph
pub type NodeId = u32;

type BoxedValue = Box<dyn Any + Send + Sync>;
type RebuildFn = Box<dyn FnMut(&Inputs<'_>) -> TaecaResult<BoxedValue> + Send>;

/// Typed handle to a node
pub struct ResourceKey<T> {
    id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ResourceKey<T> {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Untyped node id, for declaring dependencies
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl<T> Clone for ResourceKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResourceKey<T> {}

impl<T> fmt::Debug for ResourceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.id)
    }
}

enum NodeKind {
    Source,
    /// `None` only while the rebuild function is running
    Derived(Option<RebuildFn>),
}

struct Node {
    label: &'static str,
    value: Option<BoxedValue>,
    dirty: bool,
    dependencies: Vec<NodeId>,
    dependents: Vec<NodeId>,
    kind: NodeKind,
    rebuilds: u64,
}

/// Dependency values handed to a rebuild function
pub struct Inputs<'a> {
    graph: &'a DependencyGraph,
    declared: &'a [NodeId],
}

impl<'a> Inputs<'a> {
    /// Fresh value of a declared dependency
    pub fn get<T: 'static>(&self, key: ResourceKey<T>) -> TaecaResult<&'a T> {
        if !self.declared.contains(&key.id) {
            return Err(TaecaError::invalid_state(format!(
                "resource {} read without being declared as a dependency",
                key.id
            )));
        }
        self.graph.get(key)
    }
}

/// The set of resources and their dependency edges
#[derive(Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a host-written value
    pub fn add_source<T>(&mut self, label: &'static str, value: T) -> ResourceKey<T>
    where
        T: Any + Send + Sync,
    {
        let id = self.push(Node {
            label,
            value: Some(Box::new(value)),
            dirty: false,
            dependencies: Vec::new(),
            dependents: Vec::new(),
            kind: NodeKind::Source,
            rebuilds: 0,
        });
        ResourceKey::new(id)
    }

    /// Add a resource rebuilt from `dependencies`. It starts dirty.
    pub fn add_derived<T, F>(
        &mut self,
        label: &'static str,
        dependencies: &[NodeId],
        mut rebuild: F,
    ) -> TaecaResult<ResourceKey<T>>
    where
        T: Any + Send + Sync,
        F: FnMut(&Inputs<'_>) -> TaecaResult<T> + Send + 'static,
    {
        for &dep in dependencies {
            self.node(dep)?;
        }

        let boxed: RebuildFn =
            Box::new(move |inputs: &Inputs<'_>| rebuild(inputs).map(|v| Box::new(v) as BoxedValue));
        let id = self.push(Node {
            label,
            value: None,
            dirty: true,
            dependencies: dependencies.to_vec(),
            dependents: Vec::new(),
            kind: NodeKind::Derived(Some(boxed)),
            rebuilds: 0,
        });
        for &dep in dependencies {
            self.nodes[dep as usize].dependents.push(id);
        }
        Ok(ResourceKey::new(id))
    }

    /// Add an edge after construction. The dependent becomes dirty.
    ///
    /// This is the only way to build a cycle; reads through one fail with
    /// `DependencyCycle`.
    pub fn depend_on(&mut self, dependent: NodeId, dependency: NodeId) -> TaecaResult<()> {
        self.node(dependency)?;
        let node = self.node_mut(dependent)?;
        if matches!(node.kind, NodeKind::Source) {
            return Err(TaecaError::invalid_state(format!(
                "source resource {} cannot have dependencies",
                dependent
            )));
        }
        if !node.dependencies.contains(&dependency) {
            node.dependencies.push(dependency);
            self.nodes[dependency as usize].dependents.push(dependent);
        }
        self.mark_dirty(dependent)
    }

    /// Write a source value and dirty everything downstream
    pub fn set<T>(&mut self, key: ResourceKey<T>, value: T) -> TaecaResult<()>
    where
        T: Any + Send + Sync,
    {
        let node = self.node_mut(key.id)?;
        if !matches!(node.kind, NodeKind::Source) {
            return Err(TaecaError::invalid_state(format!(
                "resource {} ({}) is derived and cannot be set",
                key.id, node.label
            )));
        }
        node.value = Some(Box::new(value));
        self.mark_dirty(key.id)
    }

    /// Invalidate a node and everything downstream of it
    ///
    /// Sources stay clean; only their dependents are dirtied.
    pub fn mark_dirty(&mut self, id: NodeId) -> TaecaResult<()> {
        self.node(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current as usize];
            if !matches!(node.kind, NodeKind::Source) {
                if node.dirty {
                    continue;
                }
                node.dirty = true;
            }
            stack.extend(node.dependents.iter().copied());
        }
        Ok(())
    }

    /// Rebuild if needed, then return the value
    pub fn read<T: 'static>(&mut self, key: ResourceKey<T>) -> TaecaResult<&T> {
        self.refresh(key.id)?;
        self.get(key)
    }

    /// Bring a node and its dependencies up to date
    pub fn refresh(&mut self, id: NodeId) -> TaecaResult<()> {
        let mut visiting = Vec::new();
        self.refresh_inner(id, &mut visiting)
    }

    /// Value of a clean node, without rebuilding
    pub fn get<T: 'static>(&self, key: ResourceKey<T>) -> TaecaResult<&T> {
        let node = self.node(key.id)?;
        if node.dirty {
            return Err(TaecaError::invalid_state(format!(
                "resource {} ({}) is stale",
                key.id, node.label
            )));
        }
        node.value
            .as_ref()
            .ok_or_else(|| TaecaError::invalid_state(format!("resource {} has no value", key.id)))?
            .downcast_ref::<T>()
            .ok_or(TaecaError::ResourceType(key.id))
    }

    /// Last successfully built value, stale or not
    pub fn peek<T: 'static>(&self, key: ResourceKey<T>) -> Option<&T> {
        self.nodes
            .get(key.id as usize)?
            .value
            .as_ref()?
            .downcast_ref::<T>()
    }

    /// Whether the node needs a rebuild before it can be read
    pub fn is_dirty(&self, id: NodeId) -> TaecaResult<bool> {
        Ok(self.node(id)?.dirty)
    }

    /// Successful rebuilds of a node so far
    pub fn rebuild_count(&self, id: NodeId) -> TaecaResult<u64> {
        Ok(self.node(id)?.rebuilds)
    }

    /// Human-readable name of a node
    pub fn label(&self, id: NodeId) -> TaecaResult<&'static str> {
        Ok(self.node(id)?.label)
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn refresh_inner(&mut self, id: NodeId, visiting: &mut Vec<NodeId>) -> TaecaResult<()> {
        let node = self.node(id)?;
        if !node.dirty {
            return Ok(());
        }
        if visiting.contains(&id) {
            return Err(TaecaError::DependencyCycle(id));
        }
        let dependencies = node.dependencies.clone();

        visiting.push(id);
        for &dep in &dependencies {
            self.refresh_inner(dep, visiting)?;
        }
        visiting.pop();

        let mut rebuild = match &mut self.nodes[id as usize].kind {
            NodeKind::Derived(slot) => slot.take().ok_or(TaecaError::DependencyCycle(id))?,
            NodeKind::Source => return Ok(()),
        };

        let result = rebuild(&Inputs {
            graph: &*self,
            declared: &dependencies,
        });

        let node = &mut self.nodes[id as usize];
        node.kind = NodeKind::Derived(Some(rebuild));
        match result {
            Ok(value) => {
                node.value = Some(value);
                node.dirty = false;
                node.rebuilds += 1;
                tracing::debug!("Rebuilt {} (#{})", node.label, node.rebuilds);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Rebuild of {} failed, keeping it dirty: {}", node.label, e);
                Err(e)
            }
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    fn node(&self, id: NodeId) -> TaecaResult<&Node> {
        self.nodes
            .get(id as usize)
            .ok_or(TaecaError::ResourceNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> TaecaResult<&mut Node> {
        self.nodes
            .get_mut(id as usize)
            .ok_or(TaecaError::ResourceNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn test_read_rebuilds_once_per_invalidation() {
        let mut graph = DependencyGraph::new();
        let size = graph.add_source("size", 4usize);
        let calls = counter();
        let calls_in = calls.clone();
        let table = graph
            .add_derived("table", &[size.id()], move |inputs| {
                calls_in.fetch_add(1, Ordering::SeqCst);
                Ok(vec![0u32; *inputs.get(size)?])
            })
            .unwrap();

        for _ in 0..5 {
            assert_eq!(graph.read(table).unwrap().len(), 4);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        graph.set(size, 9).unwrap();
        assert!(graph.is_dirty(table.id()).unwrap());
        for _ in 0..3 {
            assert_eq!(graph.read(table).unwrap().len(), 9);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(graph.rebuild_count(table.id()).unwrap(), 2);
    }

    #[test]
    fn test_transitive_invalidation() {
        let mut graph = DependencyGraph::new();
        let base = graph.add_source("base", 1u64);
        let doubled = graph
            .add_derived("doubled", &[base.id()], move |i| Ok(*i.get(base)? * 2))
            .unwrap();
        let plus_one = graph
            .add_derived("plus_one", &[doubled.id()], move |i| Ok(*i.get(doubled)? + 1))
            .unwrap();

        assert_eq!(*graph.read(plus_one).unwrap(), 3);
        assert!(!graph.is_dirty(doubled.id()).unwrap());

        graph.set(base, 10).unwrap();
        assert!(graph.is_dirty(doubled.id()).unwrap());
        assert!(graph.is_dirty(plus_one.id()).unwrap());
        assert!(!graph.is_dirty(base.id()).unwrap());

        assert_eq!(*graph.read(plus_one).unwrap(), 21);
        assert_eq!(graph.rebuild_count(doubled.id()).unwrap(), 2);
    }

    #[test]
    fn test_get_refuses_stale_value() {
        let mut graph = DependencyGraph::new();
        let base = graph.add_source("base", 1u32);
        let copy = graph
            .add_derived("copy", &[base.id()], move |i| Ok(*i.get(base)?))
            .unwrap();

        assert!(graph.get(copy).is_err());
        graph.refresh(copy.id()).unwrap();
        assert_eq!(*graph.get(copy).unwrap(), 1);

        graph.set(base, 2).unwrap();
        assert!(graph.get(copy).is_err());
        assert_eq!(graph.peek(copy), Some(&1));
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_value() {
        let mut graph = DependencyGraph::new();
        let requested = graph.add_source("requested", 8usize);
        let table = graph
            .add_derived("table", &[requested.id()], move |i| {
                let n = *i.get(requested)?;
                if n > 16 {
                    return Err(TaecaError::CapacityExceeded {
                        r: 0,
                        k: 0,
                        required_bytes: n as u64,
                        ceiling: 16,
                    });
                }
                Ok(vec![1u8; n])
            })
            .unwrap();
        let downstream_calls = counter();
        let calls_in = downstream_calls.clone();
        let total = graph
            .add_derived("total", &[table.id()], move |i| {
                calls_in.fetch_add(1, Ordering::SeqCst);
                Ok(i.get(table)?.len())
            })
            .unwrap();

        assert_eq!(*graph.read(total).unwrap(), 8);
        assert_eq!(downstream_calls.load(Ordering::SeqCst), 1);

        graph.set(requested, 32).unwrap();
        assert!(matches!(graph.read(total), Err(TaecaError::CapacityExceeded { .. })));
        assert!(graph.is_dirty(table.id()).unwrap());
        assert!(graph.is_dirty(total.id()).unwrap());
        assert_eq!(graph.peek(table).map(|t| t.len()), Some(8));
        assert_eq!(downstream_calls.load(Ordering::SeqCst), 1);

        // Every read retries
        assert!(graph.read(table).is_err());

        graph.set(requested, 12).unwrap();
        assert_eq!(*graph.read(total).unwrap(), 12);
        assert_eq!(downstream_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cycle_is_reported_not_looped() {
        let mut graph = DependencyGraph::new();
        let base = graph.add_source("base", 0u32);
        let a = graph
            .add_derived("a", &[base.id()], move |i| Ok(*i.get(base)?))
            .unwrap();
        let b = graph
            .add_derived("b", &[a.id()], move |i| Ok(*i.get(a)?))
            .unwrap();

        graph.depend_on(a.id(), b.id()).unwrap();
        graph.mark_dirty(base.id()).unwrap();
        assert!(matches!(graph.read(b), Err(TaecaError::DependencyCycle(_))));
        assert!(graph.is_dirty(a.id()).unwrap());
    }

    #[test]
    fn test_undeclared_input_rejected() {
        let mut graph = DependencyGraph::new();
        let declared = graph.add_source("declared", 1u32);
        let hidden = graph.add_source("hidden", 2u32);
        let sum = graph
            .add_derived("sum", &[declared.id()], move |i| {
                Ok(*i.get(declared)? + *i.get(hidden)?)
            })
            .unwrap();

        assert!(matches!(graph.read(sum), Err(TaecaError::InvalidState(_))));
    }

    #[test]
    fn test_set_on_derived_rejected() {
        let mut graph = DependencyGraph::new();
        let base = graph.add_source("base", 1u32);
        let copy = graph
            .add_derived("copy", &[base.id()], move |i| Ok(*i.get(base)?))
            .unwrap();
        assert!(graph.set(copy, 5).is_err());
        assert!(graph.add_derived::<u32, _>("orphan", &[99], |_| Ok(0)).is_err());
    }
}
