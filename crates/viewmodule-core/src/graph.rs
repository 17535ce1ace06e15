#![forbid(unsafe_code)]

//! Static dependency graph between property names.
//!
//! A computed property declares the properties it is derived from. When a
//! source changes, every property reachable from it must be re-notified so the
//! UI re-reads it. The graph is declared once through a
//! [`DependencyGraphBuilder`] and then frozen into a [`DependencyGraph`].
//!
//! # Invariants
//!
//! 1. The graph is acyclic. An edge that would close a cycle is rejected when
//!    it is added, before any notification can happen.
//! 2. `notify(source)` emits every reachable dependent exactly once, diamonds
//!    included.
//! 3. Emission follows a topological order: a dependent is emitted only after
//!    every one of its sources that is also being emitted.
//! 4. Ties are broken by declaration order, so propagation is deterministic.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

use crate::error::{GraphError, Result};
use crate::property::PropertyName;

/// Mutable, construction-time form of the graph.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraphBuilder {
    names: Vec<PropertyName>,
    index: HashMap<PropertyName, usize>,
    /// Edges `source -> dependents`, in insertion order.
    dependents: Vec<Vec<usize>>,
    /// Declared sources per dependent, in insertion order.
    sources: Vec<Vec<usize>>,
}

impl DependencyGraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, name: PropertyName) -> usize {
        if let Some(&idx) = self.index.get(&name) {
            return idx;
        }
        let idx = self.names.len();
        self.names.push(name);
        self.index.insert(name, idx);
        self.dependents.push(Vec::new());
        self.sources.push(Vec::new());
        idx
    }

    /// Register a node without edges. Idempotent.
    pub fn declare(&mut self, name: PropertyName) -> &mut Self {
        self.intern(name);
        self
    }

    /// Whether `name` has been declared or mentioned by an edge.
    #[must_use]
    pub fn contains(&self, name: PropertyName) -> bool {
        self.index.contains_key(&name)
    }

    /// Declared sources of `dependent`, in declaration order.
    #[must_use]
    pub fn sources_of(&self, dependent: PropertyName) -> Vec<PropertyName> {
        self.index
            .get(&dependent)
            .map(|&d| self.sources[d].iter().map(|&s| self.names[s]).collect())
            .unwrap_or_default()
    }

    /// All known names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = PropertyName> + '_ {
        self.names.iter().copied()
    }

    /// Declare that `dependent` must be re-notified whenever `source` changes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CyclicDependency`] if the edge would close a
    /// cycle. The graph is left unchanged in that case.
    pub fn add_dependency(
        &mut self,
        dependent: PropertyName,
        source: PropertyName,
    ) -> Result<&mut Self> {
        let d = self.intern(dependent);
        let s = self.intern(source);
        if d == s {
            return Err(GraphError::CyclicDependency {
                path: vec![dependent, dependent],
            });
        }
        if self.dependents[s].contains(&d) {
            return Ok(self);
        }
        // The new edge s -> d closes a cycle iff s is already reachable from d.
        if let Some(mut path) = self.find_path(d, s) {
            path.push(d);
            return Err(GraphError::CyclicDependency {
                path: path.into_iter().map(|i| self.names[i]).collect(),
            });
        }
        self.dependents[s].push(d);
        self.sources[d].push(s);
        Ok(self)
    }

    /// Declare several sources at once, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first edge that would close a cycle.
    pub fn add_dependencies(
        &mut self,
        dependent: PropertyName,
        sources: &[PropertyName],
    ) -> Result<&mut Self> {
        for &source in sources {
            self.add_dependency(dependent, source)?;
        }
        Ok(self)
    }

    /// Depth-first search for a path `from -> ... -> to` along edges.
    fn find_path(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        let mut parent: Vec<Option<usize>> = vec![None; self.names.len()];
        let mut visited = vec![false; self.names.len()];
        let mut stack = vec![from];
        visited[from] = true;
        while let Some(node) = stack.pop() {
            if node == to {
                let mut path = vec![to];
                let mut cur = to;
                while let Some(p) = parent[cur] {
                    path.push(p);
                    cur = p;
                }
                path.reverse();
                return Some(path);
            }
            for &next in &self.dependents[node] {
                if !visited[next] {
                    visited[next] = true;
                    parent[next] = Some(node);
                    stack.push(next);
                }
            }
        }
        None
    }

    /// Freeze the graph, precomputing topological ranks and the propagation
    /// closure of every node.
    #[must_use]
    pub fn build(self) -> DependencyGraph {
        let n = self.names.len();

        // Kahn's algorithm; the min-heap on node index keeps declaration order
        // among nodes that are ready at the same time.
        let mut in_degree: Vec<usize> = self.sources.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(i, _)| Reverse(i))
            .collect();
        let mut rank = vec![0usize; n];
        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(node)) = ready.pop() {
            rank[node] = order.len();
            order.push(node);
            for &next in &self.dependents[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
        debug_assert_eq!(order.len(), n, "builder admitted a cycle");

        let closure = (0..n)
            .map(|start| {
                let mut seen = vec![false; n];
                let mut stack = self.dependents[start].clone();
                let mut reached = Vec::new();
                while let Some(node) = stack.pop() {
                    if seen[node] {
                        continue;
                    }
                    seen[node] = true;
                    reached.push(node);
                    stack.extend(self.dependents[node].iter().copied());
                }
                reached.sort_by_key(|&i| rank[i]);
                reached
            })
            .collect();

        let edge_count: usize = self.dependents.iter().map(Vec::len).sum();
        tracing::debug!(message = "graph.build", nodes = n, edges = edge_count);

        DependencyGraph {
            names: self.names,
            index: self.index,
            dependents: self.dependents,
            order,
            closure,
            edge_count,
        }
    }
}

/// Frozen dependency graph.
#[derive(Clone, Default)]
pub struct DependencyGraph {
    names: Vec<PropertyName>,
    index: HashMap<PropertyName, usize>,
    dependents: Vec<Vec<usize>>,
    order: Vec<usize>,
    closure: Vec<Vec<usize>>,
    edge_count: usize,
}

impl fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("nodes", &self.names.len())
            .field("edges", &self.edge_count)
            .finish()
    }
}

impl DependencyGraph {
    /// Emit every property that must be re-notified after `source` changed,
    /// each exactly once, in topological order. `source` itself is not
    /// emitted. Unknown sources have no dependents.
    pub fn notify(&self, source: PropertyName, mut emit: impl FnMut(PropertyName)) {
        if let Some(&s) = self.index.get(&source) {
            for &node in &self.closure[s] {
                emit(self.names[node]);
            }
        }
    }

    /// The sequence [`notify`](Self::notify) would emit.
    #[must_use]
    pub fn propagation_order(&self, source: PropertyName) -> Vec<PropertyName> {
        let mut out = Vec::new();
        self.notify(source, |name| out.push(name));
        out
    }

    /// Direct dependents of `source`, in declaration order.
    #[must_use]
    pub fn dependents_of(&self, source: PropertyName) -> Vec<PropertyName> {
        self.index
            .get(&source)
            .map(|&s| self.dependents[s].iter().map(|&d| self.names[d]).collect())
            .unwrap_or_default()
    }

    /// All nodes in topological order.
    #[must_use]
    pub fn topological_order(&self) -> Vec<PropertyName> {
        self.order.iter().map(|&i| self.names[i]).collect()
    }

    #[must_use]
    pub fn contains(&self, name: PropertyName) -> bool {
        self.index.contains_key(&name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
