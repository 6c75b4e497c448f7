//! The `Graph` container.
//!
//! Storage mirrors `@dagrejs/graphlib`'s adjacency-map design rather than the arena/generation
//! cache sketched by [`super::adj_cache`]: nodes and edges live in insertion-ordered slots, and
//! `_out`/`_in` adjacency (here `out_adj`/`in_adj`) is maintained incrementally on every edge
//! mutation instead of being rebuilt lazily. This keeps iteration order deterministic, which the
//! layout pipeline's tie-breaking rules depend on.

use super::edge_key::EdgeKeyView;
use super::entries::{EdgeEntry, NodeEntry};
use super::{EdgeKey, GraphOptions};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

pub struct Graph<N, E, G> {
    options: GraphOptions,
    graph_label: G,

    nodes: Vec<Option<NodeEntry<N>>>,
    node_index: FxHashMap<String, usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    root_children: Vec<usize>,
    out_adj: Vec<Vec<usize>>,
    in_adj: Vec<Vec<usize>>,
    node_count: usize,

    edges: Vec<Option<EdgeEntry<E>>>,
    edge_index: hashbrown::HashMap<EdgeKey, usize, rustc_hash::FxBuildHasher>,

    default_node_label: Option<Rc<dyn Fn() -> N>>,
    default_edge_label: Option<Rc<dyn Fn() -> E>>,
}

fn remove_value(v: &mut Vec<usize>, target: usize) {
    if let Some(pos) = v.iter().position(|&x| x == target) {
        v.remove(pos);
    }
}

impl<N, E, G> Graph<N, E, G> {
    pub fn new(options: GraphOptions) -> Self
    where
        G: Default,
    {
        Self {
            options,
            graph_label: G::default(),
            nodes: Vec::new(),
            node_index: FxHashMap::default(),
            parent: Vec::new(),
            children: Vec::new(),
            root_children: Vec::new(),
            out_adj: Vec::new(),
            in_adj: Vec::new(),
            node_count: 0,
            edges: Vec::new(),
            edge_index: hashbrown::HashMap::default(),
            default_node_label: None,
            default_edge_label: None,
        }
    }

    pub fn set_graph(&mut self, label: G) {
        self.graph_label = label;
    }

    pub fn graph(&self) -> &G {
        &self.graph_label
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph_label
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    pub fn is_directed(&self) -> bool {
        self.options.directed
    }

    pub fn is_multigraph(&self) -> bool {
        self.options.multigraph
    }

    pub fn set_default_node_label(&mut self, f: impl Fn() -> N + 'static) {
        self.default_node_label = Some(Rc::new(f));
    }

    pub fn set_default_edge_label(&mut self, f: impl Fn() -> E + 'static) {
        self.default_edge_label = Some(Rc::new(f));
    }

    fn id_of(&self, ix: usize) -> &str {
        self.nodes[ix]
            .as_ref()
            .expect("id_of: node index is a tombstone")
            .id
            .as_str()
    }

    fn insert_node(&mut self, id: String, label: N) -> usize {
        let ix = self.nodes.len();
        self.nodes.push(Some(NodeEntry {
            id: id.clone(),
            label,
        }));
        self.node_index.insert(id, ix);
        self.parent.push(None);
        self.children.push(Vec::new());
        self.root_children.push(ix);
        self.out_adj.push(Vec::new());
        self.in_adj.push(Vec::new());
        self.node_count += 1;
        ix
    }

    fn ensure_node_ix(&mut self, id: &str) -> usize
    where
        N: Default,
    {
        if let Some(&ix) = self.node_index.get(id) {
            return ix;
        }
        let label = self.default_node_label.clone().map(|f| f()).unwrap_or_default();
        self.insert_node(id.to_string(), label)
    }

    pub fn set_node(&mut self, id: impl Into<String>, label: N) {
        let id = id.into();
        if let Some(&ix) = self.node_index.get(&id) {
            if let Some(entry) = self.nodes[ix].as_mut() {
                entry.label = label;
            }
        } else {
            self.insert_node(id, label);
        }
    }

    pub fn ensure_node(&mut self, id: impl Into<String>)
    where
        N: Default,
    {
        let id = id.into();
        if self.node_index.contains_key(&id) {
            return;
        }
        let label = self.default_node_label.clone().map(|f| f()).unwrap_or_default();
        self.insert_node(id, label);
    }

    pub fn node_ix(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        let ix = self.node_ix(id)?;
        self.nodes[ix].as_ref().map(|e| &e.label)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        let ix = self.node_ix(id)?;
        self.nodes[ix].as_mut().map(|e| &mut e.label)
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter_map(|e| e.as_ref().map(|e| e.id.clone()))
            .collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().filter_map(|e| e.as_ref().map(|e| e.id.as_str()))
    }

    pub fn for_each_node(&self, mut f: impl FnMut(&str, &N)) {
        for e in self.nodes.iter().flatten() {
            f(&e.id, &e.label);
        }
    }

    pub fn for_each_node_mut(&mut self, mut f: impl FnMut(&str, &mut N)) {
        for e in self.nodes.iter_mut().flatten() {
            f(&e.id, &mut e.label);
        }
    }

    pub fn for_each_node_ix(&self, mut f: impl FnMut(usize, &str, &N)) {
        for (ix, e) in self.nodes.iter().enumerate() {
            if let Some(e) = e {
                f(ix, &e.id, &e.label);
            }
        }
    }

    fn detach_from_current_parent(&mut self, ix: usize) {
        match self.parent[ix] {
            Some(p_ix) => remove_value(&mut self.children[p_ix], ix),
            None => remove_value(&mut self.root_children, ix),
        }
        self.parent[ix] = None;
    }

    pub fn parent(&self, v: &str) -> Option<&str> {
        let ix = self.node_ix(v)?;
        let p_ix = self.parent[ix]?;
        Some(self.id_of(p_ix))
    }

    pub fn children(&self, v: &str) -> Vec<&str> {
        let Some(ix) = self.node_ix(v) else {
            return Vec::new();
        };
        self.children[ix].iter().map(|&cix| self.id_of(cix)).collect()
    }

    pub fn children_iter(&self, v: &str) -> impl Iterator<Item = &str> + '_ {
        let ix = self.node_ix(v);
        ix.into_iter()
            .flat_map(move |ix| self.children[ix].iter().map(move |&cix| self.id_of(cix)))
    }

    pub fn children_root(&self) -> Vec<&str> {
        self.root_children
            .iter()
            .filter(|&&ix| self.nodes[ix].is_some())
            .map(|&ix| self.id_of(ix))
            .collect()
    }

    pub fn set_parent_ref(&mut self, v: &str, parent: &str) {
        let (Some(v_ix), Some(p_ix)) = (self.node_ix(v), self.node_ix(parent)) else {
            return;
        };
        self.detach_from_current_parent(v_ix);
        self.children[p_ix].push(v_ix);
        self.parent[v_ix] = Some(p_ix);
    }

    pub fn set_parent(&mut self, v: impl AsRef<str>, parent: impl AsRef<str>) {
        self.set_parent_ref(v.as_ref(), parent.as_ref());
    }

    pub fn clear_parent(&mut self, v: &str) {
        let Some(ix) = self.node_ix(v) else {
            return;
        };
        self.detach_from_current_parent(ix);
        self.root_children.push(ix);
    }

    pub fn remove_node(&mut self, id: &str) -> Option<N> {
        let ix = self.node_index.remove(id)?;

        for cix in std::mem::take(&mut self.children[ix]) {
            self.parent[cix] = None;
            self.root_children.push(cix);
        }
        self.detach_from_current_parent(ix);

        let out_e = std::mem::take(&mut self.out_adj[ix]);
        let in_e = std::mem::take(&mut self.in_adj[ix]);
        let mut removed: FxHashSet<usize> = FxHashSet::default();
        for eix in out_e.into_iter().chain(in_e) {
            if removed.insert(eix) {
                self.remove_edge_by_ix(eix);
            }
        }

        let entry = self.nodes[ix].take()?;
        self.node_count -= 1;
        Some(entry.label)
    }

    pub fn sources(&self) -> Vec<&str> {
        (0..self.nodes.len())
            .filter(|&ix| self.nodes[ix].is_some() && self.in_adj[ix].is_empty())
            .map(|ix| self.id_of(ix))
            .collect()
    }

    pub fn successors(&self, v: &str) -> Vec<&str> {
        let Some(ix) = self.node_ix(v) else {
            return Vec::new();
        };
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut out = Vec::new();
        for &eix in &self.out_adj[ix] {
            if let Some(e) = self.edges[eix].as_ref() {
                if seen.insert(e.w_ix) {
                    out.push(self.id_of(e.w_ix));
                }
            }
        }
        if !self.options.directed {
            for &eix in &self.in_adj[ix] {
                if let Some(e) = self.edges[eix].as_ref() {
                    if seen.insert(e.v_ix) {
                        out.push(self.id_of(e.v_ix));
                    }
                }
            }
        }
        out
    }

    pub fn predecessors(&self, v: &str) -> Vec<&str> {
        let Some(ix) = self.node_ix(v) else {
            return Vec::new();
        };
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut out = Vec::new();
        for &eix in &self.in_adj[ix] {
            if let Some(e) = self.edges[eix].as_ref() {
                if seen.insert(e.v_ix) {
                    out.push(self.id_of(e.v_ix));
                }
            }
        }
        if !self.options.directed {
            for &eix in &self.out_adj[ix] {
                if let Some(e) = self.edges[eix].as_ref() {
                    if seen.insert(e.w_ix) {
                        out.push(self.id_of(e.w_ix));
                    }
                }
            }
        }
        out
    }

    pub fn neighbors(&self, v: &str) -> Vec<&str> {
        let Some(ix) = self.node_ix(v) else {
            return Vec::new();
        };
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut out = Vec::new();
        for &eix in self.out_adj[ix].iter().chain(self.in_adj[ix].iter()) {
            let Some(e) = self.edges[eix].as_ref() else {
                continue;
            };
            let other = if e.v_ix == ix { e.w_ix } else { e.v_ix };
            if other != ix && seen.insert(other) {
                out.push(self.id_of(other));
            }
        }
        out
    }

    pub fn first_successor(&self, v: &str) -> Option<&str> {
        self.successors(v).into_iter().next()
    }

    fn upsert_edge(&mut self, key: EdgeKey, label: E) -> usize
    where
        N: Default,
    {
        if let Some(&eix) = self.edge_index.get(&key) {
            if let Some(e) = self.edges[eix].as_mut() {
                e.label = label;
            }
            return eix;
        }
        let v_ix = self.ensure_node_ix(&key.v);
        let w_ix = self.ensure_node_ix(&key.w);
        let eix = self.edges.len();
        self.edges.push(Some(EdgeEntry {
            key: key.clone(),
            v_ix,
            w_ix,
            label,
        }));
        self.edge_index.insert(key, eix);
        self.out_adj[v_ix].push(eix);
        self.in_adj[w_ix].push(eix);
        eix
    }

    fn remove_edge_by_ix(&mut self, eix: usize) -> Option<E> {
        let entry = self.edges[eix].take()?;
        self.edge_index.remove(&entry.key);
        remove_value(&mut self.out_adj[entry.v_ix], eix);
        remove_value(&mut self.in_adj[entry.w_ix], eix);
        Some(entry.label)
    }

    pub fn set_edge_with_label(&mut self, v: impl Into<String>, w: impl Into<String>, label: E)
    where
        N: Default,
    {
        self.upsert_edge(EdgeKey::new(v.into(), w.into(), None::<String>), label);
    }

    pub fn set_edge(&mut self, v: impl Into<String>, w: impl Into<String>)
    where
        N: Default,
        E: Default,
    {
        let label = self.default_edge_label.clone().map(|f| f()).unwrap_or_default();
        self.set_edge_with_label(v, w, label);
    }

    /// Wires up a chain of edges along `path`, in order: `path[0] -> path[1] -> path[2] -> ...`.
    pub fn set_path<S>(&mut self, path: &[S])
    where
        N: Default,
        E: Default,
        S: AsRef<str>,
    {
        for pair in path.windows(2) {
            self.set_edge(pair[0].as_ref(), pair[1].as_ref());
        }
    }

    pub fn set_edge_named(
        &mut self,
        v: impl Into<String>,
        w: impl Into<String>,
        name: Option<String>,
        label: Option<E>,
    ) where
        N: Default,
        E: Default,
    {
        let label = label.unwrap_or_else(|| self.default_edge_label.clone().map(|f| f()).unwrap_or_default());
        self.upsert_edge(EdgeKey::new(v.into(), w.into(), name), label);
    }

    pub fn set_edge_key(&mut self, key: EdgeKey, label: E)
    where
        N: Default,
    {
        self.upsert_edge(key, label);
    }

    pub fn edge(&self, v: &str, w: &str, name: Option<&str>) -> Option<&E> {
        let view = EdgeKeyView { v, w, name };
        self.edge_index
            .get(&view)
            .and_then(|&ix| self.edges[ix].as_ref())
            .map(|e| &e.label)
    }

    pub fn edge_mut(&mut self, v: &str, w: &str, name: Option<&str>) -> Option<&mut E> {
        let view = EdgeKeyView { v, w, name };
        let ix = self.edge_index.get(&view).copied()?;
        self.edges[ix].as_mut().map(|e| &mut e.label)
    }

    pub fn edge_by_key(&self, key: &EdgeKey) -> Option<&E> {
        self.edge(&key.v, &key.w, key.name.as_deref())
    }

    pub fn edge_mut_by_key(&mut self, key: &EdgeKey) -> Option<&mut E> {
        self.edge_mut(&key.v, &key.w, key.name.as_deref())
    }

    pub fn has_edge(&self, v: &str, w: &str, name: Option<&str>) -> bool {
        self.edge(v, w, name).is_some()
    }

    pub fn remove_edge(&mut self, v: &str, w: &str, name: Option<&str>) -> Option<E> {
        let key = EdgeKey::new(v, w, name);
        self.remove_edge_key(&key)
    }

    pub fn remove_edge_key(&mut self, key: &EdgeKey) -> Option<E> {
        let eix = self.edge_index.get(key).copied()?;
        self.remove_edge_by_ix(eix)
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeKey> {
        self.edges.iter().filter_map(|e| e.as_ref().map(|e| &e.key))
    }

    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        self.edges().cloned().collect()
    }

    pub fn for_each_edge(&self, mut f: impl FnMut(&EdgeKey, &E)) {
        for e in self.edges.iter().flatten() {
            f(&e.key, &e.label);
        }
    }

    pub fn for_each_edge_mut(&mut self, mut f: impl FnMut(&EdgeKey, &mut E)) {
        for e in self.edges.iter_mut().flatten() {
            f(&e.key, &mut e.label);
        }
    }

    pub fn for_each_edge_ix(&self, mut f: impl FnMut(usize, usize, &EdgeKey, &E)) {
        for e in self.edges.iter().flatten() {
            f(e.v_ix, e.w_ix, &e.key, &e.label);
        }
    }

    pub fn for_each_out_edge(&self, v: &str, w: Option<&str>, mut f: impl FnMut(&EdgeKey, &E)) {
        let Some(ix) = self.node_ix(v) else {
            return;
        };
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        for &eix in &self.out_adj[ix] {
            if !seen.insert(eix) {
                continue;
            }
            let Some(e) = self.edges[eix].as_ref() else {
                continue;
            };
            if w.is_some_and(|w| e.key.w != w) {
                continue;
            }
            f(&e.key, &e.label);
        }
        if !self.options.directed {
            for &eix in &self.in_adj[ix] {
                if !seen.insert(eix) {
                    continue;
                }
                let Some(e) = self.edges[eix].as_ref() else {
                    continue;
                };
                let other = if e.key.v == v { e.key.w.as_str() } else { e.key.v.as_str() };
                if w.is_some_and(|w| other != w) {
                    continue;
                }
                f(&e.key, &e.label);
            }
        }
    }

    pub fn for_each_in_edge(&self, v: &str, u: Option<&str>, mut f: impl FnMut(&EdgeKey, &E)) {
        let Some(ix) = self.node_ix(v) else {
            return;
        };
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        for &eix in &self.in_adj[ix] {
            if !seen.insert(eix) {
                continue;
            }
            let Some(e) = self.edges[eix].as_ref() else {
                continue;
            };
            if u.is_some_and(|u| e.key.v != u) {
                continue;
            }
            f(&e.key, &e.label);
        }
        if !self.options.directed {
            for &eix in &self.out_adj[ix] {
                if !seen.insert(eix) {
                    continue;
                }
                let Some(e) = self.edges[eix].as_ref() else {
                    continue;
                };
                let other = if e.key.w == v { e.key.v.as_str() } else { e.key.w.as_str() };
                if u.is_some_and(|u| other != u) {
                    continue;
                }
                f(&e.key, &e.label);
            }
        }
    }

    pub fn out_edges(&self, v: &str, w: Option<&str>) -> Vec<EdgeKey> {
        let mut out = Vec::new();
        self.for_each_out_edge(v, w, |key, _| out.push(key.clone()));
        out
    }

    pub fn in_edges(&self, v: &str, u: Option<&str>) -> Vec<EdgeKey> {
        let mut out = Vec::new();
        self.for_each_in_edge(v, u, |key, _| out.push(key.clone()));
        out
    }
}
