// Graph aggregate - owns every node and edge record and keeps routed edge
// geometry in sync with node positions.

use crate::attrs::AttrMap;
use crate::edge::{Edge, EdgeId, EdgeParams};
use crate::error::{GraphError, Result};
use crate::geometry::{Point, Segment, route_between};
use crate::node::{Node, NodeId};
use crate::observer::{GraphEvent, Observers, SubscriptionId};
use indexmap::IndexMap;
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;

type Storage = StableGraph<Node, Edge>;

/// An edge together with its resolved endpoints.
#[derive(Debug, Clone, Copy)]
pub struct EdgeEntry<'a> {
    pub edge: &'a Edge,
    pub source: &'a Node,
    pub target: &'a Node,
}

impl EdgeEntry<'_> {
    pub fn id(&self) -> EdgeId {
        self.edge.id
    }
}

/// The editable network. Nodes and edges iterate in insertion order, so
/// everything derived from a graph (exports, assembled descriptions) is
/// reproducible for an unchanged graph.
#[derive(Debug, Default)]
pub struct Graph {
    g: Storage,
    nodes: IndexMap<NodeId, NodeIndex>,
    edges: IndexMap<EdgeId, EdgeIndex>,
    next_edge: u64,
    observers: Observers,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register a callback invoked synchronously after every change.
    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&GraphEvent) + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    /// Move the subscriptions of `other` onto this graph, e.g. when a loaded
    /// file replaces the graph a presentation layer is attached to.
    pub fn adopt_subscribers(&mut self, other: &mut Graph) {
        self.observers = std::mem::take(&mut other.observers);
    }

    fn emit(&mut self, event: GraphEvent) {
        self.observers.notify(&event);
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    fn index_of(&self, id: &NodeId) -> Result<NodeIndex> {
        self.nodes
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::node_not_found(id))
    }

    /// Node record, as shown by an attribute dialog.
    pub fn node(&self, id: &NodeId) -> Result<&Node> {
        Ok(&self.g[self.index_of(id)?])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values().map(move |&idx| &self.g[idx])
    }

    /// First label `<prefix><n>` with `n >= start` that is not in use,
    /// together with the `n` that produced it.
    pub fn fresh_id(&self, prefix: &str, start: usize) -> (NodeId, usize) {
        let mut n = start;
        loop {
            let id = NodeId::new(format!("{prefix}{n}"));
            if !self.contains_node(&id) {
                return (id, n);
            }
            n += 1;
        }
    }

    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        if self.contains_node(&node.id) {
            return Err(GraphError::DuplicateId(node.id.to_string()));
        }
        if node.id.as_str().is_empty() {
            return Err(GraphError::invalid("id", "must not be empty"));
        }
        node.kind.validate()?;
        if !node.position.is_finite() {
            return Err(GraphError::invalid("position", "must be finite"));
        }
        if !(node.radius.is_finite() && node.radius > 0.0) {
            return Err(GraphError::invalid("radius", "must be positive"));
        }

        let id = node.id.clone();
        log::debug!("add {} node '{}'", node.kind.name(), id);
        let idx = self.g.add_node(node);
        self.nodes.insert(id.clone(), idx);
        self.emit(GraphEvent::NodeAdded(id.clone()));
        Ok(id)
    }

    /// Remove a node, first detaching every edge that references it.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node> {
        let idx = self.index_of(id)?;
        for edge_idx in self.incident_edges(idx) {
            if let Some(edge) = self.g.remove_edge(edge_idx) {
                self.edges.shift_remove(&edge.id);
                log::debug!("cascade remove edge {} of '{}'", edge.id, id);
                self.emit(GraphEvent::EdgeRemoved(edge.id));
            }
        }
        self.nodes.shift_remove(id);
        let node = self
            .g
            .remove_node(idx)
            .ok_or_else(|| GraphError::node_not_found(id))?;
        log::debug!("remove node '{}'", id);
        self.emit(GraphEvent::NodeRemoved(id.clone()));
        Ok(node)
    }

    /// Change a node's label. Edges stay attached.
    pub fn rename_node(&mut self, id: &NodeId, new_id: NodeId) -> Result<()> {
        if *id == new_id {
            return self.index_of(id).map(|_| ());
        }
        if new_id.as_str().is_empty() {
            return Err(GraphError::invalid("id", "must not be empty"));
        }
        if self.contains_node(&new_id) {
            return Err(GraphError::DuplicateId(new_id.to_string()));
        }
        let (pos, _, idx) = self
            .nodes
            .shift_remove_full(id)
            .ok_or_else(|| GraphError::node_not_found(id))?;
        self.nodes.shift_insert(pos, new_id.clone(), idx);
        self.g[idx].id = new_id.clone();
        log::debug!("rename node '{}' -> '{}'", id, new_id);
        self.emit(GraphEvent::NodeRenamed {
            from: id.clone(),
            to: new_id,
        });
        Ok(())
    }

    /// Kind-specific attributes of a node, as an attribute dialog shows them.
    pub fn node_attrs(&self, id: &NodeId) -> Result<AttrMap> {
        self.node(id).map(|node| node.kind.attrs())
    }

    /// Merge kind-specific attributes into a node. Either every entry of
    /// `patch` applies or none does.
    pub fn set_node_attrs(&mut self, id: &NodeId, patch: &AttrMap) -> Result<()> {
        let idx = self.index_of(id)?;
        let kind = self.g[idx].kind.patched(patch)?;
        self.g[idx].kind = kind;
        self.emit(GraphEvent::NodeUpdated(id.clone()));
        Ok(())
    }

    /// Move a node's center and reroute every edge attached to it before
    /// returning.
    pub fn move_node(&mut self, id: &NodeId, position: Point) -> Result<()> {
        if !position.is_finite() {
            return Err(GraphError::invalid("position", "must be finite"));
        }
        let idx = self.index_of(id)?;
        self.g[idx].position = position;
        let rerouted = self.reroute_incident(idx);
        self.emit(GraphEvent::NodeMoved {
            id: id.clone(),
            position,
        });
        for (id, route) in rerouted {
            self.emit(GraphEvent::EdgeRerouted { id, route });
        }
        Ok(())
    }

    pub fn set_node_radius(&mut self, id: &NodeId, radius: f64) -> Result<()> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(GraphError::invalid("radius", "must be positive"));
        }
        let idx = self.index_of(id)?;
        self.g[idx].radius = radius;
        let rerouted = self.reroute_incident(idx);
        self.emit(GraphEvent::NodeUpdated(id.clone()));
        for (id, route) in rerouted {
            self.emit(GraphEvent::EdgeRerouted { id, route });
        }
        Ok(())
    }

    /// Topmost node whose circle contains `point`. Later insertions are
    /// drawn on top of earlier ones.
    pub fn node_at(&self, point: Point) -> Option<&NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|(_, idx)| self.g[**idx].contains(point))
            .map(|(id, _)| id)
    }

    fn incident_edges(&self, idx: NodeIndex) -> Vec<EdgeIndex> {
        let mut incident: Vec<EdgeIndex> = self
            .g
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.g.edges_directed(idx, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        // self-loops show up in both directions
        incident.sort();
        incident.dedup();
        incident
    }

    fn reroute_incident(&mut self, idx: NodeIndex) -> Vec<(EdgeId, Segment)> {
        let mut rerouted = Vec::new();
        for edge_idx in self.incident_edges(idx) {
            let Some(route) = self.compute_route(edge_idx) else {
                continue;
            };
            if let Some(edge) = self.g.edge_weight_mut(edge_idx) {
                edge.route = route;
                rerouted.push((edge.id, route));
            }
        }
        rerouted
    }

    fn compute_route(&self, edge_idx: EdgeIndex) -> Option<Segment> {
        let (s, t) = self.g.edge_endpoints(edge_idx)?;
        let (source, target) = (&self.g[s], &self.g[t]);
        Some(route_between(
            source.position,
            source.radius,
            target.position,
            target.radius,
        ))
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        params: EdgeParams,
    ) -> Result<EdgeId> {
        self.add_edge_with_extra(source, target, params, AttrMap::new())
    }

    pub fn add_edge_with_extra(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        params: EdgeParams,
        extra: AttrMap,
    ) -> Result<EdgeId> {
        let s = self.index_of(source)?;
        let t = self.index_of(target)?;
        params.validate()?;

        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        let (src, tgt) = (&self.g[s], &self.g[t]);
        let route =
            route_between(src.position, src.radius, tgt.position, tgt.radius);
        let edge_idx = self.g.add_edge(
            s,
            t,
            Edge {
                id,
                params,
                extra,
                route,
            },
        );
        self.edges.insert(id, edge_idx);
        log::debug!("add edge {} '{}' -> '{}'", id, source, target);
        self.emit(GraphEvent::EdgeAdded(id));
        Ok(id)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<Edge> {
        let edge_idx = self
            .edges
            .shift_remove(&id)
            .ok_or_else(|| GraphError::edge_not_found(id))?;
        let edge = self
            .g
            .remove_edge(edge_idx)
            .ok_or_else(|| GraphError::edge_not_found(id))?;
        log::debug!("remove edge {}", id);
        self.emit(GraphEvent::EdgeRemoved(id));
        Ok(edge)
    }

    fn entry(&self, edge_idx: EdgeIndex) -> Option<EdgeEntry<'_>> {
        let (s, t) = self.g.edge_endpoints(edge_idx)?;
        Some(EdgeEntry {
            edge: self.g.edge_weight(edge_idx)?,
            source: &self.g[s],
            target: &self.g[t],
        })
    }

    pub fn edge(&self, id: EdgeId) -> Result<EdgeEntry<'_>> {
        self.edges
            .get(&id)
            .and_then(|&edge_idx| self.entry(edge_idx))
            .ok_or_else(|| GraphError::edge_not_found(id))
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeEntry<'_>> + '_ {
        self.edges
            .values()
            .filter_map(move |&edge_idx| self.entry(edge_idx))
    }

    pub fn set_edge_attrs(&mut self, id: EdgeId, patch: &AttrMap) -> Result<()> {
        let edge_idx = *self
            .edges
            .get(&id)
            .ok_or_else(|| GraphError::edge_not_found(id))?;
        let edge = self
            .g
            .edge_weight_mut(edge_idx)
            .ok_or_else(|| GraphError::edge_not_found(id))?;
        edge.params = edge.params.patched(patch)?;
        self.emit(GraphEvent::EdgeUpdated(id));
        Ok(())
    }

    pub fn edge_attrs(&self, id: EdgeId) -> Result<AttrMap> {
        self.edge(id).map(|entry| entry.edge.params.attrs())
    }

    /// Current boundary-to-boundary segment of an edge.
    pub fn edge_route(&self, id: EdgeId) -> Result<Segment> {
        self.edge(id).map(|entry| entry.edge.route)
    }

    /// Topmost edge whose routed segment passes within `tolerance` of
    /// `point`.
    pub fn edge_at(&self, point: Point, tolerance: f64) -> Option<EdgeId> {
        self.edges
            .iter()
            .rev()
            .find(|(_, edge_idx)| {
                self.g
                    .edge_weight(**edge_idx)
                    .is_some_and(|e| e.route.distance_to(point) <= tolerance)
            })
            .map(|(id, _)| *id)
    }
}

/// Attribute-for-attribute equality: ids, kinds, positions, radii and
/// opaque attributes of nodes; endpoints, parameters and opaque attributes
/// of edges, both in iteration order. Edge handles and subscriptions are
/// not part of a graph's value.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes().eq(other.nodes())
            && self.edge_count() == other.edge_count()
            && self.edges().zip(other.edges()).all(|(a, b)| {
                a.source.id == b.source.id
                    && a.target.id == b.target.id
                    && a.edge.params == b.edge.params
                    && a.edge.extra == b.edge.extra
            })
    }
}
