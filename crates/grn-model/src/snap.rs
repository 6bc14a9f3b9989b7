use crate::geometry::Point;
use crate::graph::Graph;
use crate::node::NodeId;

/// Resolves which node a drafted edge endpoint should lock onto.
pub trait SpatialIndex {
    /// The node whose center is strictly closer than the snap radius to
    /// `point`, preferring the closest one. `exclude` is never returned.
    fn find_nearest(
        &self,
        graph: &Graph,
        point: Point,
        exclude: Option<&NodeId>,
    ) -> Option<NodeId>;
}

/// Linear scan over every node; graphs edited by hand stay small.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScan {
    pub snap_radius: f64,
}

impl LinearScan {
    pub const DEFAULT_SNAP_RADIUS: f64 = 40.0;

    pub fn new(snap_radius: f64) -> Self {
        Self { snap_radius }
    }
}

impl Default for LinearScan {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SNAP_RADIUS)
    }
}

impl SpatialIndex for LinearScan {
    fn find_nearest(
        &self,
        graph: &Graph,
        point: Point,
        exclude: Option<&NodeId>,
    ) -> Option<NodeId> {
        let mut best: Option<(&NodeId, f64)> = None;
        for node in graph.nodes() {
            if exclude == Some(&node.id) {
                continue;
            }
            let dist = node.position.distance(point);
            // strict comparisons: ties keep the earlier node, and a node
            // exactly on the radius does not snap
            let limit = best.map_or(self.snap_radius, |(_, d)| d);
            if dist < limit {
                best = Some((&node.id, dist));
            }
        }
        best.map(|(id, _)| id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, NodeKind};

    fn two_nodes() -> Graph {
        let mut g = Graph::new();
        g.add_node(Node::new("A", NodeKind::Input, Point::new(0.0, 0.0)))
            .unwrap();
        g.add_node(Node::new("B", NodeKind::Input, Point::new(100.0, 0.0)))
            .unwrap();
        g
    }

    #[test]
    fn snaps_to_closest_within_radius() {
        let g = two_nodes();
        let scan = LinearScan::default();
        assert_eq!(
            scan.find_nearest(&g, Point::new(10.0, 0.0), None),
            Some(NodeId::new("A"))
        );
        assert_eq!(
            scan.find_nearest(&g, Point::new(70.0, 0.0), None),
            Some(NodeId::new("B"))
        );
    }

    #[test]
    fn boundary_distance_does_not_snap() {
        let g = two_nodes();
        let scan = LinearScan::default();
        // 60 from A, exactly 40 from B
        assert_eq!(scan.find_nearest(&g, Point::new(60.0, 0.0), None), None);
        assert_eq!(scan.find_nearest(&g, Point::new(40.0, 0.0), None), None);
    }

    #[test]
    fn excluded_node_is_skipped() {
        let g = two_nodes();
        let scan = LinearScan::new(80.0);
        let a = NodeId::new("A");
        assert_eq!(
            scan.find_nearest(&g, Point::new(30.0, 0.0), Some(&a)),
            Some(NodeId::new("B"))
        );
        assert_eq!(
            LinearScan::default().find_nearest(
                &g,
                Point::new(1.0, 0.0),
                Some(&a)
            ),
            None
        );
    }

    #[test]
    fn ties_go_to_iteration_order() {
        let g = two_nodes();
        let scan = LinearScan::new(60.0);
        assert_eq!(
            scan.find_nearest(&g, Point::new(50.0, 0.0), None),
            Some(NodeId::new("A"))
        );
    }
}
