use crate::edge::EdgeId;
use crate::geometry::{Point, Segment};
use crate::node::NodeId;

/// Structural and geometric changes, delivered synchronously to every
/// subscriber right after the graph has applied them.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    NodeRenamed { from: NodeId, to: NodeId },
    NodeMoved { id: NodeId, position: Point },
    NodeUpdated(NodeId),
    EdgeAdded(EdgeId),
    EdgeRemoved(EdgeId),
    EdgeUpdated(EdgeId),
    /// An edge's routed segment was recomputed.
    EdgeRerouted { id: EdgeId, route: Segment },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&GraphEvent)>;

#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback)>,
}

impl Observers {
    pub(crate) fn subscribe(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, callback));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub(crate) fn notify(&mut self, event: &GraphEvent) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
