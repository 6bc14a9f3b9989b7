// Drag-to-create edge workflow: press on a source node, drag towards a
// target, release to commit. While dragging, the loose end locks onto the
// nearest node inside the snap radius.

use crate::edge::{EdgeId, EdgeParams};
use crate::error::{GraphError, Result};
use crate::geometry::{Point, Segment};
use crate::graph::Graph;
use crate::node::NodeId;
use crate::snap::{LinearScan, SpatialIndex};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DraftState {
    #[default]
    Idle,
    /// A transient edge from `source`; its loose end follows `cursor`
    /// unless it is locked onto `pinned`.
    Dragging {
        source: NodeId,
        cursor: Point,
        pinned: Option<NodeId>,
    },
}

/// Highlight changes the presentation layer should apply to nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Highlight {
    On(NodeId),
    Off(NodeId),
}

/// Result of releasing a draft.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DraftEnd {
    pub created: Option<EdgeId>,
    pub highlights: Vec<Highlight>,
}

#[derive(Debug, Clone)]
pub struct EdgeDraft<S = LinearScan> {
    state: DraftState,
    index: S,
    params: EdgeParams,
}

impl Default for EdgeDraft<LinearScan> {
    fn default() -> Self {
        Self::new(LinearScan::default(), EdgeParams::default())
    }
}

impl<S: SpatialIndex> EdgeDraft<S> {
    /// `params` are given to every edge this draft commits.
    pub fn new(index: S, params: EdgeParams) -> Self {
        Self {
            state: DraftState::Idle,
            index,
            params,
        }
    }

    pub fn state(&self) -> &DraftState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, DraftState::Dragging { .. })
    }

    pub fn pinned(&self) -> Option<&NodeId> {
        match &self.state {
            DraftState::Dragging { pinned, .. } => pinned.as_ref(),
            DraftState::Idle => None,
        }
    }

    pub fn source(&self) -> Option<&NodeId> {
        match &self.state {
            DraftState::Dragging { source, .. } => Some(source),
            DraftState::Idle => None,
        }
    }

    pub fn index(&self) -> &S {
        &self.index
    }

    pub fn set_params(&mut self, params: EdgeParams) {
        self.params = params;
    }

    /// Start a draft from `source`. Only one draft may be live at a time.
    pub fn begin(&mut self, graph: &Graph, source: &NodeId) -> Result<()> {
        if let DraftState::Dragging { source: live, .. } = &self.state {
            return Err(GraphError::InvalidState(format!(
                "a draft from '{live}' is already in progress"
            )));
        }
        let cursor = graph.node(source)?.position;
        log::debug!("begin draft from '{}'", source);
        self.state = DraftState::Dragging {
            source: source.clone(),
            cursor,
            pinned: None,
        };
        Ok(())
    }

    /// Track the pointer. Returns highlight changes only when the pinned
    /// target actually changes.
    pub fn update(&mut self, graph: &Graph, point: Point) -> Result<Vec<Highlight>> {
        let DraftState::Dragging {
            source,
            cursor,
            pinned,
        } = &mut self.state
        else {
            return Err(GraphError::InvalidState(
                "no draft in progress".to_string(),
            ));
        };
        if !graph.contains_node(source) {
            let source = source.clone();
            self.state = DraftState::Idle;
            return Err(GraphError::node_not_found(source));
        }

        *cursor = point;
        let nearest = self.index.find_nearest(graph, point, Some(&*source));
        if nearest == *pinned {
            return Ok(Vec::new());
        }

        let mut highlights = Vec::with_capacity(2);
        if let Some(previous) = pinned.take() {
            highlights.push(Highlight::Off(previous));
        }
        if let Some(next) = &nearest {
            highlights.push(Highlight::On(next.clone()));
        }
        *pinned = nearest;
        Ok(highlights)
    }

    /// Release the draft. An edge is committed only when the loose end is
    /// pinned to a node other than the source.
    pub fn end(&mut self, graph: &mut Graph) -> Result<DraftEnd> {
        let DraftState::Dragging { source, pinned, .. } =
            std::mem::take(&mut self.state)
        else {
            return Err(GraphError::InvalidState(
                "no draft in progress".to_string(),
            ));
        };

        let mut outcome = DraftEnd::default();
        if let Some(target) = &pinned {
            outcome.highlights.push(Highlight::Off(target.clone()));
        }
        match pinned {
            Some(target) if target != source => {
                let id = graph.add_edge(&source, &target, self.params)?;
                log::debug!("draft committed edge {} '{}' -> '{}'", id, source, target);
                outcome.created = Some(id);
            }
            _ => log::debug!("draft from '{}' discarded", source),
        }
        Ok(outcome)
    }

    /// Drop any live draft without committing it.
    pub fn cancel(&mut self) -> Vec<Highlight> {
        match std::mem::take(&mut self.state) {
            DraftState::Dragging { source, pinned, .. } => {
                log::debug!("draft from '{}' cancelled", source);
                pinned.map(Highlight::Off).into_iter().collect()
            }
            DraftState::Idle => Vec::new(),
        }
    }

    /// Segment of the transient edge: from the source center to the pinned
    /// node's center, or to the raw cursor when nothing is pinned.
    pub fn preview(&self, graph: &Graph) -> Option<Segment> {
        let DraftState::Dragging {
            source,
            cursor,
            pinned,
        } = &self.state
        else {
            return None;
        };
        let start = graph.node(source).ok()?.position;
        let end = pinned
            .as_ref()
            .and_then(|id| graph.node(id).ok())
            .map_or(*cursor, |node| node.position);
        Some(Segment::new(start, end))
    }
}
