use crate::error::Result;
use crate::settings::{EditorSettings, NodeClass};
use crate::simulation::{InputSchedule, SimulationRequest};
use crate::versioned::Versioned;
use grn_model::{
    AttrMap, DraftEnd, EdgeDraft, EdgeId, EdgeParams, Graph, GraphDescription, Highlight,
    LinearScan, Node, NodeId, NodeKind, Point, Segment, graphml,
};
use std::path::{Path, PathBuf};

/// Pointer distance within which a press picks an edge.
pub const EDGE_PICK_TOLERANCE: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Pointer presses select, drags move nodes.
    #[default]
    NodeEditor,
    /// Pointer drags draft new edges.
    EdgeEditor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Node(NodeId),
    Edge(EdgeId),
}

/// Next label number and position of one spawn column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnColumn {
    pub counter: usize,
    pub position: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spawner {
    pub input: SpawnColumn,
    pub gene: SpawnColumn,
    pub output: SpawnColumn,
}

impl Spawner {
    pub fn new(settings: &EditorSettings) -> Self {
        let column = |class| SpawnColumn {
            counter: 1,
            position: settings.spawn.anchor(class),
        };
        Self {
            input: column(NodeClass::Input),
            gene: column(NodeClass::Gene),
            output: column(NodeClass::Output),
        }
    }

    pub fn column_mut(&mut self, class: NodeClass) -> &mut SpawnColumn {
        match class {
            NodeClass::Input => &mut self.input,
            NodeClass::Gene => &mut self.gene,
            NodeClass::Output => &mut self.output,
        }
    }
}

/// A node being dragged in node-editor mode, with the offset between the
/// pointer and the node center at the time of the press.
#[derive(Debug, Clone, PartialEq)]
struct NodeDrag {
    id: NodeId,
    dx: f64,
    dy: f64,
}

/// Editor state driven by a presentation layer.
#[derive(Debug)]
pub struct Store {
    pub graph: Versioned<Graph>,
    pub draft: EdgeDraft,
    pub mode: EditMode,
    pub selection: Option<Selection>,
    /// Node currently highlighted as a snap target.
    pub highlighted: Option<NodeId>,
    pub spawner: Spawner,
    pub schedule: InputSchedule,
    pub interval_duration: f64,
    pub settings: EditorSettings,
    pub current_file: Option<PathBuf>,
    pub error_message: Option<String>,
    drag: Option<NodeDrag>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl Store {
    pub fn new(settings: EditorSettings) -> Self {
        Self {
            graph: Versioned::new(Graph::new()),
            draft: Self::new_draft(&settings),
            mode: EditMode::default(),
            selection: None,
            highlighted: None,
            spawner: Spawner::new(&settings),
            schedule: InputSchedule::new(),
            interval_duration: settings.simulation.interval_duration,
            settings,
            current_file: None,
            error_message: None,
            drag: None,
        }
    }

    fn new_draft(settings: &EditorSettings) -> EdgeDraft {
        EdgeDraft::new(
            LinearScan::new(settings.snap_radius),
            settings.defaults.edge,
        )
    }

    pub fn graph(&self) -> &Graph {
        self.graph.get()
    }

    // ------------------------------------------------------------------
    // Nodes and edges
    // ------------------------------------------------------------------

    /// Add a node of `class` with the default attributes, labelled from the
    /// class counter and placed in the class column.
    pub fn spawn_node(&mut self, class: NodeClass) -> Result<NodeId> {
        let column = self.spawner.column_mut(class);
        let (id, n) = self.graph.get().fresh_id(class.prefix(), column.counter);
        let node = Node::new(id, self.settings.defaults.kind(class), column.position)
            .with_radius(self.settings.node_radius);
        let id = self.graph.get_mut().add_node(node)?;
        column.counter = n + 1;
        column.position = column.position.offset(0.0, self.settings.spawn.spacing);
        log::info!("spawned node '{}'", id);
        Ok(id)
    }

    pub fn add_node(&mut self, node: Node) -> Result<NodeId> {
        Ok(self.graph.get_mut().add_node(node)?)
    }

    pub fn remove_node(&mut self, id: &NodeId) -> Result<()> {
        self.graph.get_mut().remove_node(id)?;
        if self.draft.source() == Some(id) {
            self.cancel_draft();
        }
        if self.highlighted.as_ref() == Some(id) {
            self.highlighted = None;
        }
        if self.drag.as_ref().is_some_and(|d| &d.id == id) {
            self.drag = None;
        }
        self.forget_stale_selection();
        Ok(())
    }

    pub fn rename_node(&mut self, id: &NodeId, new_id: NodeId) -> Result<()> {
        self.graph.get_mut().rename_node(id, new_id.clone())?;
        self.schedule.rename_input(id, new_id.clone());
        if self.selection.as_ref() == Some(&Selection::Node(id.clone())) {
            self.selection = Some(Selection::Node(new_id.clone()));
        }
        if self.highlighted.as_ref() == Some(id) {
            self.highlighted = Some(new_id.clone());
        }
        if let Some(drag) = self.drag.as_mut()
            && &drag.id == id
        {
            drag.id = new_id;
        }
        Ok(())
    }

    pub fn set_node_attrs(&mut self, id: &NodeId, patch: &AttrMap) -> Result<()> {
        Ok(self.graph.get_mut().set_node_attrs(id, patch)?)
    }

    pub fn move_node(&mut self, id: &NodeId, position: Point) -> Result<()> {
        Ok(self.graph.get_mut().move_node(id, position)?)
    }

    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        params: EdgeParams,
    ) -> Result<EdgeId> {
        Ok(self.graph.get_mut().add_edge(source, target, params)?)
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        self.graph.get_mut().remove_edge(id)?;
        self.forget_stale_selection();
        Ok(())
    }

    pub fn set_edge_attrs(&mut self, id: EdgeId, patch: &AttrMap) -> Result<()> {
        Ok(self.graph.get_mut().set_edge_attrs(id, patch)?)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    /// Select the node under `point`, or failing that the edge under it.
    pub fn select_at(&mut self, point: Point) -> Option<&Selection> {
        let graph = self.graph.get();
        self.selection = graph
            .node_at(point)
            .cloned()
            .map(Selection::Node)
            .or_else(|| graph.edge_at(point, EDGE_PICK_TOLERANCE).map(Selection::Edge));
        self.selection.as_ref()
    }

    pub fn delete_selection(&mut self) -> Result<()> {
        match self.selection.take() {
            Some(Selection::Node(id)) => self.remove_node(&id),
            Some(Selection::Edge(id)) => self.remove_edge(id),
            None => Ok(()),
        }
    }

    fn forget_stale_selection(&mut self) {
        let graph = self.graph.get();
        let live = match &self.selection {
            Some(Selection::Node(id)) => graph.contains_node(id),
            Some(Selection::Edge(id)) => graph.edge(*id).is_ok(),
            None => true,
        };
        if !live {
            self.selection = None;
        }
    }

    // ------------------------------------------------------------------
    // Edge drafting
    // ------------------------------------------------------------------

    /// Start drafting from the node under `point`. Returns the source, or
    /// `None` when the press hit empty space.
    pub fn begin_draft(&mut self, point: Point) -> Result<Option<NodeId>> {
        let graph = self.graph.get();
        let Some(source) = graph.node_at(point).cloned() else {
            return Ok(None);
        };
        self.draft.begin(graph, &source)?;
        Ok(Some(source))
    }

    pub fn update_draft(&mut self, point: Point) -> Result<()> {
        let highlights = self.draft.update(self.graph.get(), point)?;
        self.apply_highlights(highlights);
        Ok(())
    }

    /// Release the draft; returns the committed edge, if any.
    pub fn end_draft(&mut self) -> Result<Option<EdgeId>> {
        let DraftEnd {
            created,
            highlights,
        } = self.draft.end(self.graph.get_mut())?;
        self.apply_highlights(highlights);
        Ok(created)
    }

    pub fn cancel_draft(&mut self) {
        let highlights = self.draft.cancel();
        self.apply_highlights(highlights);
    }

    /// Transient edge to draw while drafting.
    pub fn draft_preview(&self) -> Option<Segment> {
        self.draft.preview(self.graph.get())
    }

    fn apply_highlights(&mut self, highlights: Vec<Highlight>) {
        for highlight in highlights {
            match highlight {
                Highlight::On(id) => self.highlighted = Some(id),
                Highlight::Off(id) => {
                    if self.highlighted.as_ref() == Some(&id) {
                        self.highlighted = None;
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Pointer routing
    // ------------------------------------------------------------------

    pub fn set_mode(&mut self, mode: EditMode) {
        if self.mode == mode {
            return;
        }
        match self.mode {
            EditMode::EdgeEditor => self.cancel_draft(),
            EditMode::NodeEditor => self.drag = None,
        }
        log::debug!("edit mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
    }

    pub fn pointer_pressed(&mut self, point: Point) -> Result<()> {
        match self.mode {
            EditMode::EdgeEditor => {
                self.begin_draft(point)?;
            }
            EditMode::NodeEditor => {
                let selected = self.select_at(point).cloned();
                self.drag = match selected {
                    Some(Selection::Node(id)) => {
                        self.graph.get().node(&id).ok().map(|node| NodeDrag {
                            dx: node.position.x - point.x,
                            dy: node.position.y - point.y,
                            id,
                        })
                    }
                    _ => None,
                };
            }
        }
        Ok(())
    }

    pub fn pointer_moved(&mut self, point: Point) -> Result<()> {
        match self.mode {
            EditMode::EdgeEditor if self.draft.is_active() => self.update_draft(point),
            EditMode::NodeEditor => match self.drag.clone() {
                Some(drag) => self.move_node(&drag.id, point.offset(drag.dx, drag.dy)),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }

    /// Returns the edge committed by the release, if any.
    pub fn pointer_released(&mut self, point: Point) -> Result<Option<EdgeId>> {
        match self.mode {
            EditMode::EdgeEditor if self.draft.is_active() => {
                self.update_draft(point)?;
                self.end_draft()
            }
            EditMode::NodeEditor => {
                self.drag = None;
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    // ------------------------------------------------------------------
    // Simulation schedule
    // ------------------------------------------------------------------

    pub fn input_ids(&self) -> Vec<NodeId> {
        self.graph
            .get()
            .nodes()
            .filter(|node| node.kind == NodeKind::Input)
            .map(|node| node.id.clone())
            .collect()
    }

    /// Bring the schedule rows in line with the current input nodes.
    pub fn sync_schedule(&mut self) {
        let inputs = self.input_ids();
        self.schedule
            .sync_inputs(&inputs, self.settings.simulation.default_input_level);
    }

    pub fn add_interval(&mut self) {
        self.schedule
            .add_interval(self.settings.simulation.default_input_level);
    }

    pub fn simulation_request(&self, network: GraphDescription) -> Result<SimulationRequest> {
        SimulationRequest::new(network, &self.schedule, self.interval_duration)
    }

    // ------------------------------------------------------------------
    // Files
    // ------------------------------------------------------------------

    /// Install a new graph, carrying over subscriptions and resetting all
    /// interaction state.
    pub fn replace_graph(&mut self, mut graph: Graph) {
        graph.adopt_subscribers(self.graph.get_mut());
        self.graph.replace(graph);
        self.draft = Self::new_draft(&self.settings);
        self.selection = None;
        self.highlighted = None;
        self.drag = None;
        self.spawner = Spawner::new(&self.settings);
        self.sync_schedule();
    }

    pub fn save_to_file(&mut self, path: &Path) -> Result<()> {
        graphml::save_to_file(self.graph.get(), path)?;
        self.current_file = Some(path.to_path_buf());
        Ok(())
    }

    pub fn load_from_file(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let graph = graphml::import_with_radius(&bytes, self.settings.node_radius)?;
        log::info!(
            "loaded {} nodes and {} edges from {}",
            graph.node_count(),
            graph.edge_count(),
            path.display()
        );
        self.replace_graph(graph);
        self.current_file = Some(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use grn_model::{GraphError, LogicType, attrs};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    fn labels(store: &Store) -> Vec<String> {
        store.graph().nodes().map(|n| n.id.to_string()).collect()
    }

    #[test]
    fn spawn_uses_counters_and_columns() {
        let mut store = Store::default();
        store.spawn_node(NodeClass::Input).unwrap();
        store.spawn_node(NodeClass::Input).unwrap();
        store.spawn_node(NodeClass::Gene).unwrap();
        store.spawn_node(NodeClass::Output).unwrap();
        assert_eq!(labels(&store), vec!["I1", "I2", "G1", "O1"]);

        let g = store.graph();
        assert_eq!(g.node(&id("I2")).unwrap().position, Point::new(50.0, 110.0));
        assert_eq!(g.node(&id("G1")).unwrap().position, Point::new(200.0, 50.0));
        assert_eq!(
            g.node(&id("G1")).unwrap().kind,
            NodeKind::gene(10.0, LogicType::And)
        );
        assert_eq!(g.node(&id("O1")).unwrap().kind, NodeKind::output(0.1));
    }

    #[test]
    fn spawn_skips_labels_in_use() {
        let mut store = Store::default();
        store
            .add_node(Node::new("G1", NodeKind::Input, Point::new(0.0, 0.0)))
            .unwrap();
        assert_eq!(store.spawn_node(NodeClass::Gene).unwrap(), id("G2"));
        assert_eq!(store.spawn_node(NodeClass::Gene).unwrap(), id("G3"));
    }

    fn two_genes() -> Store {
        let mut store = Store::default();
        store.spawn_node(NodeClass::Gene).unwrap(); // (200, 50)
        store.spawn_node(NodeClass::Gene).unwrap(); // (200, 110)
        store.set_mode(EditMode::EdgeEditor);
        store
    }

    #[test]
    fn pointer_drag_in_edge_mode_creates_edge() {
        let mut store = two_genes();
        store.pointer_pressed(Point::new(205.0, 55.0)).unwrap();
        store.pointer_moved(Point::new(210.0, 100.0)).unwrap();
        assert_eq!(store.highlighted, Some(id("G2")));
        let created = store.pointer_released(Point::new(205.0, 105.0)).unwrap();

        let edge = store.graph().edge(created.unwrap()).unwrap();
        assert_eq!(edge.source.id, id("G1"));
        assert_eq!(edge.target.id, id("G2"));
        assert_eq!(store.highlighted, None);
        assert!(!store.draft.is_active());
    }

    #[test]
    fn press_on_empty_space_does_nothing() {
        let mut store = two_genes();
        store.pointer_pressed(Point::new(600.0, 600.0)).unwrap();
        assert!(!store.draft.is_active());
        assert_eq!(store.pointer_released(Point::new(200.0, 110.0)).unwrap(), None);
        assert_eq!(store.graph().edge_count(), 0);
    }

    #[test]
    fn leaving_edge_mode_cancels_draft() {
        let mut store = two_genes();
        store.pointer_pressed(Point::new(200.0, 50.0)).unwrap();
        store.pointer_moved(Point::new(200.0, 110.0)).unwrap();
        store.set_mode(EditMode::NodeEditor);
        assert!(!store.draft.is_active());
        assert_eq!(store.highlighted, None);
        assert_eq!(store.graph().edge_count(), 0);
    }

    #[test]
    fn double_begin_is_invalid_state() {
        let mut store = two_genes();
        store.begin_draft(Point::new(200.0, 50.0)).unwrap();
        let err = store.begin_draft(Point::new(200.0, 110.0)).unwrap_err();
        assert!(matches!(
            err,
            EditorError::Graph(GraphError::InvalidState(_))
        ));
    }

    #[test]
    fn node_mode_drag_moves_and_reroutes() {
        let mut store = two_genes();
        store.add_edge(&id("G1"), &id("G2"), EdgeParams::default()).unwrap();
        store.set_mode(EditMode::NodeEditor);

        store.pointer_pressed(Point::new(210.0, 110.0)).unwrap();
        assert_eq!(store.selection, Some(Selection::Node(id("G2"))));
        store.pointer_moved(Point::new(310.0, 50.0)).unwrap();
        store.pointer_released(Point::new(310.0, 50.0)).unwrap();

        let g = store.graph();
        assert_eq!(g.node(&id("G2")).unwrap().position, Point::new(300.0, 50.0));
        let route = g.edges().next().unwrap().edge.route;
        assert_eq!(route.start, Point::new(225.0, 50.0));
        assert_eq!(route.end, Point::new(275.0, 50.0));
    }

    #[test]
    fn delete_selection_cascades() {
        let mut store = two_genes();
        store.add_edge(&id("G1"), &id("G2"), EdgeParams::default()).unwrap();
        store.set_mode(EditMode::NodeEditor);
        store.select_at(Point::new(200.0, 80.0));
        assert!(matches!(store.selection, Some(Selection::Edge(_))));
        store.delete_selection().unwrap();
        assert_eq!(store.graph().edge_count(), 0);

        store.add_edge(&id("G1"), &id("G2"), EdgeParams::default()).unwrap();
        store.select_at(Point::new(200.0, 50.0));
        store.delete_selection().unwrap();
        assert_eq!(labels(&store), vec!["G2"]);
        assert_eq!(store.graph().edge_count(), 0);
        assert_eq!(store.selection, None);
    }

    #[test]
    fn rename_follows_selection_and_schedule() {
        let mut store = Store::default();
        store.spawn_node(NodeClass::Input).unwrap();
        store.sync_schedule();
        store.add_interval();
        store.select_at(Point::new(50.0, 50.0));
        store.rename_node(&id("I1"), id("Light")).unwrap();
        assert_eq!(store.selection, Some(Selection::Node(id("Light"))));
        assert_eq!(store.schedule.level(&id("Light"), 0), Some(50.0));
    }

    #[test]
    fn failed_attribute_edit_keeps_value() {
        let mut store = two_genes();
        assert!(store
            .set_node_attrs(&id("G1"), &attrs([("logic_type", "xor")]))
            .is_err());
        assert_eq!(
            store.graph().node_attrs(&id("G1")).unwrap(),
            attrs([
                ("alpha", grn_model::AttrValue::Float(10.0)),
                ("logic_type", grn_model::AttrValue::from("and"))
            ])
        );
    }

    #[test]
    fn load_replaces_graph_and_resets_interaction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.graphml");
        let mut store = two_genes();
        store.spawn_node(NodeClass::Input).unwrap();
        store.save_to_file(&path).unwrap();

        let mut other = Store::default();
        other.spawn_node(NodeClass::Gene).unwrap();
        other.set_mode(EditMode::EdgeEditor);
        other.begin_draft(Point::new(200.0, 50.0)).unwrap();
        other.load_from_file(&path).unwrap();

        assert_eq!(labels(&other), vec!["G1", "G2", "I1"]);
        assert!(!other.draft.is_active());
        assert_eq!(other.spawner.gene.counter, 1);
        assert_eq!(other.spawn_node(NodeClass::Gene).unwrap(), id("G3"));
        assert_eq!(other.schedule.inputs().count(), 1);
        assert_eq!(other.current_file.as_deref(), Some(path.as_path()));
    }
}
