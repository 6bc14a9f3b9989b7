use crate::effects::Effect;
use crate::error::{EditorError, Result};
use crate::settings::NodeClass;
use crate::store::{EditMode, Selection, Store};
use grn_model::{AttrMap, EdgeId, EdgeParams, Graph, Node, NodeId, Point};
use std::path::PathBuf;

/// Actions that can be dispatched to modify the editor state
#[derive(Debug, Clone)]
pub enum Action {
    // Node Actions
    /// Add a node of the given class with default attributes
    SpawnNode { class: NodeClass },
    /// Add a fully specified node
    AddNode { node: Node },
    /// Remove a node and every edge attached to it
    RemoveNode { id: NodeId },
    RenameNode { id: NodeId, new_id: NodeId },
    /// Merge kind-specific attributes edited in a dialog
    UpdateNodeAttrs { id: NodeId, attrs: AttrMap },
    MoveNode { id: NodeId, position: Point },

    // Edge Actions
    AddEdge {
        source: NodeId,
        target: NodeId,
        params: EdgeParams,
    },
    RemoveEdge { id: EdgeId },
    UpdateEdgeAttrs { id: EdgeId, attrs: AttrMap },

    // Interaction
    /// Change between NodeEditor and EdgeEditor modes
    SetEditMode { mode: EditMode },
    PointerPressed { position: Point },
    PointerMoved { position: Point },
    PointerReleased { position: Point },
    /// Drop the edge being drafted, if any
    CancelDraft,
    Select { selection: Option<Selection> },
    DeleteSelection,

    // Simulation schedule
    AddInterval,
    RemoveInterval { index: usize },
    SetInputLevel {
        input: NodeId,
        interval: usize,
        level: f64,
    },
    SetIntervalDuration { duration: f64 },

    // File Operations
    /// Start over with an empty graph
    NewGraph,
    SaveToFile { path: PathBuf },
    LoadFromFile { path: PathBuf },
    /// Write the assembled network as JSON
    ExportDescription { path: PathBuf },
    /// Write a simulation request as JSON
    ExportSimulation { path: PathBuf },
    /// Clear any error message
    ClearErrorMessage,
}

/// Apply `action` to the store. A failing action leaves the store as it
/// was and produces no effects.
pub fn update(store: &mut Store, action: Action) -> Result<Vec<Effect>> {
    match action {
        // Node Actions
        Action::SpawnNode { class } => {
            store.spawn_node(class)?;
        }
        Action::AddNode { node } => {
            store.add_node(node)?;
        }
        Action::RemoveNode { id } => store.remove_node(&id)?,
        Action::RenameNode { id, new_id } => store.rename_node(&id, new_id)?,
        Action::UpdateNodeAttrs { id, attrs } => store.set_node_attrs(&id, &attrs)?,
        Action::MoveNode { id, position } => store.move_node(&id, position)?,

        // Edge Actions
        Action::AddEdge {
            source,
            target,
            params,
        } => {
            store.add_edge(&source, &target, params)?;
        }
        Action::RemoveEdge { id } => store.remove_edge(id)?,
        Action::UpdateEdgeAttrs { id, attrs } => store.set_edge_attrs(id, &attrs)?,

        // Interaction
        Action::SetEditMode { mode } => store.set_mode(mode),
        Action::PointerPressed { position } => store.pointer_pressed(position)?,
        Action::PointerMoved { position } => store.pointer_moved(position)?,
        Action::PointerReleased { position } => {
            store.pointer_released(position)?;
        }
        Action::CancelDraft => store.cancel_draft(),
        Action::Select { selection } => store.selection = selection,
        Action::DeleteSelection => store.delete_selection()?,

        // Simulation schedule
        Action::AddInterval => store.add_interval(),
        Action::RemoveInterval { index } => store.schedule.remove_interval(index)?,
        Action::SetInputLevel {
            input,
            interval,
            level,
        } => store.schedule.set_level(&input, interval, level)?,
        Action::SetIntervalDuration { duration } => {
            if !(duration.is_finite() && duration > 0.0) {
                return Err(EditorError::InvalidSchedule(format!(
                    "interval duration must be positive, got {duration}"
                )));
            }
            store.interval_duration = duration;
        }

        // File Operations
        Action::NewGraph => {
            store.replace_graph(Graph::new());
            store.current_file = None;
        }
        Action::SaveToFile { path } => return Ok(vec![Effect::SaveToFile { path }]),
        Action::LoadFromFile { path } => return Ok(vec![Effect::LoadFromFile { path }]),
        Action::ExportDescription { path } => {
            return Ok(vec![Effect::ExportDescription { path }]);
        }
        Action::ExportSimulation { path } => {
            return Ok(vec![Effect::ExportSimulation { path }]);
        }
        Action::ClearErrorMessage => store.error_message = None,
    }
    Ok(vec![])
}
