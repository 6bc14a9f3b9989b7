use crate::actions::{self, Action};
use crate::cache::Cache;
use crate::effects::{self, Effect};
use crate::store::Store;

pub struct State {
    pub store: Store,
    pub cache: Cache,
    action_queue: Vec<Action>,
    effect_queue: Vec<Effect>,
}

impl State {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            cache: Cache::new(),
            action_queue: Vec::new(),
            effect_queue: Vec::new(),
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        self.action_queue.push(action);
    }

    /// Apply queued actions in order. A rejected action is reported through
    /// `store.error_message` and the rest still run.
    pub fn flush_actions(&mut self) {
        let actions = std::mem::take(&mut self.action_queue);
        for action in actions {
            let described = format!("{action:?}");
            match actions::update(&mut self.store, action) {
                Ok(mut effects) => self.effect_queue.append(&mut effects),
                Err(e) => {
                    log::warn!("rejected {described}: {e}");
                    self.store.error_message = Some(e.to_string());
                }
            }
        }
        self.store.sync_schedule();
    }

    pub fn flush_effects(&mut self) {
        let effects = std::mem::take(&mut self.effect_queue);
        for effect in effects {
            let described = format!("{effect:?}");
            if let Err(e) = effects::run(&mut self.store, &mut self.cache, effect) {
                log::warn!("{described} failed: {e}");
                self.store.error_message = Some(e.to_string());
            }
        }
    }

    /// Flush actions, then the effects they produced.
    pub fn flush(&mut self) {
        self.flush_actions();
        self.flush_effects();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::NodeClass;
    use grn_model::{EdgeParams, NodeId, Point};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    fn network(state: &mut State) {
        for class in [NodeClass::Input, NodeClass::Gene, NodeClass::Output] {
            state.dispatch(Action::SpawnNode { class });
        }
        state.dispatch(Action::AddEdge {
            source: id("I1"),
            target: id("G1"),
            params: EdgeParams::default(),
        });
        state.dispatch(Action::AddEdge {
            source: id("G1"),
            target: id("O1"),
            params: EdgeParams::default(),
        });
        state.flush();
    }

    #[test]
    fn rejected_action_sets_error_and_others_still_apply() {
        let mut state = State::new(Store::default());
        state.dispatch(Action::RemoveNode { id: id("ghost") });
        state.dispatch(Action::SpawnNode {
            class: NodeClass::Input,
        });
        state.flush_actions();
        assert!(state.store.error_message.is_some());
        assert_eq!(state.store.graph().node_count(), 1);

        state.dispatch(Action::ClearErrorMessage);
        state.flush_actions();
        assert_eq!(state.store.error_message, None);
    }

    #[test]
    fn schedule_follows_input_nodes() {
        let mut state = State::new(Store::default());
        network(&mut state);
        state.dispatch(Action::AddInterval);
        state.dispatch(Action::SetInputLevel {
            input: id("I1"),
            interval: 0,
            level: 5.0,
        });
        state.flush_actions();
        assert_eq!(state.store.schedule.level(&id("I1"), 0), Some(5.0));

        state.dispatch(Action::RemoveNode { id: id("I1") });
        state.flush_actions();
        assert_eq!(state.store.schedule.inputs().count(), 0);
    }

    #[test]
    fn file_effects_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let graph_path = dir.path().join("net.graphml");
        let mut state = State::new(Store::default());
        network(&mut state);
        state.dispatch(Action::MoveNode {
            id: id("G1"),
            position: Point::new(220.0, 80.0),
        });
        state.dispatch(Action::SaveToFile {
            path: graph_path.clone(),
        });
        state.flush();
        assert_eq!(state.store.error_message, None);

        let mut other = State::new(Store::default());
        other.dispatch(Action::LoadFromFile { path: graph_path });
        other.flush();
        assert_eq!(other.store.error_message, None);
        assert_eq!(other.store.graph(), state.store.graph());
    }

    #[test]
    fn exports_description_and_simulation() {
        let dir = tempfile::tempdir().unwrap();
        let description = dir.path().join("network.json");
        let simulation = dir.path().join("simulation.json");
        let mut state = State::new(Store::default());
        network(&mut state);

        // no intervals yet
        state.dispatch(Action::ExportSimulation {
            path: simulation.clone(),
        });
        state.flush();
        assert!(state.store.error_message.take().is_some());

        state.dispatch(Action::AddInterval);
        state.dispatch(Action::ExportDescription {
            path: description.clone(),
        });
        state.dispatch(Action::ExportSimulation {
            path: simulation.clone(),
        });
        state.flush();
        assert_eq!(state.store.error_message, None);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&description).unwrap()).unwrap();
        assert_eq!(json["genes"][0]["products"][0], "O1");
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&simulation).unwrap()).unwrap();
        assert_eq!(json["states"], serde_json::json!([[50.0]]));
        assert_eq!(json["interval_duration"], 100.0);
    }

    #[test]
    fn load_failure_keeps_current_graph() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.graphml");
        std::fs::write(&path, "<graphml><graph><edge source='a' target='b'/></graph></graphml>")
            .unwrap();
        let mut state = State::new(Store::default());
        network(&mut state);
        state.dispatch(Action::LoadFromFile { path });
        state.flush();
        assert!(state.store.error_message.is_some());
        assert_eq!(state.store.graph().node_count(), 3);
    }
}
