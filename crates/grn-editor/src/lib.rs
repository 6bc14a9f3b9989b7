pub mod actions;
pub mod cache;
pub mod effects;
pub mod error;
pub mod settings;
pub mod simulation;
pub mod state;
pub mod store;
pub mod versioned;

pub use actions::Action;
pub use effects::Effect;
pub use error::{EditorError, Result};
pub use settings::{EditorSettings, NodeClass};
pub use simulation::{InputSchedule, JsonHandoff, SimulationRequest, SimulationService};
pub use state::State;
pub use store::{EditMode, Selection, Store};
