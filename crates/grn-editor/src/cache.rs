use crate::error::{EditorError, Result};
use crate::store::Store;
use crate::versioned::Memoized;
use grn_model::{GraphDescription, assemble};

type Assembled = std::result::Result<GraphDescription, String>;

/// Data derived from the store, recomputed only when its inputs change.
pub struct Cache {
    pub description: Memoized<Store, u64, Assembled>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    pub fn new() -> Self {
        let description = Memoized::new(
            |s: &Store| s.graph.version(),
            |s: &Store| assemble(s.graph.get()).map_err(|e| e.to_string()),
        );
        Self { description }
    }

    /// The assembled network for the current graph.
    pub fn description(&mut self, store: &Store) -> Result<&GraphDescription> {
        self.description
            .get(store)
            .as_ref()
            .map_err(|e| EditorError::Assembly(e.clone()))
    }
}
