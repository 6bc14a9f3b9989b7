use crate::cache::Cache;
use crate::error::Result;
use crate::simulation::{JsonHandoff, SimulationService};
use crate::store::Store;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Deferred effects that must run outside the main reducer (e.g., file IO)
#[derive(Debug, Clone)]
pub enum Effect {
    /// Save the graph as GraphML
    SaveToFile { path: PathBuf },
    /// Replace the graph with one read from GraphML
    LoadFromFile { path: PathBuf },
    /// Write the assembled network as JSON
    ExportDescription { path: PathBuf },
    /// Write a simulation request for the current schedule as JSON
    ExportSimulation { path: PathBuf },
}

/// Execute a single effect against the store
pub fn run(store: &mut Store, cache: &mut Cache, effect: Effect) -> Result<()> {
    match effect {
        Effect::SaveToFile { path } => store.save_to_file(&path),
        Effect::LoadFromFile { path } => store.load_from_file(&path),
        Effect::ExportDescription { path } => {
            let description = cache.description(store)?;
            let json = serde_json::to_string_pretty(description)?;
            std::fs::write(&path, json)?;
            log::info!("exported network description to {}", path.display());
            Ok(())
        }
        Effect::ExportSimulation { path } => {
            let network = cache.description(store)?.clone();
            let request = store.simulation_request(network)?;
            let mut handoff = JsonHandoff::new(create(&path)?);
            handoff.submit(&request)
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}
