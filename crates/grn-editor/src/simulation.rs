// Handoff to the external ODE simulator: a schedule of input levels per
// interval plus the assembled network. The solver itself lives elsewhere.

use crate::error::{EditorError, Result};
use grn_model::{GraphDescription, NodeId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::io::Write;

fn check_level(input: &NodeId, level: f64) -> Result<()> {
    if level.is_finite() && level >= 0.0 {
        Ok(())
    } else {
        Err(EditorError::InvalidSchedule(format!(
            "level of '{input}' must be a finite non-negative number, got {level}"
        )))
    }
}

/// Input levels per interval: one row per input node, one column per
/// interval.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputSchedule {
    intervals: usize,
    rows: IndexMap<NodeId, Vec<f64>>,
}

impl InputSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interval_count(&self) -> usize {
        self.intervals
    }

    pub fn inputs(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.rows.keys()
    }

    pub fn level(&self, input: &NodeId, interval: usize) -> Option<f64> {
        self.rows.get(input)?.get(interval).copied()
    }

    /// Append an interval with every input at `level`.
    pub fn add_interval(&mut self, level: f64) {
        self.intervals += 1;
        for row in self.rows.values_mut() {
            row.push(level);
        }
    }

    pub fn remove_interval(&mut self, interval: usize) -> Result<()> {
        self.check_interval(interval)?;
        self.intervals -= 1;
        for row in self.rows.values_mut() {
            row.remove(interval);
        }
        Ok(())
    }

    pub fn set_level(&mut self, input: &NodeId, interval: usize, level: f64) -> Result<()> {
        self.check_interval(interval)?;
        check_level(input, level)?;
        let row = self.rows.get_mut(input).ok_or_else(|| {
            EditorError::InvalidSchedule(format!("'{input}' is not an input node"))
        })?;
        row[interval] = level;
        Ok(())
    }

    fn check_interval(&self, interval: usize) -> Result<()> {
        if interval < self.intervals {
            Ok(())
        } else {
            Err(EditorError::InvalidSchedule(format!(
                "interval {interval} out of range (have {})",
                self.intervals
            )))
        }
    }

    /// Make the rows match `inputs`, in that order. New inputs start at
    /// `level` in every interval; rows of inputs that are gone are dropped.
    pub fn sync_inputs(&mut self, inputs: &[NodeId], level: f64) {
        let mut rows = IndexMap::with_capacity(inputs.len());
        for input in inputs {
            let row = self
                .rows
                .shift_remove(input)
                .unwrap_or_else(|| vec![level; self.intervals]);
            rows.insert(input.clone(), row);
        }
        self.rows = rows;
    }

    pub fn rename_input(&mut self, from: &NodeId, to: NodeId) {
        if let Some(index) = self.rows.get_index_of(from)
            && let Some((_, row)) = self.rows.shift_remove_index(index)
        {
            self.rows.shift_insert(index, to, row);
        }
    }

    /// Levels per interval, each listing `inputs` in order.
    pub fn states(&self, inputs: &[NodeId]) -> Result<Vec<Vec<f64>>> {
        let rows = inputs
            .iter()
            .map(|input| {
                self.rows.get(input).ok_or_else(|| {
                    EditorError::InvalidSchedule(format!("no levels for input '{input}'"))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((0..self.intervals)
            .map(|i| rows.iter().map(|row| row[i]).collect())
            .collect())
    }
}

/// Parse an interval given as `I1=50,I2=0`.
pub fn parse_levels(spec: &str) -> Result<Vec<(NodeId, f64)>> {
    spec.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (name, value) = part.split_once('=').ok_or_else(|| {
                EditorError::InvalidSchedule(format!("expected NAME=LEVEL, got '{part}'"))
            })?;
            let input = NodeId::new(name.trim());
            let level: f64 = value.trim().parse().map_err(|_| {
                EditorError::InvalidSchedule(format!("'{}' is not a number", value.trim()))
            })?;
            check_level(&input, level)?;
            Ok((input, level))
        })
        .collect()
}

/// Everything the simulator needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    pub network: GraphDescription,
    /// One entry per interval, listing levels in `network.inputs` order.
    pub states: Vec<Vec<f64>>,
    pub interval_duration: f64,
}

impl SimulationRequest {
    pub fn new(
        network: GraphDescription,
        schedule: &InputSchedule,
        interval_duration: f64,
    ) -> Result<Self> {
        if !(interval_duration.is_finite() && interval_duration > 0.0) {
            return Err(EditorError::InvalidSchedule(format!(
                "interval duration must be positive, got {interval_duration}"
            )));
        }
        if schedule.interval_count() == 0 {
            return Err(EditorError::InvalidSchedule(
                "at least one interval is required".to_string(),
            ));
        }
        let states = schedule.states(&network.inputs)?;
        for state in &states {
            for (input, level) in network.inputs.iter().zip(state) {
                check_level(input, *level)?;
            }
        }
        Ok(Self {
            network,
            states,
            interval_duration,
        })
    }

    pub fn total_duration(&self) -> f64 {
        self.interval_duration * self.states.len() as f64
    }
}

/// Seam to the external solver.
pub trait SimulationService {
    fn submit(&mut self, request: &SimulationRequest) -> Result<()>;
}

/// Writes each request as a JSON document for a simulator process to pick
/// up.
pub struct JsonHandoff<W: Write> {
    writer: W,
}

impl<W: Write> JsonHandoff<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SimulationService for JsonHandoff<W> {
    fn submit(&mut self, request: &SimulationRequest) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, request)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        log::info!(
            "handed off simulation of {} intervals ({} time units)",
            request.states.len(),
            request.total_duration()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    fn network() -> GraphDescription {
        GraphDescription {
            inputs: vec![id("I1"), id("I2")],
            ..GraphDescription::default()
        }
    }

    fn schedule() -> InputSchedule {
        let mut s = InputSchedule::new();
        s.sync_inputs(&[id("I1"), id("I2")], 50.0);
        s.add_interval(50.0);
        s.add_interval(50.0);
        s.set_level(&id("I2"), 1, 0.0).unwrap();
        s
    }

    #[test]
    fn states_are_listed_per_interval() {
        assert_eq!(
            schedule().states(&[id("I1"), id("I2")]).unwrap(),
            vec![vec![50.0, 50.0], vec![50.0, 0.0]]
        );
    }

    #[test]
    fn sync_keeps_levels_and_fills_new_inputs() {
        let mut s = schedule();
        s.sync_inputs(&[id("I2"), id("I3")], 7.0);
        assert_eq!(s.level(&id("I2"), 1), Some(0.0));
        assert_eq!(s.level(&id("I3"), 0), Some(7.0));
        assert_eq!(s.level(&id("I1"), 0), None);
        let inputs: Vec<&NodeId> = s.inputs().collect();
        assert_eq!(inputs, vec![&id("I2"), &id("I3")]);
    }

    #[test]
    fn rename_keeps_row_position() {
        let mut s = schedule();
        s.rename_input(&id("I1"), id("Light"));
        let inputs: Vec<&NodeId> = s.inputs().collect();
        assert_eq!(inputs, vec![&id("Light"), &id("I2")]);
        assert_eq!(s.level(&id("Light"), 0), Some(50.0));
    }

    #[test]
    fn bad_edits_are_rejected() {
        let mut s = schedule();
        assert!(s.set_level(&id("I1"), 5, 1.0).is_err());
        assert!(s.set_level(&id("I1"), 0, -1.0).is_err());
        assert!(s.set_level(&id("G1"), 0, 1.0).is_err());
        assert!(s.remove_interval(2).is_err());
        s.remove_interval(0).unwrap();
        assert_eq!(s.states(&[id("I1"), id("I2")]).unwrap(), vec![vec![50.0, 0.0]]);
    }

    #[test]
    fn request_requires_intervals_and_coverage() {
        let empty = {
            let mut s = InputSchedule::new();
            s.sync_inputs(&[id("I1"), id("I2")], 50.0);
            s
        };
        assert!(matches!(
            SimulationRequest::new(network(), &empty, 100.0),
            Err(EditorError::InvalidSchedule(_))
        ));
        let mut partial = schedule();
        partial.sync_inputs(&[id("I1")], 50.0);
        assert!(SimulationRequest::new(network(), &partial, 100.0).is_err());
        assert!(SimulationRequest::new(network(), &schedule(), 0.0).is_err());

        let request = SimulationRequest::new(network(), &schedule(), 100.0).unwrap();
        assert_eq!(request.total_duration(), 200.0);
    }

    #[test]
    fn parses_interval_specs() {
        assert_eq!(
            parse_levels("I1=50, I2=0").unwrap(),
            vec![(id("I1"), 50.0), (id("I2"), 0.0)]
        );
        assert!(parse_levels("I1").is_err());
        assert!(parse_levels("I1=high").is_err());
        assert!(parse_levels("I1=-3").is_err());
    }

    #[test]
    fn json_handoff_writes_request() {
        let request = SimulationRequest::new(network(), &schedule(), 100.0).unwrap();
        let mut handoff = JsonHandoff::new(Vec::new());
        handoff.submit(&request).unwrap();
        let back: SimulationRequest =
            serde_json::from_slice(&handoff.into_inner()).unwrap();
        assert_eq!(back, request);
    }
}
