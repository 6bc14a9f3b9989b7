use crate::error::{EditorError, Result};
use grn_model::{EdgeParams, LogicType, NodeKind, Point};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Accepted bounds for a numeric setting, inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingRange {
    pub min: f64,
    pub max: f64,
}

impl SettingRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn check(&self, name: &str, value: f64) -> Result<()> {
        if value.is_finite() && (self.min..=self.max).contains(&value) {
            Ok(())
        } else {
            Err(EditorError::InvalidSettings(format!(
                "{name} must lie in [{}, {}], got {value}",
                self.min, self.max
            )))
        }
    }
}

pub const SNAP_RADIUS_RANGE: SettingRange = SettingRange::new(1.0, 1000.0);
pub const NODE_RADIUS_RANGE: SettingRange = SettingRange::new(1.0, 500.0);
pub const ARROW_SIZE_RANGE: SettingRange = SettingRange::new(1.0, 200.0);
pub const ARROW_ANGLE_RANGE: SettingRange = SettingRange::new(1.0, 89.0);
pub const SPAWN_SPACING_RANGE: SettingRange = SettingRange::new(1.0, 10_000.0);

/// The three node categories a toolbar can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeClass {
    Input,
    Output,
    Gene,
}

impl NodeClass {
    /// Label prefix of spawned nodes.
    pub fn prefix(&self) -> &'static str {
        match self {
            NodeClass::Input => "I",
            NodeClass::Output => "O",
            NodeClass::Gene => "G",
        }
    }

    pub fn of(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Input => NodeClass::Input,
            NodeKind::Output { .. } => NodeClass::Output,
            NodeKind::Gene { .. } => NodeClass::Gene,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub snap_radius: f64,
    pub node_radius: f64,
    pub arrow: ArrowSettings,
    pub spawn: SpawnSettings,
    pub defaults: DefaultAttrs,
    pub simulation: SimulationSettings,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            snap_radius: 40.0,
            node_radius: 25.0,
            arrow: ArrowSettings::default(),
            spawn: SpawnSettings::default(),
            defaults: DefaultAttrs::default(),
            simulation: SimulationSettings::default(),
        }
    }
}

impl EditorSettings {
    pub fn validate(&self) -> Result<()> {
        SNAP_RADIUS_RANGE.check("snap_radius", self.snap_radius)?;
        NODE_RADIUS_RANGE.check("node_radius", self.node_radius)?;
        ARROW_SIZE_RANGE.check("arrow.size", self.arrow.size)?;
        ARROW_ANGLE_RANGE.check("arrow.half_angle_deg", self.arrow.half_angle_deg)?;
        SPAWN_SPACING_RANGE.check("spawn.spacing", self.spawn.spacing)?;
        for (name, anchor) in [
            ("spawn.input", self.spawn.input),
            ("spawn.gene", self.spawn.gene),
            ("spawn.output", self.spawn.output),
        ] {
            if !anchor.is_finite() {
                return Err(EditorError::InvalidSettings(format!(
                    "{name} must be finite"
                )));
            }
        }
        self.defaults.validate()?;
        self.simulation.validate()
    }

    /// Read settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let settings: EditorSettings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Arrow head drawn at the target end of every edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowSettings {
    pub size: f64,
    pub half_angle_deg: f64,
}

impl Default for ArrowSettings {
    fn default() -> Self {
        Self {
            size: 12.0,
            half_angle_deg: 30.0,
        }
    }
}

impl ArrowSettings {
    pub fn half_angle(&self) -> f64 {
        self.half_angle_deg.to_radians()
    }
}

/// Column anchors for spawned nodes; each spawn moves its column down by
/// `spacing`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    pub input: Point,
    pub gene: Point,
    pub output: Point,
    pub spacing: f64,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            input: Point::new(50.0, 50.0),
            gene: Point::new(200.0, 50.0),
            output: Point::new(400.0, 50.0),
            spacing: 60.0,
        }
    }
}

impl SpawnSettings {
    pub fn anchor(&self, class: NodeClass) -> Point {
        match class {
            NodeClass::Input => self.input,
            NodeClass::Gene => self.gene,
            NodeClass::Output => self.output,
        }
    }
}

/// Attributes given to new nodes and edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultAttrs {
    pub alpha: f64,
    pub logic_type: LogicType,
    pub degradation_rate: f64,
    pub edge: EdgeParams,
}

impl Default for DefaultAttrs {
    fn default() -> Self {
        Self {
            alpha: NodeKind::DEFAULT_ALPHA,
            logic_type: LogicType::And,
            degradation_rate: NodeKind::DEFAULT_DEGRADATION_RATE,
            edge: EdgeParams::default(),
        }
    }
}

impl DefaultAttrs {
    pub fn kind(&self, class: NodeClass) -> NodeKind {
        match class {
            NodeClass::Input => NodeKind::Input,
            NodeClass::Gene => NodeKind::gene(self.alpha, self.logic_type),
            NodeClass::Output => NodeKind::output(self.degradation_rate),
        }
    }

    fn validate(&self) -> Result<()> {
        let invalid = |e: grn_model::GraphError| {
            EditorError::InvalidSettings(format!("defaults: {e}"))
        };
        self.kind(NodeClass::Gene).validate().map_err(invalid)?;
        self.kind(NodeClass::Output).validate().map_err(invalid)?;
        self.edge.validate().map_err(invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Length of one input interval, in simulation time units.
    pub interval_duration: f64,
    /// Level given to every input in a newly added interval.
    pub default_input_level: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            interval_duration: 100.0,
            default_input_level: 50.0,
        }
    }
}

impl SimulationSettings {
    fn validate(&self) -> Result<()> {
        if !(self.interval_duration.is_finite() && self.interval_duration > 0.0) {
            return Err(EditorError::InvalidSettings(format!(
                "simulation.interval_duration must be positive, got {}",
                self.interval_duration
            )));
        }
        if !(self.default_input_level.is_finite() && self.default_input_level >= 0.0) {
            return Err(EditorError::InvalidSettings(format!(
                "simulation.default_input_level must be non-negative, got {}",
                self.default_input_level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        EditorSettings::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings: EditorSettings =
            serde_json::from_str(r#"{ "snap_radius": 20, "arrow": { "size": 8 } }"#)
                .unwrap();
        assert_eq!(settings.snap_radius, 20.0);
        assert_eq!(settings.arrow.size, 8.0);
        assert_eq!(settings.arrow.half_angle_deg, 30.0);
        assert_eq!(settings.spawn, SpawnSettings::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut settings = EditorSettings::default();
        settings.node_radius = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(EditorError::InvalidSettings(_))
        ));

        let mut settings = EditorSettings::default();
        settings.defaults.edge.kd = -1.0;
        assert!(matches!(
            settings.validate(),
            Err(EditorError::InvalidSettings(_))
        ));

        let mut settings = EditorSettings::default();
        settings.simulation.interval_duration = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = EditorSettings::default();
        settings.defaults.logic_type = LogicType::Or;
        settings.spawn.spacing = 80.0;
        settings.save(&path).unwrap();
        assert_eq!(EditorSettings::load(&path).unwrap(), settings);

        std::fs::write(&path, r#"{ "snap_radius": -5 }"#).unwrap();
        assert!(matches!(
            EditorSettings::load(&path),
            Err(EditorError::InvalidSettings(_))
        ));
    }

    #[test]
    fn default_kinds_follow_settings() {
        let defaults = DefaultAttrs::default();
        assert_eq!(
            defaults.kind(NodeClass::Gene),
            NodeKind::gene(10.0, LogicType::And)
        );
        assert_eq!(defaults.kind(NodeClass::Output), NodeKind::output(0.1));
        assert_eq!(NodeClass::of(&NodeKind::Input), NodeClass::Input);
    }
}
