use crate::attrs::{AttrMap, AttrValue};
use crate::error::{GraphError, Result};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique node label. The label doubles as the node's identity, in the
/// editor and in GraphML files.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How a gene combines its regulators.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogicType {
    #[default]
    And,
    Or,
}

impl LogicType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicType::And => "and",
            LogicType::Or => "or",
        }
    }
}

impl FromStr for LogicType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "and" => Ok(LogicType::And),
            "or" => Ok(LogicType::Or),
            other => Err(GraphError::invalid(
                NodeKind::LOGIC_TYPE,
                format!("expected 'and' or 'or', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for LogicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node kind together with the regulatory parameters that kind carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    Input,
    Output { degradation_rate: f64 },
    Gene { alpha: f64, logic_type: LogicType },
}

impl NodeKind {
    pub const ALPHA: &'static str = "alpha";
    pub const LOGIC_TYPE: &'static str = "logic_type";
    pub const DEGRADATION_RATE: &'static str = "degradation_rate";
    /// Key the degradation rate is stored under in GraphML files.
    pub const DEG_RATE_ALIAS: &'static str = "deg_rate";

    pub const DEFAULT_ALPHA: f64 = 10.0;
    pub const DEFAULT_DEGRADATION_RATE: f64 = 0.1;

    pub fn output(degradation_rate: f64) -> Self {
        NodeKind::Output { degradation_rate }
    }

    pub fn gene(alpha: f64, logic_type: LogicType) -> Self {
        NodeKind::Gene { alpha, logic_type }
    }

    /// The value written as `node_type` in GraphML.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Output { .. } => "output",
            NodeKind::Gene { .. } => "gene",
        }
    }

    pub fn logic_type(&self) -> Option<LogicType> {
        match self {
            NodeKind::Gene { logic_type, .. } => Some(*logic_type),
            _ => None,
        }
    }

    pub fn alpha(&self) -> Option<f64> {
        match self {
            NodeKind::Gene { alpha, .. } => Some(*alpha),
            _ => None,
        }
    }

    pub fn degradation_rate(&self) -> Option<f64> {
        match self {
            NodeKind::Output { degradation_rate } => Some(*degradation_rate),
            _ => None,
        }
    }

    /// Kind-specific attributes under the names `patched` accepts.
    pub fn attrs(&self) -> AttrMap {
        let mut map = AttrMap::new();
        match self {
            NodeKind::Input => {}
            NodeKind::Output { degradation_rate } => {
                map.insert(Self::DEGRADATION_RATE.into(), (*degradation_rate).into());
            }
            NodeKind::Gene { alpha, logic_type } => {
                map.insert(Self::ALPHA.into(), (*alpha).into());
                map.insert(Self::LOGIC_TYPE.into(), logic_type.as_str().into());
            }
        }
        map
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            NodeKind::Input => Ok(()),
            NodeKind::Output { degradation_rate } => {
                non_negative(Self::DEGRADATION_RATE, *degradation_rate)
            }
            NodeKind::Gene { alpha, .. } => non_negative(Self::ALPHA, *alpha),
        }
    }

    /// Merge `patch` into a copy of `self`. Unknown names, names that do
    /// not belong to this kind, and out-of-range values are rejected; the
    /// receiver is never touched.
    pub fn patched(&self, patch: &AttrMap) -> Result<NodeKind> {
        let mut next = self.clone();
        for (name, value) in patch {
            next.apply(name, value)?;
        }
        next.validate()?;
        Ok(next)
    }

    fn apply(&mut self, name: &str, value: &AttrValue) -> Result<()> {
        let kind = self.name();
        match (self, name) {
            (NodeKind::Gene { alpha, .. }, Self::ALPHA) => {
                *alpha = number(name, value)?;
            }
            (NodeKind::Gene { logic_type, .. }, Self::LOGIC_TYPE) => {
                let text = value.as_str().ok_or_else(|| {
                    GraphError::invalid(name, "expected a string")
                })?;
                *logic_type = text.parse()?;
            }
            (
                NodeKind::Output { degradation_rate },
                Self::DEGRADATION_RATE | Self::DEG_RATE_ALIAS,
            ) => {
                *degradation_rate = number(name, value)?;
            }
            _ => {
                return Err(GraphError::invalid(
                    name,
                    format!("not an attribute of {kind} nodes"),
                ));
            }
        }
        Ok(())
    }
}

pub(crate) fn number(name: &str, value: &AttrValue) -> Result<f64> {
    let x = value
        .as_f64()
        .ok_or_else(|| GraphError::invalid(name, "expected a number"))?;
    if !x.is_finite() {
        return Err(GraphError::invalid(name, "must be finite"));
    }
    Ok(x)
}

fn non_negative(name: &str, x: f64) -> Result<()> {
    if x.is_finite() && x >= 0.0 {
        Ok(())
    } else {
        Err(GraphError::invalid(
            name,
            format!("must be a finite non-negative number, got {x}"),
        ))
    }
}

/// A node record. `position` is the node's center in scene coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Point,
    pub radius: f64,
    /// Attributes this editor does not interpret, kept for re-export.
    pub extra: AttrMap,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, kind: NodeKind, position: Point) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            radius: Node::DEFAULT_RADIUS,
            extra: AttrMap::new(),
        }
    }

    pub const DEFAULT_RADIUS: f64 = 25.0;

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_extra(mut self, extra: AttrMap) -> Self {
        self.extra = extra;
        self
    }

    pub fn contains(&self, point: Point) -> bool {
        self.position.distance(point) <= self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::attrs;

    #[test]
    fn gene_patch_merges_partially() {
        let kind = NodeKind::gene(10.0, LogicType::And);
        let next = kind.patched(&attrs([("logic_type", "or")])).unwrap();
        assert_eq!(next, NodeKind::gene(10.0, LogicType::Or));
        let next = next.patched(&attrs([("alpha", 4.5)])).unwrap();
        assert_eq!(next.alpha(), Some(4.5));
    }

    #[test]
    fn unknown_logic_type_is_rejected() {
        let kind = NodeKind::gene(10.0, LogicType::And);
        let err = kind.patched(&attrs([("logic_type", "xor")])).unwrap_err();
        assert!(matches!(err, GraphError::InvalidAttribute { .. }));
    }

    #[test]
    fn attributes_of_other_kinds_are_rejected() {
        let err = NodeKind::Input
            .patched(&attrs([("alpha", 1.0)]))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidAttribute { .. }));
        let err = NodeKind::output(0.1)
            .patched(&attrs([("logic_type", "and")]))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidAttribute { .. }));
    }

    #[test]
    fn negative_rates_are_rejected() {
        let err = NodeKind::output(0.1)
            .patched(&attrs([("deg_rate", -0.5)]))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidAttribute { .. }));
        let ok = NodeKind::output(0.1)
            .patched(&attrs([("degradation_rate", 0.0)]))
            .unwrap();
        assert_eq!(ok.degradation_rate(), Some(0.0));
    }
}
