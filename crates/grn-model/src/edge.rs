use crate::attrs::{AttrMap, AttrValue};
use crate::error::{GraphError, Result};
use crate::geometry::Segment;
use crate::node::number;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge handle. Ids are never reused within one graph, so a stale handle
/// can not silently refer to a newer edge.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EdgeId(pub(crate) u64);

impl EdgeId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Regulatory effect of the source on the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum RegType {
    #[default]
    Activating,
    Repressing,
    Unknown,
}

impl RegType {
    pub fn sign(&self) -> i64 {
        match self {
            RegType::Activating => 1,
            RegType::Repressing => -1,
            RegType::Unknown => 0,
        }
    }
}

impl From<RegType> for i64 {
    fn from(value: RegType) -> Self {
        value.sign()
    }
}

impl TryFrom<i64> for RegType {
    type Error = GraphError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            1 => Ok(RegType::Activating),
            -1 => Ok(RegType::Repressing),
            0 => Ok(RegType::Unknown),
            other => Err(GraphError::invalid(
                EdgeParams::TYPE,
                format!("expected -1, 0 or 1, got {other}"),
            )),
        }
    }
}

/// Parameters of the Hill-type response an edge stands for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeParams {
    pub reg_type: RegType,
    pub kd: f64,
    pub n: f64,
}

impl Default for EdgeParams {
    fn default() -> Self {
        Self {
            reg_type: RegType::Activating,
            kd: 1.0,
            n: 1.0,
        }
    }
}

impl EdgeParams {
    pub const TYPE: &'static str = "type";
    pub const KD: &'static str = "Kd";
    pub const N: &'static str = "n";

    pub fn new(reg_type: RegType, kd: f64, n: f64) -> Self {
        Self { reg_type, kd, n }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.kd.is_finite() && self.kd > 0.0) {
            return Err(GraphError::invalid(
                Self::KD,
                format!("must be a finite positive number, got {}", self.kd),
            ));
        }
        if !self.n.is_finite() {
            return Err(GraphError::invalid(Self::N, "must be finite"));
        }
        Ok(())
    }

    pub fn attrs(&self) -> AttrMap {
        let mut map = AttrMap::new();
        map.insert(Self::TYPE.into(), self.reg_type.sign().into());
        map.insert(Self::KD.into(), self.kd.into());
        map.insert(Self::N.into(), self.n.into());
        map
    }

    /// Merge `patch` into a copy of `self`; see [`crate::NodeKind::patched`].
    pub fn patched(&self, patch: &AttrMap) -> Result<EdgeParams> {
        let mut next = *self;
        for (name, value) in patch {
            next.apply(name, value)?;
        }
        next.validate()?;
        Ok(next)
    }

    fn apply(&mut self, name: &str, value: &AttrValue) -> Result<()> {
        match name {
            Self::TYPE | "reg_type" => {
                let sign = value.as_i64().ok_or_else(|| {
                    GraphError::invalid(name, "expected an integer")
                })?;
                self.reg_type = RegType::try_from(sign)?;
            }
            Self::KD | "kd" => self.kd = number(name, value)?,
            Self::N => self.n = number(name, value)?,
            _ => {
                return Err(GraphError::invalid(
                    name,
                    "not an edge attribute",
                ));
            }
        }
        Ok(())
    }
}

/// A persisted edge. Endpoints live in the graph structure; `route` is the
/// boundary-to-boundary segment kept in sync with the endpoint positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub params: EdgeParams,
    pub extra: AttrMap,
    pub route: Segment,
}
