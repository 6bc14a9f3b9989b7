pub mod assemble;
pub mod attrs;
pub mod draft;
pub mod edge;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod graphml;
pub mod node;
pub mod observer;
pub mod snap;

pub use assemble::{GeneSpec, GraphDescription, OutputSpecies, Regulator, assemble};
pub use attrs::{AttrMap, AttrValue, attrs};
pub use draft::{DraftEnd, DraftState, EdgeDraft, Highlight};
pub use edge::{Edge, EdgeId, EdgeParams, RegType};
pub use error::{GraphError, Result};
pub use geometry::{Point, Segment, route_between};
pub use graph::{EdgeEntry, Graph};
pub use node::{LogicType, Node, NodeId, NodeKind};
pub use observer::{GraphEvent, SubscriptionId};
pub use snap::{LinearScan, SpatialIndex};
