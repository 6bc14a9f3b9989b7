// Graph assembler: flattens the editable graph into the network description
// consumed by plotting and simulation collaborators.

use crate::edge::RegType;
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::node::{LogicType, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

/// An incoming regulatory edge of a gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulator {
    pub name: NodeId,
    #[serde(rename = "type")]
    pub reg_type: RegType,
    #[serde(rename = "Kd")]
    pub kd: f64,
    pub n: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSpecies {
    pub name: NodeId,
    pub degradation_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneSpec {
    pub name: NodeId,
    pub alpha: f64,
    pub logic_type: LogicType,
    pub regulators: Vec<Regulator>,
    /// Targets of the gene's outgoing edges.
    pub products: Vec<NodeId>,
}

/// Normalized network: species lists and genes with their regulation.
///
/// Every list follows the graph's insertion order, so assembling an
/// unchanged graph twice yields identical (and identically serialized)
/// descriptions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDescription {
    pub inputs: Vec<NodeId>,
    pub outputs: Vec<OutputSpecies>,
    pub genes: Vec<GeneSpec>,
}

impl GraphDescription {
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty() && self.outputs.is_empty() && self.genes.is_empty()
    }

    pub fn gene(&self, name: &NodeId) -> Option<&GeneSpec> {
        self.genes.iter().find(|g| &g.name == name)
    }
}

pub fn assemble(graph: &Graph) -> Result<GraphDescription> {
    let mut description = GraphDescription::default();

    for node in graph.nodes() {
        match &node.kind {
            NodeKind::Input => description.inputs.push(node.id.clone()),
            NodeKind::Output { degradation_rate } => {
                description.outputs.push(OutputSpecies {
                    name: node.id.clone(),
                    degradation_rate: *degradation_rate,
                })
            }
            NodeKind::Gene { alpha, logic_type } => {
                let mut regulators = Vec::new();
                let mut products = Vec::new();
                // a self-loop is both a regulator and a product
                for entry in graph.edges() {
                    if entry.target.id == node.id {
                        if !graph.contains_node(&entry.source.id) {
                            return Err(GraphError::IncompleteGraph(format!(
                                "regulator '{}' of gene '{}' is not in the graph",
                                entry.source.id, node.id
                            )));
                        }
                        regulators.push(Regulator {
                            name: entry.source.id.clone(),
                            reg_type: entry.edge.params.reg_type,
                            kd: entry.edge.params.kd,
                            n: entry.edge.params.n,
                        });
                    }
                    if entry.source.id == node.id {
                        products.push(entry.target.id.clone());
                    }
                }
                description.genes.push(GeneSpec {
                    name: node.id.clone(),
                    alpha: *alpha,
                    logic_type: *logic_type,
                    regulators,
                    products,
                });
            }
        }
    }

    log::debug!(
        "assembled {} inputs, {} outputs, {} genes",
        description.inputs.len(),
        description.outputs.len(),
        description.genes.len()
    );
    Ok(description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeParams;
    use crate::geometry::Point;
    use crate::node::Node;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    fn network() -> Graph {
        let mut g = Graph::new();
        let at = Point::default();
        g.add_node(Node::new("I1", NodeKind::Input, at)).unwrap();
        g.add_node(Node::new("G1", NodeKind::gene(10.0, LogicType::And), at))
            .unwrap();
        g.add_node(Node::new("O1", NodeKind::output(0.1), at)).unwrap();
        g.add_edge(
            &id("I1"),
            &id("G1"),
            EdgeParams::new(RegType::Repressing, 2.0, 3.0),
        )
        .unwrap();
        g.add_edge(&id("G1"), &id("O1"), EdgeParams::default()).unwrap();
        g
    }

    #[test]
    fn collects_species_and_regulation() {
        let d = assemble(&network()).unwrap();
        assert_eq!(d.inputs, vec![id("I1")]);
        assert_eq!(
            d.outputs,
            vec![OutputSpecies {
                name: id("O1"),
                degradation_rate: 0.1
            }]
        );
        assert_eq!(
            d.genes,
            vec![GeneSpec {
                name: id("G1"),
                alpha: 10.0,
                logic_type: LogicType::And,
                regulators: vec![Regulator {
                    name: id("I1"),
                    reg_type: RegType::Repressing,
                    kd: 2.0,
                    n: 3.0,
                }],
                products: vec![id("O1")],
            }]
        );
    }

    #[test]
    fn self_loop_regulates_and_produces() {
        let mut g = network();
        g.add_edge(&id("G1"), &id("G1"), EdgeParams::default())
            .unwrap();
        let d = assemble(&g).unwrap();
        let gene = d.gene(&id("G1")).unwrap();
        assert_eq!(gene.regulators.len(), 2);
        assert_eq!(gene.products, vec![id("O1"), id("G1")]);
    }

    #[test]
    fn serialized_form_uses_network_names() {
        let d = assemble(&network()).unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["genes"][0]["regulators"][0]["type"], -1);
        assert_eq!(json["genes"][0]["regulators"][0]["Kd"], 2.0);
        assert_eq!(json["genes"][0]["logic_type"], "and");
    }

    #[test]
    fn empty_graph_gives_empty_description() {
        assert!(assemble(&Graph::new()).unwrap().is_empty());
    }
}
