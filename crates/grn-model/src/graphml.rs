// GraphML persistence. Files are interoperable with the attributed graphs
// written by common graph libraries: every `<data>` value is declared by a
// typed `<key>`, and attributes this crate does not interpret survive an
// import/export cycle untouched.
//
// `x` and `y` hold the node center, the same point `Node::position` holds.
// The original desktop editor wrote the top-left corner of the node's
// bounding box instead, so its files load shifted by one radius along both
// axes. Positions are not converted on the way in or out: the conversion
// would not survive an export/import cycle exactly for every coordinate.

use crate::attrs::{AttrMap, AttrValue};
use crate::edge::EdgeParams;
use crate::error::{GraphError, Result};
use crate::geometry::Point;
use crate::graph::Graph;
use crate::node::{LogicType, Node, NodeId, NodeKind, number};
use indexmap::IndexMap;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::path::Path;

const GRAPHML_NS: &str = "http://graphml.graphdrawing.org/xmlns";

/// Node attribute naming the node kind.
pub const NODE_TYPE: &str = "node_type";
/// Node attribute mirroring the node id.
pub const LABEL: &str = "label";
pub const X: &str = "x";
pub const Y: &str = "y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Domain {
    Node,
    Edge,
}

impl Domain {
    fn as_str(&self) -> &'static str {
        match self {
            Domain::Node => "node",
            Domain::Edge => "edge",
        }
    }
}

fn xml_error(e: impl std::fmt::Display) -> GraphError {
    GraphError::malformed(e.to_string())
}

// ------------------------------------------------------------------
// Export
// ------------------------------------------------------------------

fn node_data(node: &Node) -> AttrMap {
    let mut data = node.extra.clone();
    data.insert(NODE_TYPE.into(), node.kind.name().into());
    data.insert(LABEL.into(), node.id.as_str().into());
    match &node.kind {
        NodeKind::Input => {}
        NodeKind::Output { degradation_rate } => {
            data.insert(NodeKind::DEG_RATE_ALIAS.into(), (*degradation_rate).into());
        }
        NodeKind::Gene { alpha, logic_type } => {
            data.insert(NodeKind::ALPHA.into(), (*alpha).into());
            data.insert(NodeKind::LOGIC_TYPE.into(), logic_type.as_str().into());
        }
    }
    data.insert(X.into(), node.position.x.into());
    data.insert(Y.into(), node.position.y.into());
    data
}

fn edge_data(params: &EdgeParams, extra: &AttrMap) -> AttrMap {
    let mut data = extra.clone();
    data.extend(params.attrs());
    data
}

/// `<key>` declarations, numbered `d0, d1, ...` in declaration order.
#[derive(Default)]
struct KeyTable {
    keys: IndexMap<(Domain, String), &'static str>,
}

impl KeyTable {
    fn declare(&mut self, domain: Domain, data: &AttrMap) {
        for (name, value) in data {
            let attr_type = value.graphml_type();
            self.keys
                .entry((domain, name.clone()))
                .and_modify(|declared| {
                    *declared = AttrValue::widen_type(*declared, attr_type);
                })
                .or_insert(attr_type);
        }
    }

    fn id(&self, domain: Domain, name: &str) -> Result<String> {
        self.keys
            .get_index_of(&(domain, name.to_string()))
            .map(|i| format!("d{i}"))
            .ok_or_else(|| {
                GraphError::malformed(format!("undeclared attribute '{name}'"))
            })
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(xml_error)
}

fn write_data(
    writer: &mut Writer<Vec<u8>>,
    keys: &KeyTable,
    domain: Domain,
    data: &AttrMap,
) -> Result<()> {
    for (name, value) in data {
        let key = keys.id(domain, name)?;
        let start = BytesStart::new("data").with_attributes([("key", key.as_str())]);
        write(writer, Event::Start(start))?;
        let text = value.to_string();
        write(writer, Event::Text(BytesText::new(&text)))?;
        write(writer, Event::End(BytesEnd::new("data")))?;
    }
    Ok(())
}

/// Serialize `graph` as a GraphML document.
pub fn export(graph: &Graph) -> Result<Vec<u8>> {
    let nodes: Vec<(&NodeId, AttrMap)> =
        graph.nodes().map(|n| (&n.id, node_data(n))).collect();
    let edges: Vec<(&NodeId, &NodeId, AttrMap)> = graph
        .edges()
        .map(|e| {
            (
                &e.source.id,
                &e.target.id,
                edge_data(&e.edge.params, &e.edge.extra),
            )
        })
        .collect();

    let mut keys = KeyTable::default();
    for (_, data) in &nodes {
        keys.declare(Domain::Node, data);
    }
    for (_, _, data) in &edges {
        keys.declare(Domain::Edge, data);
    }

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write(
        &mut writer,
        Event::Start(
            BytesStart::new("graphml").with_attributes([("xmlns", GRAPHML_NS)]),
        ),
    )?;

    for (i, ((domain, name), attr_type)) in keys.keys.iter().enumerate() {
        let id = format!("d{i}");
        let key = BytesStart::new("key").with_attributes([
            ("id", id.as_str()),
            ("for", domain.as_str()),
            ("attr.name", name.as_str()),
            ("attr.type", *attr_type),
        ]);
        write(&mut writer, Event::Empty(key))?;
    }

    write(
        &mut writer,
        Event::Start(
            BytesStart::new("graph").with_attributes([("edgedefault", "directed")]),
        ),
    )?;
    for (id, data) in &nodes {
        let start = BytesStart::new("node").with_attributes([("id", id.as_str())]);
        write(&mut writer, Event::Start(start))?;
        write_data(&mut writer, &keys, Domain::Node, data)?;
        write(&mut writer, Event::End(BytesEnd::new("node")))?;
    }
    for (source, target, data) in &edges {
        let start = BytesStart::new("edge").with_attributes([
            ("source", source.as_str()),
            ("target", target.as_str()),
        ]);
        write(&mut writer, Event::Start(start))?;
        write_data(&mut writer, &keys, Domain::Edge, data)?;
        write(&mut writer, Event::End(BytesEnd::new("edge")))?;
    }
    write(&mut writer, Event::End(BytesEnd::new("graph")))?;
    write(&mut writer, Event::End(BytesEnd::new("graphml")))?;

    log::debug!(
        "exported {} nodes and {} edges as GraphML",
        nodes.len(),
        edges.len()
    );
    Ok(writer.into_inner())
}

// ------------------------------------------------------------------
// Import
// ------------------------------------------------------------------

/// Elements a `<key>` is declared for.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Scope {
    All,
    Only(Domain),
    /// `graph`, `graphml`, ports and the like: never a node or edge.
    Elsewhere,
}

impl Scope {
    fn parse(value: Option<&str>) -> Scope {
        match value {
            None | Some("all") => Scope::All,
            Some("node") => Scope::Only(Domain::Node),
            Some("edge") => Scope::Only(Domain::Edge),
            Some(_) => Scope::Elsewhere,
        }
    }
}

#[derive(Debug)]
struct KeyDecl {
    name: String,
    attr_type: String,
    scope: Scope,
    default: Option<String>,
}

impl KeyDecl {
    fn applies_to(&self, domain: Domain) -> bool {
        match self.scope {
            Scope::All => true,
            Scope::Only(d) => d == domain,
            Scope::Elsewhere => false,
        }
    }

    fn parse(&self, text: &str) -> Result<AttrValue> {
        AttrValue::parse_typed(&self.attr_type, text).ok_or_else(|| {
            GraphError::malformed(format!(
                "value '{}' of '{}' is not a valid {}",
                text.trim(),
                self.name,
                self.attr_type
            ))
        })
    }
}

#[derive(Debug)]
enum Element {
    Node { id: String },
    Edge { source: String, target: String },
}

/// A `<node>` or `<edge>` with its raw `(key id, text)` data entries.
#[derive(Debug)]
struct RawElement {
    element: Element,
    data: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct Document {
    keys: IndexMap<String, KeyDecl>,
    nodes: Vec<RawElement>,
    edges: Vec<RawElement>,
    seen_root: bool,
    // parser state
    open_key: Option<(String, KeyDecl)>,
    open_element: Option<RawElement>,
    open_data: Option<String>,
    text: Option<String>,
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(xml_error)?;
        if attr.key.as_ref() == name {
            let value = attr.unescape_value().map_err(xml_error)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn required(e: &BytesStart<'_>, name: &str, element: &str) -> Result<String> {
    attribute(e, name.as_bytes())?.ok_or_else(|| {
        GraphError::malformed(format!("<{element}> without '{name}'"))
    })
}

impl Document {
    fn parse(text: &str) -> Result<Document> {
        let mut reader = Reader::from_str(text);
        let mut doc = Document::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => doc.start(&e)?,
                Ok(Event::Empty(e)) => {
                    doc.start(&e)?;
                    doc.end(e.local_name().as_ref())?;
                }
                Ok(Event::End(e)) => doc.end(e.local_name().as_ref())?,
                Ok(Event::Text(e)) => {
                    if let Some(buf) = doc.text.as_mut() {
                        buf.push_str(&e.unescape().map_err(xml_error)?);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(buf) = doc.text.as_mut() {
                        buf.push_str(&String::from_utf8_lossy(&e));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(GraphError::malformed(format!(
                        "XML error at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        if !doc.seen_root {
            return Err(GraphError::malformed("no <graphml> root element"));
        }
        Ok(doc)
    }

    fn start(&mut self, e: &BytesStart<'_>) -> Result<()> {
        match e.local_name().as_ref() {
            b"graphml" => self.seen_root = true,
            b"key" => {
                let id = required(e, "id", "key")?;
                let name = attribute(e, b"attr.name")?.unwrap_or_else(|| id.clone());
                let attr_type =
                    attribute(e, b"attr.type")?.unwrap_or_else(|| "string".into());
                let scope = Scope::parse(attribute(e, b"for")?.as_deref());
                if scope == Scope::Elsewhere {
                    log::debug!("key '{name}' does not apply to nodes or edges");
                }
                self.open_key = Some((
                    id,
                    KeyDecl {
                        name,
                        attr_type,
                        scope,
                        default: None,
                    },
                ));
            }
            b"default" if self.open_key.is_some() => {
                self.text = Some(String::new());
            }
            b"graph" => {
                if attribute(e, b"edgedefault")?.as_deref() == Some("undirected") {
                    log::warn!("undirected GraphML file; reading edges as directed");
                }
            }
            b"node" | b"edge" if self.open_element.is_some() => {
                return Err(GraphError::malformed("nested graphs are not supported"));
            }
            b"node" => {
                self.open_element = Some(RawElement {
                    element: Element::Node {
                        id: required(e, "id", "node")?,
                    },
                    data: Vec::new(),
                });
            }
            b"edge" => {
                self.open_element = Some(RawElement {
                    element: Element::Edge {
                        source: required(e, "source", "edge")?,
                        target: required(e, "target", "edge")?,
                    },
                    data: Vec::new(),
                });
            }
            b"data" => {
                self.open_data = Some(required(e, "key", "data")?);
                self.text = Some(String::new());
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> Result<()> {
        match name {
            b"key" => {
                if let Some((id, key)) = self.open_key.take() {
                    self.keys.insert(id, key);
                }
            }
            b"default" => {
                let text = self.text.take();
                if let Some((_, key)) = self.open_key.as_mut() {
                    key.default = text;
                }
            }
            b"data" => {
                let text = self.text.take().unwrap_or_default();
                if let Some(key) = self.open_data.take() {
                    match self.open_element.as_mut() {
                        Some(element) => element.data.push((key, text)),
                        None => log::debug!("ignoring graph-level data '{key}'"),
                    }
                }
            }
            b"node" | b"edge" => {
                if let Some(raw) = self.open_element.take() {
                    match raw.element {
                        Element::Node { .. } => self.nodes.push(raw),
                        Element::Edge { .. } => self.edges.push(raw),
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Typed attributes of one element: declared defaults first, then the
    /// element's own values. Data under an undeclared key is kept as text
    /// named after the key id.
    fn resolve(&self, domain: Domain, raw: &[(String, String)]) -> Result<AttrMap> {
        let mut data = AttrMap::new();
        for key in self.keys.values().filter(|k| k.applies_to(domain)) {
            if let Some(default) = &key.default {
                data.insert(key.name.clone(), key.parse(default)?);
            }
        }
        for (key_id, text) in raw {
            match self.keys.get(key_id) {
                Some(key) => data.insert(key.name.clone(), key.parse(text)?),
                None => data.insert(key_id.clone(), AttrValue::Str(text.clone())),
            };
        }
        Ok(data)
    }

    fn into_graph(self, radius: f64) -> Result<Graph> {
        let mut graph = Graph::new();

        for raw in &self.nodes {
            let Element::Node { id } = &raw.element else {
                continue;
            };
            let data = self.resolve(Domain::Node, &raw.data)?;
            let node = node_from_data(id, data, radius)
                .map_err(|e| GraphError::malformed(format!("node '{id}': {e}")))?;
            graph
                .add_node(node)
                .map_err(|e| GraphError::malformed(format!("node '{id}': {e}")))?;
        }

        for raw in &self.edges {
            let Element::Edge { source, target } = &raw.element else {
                continue;
            };
            let (source, target) = (NodeId::new(source), NodeId::new(target));
            for end in [&source, &target] {
                if !graph.contains_node(end) {
                    return Err(GraphError::malformed(format!(
                        "edge '{source}' -> '{target}' references unknown node '{end}'"
                    )));
                }
            }
            let mut data = self.resolve(Domain::Edge, &raw.data)?;
            let patch = take(&mut data, &[EdgeParams::TYPE, EdgeParams::KD, EdgeParams::N]);
            let context = |e: GraphError| {
                GraphError::malformed(format!("edge '{source}' -> '{target}': {e}"))
            };
            let params = EdgeParams::default().patched(&patch).map_err(context)?;
            graph
                .add_edge_with_extra(&source, &target, params, data)
                .map_err(context)?;
        }

        Ok(graph)
    }
}

/// Remove `names` from `data`, returning the removed entries. Text values
/// are trimmed; these are the attributes the model interprets.
fn take(data: &mut AttrMap, names: &[&str]) -> AttrMap {
    names
        .iter()
        .filter_map(|name| data.remove_entry(*name))
        .map(|(name, value)| match value {
            AttrValue::Str(text) => (name, AttrValue::Str(text.trim().to_string())),
            other => (name, other),
        })
        .collect()
}

fn node_from_data(id: &str, mut data: AttrMap, radius: f64) -> Result<Node> {
    let kind_name = data
        .remove(NODE_TYPE)
        .ok_or_else(|| GraphError::malformed("missing node_type"))?;
    data.remove(LABEL);

    let (base, names): (NodeKind, &[&str]) = match kind_name.as_str().map(str::trim) {
        Some("input") => (NodeKind::Input, &[]),
        Some("output") => (
            NodeKind::output(NodeKind::DEFAULT_DEGRADATION_RATE),
            &[NodeKind::DEG_RATE_ALIAS, NodeKind::DEGRADATION_RATE],
        ),
        Some("gene") => (
            NodeKind::gene(NodeKind::DEFAULT_ALPHA, LogicType::default()),
            &[NodeKind::ALPHA, NodeKind::LOGIC_TYPE],
        ),
        _ => {
            return Err(GraphError::malformed(format!(
                "unknown node_type '{kind_name}'"
            )));
        }
    };
    let kind = base.patched(&take(&mut data, names))?;

    let mut coordinate = |name: &str| -> Result<f64> {
        data.remove(name)
            .map_or(Ok(0.0), |value| number(name, &value))
    };
    let position = Point::new(coordinate(X)?, coordinate(Y)?);

    Ok(Node::new(id, kind, position)
        .with_radius(radius)
        .with_extra(data))
}

/// Parse a GraphML document; nodes get the default radius.
pub fn import(bytes: &[u8]) -> Result<Graph> {
    import_with_radius(bytes, Node::DEFAULT_RADIUS)
}

/// Parse a GraphML document, giving every node `radius`. The radius is a
/// presentation property and is not stored in the file.
pub fn import_with_radius(bytes: &[u8], radius: f64) -> Result<Graph> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| GraphError::malformed(format!("not UTF-8: {e}")))?;
    let graph = Document::parse(text)?.into_graph(radius)?;
    log::debug!(
        "imported {} nodes and {} edges from GraphML",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

pub fn save_to_file(graph: &Graph, path: &Path) -> Result<()> {
    let bytes = export(graph)?;
    std::fs::write(path, bytes)?;
    log::info!("saved graph to {}", path.display());
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<Graph> {
    let bytes = std::fs::read(path)?;
    let graph = import(&bytes)?;
    log::info!("loaded graph from {}", path.display());
    Ok(graph)
}
