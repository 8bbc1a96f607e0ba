//! Entity-relationship graph built from parsed tables.

use crate::ast::{IndexColumn, KeyDefinition, KeyKind, ParsedTable, ReferentialAction};
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[cfg(feature = "tracing")]
use tracing::debug;

const PALETTE: [&str; 12] = [
    "#0e9bc0", "#e76f51", "#2a9d8f", "#e9c46a", "#8e44ad", "#f4a261", "#3d5a80", "#d62828",
    "#6a994e", "#bc6c25", "#7209b7", "#4d908e",
];

/// Visual tie between a table and the links pointing at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HighlightColor(pub usize);

impl HighlightColor {
    pub fn hex(&self) -> &'static str {
        PALETTE[self.0 % PALETTE.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cardinality {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "N")]
    Many,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("1"),
            Self::Many => f.write_str("N"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Optionality {
    Mandatory,
    Optional,
}

impl fmt::Display for Optionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mandatory => f.write_str("mandatory"),
            Self::Optional => f.write_str("optional"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipSide {
    pub optionality: Optionality,
    pub cardinality: Cardinality,
}

/// Rendered as `<optionality>..<cardinality>:<optionality>..<cardinality>`,
/// source side first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipKind {
    pub source: RelationshipSide,
    pub target: RelationshipSide,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}:{}..{}",
            self.source.optionality,
            self.source.cardinality,
            self.target.optionality,
            self.target.cardinality
        )
    }
}

impl Serialize for RelationshipKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Position and velocity, owned by whatever lays the graph out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NodeLayout {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErdNode {
    pub id: String,
    /// `schema.table`; unique within one graph.
    pub qualified_name: String,
    pub schema: String,
    pub data: ParsedTable,
    pub highlight_color: HighlightColor,
    pub layout: NodeLayout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipData {
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    pub name: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub source_attr: String,
    pub target_attr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErdLink {
    pub id: String,
    pub source: String,
    pub target: String,
    pub relationship_data: RelationshipData,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_part_of_composite_key: bool,
    /// Highlight of the target node.
    pub highlight_color: HighlightColor,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ErdGraph {
    pub nodes: Vec<ErdNode>,
    pub links: Vec<ErdLink>,
}

impl ErdGraph {
    pub fn node(&self, qualified_name: &str) -> Option<&ErdNode> {
        self.nodes.iter().find(|n| n.qualified_name == qualified_name)
    }

    pub fn links_from<'a>(&'a self, node: &'a ErdNode) -> impl Iterator<Item = &'a ErdLink> {
        self.links.iter().filter(move |l| l.source == node.id)
    }
}

/// Per-run id source; ids are only unique within one graph.
struct IdGen {
    next: u64,
}

impl IdGen {
    fn next(&mut self, prefix: &str) -> String {
        self.next += 1;
        format!("{}_{}", prefix, self.next)
    }
}

/// Build nodes for every table and links for every resolvable foreign key.
///
/// Foreign keys whose target table is not among the inputs are skipped.
pub fn build_graph<I, S>(tables_by_schema: I) -> ErdGraph
where
    I: IntoIterator<Item = (S, Vec<ParsedTable>)>,
    S: Into<String>,
{
    let mut ids = IdGen { next: 0 };

    let mut nodes = Vec::new();
    for (schema, tables) in tables_by_schema {
        let schema = schema.into();
        for table in tables {
            let highlight_color = HighlightColor(nodes.len());
            nodes.push(ErdNode {
                id: ids.next("node"),
                qualified_name: format!("{}.{}", schema, table.name),
                schema: schema.clone(),
                data: table,
                highlight_color,
                layout: NodeLayout::default(),
            });
        }
    }

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        index.entry(node.qualified_name.as_str()).or_insert(i);
    }

    let mut links = Vec::new();
    for source in &nodes {
        for fk in source.data.foreign_keys() {
            let Some(reference) = &fk.reference else {
                continue;
            };
            let target_schema = reference.schema.as_deref().unwrap_or(&source.schema);
            let target_name = format!("{}.{}", target_schema, reference.table);
            let Some(&target_idx) = index.get(target_name.as_str()) else {
                #[cfg(feature = "tracing")]
                debug!(
                    source = %source.qualified_name,
                    target = %target_name,
                    key = %fk.name,
                    "foreign key target not in graph"
                );
                continue;
            };
            let target = &nodes[target_idx];
            links.extend(fk_links(&mut ids, source, target, fk, &reference.columns));
        }
    }

    #[cfg(feature = "tracing")]
    debug!(nodes = nodes.len(), links = links.len(), "built erd graph");

    ErdGraph { nodes, links }
}

/// One link per column pair of a foreign key.
fn fk_links(
    ids: &mut IdGen,
    source: &ErdNode,
    target: &ErdNode,
    fk: &KeyDefinition,
    referenced: &[IndexColumn],
) -> Vec<ErdLink> {
    let reference = fk.reference.as_ref();
    let source_cardinality = cardinality(&source.data, &fk.columns);
    let target_cardinality = cardinality(&target.data, referenced);

    fk.columns
        .iter()
        .zip(referenced)
        .enumerate()
        .map(|(i, (local, remote))| {
            let kind = RelationshipKind {
                source: RelationshipSide {
                    optionality: optionality(&source.data, &local.name),
                    cardinality: source_cardinality,
                },
                target: RelationshipSide {
                    optionality: optionality(&target.data, &remote.name),
                    cardinality: target_cardinality,
                },
            };
            ErdLink {
                id: ids.next("link"),
                source: source.id.clone(),
                target: target.id.clone(),
                relationship_data: RelationshipData {
                    kind,
                    name: fk.name.clone(),
                    on_delete: reference.and_then(|r| r.on_delete),
                    on_update: reference.and_then(|r| r.on_update),
                    source_attr: local.name.clone(),
                    target_attr: remote.name.clone(),
                },
                is_part_of_composite_key: i >= 1,
                highlight_color: target.highlight_color,
            }
        })
        .collect()
}

/// `One` when the columns are exactly the column set of a primary or unique key.
pub fn cardinality(table: &ParsedTable, columns: &[IndexColumn]) -> Cardinality {
    let wanted: BTreeSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let is_unique = [KeyKind::Primary, KeyKind::Unique]
        .into_iter()
        .flat_map(|kind| table.keys(kind))
        .any(|key| key.column_names().collect::<BTreeSet<_>>() == wanted);
    if is_unique {
        Cardinality::One
    } else {
        Cardinality::Many
    }
}

/// `Mandatory` only for a known NOT NULL column.
pub fn optionality(table: &ParsedTable, column: &str) -> Optionality {
    match table.column(column) {
        Some(col) if col.not_null => Optionality::Mandatory,
        _ => Optionality::Optional,
    }
}
