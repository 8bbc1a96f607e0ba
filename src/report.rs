//! Plain-text tables for terminal output.

use crate::erd::ErdGraph;
use crate::transform::EditableTable;
use unicode_width::UnicodeWidthStr;

pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    gap: usize,
}

impl TextTable {
    pub fn new<S: Into<String>>(headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            gap: 2,
        }
    }

    pub fn push_row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Display width of each column, wide characters counting double.
    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.width()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.width());
                } else {
                    widths.push(cell.width());
                }
            }
        }
        widths
    }

    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let mut out = String::new();
        self.render_line(&mut out, &self.headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        self.render_line(&mut out, &rule, &widths);
        for row in &self.rows {
            self.render_line(&mut out, row, &widths);
        }
        out
    }

    fn render_line(&self, out: &mut String, cells: &[String], widths: &[usize]) {
        let mut line = String::new();
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                line.push_str(&" ".repeat(self.gap));
            }
            line.push_str(cell);
            let pad = widths.get(i).copied().unwrap_or(0).saturating_sub(cell.width());
            line.push_str(&" ".repeat(pad));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

/// One line per link: source, target, relationship and key name.
pub fn links_table(graph: &ErdGraph) -> TextTable {
    let mut table = TextTable::new(["source", "target", "type", "constraint", "composite"]);
    for link in &graph.links {
        let name_of = |id: &str| {
            graph
                .nodes
                .iter()
                .find(|n| n.id == id)
                .map(|n| n.qualified_name.clone())
                .unwrap_or_default()
        };
        let data = &link.relationship_data;
        table.push_row([
            format!("{}.{}", name_of(&link.source), data.source_attr),
            format!("{}.{}", name_of(&link.target), data.target_attr),
            data.kind.to_string(),
            data.name.clone(),
            if link.is_part_of_composite_key { "yes" } else { "" }.to_string(),
        ]);
    }
    table
}

fn flag(set: bool, label: &str) -> String {
    if set {
        label.to_string()
    } else {
        String::new()
    }
}

/// Column rows of one table in editor layout.
pub fn rows_table(editable: &EditableTable) -> TextTable {
    let mut table = TextTable::new([
        "name", "type", "PK", "NN", "UN", "UQ", "ZF", "AI", "generated", "default", "charset",
        "collation", "comment",
    ]);
    for row in &editable.rows {
        table.push_row([
            row.name.clone(),
            row.data_type.clone(),
            flag(row.primary_key, "PK"),
            flag(row.not_null, "NN"),
            flag(row.unsigned, "UN"),
            row.unique.clone().unwrap_or_default(),
            flag(row.zero_fill, "ZF"),
            flag(row.auto_increment, "AI"),
            row.generated.map(|g| g.to_string()).unwrap_or_default(),
            row.default_or_expression.clone().unwrap_or_default(),
            row.charset.clone().unwrap_or_default(),
            row.collation.clone().unwrap_or_default(),
            row.comment.clone().unwrap_or_default(),
        ]);
    }
    table
}
