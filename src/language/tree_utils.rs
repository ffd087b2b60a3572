use tower_lsp::lsp_types::Range;
use tree_sitter::Node;

use crate::language::position::{point_to_position, PositionResult};

/// Convert tree-sitter node to LSP range in UTF-16 coordinates
pub(crate) fn node_to_range(node: Node, content: &str) -> PositionResult<Range> {
    Ok(Range {
        start: point_to_position(content, node.start_position())?,
        end: point_to_position(content, node.end_position())?,
    })
}

/// Source text covered by a node
pub(crate) fn node_text<'a>(node: Node, content: &'a str) -> &'a str {
    content.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// Find the first direct child of a specific kind
pub(crate) fn find_child_by_kind<'a>(node: Node<'a>, target_kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|child| child.kind() == target_kind)
}
