//! Restores paragraphs in HTML that marks them with newlines instead of `<p>`.

use richtext_core::{elements, Document, NodeData, NodeId};

use super::TreeProcessor;

/// At root level loose text and inline elements are wrapped in `<p>`, `\n\n` starts a
/// new paragraph and a single `\n` becomes `<br>`. Inside other elements only `\n` is
/// turned into `<br>`. Preformatted content is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphRestorer;

impl ParagraphRestorer {
    pub fn new() -> Self {
        Self
    }
}

impl TreeProcessor for ParagraphRestorer {
    fn process(&self, document: &mut Document) {
        let root = document.root();
        document.normalize(root);
        restore_line_breaks(document);
        restore_paragraphs(document, root);
    }
}

fn is_preformatted(document: &Document, id: NodeId) -> bool {
    document
        .ancestors(id)
        .filter_map(|a| document.name(a))
        .any(|name| name == "pre" || elements::is_raw_text(name))
}

/// Replace `\n` in nested text nodes with `<br>`
fn restore_line_breaks(document: &mut Document) {
    let root = document.root();
    let texts: Vec<NodeId> = document
        .descendants(root)
        .filter(|&id| document.parent(id) != Some(root))
        .filter(|&id| {
            document
                .text(id)
                .is_some_and(|t| t.contains('\n') && !t.trim().is_empty())
        })
        .filter(|&id| !is_preformatted(document, id))
        .collect();

    for id in texts {
        let (Some(parent), Some(index)) = (document.parent(id), document.index_in_parent(id)) else {
            continue;
        };
        let text = document.text(id).unwrap_or_default().to_string();
        document.remove(id);
        let mut at = index;
        for node in lines(document, &text) {
            document.insert_child(parent, at, node);
            at += 1;
        }
    }
}

/// Text and `<br>` nodes for `text`, one break per `\n`
fn lines(document: &mut Document, text: &str) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(document.create_element("br"));
        }
        if !line.is_empty() {
            nodes.push(document.create_text(line));
        }
    }
    nodes
}

fn restore_paragraphs(document: &mut Document, root: NodeId) {
    let children = document.take_children(root);
    let mut paragraph: Option<NodeId> = None;

    for (i, &child) in children.iter().enumerate() {
        if document.is_block_level(child) {
            paragraph = None;
            document.append_child(root, child);
            continue;
        }

        let text = match document.data(child) {
            NodeData::Text(text) => text.clone(),
            _ => {
                let p = current_paragraph(document, root, &mut paragraph);
                document.append_child(p, child);
                continue;
            }
        };
        document.remove(child);

        let ends_block = children
            .get(i + 1)
            .map_or(true, |&next| document.is_block_level(next));
        let parts: Vec<&str> = text.split("\n\n").collect();
        for (n, part) in parts.iter().enumerate() {
            if n > 0 {
                paragraph = None;
            }
            let mut part: &str = part;
            if paragraph.is_none() {
                part = part.trim_start_matches('\n');
            }
            if ends_block && n + 1 == parts.len() {
                part = part.trim_end_matches('\n');
            }
            if part.trim().is_empty() && (paragraph.is_none() || ends_block) {
                continue;
            }
            let p = current_paragraph(document, root, &mut paragraph);
            for node in lines(document, part) {
                document.append_child(p, node);
            }
        }
    }
}

fn current_paragraph(document: &mut Document, root: NodeId, paragraph: &mut Option<NodeId>) -> NodeId {
    match *paragraph {
        Some(p) => p,
        None => {
            let p = document.create_element("p");
            document.append_child(root, p);
            *paragraph = Some(p);
            p
        }
    }
}
