use std::collections::HashSet;

use paperstack_core::storage::{CollectionNode, CollectionTree};

/// Renders the hierarchy: collections first (in store order, with a trailing
/// `/`), then documents sorted by name.
pub fn format_tree(tree: &CollectionTree, show_ids: bool) -> String {
    let mut lines = vec!["/".to_string()];
    render_tree_node(&mut lines, tree.root(), 0, show_ids);

    let mut shown = HashSet::new();
    collect_identifiers(tree.root(), &mut shown);
    let hidden = tree
        .document_ids()
        .iter()
        .chain(tree.collection_ids())
        .filter(|id| !shown.contains(id.as_str()))
        .count();
    let mut summary = format!(
        "{} collections, {} documents",
        tree.collection_ids().len(),
        tree.document_ids().len()
    );
    if hidden > 0 {
        summary.push_str(&format!(" ({hidden} not shown)"));
    }
    lines.push(String::new());
    lines.push(summary);
    lines.join("\n")
}

/// Identifiers of every collection and named document under `node`.
fn collect_identifiers<'a>(node: &'a CollectionNode, ids: &mut HashSet<&'a str>) {
    ids.insert(&node.identifier);
    ids.extend(node.documents.values().map(String::as_str));
    for child in &node.subcollections {
        collect_identifiers(child, ids);
    }
}

fn render_tree_node(lines: &mut Vec<String>, node: &CollectionNode, depth: usize, show_ids: bool) {
    let indent = "│  ".repeat(depth);
    let label = |name: &str, id: &str| {
        if show_ids { format!("{name} [{id}]") } else { name.to_string() }
    };

    for child in &node.subcollections {
        lines.push(format!("{indent}├─ {}", label(&format!("{}/", child.name), &child.identifier)));
        render_tree_node(lines, child, depth + 1, show_ids);
    }

    let mut documents: Vec<_> = node.documents.iter().collect();
    documents.sort();
    for (name, id) in documents {
        lines.push(format!("{indent}├─ {}", label(name, id)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperstack_core::storage::{ItemMetadata, MetadataStore};

    fn sample() -> CollectionTree {
        let mut store = MetadataStore::new();
        store.insert("A".into(), ItemMetadata::collection("Books", ""));
        store.insert("M".into(), ItemMetadata::collection("Manga", "A"));
        store.insert("B".into(), ItemMetadata::document("Doc1", "A"));
        store.insert("C".into(), ItemMetadata::document("Alpha", "A"));
        store.insert("D".into(), ItemMetadata::document("Todo", ""));
        CollectionTree::build(&store).unwrap()
    }

    #[test]
    fn renders_names() {
        let expected = "/\n\
            ├─ Books/\n\
            │  ├─ Manga/\n\
            │  ├─ Alpha\n\
            │  ├─ Doc1\n\
            ├─ Todo\n\
            \n\
            2 collections, 3 documents";
        assert_eq!(format_tree(&sample(), false), expected);
    }

    #[test]
    fn renders_ids() {
        let out = format_tree(&sample(), true);
        assert!(out.contains("├─ Books/ [A]"));
        assert!(out.contains("│  ├─ Doc1 [B]"));
    }

    #[test]
    fn reports_unreachable_records() {
        let mut store = MetadataStore::new();
        store.insert("X".into(), ItemMetadata::document("Lost", "gone"));
        let tree = CollectionTree::build(&store).unwrap();
        let out = format_tree(&tree, false);
        assert!(out.ends_with("0 collections, 1 documents (1 not shown)"));
    }

    #[test]
    fn duplicate_names_are_not_counted_as_hidden() {
        let mut store = MetadataStore::new();
        store.insert("1".into(), ItemMetadata::document("Same", ""));
        store.insert("2".into(), ItemMetadata::document("Same", ""));
        let tree = CollectionTree::build(&store).unwrap();
        let out = format_tree(&tree, false);
        assert!(out.ends_with("0 collections, 2 documents"), "{out}");
    }

    #[test]
    fn counts_each_hidden_identifier_once() {
        let mut store = MetadataStore::new();
        store.insert("A".into(), ItemMetadata::collection("Books", ""));
        store.insert("L".into(), ItemMetadata::collection("Lost", "gone"));
        store.insert("X".into(), ItemMetadata::document("Inside", "L"));
        store.insert("Y".into(), ItemMetadata::document("Kept", "A"));
        let tree = CollectionTree::build(&store).unwrap();
        let out = format_tree(&tree, false);
        assert!(out.ends_with("2 collections, 2 documents (2 not shown)"), "{out}");
    }
}
