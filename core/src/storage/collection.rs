use std::collections::{BTreeSet, HashMap};

use tracing::{debug, instrument, warn};

use crate::storage::{Error, ItemType, MetadataStore, Result};

/// Identifier of the root collection. The root has no record of its own.
pub const ROOT_ID: &str = "";

/// Separator between collection names in a logical path (`Books//Manga`).
pub const PATH_DELIMITER: &str = "//";

/// A collection (folder) and everything filed directly under it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CollectionNode {
    pub identifier: String,
    /// Visible name, empty for the root.
    pub name: String,
    /// Child collections, in store order.
    pub subcollections: Vec<CollectionNode>,
    /// Visible name -> identifier of each child document.
    ///
    /// When two documents in the same collection share a name, the one with the
    /// greater identifier is kept.
    pub documents: HashMap<String, String>,
}

impl CollectionNode {
    /// Number of collections in this subtree, including this one.
    pub fn collection_count(&self) -> usize {
        1 + self
            .subcollections
            .iter()
            .map(CollectionNode::collection_count)
            .sum::<usize>()
    }

    /// Number of documents in this subtree.
    pub fn document_count(&self) -> usize {
        self.documents.len()
            + self
                .subcollections
                .iter()
                .map(CollectionNode::document_count)
                .sum::<usize>()
    }

    fn find(&self, identifier: &str) -> Option<&CollectionNode> {
        if self.identifier == identifier {
            return Some(self);
        }
        self.subcollections.iter().find_map(|c| c.find(identifier))
    }

    fn names_to(&self, identifier: &str, names: &mut Vec<String>) -> bool {
        if self.identifier == identifier {
            return true;
        }
        for child in &self.subcollections {
            names.push(child.name.clone());
            if child.names_to(identifier, names) {
                return true;
            }
            names.pop();
        }
        false
    }
}

// Children of one collection, collected while scanning the store.
#[derive(Debug, Default)]
struct Children<'a> {
    collections: Vec<&'a str>,
    documents: Vec<&'a str>,
}

/// The folder hierarchy of a store.
///
/// Built from the flat identifier -> record mapping, where the only structure is
/// each record's `parent` reference. Records whose parent is neither the root
/// nor a known collection are not reachable from [`root`](Self::root), but are
/// still counted in [`document_ids`](Self::document_ids) and
/// [`collection_ids`](Self::collection_ids).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionTree {
    root: CollectionNode,
    document_ids: BTreeSet<String>,
    collection_ids: BTreeSet<String>,
}

impl CollectionTree {
    /// Rebuilds the hierarchy from a store.
    ///
    /// Fails with [`Error::UnsupportedItemType`] if any record is neither a
    /// document nor a collection. No partial tree is returned in that case.
    #[instrument(skip(store), fields(records = store.len()))]
    pub fn build(store: &MetadataStore) -> Result<Self> {
        let mut document_ids = BTreeSet::new();
        let mut collection_ids = BTreeSet::new();
        let mut children: HashMap<&str, Children<'_>> = HashMap::new();
        children.insert(ROOT_ID, Children::default());

        for (identifier, record) in store {
            match &record.item_type {
                ItemType::Document => {
                    document_ids.insert(identifier.clone());
                }
                ItemType::Collection => {
                    collection_ids.insert(identifier.clone());
                    children.entry(identifier.as_str()).or_default();
                }
                ItemType::Unsupported(item_type) => {
                    return Err(Error::UnsupportedItemType {
                        identifier: identifier.clone(),
                        item_type: item_type.clone(),
                    });
                }
            }
        }

        for (identifier, record) in store {
            // A record listing itself as parent would never terminate below.
            if *identifier == record.parent {
                warn!(identifier = %identifier, "Record is its own parent, skipping");
                continue;
            }
            let Some(siblings) = children.get_mut(record.parent.as_str()) else {
                debug!(identifier = %identifier, parent = %record.parent, "Parent is not a known collection");
                continue;
            };
            if record.is_collection() {
                siblings.collections.push(identifier.as_str());
            } else {
                siblings.documents.push(identifier.as_str());
            }
        }

        let root = materialize(ROOT_ID, store, &children);
        debug!(
            documents = document_ids.len(),
            collections = collection_ids.len(),
            "Collection tree built"
        );
        Ok(CollectionTree { root, document_ids, collection_ids })
    }

    /// The root collection.
    pub fn root(&self) -> &CollectionNode {
        &self.root
    }

    /// Identifiers of all documents in the store, reachable or not.
    pub fn document_ids(&self) -> &BTreeSet<String> {
        &self.document_ids
    }

    /// Identifiers of all collections in the store, reachable or not.
    pub fn collection_ids(&self) -> &BTreeSet<String> {
        &self.collection_ids
    }

    /// Resolves a `//`-delimited path of collection names to the identifier of
    /// the collection it names.
    ///
    /// The empty path names the root ([`ROOT_ID`]). Each segment must match the
    /// visible name of a child collection exactly. If several siblings share a
    /// name, the first in store order (lowest identifier) is taken. Returns
    /// `None` as soon as a segment has no match.
    pub fn resolve(&self, path: &str) -> Option<&str> {
        let mut node = &self.root;
        if path.is_empty() {
            return Some(&node.identifier);
        }
        for segment in path.split(PATH_DELIMITER) {
            node = node.subcollections.iter().find(|c| c.name == segment)?;
        }
        Some(&node.identifier)
    }

    /// The path [`resolve`](Self::resolve) accepts for a reachable collection.
    pub fn path_of(&self, identifier: &str) -> Option<String> {
        let mut names = Vec::new();
        if self.root.names_to(identifier, &mut names) {
            Some(names.join(PATH_DELIMITER))
        } else {
            None
        }
    }

    /// Looks up a reachable collection by identifier.
    pub fn collection(&self, identifier: &str) -> Option<&CollectionNode> {
        self.root.find(identifier)
    }
}

fn materialize(identifier: &str, store: &MetadataStore, children: &HashMap<&str, Children<'_>>) -> CollectionNode {
    let name = store
        .get(identifier)
        .map(|record| record.visible_name.clone())
        .unwrap_or_default();

    let mut node = CollectionNode {
        identifier: identifier.to_string(),
        name,
        ..Default::default()
    };
    let Some(entries) = children.get(identifier) else {
        return node;
    };

    for &document in &entries.documents {
        let Some(visible_name) = store
            .get(document)
            .map(|record| record.visible_name.as_str())
            .filter(|name| !name.is_empty())
        else {
            debug!(collection = %identifier, document = %document, "Skipping document without a name");
            continue;
        };
        if let Some(previous) = node.documents.insert(visible_name.to_string(), document.to_string()) {
            warn!(
                collection = %identifier,
                name = %visible_name,
                replaced = %previous,
                by = %document,
                "Duplicate document name in collection"
            );
        }
    }

    node.subcollections = entries
        .collections
        .iter()
        .map(|&collection| materialize(collection, store, children))
        .collect();
    node
}
