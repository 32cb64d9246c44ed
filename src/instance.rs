//! In-memory scene tree.
//!
//! Every [`Instance`] lives in the node table of its [`InstanceTree`]; children
//! and parents are referenced by [`InstanceId`] so the tree has a single owner
//! and no reference cycles.

use std::collections::HashMap;

/// Opaque handle to a node in an [`InstanceTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A decoded property value.
#[derive(Clone, Debug, PartialEq)]
pub enum Variant {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Content urls, references and every type tag without a dedicated decoder.
    Raw(String),
}

impl Variant {
    /// Text of string-like values; `None` for booleans and numbers.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Variant::String(s) | Variant::Raw(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Instance {
    pub class_name: String,
    pub name: String,
    pub referent: String,
    pub properties: HashMap<String, Variant>,
    pub children: Vec<InstanceId>,
    pub parent: Option<InstanceId>,
}

impl Instance {
    /// Script source text, empty when the instance has none.
    pub fn source(&self) -> &str {
        self.properties
            .get("Source")
            .and_then(Variant::as_str)
            .unwrap_or_default()
    }
}

/// Owns every instance produced by one parse.
#[derive(Debug, Default)]
pub struct InstanceTree {
    nodes: Vec<Instance>,
    roots: Vec<InstanceId>,
    referents: HashMap<String, InstanceId>,
}

impl InstanceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node under `parent` (or as a root) and returns its handle.
    ///
    /// The display name comes from a string `Name` property, falling back to
    /// the class name. A referent seen before is re-pointed at the new node.
    pub fn insert(
        &mut self,
        class_name: String,
        referent: String,
        properties: HashMap<String, Variant>,
        parent: Option<InstanceId>,
    ) -> InstanceId {
        let id = InstanceId(self.nodes.len());
        let name = properties
            .get("Name")
            .and_then(Variant::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| class_name.clone());

        if self.referents.insert(referent.clone(), id).is_some() {
            tracing::warn!("Duplicate referent \"{referent}\", keeping the later item");
        }

        self.nodes.push(Instance {
            class_name,
            name,
            referent,
            properties,
            children: Vec::new(),
            parent,
        });

        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn get(&self, id: InstanceId) -> &Instance {
        &self.nodes[id.0]
    }

    pub fn roots(&self) -> &[InstanceId] {
        &self.roots
    }

    pub fn by_referent(&self, referent: &str) -> Option<InstanceId> {
        self.referents.get(referent).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node handles in insertion order. Parents always precede their children.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = InstanceId> {
        (0..self.nodes.len()).map(InstanceId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, Variant)]) -> HashMap<String, Variant> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_name_falls_back_to_class() {
        let mut tree = InstanceTree::new();
        let named = tree.insert(
            "Script".into(),
            "RBX0".into(),
            props(&[("Name", Variant::String("Main".into()))]),
            None,
        );
        let unnamed = tree.insert("Folder".into(), "RBX1".into(), HashMap::new(), None);

        assert_eq!(tree.get(named).name, "Main");
        assert_eq!(tree.get(unnamed).name, "Folder");
    }

    #[test]
    fn test_children_keep_order_and_parent() {
        let mut tree = InstanceTree::new();
        let root = tree.insert("Model".into(), "RBX0".into(), HashMap::new(), None);
        let a = tree.insert("Part".into(), "RBX1".into(), HashMap::new(), Some(root));
        let b = tree.insert("Script".into(), "RBX2".into(), HashMap::new(), Some(root));

        assert_eq!(tree.roots(), &[root]);
        assert_eq!(tree.get(root).children, vec![a, b]);
        assert_eq!(tree.get(b).parent, Some(root));
        assert_eq!(tree.by_referent("RBX2"), Some(b));
    }

    #[test]
    fn test_duplicate_referent_points_at_later_item() {
        let mut tree = InstanceTree::new();
        tree.insert("Folder".into(), "RBX0".into(), HashMap::new(), None);
        let later = tree.insert("Model".into(), "RBX0".into(), HashMap::new(), None);

        assert_eq!(tree.by_referent("RBX0"), Some(later));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_source_defaults_to_empty() {
        let mut tree = InstanceTree::new();
        let id = tree.insert("ModuleScript".into(), "RBX0".into(), HashMap::new(), None);
        assert_eq!(tree.get(id).source(), "");
    }
}
