use crate::instance::{InstanceId, InstanceTree};

/// The three script classes Rojo maps to source files.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptKind {
    Server,
    Client,
    Module,
}

impl ScriptKind {
    /// Infix placed between the script name and the file extension.
    pub fn suffix(self) -> &'static str {
        match self {
            ScriptKind::Server => ".server",
            ScriptKind::Client => ".client",
            ScriptKind::Module => "",
        }
    }
}

/// How the mapper materializes an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassKind {
    Script(ScriptKind),
    Folder,
    /// Models, parts, services and anything else that only holds children.
    Container,
}

impl ClassKind {
    pub fn of(class_name: &str) -> Self {
        match class_name {
            "Script" => ClassKind::Script(ScriptKind::Server),
            "LocalScript" => ClassKind::Script(ScriptKind::Client),
            "ModuleScript" => ClassKind::Script(ScriptKind::Module),
            "Folder" => ClassKind::Folder,
            _ => ClassKind::Container,
        }
    }

    pub fn is_script(self) -> bool {
        matches!(self, ClassKind::Script(_))
    }
}

/// Whether each instance is, or has below it, a script.
///
/// Computed once for the whole tree; subtrees answering `false` produce no
/// output at all.
pub struct ScriptPresence {
    flags: Vec<bool>,
}

impl ScriptPresence {
    pub fn new(tree: &InstanceTree) -> Self {
        let mut flags = vec![false; tree.len()];
        // Children are always inserted after their parent, so a reverse sweep
        // sees every child before the parent it bubbles into.
        for id in tree.ids().rev() {
            let instance = tree.get(id);
            let own = ClassKind::of(&instance.class_name).is_script();
            let below = instance.children.iter().any(|child| flags[child.index()]);
            flags[id.index()] = own || below;
        }
        Self { flags }
    }

    pub fn has_scripts(&self, id: InstanceId) -> bool {
        self.flags[id.index()]
    }
}
