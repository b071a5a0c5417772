//! The loaded-module collection.
//!
//! The [`Workspace`] is the loader-facing container: the host inserts and
//! removes modules as binaries are loaded and unloaded, and each query starts
//! by taking a snapshot of the current contents. The engine never holds on to a
//! snapshot across queries - indices built from one are discarded when the
//! query finishes.

use dashmap::DashMap;

use crate::metadata::module::ModuleRc;

/// The collection of currently loaded modules, keyed by MVID.
#[derive(Debug, Default)]
pub struct Workspace {
    modules: DashMap<[u8; 16], ModuleRc>,
}

impl Workspace {
    /// Creates an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Workspace {
            modules: DashMap::new(),
        }
    }

    /// Inserts a module, replacing any previous module with the same MVID.
    pub fn insert(&self, module: ModuleRc) {
        self.modules.insert(module.mvid.to_bytes(), module);
    }

    /// Removes a module by identity. Returns the removed module, if any.
    pub fn remove(&self, mvid: &uguid::Guid) -> Option<ModuleRc> {
        self.modules.remove(&mvid.to_bytes()).map(|(_, m)| m)
    }

    /// Resolves a module by identity.
    #[must_use]
    pub fn module_by_mvid(&self, mvid: &uguid::Guid) -> Option<ModuleRc> {
        self.modules.get(&mvid.to_bytes()).map(|m| m.value().clone())
    }

    /// Takes a stable snapshot of the currently loaded modules.
    ///
    /// The snapshot is ordered by module name (then MVID) so repeated queries
    /// over an unchanged workspace enumerate modules deterministically.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ModuleRc> {
        let mut modules: Vec<ModuleRc> =
            self.modules.iter().map(|m| m.value().clone()).collect();
        modules.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.mvid.to_bytes().cmp(&b.mvid.to_bytes()))
        });
        modules
    }

    /// Returns the number of loaded modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` when no modules are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::builder::ModuleBuilder;
    use uguid::guid;

    #[test]
    fn test_insert_lookup_remove() {
        let workspace = Workspace::new();
        let mvid = guid!("0aaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee");
        let module = ModuleBuilder::new("app.exe", mvid).build();
        workspace.insert(module);

        assert_eq!(workspace.len(), 1);
        assert!(workspace.module_by_mvid(&mvid).is_some());
        assert!(workspace.remove(&mvid).is_some());
        assert!(workspace.is_empty());
    }

    #[test]
    fn test_snapshot_is_ordered_by_name() {
        let workspace = Workspace::new();
        workspace.insert(
            ModuleBuilder::new("zeta.dll", guid!("0aaaaaaa-0000-0000-0000-000000000002")).build(),
        );
        workspace.insert(
            ModuleBuilder::new("alpha.dll", guid!("0aaaaaaa-0000-0000-0000-000000000001")).build(),
        );

        let names: Vec<_> = workspace.snapshot().iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["alpha.dll", "zeta.dll"]);
    }
}
