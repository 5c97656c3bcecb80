//! Implementation of `dockyard tree`.

use std::collections::BTreeSet;

use crate::core::graph::ModuleGraph;
use crate::core::project::Project;

/// Render the requires tree of every space.
///
/// Each space lists the trees of its modules that no other module of the
/// same space requires.
pub fn tree(project: &Project) -> String {
    let graph = ModuleGraph::of(project);
    let mut out = String::new();
    for space in project.spaces() {
        out.push_str(&format!("[{}]\n", space.name()));
        let required: BTreeSet<&str> = space
            .units()
            .values()
            .flat_map(|unit| unit.descriptor.required_names())
            .collect();
        let mut roots: Vec<&str> = space
            .module_names()
            .filter(|name| !required.contains(name))
            .collect();
        if roots.is_empty() {
            roots = space.module_names().collect();
        }
        for root in roots {
            out.push_str(&graph.render_tree(root));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;
    use crate::test_support::fixtures::ProjectFixture;

    #[test]
    fn test_tree_of_quick_start() {
        let fixture = ProjectFixture::jigsaw_quick_start();
        let project = Scanner::new(fixture.path()).unwrap().scan().unwrap();

        assert_eq!(
            tree(&project),
            "[main]\ncom.greetings\n  org.astro\n[test]\ntest.modules\n  org.astro\n"
        );
    }

    #[test]
    fn test_tree_marks_external_modules() {
        let fixture = ProjectFixture::new("ext")
            .with_module("a", "module a { requires org.junit.jupiter; requires java.base; }");
        let project = Scanner::new(fixture.path()).unwrap().scan().unwrap();

        let tree = tree(&project);
        assert!(tree.contains("  java.base (external)\n"));
        assert!(tree.contains("  org.junit.jupiter (external)\n"));
    }
}
