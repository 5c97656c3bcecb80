//! Requires-graph of declared modules.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::core::project::Project;

/// Directed graph with an edge `a -> b` for every `a requires b`.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
    declared: BTreeSet<String>,
}

impl ModuleGraph {
    /// Build the graph of all declarations of a project.
    ///
    /// Required modules that are not declared become leaf nodes. A unit
    /// patching a module of an upstream space adds no edges.
    pub fn of(project: &Project) -> Self {
        let mut graph = ModuleGraph::default();
        for (space, unit) in project.units() {
            let from = graph.node(unit.name());
            graph.declared.insert(unit.name().to_string());
            let patches = project
                .upstreams_of(space)
                .any(|upstream| upstream.unit(unit.name()).is_some());
            if patches {
                continue;
            }
            for required in unit.descriptor.required_names() {
                let to = graph.node(required);
                graph.graph.update_edge(from, to, ());
            }
        }
        graph
    }

    fn node(&mut self, name: &str) -> NodeIndex {
        if let Some(index) = self.indices.get(name) {
            return *index;
        }
        let index = self.graph.add_node(name.to_string());
        self.indices.insert(name.to_string(), index);
        index
    }

    /// Whether the module is declared by the project.
    pub fn is_declared(&self, module: &str) -> bool {
        self.declared.contains(module)
    }

    /// Direct requirements of a module, sorted by name.
    pub fn requires_of(&self, module: &str) -> Vec<&str> {
        let Some(index) = self.indices.get(module) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(*index, Direction::Outgoing)
            .map(|n| self.graph[n].as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Declared modules no other declared module requires, sorted by name.
    pub fn roots(&self) -> Vec<&str> {
        self.declared
            .iter()
            .filter(|name| {
                let index = self.indices[name.as_str()];
                self.graph
                    .neighbors_directed(index, Direction::Incoming)
                    .all(|n| !self.declared.contains(&self.graph[n]))
            })
            .map(String::as_str)
            .collect()
    }

    /// Find groups of modules that require each other, each sorted by name.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|n| self.graph.contains_edge(*n, *n))
            })
            .map(|component| {
                let mut names: Vec<String> =
                    component.into_iter().map(|n| self.graph[n].clone()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Render an indented requires tree starting at `module`.
    pub fn render_tree(&self, module: &str) -> String {
        let mut out = String::new();
        let mut path = Vec::new();
        self.render_node(module, 0, &mut path, &mut out);
        out
    }

    fn render_node<'a>(&'a self, module: &'a str, depth: usize, path: &mut Vec<&'a str>, out: &mut String) {
        let marker = if self.is_declared(module) { "" } else { " (external)" };
        let cyclic = path.contains(&module);
        out.push_str(&format!(
            "{}{}{}{}\n",
            "  ".repeat(depth),
            module,
            marker,
            if cyclic { " (*)" } else { "" }
        ));
        if cyclic {
            return;
        }
        path.push(module);
        for required in self.requires_of(module) {
            self.render_node(required, depth + 1, path, out);
        }
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptor::{ModuleDescriptor, Requires};
    use crate::core::paths::ProjectPaths;
    use crate::core::project::ProjectInfo;
    use crate::core::space::Space;
    use crate::core::unit::ModuleUnit;

    fn project(modules: &[(&str, &[&str])]) -> Project {
        let mut space = Space::new("main");
        for (name, requires) in modules {
            let descriptor = requires
                .iter()
                .fold(ModuleDescriptor::new(*name), |d, r| d.with_requires(Requires::new(*r)));
            let unit = ModuleUnit::of(format!("{}/module-info.java", name), descriptor);
            space = space.with_unit(unit).unwrap();
        }
        Project::new(
            ProjectInfo::new("demo", "1"),
            ProjectPaths::new("/tmp/demo"),
            vec![space],
        )
    }

    #[test]
    fn test_no_cycles() {
        let graph = ModuleGraph::of(&project(&[
            ("com.greetings", &["org.astro"]),
            ("org.astro", &["java.logging"]),
        ]));
        assert!(graph.cycles().is_empty());
        assert_eq!(graph.roots(), vec!["com.greetings"]);
        assert_eq!(graph.requires_of("com.greetings"), vec!["org.astro"]);
        assert!(!graph.is_declared("java.logging"));
    }

    #[test]
    fn test_cycle_detected() {
        let graph = ModuleGraph::of(&project(&[("a", &["b"]), ("b", &["a"]), ("c", &["c"])]));
        assert_eq!(
            graph.cycles(),
            vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn test_patching_unit_adds_no_edges() {
        let unit = |name: &str, requires: &[&str], dir: &str| {
            let descriptor = requires
                .iter()
                .fold(ModuleDescriptor::new(name), |d, r| d.with_requires(Requires::new(*r)));
            ModuleUnit::of(format!("src/{}/{}/java/module-info.java", name, dir), descriptor)
        };
        let main = Space::new("main")
            .with_unit(unit("foo", &[], "main"))
            .unwrap()
            .with_unit(unit("bar", &["foo"], "main"))
            .unwrap();
        let test = Space::new("test")
            .with_upstreams(["main"])
            .with_unit(unit("foo", &["bar", "org.junit.jupiter"], "test"))
            .unwrap();
        let project = Project::new(
            ProjectInfo::new("demo", "1"),
            ProjectPaths::new("/tmp/demo"),
            vec![main, test],
        );

        let graph = ModuleGraph::of(&project);
        assert!(graph.cycles().is_empty());
        assert!(graph.requires_of("foo").is_empty());
        assert_eq!(graph.requires_of("bar"), vec!["foo"]);
    }

    #[test]
    fn test_render_tree() {
        let graph = ModuleGraph::of(&project(&[
            ("com.greetings", &["org.astro"]),
            ("org.astro", &["java.logging"]),
        ]));
        assert_eq!(
            graph.render_tree("com.greetings"),
            "com.greetings\n  org.astro\n    java.logging (external)\n"
        );
    }
}
