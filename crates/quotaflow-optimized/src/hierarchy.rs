//! Profile hierarchy validation.
//!
//! Profiles may inherit from one or more parents, declared by string
//! key. The relations must form a DAG; validation runs at configuration
//! time so traversal code can resolve keys through the map without
//! cycle checks.

use std::collections::HashMap;

/// Errors found while validating a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    /// A profile's parent chain loops back on itself.
    #[error("profile {profile:?} is part of an inheritance cycle")]
    Cycle {
        /// A profile on the cycle.
        profile: String,
    },
    /// A profile names a parent that was never declared.
    #[error("profile {profile:?} names unknown parent {parent:?}")]
    UnknownParent {
        /// The declaring profile.
        profile: String,
        /// The missing parent key.
        parent: String,
    },
}

/// DFS colouring: unvisited, on the current path, fully explored.
#[derive(Clone, Copy, PartialEq)]
enum Colour {
    White,
    Grey,
    Black,
}

/// Parent/child relations between profiles, keyed by name.
///
/// Records hold no back-pointers; every lookup resolves keys through
/// the map.
#[derive(Debug, Default)]
pub struct ProfileHierarchy {
    parents: HashMap<String, Vec<String>>,
}

impl ProfileHierarchy {
    /// Creates an empty hierarchy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a profile and its parents (empty for a root).
    pub fn insert<I, S>(&mut self, name: impl Into<String>, parents: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents
            .insert(name.into(), parents.into_iter().map(Into::into).collect());
    }

    /// Number of declared profiles.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns true when no profiles are declared.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    /// Checks that every parent exists and the relations form a DAG.
    ///
    /// Runs a three-colour depth-first search over the parent edges;
    /// a grey node reached twice is a cycle.
    pub fn validate(&self) -> Result<(), HierarchyError> {
        let mut colours: HashMap<&str, Colour> = self
            .parents
            .keys()
            .map(|name| (name.as_str(), Colour::White))
            .collect();

        for name in self.parents.keys() {
            if colours[name.as_str()] == Colour::White {
                self.visit(name, &mut colours)?;
            }
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        colours: &mut HashMap<&'a str, Colour>,
    ) -> Result<(), HierarchyError> {
        colours.insert(name, Colour::Grey);

        for parent in &self.parents[name] {
            match colours.get(parent.as_str()).copied() {
                None => {
                    return Err(HierarchyError::UnknownParent {
                        profile: name.to_string(),
                        parent: parent.clone(),
                    });
                }
                Some(Colour::Grey) => {
                    return Err(HierarchyError::Cycle {
                        profile: parent.clone(),
                    });
                }
                Some(Colour::Black) => {}
                Some(Colour::White) => self.visit(parent, colours)?,
            }
        }

        colours.insert(name, Colour::Black);
        Ok(())
    }

    /// Resolves a profile's ancestor chain, nearest first, depth-first
    /// over the parent edges. The hierarchy must have been validated.
    pub fn ancestors(&self, name: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = match self.parents.get(name) {
            Some(parents) => parents.iter().map(String::as_str).rev().collect(),
            None => return out,
        };

        while let Some(current) = stack.pop() {
            if out.contains(&current) {
                continue;
            }
            out.push(current);
            if let Some(parents) = self.parents.get(current) {
                for parent in parents.iter().rev() {
                    stack.push(parent.as_str());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_dag_passes() {
        let mut hierarchy = ProfileHierarchy::new();
        hierarchy.insert("base", Vec::<String>::new());
        hierarchy.insert("eu", ["base"]);
        hierarchy.insert("eu-west", ["eu"]);
        hierarchy.insert("eu-east", ["eu"]);
        assert!(hierarchy.validate().is_ok());
    }

    #[test]
    fn diamond_inheritance_is_allowed() {
        let mut hierarchy = ProfileHierarchy::new();
        hierarchy.insert("base", Vec::<String>::new());
        hierarchy.insert("fast", ["base"]);
        hierarchy.insert("secure", ["base"]);
        hierarchy.insert("fast-secure", ["fast", "secure"]);
        assert!(hierarchy.validate().is_ok());
    }

    #[test]
    fn cycles_are_rejected() {
        let mut hierarchy = ProfileHierarchy::new();
        hierarchy.insert("a", ["b"]);
        hierarchy.insert("b", ["c"]);
        hierarchy.insert("c", ["a"]);
        assert!(matches!(
            hierarchy.validate(),
            Err(HierarchyError::Cycle { .. })
        ));
    }

    #[test]
    fn self_loops_are_rejected() {
        let mut hierarchy = ProfileHierarchy::new();
        hierarchy.insert("a", ["a"]);
        assert_eq!(
            hierarchy.validate(),
            Err(HierarchyError::Cycle {
                profile: "a".to_string()
            })
        );
    }

    #[test]
    fn unknown_parents_are_rejected() {
        let mut hierarchy = ProfileHierarchy::new();
        hierarchy.insert("child", ["ghost"]);
        assert_eq!(
            hierarchy.validate(),
            Err(HierarchyError::UnknownParent {
                profile: "child".to_string(),
                parent: "ghost".to_string()
            })
        );
    }

    #[test]
    fn ancestors_resolve_through_the_map() {
        let mut hierarchy = ProfileHierarchy::new();
        hierarchy.insert("base", Vec::<String>::new());
        hierarchy.insert("eu", ["base"]);
        hierarchy.insert("eu-west", ["eu"]);
        assert_eq!(hierarchy.ancestors("eu-west"), vec!["eu", "base"]);
        assert!(hierarchy.ancestors("base").is_empty());
        assert!(hierarchy.ancestors("missing").is_empty());
    }
}
