//! Breadth-first dependency closure.
//!
//! Membership is set based so the order nodes are visited in never changes
//! the result. Every edge followed is recorded so the reason a node was
//! included can be explained later.

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

/// Marks a seed that was requested explicitly.
pub const EXPLICIT: &str = "<explicit>";

/// Marks a seed that is always included.
pub const CORE: &str = "<core>";

/// The result of a closure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
    pub visited: BTreeSet<String>,
    /// `(from, to)` for every edge followed, including those from the
    /// [`EXPLICIT`] and [`CORE`] markers to the seeds.
    pub edges: BTreeSet<(String, String)>,
}

/// Compute the closure of a set of seeds.
///
/// Seeds are `(reason, name)` pairs. `deps_of` is called once for every
/// node reached and returns the nodes it needs, or fails the whole closure.
pub fn compute<E>(
    seeds: impl IntoIterator<Item = (&'static str, String)>,
    mut deps_of: impl FnMut(&str) -> Result<Vec<String>, E>,
) -> Result<Closure, E> {
    let mut closure = Closure::default();
    let mut frontier = VecDeque::new();

    for (reason, name) in seeds {
        closure.edges.insert((reason.to_string(), name.clone()));
        if closure.visited.insert(name.clone()) {
            frontier.push_back(name);
        }
    }

    while let Some(name) = frontier.pop_front() {
        for dep in deps_of(&name)? {
            closure.edges.insert((name.clone(), dep.clone()));
            if closure.visited.insert(dep.clone()) {
                debug!("`{}` requires `{}`", name, dep);
                frontier.push_back(dep);
            }
        }
    }

    Ok(closure)
}

/// Check if a name is one of the seed markers.
pub fn is_marker(name: &str) -> bool {
    name == EXPLICIT || name == CORE
}
