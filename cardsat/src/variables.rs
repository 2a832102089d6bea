//! Variable names.
//!
//! Callers may refer to variables by name. The first reference to a name allocates the next free
//! variable index, later references return the same variable. Anonymous variables created through
//! [`Solver::new_var`](crate::solver::Solver::new_var) have no name.
use rustc_hash::FxHashMap;

use cardsat_formula::Var;

/// Bijection between variable names and variables.
#[derive(Default)]
pub struct Variables {
    /// Name of each variable, indexed by variable index.
    names: Vec<Option<Box<str>>>,
    by_name: FxHashMap<Box<str>, Var>,
}

impl Variables {
    /// Update structures for a new variable count.
    ///
    /// Shrinking drops the names of removed variables.
    pub fn set_var_count(&mut self, count: usize) {
        if count < self.names.len() {
            for name in self.names.drain(count..) {
                if let Some(name) = name {
                    self.by_name.remove(&name);
                }
            }
        } else {
            self.names.resize(count, None);
        }
    }

    /// The variable with the given name, if any.
    pub fn var_by_name(&self, name: &str) -> Option<Var> {
        self.by_name.get(name).cloned()
    }

    /// The name of a variable, if it has one.
    pub fn name(&self, var: Var) -> Option<&str> {
        self.names.get(var.index()).and_then(|name| name.as_deref())
    }

    /// Associate a name with an unnamed variable.
    ///
    /// The name must not be in use.
    pub fn set_name(&mut self, var: Var, name: &str) {
        debug_assert!(!self.by_name.contains_key(name));
        debug_assert!(self.names[var.index()].is_none());
        let name: Box<str> = name.into();
        self.names[var.index()] = Some(name.clone());
        self.by_name.insert(name, var);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_dropped_on_shrink() {
        let mut variables = Variables::default();
        variables.set_var_count(3);
        variables.set_name(Var::from_index(0), "a");
        variables.set_name(Var::from_index(2), "c");

        assert_eq!(variables.var_by_name("c"), Some(Var::from_index(2)));
        assert_eq!(variables.name(Var::from_index(1)), None);

        variables.set_var_count(2);

        assert_eq!(variables.var_by_name("c"), None);
        assert_eq!(variables.var_by_name("a"), Some(Var::from_index(0)));
        assert_eq!(variables.name(Var::from_index(2)), None);

        variables.set_var_count(3);
        variables.set_name(Var::from_index(2), "c");
        assert_eq!(variables.name(Var::from_index(2)), Some("c"));
    }
}
