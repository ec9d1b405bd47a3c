use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::object::Object;

/*
A name-to-value mapping with an optional outer link. `get` looks up locally
then recurses into the outer chain; `set` always writes locally.

Environments are shared: a `Function` keeps an `Rc` to the frame active at
its definition site, and a `Namespace` wraps one directly. Because this
language's only binding form is `let` (no assignment), the one place sharing
has to be *mutable* rather than merely *read-only-shared* is top-level
recursion — `let fact = fn(n) { ... fact(n - 1) ... };` only resolves
because the function's closure and the `let` that names it are the same
`Rc<RefCell<Environment>>`, and the name is inserted into it after the
closure already holds a reference. `RefCell` is what makes that legal.
*/
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            outer: None,
        }))
    }

    pub fn enclosed(outer: Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            store: HashMap::new(),
            outer: Some(outer),
        }))
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        if let Some(value) = self.store.get(name) {
            return Some(value.clone());
        }
        self.outer.as_ref().and_then(|outer| outer.borrow().get(name))
    }

    pub fn set(&mut self, name: impl Into<String>, value: Object) {
        self.store.insert(name.into(), value);
    }

    pub fn outer(&self) -> Option<Rc<RefCell<Environment>>> {
        self.outer.clone()
    }

    /// `{k1: v1, k2: v2, ...}`; a bound `Namespace` abbreviates to
    /// `namespace {...}` to avoid recursing into a self-referential
    /// environment (e.g. `namespace { let ns = self(); }`).
    pub fn inspect(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.store.len());
        for (key, value) in &self.store {
            match value {
                Object::Namespace(_) => parts.push(format!("{}: namespace {{...}}", key)),
                other => parts.push(format!("{}: {}", key, other.inspect())),
            }
        }
        format!("{{{}}}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_binding_shadows_outer_lookup() {
        let outer = Environment::new();
        outer.borrow_mut().set("x", Object::Integer(1));

        let inner = Environment::enclosed(outer.clone());
        inner.borrow_mut().set("x", Object::Integer(2));

        assert!(matches!(inner.borrow().get("x"), Some(Object::Integer(2))));
        assert!(matches!(outer.borrow().get("x"), Some(Object::Integer(1))));
    }

    #[test]
    fn inner_sees_outer_bindings_not_shadowed() {
        let outer = Environment::new();
        outer.borrow_mut().set("x", Object::Integer(1));

        let inner = Environment::enclosed(outer.clone());
        assert!(matches!(inner.borrow().get("x"), Some(Object::Integer(1))));
    }

    #[test]
    fn binding_added_to_a_shared_frame_after_capture_is_still_visible() {
        // This is what makes `let fact = fn(n) { ... fact(n - 1) ... };` work.
        let env = Environment::new();
        assert!(env.borrow().get("later").is_none());
        env.borrow_mut().set("later", Object::Integer(9));
        assert!(matches!(env.borrow().get("later"), Some(Object::Integer(9))));
    }

}
