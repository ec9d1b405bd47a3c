use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::object::Environment;
use crate::parser::Statement;

/*
Runtime values are a closed set of tagged variants. `type_tag()` gives the
name used verbatim in error messages and the `ERROR`/`FUNCTION`/etc. type
names from the external interface (spec §6).
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Integer,
    Boolean,
    String,
    Null,
    Array,
    Hash,
    Function,
    Builtin,
    Namespace,
    ReturnValue,
    Error,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Integer => "INTEGER",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::String => "STRING",
            ObjectType::Null => "NULL",
            ObjectType::Array => "ARRAY",
            ObjectType::Hash => "HASH",
            ObjectType::Function => "FUNCTION",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::Namespace => "NAMESPACE",
            ObjectType::ReturnValue => "RETURN_VALUE",
            ObjectType::Error => "ERROR",
        };
        write!(f, "{}", name)
    }
}

/// `(type_tag, fingerprint)`. Only `Integer`, `Boolean` and `String` are
/// hashable; every other kind fails with `unusable as hash key: <type>`
/// before a `HashKey` is ever constructed for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashKey {
    pub object_type: ObjectType,
    pub value: u64,
}

thread_local! {
    /// Process-wide (well: thread-wide — this interpreter never spawns a
    /// second thread, so the two coincide) cache of string FNV-1a hashes.
    /// Insert-if-absent only; entries never change or expire, matching the
    /// "never evaluated under concurrency" resource model this language
    /// assumes throughout.
    static STRING_HASH_CACHE: RefCell<HashMap<String, u64>> = RefCell::new(HashMap::new());
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    let mut hash = OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

fn cached_string_hash(s: &str) -> u64 {
    STRING_HASH_CACHE.with(|cache| {
        if let Some(&h) = cache.borrow().get(s) {
            return h;
        }
        let h = fnv1a_64(s.as_bytes());
        cache.borrow_mut().insert(s.to_string(), h);
        h
    })
}

/// An ordered key/value map keyed by `HashKey` that still lets `Inspect`
/// walk pairs in insertion order (plain `HashMap` iteration order is
/// unspecified, and spec §9 Open Question 3 only requires set equality of
/// *contents*, not order — but an ordered map trivially satisfies that too).
#[derive(Debug, Clone, Default)]
pub struct HashObj {
    pairs: Vec<(Object, Object)>,
    index: HashMap<HashKey, usize>,
}

impl HashObj {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash_key: HashKey, key: Object, value: Object) {
        if let Some(&i) = self.index.get(&hash_key) {
            self.pairs[i] = (key, value);
        } else {
            self.index.insert(hash_key, self.pairs.len());
            self.pairs.push((key, value));
        }
    }

    pub fn get(&self, hash_key: &HashKey) -> Option<&Object> {
        self.index.get(hash_key).map(|&i| &self.pairs[i].1)
    }

    pub fn pairs(&self) -> &[(Object, Object)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

pub type BuiltinFn = fn(&Rc<RefCell<Environment>>, &[Object]) -> Object;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Vec<Statement>,
    pub env: Rc<RefCell<Environment>>,
}

#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
    Null,
    Array(Rc<Vec<Object>>),
    Hash(Rc<HashObj>),
    Function(Rc<Function>),
    Builtin(Builtin),
    /// Control-flow carrier: must never be observable outside the outermost
    /// evaluation (spec §3, §8).
    ReturnValue(Box<Object>),
    /// Control-flow carrier, same rule as `ReturnValue`.
    Error(String),
    Namespace(Rc<RefCell<Environment>>),
}

/// The canonical boolean/null singletons. Rust gives `bool`/unit-style
/// variants structural equality for free, so "compared by identity" and
/// "compared by value" coincide here — there is no separate heap allocation
/// to point at, unlike the pointer-tagged original this was distilled from.
pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

pub fn native_bool(value: bool) -> Object {
    if value {
        TRUE
    } else {
        FALSE
    }
}

impl Object {
    pub fn type_tag(&self) -> ObjectType {
        match self {
            Object::Integer(_) => ObjectType::Integer,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::String(_) => ObjectType::String,
            Object::Null => ObjectType::Null,
            Object::Array(_) => ObjectType::Array,
            Object::Hash(_) => ObjectType::Hash,
            Object::Function(_) => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::ReturnValue(_) => ObjectType::ReturnValue,
            Object::Error(_) => ObjectType::Error,
            Object::Namespace(_) => ObjectType::Namespace,
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Boolean(false) | Object::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// `Some(HashKey)` for the three hashable kinds, `None` otherwise — the
    /// caller turns `None` into `unusable as hash key: <type>`.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(v) => Some(HashKey {
                object_type: ObjectType::Integer,
                value: *v as u64,
            }),
            Object::Boolean(v) => Some(HashKey {
                object_type: ObjectType::Boolean,
                value: if *v { 1 } else { 0 },
            }),
            Object::String(s) => Some(HashKey {
                object_type: ObjectType::String,
                value: cached_string_hash(s),
            }),
            _ => None,
        }
    }

    pub fn inspect(&self) -> String {
        match self {
            Object::Integer(v) => v.to_string(),
            Object::Boolean(v) => v.to_string(),
            Object::String(s) => s.to_string(),
            Object::Null => "null".to_string(),
            Object::Array(elements) => {
                let parts: Vec<String> = elements.iter().map(Object::inspect).collect();
                format!("[{}]", parts.join(", "))
            }
            Object::Hash(hash) => {
                let parts: Vec<String> = hash
                    .pairs()
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Object::Function(f) => {
                let body: Vec<String> = f.body.iter().map(|s| s.to_string()).collect();
                format!("fn({}) {{\n{}\n}}", f.parameters.join(", "), body.join("\n"))
            }
            Object::Builtin(_) => "buildin function".to_string(),
            Object::ReturnValue(v) => v.inspect(),
            Object::Error(msg) => format!("ERROR: {}", msg),
            Object::Namespace(env) => format!("namespace {}", env.borrow().inspect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_with_equal_value_hash_equal() {
        let a = Object::Integer(42).hash_key().unwrap();
        let b = Object::Integer(42).hash_key().unwrap();
        let c = Object::Integer(7).hash_key().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn strings_with_equal_value_hash_equal() {
        let a = Object::String(Rc::from("hello")).hash_key().unwrap();
        let b = Object::String(Rc::from("hello")).hash_key().unwrap();
        let c = Object::String(Rc::from("world")).hash_key().unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn same_value_different_type_hashes_differ_by_type_tag() {
        let int_one = Object::Integer(1).hash_key().unwrap();
        let bool_true = Object::Boolean(true).hash_key().unwrap();
        assert_ne!(int_one, bool_true);
    }

    #[test]
    fn only_integer_boolean_string_are_hashable() {
        assert!(Object::Array(Rc::new(vec![])).hash_key().is_none());
        assert!(Object::Null.hash_key().is_none());
    }

    #[test]
    fn null_and_false_are_falsy_everything_else_is_truthy() {
        assert!(!Object::Null.is_truthy());
        assert!(!FALSE.is_truthy());
        assert!(TRUE.is_truthy());
        assert!(Object::Integer(0).is_truthy());
        assert!(Object::String(Rc::from("")).is_truthy());
    }
}
