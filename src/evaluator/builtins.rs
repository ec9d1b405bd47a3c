use std::cell::RefCell;
use std::rc::Rc;

use crate::evaluator::eval_script_file;
use crate::object::{Builtin, BuiltinFn, Environment, Object, NULL};

/*
The builtin table is a name -> callable mapping, each callable taking the
*current* evaluation environment alongside its arguments — `self`, `outer`
and `import` all need to see the caller's scope, which an ordinary
`Function` gets for free from its closure but a builtin has none of.
*/
pub fn lookup_builtin(name: &str) -> Option<Object> {
    let (name, func): (&'static str, BuiltinFn) = match name {
        "len" => ("len", builtin_len as BuiltinFn),
        "first" => ("first", builtin_first as BuiltinFn),
        "last" => ("last", builtin_last as BuiltinFn),
        "rest" => ("rest", builtin_rest as BuiltinFn),
        "push" => ("push", builtin_push as BuiltinFn),
        "puts" => ("puts", builtin_puts as BuiltinFn),
        "self" => ("self", builtin_self as BuiltinFn),
        "outer" => ("outer", builtin_outer as BuiltinFn),
        "import" => ("import", builtin_import as BuiltinFn),
        _ => return None,
    };
    Some(Object::Builtin(Builtin { name, func }))
}

fn wrong_arity(got: usize, want: usize) -> Object {
    Object::Error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

fn wrong_argument_type(builtin: &str, want: &str, got: &Object) -> Object {
    Object::Error(format!(
        "argument to `{}` must be {}, got {}",
        builtin,
        want,
        got.type_tag()
    ))
}

fn builtin_len(_env: &Rc<RefCell<Environment>>, args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &args[0] {
        Object::String(s) => Object::Integer(s.len() as i64),
        Object::Array(elements) => Object::Integer(elements.len() as i64),
        other => Object::Error(format!(
            "argument to `len` not supported, got {}",
            other.type_tag()
        )),
    }
}

fn builtin_first(_env: &Rc<RefCell<Environment>>, args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &args[0] {
        Object::Array(elements) => elements.first().cloned().unwrap_or(NULL),
        other => wrong_argument_type("first", "ARRAY", other),
    }
}

fn builtin_last(_env: &Rc<RefCell<Environment>>, args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &args[0] {
        Object::Array(elements) => elements.last().cloned().unwrap_or(NULL),
        other => wrong_argument_type("last", "ARRAY", other),
    }
}

fn builtin_rest(_env: &Rc<RefCell<Environment>>, args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    match &args[0] {
        Object::Array(elements) => {
            if elements.is_empty() {
                NULL
            } else {
                Object::Array(Rc::new(elements[1..].to_vec()))
            }
        }
        other => wrong_argument_type("rest", "ARRAY", other),
    }
}

fn builtin_push(_env: &Rc<RefCell<Environment>>, args: &[Object]) -> Object {
    if args.len() != 2 {
        return wrong_arity(args.len(), 2);
    }
    match &args[0] {
        Object::Array(elements) => {
            let mut copy = (**elements).clone();
            copy.push(args[1].clone());
            Object::Array(Rc::new(copy))
        }
        other => wrong_argument_type("push", "ARRAY", other),
    }
}

fn builtin_puts(_env: &Rc<RefCell<Environment>>, args: &[Object]) -> Object {
    for arg in args {
        println!("{}", arg.inspect());
    }
    NULL
}

fn builtin_self(env: &Rc<RefCell<Environment>>, args: &[Object]) -> Object {
    if !args.is_empty() {
        return wrong_arity(args.len(), 0);
    }
    Object::Namespace(env.clone())
}

fn builtin_outer(env: &Rc<RefCell<Environment>>, args: &[Object]) -> Object {
    if !args.is_empty() {
        return wrong_arity(args.len(), 0);
    }
    match env.borrow().outer() {
        Some(outer) => Object::Namespace(outer),
        None => NULL,
    }
}

fn builtin_import(_env: &Rc<RefCell<Environment>>, args: &[Object]) -> Object {
    if args.len() != 1 {
        return wrong_arity(args.len(), 1);
    }
    let path = match &args[0] {
        Object::String(s) => s.to_string(),
        other => return wrong_argument_type("import", "STRING", other),
    };

    match eval_script_file(&path) {
        Ok(env) => Object::Namespace(env),
        Err(message) => Object::Error(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Object]) -> Object {
        let env = Environment::new();
        match lookup_builtin(name).unwrap() {
            Object::Builtin(b) => (b.func)(&env, args),
            _ => unreachable!(),
        }
    }

    #[test]
    fn len_supports_strings_and_arrays() {
        assert!(matches!(
            call("len", &[Object::String(Rc::from("hello"))]),
            Object::Integer(5)
        ));
        assert!(matches!(
            call(
                "len",
                &[Object::Array(Rc::new(vec![Object::Integer(1), Object::Integer(2)]))]
            ),
            Object::Integer(2)
        ));
    }

    #[test]
    fn len_rejects_unsupported_types() {
        match call("len", &[Object::Integer(1)]) {
            Object::Error(msg) => assert_eq!(msg, "argument to `len` not supported, got INTEGER"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn first_and_last_on_empty_array_are_null() {
        let empty = Object::Array(Rc::new(vec![]));
        assert!(matches!(call("first", &[empty.clone()]), Object::Null));
        assert!(matches!(call("last", &[empty]), Object::Null));
    }

    #[test]
    fn wrong_arity_reports_canonical_message() {
        match call("len", &[]) {
            Object::Error(msg) => assert_eq!(msg, "wrong number of arguments. got=0, want=1"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn self_wraps_the_caller_environment() {
        let env = Environment::new();
        env.borrow_mut().set("x", Object::Integer(1));
        match lookup_builtin("self").unwrap() {
            Object::Builtin(b) => match (b.func)(&env, &[]) {
                Object::Namespace(ns) => assert!(matches!(ns.borrow().get("x"), Some(Object::Integer(1)))),
                other => panic!("expected namespace, got {:?}", other),
            },
            _ => unreachable!(),
        }
    }

    #[test]
    fn outer_is_null_at_the_root_environment() {
        assert!(matches!(call("outer", &[]), Object::Null));
    }
}
