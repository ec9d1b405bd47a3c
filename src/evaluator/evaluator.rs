use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use crate::evaluator::lookup_builtin;
use crate::object::{native_bool, Environment, Function, HashObj, Object, FALSE, NULL, TRUE};
use crate::parser::{Expression, Statement};

/*
`eval_statement`/`eval_expression` are a straight recursive walk over the
AST. Two sentinel object variants ride the normal `Object` channel to
implement non-local control flow without a side-channel `Result`:

- `Object::ReturnValue` aborts evaluation up to (and is unwrapped by) the
  nearest enclosing function call or the top-level program.
- `Object::Error` aborts evaluation the same way but is never unwrapped —
  it propagates verbatim all the way out.

`eval_block_statement` propagates both *without* unwrapping, so a `return`
inside nested `if`/block bodies escapes every enclosing block up to the
function call boundary, not just the innermost block.
*/

pub fn eval_program(statements: &[Statement], env: &Rc<RefCell<Environment>>) -> Object {
    let mut result = NULL;

    for stmt in statements {
        result = eval_statement(stmt, env);

        match result {
            Object::ReturnValue(value) => return *value,
            Object::Error(_) => return result,
            _ => {}
        }
    }

    result
}

fn eval_block_statement(statements: &[Statement], env: &Rc<RefCell<Environment>>) -> Object {
    let mut result = NULL;

    for stmt in statements {
        result = eval_statement(stmt, env);

        if matches!(result, Object::ReturnValue(_) | Object::Error(_)) {
            return result;
        }
    }

    result
}

fn eval_statement(stmt: &Statement, env: &Rc<RefCell<Environment>>) -> Object {
    match stmt {
        Statement::Let { name, value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            env.borrow_mut().set(name.clone(), value);
            NULL
        }
        Statement::Return { value } => {
            let value = eval_expression(value, env);
            if value.is_error() {
                return value;
            }
            Object::ReturnValue(Box::new(value))
        }
        Statement::Expression(expr) => eval_expression(expr, env),
        Statement::Block(stmts) => eval_block_statement(stmts, env),
    }
}

fn eval_expression(expr: &Expression, env: &Rc<RefCell<Environment>>) -> Object {
    match expr {
        Expression::IntegerLiteral(v) => Object::Integer(*v),
        Expression::StringLiteral(s) => Object::String(Rc::from(s.as_str())),
        Expression::BooleanLiteral(v) => native_bool(*v),
        Expression::Identifier(name) => eval_identifier(name, env),
        Expression::Prefix { operator, right } => {
            let right = eval_expression(right, env);
            if right.is_error() {
                return right;
            }
            eval_prefix_expression(operator, right)
        }
        Expression::Infix {
            operator,
            left,
            right,
        } => eval_infix_expression(operator, left, right, env),
        Expression::If {
            condition,
            consequence,
            alternative,
        } => eval_if_expression(condition, consequence, alternative.as_deref(), env),
        Expression::FunctionLiteral { parameters, body } => {
            Object::Function(Rc::new(Function {
                parameters: parameters.clone(),
                body: body.clone(),
                env: env.clone(),
            }))
        }
        Expression::Call {
            function,
            arguments,
        } => eval_call_expression(function, arguments, env),
        Expression::ArrayLiteral(elements) => {
            let values = match eval_expressions(elements, env) {
                Ok(values) => values,
                Err(err) => return err,
            };
            Object::Array(Rc::new(values))
        }
        Expression::Index { left, index } => {
            let left = eval_expression(left, env);
            if left.is_error() {
                return left;
            }
            let index = eval_expression(index, env);
            if index.is_error() {
                return index;
            }
            eval_index_expression(left, index)
        }
        Expression::HashLiteral(pairs) => eval_hash_literal(pairs, env),
        Expression::NamespaceLiteral(body) => {
            let inner = Environment::enclosed(env.clone());
            let result = eval_block_statement(body, &inner);
            if result.is_error() {
                return result;
            }
            Object::Namespace(inner)
        }
        Expression::Dot { left, field } => eval_dot_expression(left, field, env),
    }
}

fn eval_identifier(name: &str, env: &Rc<RefCell<Environment>>) -> Object {
    if let Some(value) = env.borrow().get(name) {
        return value;
    }
    if let Some(builtin) = lookup_builtin(name) {
        return builtin;
    }
    Object::Error(format!("identifier not found: {}", name))
}

fn eval_expressions(
    exprs: &[Expression],
    env: &Rc<RefCell<Environment>>,
) -> Result<Vec<Object>, Object> {
    let mut values = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let value = eval_expression(expr, env);
        if value.is_error() {
            return Err(value);
        }
        values.push(value);
    }
    Ok(values)
}

fn eval_prefix_expression(operator: &str, right: Object) -> Object {
    match operator {
        "!" => eval_bang_operator(right),
        "-" => eval_minus_prefix_operator(right),
        _ => Object::Error(format!("unknown operator: {}{}", operator, right.type_tag())),
    }
}

fn eval_bang_operator(right: Object) -> Object {
    match right {
        Object::Boolean(true) => FALSE,
        Object::Boolean(false) => TRUE,
        Object::Null => TRUE,
        _ => FALSE,
    }
}

fn eval_minus_prefix_operator(right: Object) -> Object {
    match right {
        Object::Integer(v) => Object::Integer(-v),
        other => Object::Error(format!("unknown operator: -{}", other.type_tag())),
    }
}

/// `&&`/`||` short-circuit at this layer, not in the parser: the right
/// operand's expression tree is only ever evaluated when its value could
/// matter, so an unresolved identifier on the skipped side never raises.
fn eval_infix_expression(
    operator: &str,
    left: &Expression,
    right: &Expression,
    env: &Rc<RefCell<Environment>>,
) -> Object {
    if operator == "&&" || operator == "||" {
        let left_val = eval_expression(left, env);
        if left_val.is_error() {
            return left_val;
        }
        let short_circuits = if operator == "||" {
            left_val.is_truthy()
        } else {
            !left_val.is_truthy()
        };
        if short_circuits {
            return left_val;
        }
        return eval_expression(right, env);
    }

    let left_val = eval_expression(left, env);
    if left_val.is_error() {
        return left_val;
    }
    let right_val = eval_expression(right, env);
    if right_val.is_error() {
        return right_val;
    }

    eval_infix_values(operator, left_val, right_val)
}

fn eval_infix_values(operator: &str, left: Object, right: Object) -> Object {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(operator, *l, *r),
        (Object::String(l), Object::String(r)) => eval_string_infix(operator, l, r),
        _ => match operator {
            "==" => native_bool(values_identical(&left, &right)),
            "!=" => native_bool(!values_identical(&left, &right)),
            _ if left.type_tag() != right.type_tag() => Object::Error(format!(
                "type mismatch: {} {} {}",
                left.type_tag(),
                operator,
                right.type_tag()
            )),
            _ => Object::Error(format!(
                "unknown operator: {} {} {}",
                left.type_tag(),
                operator,
                right.type_tag()
            )),
        },
    }
}

/// `TRUE`/`FALSE`/`NULL` compare "by identity" in the original; in this
/// representation that coincides with plain structural equality (see
/// `object::TRUE`/`FALSE`/`NULL`). Cross-type `==`/`!=` (e.g. integer vs.
/// string) always compares unequal rather than erroring.
fn values_identical(left: &Object, right: &Object) -> bool {
    match (left, right) {
        (Object::Boolean(l), Object::Boolean(r)) => l == r,
        (Object::Null, Object::Null) => true,
        (Object::Integer(l), Object::Integer(r)) => l == r,
        (Object::String(l), Object::String(r)) => l == r,
        _ => false,
    }
}

fn eval_integer_infix(operator: &str, left: i64, right: i64) -> Object {
    match operator {
        "+" => Object::Integer(left + right),
        "-" => Object::Integer(left - right),
        "*" => Object::Integer(left * right),
        "/" => Object::Integer(left / right),
        "<" => native_bool(left < right),
        ">" => native_bool(left > right),
        "<=" => native_bool(left <= right),
        ">=" => native_bool(left >= right),
        "==" => native_bool(left == right),
        "!=" => native_bool(left != right),
        _ => Object::Error(format!("unknown operator: INTEGER {} INTEGER", operator)),
    }
}

fn eval_string_infix(operator: &str, left: &str, right: &str) -> Object {
    match operator {
        "+" => Object::String(Rc::from(format!("{}{}", left, right))),
        "==" => native_bool(left == right),
        "!=" => native_bool(left != right),
        _ => Object::Error(format!("unknown operator: STRING {} STRING", operator)),
    }
}

fn eval_if_expression(
    condition: &Expression,
    consequence: &[Statement],
    alternative: Option<&[Statement]>,
    env: &Rc<RefCell<Environment>>,
) -> Object {
    let condition = eval_expression(condition, env);
    if condition.is_error() {
        return condition;
    }

    if condition.is_truthy() {
        eval_block_statement(consequence, env)
    } else if let Some(alternative) = alternative {
        eval_block_statement(alternative, env)
    } else {
        NULL
    }
}

fn eval_call_expression(
    function: &Expression,
    arguments: &[Expression],
    env: &Rc<RefCell<Environment>>,
) -> Object {
    let callee = eval_expression(function, env);
    if callee.is_error() {
        return callee;
    }

    let args = match eval_expressions(arguments, env) {
        Ok(args) => args,
        Err(err) => return err,
    };

    apply_function(callee, args, env)
}

fn apply_function(func: Object, args: Vec<Object>, caller_env: &Rc<RefCell<Environment>>) -> Object {
    match func {
        Object::Function(f) => {
            if args.len() != f.parameters.len() {
                return Object::Error(format!(
                    "wrong number of arguments. got={}, want={}",
                    args.len(),
                    f.parameters.len()
                ));
            }

            let call_env = Environment::enclosed(f.env.clone());
            for (param, arg) in f.parameters.iter().zip(args) {
                call_env.borrow_mut().set(param.clone(), arg);
            }

            match eval_block_statement(&f.body, &call_env) {
                Object::ReturnValue(value) => *value,
                other => other,
            }
        }
        Object::Builtin(builtin) => (builtin.func)(caller_env, &args),
        other => Object::Error(format!("not a function: {}", other.type_tag())),
    }
}

fn eval_index_expression(left: Object, index: Object) -> Object {
    match (&left, &index) {
        (Object::Array(elements), Object::Integer(i)) => {
            if *i < 0 || *i as usize >= elements.len() {
                return NULL;
            }
            elements[*i as usize].clone()
        }
        (Object::Hash(_), _) => eval_hash_index_expression(left, index),
        (Object::Array(_), _) => Object::Error(format!(
            "index operator not supported: {}[{}]",
            left.type_tag(),
            index.type_tag()
        )),
        _ => Object::Error(format!("index operator not supported: {}", left.type_tag())),
    }
}

fn eval_hash_index_expression(left: Object, index: Object) -> Object {
    let Object::Hash(hash) = left else {
        unreachable!("caller guarantees Hash");
    };
    let Some(hash_key) = index.hash_key() else {
        return Object::Error(format!("unusable as hash key: {}", index.type_tag()));
    };
    hash.get(&hash_key).cloned().unwrap_or(NULL)
}

fn eval_hash_literal(pairs: &[(Expression, Expression)], env: &Rc<RefCell<Environment>>) -> Object {
    let mut hash = HashObj::new();

    for (key_expr, value_expr) in pairs {
        let key = eval_expression(key_expr, env);
        if key.is_error() {
            return key;
        }

        let Some(hash_key) = key.hash_key() else {
            return Object::Error(format!("unusable as hash key: {}", key.type_tag()));
        };

        let value = eval_expression(value_expr, env);
        if value.is_error() {
            return value;
        }

        hash.insert(hash_key, key, value);
    }

    Object::Hash(Rc::new(hash))
}

/// Dot access walks the namespace's outer chain the same way a plain
/// identifier lookup does — `Environment` exposes one lookup path (`get`),
/// recursive into the outer chain, and a namespace's environment is an
/// ordinary `Environment`. When the result is a function and the dot is the
/// callee of a call (handled in `eval_call_expression` via the ordinary
/// `Function` path), the call still executes in the function's own
/// captured environment, not the namespace's — standard lexical scoping,
/// unaffected by how the function was reached.
fn eval_dot_expression(left: &Expression, field: &str, env: &Rc<RefCell<Environment>>) -> Object {
    let left = eval_expression(left, env);
    if left.is_error() {
        return left;
    }

    let Object::Namespace(ns_env) = left else {
        return Object::Error(format!("not a namespace: {}", left.type_tag()));
    };

    match ns_env.borrow().get(field) {
        Some(value) => {
            trace!("dot access resolved: {}", field);
            value
        }
        None => Object::Error(format!("identifier not found: {}", field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn eval(input: &str) -> Object {
        let lexer = Lexer::new(input);
        let mut parser = Parser::new(lexer);
        let program = parser.parse_program();
        assert!(parser.errors().is_empty(), "parser errors: {:?}", parser.errors());
        let env = Environment::new();
        eval_program(&program.statements, &env)
    }

    #[test]
    fn evaluates_arithmetic_with_precedence() {
        let result = eval("(5 + 10 * 2 + 15 / 3) * 2 + -10");
        assert!(matches!(result, Object::Integer(50)));
    }

    #[test]
    fn nested_return_escapes_to_enclosing_function_call() {
        let result = eval("if (10 > 1) { if (10 > 1) { return 10; }; return 1; }");
        assert!(matches!(result, Object::Integer(10)));
    }

    #[test]
    fn closures_capture_their_defining_environment() {
        let result = eval(
            "let newAdder = fn(x) { fn(y) { x + y }; }; let addTwo = newAdder(2); addTwo(3);",
        );
        assert!(matches!(result, Object::Integer(5)));
    }

    #[test]
    fn namespace_self_and_dot_call_compose() {
        let result = eval(
            "let Person = namespace { let new = fn(age) { self() }; let canDrink = fn() { age >= 20; }; }; Person.new(30).canDrink();",
        );
        assert!(matches!(result, Object::Boolean(true)));
    }

    #[test]
    fn string_concatenation() {
        let result = eval("\"Hello\" + \" \" + \"world!\"");
        match result {
            Object::String(s) => assert_eq!(&*s, "Hello world!"),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn integer_plus_boolean_is_a_type_mismatch() {
        let result = eval("5 + true;");
        match result {
            Object::Error(msg) => assert_eq!(msg, "type mismatch: INTEGER + BOOLEAN"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn same_type_unsupported_comparison_is_an_unknown_operator() {
        let result = eval("false <= false;");
        match result {
            Object::Error(msg) => assert_eq!(msg, "unknown operator: BOOLEAN <= BOOLEAN"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn cross_type_comparison_is_a_type_mismatch() {
        let result = eval("true >= 5;");
        match result {
            Object::Error(msg) => assert_eq!(msg, "type mismatch: BOOLEAN >= INTEGER"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn function_as_hash_key_is_unusable() {
        let result = eval(r#"{"name": "Monkey"}[fn(x){x}]"#);
        match result {
            Object::Error(msg) => assert_eq!(msg, "unusable as hash key: FUNCTION"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn rest_does_not_mutate_its_argument() {
        let result = eval("let a = [1, 2]; rest(a); a;");
        match result {
            Object::Array(elements) => {
                assert_eq!(elements.len(), 2);
                assert!(matches!(elements[0], Object::Integer(1)));
                assert!(matches!(elements[1], Object::Integer(2)));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn push_does_not_mutate_its_argument() {
        let result = eval("let a = [1]; let b = push(a, 2); a;");
        match result {
            Object::Array(elements) => assert_eq!(elements.len(), 1),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn and_short_circuits_without_evaluating_right_operand() {
        let result = eval("false && nonexistent;");
        assert!(matches!(result, Object::Boolean(false)));
    }

    #[test]
    fn or_short_circuits_without_evaluating_right_operand() {
        let result = eval("true || nonexistent;");
        assert!(matches!(result, Object::Boolean(true)));
    }

    #[test]
    fn recursive_let_bound_function_resolves_its_own_name() {
        let result = eval(
            "let fact = fn(n) { if (n == 0) { 1 } else { n * fact(n - 1) } }; fact(5);",
        );
        assert!(matches!(result, Object::Integer(120)));
    }

    #[test]
    fn array_index_out_of_range_is_null() {
        let result = eval("[1, 2, 3][10];");
        assert!(matches!(result, Object::Null));
    }

    #[test]
    fn hash_missing_key_is_null() {
        let result = eval(r#"{"a": 1}["b"];"#);
        assert!(matches!(result, Object::Null));
    }

    #[test]
    fn error_does_not_escape_as_a_wrapper_to_callers() {
        // `ReturnValue`/`Error` must never be directly observable; the
        // outermost result here is the plain `Error` object's message, not
        // some nested wrapper.
        let result = eval("return 5 + true;");
        assert!(matches!(result, Object::Error(_)));
    }
}
