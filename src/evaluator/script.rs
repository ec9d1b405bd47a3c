use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use log::debug;

use crate::evaluator::eval_program;
use crate::lexer::Lexer;
use crate::object::{Environment, Object};
use crate::parser::Parser;

/*
`eval_source` is the shared lex -> parse -> evaluate pipeline behind both
the `import` builtin and the CLI script driver (`runner`). A parser failure
and an evaluator `Error` both collapse to the same `Result::Err(String)` —
the decorated banner for the former, the bare message for the latter — so
either front end can print/propagate it uniformly.
*/

const MASCOT: &str = r#"
           __,__
  .--.  .-"     "-.  .--.
 / .. \/  .-. .-.  \/ .. \
| |  '|  /   Y   \  |'  | |
| \   \  \ 0 | 0 /  /   / |
 \ '- ,\.-"""""""-./, -' /
  ''-' /_   ^ ^   _\ '-''
      |  \._   _./  |
      \   \ '~' /   /
       '._ '-=-' _.'
          '-----'
"#;

pub fn format_parser_errors(errors: &[String]) -> String {
    let mut out = String::new();
    out.push_str(MASCOT);
    out.push_str("Woops! We ran into some monkey business here!\n");
    out.push_str(" parser errors:\n");
    for err in errors {
        out.push('\t');
        out.push_str(err);
        out.push('\n');
    }
    out
}

pub fn eval_source(source: &str, env: &Rc<RefCell<Environment>>) -> Result<Object, String> {
    debug!("evaluating {} bytes of source", source.len());

    let lexer = Lexer::new(source);
    let mut parser = Parser::new(lexer);
    let program = parser.parse_program();

    if !parser.errors().is_empty() {
        return Err(format_parser_errors(parser.errors()));
    }

    match eval_program(&program.statements, env) {
        Object::Error(message) => Err(message),
        value => Ok(value),
    }
}

fn read_script(path: &str) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|_| format!("file could not open: {}", path))?;
    String::from_utf8(bytes).map_err(|_| format!("file could not read: {}", path))
}

fn bind_script_globals(env: &Rc<RefCell<Environment>>, path: &str) {
    let absolute = std::fs::canonicalize(path)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string());

    let dir = Path::new(&absolute)
        .parent()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let this_dir = format!("{}{}", dir, std::path::MAIN_SEPARATOR);

    let mut env = env.borrow_mut();
    env.set("THIS_DIR", Object::String(Rc::from(this_dir.as_str())));
    env.set("THIS_FILE", Object::String(Rc::from(absolute.as_str())));
}

/// Evaluates `path` in a fresh root environment and hands that environment
/// back on success, so callers (the `import` builtin, the file runner) can
/// wrap it as a `Namespace` or simply discard it.
pub fn eval_script_file(path: &str) -> Result<Rc<RefCell<Environment>>, String> {
    let source = read_script(path)?;
    let env = Environment::new();
    bind_script_globals(&env, path);
    eval_source(&source, &env)?;
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_errors_are_decorated_with_the_mascot_banner() {
        let formatted = format_parser_errors(&["no prefix parse function for Eof found".into()]);
        assert!(formatted.contains("Woops! We ran into some monkey business here!"));
        assert!(formatted.contains(" parser errors:\n"));
        assert!(formatted.contains("\tno prefix parse function for Eof found\n"));
    }

    #[test]
    fn missing_file_reports_canonical_open_error() {
        let result = eval_script_file("/nonexistent/path/does-not-exist.lang");
        assert_eq!(
            result.unwrap_err(),
            "file could not open: /nonexistent/path/does-not-exist.lang"
        );
    }

    #[test]
    fn eval_source_surfaces_evaluator_errors_as_plain_messages() {
        let env = Environment::new();
        let result = eval_source("5 + true;", &env);
        assert_eq!(result.unwrap_err(), "type mismatch: INTEGER + BOOLEAN");
    }
}
