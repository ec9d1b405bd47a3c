use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::evaluator::{eval_script_file, eval_source};
use crate::object::Environment;

const DEFAULT_SCRIPT_DIR: &str = "./scripts";
const PROMPT: &str = ">> ";

/// Resolves `name` as given first, then relative to `LANG_SCRIPT_DIR`
/// (default `./scripts`), so a bare script name works from wherever the
/// binary happens to be invoked.
fn resolve_script_path(name: &str) -> PathBuf {
    let direct = Path::new(name);
    if direct.exists() {
        return direct.to_path_buf();
    }

    let script_dir = std::env::var("LANG_SCRIPT_DIR").unwrap_or_else(|_| DEFAULT_SCRIPT_DIR.into());
    Path::new(&script_dir).join(name)
}

pub fn run_file(name: &str) {
    let path = resolve_script_path(name);
    let path_str = path.to_string_lossy().into_owned();
    info!("running script {}", path_str);

    if let Err(message) = eval_script_file(&path_str) {
        error!("{}", message);
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

pub fn run_prompt() {
    println!("Hello! This is the language REPL.");
    println!("Feel free to type in commands");

    let env = Environment::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", PROMPT);
        stdout.flush().expect("failed to flush stdout");

        let mut line = String::new();
        let bytes_read = stdin.read_line(&mut line).expect("failed to read from stdin");
        if bytes_read == 0 {
            break;
        }

        match eval_source(&line, &env) {
            Ok(value) => println!("{}", value.inspect()),
            Err(message) => println!("{}", message),
        }
    }
}
