use std::env;

use lang_interpreter::runner::{run_file, run_prompt};

fn main() {
    simple_logger::init_with_level(log::Level::Warn).unwrap();

    let args: Vec<String> = env::args().collect();
    // args always includes the program name in args[0]
    match args.len() {
        1 => run_prompt(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: lang [script]");
            std::process::exit(64);
        }
    }
}
