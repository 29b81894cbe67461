//! the interpreter binary. takes a C source file and runs it, or dumps an
//! intermediate front-end stage instead.
//!
//! run with `--help` for more info.

use minic::front::*;
use minic::interp::{run, StdConsole};

use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// the input file
    file: Option<String>,
    /// the output format
    #[arg(value_enum, short, long, default_value_t = Output::Run)]
    out: Output,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
enum Output {
    /// the list of tokens
    Tokens,
    /// the ast data structure
    Ast,
    /// evaluate the program
    Run,
}

fn main() {
    use Output::*;
    let args = Args::parse();

    let Some(file) = args.file else {
        eprintln!("Please input .c file");
        std::process::exit(1);
    };

    let input = String::from_utf8(std::fs::read(&file).expect("file should be readable"))
        .expect("input characters should be utf8");

    match args.out {
        Tokens => {
            let mut lexer = lex::Lexer::new(&input);
            loop {
                match lexer.next() {
                    Ok(Some(token)) => println!("{token}"),
                    Ok(None) => break,
                    Err(err) => {
                        eprintln!("{err}");
                        std::process::exit(1);
                    }
                }
            }
        }
        Ast => match parse(&input) {
            Ok(unit) => println!("{unit:?}"),
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        },
        Run => match parse(&input) {
            Ok(unit) => run(&unit, &mut StdConsole),
            Err(err) => {
                eprintln!("{err}");
                std::process::exit(1);
            }
        },
    }
}
