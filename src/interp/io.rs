//! The console: how `get` and `print` reach the outside world.
//!
//! The interpreter talks to a [Console] so the scenario tests can script
//! input and capture output in-process; the seam carries no semantics.

use std::io::Write;

use super::Value;

pub trait Console {
    /// Read one integer for `get()`.
    fn read_int(&mut self) -> Value;

    /// Write one integer for `print(x)`.
    fn print_int(&mut self, value: Value);
}

/// The production console: prompts on stderr, reads a line from stdin, and
/// prints decimal integers to stderr, one per line.
pub struct StdConsole;

impl Console for StdConsole {
    fn read_int(&mut self) -> Value {
        eprint!("Please input an integer: ");
        std::io::stderr().flush().ok();
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).ok();
        // A failed read yields 0, like `std::cin >> val` on failure.
        line.trim().parse().unwrap_or(0)
    }

    fn print_int(&mut self, value: Value) {
        eprintln!("{value}");
    }
}

/// A console with scripted input and captured output, for tests.
#[derive(Default)]
pub struct ScriptedConsole {
    /// Remaining values `get()` will return, front first.
    inputs: Vec<Value>,
    /// Everything `print()` produced, in order.
    pub printed: Vec<Value>,
}

impl ScriptedConsole {
    pub fn new(inputs: Vec<Value>) -> Self {
        ScriptedConsole {
            inputs,
            printed: Vec::new(),
        }
    }
}

impl Console for ScriptedConsole {
    fn read_int(&mut self) -> Value {
        if self.inputs.is_empty() {
            return 0; // end of input
        }
        self.inputs.remove(0)
    }

    fn print_int(&mut self, value: Value) {
        self.printed.push(value);
    }
}
