//! gmlvm: assemble, verify, disassemble and run GML bytecode.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Usage, input, decode or assembly error
//! - 2: Verification failure
//! - 3: Runtime fault

mod commands;

use std::process;

use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    init_logging(args.iter().any(|a| a == "--debug"));

    let result = match args[1].as_str() {
        "assemble" => commands::assemble(&args[2..]),
        "disassemble" => commands::disassemble(&args[2..]),
        "verify" => commands::verify(&args[2..]),
        "run" => commands::run(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

/// Log to stderr so program output on stdout stays clean. `RUST_LOG`
/// overrides the default level.
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    eprintln!("Usage: gmlvm <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  assemble <input.gma> [-o output.gmb]   Assemble text to binary");
    eprintln!("  disassemble <input>                    Print canonical assembly text");
    eprintln!("  verify <input>                         Check code blocks statically");
    eprintln!("  run <input> [options]                  Verify and execute a function");
    eprintln!("                                         (block names must be unique)");
    eprintln!();
    eprintln!("Run options:");
    eprintln!("  --entry NAME          Function to invoke (default: main)");
    eprintln!("  --debug               Trace every instruction");
    eprintln!("  --max-depth N         Call stack limit");
    eprintln!("  --budget N            Instruction budget per invocation");
    eprintln!("  --push-call-results   Push code-block CALL results on the stack");
    eprintln!("  --globals             Print the global table after the run");
    eprintln!();
    eprintln!("<input> may be assembly text or a binary image (.gmb).");
}
