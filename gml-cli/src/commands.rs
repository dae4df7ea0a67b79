//! CLI command implementations.

use std::fs;

use gml_common::code_block::MAGIC;
use gml_common::{decode_blocks, encode_blocks, CodeBlock};
use gml_vm::{CallResultPolicy, Completion, Vm, VmConfig};

/// Assemble a .gma text file to a .gmb binary image.
pub fn assemble(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: assemble requires an input file");
        eprintln!("Usage: gmlvm assemble <input.gma> [-o output.gmb]");
        return Err(1);
    }

    let input = &args[0];

    let output = match args.get(1).map(String::as_str) {
        Some("-o") => match args.get(2) {
            Some(path) => path.clone(),
            None => {
                eprintln!("error: -o requires a path");
                return Err(1);
            }
        },
        Some(other) => {
            eprintln!("error: unexpected argument '{other}'");
            return Err(1);
        }
        None => match input.strip_suffix(".gma") {
            Some(stem) => format!("{stem}.gmb"),
            None => format!("{input}.gmb"),
        },
    };

    let text = fs::read_to_string(input).map_err(|e| {
        eprintln!("error: cannot read '{input}': {e}");
        1
    })?;

    let blocks = gml_assembler::assemble(&text).map_err(|e| {
        eprintln!("error: {e}");
        1
    })?;

    let bytes = encode_blocks(&blocks);
    let instr_count: usize = blocks.iter().map(CodeBlock::len).sum();

    fs::write(&output, &bytes).map_err(|e| {
        eprintln!("error: cannot write '{output}': {e}");
        1
    })?;

    eprintln!(
        "assembled {} blocks, {instr_count} instructions ({} bytes) -> {output}",
        blocks.len(),
        bytes.len()
    );
    Ok(())
}

/// Print the canonical assembly text of an image or source file.
pub fn disassemble(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: disassemble requires an input file");
        eprintln!("Usage: gmlvm disassemble <input>");
        return Err(1);
    }

    let blocks = load_blocks(&args[0])?;
    print!("{}", gml_assembler::disassemble(&blocks));
    Ok(())
}

/// Verify an image or source file.
pub fn verify(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: verify requires an input file");
        eprintln!("Usage: gmlvm verify <input>");
        return Err(1);
    }

    let input = &args[0];
    let blocks = load_blocks(input)?;
    verify_blocks(&blocks)?;

    println!("OK: {input} ({} blocks)", blocks.len());
    Ok(())
}

/// Verify, then execute the entry function of an image or source file.
///
/// Verification rejects images with duplicate block names even though the
/// VM itself would keep the last one.
pub fn run(args: &[String]) -> Result<(), i32> {
    if args.is_empty() {
        eprintln!("error: run requires an input file");
        eprintln!("Usage: gmlvm run <input> [--entry NAME] [--budget N] ...");
        eprintln!("The input is verified first; block names must be unique.");
        return Err(1);
    }

    let input = &args[0];
    let options = RunOptions::parse(&args[1..])?;
    let blocks = load_blocks(input)?;

    verify_blocks(&blocks)?;

    let mut vm = Vm::with_config(options.config);
    vm.load_code_blocks(blocks);
    let execution = vm.run_function(&options.entry);

    if options.show_globals {
        let mut globals: Vec<_> = vm.globals().iter().collect();
        globals.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in globals {
            println!("{name} = {value}");
        }
    }

    match execution.completion {
        Completion::Returned | Completion::FellThrough => {
            println!("{}", execution.value);
            Ok(())
        }
        Completion::Exited => {
            println!("{}", execution.value);
            eprintln!("exit requested");
            Ok(())
        }
        Completion::Faulted(fault) => {
            eprintln!("runtime error: {fault}");
            Err(3)
        }
        Completion::NotFound => {
            eprintln!("error: no function named '{}'", options.entry);
            Err(1)
        }
    }
}

// --- Helpers ---

struct RunOptions {
    entry: String,
    config: VmConfig,
    show_globals: bool,
}

impl RunOptions {
    fn parse(args: &[String]) -> Result<Self, i32> {
        let mut options = RunOptions {
            entry: "main".to_string(),
            config: VmConfig::default(),
            show_globals: false,
        };

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--entry" => options.entry = flag_value(&mut iter, "--entry")?.to_string(),
                "--debug" => options.config.debug_output = true,
                "--max-depth" => {
                    options.config.max_call_depth = parse_count(&mut iter, "--max-depth")?;
                }
                "--budget" => {
                    options.config.instruction_budget = Some(parse_count(&mut iter, "--budget")?);
                }
                "--push-call-results" => options.config.call_results = CallResultPolicy::Push,
                "--globals" => options.show_globals = true,
                other => {
                    eprintln!("error: unknown option '{other}'");
                    return Err(1);
                }
            }
        }

        Ok(options)
    }
}

fn flag_value<'a>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<&'a str, i32> {
    iter.next().map(String::as_str).ok_or_else(|| {
        eprintln!("error: {flag} requires a value");
        1
    })
}

fn parse_count<'a, T: std::str::FromStr>(
    iter: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<T, i32> {
    let value = flag_value(iter, flag)?;
    value.parse().map_err(|_| {
        eprintln!("error: {flag} expects a non-negative integer, got '{value}'");
        1
    })
}

/// Read a binary image (starts with the `GMBC` magic) or assembly text.
fn load_blocks(path: &str) -> Result<Vec<CodeBlock>, i32> {
    let bytes = fs::read(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    if bytes.starts_with(&MAGIC) {
        return decode_blocks(&bytes).map_err(|e| {
            eprintln!("error: invalid binary: {e}");
            1
        });
    }

    let text = String::from_utf8(bytes).map_err(|_| {
        eprintln!("error: '{path}' is neither a GMBC image nor UTF-8 assembly text");
        1
    })?;
    gml_assembler::assemble(&text).map_err(|e| {
        eprintln!("error: {e}");
        1
    })
}

fn verify_blocks(blocks: &[CodeBlock]) -> Result<(), i32> {
    gml_verifier::verify(blocks).map_err(|errors| {
        for e in &errors {
            eprintln!("error: {e}");
        }
        2
    })
}
