use std::fs;
use std::process;

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;

use vibelang::ast::{Decl, Program};
use vibelang::config::{Options, VerificationLevel};
use vibelang::pipeline;
use vibelang::verifier::VerificationStatus;

#[derive(ClapParser)]
#[command(name = "vibelang", about = "The VibeLang compiler toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lex a .vbl file and print the token stream
    Lex { file: String },
    /// Parse a .vbl file and print an AST summary
    Parse { file: String },
    /// Type-check a .vbl file
    Check { file: String },
    /// Verify contracts in a .vbl file
    Verify {
        file: String,
        /// Verification level: none, runtime, hybrid or full
        #[arg(long, default_value = "hybrid")]
        level: VerificationLevel,
        /// Oracle budget per query, in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
    },
    /// Optimize a .vbl file and print the result
    Optimize { file: String },
    /// Format a .vbl file canonically
    Fmt {
        file: String,
        /// Write the result back to the source file
        #[arg(short, long)]
        write: bool,
        /// Spaces per indentation level
        #[arg(long, default_value_t = 2)]
        indent_width: usize,
    },
    /// Compile a .vbl file to the target language
    Compile {
        file: String,
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Verification level: none, runtime, hybrid or full
        #[arg(long, default_value = "hybrid")]
        level: VerificationLevel,
        /// Oracle budget per query, in milliseconds
        #[arg(long, default_value_t = 1000)]
        timeout_ms: u64,
    },
}

fn read_file(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", format!("Cannot open file '{}': {}", path, e).red());
            process::exit(1);
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let code = match &cli.command {
        Commands::Lex { file } => cmd_lex(file),
        Commands::Parse { file } => cmd_parse(file),
        Commands::Check { file } => cmd_check(file),
        Commands::Verify {
            file,
            level,
            timeout_ms,
        } => cmd_verify(file, *level, *timeout_ms),
        Commands::Optimize { file } => cmd_optimize(file),
        Commands::Fmt {
            file,
            write,
            indent_width,
        } => cmd_fmt(file, *write, *indent_width),
        Commands::Compile {
            file,
            output,
            level,
            timeout_ms,
        } => cmd_compile(file, output.as_deref(), *level, *timeout_ms),
    };
    process::exit(code);
}

fn cmd_lex(file: &str) -> i32 {
    let source = read_file(file);
    match pipeline::lex_source(&source) {
        Ok(tokens) => {
            for tok in &tokens {
                println!(
                    "{}:{}  {:<12} {:?}",
                    tok.line,
                    tok.col,
                    tok.kind.name(),
                    tok.lexeme
                );
            }
            0
        }
        Err(d) => {
            eprintln!("{}", d.render().red());
            1
        }
    }
}

fn cmd_parse(file: &str) -> i32 {
    let source = read_file(file);
    match pipeline::parse_program(&source) {
        Ok(program) => {
            print_summary(&program);
            0
        }
        Err(d) => {
            eprintln!("{}", d.render().red());
            1
        }
    }
}

fn print_summary(program: &Program) {
    println!("Imports: {}", program.imports.len());
    for imp in &program.imports {
        println!("  - {}", imp.module_path);
    }

    println!("Declarations: {}", program.declarations.len());
    for decl in &program.declarations {
        match decl {
            Decl::Type(td) => {
                println!("  type {} ({} invariants)", td.name, td.invariants.len());
            }
            Decl::Function(fd) => {
                let params: Vec<&str> = fd.params.iter().map(|p| p.name.as_str()).collect();
                println!("  define {}({})", fd.name, params.join(", "));
                println!("    preconditions: {}", fd.preconditions.len());
                println!("    postconditions: {}", fd.postconditions.len());
            }
        }
    }
}

fn cmd_check(file: &str) -> i32 {
    let source = read_file(file);
    match pipeline::check_source(&source) {
        Ok(diags) => {
            if diags.is_empty() {
                println!("Type check passed.");
                0
            } else {
                for d in &diags {
                    eprintln!("{} {}", "Error:".red(), d.render());
                }
                eprintln!("\n{} type error(s) found.", diags.len());
                1
            }
        }
        Err(d) => {
            eprintln!("{}", d.render().red());
            1
        }
    }
}

fn cmd_verify(file: &str, level: VerificationLevel, timeout_ms: u64) -> i32 {
    let source = read_file(file);
    let opts = Options {
        verification_level: level,
        verification_timeout_ms: timeout_ms,
        ..Options::default()
    };

    match pipeline::verify_source(&source, &opts) {
        Ok(outcome) => {
            for r in &outcome.results {
                let icon = match r.status {
                    VerificationStatus::Proven => "✓".green(),
                    VerificationStatus::Refuted => "✗".red(),
                    VerificationStatus::Unknown => "?".yellow(),
                };
                println!("  [{}] {} at {}:{} - {}", icon, r.owner, r.line, r.col, r.message);
            }

            let proven = outcome.count(VerificationStatus::Proven);
            let unknown = outcome.count(VerificationStatus::Unknown);
            let refuted = outcome.count(VerificationStatus::Refuted);
            println!(
                "\nVerification: {} proven, {} unknown, {} refuted ({} runtime checks planned)",
                proven,
                unknown,
                refuted,
                outcome.plan.residual_count()
            );

            if outcome.errors.is_empty() {
                0
            } else {
                for e in &outcome.errors {
                    eprintln!("{} {}:{}: {}", "Error:".red(), e.line, e.col, e.message);
                }
                1
            }
        }
        Err(d) => {
            eprintln!("{}", d.render().red());
            1
        }
    }
}

fn cmd_optimize(file: &str) -> i32 {
    let source = read_file(file);
    match pipeline::optimize_source(&source, 2) {
        Ok((text, rewrites)) => {
            print!("{}", text);
            eprintln!("# {} rewrite(s) applied", rewrites);
            0
        }
        Err(d) => {
            eprintln!("{}", d.render().red());
            1
        }
    }
}

fn cmd_fmt(file: &str, write: bool, indent_width: usize) -> i32 {
    let source = read_file(file);
    match pipeline::format_source(&source, indent_width) {
        Ok(text) => {
            if write {
                if let Err(e) = fs::write(file, &text) {
                    eprintln!("{}", format!("Cannot write '{}': {}", file, e).red());
                    return 1;
                }
                println!("Formatted {}", file);
            } else {
                print!("{}", text);
            }
            0
        }
        Err(d) => {
            eprintln!("{}", d.render().red());
            1
        }
    }
}

fn cmd_compile(
    file: &str,
    output: Option<&str>,
    level: VerificationLevel,
    timeout_ms: u64,
) -> i32 {
    let source = read_file(file);
    let opts = Options {
        verification_level: level,
        verification_timeout_ms: timeout_ms,
        ..Options::default()
    };

    let out = pipeline::compile(&source, &opts);

    for d in &out.diagnostics {
        eprintln!("{} {}", "Error:".red(), d.render());
    }

    if !out.succeeded() {
        return 1;
    }

    match out.emitted {
        Some(text) => {
            if let Some(path) = output {
                if let Err(e) = fs::write(path, &text) {
                    eprintln!("{}", format!("Cannot write '{}': {}", path, e).red());
                    return 1;
                }
                println!("Compiled to {}", path);
            } else {
                print!("{}", text);
            }
            0
        }
        None => 1,
    }
}
