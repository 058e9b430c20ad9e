// The mmunify CLI.
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mmunify::config::DjVarsSoftErrors;
use mmunify::session::Session;
use mmunify::worksheet::step::Step;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(
    name = "mmunify",
    about = "Unifies the steps of a Metamath proof worksheet",
    version = env!("CARGO_PKG_VERSION")
)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Unify every step of a session and build the proof
    Unify {
        /// The session file, in JSON
        #[clap(value_name = "SESSION")]
        session: PathBuf,

        /// Leave work variables in the proof instead of converting them
        #[clap(long, help = "Leave work variables in the proof instead of converting them.")]
        no_convert_work_vars: bool,

        /// Skip verifying the built proofs
        #[clap(long, help = "Skip verifying the built proofs.")]
        no_recheck: bool,

        /// Overrides the session's handling of missing distinct variable restrictions
        #[clap(
            long,
            help = "One of ignore, report, generate_replacements, generate_differences, \
                    generate_new.",
            value_name = "MODE"
        )]
        dj_vars_soft_errors: Option<DjVarsSoftErrors>,
    },
}

fn main() {
    // Use RUST_LOG env var to control log levels, e.g.:
    //   RUST_LOG=mmunify::unify=debug mmunify unify session.json
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).without_time())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Unify {
            session,
            no_convert_work_vars,
            no_recheck,
            dj_vars_soft_errors,
        } => {
            let mut session = match Session::load(&session) {
                Ok(s) => s,
                Err(e) => {
                    println!("Error loading session: {}", e);
                    std::process::exit(1);
                }
            };
            if no_convert_work_vars {
                session.config.convert_work_vars = false;
            }
            if no_recheck {
                session.config.recheck_proofs = false;
            }
            if let Some(mode) = dj_vars_soft_errors {
                session.config.dj_vars_soft_errors = mode;
            }

            let outcome = match session.unify() {
                Ok(outcome) => outcome,
                Err(e) => {
                    println!("{}", e);
                    std::process::exit(1);
                }
            };

            for diagnostic in &outcome.diagnostics {
                println!("{}", diagnostic);
            }
            let ws = &session.worksheet;
            for id in ws.order() {
                let Step::Derivation(d) = ws.step(*id) else {
                    continue;
                };
                let formula = match &d.formula {
                    Some(f) => f.display(&session.symbols).to_string(),
                    None => "?".to_string(),
                };
                let reference = match d.reference {
                    Some(a) => session.catalog.get(a).label.as_str(),
                    None => "?",
                };
                println!("{} {} {:?} {}", d.label, reference, d.status, formula);
            }
            for pair in &outcome.dj_vars_to_declare {
                println!(
                    "$d {} {} $.",
                    session.symbols.var(pair.0).name,
                    session.symbols.var(pair.1).name
                );
            }
            match &outcome.qed_rpn {
                Some(rpn) => println!("proof: {}", rpn.join(" ")),
                None => println!("no proof"),
            }
        }
    }
}
