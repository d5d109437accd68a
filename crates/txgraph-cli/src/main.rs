//! Transaction flow graph CLI.
//!
//! Provides the `txgraph` binary for working with flow graphs exported by
//! the visual transaction builder (JSON `{ "nodes": [...], "edges": [...] }`):
//!
//! - `order` prints the execution order
//! - `plan` prints the execution order and the lowered operations
//! - `codegen` renders the transaction as a TypeScript module
//! - `build` prints the unsigned transaction built from the plan
//!
//! Results go to stdout; logs and errors go to stderr.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use txgraph_codegen::{BuildOptions, CodegenError, Network};
use txgraph_core::FlowGraph;
use txgraph_plan::{Amount, ExecutionPlan, ExecutionPlanner, PlanError, TransactionProps};

/// Fee used when neither `--fee` nor `TXGRAPH_FEE` is given.
const DEFAULT_FEE: u128 = 2000;

/// Plan and build transactions from flow graphs.
#[derive(Parser)]
#[command(name = "txgraph", about = "Plan and build transactions from flow graphs")]
struct Cli {
    /// Log planner progress at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Print the execution order of a graph.
    Order {
        /// Path to the graph JSON file.
        #[arg(short, long)]
        graph: PathBuf,
    },

    /// Print the execution plan (order and lowered operations).
    Plan {
        /// Path to the graph JSON file.
        #[arg(short, long)]
        graph: PathBuf,

        #[command(flatten)]
        tx: TxArgs,
    },

    /// Render the transaction as a TypeScript module.
    Codegen {
        /// Path to the graph JSON file.
        #[arg(short, long)]
        graph: PathBuf,

        #[command(flatten)]
        tx: TxArgs,

        /// Write the module here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the unsigned transaction built from the plan.
    Build {
        /// Path to the graph JSON file.
        #[arg(short, long)]
        graph: PathBuf,

        #[command(flatten)]
        tx: TxArgs,

        /// Target network (default: $TXGRAPH_NETWORK, else LocalNet).
        #[arg(short, long)]
        network: Option<String>,

        /// Mark the transaction as a dry run.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Transaction properties shared by the planning subcommands.
#[derive(Args)]
struct TxArgs {
    /// Account component paying the fee (default: $TXGRAPH_ACCOUNT).
    #[arg(short, long)]
    account: Option<String>,

    /// Fee amount (default: $TXGRAPH_FEE, else 2000).
    #[arg(short, long)]
    fee: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Order { graph } => run_order(&graph),
        Commands::Plan { graph, tx } => run_plan(&graph, tx),
        Commands::Codegen { graph, tx, output } => run_codegen(&graph, tx, output),
        Commands::Build {
            graph,
            tx,
            network,
            dry_run,
        } => run_build(&graph, tx, network, dry_run),
    };
    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------
//
// Exit codes: 0 = success, 1 = planning error, 2 = codegen error,
// 3 = I/O, parse or configuration error.

fn run_order(path: &Path) -> i32 {
    let graph = match load_graph(path) {
        Ok(g) => g,
        Err(code) => return code,
    };
    match ExecutionPlanner::new(&graph).execution_order() {
        Ok(order) => print_json(&order),
        Err(e) => report_plan_error(&e, &graph),
    }
}

fn run_plan(path: &Path, tx: TxArgs) -> i32 {
    match plan_graph(path, tx) {
        Ok(plan) => print_json(&plan),
        Err(code) => code,
    }
}

fn run_codegen(path: &Path, tx: TxArgs, output: Option<PathBuf>) -> i32 {
    let plan = match plan_graph(path, tx) {
        Ok(plan) => plan,
        Err(code) => return code,
    };
    let module = match txgraph_codegen::render_typescript(&plan.details) {
        Ok(module) => module,
        Err(e) => return report_codegen_error(&e),
    };
    match output {
        Some(out) => match std::fs::write(&out, module) {
            Ok(()) => {
                tracing::info!("wrote {}", out.display());
                0
            }
            Err(e) => {
                eprintln!("Error: failed to write '{}': {}", out.display(), e);
                3
            }
        },
        None => {
            print!("{}", module);
            0
        }
    }
}

fn run_build(path: &Path, tx: TxArgs, network: Option<String>, dry_run: bool) -> i32 {
    let network = match resolve_network(network) {
        Ok(n) => n,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return 3;
        }
    };
    let plan = match plan_graph(path, tx) {
        Ok(plan) => plan,
        Err(code) => return code,
    };
    let options = BuildOptions { network, dry_run };
    match txgraph_codegen::build_transaction(&plan.details, &options) {
        Ok(transaction) => print_json(&transaction),
        Err(e) => report_codegen_error(&e),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_graph(path: &Path) -> Result<FlowGraph, i32> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        3
    })?;
    serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error: failed to parse graph '{}': {}", path.display(), e);
        3
    })
}

fn plan_graph(path: &Path, tx: TxArgs) -> Result<ExecutionPlan, i32> {
    let props = resolve_props(tx).map_err(|msg| {
        eprintln!("Error: {}", msg);
        3
    })?;
    let graph = load_graph(path)?;
    match txgraph_plan::plan(&graph, &props) {
        Ok(plan) => Ok(plan),
        Err(e) => Err(report_plan_error(&e, &graph)),
    }
}

/// Fills transaction properties from flags, then environment, then defaults.
fn resolve_props(tx: TxArgs) -> Result<TransactionProps, String> {
    let account = tx
        .account
        .or_else(|| std::env::var("TXGRAPH_ACCOUNT").ok())
        .ok_or_else(|| "no account given, pass --account or set TXGRAPH_ACCOUNT".to_string())?;
    let fee = match tx.fee.or_else(|| std::env::var("TXGRAPH_FEE").ok()) {
        Some(text) => text
            .parse::<Amount>()
            .map_err(|e| format!("invalid fee '{}': {}", text, e))?,
        None => Amount::of(DEFAULT_FEE),
    };
    Ok(TransactionProps { account, fee })
}

fn resolve_network(flag: Option<String>) -> Result<Network, String> {
    match flag.or_else(|| std::env::var("TXGRAPH_NETWORK").ok()) {
        Some(name) => name.parse(),
        None => Ok(Network::default()),
    }
}

fn report_plan_error(err: &PlanError, graph: &FlowGraph) -> i32 {
    eprintln!("Error: {}", err.user_message(graph));
    if let PlanError::MissingData { nodes } = err {
        for node in nodes {
            eprintln!("  - {}: {}", node.label, node.inputs.join(", "));
        }
    }
    1
}

fn report_codegen_error(err: &CodegenError) -> i32 {
    eprintln!("Codegen error: {}", err);
    2
}

/// Print a result as JSON to stdout for machine-readable output.
fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(e) => {
            eprintln!("Error: failed to serialize result: {}", e);
            3
        }
    }
}
