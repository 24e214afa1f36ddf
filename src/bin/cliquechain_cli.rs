// cliquechain-cli — direct-invocation command line interface.
//
// There is no daemon or RPC layer (P2P/node startup are out of scope), so
// unlike the teacher's split client/daemon pair this binary opens the store
// itself for every invocation. Styled after `knotcoin_cli.rs`'s banner and
// command-table usage screen.

use std::env;
use std::process::ExitCode;

use colored::*;

use cliquechain::accept::Acceptor;
use cliquechain::chain::Chain;
use cliquechain::config::NodeConfig;
use cliquechain::genesis::create_genesis_block;
use cliquechain::mempool::Mempool;
use cliquechain::miner::{BlockContent, Miner};
use cliquechain::problem::ProblemGraph;
use cliquechain::store::ChainStore;
use cliquechain::target::{target_to_difficulty, target_to_hex};
use cliquechain::{Block, Transaction};

const DEFAULT_MAX_NONCE: i64 = 50_000_000;

fn print_usage() {
    println!("{}", " ██████╗██╗     ██╗ ██████╗ ██╗   ██╗███████╗".bright_cyan());
    println!("{}", "██╔════╝██║     ██║██╔═══██╗██║   ██║██╔════╝".bright_cyan().bold());
    println!("{}", "██║     ██║     ██║██║   ██║██║   ██║█████╗  ".blue().bold());
    println!("{}", "██║     ██║     ██║██║▄▄ ██║██║   ██║██╔══╝  ".blue());
    println!("{}", "╚██████╗███████╗██║╚██████╔╝╚██████╔╝███████╗".bright_blue());
    println!("{}", " ╚═════╝╚══════╝╚═╝ ╚══▀▀═╝  ╚═════╝ ╚══════╝".bright_blue());
    println!(
        "{}",
        "                - CHAIN CLI -                 ".bright_yellow().on_blue().bold()
    );
    println!();
    println!("{}", "  Usage: cliquechain-cli <command> [args...]".bright_yellow().bold());
    println!();
    println!("{}", "  Commands:".bright_white().bold());
    let rows: &[(&str, &str)] = &[
        ("init", "Create a new chain and mine its genesis block"),
        ("tip", "Show the current chain tip"),
        ("height <h>", "Show the block at height <h>"),
        ("difficulty", "Show the current normal/reduced targets"),
        ("mine <n>", "Mine <n> plain blocks"),
        ("publish-problem <n> <edges> <seed>", "Mine a block publishing a new problem graph"),
        ("solve <graph-hash-hex> <v1,v2,...>", "Mine a block submitting a clique solution"),
        ("solutions <graph-hash-hex>", "List known solutions for a problem graph"),
        ("send <payload>", "Queue an opaque transaction in the mempool"),
    ];
    for (cmd, desc) in rows {
        println!("  {} {:<38} {}", "❯".bright_black(), cmd.bright_green(), desc.white());
    }
}

fn open_chain() -> cliquechain::Result<Chain> {
    let cfg = NodeConfig::from_env();
    std::fs::create_dir_all(&cfg.data_dir).ok();
    let store = ChainStore::open(&cfg.chain_store_path())?;
    Ok(Chain::new(store))
}

fn now_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn print_block(block: &Block) {
    println!("{}", format!("==== block {} ====", block.height).bright_green());
    println!("hash:       {}", hex::encode(block.hash));
    println!("prev:       {}", hex::encode(block.prev_block_hash));
    println!("target:     {}", target_to_hex(block.target));
    println!("difficulty: {}", target_to_difficulty(block.target));
    println!("nonce:      {}", block.nonce);
    println!("timestamp:  {}", block.timestamp);
    println!("tx count:   {}", block.transactions.len());
    if let Some(pg_hash) = block.problem_graph_hash {
        println!("pg hash:    {}", hex::encode(pg_hash));
    }
    if let Some(sh) = block.solution_hash {
        println!("sol hash:   {}", hex::encode(sh));
        println!("solution:   {:?}", block.solution);
    }
}

fn run() -> cliquechain::Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "init" => {
            let chain = open_chain()?;
            if chain.tip()?.is_some() {
                println!("{}", "chain already initialized".yellow());
                return Ok(());
            }
            let genesis = create_genesis_block(Transaction(b"cliquechain genesis".to_vec()), DEFAULT_MAX_NONCE)?;
            Acceptor::new(&chain).add_block(genesis.clone())?;
            println!("{}", "genesis mined".bright_green());
            print_block(&genesis);
        }
        "tip" => {
            let chain = open_chain()?;
            match chain.tip()? {
                Some(block) => print_block(&block),
                None => println!("{}", "chain is empty — run `init` first".red()),
            }
        }
        "height" => {
            let chain = open_chain()?;
            let height: u64 = args.get(2).and_then(|s| s.parse().ok()).ok_or(
                cliquechain::ChainError::Invalid("usage: height <h>"),
            )?;
            match chain.get_by_height(height)? {
                Some(block) => print_block(&block),
                None => println!("{}", format!("no block at height {height}").red()),
            }
        }
        "difficulty" => {
            let chain = open_chain()?;
            let tip_height = chain.tip()?.map(|b| b.height + 1).unwrap_or(0);
            let retargeter = cliquechain::retarget::Retargeter::new(&chain);
            let (normal, reduced) = retargeter.targets_for_height(tip_height)?;
            println!("normal target:   {} (difficulty {})", target_to_hex(normal), target_to_difficulty(normal));
            println!("reduced target:  {} (difficulty {})", target_to_hex(reduced), target_to_difficulty(reduced));
        }
        "mine" => {
            let chain = open_chain()?;
            let count: usize = args.get(2).and_then(|s| s.parse().ok()).ok_or(
                cliquechain::ChainError::Invalid("usage: mine <n>"),
            )?;
            let mut mempool = Mempool::new();
            let miner = Miner::new(&chain);
            let hashes = miner.generate_blocks(&mut mempool, count, now_timestamp(), DEFAULT_MAX_NONCE)?;
            for h in hashes {
                println!("mined {}", hex::encode(h));
            }
        }
        "publish-problem" => {
            let n: usize = args.get(2).and_then(|s| s.parse().ok()).ok_or(
                cliquechain::ChainError::Invalid("usage: publish-problem <n> <edges> <seed>"),
            )?;
            let edges: usize = args.get(3).and_then(|s| s.parse().ok()).ok_or(
                cliquechain::ChainError::Invalid("usage: publish-problem <n> <edges> <seed>"),
            )?;
            let seed: u64 = args.get(4).and_then(|s| s.parse().ok()).ok_or(
                cliquechain::ChainError::Invalid("usage: publish-problem <n> <edges> <seed>"),
            )?;
            let chain = open_chain()?;
            let graph = ProblemGraph::new(n, edges, seed)?;
            println!("problem graph hash: {}", hex::encode(graph.hash()));
            let mut mempool = Mempool::new();
            let miner = Miner::new(&chain);
            let block = miner.mine_block(&mut mempool, BlockContent::PublishProblem(graph), now_timestamp(), DEFAULT_MAX_NONCE)?;
            Acceptor::new(&chain).add_block(block.clone())?;
            print_block(&block);
        }
        "solve" => {
            let hash_hex = args.get(2).ok_or(cliquechain::ChainError::Invalid(
                "usage: solve <graph-hash-hex> <v1,v2,...>",
            ))?;
            let solution_arg = args.get(3).ok_or(cliquechain::ChainError::Invalid(
                "usage: solve <graph-hash-hex> <v1,v2,...>",
            ))?;
            let mut graph_hash = [0u8; 32];
            hex::decode_to_slice(hash_hex, &mut graph_hash)
                .map_err(|_| cliquechain::ChainError::Invalid("malformed graph hash"))?;
            let solution: Vec<usize> = solution_arg
                .split(',')
                .map(|v| v.parse::<usize>())
                .collect::<Result<_, _>>()
                .map_err(|_| cliquechain::ChainError::Invalid("malformed solution list"))?;

            let chain = open_chain()?;
            let mut mempool = Mempool::new();
            let miner = Miner::new(&chain);
            let content = BlockContent::SubmitSolution { graph_hash, solution };
            let block = miner.mine_block(&mut mempool, content, now_timestamp(), DEFAULT_MAX_NONCE)?;
            Acceptor::new(&chain).add_block(block.clone())?;
            print_block(&block);
        }
        "solutions" => {
            let hash_hex = args.get(2).ok_or(cliquechain::ChainError::Invalid("usage: solutions <graph-hash-hex>"))?;
            let mut graph_hash = [0u8; 32];
            hex::decode_to_slice(hash_hex, &mut graph_hash)
                .map_err(|_| cliquechain::ChainError::Invalid("malformed graph hash"))?;
            let chain = open_chain()?;
            let tip = chain.tip()?.ok_or(cliquechain::ChainError::NotFound("tip"))?;
            for (height, solution) in chain.all_solutions_for_graph(tip.hash, graph_hash)? {
                println!("height {height}: {solution:?}");
            }
        }
        "send" => {
            let payload = args.get(2).ok_or(cliquechain::ChainError::Invalid("usage: send <payload>"))?;
            let mut mempool = Mempool::new();
            let admitted = mempool.insert(Transaction(payload.as_bytes().to_vec()));
            println!("queued: {admitted}");
        }
        _ => {
            print_usage();
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", format!("error: {e}").red());
            ExitCode::FAILURE
        }
    }
}
