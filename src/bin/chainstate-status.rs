#![forbid(unsafe_code)]
//! Read-only viewer for the persisted synchronization state

use chainstate::config::load_config;
use chainstate::state::BlockchainState;
use chainstate::store::open_store;
use clap::Parser;
use colored::Colorize;

#[derive(Parser)]
#[command(name = "chainstate-status")]
#[command(about = "Show the wallet's current blockchain synchronization state")]
struct Args {
    /// Follow the live stream instead of a one-shot read
    #[arg(long)]
    watch: bool,
}

fn print_state(state: &Option<BlockchainState>) {
    let state = match state {
        Some(s) => s,
        None => {
            println!("{}", "No sync state recorded yet".yellow());
            return;
        }
    };

    let status = if state.is_synced() {
        "synced".green()
    } else if state.is_impeded() {
        "impeded".red()
    } else if state.replaying {
        "replaying".yellow()
    } else {
        "syncing".cyan()
    };

    println!("Status:           {}", status);
    println!("Progress:         {}%", state.percentage_sync);
    println!(
        "Best block:       {} ({})",
        state.best_chain_height, state.best_chain_date
    );
    println!("Chainlock height: {}", state.chainlock_height);
    println!("MN list height:   {}", state.mnlist_height);
    if state.is_impeded() {
        let list: Vec<String> = state.impediments.iter().map(|i| i.to_string()).collect();
        println!("Impediments:      {}", list.join(", ").red());
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = load_config()?;
    let store = open_store(&config);

    if args.watch {
        let mut rx = store.subscribe();
        print_state(&rx.borrow().clone());
        loop {
            rx.changed().await?;
            println!("----------------------------------------");
            print_state(&rx.borrow().clone());
        }
    } else {
        print_state(&store.load_sync()?);
    }

    Ok(())
}
