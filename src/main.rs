//! Foxtail launcher: build a node from a descriptor file, run it until
//! interrupted, and report per-subsystem status on the way down.

use anyhow::{bail, Context, Result};
use clap::Parser;
use foxtail_logger::info;
use foxtail_node::{Node, NodeOptions};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "foxtail", version, about = "Function-block runtime control engine")]
struct Args {
    /// Path to the JSON node descriptor.
    descriptor: PathBuf,

    /// Maximum number of point ids.
    #[arg(long, default_value_t = 1024)]
    max_points: usize,

    /// Card-stateful arena budget in bytes.
    #[arg(long, default_value_t = 64 * 1024)]
    card_stateful_bytes: usize,

    /// HA-stateful arena budget in bytes.
    #[arg(long, default_value_t = 64 * 1024)]
    ha_stateful_bytes: usize,

    /// Chassis server tick period in microseconds.
    #[arg(long, default_value_t = 1000)]
    tick_usec: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let descriptor = std::fs::read_to_string(&args.descriptor)
        .with_context(|| format!("reading {}", args.descriptor.display()))?;

    let node = Node::create_from_json(
        &descriptor,
        NodeOptions {
            max_points: args.max_points,
            card_stateful_bytes: args.card_stateful_bytes,
            ha_stateful_bytes: args.ha_stateful_bytes,
            tick_duration: Duration::from_micros(args.tick_usec),
        },
    )
    .map_err(|e| anyhow::anyhow!("node build failed: {} ({})", e, e.tag()))?;

    if !node.start(0) {
        print_status(&node);
        bail!("node failed to start");
    }
    info!("node '{}' started", node.name());

    let (stop_tx, stop_rx) = foxtail_channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })
    .context("installing the Ctrl-C handler")?;
    let _ = stop_rx.recv();

    info!("stopping node '{}'", node.name());
    node.stop();
    print_status(&node);
    Ok(())
}

fn status_of(error: Option<foxtail_error::Error>) -> String {
    match error {
        None => "ok".to_string(),
        Some(e) => e.tag(),
    }
}

fn print_status(node: &Node) {
    println!("node '{}': {}", node.name(), status_of(node.error_code()));
    for chassis_idx in 0..node.chassis_count() {
        let chassis = match node.chassis(chassis_idx) {
            Some(c) => c,
            None => continue,
        };
        println!(
            "  chassis '{}' (fer {}us): {}",
            chassis.name(),
            chassis.fer(),
            status_of(chassis.error_code())
        );
        for s in 0..chassis.scanner_count() {
            let scanner = match chassis.scanner(s) {
                Some(s) => s,
                None => continue,
            };
            println!(
                "    scanner '{}' (srm {}): {}",
                scanner.name(),
                scanner.scan_rate_multiplier(),
                status_of(scanner.error_code())
            );
            for c in 0..scanner.card_count() {
                if let Some(card) = scanner.card(c) {
                    println!(
                        "      card '{}' slot {} ({}): {}",
                        card.name(),
                        card.slot_number(),
                        card.type_name(),
                        status_of(card.error_code())
                    );
                }
            }
        }
        for x in 0..chassis.execution_set_count() {
            let set = match chassis.execution_set(x) {
                Some(x) => x,
                None => continue,
            };
            println!(
                "    execution set '{}' (erm {}): {}",
                set.name(),
                set.execution_rate_multiplier(),
                status_of(set.error_code())
            );
            for ch in 0..set.chain_count() {
                if let Some(chain) = set.chain(ch) {
                    println!(
                        "      logic chain '{}': {}",
                        chain.name(),
                        status_of(chain.error_code())
                    );
                    for component in chain.components() {
                        println!(
                            "        component '{}' ({}): {}",
                            component.name(),
                            component.type_name(),
                            status_of(component.error_code())
                        );
                    }
                }
            }
        }
    }
}
