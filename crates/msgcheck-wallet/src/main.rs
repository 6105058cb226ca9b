//! msgcheck-wallet
//!
//! Builds an outgoing message, runs the node's pre-flight checks against it,
//! helps the operator fix a fee cap that is too low, and submits it via
//! JSON-RPC.
//!
//! Usage:
//!   msgcheck-wallet check --from <addr> --to <addr> --value <fil> [--rpc <url>]
//!   msgcheck-wallet send  --from <addr> --to <addr> --value <fil> [--fee-cap <atto>] [--rpc <url>]

use std::io::{self, IsTerminal, Write};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;

use msgcheck_core::{all_ok, candidate_id, AmountError, FeeUnit, MessagePrototype, TokenAmount};
use msgcheck_resolver::{write_failures, Resolver, ResolverConfig};

mod logging;
mod rpc_client;
mod tui;

use rpc_client::{NodeChecks, WalletRpcClient};
use tui::{EditorConfig, TerminalFeeEditor};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "msgcheck-wallet",
    version,
    about = "Check, fix and submit Filecoin messages"
)]
struct Args {
    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:1234/rpc/v0")]
    rpc: String,

    /// Bearer token for the node API.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Unit the fee editor works in (fil or attofil).
    #[arg(long, global = true, default_value_t = FeeUnit::Fil)]
    fee_unit: FeeUnit,

    /// Whether to prompt. Defaults to true when stdin is a terminal.
    #[arg(long, global = true)]
    interactive: Option<bool>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pre-flight checks and print any failures.
    Check(MessageArgs),

    /// Check the message, offer fixes, then submit it.
    Send(MessageArgs),
}

#[derive(clap::Args, Debug)]
struct MessageArgs {
    /// Sender address.
    #[arg(long)]
    from: String,
    /// Recipient address.
    #[arg(long)]
    to: String,
    /// Amount to send in FIL.
    #[arg(long, value_parser = parse_fil)]
    value: TokenAmount,
    #[arg(long, default_value_t = 10_000_000)]
    gas_limit: i64,
    /// Fee cap per gas unit in attoFIL.
    #[arg(long, value_parser = parse_atto, default_value = "100000")]
    fee_cap: TokenAmount,
    /// Gas premium per gas unit in attoFIL.
    #[arg(long, value_parser = parse_atto, default_value = "100000")]
    premium: TokenAmount,
    #[arg(long, default_value_t = 0)]
    nonce: u64,
    #[arg(long, default_value_t = 0)]
    method: u64,
    /// Method parameters, hex-encoded.
    #[arg(long)]
    params_hex: Option<String>,
}

fn parse_fil(s: &str) -> Result<TokenAmount, AmountError> {
    TokenAmount::parse_decimal(s, FeeUnit::Fil)
}

fn parse_atto(s: &str) -> Result<TokenAmount, AmountError> {
    TokenAmount::parse_decimal(s, FeeUnit::AttoFil)
}

impl MessageArgs {
    fn into_prototype(self) -> anyhow::Result<MessagePrototype> {
        let params = match self.params_hex {
            Some(h) => hex::decode(h.trim_start_matches("0x")).context("--params-hex is not valid hex")?,
            None => Vec::new(),
        };
        Ok(MessagePrototype {
            version: 0,
            to: self.to,
            from: self.from,
            nonce: self.nonce,
            value: self.value,
            gas_limit: self.gas_limit,
            gas_fee_cap: self.fee_cap,
            gas_premium: self.premium,
            method: self.method,
            params,
        })
    }
}

impl Args {
    fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            unit: self.fee_unit,
            ..Default::default()
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    logging::init();

    let args = Args::parse();
    let interactive = args.interactive.unwrap_or_else(|| io::stdin().is_terminal());
    let client = WalletRpcClient::new(&args.rpc, args.token.clone());
    let editor = args.editor_config();
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("starting async runtime")?;

    match args.command {
        Command::Check(msg) => cmd_check(&rt, &client, msg.into_prototype()?),
        Command::Send(msg) => cmd_send(&rt, &client, msg.into_prototype()?, interactive, editor),
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn cmd_check(rt: &tokio::runtime::Runtime, client: &WalletRpcClient, proto: MessagePrototype) -> anyhow::Result<()> {
    let checks = rt.block_on(client.check_messages(&proto))?;
    let cid = candidate_id(&checks);
    info!(cid = ?cid, batches = checks.len(), "ran message checks");

    if all_ok(&checks) {
        match cid {
            Some(cid) => println!("All checks passed for {}", cid),
            None => println!("All checks passed"),
        }
        return Ok(());
    }

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "Following checks have failed:")?;
    write_failures(&mut stdout, &checks, cid)?;
    bail!("message checks failed");
}

fn cmd_send(
    rt: &tokio::runtime::Runtime,
    client: &WalletRpcClient,
    mut proto: MessagePrototype,
    interactive: bool,
    editor: EditorConfig,
) -> anyhow::Result<()> {
    let outcome = {
        let mut resolver = Resolver::new(
            NodeChecks::new(rt, client),
            TerminalFeeEditor::new(editor),
            io::stdin().lock(),
            io::stdout(),
            ResolverConfig { interactive },
        );
        resolver.resolve(&mut proto)
    };

    if let Err(err) = outcome {
        if err.is_user_abort() {
            eprintln!("{err}");
            std::process::exit(1);
        }
        return Err(err).context("resolving message checks");
    }

    let id = rt.block_on(client.push_message(&proto))?;
    info!(%id, fee_cap = %proto.gas_fee_cap.atto(), "message submitted");
    println!("{}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_prototype_from_flags() {
        let args = Args::parse_from([
            "msgcheck-wallet",
            "--fee-unit",
            "attofil",
            "send",
            "--from",
            "f01001",
            "--to",
            "f01000",
            "--value",
            "1.5",
            "--fee-cap",
            "250",
            "--params-hex",
            "0x0a0b",
        ]);
        assert_eq!(args.fee_unit, FeeUnit::AttoFil);
        assert_eq!(args.interactive, None);
        let editor = args.editor_config();
        assert_eq!(editor.unit, FeeUnit::AttoFil);
        assert_eq!(editor.tick, EditorConfig::default().tick);
        let Command::Send(msg) = args.command else {
            panic!("expected send");
        };
        let proto = msg.into_prototype().unwrap();
        assert_eq!(proto.value, TokenAmount::from(1_500_000_000_000_000_000));
        assert_eq!(proto.gas_fee_cap, TokenAmount::from(250));
        assert_eq!(proto.gas_premium, TokenAmount::from(100_000));
        assert_eq!(proto.gas_limit, 10_000_000);
        assert_eq!(proto.params, vec![0x0a, 0x0b]);
    }

    #[test]
    fn rejects_bad_amounts() {
        let res = Args::try_parse_from([
            "msgcheck-wallet", "check", "--from", "a", "--to", "b", "--value", "1.2.3",
        ]);
        assert!(res.is_err());
    }
}
