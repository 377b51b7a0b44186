//! ledger-runner: headless driver for the EMI ledger.
//!
//! Usage:
//!   ledger-runner --db ledger.db --accounts accounts.json
//!   ledger-runner --db ledger.db --ipc-mode
//!   ledger-runner --accounts accounts.json --stress 200 --account ACC100

use anyhow::{bail, Context, Result};
use emi_ledger_core::{
    LedgerClock, LedgerConfig, LedgerService, LedgerStore, NewAccount, PaymentRequest,
    SystemClock,
};
use rand::Rng;
use rust_decimal::Decimal;
use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

const STRESS_WORKERS: usize = 8;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let stress = parse_arg(&args, "--stress", 0usize);

    let mut config = match string_arg(&args, "--config") {
        Some(path) => LedgerConfig::load(path)?,
        None => LedgerConfig::default(),
    };
    if let Some(db) = string_arg(&args, "--db") {
        config.db_path = db.to_string();
    }

    if !ipc_mode {
        println!("EMI ledger: ledger-runner");
        println!("  db:        {}", config.db_path);
        println!("  retries:   {}", config.max_retries);
        println!();
    }

    let store = Arc::new(LedgerStore::open(&config)?);
    store.migrate()?;
    let clock: Arc<dyn LedgerClock> = Arc::new(SystemClock);

    if let Some(path) = string_arg(&args, "--accounts") {
        let seeded = seed_accounts(&store, clock.as_ref(), path)?;
        log::info!("seeded {seeded} accounts from {path}");
    }

    let service = LedgerService::new(store.clone(), clock, &config);

    if ipc_mode {
        run_ipc_loop(&service)?;
    } else if stress > 0 {
        let account = string_arg(&args, "--account").context("--stress requires --account")?;
        run_stress(&service, account, stress)?;
        print_summary(&service)?;
    } else {
        print_summary(&service)?;
    }

    store.close()?;
    Ok(())
}

fn seed_accounts(store: &LedgerStore, clock: &dyn LedgerClock, path: &str) -> Result<usize> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Cannot read {path}"))?;
    let accounts: Vec<NewAccount> =
        serde_json::from_str(&content).with_context(|| format!("Cannot parse {path}"))?;

    let mut seeded = 0;
    for account in &accounts {
        if store.account(&account.account_number)?.is_some() {
            log::warn!("account {} already provisioned, skipping", account.account_number);
            continue;
        }
        store.insert_account(account, clock.now())?;
        seeded += 1;
    }
    Ok(seeded)
}

/// One JSON request per stdin line, one JSON response per stdout line.
fn run_ipc_loop(service: &LedgerService) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if is_quit(&line) {
            break;
        }
        let response = service.handle_line(&line);
        writeln!(stdout, "{response}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn is_quit(line: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(line)
        .map(|v| v["type"] == "quit")
        .unwrap_or(false)
}

/// Fire `count` random payments at one account from several threads, then
/// check the due moved by exactly their sum.
fn run_stress(service: &LedgerService, account: &str, count: usize) -> Result<()> {
    let queries = service.queries();
    let initial_due = queries.get_account(account)?.emi_due;

    let mut rng = rand::thread_rng();
    let amounts: Vec<Decimal> = (0..count)
        .map(|_| Decimal::new(rng.gen_range(100..=50_000), 2))
        .collect();
    let expected: Decimal = amounts.iter().copied().sum();

    let engine = service.engine();
    let failures: usize = thread::scope(|s| {
        let handles: Vec<_> = amounts
            .chunks(count.div_ceil(STRESS_WORKERS))
            .map(|chunk| {
                s.spawn(move || {
                    chunk
                        .iter()
                        .filter(|amount| {
                            let request = PaymentRequest::new(account, **amount);
                            match engine.record_payment(&request) {
                                Ok(_) => false,
                                Err(e) => {
                                    log::error!("stress payment of {amount} failed: {e}");
                                    true
                                }
                            }
                        })
                        .count()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap_or(1)).sum()
    });
    if failures > 0 {
        bail!("{failures} stress payments failed");
    }

    let final_due = queries.get_account(account)?.emi_due;
    println!("=== STRESS RUN ===");
    println!("  account:     {account}");
    println!("  payments:    {count}");
    println!("  initial due: {initial_due}");
    println!("  paid:        {expected}");
    println!("  final due:   {final_due}");

    if final_due != initial_due - expected {
        bail!(
            "lost update detected: expected due {}, found {final_due}",
            initial_due - expected
        );
    }
    println!("  no lost updates");
    println!();
    Ok(())
}

fn print_summary(service: &LedgerService) -> Result<()> {
    let accounts = service.queries().list_accounts()?;
    let payments = service.queries().list_payments()?;
    let summary = service.analytics().summary()?;

    println!("=== LEDGER SUMMARY ===");
    println!("  accounts:        {}", accounts.len());
    println!("  payments:        {}", payments.len());
    println!("  collected today: {}", summary.collected_today);
    println!("  pending total:   {}", summary.pending_total);

    if !accounts.is_empty() {
        println!();
        println!("=== ACCOUNTS ===");
        for a in &accounts {
            println!("  {:<12} {:<24} due {}", a.account_number, a.customer_name, a.emi_due);
        }
    }
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
