#![allow(dead_code)]

use chrono::NaiveDateTime;
use emi_ledger_core::{
    FixedClock, LedgerClock, LedgerConfig, LedgerService, LedgerStore, NewAccount,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub const START: &str = "2026-10-18 10:00:00";

pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("timestamp literal")
}

pub struct Fixture {
    pub service: LedgerService,
    pub clock: Arc<FixedClock>,
}

impl Fixture {
    pub fn store(&self) -> &Arc<LedgerStore> {
        self.service.store()
    }

    pub fn due(&self, account_number: &str) -> Decimal {
        self.service
            .queries()
            .get_account(account_number)
            .expect("account exists")
            .emi_due
    }
}

/// In-memory ledger seeded with `accounts`, clock frozen at START.
pub fn fixture(accounts: &[(&str, Decimal)]) -> Fixture {
    fixture_with(LedgerConfig::default_test(), accounts)
}

pub fn fixture_with(config: LedgerConfig, accounts: &[(&str, Decimal)]) -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Arc::new(LedgerStore::open(&config).expect("open store"));
    store.migrate().expect("migration");
    let clock = Arc::new(FixedClock::new(at(START)));
    for (account_number, due) in accounts {
        store
            .insert_account(&NewAccount::new(*account_number, *due), clock.now())
            .expect("seed account");
    }
    let service = LedgerService::new(store, clock.clone(), &config);
    Fixture { service, clock }
}

/// A uniquely named database file in the OS temp dir, removed on drop.
pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    pub fn new(tag: &str) -> Self {
        let path = std::env::temp_dir().join(format!("emi-ledger-{tag}-{}.db", uuid::Uuid::new_v4()));
        Self { path }
    }

    pub fn config(&self) -> LedgerConfig {
        LedgerConfig {
            db_path: self.path.to_string_lossy().into_owned(),
            ..LedgerConfig::default_test()
        }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

/// Money in a JSON response, whether encoded as a string or a number.
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("not a money value: {other}"),
    }
}
