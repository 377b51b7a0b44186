//! Read-only collection analytics over the ledger and account stores.

use crate::{
    clock::LedgerClock,
    error::LedgerResult,
    models::CollectionSummary,
    store::LedgerStore,
};
use chrono::{Duration, NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::sync::Arc;

pub struct AnalyticsAggregator {
    store: Arc<LedgerStore>,
    clock: Arc<dyn LedgerClock>,
}

impl AnalyticsAggregator {
    pub fn new(store: Arc<LedgerStore>, clock: Arc<dyn LedgerClock>) -> Self {
        Self { store, clock }
    }

    /// Today's collections and the total outstanding due.
    ///
    /// The figures are read one after the other on separate connections, not
    /// from one snapshot. Each reflects some committed prefix of the ledger;
    /// together they may straddle a payment.
    pub fn summary(&self) -> LedgerResult<CollectionSummary> {
        let today = self.clock.today();
        let collected_today = self.collected_on(today)?;
        let pending_total = self.pending_total()?;
        log::debug!("analytics for {today}: collected={collected_today} pending={pending_total}");
        Ok(CollectionSummary {
            collected_today,
            pending_total,
        })
    }

    /// Sum of payments dated on `date`, server-local. Zero when there are none.
    pub fn collected_on(&self, date: NaiveDate) -> LedgerResult<Decimal> {
        let start = date.and_time(NaiveTime::MIN);
        let end = start + Duration::days(1);
        let amounts = self.store.amounts_between(start, end)?;
        Ok(amounts.into_iter().sum())
    }

    /// Sum of every account's due. Credit balances reduce the total.
    pub fn pending_total(&self) -> LedgerResult<Decimal> {
        Ok(self.store.all_dues()?.into_iter().sum())
    }
}
