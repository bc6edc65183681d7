use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::repository::{CallStatsRepository, ConferenceProvider};
use crate::domain::types::{CallStat, SMALL_RUN_NUMBERS};
use crate::error::ConfServiceError;

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectCallStatsOptions {
    /// Read everything, write nothing (table is left untouched).
    pub dry_run: bool,
    /// Only walk the first few numbers.
    pub small_run: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CallStatsReport {
    pub numbers_done: usize,
    pub numbers_failed: usize,
    /// Call histories fetched (and written, outside dry runs).
    pub calls_collected: usize,
    pub calls_failed: usize,
}

/// Batch job: rebuild the `call_stats` analytics table from the provider's
/// call histories.
///
/// Table setup failures abort the run. Once the walk has started, a failing
/// number or call is logged and skipped so the rest of the run survives.
pub struct CollectCallStatsUseCase<V: ConferenceProvider, R: CallStatsRepository> {
    pub provider: V,
    pub call_stats: R,
    pub options: CollectCallStatsOptions,
}

impl<V: ConferenceProvider, R: CallStatsRepository> CollectCallStatsUseCase<V, R> {
    pub async fn execute(&self) -> Result<CallStatsReport, ConfServiceError> {
        info!(
            dry_run = self.options.dry_run,
            small_run = self.options.small_run,
            "call stats collection started"
        );

        if self.options.dry_run {
            info!("dry run: not recreating call_stats table");
        } else {
            if let Err(e) = self.call_stats.drop_table().await {
                warn!(error = %e, "could not drop old call_stats table");
            }
            self.call_stats.create_table().await?;
            debug!("created call_stats table");
        }

        let numbers = self.provider.list_phone_numbers().await?;
        let limit = if self.options.small_run {
            SMALL_RUN_NUMBERS
        } else {
            numbers.len()
        };
        info!(total = numbers.len(), limit, "phone numbers to walk");

        let mut report = CallStatsReport::default();
        for number in numbers.iter().take(limit) {
            match self.collect_number(number, &mut report).await {
                Ok(()) => report.numbers_done += 1,
                Err(e) => {
                    report.numbers_failed += 1;
                    warn!(phone_number = %number, error = %e, "skipping phone number");
                }
            }
            info!(
                numbers_done = report.numbers_done,
                calls_collected = report.calls_collected,
                "progress"
            );
        }

        info!(
            numbers_done = report.numbers_done,
            numbers_failed = report.numbers_failed,
            calls_collected = report.calls_collected,
            calls_failed = report.calls_failed,
            "call stats collection finished"
        );
        Ok(report)
    }

    async fn collect_number(
        &self,
        phone_number: &str,
        report: &mut CallStatsReport,
    ) -> Result<(), ConfServiceError> {
        let call_ids = self.provider.call_ids(phone_number).await?;
        debug!(phone_number, calls = call_ids.len(), "got call ids");

        for call_id in call_ids {
            match self.collect_call(phone_number, call_id).await {
                Ok(()) => report.calls_collected += 1,
                Err(e) => {
                    report.calls_failed += 1;
                    warn!(phone_number, call_id, error = %e, "skipping call");
                }
            }
        }
        Ok(())
    }

    async fn collect_call(&self, phone_number: &str, call_id: u64) -> Result<(), ConfServiceError> {
        let history = self.provider.call_history(phone_number, call_id).await?;
        debug!(
            phone_number,
            call_id,
            count_participants = history.count_participants,
            "got call history"
        );
        if self.options.dry_run {
            return Ok(());
        }
        self.call_stats
            .insert(&CallStat {
                id: Uuid::new_v4(),
                phone_number: phone_number.to_owned(),
                history,
            })
            .await
    }
}
