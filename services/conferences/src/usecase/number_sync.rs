use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::domain::repository::{ConferenceProvider, PhoneNumberRepository};
use crate::error::ConfServiceError;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub existing: usize,
    /// Numbers still in the inventory that the provider no longer lists.
    /// They are kept; an operator decides what to do with them.
    pub missing_upstream: Vec<String>,
}

/// Import the provider's dial-in numbers into the local inventory.
/// Known numbers keep their reservation state; nothing is ever removed.
pub struct SyncPhoneNumbersUseCase<V: ConferenceProvider, P: PhoneNumberRepository> {
    pub provider: V,
    pub phone_numbers: P,
}

impl<V: ConferenceProvider, P: PhoneNumberRepository> SyncPhoneNumbersUseCase<V, P> {
    pub async fn execute(&self) -> Result<SyncReport, ConfServiceError> {
        let upstream = self.provider.list_phone_numbers().await?;
        let known: HashSet<String> = self
            .phone_numbers
            .list_all()
            .await?
            .into_iter()
            .map(|n| n.phone_number)
            .collect();
        let mut report = SyncReport::default();

        for number in &upstream {
            if known.contains(number) {
                report.existing += 1;
            } else if self.phone_numbers.insert_if_absent(number).await? {
                debug!(phone_number = %number, "phone number imported");
                report.inserted += 1;
            } else {
                // Imported concurrently by another run.
                report.existing += 1;
            }
        }

        let upstream: HashSet<&String> = upstream.iter().collect();
        report.missing_upstream = known
            .into_iter()
            .filter(|number| !upstream.contains(number))
            .collect();
        report.missing_upstream.sort();
        for number in &report.missing_upstream {
            warn!(phone_number = %number, "phone number no longer listed by provider");
        }

        info!(
            inserted = report.inserted,
            existing = report.existing,
            missing_upstream = report.missing_upstream.len(),
            "phone number sync done"
        );
        Ok(report)
    }
}
