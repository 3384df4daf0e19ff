//! BV periods service.

use async_trait::async_trait;
use ksmart::checkout::BvPeriod;
use mockall::automock;
use serde::Deserialize;

use crate::client::{BackendClient, BackendError};

#[derive(Debug, Deserialize)]
struct PeriodsResponse {
    #[serde(default)]
    data: Vec<BvPeriod>,
}

#[derive(Debug, Clone)]
pub struct HttpBvPeriodsService {
    client: BackendClient,
}

impl HttpBvPeriodsService {
    #[must_use]
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BvPeriodsService for HttpBvPeriodsService {
    async fn active_periods(&self) -> Result<Vec<BvPeriod>, BackendError> {
        let response: PeriodsResponse = self.client.get(&["api", "active-bv-periods"], &()).await?;

        Ok(response.data)
    }
}

#[automock]
#[async_trait]
pub trait BvPeriodsService: Send + Sync {
    /// Periods transactions may currently be booked into.
    async fn active_periods(&self) -> Result<Vec<BvPeriod>, BackendError>;
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use ksmart::checkout::BvPeriodId;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn periods_response_parses_dates() -> TestResult {
        let response: PeriodsResponse = serde_json::from_str(
            r#"{
                "status": "success",
                "data": [
                    {
                        "id": 8,
                        "name": "Periode Oktober 2026",
                        "start_date": "2026-10-01",
                        "end_date": "2026-10-31"
                    }
                ]
            }"#,
        )?;

        let period = response.data.first().ok_or("expected a period")?;

        assert_eq!(period.id, BvPeriodId(8));
        assert_eq!(period.start_date, Some(date(2026, 10, 1)));
        assert!(period.is_active, "listed periods are active");

        Ok(())
    }
}
