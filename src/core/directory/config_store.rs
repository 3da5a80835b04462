use crate::core::directory::store::AgreementStore;
use crate::core::models::agreement::AgreementRecord;
use async_trait::async_trait;

/// Agreements listed directly in the config file, for
/// local runs without a persistent store
pub struct ConfigAgreementStore {
    records: Vec<AgreementRecord>,
}

impl ConfigAgreementStore {
    pub fn new(records: Vec<AgreementRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl AgreementStore for ConfigAgreementStore {
    async fn agreements(&self, ssp_id: &str) -> Result<Vec<AgreementRecord>, anyhow::Error> {
        Ok(self
            .records
            .iter()
            .filter(|record| record.ssp_id == ssp_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::agreement::AgreementRecordBuilder;
    use rust_decimal::Decimal;

    fn record(ssp_id: &str, dsp_id: &str) -> AgreementRecord {
        AgreementRecordBuilder::default()
            .ssp_id(ssp_id)
            .dsp_id(dsp_id)
            .commission(Decimal::ZERO)
            .dsp_url("http://dsp.local")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_filters_by_ssp() {
        let store = ConfigAgreementStore::new(vec![
            record("ssp-1", "a"),
            record("ssp-2", "b"),
            record("ssp-1", "c"),
        ]);

        let found = store.agreements("ssp-1").await.unwrap();
        let dsps: Vec<_> = found.iter().map(|r| r.dsp_id.as_str()).collect();

        assert_eq!(dsps, vec!["a", "c"]);
        assert!(store.agreements("unknown").await.unwrap().is_empty());
    }
}
