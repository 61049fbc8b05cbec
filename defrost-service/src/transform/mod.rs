use crate::pipeline::{Envelope, PipelineError, Transform};
use defrost_client::domain::Reading;
use time::{macros::datetime, PrimitiveDateTime};

/// Earliest timestamp the spreadsheet tooling that produces the exports can
/// represent.
pub const MIN_TIMESTAMP: PrimitiveDateTime = datetime!(1677-09-22 00:00:00);
/// Latest timestamp the same tooling can represent.
pub const MAX_TIMESTAMP: PrimitiveDateTime = datetime!(2262-04-11 00:00:00);

/// Pure validation of a `Reading` timestamp.
///
/// A timestamp outside [`MIN_TIMESTAMP`, `MAX_TIMESTAMP`] is treated like an
/// unparseable one.
pub fn validate_reading(env: Envelope<Reading>) -> Result<Envelope<Reading>, PipelineError> {
    let ts = env.payload.ts;

    if ts < MIN_TIMESTAMP || ts > MAX_TIMESTAMP {
        return Err(PipelineError::Transform(format!(
            "line {}: timestamp {ts} out of representable range",
            env.line
        )));
    }

    Ok(env)
}

#[derive(Clone, Default)]
pub struct TimestampBoundsValidation;

#[async_trait::async_trait]
impl Transform<Reading, Reading> for TimestampBoundsValidation {
    async fn apply(&self, input: Envelope<Reading>) -> Result<Envelope<Reading>, PipelineError> {
        match validate_reading(input) {
            Ok(env) => Ok(env),
            Err(e) => {
                metrics::counter!("validation_reading_rejected_total").increment(1);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(ts: PrimitiveDateTime) -> Envelope<Reading> {
        Envelope {
            payload: Reading {
                ts,
                zone: "Frozen Storage".to_string(),
                ambient_temp_c: Some(-21.0),
                defrost_status: Some(0.0),
            },
            line: 2,
        }
    }

    #[test]
    fn reading_validation_accepts_valid_record() {
        let res = validate_reading(envelope(datetime!(2024-06-18 10:00)));
        assert!(res.is_ok());
    }

    #[test]
    fn reading_validation_rejects_out_of_range_ts() {
        let res = validate_reading(envelope(datetime!(1500-01-01 00:00)));
        assert!(matches!(res, Err(PipelineError::Transform(_))));

        let res = validate_reading(envelope(datetime!(2300-01-01 00:00)));
        assert!(matches!(res, Err(PipelineError::Transform(_))));
    }

    #[tokio::test]
    async fn transform_passes_valid_records_through() {
        let out = TimestampBoundsValidation
            .apply(envelope(datetime!(2024-06-18 10:00)))
            .await
            .unwrap();
        assert_eq!(out.payload.zone, "Frozen Storage");
    }
}
