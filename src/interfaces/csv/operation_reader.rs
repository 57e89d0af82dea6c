use super::operation::{Operation, OperationRecord};
use crate::error::{PaymentError, Result};
use std::io::Read;

/// Reads payment operations from a CSV source.
///
/// Wraps `csv::Reader` with whitespace trimming and flexible record lengths, so rows
/// may omit trailing columns they do not use.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads, deserializes and validates each row.
    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader.into_deserialize::<OperationRecord>().map(|result| {
            result
                .map_err(PaymentError::from)
                .and_then(Operation::try_from)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use rust_decimal_macros::dec;

    const HEADER: &str = "type, order, gateway, transaction, amount, currency, reason, event";

    #[test]
    fn test_reader_valid_stream() {
        let data = format!(
            "{}\npay, 42, , , 28.00, ILS\ncapture, , , woo_42-1\nwebhook, , woo, woo_42-1, , , , payment.refunded",
            HEADER
        );
        let results: Vec<Result<Operation>> =
            OperationReader::new(data.as_bytes()).operations().collect();

        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].as_ref().unwrap(),
            &Operation::Pay {
                order: 42,
                amount: dec!(28.00),
                currency: "ILS".to_string(),
                gateway: None,
            }
        );
        assert_eq!(
            results[1].as_ref().unwrap(),
            &Operation::Capture {
                transaction: "woo_42-1".to_string(),
                amount: None,
            }
        );
        assert!(matches!(results[2], Ok(Operation::Webhook { .. })));
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = format!("{}\nteleport, 1\npay, x, , , 1.0, USD\nvoid", HEADER);
        let results: Vec<Result<Operation>> =
            OperationReader::new(data.as_bytes()).operations().collect();

        assert_eq!(results.len(), 3);
        for result in results {
            assert_eq!(result.unwrap_err().code(), ErrorCode::InvalidRequest);
        }
    }
}
