use super::operation::Operation;
use crate::error::{RedemptionError, Result};
use std::io::Read;

/// Reads engine operations from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Operation>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct OperationReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OperationReader<R> {
    /// Creates a new `OperationReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes operations.
    pub fn operations(self) -> impl Iterator<Item = Result<Operation>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(RedemptionError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::{Principal, VoucherId};
    use crate::interfaces::csv::operation::OperationType;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "op, caller, height, voucher, outlet, value\n\
                    redeem, B, 100, 1, M,\n\
                    confirm, M, , 1, ,\n\
                    set_fee, O, , , , 2.5";
        let reader = OperationReader::new(data.as_bytes());
        let results: Vec<Result<Operation>> = reader.operations().collect();

        assert_eq!(results.len(), 3);
        let redeem = results[0].as_ref().unwrap();
        assert_eq!(redeem.op, OperationType::Redeem);
        assert_eq!(redeem.caller, Principal::new("B"));
        assert_eq!(redeem.height, Some(100));
        assert_eq!(redeem.voucher, Some(VoucherId(1)));
        assert_eq!(redeem.outlet, Some(Principal::new("M")));
        assert_eq!(redeem.value, None);

        let confirm = results[1].as_ref().unwrap();
        assert_eq!(confirm.height, None);

        let set_fee = results[2].as_ref().unwrap();
        assert_eq!(set_fee.op, OperationType::SetFee);
        assert_eq!(set_fee.value, Some(dec!(2.5)));
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "op, caller, height, voucher, outlet, value\nburn, B, 1, 1, M,";
        let reader = OperationReader::new(data.as_bytes());
        let results: Vec<Result<Operation>> = reader.operations().collect();

        assert!(matches!(results[0], Err(RedemptionError::CsvError(_))));
    }
}
