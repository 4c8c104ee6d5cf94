use thiserror::Error;

/// Failure reported by an external collaborator (directory, registry or ledger).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("not found")]
    NotFound,
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum RedemptionError {
    #[error("caller is not the engine owner")]
    NotAuthorized,
    #[error("voucher details could not be retrieved")]
    InvalidVoucher,
    #[error("no redemption recorded for voucher")]
    UnknownVoucher,
    #[error("voucher validity window has passed")]
    Expired,
    #[error("voucher has already been redeemed")]
    AlreadyRedeemed,
    #[error("outlet is not approved for the voucher category")]
    OutletNotApproved,
    #[error("beneficiary is not eligible")]
    IneligibleBeneficiary,
    #[error("campaign has insufficient funds")]
    InsufficientFunds,
    #[error("amount must be positive")]
    InvalidAmount,
    #[error("redemption rate ceiling reached")]
    RateExceeded,
    #[error("caller is not the outlet that redeemed the voucher")]
    NotTheOutlet,
    #[error("voucher redemption was never committed")]
    NotYetRedeemed,

    #[error("voucher invalidation rejected: {0}")]
    InvalidationRejected(CollaboratorError),
    #[error("fee transfer rejected: {0}")]
    FeeTransferRejected(CollaboratorError),
    #[error("campaign fund transfer rejected: {0}")]
    FundTransferRejected(CollaboratorError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDB(#[from] rocksdb::Error),
}

impl RedemptionError {
    /// Stable tag for rejections; `None` for infrastructure failures.
    pub fn code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotAuthorized => "not_authorized",
            Self::InvalidVoucher => "invalid_voucher",
            Self::UnknownVoucher => "unknown_voucher",
            Self::Expired => "expired",
            Self::AlreadyRedeemed => "already_redeemed",
            Self::OutletNotApproved => "outlet_not_approved",
            Self::IneligibleBeneficiary => "ineligible_beneficiary",
            Self::InsufficientFunds => "insufficient_funds",
            Self::InvalidAmount => "invalid_amount",
            Self::RateExceeded => "rate_exceeded",
            Self::NotTheOutlet => "not_the_outlet",
            Self::NotYetRedeemed => "not_yet_redeemed",
            Self::InvalidationRejected(_) => "invalidation_rejected",
            Self::FeeTransferRejected(_) => "fee_transfer_rejected",
            Self::FundTransferRejected(_) => "fund_transfer_rejected",
            _ => return None,
        };
        Some(code)
    }
}

pub type Result<T> = std::result::Result<T, RedemptionError>;
