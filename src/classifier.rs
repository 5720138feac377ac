use crate::table::CellValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancellationState {
    Active,
    CancelledBeforePrint,
    CancelledAfterPrint,
}

impl CancellationState {
    /// `cancelled` and `printed` both set means the receipt was voided after
    /// it was handed out; `cancelled` alone means it never left the counter.
    pub fn from_flags(cancelled: bool, printed: bool) -> Self {
        match (cancelled, printed) {
            (true, true) => CancellationState::CancelledAfterPrint,
            (true, false) => CancellationState::CancelledBeforePrint,
            _ => CancellationState::Active,
        }
    }

    pub fn is_active(self) -> bool {
        self == CancellationState::Active
    }

    /// Value written into the cancelled-flag column, which is also the
    /// criteria column of the summary formulas.
    pub fn flag_label(self) -> &'static str {
        if self.is_active() {
            "لا"
        } else {
            "نعم"
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CancellationState::Active => "سارى",
            CancellationState::CancelledBeforePrint => "ملغى قبل الطباعة",
            CancellationState::CancelledAfterPrint => "ملغى بعد الطباعة",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentChannel {
    Cash,
    Card,
}

impl PaymentChannel {
    /// Receipts paid by card carry an administrative expense; a missing,
    /// null, non-numeric or zero value means cash.
    pub fn from_admin_expense(admin_expense: Option<&CellValue>) -> Self {
        match admin_expense.and_then(CellValue::as_amount) {
            Some(v) if v != 0.0 => PaymentChannel::Card,
            _ => PaymentChannel::Cash,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowClassification {
    pub state: CancellationState,
    /// Only present for active receipts.
    pub channel: Option<PaymentChannel>,
}

impl RowClassification {
    pub fn is_active_cash(&self) -> bool {
        self.state.is_active() && self.channel == Some(PaymentChannel::Cash)
    }
}

/// Derives the cancellation state and, for active receipts, the payment
/// channel. Absent fields read as false / cash.
pub fn classify(
    cancelled: Option<&CellValue>,
    printed: Option<&CellValue>,
    admin_expense: Option<&CellValue>,
) -> RowClassification {
    let state = CancellationState::from_flags(
        cancelled.is_some_and(CellValue::is_truthy),
        printed.is_some_and(CellValue::is_truthy),
    );

    let channel = if state.is_active() {
        Some(PaymentChannel::from_admin_expense(admin_expense))
    } else {
        None
    };

    RowClassification { state, channel }
}
