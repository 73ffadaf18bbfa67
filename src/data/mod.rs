//! Core data models for the open-items client
//!
//! This module contains the data types used throughout the application for
//! representing open-items accounts, bookings, settlement history, summary
//! figures, and AI-derived assessments.

pub mod fallback;
pub mod open_items;

pub use open_items::{ApiError, BookingsFilter, OpenItemsClient, OpenItemsFilter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Whether an account is a debtor (customer) or creditor (supplier) account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Debtor,
    Creditor,
}

/// Debit/credit side indicator carried on postings ("S" = debit, "H" = credit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebitCredit {
    #[serde(rename = "S")]
    Debit,
    #[serde(rename = "H")]
    Credit,
}

/// Identifying information for an open-items account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountMetadata {
    /// Account number, e.g. "D10017"
    pub account_no: String,
    /// Account holder name
    pub name: String,
    /// Account status, e.g. "open"
    pub status: String,
    /// Debtor or creditor
    pub kind: AccountKind,
}

/// A single open item (unsettled invoice) on an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenItem {
    /// Invoice type code, e.g. "RA"
    pub invoice_type: String,
    /// Invoice number
    pub invoice_no: String,
    /// Invoice date
    pub date: NaiveDate,
    /// Date the item falls due
    pub due_date: NaiveDate,
    /// Value date
    pub value_date: NaiveDate,
    /// Original item amount
    pub amount: f64,
    /// Debit or credit side
    pub side: DebitCredit,
    /// Signed amount (negative for credit-side items)
    pub amount_signed: f64,
    /// Amount still outstanding
    pub remaining: f64,
    /// SEPA mandate number, if any
    pub mandate_no: String,
    /// Whether the item may enter the dunning run
    pub dunning_eligible: bool,
    /// Payment target in days
    pub payment_target_days: u32,
    /// First cash-discount window in days
    pub discount1_days: u32,
    /// First cash-discount percentage
    pub discount1_percent: f64,
    /// Second cash-discount window in days
    pub discount2_days: u32,
    /// Second cash-discount percentage
    pub discount2_percent: f64,
    /// Whether cash discount applies to the net amount
    pub net_discountable: bool,
    /// Tax key code
    pub tax_key: String,
    /// Free-form info text
    pub info_text: String,
}

impl OpenItem {
    /// Days this item is overdue as of the given date, 0 if not yet due
    pub fn days_overdue(&self, today: NaiveDate) -> i64 {
        (today - self.due_date).num_days().max(0)
    }

    /// Last day the first cash-discount window is open, if one is granted
    pub fn discount_deadline(&self) -> Option<NaiveDate> {
        if self.discount1_percent <= 0.0 {
            return None;
        }
        self.date
            .checked_add_signed(chrono::Duration::days(self.discount1_days as i64))
    }

    /// Whether paying on the given date still earns the first cash discount
    pub fn discount_available(&self, today: NaiveDate) -> bool {
        self.discount_deadline()
            .map(|deadline| today <= deadline)
            .unwrap_or(false)
    }
}

/// One row of the settlement history for an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Entry type code, e.g. "RA"
    pub entry_type: String,
    /// Invoice number the entry settles against
    pub settled_invoice_no: String,
    /// Document date
    pub date: NaiveDate,
    /// Booking date
    pub booking_date: NaiveDate,
    /// Booking time, "HH:MM:SS"
    pub time: String,
    /// Amount by which the open item changed
    pub change_amount: f64,
    /// Booked amount
    pub booked_amount: f64,
    /// Debit or credit side
    pub side: DebitCredit,
    /// Booking text
    pub text: String,
}

/// Aggregate figures for an account's open items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    /// Total of all open items
    pub total_open: f64,
    /// Portion already due
    pub due_total: f64,
    /// Portion not yet due
    pub not_due_total: f64,
    /// Current account balance
    pub current_balance: f64,
    /// Date of the last movement on the account
    pub last_movement_on: NaiveDate,
    /// Next cash-discount deadline across open items
    pub discount_date: NaiveDate,
    /// Credit limit granted to the account
    pub credit_limit: f64,
    /// Insured credit limit, if separately tracked
    pub insured_limit: f64,
    /// Reason the account is blocked, empty if not blocked
    pub block_reason: String,
}

/// Feature flags the backend reports for an account view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Whether the original document can be displayed
    pub show_original_document: bool,
    /// Whether documents can be printed
    pub print_document: bool,
    /// Whether the inline calculator is active
    pub calc_active: bool,
}

/// AI-derived assessment of an account's payment behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiAssessment {
    /// Probability the account pays, 0.0 to 1.0
    pub payment_probability: f64,
    /// Recommended dunning level
    pub recommended_dunning_level: u8,
    /// Risk score, 0 to 100
    pub risk_score: u32,
    /// Whether an anomaly was detected
    pub anomaly_detected: bool,
    /// Details of the detected anomaly, if any
    pub anomaly_details: Option<String>,
    /// Forecast days until payment, if predicted
    pub payment_forecast_days: Option<u32>,
    /// Recommended follow-up actions
    pub recommendations: Option<Vec<String>>,
}

/// Payment forecast for a single invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentForecast {
    /// Probability of payment in percent, 0 to 100
    pub probability_percent: f64,
    /// Predicted payment date
    pub predicted_payment_date: NaiveDate,
    /// Description of historical payment behavior
    pub historical_behavior: String,
    /// Recommended action
    pub recommendation: String,
}

/// Severity of a detected anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// An anomaly detected on one of the account's invoices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    /// Invoice the anomaly relates to
    pub invoice_no: String,
    /// Human-readable description
    pub description: String,
    /// Severity bucket
    pub severity: Severity,
    /// Anomaly category, e.g. "amount_deviation"
    pub kind: String,
}

/// Complete open-items view of one account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenItemsReport {
    /// Account identification
    pub metadata: AccountMetadata,
    /// Unsettled invoices
    pub items: Vec<OpenItem>,
    /// Settlement history rows
    pub history: Vec<HistoryEntry>,
    /// Aggregate figures
    pub summary: AccountSummary,
    /// Backend feature flags
    pub functions: FeatureFlags,
    /// AI assessment, when the backend provides one
    pub ai: Option<AiAssessment>,
}
