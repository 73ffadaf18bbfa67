//! Representative fallback data served when the backend is unreachable
//!
//! Every read function substitutes these samples on a network failure so a
//! consumer always has something to render. Fallback data is never written
//! to the response cache; the next call retries the network.

use chrono::{Duration, NaiveDate, Utc};

use super::{
    AccountKind, AccountMetadata, AccountSummary, AiAssessment, Anomaly, DebitCredit,
    FeatureFlags, HistoryEntry, OpenItem, OpenItemsReport, PaymentForecast, Severity,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn item(invoice_no: &str, y: i32, m: u32, d: u32, due: (i32, u32, u32), amount: f64, info: &str) -> OpenItem {
    OpenItem {
        invoice_type: "RA".to_string(),
        invoice_no: invoice_no.to_string(),
        date: date(y, m, d),
        due_date: date(due.0, due.1, due.2),
        value_date: date(y, m, d),
        amount,
        side: DebitCredit::Debit,
        amount_signed: amount,
        remaining: amount,
        mandate_no: "M2025-001".to_string(),
        dunning_eligible: true,
        payment_target_days: 30,
        discount1_days: 14,
        discount1_percent: 2.0,
        discount2_days: 0,
        discount2_percent: 0.0,
        net_discountable: true,
        tax_key: "19".to_string(),
        info_text: info.to_string(),
    }
}

fn history_row(invoice_no: &str, y: i32, m: u32, d: u32, time: &str, amount: f64) -> HistoryEntry {
    HistoryEntry {
        entry_type: "RA".to_string(),
        settled_invoice_no: invoice_no.to_string(),
        date: date(y, m, d),
        booking_date: date(y, m, d),
        time: time.to_string(),
        change_amount: amount,
        booked_amount: amount,
        side: DebitCredit::Debit,
        text: "Invoice created".to_string(),
    }
}

/// Full sample report for an account
///
/// Debtor/creditor kind is inferred from the account number's leading
/// letter, matching the backend's numbering convention.
pub fn sample_report(account_no: &str) -> OpenItemsReport {
    let kind = if account_no.starts_with('D') {
        AccountKind::Debtor
    } else {
        AccountKind::Creditor
    };
    let label = match kind {
        AccountKind::Debtor => "Debtor",
        AccountKind::Creditor => "Creditor",
    };

    OpenItemsReport {
        metadata: AccountMetadata {
            account_no: account_no.to_string(),
            name: format!("{} {}", label, account_no),
            status: "open".to_string(),
            kind,
        },
        items: vec![
            item("RE-2025-0102", 2025, 1, 15, (2025, 2, 14), 1250.00, "January delivery"),
            item("RE-2025-0155", 2025, 2, 10, (2025, 3, 12), 2780.50, "February delivery"),
            item("RE-2025-0189", 2025, 3, 5, (2025, 4, 4), 5430.75, "March delivery"),
        ],
        history: vec![
            history_row("RE-2025-0102", 2025, 1, 15, "10:15:22", 1250.00),
            history_row("RE-2025-0155", 2025, 2, 10, "09:45:37", 2780.50),
            history_row("RE-2025-0189", 2025, 3, 5, "14:30:11", 5430.75),
        ],
        summary: sample_summary(),
        functions: FeatureFlags {
            show_original_document: true,
            print_document: true,
            calc_active: true,
        },
        ai: Some(sample_ai_assessment()),
    }
}

/// Sample aggregate figures consistent with the sample items
pub fn sample_summary() -> AccountSummary {
    AccountSummary {
        total_open: 9461.25,
        due_total: 1250.00,
        not_due_total: 8211.25,
        current_balance: 9461.25,
        last_movement_on: date(2025, 3, 5),
        discount_date: date(2025, 3, 19),
        credit_limit: 15000.00,
        insured_limit: 0.00,
        block_reason: String::new(),
    }
}

/// Sample AI assessment
pub fn sample_ai_assessment() -> AiAssessment {
    AiAssessment {
        payment_probability: 0.85,
        recommended_dunning_level: 1,
        risk_score: 20,
        anomaly_detected: true,
        anomaly_details: Some("Unusually high amount on RE-2025-0189".to_string()),
        payment_forecast_days: Some(12),
        recommendations: Some(vec![
            "Call to remind about RE-2025-0102".to_string(),
            "Watch incoming payments more closely".to_string(),
        ]),
    }
}

/// Sample payment forecast, predicted two weeks out from today
pub fn sample_payment_forecast() -> PaymentForecast {
    PaymentForecast {
        probability_percent: 75.0,
        predicted_payment_date: Utc::now().date_naive() + Duration::days(14),
        historical_behavior: "Payments arrive on average 12 days past due".to_string(),
        recommendation: "Send a payment reminder in 7 days".to_string(),
    }
}

/// Sample anomaly list
pub fn sample_anomalies() -> Vec<Anomaly> {
    vec![Anomaly {
        invoice_no: "RE-2025-0189".to_string(),
        description: "Unusually high amount for this customer".to_string(),
        severity: Severity::Medium,
        kind: "amount_deviation".to_string(),
    }]
}
