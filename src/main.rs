//! opview - view open items for an ERP account
//!
//! A command-line client that fetches open items, summary figures, and
//! payment analyses from the backend and prints them as text or JSON.
//! Responses are cached in memory for the duration of the invocation; when
//! the backend is unreachable, representative fallback data is shown.

use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use opview::cache::ResponseCache;
use opview::cli::{Cli, View};
use opview::data::{
    AccountSummary, AiAssessment, Anomaly, HistoryEntry, OpenItem, OpenItemsClient,
    OpenItemsReport, PaymentForecast,
};

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the open-item lines as a fixed-width table
fn print_items(items: &[OpenItem]) {
    let today = Utc::now().date_naive();

    println!(
        "{:<16} {:<12} {:<12} {:>12} {:>12} {:>8}  {}",
        "INVOICE", "DATE", "DUE", "AMOUNT", "REMAINING", "OVERDUE", "DISCOUNT"
    );
    for item in items {
        let discount = if item.discount_available(today) {
            format!("{}% until {}", item.discount1_percent, item.discount_deadline().map(|d| d.to_string()).unwrap_or_default())
        } else {
            "-".to_string()
        };
        println!(
            "{:<16} {:<12} {:<12} {:>12.2} {:>12.2} {:>7}d  {}",
            item.invoice_no,
            item.date,
            item.due_date,
            item.amount,
            item.remaining,
            item.days_overdue(today),
            discount
        );
    }
}

fn print_summary(summary: &AccountSummary) {
    println!("Total open:      {:>12.2}", summary.total_open);
    println!("Due:             {:>12.2}", summary.due_total);
    println!("Not yet due:     {:>12.2}", summary.not_due_total);
    println!("Balance:         {:>12.2}", summary.current_balance);
    println!("Last movement:   {}", summary.last_movement_on);
    println!("Discount date:   {}", summary.discount_date);
    println!("Credit limit:    {:>12.2}", summary.credit_limit);
    if !summary.block_reason.is_empty() {
        println!("BLOCKED:         {}", summary.block_reason);
    }
}

fn print_history(history: &[HistoryEntry]) {
    println!(
        "{:<6} {:<16} {:<12} {:<10} {:>12}  {}",
        "TYPE", "INVOICE", "DATE", "TIME", "AMOUNT", "TEXT"
    );
    for entry in history {
        println!(
            "{:<6} {:<16} {:<12} {:<10} {:>12.2}  {}",
            entry.entry_type,
            entry.settled_invoice_no,
            entry.booking_date,
            entry.time,
            entry.booked_amount,
            entry.text
        );
    }
}

fn print_ai(ai: &AiAssessment) {
    println!("Payment probability:  {:.0}%", ai.payment_probability * 100.0);
    println!("Recommended dunning:  level {}", ai.recommended_dunning_level);
    println!("Risk score:           {}/100", ai.risk_score);
    if ai.anomaly_detected {
        println!(
            "Anomaly:              {}",
            ai.anomaly_details.as_deref().unwrap_or("detected")
        );
    }
    if let Some(days) = ai.payment_forecast_days {
        println!("Forecast:             payment in ~{} days", days);
    }
    if let Some(ref recommendations) = ai.recommendations {
        for recommendation in recommendations {
            println!("  - {}", recommendation);
        }
    }
}

fn print_forecast(forecast: &PaymentForecast) {
    println!("Probability:     {:.0}%", forecast.probability_percent);
    println!("Predicted date:  {}", forecast.predicted_payment_date);
    println!("History:         {}", forecast.historical_behavior);
    println!("Recommendation:  {}", forecast.recommendation);
}

fn print_anomalies(anomalies: &[Anomaly]) {
    if anomalies.is_empty() {
        println!("No anomalies detected.");
        return;
    }
    for anomaly in anomalies {
        println!(
            "[{:?}] {} ({}): {}",
            anomaly.severity, anomaly.invoice_no, anomaly.kind, anomaly.description
        );
    }
}

fn print_report(report: &OpenItemsReport) {
    let kind = format!("{:?}", report.metadata.kind);
    println!(
        "{} ({}) - {} [{}]",
        report.metadata.account_no, kind, report.metadata.name, report.metadata.status
    );
    println!();
    print_items(&report.items);
    println!();
    print_summary(&report.summary);
    if let Some(ref ai) = report.ai {
        println!();
        print_ai(ai);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let view = match cli.view() {
        Ok(view) => view,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };

    let client = OpenItemsClient::with_base_url(&cli.base_url, ResponseCache::new());
    let account = cli.account.as_str();

    match view {
        View::Full => {
            let report = client.fetch_open_items(account, &cli.open_items_filter()).await;
            if cli.json {
                print_json(&report)?;
            } else {
                print_report(&report);
            }
        }
        View::Summary => {
            let summary = client.fetch_summary(account).await;
            if cli.json {
                print_json(&summary)?;
            } else {
                print_summary(&summary);
            }
        }
        View::Bookings => {
            let items = client.fetch_bookings(account, &cli.bookings_filter()).await;
            if cli.json {
                print_json(&items)?;
            } else {
                print_items(&items);
            }
        }
        View::History(invoice) => {
            let history = client.fetch_history(account, &invoice).await;
            if cli.json {
                print_json(&history)?;
            } else {
                print_history(&history);
            }
        }
        View::Ai => {
            let ai = client.fetch_ai_assessment(account).await;
            if cli.json {
                print_json(&ai)?;
            } else {
                print_ai(&ai);
            }
        }
        View::Forecast(invoice) => {
            let forecast = client.fetch_payment_forecast(account, &invoice).await;
            if cli.json {
                print_json(&forecast)?;
            } else {
                print_forecast(&forecast);
            }
        }
        View::Anomalies => {
            let anomalies = client.fetch_anomalies(account).await;
            if cli.json {
                print_json(&anomalies)?;
            } else {
                print_anomalies(&anomalies);
            }
        }
    }

    Ok(())
}
