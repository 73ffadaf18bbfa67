//! Command-line interface parsing for opview
//!
//! This module handles parsing of CLI arguments using clap, including the
//! view-selection flags (--summary, --bookings, --history, ...) and the
//! listing filters (--due-only, --from, --to).

use chrono::NaiveDate;
use clap::Parser;
use thiserror::Error;

use crate::data::{BookingsFilter, OpenItemsFilter};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// More than one view flag was given
    #[error("Only one of --summary, --bookings, --history, --ai, --forecast, --anomalies may be selected")]
    ConflictingViews,
}

/// opview - view open items (accounts receivable/payable) from an ERP backend
#[derive(Parser, Debug)]
#[command(name = "opview")]
#[command(about = "View open items, summaries, and payment analyses for an account")]
#[command(version)]
pub struct Cli {
    /// Account number to inspect, e.g. D10017
    pub account: String,

    /// Show only the summary block
    #[arg(long)]
    pub summary: bool,

    /// Show only the open bookings
    #[arg(long)]
    pub bookings: bool,

    /// Show the settlement history of the given invoice
    #[arg(long, value_name = "INVOICE")]
    pub history: Option<String>,

    /// Show the AI payment assessment
    #[arg(long)]
    pub ai: bool,

    /// Show the payment forecast for the given invoice
    #[arg(long, value_name = "INVOICE")]
    pub forecast: Option<String>,

    /// Show detected anomalies
    #[arg(long)]
    pub anomalies: bool,

    /// Restrict listings to items already due
    #[arg(long)]
    pub due_only: bool,

    /// Earliest invoice date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Latest invoice date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Backend base URL
    #[arg(long, value_name = "URL", default_value = crate::data::open_items::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Print raw JSON instead of formatted text
    #[arg(long)]
    pub json: bool,
}

/// Which view of the account the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// The complete open-items report (default)
    Full,
    Summary,
    Bookings,
    History(String),
    Ai,
    Forecast(String),
    Anomalies,
}

impl Cli {
    /// Resolves the view-selection flags into a single view
    ///
    /// # Returns
    /// * `Ok(View)` when zero or one view flag is set (zero means `Full`)
    /// * `Err(CliError::ConflictingViews)` when several are set
    pub fn view(&self) -> Result<View, CliError> {
        let mut views = Vec::new();
        if self.summary {
            views.push(View::Summary);
        }
        if self.bookings {
            views.push(View::Bookings);
        }
        if let Some(ref invoice) = self.history {
            views.push(View::History(invoice.clone()));
        }
        if self.ai {
            views.push(View::Ai);
        }
        if let Some(ref invoice) = self.forecast {
            views.push(View::Forecast(invoice.clone()));
        }
        if self.anomalies {
            views.push(View::Anomalies);
        }

        match views.len() {
            0 => Ok(View::Full),
            1 => Ok(views.remove(0)),
            _ => Err(CliError::ConflictingViews),
        }
    }

    /// Builds the open-items filter from the listing flags
    pub fn open_items_filter(&self) -> OpenItemsFilter {
        OpenItemsFilter {
            due_only: self.due_only.then_some(true),
            date_from: self.from,
            date_to: self.to,
            ..Default::default()
        }
    }

    /// Builds the bookings filter from the listing flags
    pub fn bookings_filter(&self) -> BookingsFilter {
        BookingsFilter {
            due_only: self.due_only.then_some(true),
            date_from: self.from,
            date_to: self.to,
        }
    }
}
