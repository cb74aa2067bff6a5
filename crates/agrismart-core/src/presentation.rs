//! Display mappings for statuses and amounts

use crate::state_machine::RequestStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Badge color tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    Success,
    Warning,
    Danger,
    Info,
    Neutral,
}

impl StatusColor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusColor::Success => "success",
            StatusColor::Warning => "warning",
            StatusColor::Danger => "danger",
            StatusColor::Info => "info",
            StatusColor::Neutral => "neutral",
        }
    }
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RequestStatus {
    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            RequestStatus::PendingApproval => "Pending Approval",
            RequestStatus::Approved => "Approved",
            RequestStatus::Scheduled => "Scheduled",
            RequestStatus::InProgress => "In Progress",
            RequestStatus::AwaitingAnalysis => "Awaiting Analysis",
            RequestStatus::AnalysisComplete => "Analysis Complete",
            RequestStatus::ValidationRequired => "Needs Validation",
            RequestStatus::Completed => "Completed",
            RequestStatus::Rejected => "Rejected",
        }
    }

    /// Badge color
    #[must_use]
    pub const fn color(self) -> StatusColor {
        match self {
            RequestStatus::PendingApproval => StatusColor::Warning,
            RequestStatus::Approved => StatusColor::Info,
            RequestStatus::Scheduled => StatusColor::Info,
            RequestStatus::InProgress => StatusColor::Warning,
            RequestStatus::AwaitingAnalysis => StatusColor::Warning,
            RequestStatus::AnalysisComplete => StatusColor::Success,
            RequestStatus::ValidationRequired => StatusColor::Warning,
            RequestStatus::Completed => StatusColor::Success,
            RequestStatus::Rejected => StatusColor::Danger,
        }
    }
}

#[inline]
#[must_use]
pub fn status_label(status: RequestStatus) -> &'static str {
    status.label()
}

#[inline]
#[must_use]
pub fn status_color(status: RequestStatus) -> StatusColor {
    status.color()
}

/// `"XAF 1,250,000"`
#[must_use]
pub fn format_currency(amount: u64, currency_code: &str) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{currency_code} {grouped}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_match_badges() {
        assert_eq!(status_color(RequestStatus::Rejected), StatusColor::Danger);
        assert_eq!(status_color(RequestStatus::Completed), StatusColor::Success);
        assert_eq!(
            status_color(RequestStatus::AwaitingAnalysis),
            StatusColor::Warning
        );
    }

    #[test]
    fn labels_are_distinct_and_non_empty() {
        let mut labels: Vec<_> = RequestStatus::ALL.iter().map(|s| s.label()).collect();
        assert!(labels.iter().all(|l| !l.is_empty()));
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), RequestStatus::ALL.len());
    }

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(0, "XAF"), "XAF 0");
        assert_eq!(format_currency(999, "XAF"), "XAF 999");
        assert_eq!(format_currency(1_000, "XAF"), "XAF 1,000");
        assert_eq!(format_currency(1_250_000, "XAF"), "XAF 1,250,000");
        assert_eq!(format_currency(12_345_678, "USD"), "USD 12,345,678");
    }
}
