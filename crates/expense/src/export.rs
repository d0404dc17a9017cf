//! Flat rows for spreadsheet export.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sharefair_core::{DomainError, DomainResult, Money};

use crate::member::MemberId;
use crate::record::ExpenseRecord;

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecordRow {
    pub date: String,
    pub amount: Money,
    pub payer: MemberId,
    pub expense_type: String,
    pub remark: String,
    /// Consumer names joined with `,`.
    pub consumers: String,
    pub project_name: String,
}

impl ExpenseRecordRow {
    pub fn from_record(
        record: &ExpenseRecord,
        project_name: &str,
        date_format: &str,
    ) -> DomainResult<Self> {
        let details = record.details()?;
        let consumers = details
            .consumers
            .iter()
            .map(MemberId::as_str)
            .collect::<Vec<_>>()
            .join(",");

        Ok(Self {
            date: format_date(details.date, date_format)?,
            amount: details.amount,
            payer: details.payer,
            expense_type: details.expense_type,
            remark: details.remark,
            consumers,
            project_name: project_name.to_string(),
        })
    }
}

/// Reject strftime patterns chrono cannot render.
pub fn validate_date_format(date_format: &str) -> DomainResult<()> {
    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        return Err(DomainError::validation(format!(
            "invalid date format '{date_format}'"
        )));
    }
    Ok(())
}

fn format_date(date: DateTime<Utc>, date_format: &str) -> DomainResult<String> {
    use core::fmt::Write;

    validate_date_format(date_format)?;
    let mut out = String::new();
    write!(out, "{}", date.format(date_format)).map_err(|_| {
        DomainError::validation(format!("date cannot be rendered with '{date_format}'"))
    })?;
    Ok(out)
}
