//! Tax report over paid invoices

use super::model::{Invoice, InvoiceStatus};
use crate::core::error::{DashError, DashResult, RequestError};
use crate::export::csv::{CsvColumn, to_csv_with_columns};
use crate::export::{ExportFile, ExportFormat, dated_filename};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Parameters of a tax report, from a settings action body or a query string
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TaxReportRequest {
    #[serde(alias = "startDate")]
    pub start_date: NaiveDate,
    #[serde(alias = "endDate")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default, alias = "includeDetails")]
    pub include_details: bool,
}

impl TaxReportRequest {
    pub fn format(&self) -> DashResult<ExportFormat> {
        match self.format.as_deref() {
            None => Ok(ExportFormat::Json),
            Some(raw) => raw
                .parse()
                .map_err(|format| RequestError::UnsupportedFormat { format }.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxReportLine {
    pub number: String,
    pub customer_name: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaxReport {
    pub period: ReportPeriod,
    pub invoice_count: usize,
    /// Sum of subtotals
    pub taxable_total: f64,
    pub tax_total: f64,
    pub gross_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<TaxReportLine>>,
    #[serde(skip)]
    lines: Vec<TaxReportLine>,
}

const COLUMNS: &[CsvColumn] = &[
    CsvColumn::new("Invoice", "number"),
    CsvColumn::new("Customer", "customer_name"),
    CsvColumn::new("Paid At", "paid_at"),
    CsvColumn::new("Subtotal", "subtotal"),
    CsvColumn::new("Tax", "tax"),
    CsvColumn::new("Total", "total"),
];

impl TaxReport {
    /// Invoices that are `paid` with a payment date inside `[start, end]`
    pub fn build(request: &TaxReportRequest, invoices: &[Invoice]) -> DashResult<Self> {
        if request.start_date > request.end_date {
            return Err(DashError::field("start_date", "must not be after end_date"));
        }

        let lines: Vec<TaxReportLine> = invoices
            .iter()
            .filter(|invoice| invoice.status == InvoiceStatus::Paid)
            .filter(|invoice| {
                invoice.paid_at.is_some_and(|at| {
                    let day = at.date_naive();
                    day >= request.start_date && day <= request.end_date
                })
            })
            .map(|invoice| TaxReportLine {
                number: invoice.number.clone(),
                customer_name: invoice.customer_name.clone(),
                paid_at: invoice.paid_at,
                subtotal: invoice.subtotal,
                tax: invoice.tax,
                total: invoice.total,
            })
            .collect();

        Ok(Self {
            period: ReportPeriod {
                start: request.start_date,
                end: request.end_date,
            },
            invoice_count: lines.len(),
            taxable_total: lines.iter().map(|l| l.subtotal).sum(),
            tax_total: lines.iter().map(|l| l.tax).sum(),
            gross_total: lines.iter().map(|l| l.total).sum(),
            details: request.include_details.then(|| lines.clone()),
            lines,
        })
    }

    /// The report as a download. CSV lists one line per invoice followed by
    /// a totals line, whether or not details were requested.
    pub fn to_file(&self, format: ExportFormat) -> DashResult<ExportFile> {
        let stem = format!("tax-report-{}-to-{}", self.period.start, self.period.end);
        let body = match format {
            ExportFormat::Json => serde_json::to_string_pretty(self)?,
            ExportFormat::Csv => {
                let mut csv = to_csv_with_columns(&self.lines, COLUMNS)?;
                csv.push_str(&format!(
                    "TOTAL,,,{},{},{}\n",
                    self.taxable_total, self.tax_total, self.gross_total
                ));
                csv
            }
        };
        let filename = dated_filename(&stem, format);
        Ok(ExportFile::new(filename, format.content_type(), body))
    }
}
