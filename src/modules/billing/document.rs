//! Printable HTML invoice
//!
//! Rendered with tera; the template name ends in `.html` so every
//! interpolated value is HTML-escaped.

use super::model::{Invoice, InvoiceStatus};
use crate::config::CompanyProfile;
use crate::core::error::{ActionError, DashResult};
use serde::Serialize;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "invoice.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Invoice {{ invoice.number }}</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 40px; }
    .header { display: flex; justify-content: space-between; margin-bottom: 40px; }
    .company { font-size: 24px; font-weight: bold; color: #4F46E5; }
    .invoice-title { font-size: 32px; color: #111; }
    .muted { color: #666; }
    .info-section { display: flex; justify-content: space-between; margin-bottom: 30px; }
    .info-box { background: #f9fafb; padding: 20px; border-radius: 8px; width: 48%; }
    .info-label { font-size: 12px; color: #666; text-transform: uppercase; margin-bottom: 5px; }
    table { width: 100%; border-collapse: collapse; margin: 20px 0; }
    th { background: #f3f4f6; padding: 12px; text-align: left; font-size: 12px; text-transform: uppercase; }
    td { padding: 12px; border-bottom: 1px solid #e5e7eb; }
    .text-right { text-align: right; }
    .totals-row { display: flex; justify-content: space-between; padding: 8px 0; }
    .totals-row.total { font-size: 18px; font-weight: bold; border-top: 2px solid #111; padding-top: 12px; }
    .status { display: inline-block; padding: 4px 12px; border-radius: 20px; font-size: 12px; }
    .status-paid { background: #d1fae5; color: #065f46; }
    .status-open { background: #fef3c7; color: #92400e; }
    .due { color: #dc2626; }
    .paid-banner { background: #d1fae5; padding: 16px; border-radius: 8px; margin-top: 20px; color: #065f46; }
    .footer { margin-top: 40px; padding-top: 20px; border-top: 1px solid #e5e7eb; color: #666; font-size: 12px; }
  </style>
</head>
<body>
  <div class="header">
    <div>
      <div class="company">{{ company.name }}</div>
      <div class="muted">{{ company.address }}</div>
      {% if company.tax_id %}<div class="muted">Tax ID: {{ company.tax_id }}</div>{% endif %}
    </div>
    <div class="text-right">
      <div class="invoice-title">INVOICE</div>
      <div class="muted">{{ invoice.number }}</div>
    </div>
  </div>

  <div class="info-section">
    <div class="info-box">
      <div class="info-label">Bill To</div>
      <div><strong>{{ invoice.customer_name }}</strong></div>
      <div>{{ invoice.customer_email }}</div>
    </div>
    <div class="info-box">
      <div class="info-label">Invoice Details</div>
      <div><strong>Date:</strong> {{ invoice.issued_on }}</div>
      <div><strong>Due:</strong> {{ invoice.due_on }}</div>
      <div style="margin-top: 10px;">
        <span class="status {% if invoice.paid %}status-paid{% else %}status-open{% endif %}">{{ invoice.status }}</span>
      </div>
    </div>
  </div>

  <table>
    <thead>
      <tr>
        <th>Description</th>
        <th class="text-right">Qty</th>
        <th class="text-right">Unit Price</th>
        <th class="text-right">Amount</th>
      </tr>
    </thead>
    <tbody>
      {% for line in lines %}
      <tr>
        <td>{{ line.description }}</td>
        <td class="text-right">{{ line.quantity }}</td>
        <td class="text-right">{{ line.unit_amount }}</td>
        <td class="text-right">{{ line.amount }}</td>
      </tr>
      {% endfor %}
    </tbody>
  </table>

  <div class="totals">
    <div class="totals-row"><span>Subtotal</span><span>{{ invoice.subtotal }}</span></div>
    {% if invoice.has_tax %}<div class="totals-row"><span>Tax</span><span>{{ invoice.tax }}</span></div>{% endif %}
    <div class="totals-row total"><span>Total</span><span>{{ invoice.total }}</span></div>
    {% if invoice.amount_due %}<div class="totals-row due"><span>Amount Due</span><span>{{ invoice.amount_due }}</span></div>{% endif %}
  </div>

  {% if invoice.paid_on %}<div class="paid-banner"><strong>Paid on {{ invoice.paid_on }}</strong></div>{% endif %}

  <div class="footer">
    <p>Thank you for your business!</p>
    <p>For questions about this invoice, please contact {{ company.email }}</p>
  </div>
</body>
</html>
"#;

#[derive(Serialize)]
struct InvoiceView {
    number: String,
    customer_name: String,
    customer_email: String,
    status: String,
    paid: bool,
    issued_on: String,
    due_on: String,
    paid_on: Option<String>,
    subtotal: String,
    has_tax: bool,
    tax: String,
    total: String,
    amount_due: Option<String>,
}

#[derive(Serialize)]
struct LineView {
    description: String,
    quantity: u32,
    unit_amount: String,
    amount: String,
}

/// `$1,234.50`, `EUR 12.00`
pub fn format_money(amount: f64, currency: &str) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    let symbol = match currency {
        "USD" => "$".to_string(),
        other => format!("{} ", other),
    };
    format!("{}{}{}.{:02}", sign, symbol, grouped, cents % 100)
}

/// Render the invoice as a standalone HTML page
pub fn render_invoice(invoice: &Invoice, company: &CompanyProfile) -> DashResult<String> {
    let money = |amount: f64| format_money(amount, &invoice.currency);
    let date_format = "%b %-d, %Y";

    let lines: Vec<LineView> = if invoice.line_items.is_empty() {
        vec![LineView {
            description: invoice
                .description
                .clone()
                .unwrap_or_else(|| "Services".to_string()),
            quantity: 1,
            unit_amount: money(invoice.subtotal),
            amount: money(invoice.subtotal),
        }]
    } else {
        invoice
            .line_items
            .iter()
            .map(|item| LineView {
                description: item.description.clone(),
                quantity: item.quantity,
                unit_amount: money(item.unit_amount),
                amount: money(item.amount),
            })
            .collect()
    };

    let paid = invoice.status == InvoiceStatus::Paid;
    let view = InvoiceView {
        number: invoice.number.clone(),
        customer_name: invoice.customer_name.clone(),
        customer_email: invoice.customer_email.clone(),
        status: invoice.status.to_string().to_uppercase(),
        paid,
        issued_on: invoice.created_at.format(date_format).to_string(),
        due_on: invoice.due_date.format(date_format).to_string(),
        paid_on: invoice.paid_at.map(|at| at.format(date_format).to_string()),
        subtotal: money(invoice.subtotal),
        has_tax: invoice.tax > 0.0,
        tax: money(invoice.tax),
        total: money(invoice.total),
        amount_due: (!paid && invoice.amount_remaining > 0.0).then(|| money(invoice.amount_remaining)),
    };

    let mut context = Context::new();
    context.insert("invoice", &view);
    context.insert("lines", &lines);
    context.insert("company", company);

    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)
        .and_then(|_| tera.render(TEMPLATE_NAME, &context))
        .map_err(|e| {
            ActionError::Render {
                message: e.to_string(),
            }
            .into()
        })
}
