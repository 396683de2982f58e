use std::fmt::Write;

use crate::listing::{Dashboard, format_created};
use crate::submission::{MAX_CONCERN_CHARS, MessageKind, SubmissionForm, SubmissionOutcome};

/// Escape text for use in element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
         <title>{}</title>\n</head>\n<body>\n<div class=\"container\">\n{}</div>\n</body>\n</html>\n",
        escape(title),
        body
    )
}

pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let summary = &dashboard.summary;
    let mut body = String::new();

    body.push_str(
        "<div class=\"header\">\n<h1>Technical Support Ticketing</h1>\n\
         <p>Manage and view customer support tickets submitted through the public portal</p>\n</div>\n",
    );

    body.push_str("<div class=\"stats-grid\">\n");
    for (class, title, count) in [
        ("total", "Total Tickets", summary.total),
        ("open", "Open", summary.open),
        ("pending", "Pending", summary.pending),
        ("solved", "Solved", summary.solved),
    ] {
        let _ = writeln!(
            body,
            "<div class=\"stat-card {}\"><h3>{}</h3><div class=\"number\">{}</div></div>",
            class, title, count
        );
    }
    body.push_str("</div>\n");

    body.push_str("<div class=\"tickets-section\">\n<h2>Recent Tickets</h2>\n");
    if dashboard.recent.is_empty() {
        body.push_str(
            "<div class=\"empty-state\"><p>No tickets found. Tickets submitted through the \
             public form will appear here.</p></div>\n",
        );
    } else {
        body.push_str(
            "<table class=\"tickets-table\">\n<thead><tr><th>ID</th><th>Subject</th>\
             <th>Client</th><th>Status</th><th>Created</th></tr></thead>\n<tbody>\n",
        );
        for ticket in &dashboard.recent {
            let status = ticket.status();
            let _ = writeln!(
                body,
                "<tr><td>#{}</td><td class=\"concern-preview\">{}</td><td>{}</td>\
                 <td><span class=\"status-badge {}\">{}</span></td><td>{}</td></tr>",
                ticket.id.map(|id| id.to_string()).unwrap_or_default(),
                escape(ticket.subject.as_deref().unwrap_or("No Subject")),
                escape(&ticket.client_name()),
                status.css_class(),
                status.label(),
                escape(&format_created(ticket)),
            );
        }
        body.push_str("</tbody>\n</table>\n");
    }
    body.push_str("</div>\n");

    document("Technical Support Ticketing - Admin", &body)
}

pub fn render_submission_page(outcome: Option<&SubmissionOutcome>) -> String {
    let empty = SubmissionForm::default();
    let form = outcome.map(|o| &o.form).unwrap_or(&empty);
    let mut body = String::new();

    body.push_str(
        "<div class=\"card\">\n<div class=\"card-header\">\n<h1>Technical Support</h1>\n\
         <p>Submit a support ticket and we'll get back to you soon</p>\n</div>\n\
         <div class=\"card-body\">\n",
    );

    if let Some(outcome) = outcome {
        let class = match outcome.kind {
            MessageKind::Success => "success",
            MessageKind::Error => "error",
        };
        let _ = writeln!(
            body,
            "<div class=\"message {}\"><span>{}</span></div>",
            class,
            escape(&outcome.message)
        );
        if !outcome.trace.is_empty() {
            let _ = writeln!(
                body,
                "<div class=\"message debug\"><span>{}</span></div>",
                escape(&outcome.trace.join(" "))
            );
        }
    }

    let _ = write!(
        body,
        "<form method=\"POST\" id=\"ticketForm\">\n\
         <div class=\"form-group\">\n<label for=\"account_number\">Account Number<span class=\"required\">*</span></label>\n\
         <input type=\"text\" id=\"account_number\" name=\"account_number\" \
         placeholder=\"Enter your account number\" value=\"{}\" required autocomplete=\"off\">\n\
         <p class=\"help-text\">Your account number can be found on your billing statement</p>\n</div>\n\
         <div class=\"form-group\">\n<label for=\"concern\">Your Concern<span class=\"required\">*</span></label>\n\
         <textarea id=\"concern\" name=\"concern\" \
         placeholder=\"Please describe your issue or concern in detail...\" required maxlength=\"{}\">{}</textarea>\n\
         </div>\n<button type=\"submit\" class=\"submit-btn\">Submit Ticket</button>\n</form>\n",
        escape(&form.account_number),
        MAX_CONCERN_CHARS,
        escape(&form.concern),
    );

    body.push_str("</div>\n</div>\n<div class=\"footer\"><p>Need immediate assistance? Contact us directly.</p></div>\n");

    document("Submit Support Ticket", &body)
}
