use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};
use tracing::debug;

use super::crm::{CrmClient, decode};

pub const TICKETS_PATH: &str = "ticketing/tickets";

const SUBJECT_PREFIX: &str = "Support Request: ";
const SUBJECT_CONCERN_CHARS: usize = 100;

/// Ticket status codes as used by the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TicketStatus {
    Open = 0,
    Pending = 1,
    Solved = 2,
    Closed = 3,
}

impl TicketStatus {
    /// Unknown codes are shown as open.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => TicketStatus::Pending,
            2 => TicketStatus::Solved,
            3 => TicketStatus::Closed,
            _ => TicketStatus::Open,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Pending => "Pending",
            TicketStatus::Solved => "Solved",
            TicketStatus::Closed => "Closed",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Pending => "pending",
            TicketStatus::Solved => "solved",
            TicketStatus::Closed => "closed",
        }
    }
}

/// A ticket as returned by `GET ticketing/tickets`. Only the fields the
/// dashboard shows are decoded; everything may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Option<i64>,
    pub subject: Option<String>,
    pub status: Option<i64>,
    pub created_date: Option<String>,
    pub client_first_name: Option<String>,
    pub client_last_name: Option<String>,
}

impl Ticket {
    /// Raw status code, a missing status counts as open.
    pub fn status_code(&self) -> i64 {
        self.status.unwrap_or(0)
    }

    pub fn status(&self) -> TicketStatus {
        TicketStatus::from_code(self.status_code())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_date.as_deref().and_then(parse_timestamp)
    }

    pub fn client_name(&self) -> String {
        format!(
            "{} {}",
            self.client_first_name.as_deref().unwrap_or_default(),
            self.client_last_name.as_deref().unwrap_or_default()
        )
    }
}

/// Parse the timestamp shapes the CRM has been seen to emit.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub async fn fetch_tickets(crm: &dyn CrmClient) -> anyhow::Result<Vec<Ticket>> {
    let payload = crm
        .get(TICKETS_PATH)
        .await
        .context("failed to GET ticketing/tickets")?;
    decode(payload)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub client_id: i64,
    pub subject: String,
    pub status: TicketStatus,
}

impl CreateTicketRequest {
    /// The subject is the fixed prefix plus the first 100 characters of the
    /// concern; the concern itself is attached afterwards as a comment.
    pub fn for_concern(client_id: i64, concern: &str) -> Self {
        Self {
            client_id,
            subject: format!(
                "{}{}",
                SUBJECT_PREFIX,
                concern.chars().take(SUBJECT_CONCERN_CHARS).collect::<String>()
            ),
            status: TicketStatus::Open,
        }
    }

    pub async fn submit(&self, crm: &dyn CrmClient) -> anyhow::Result<Value> {
        let body = serde_json::to_value(self)?;
        debug!("Creating ticket: {}", body);
        crm.post(TICKETS_PATH, &body)
            .await
            .context("failed to POST ticketing/tickets")
    }
}

/// The id of a freshly created ticket, as literal text. `None` when the
/// response carries no usable id.
pub fn created_ticket_id(response: &Value) -> Option<String> {
    match response.get("id")? {
        Value::Null => None,
        Value::String(id) => Some(id.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn status_label_is_derived_from_code_only() {
        assert_eq!(TicketStatus::from_code(0).label(), "Open");
        assert_eq!(TicketStatus::from_code(1).label(), "Pending");
        assert_eq!(TicketStatus::from_code(2).label(), "Solved");
        assert_eq!(TicketStatus::from_code(3).label(), "Closed");
        assert_eq!(TicketStatus::from_code(4).label(), "Open");
        assert_eq!(TicketStatus::from_code(-1).label(), "Open");

        let a = Ticket {
            status: Some(2),
            ..Default::default()
        };
        let b = Ticket {
            status: Some(2),
            subject: Some("other".into()),
            ..Default::default()
        };
        assert_eq!(a.status(), b.status());
    }

    #[test]
    fn missing_status_counts_as_open() {
        let ticket = Ticket::default();
        assert_eq!(ticket.status_code(), 0);
        assert_eq!(ticket.status(), TicketStatus::Open);
    }

    #[test]
    fn tickets_decode_from_crm_payload() {
        let tickets: Vec<Ticket> = decode(json!([
            {
                "id": 12,
                "subject": "Router down",
                "status": 1,
                "createdDate": "2024-03-01T09:30:00+0000",
                "clientFirstName": "Ada",
                "clientLastName": "Lovelace",
                "assignedUserId": null
            },
            { "id": 13 }
        ]))
        .unwrap();

        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].subject.as_deref(), Some("Router down"));
        assert_eq!(tickets[0].client_name(), "Ada Lovelace");
        assert_eq!(tickets[1].client_name(), " ");
        assert!(tickets[1].created_at().is_none());
    }

    #[test]
    fn decode_error_names_the_field_path() {
        let err = decode::<Vec<Ticket>>(json!([{ "id": "twelve" }])).unwrap_err();
        assert!(err.to_string().contains("[0].id"), "{}", err);
    }

    #[test]
    fn timestamps_in_crm_shapes_are_parsed() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-01T09:30:00+0000"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T09:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:30:00+0100"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 09:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn create_request_uses_prefixed_truncated_subject() {
        let concern = "x".repeat(150);
        let request = CreateTicketRequest::for_concern(42, &concern);

        assert_eq!(request.client_id, 42);
        assert_eq!(request.status, TicketStatus::Open);
        assert_eq!(request.subject, format!("Support Request: {}", "x".repeat(100)));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "clientId": 42,
                "subject": format!("Support Request: {}", "x".repeat(100)),
                "status": 0
            })
        );
    }

    #[test]
    fn subject_truncation_is_character_safe() {
        let concern = "ü".repeat(120);
        let request = CreateTicketRequest::for_concern(1, &concern);
        assert_eq!(request.subject.chars().count(), "Support Request: ".len() + 100);
    }

    #[test]
    fn created_ticket_id_is_taken_literally() {
        assert_eq!(created_ticket_id(&json!({"id": 77})), Some("77".to_string()));
        assert_eq!(created_ticket_id(&json!({"id": "A-9"})), Some("A-9".to_string()));
        assert_eq!(created_ticket_id(&json!({"id": null})), None);
        assert_eq!(created_ticket_id(&json!({"code": 422})), None);
        assert_eq!(created_ticket_id(&Value::Null), None);
    }
}
