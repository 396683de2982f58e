//! Best-effort attachment of the customer's concern to a new ticket.
//!
//! The CRM's comment API shape is not confirmed, so a fixed, ordered list of
//! endpoint/field combinations is tried until one is accepted. Once the real
//! contract is known, `comment_candidates` can shrink to that single entry.

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::crm::CrmClient;
use super::ticket::TICKETS_PATH;

const COMMENT_ENDPOINTS: [&str; 2] = ["comments", "activity"];
const COMMENT_FIELDS: [&str; 4] = ["body", "content", "message", "text"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentCandidate {
    pub path: String,
    pub field: &'static str,
}

impl CommentCandidate {
    pub fn payload(&self, concern: &str) -> Value {
        let mut payload = Map::new();
        payload.insert("public".to_string(), Value::Bool(true));
        payload.insert(self.field.to_string(), Value::String(concern.to_string()));
        Value::Object(payload)
    }
}

/// Every endpoint is tried with every field name before moving on to the
/// next endpoint.
pub fn comment_candidates(ticket_id: &str) -> Vec<CommentCandidate> {
    COMMENT_ENDPOINTS
        .iter()
        .flat_map(move |endpoint| {
            COMMENT_FIELDS.iter().map(move |field| CommentCandidate {
                path: format!("{}/{}/{}", TICKETS_PATH, ticket_id, endpoint),
                field: *field,
            })
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct CommentAttempts {
    pub attached: Option<CommentCandidate>,
    pub failures: Vec<(CommentCandidate, String)>,
}

/// Try the candidates in order and stop at the first accepted one. Failures
/// are collected, never returned as an error.
#[tracing::instrument(skip(crm, concern))]
pub async fn attach_comment(crm: &dyn CrmClient, ticket_id: &str, concern: &str) -> CommentAttempts {
    let mut attempts = CommentAttempts::default();

    for candidate in comment_candidates(ticket_id) {
        match crm.post(&candidate.path, &candidate.payload(concern)).await {
            Ok(_) => {
                info!(path = %candidate.path, field = candidate.field, "comment attached");
                attempts.attached = Some(candidate);
                break;
            }
            Err(error) => {
                debug!(path = %candidate.path, field = candidate.field, %error, "comment attempt failed");
                attempts.failures.push((candidate, format!("{:#}", error)));
            }
        }
    }

    if attempts.attached.is_none() {
        info!("no comment endpoint accepted the concern");
    }
    attempts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::crm::fake::FakeCrm;
    use serde_json::json;

    #[test]
    fn candidates_are_ordered_endpoint_major() {
        let candidates: Vec<(String, &str)> = comment_candidates("9")
            .into_iter()
            .map(|c| (c.path, c.field))
            .collect();

        let comments = "ticketing/tickets/9/comments".to_string();
        let activity = "ticketing/tickets/9/activity".to_string();
        assert_eq!(
            candidates,
            vec![
                (comments.clone(), "body"),
                (comments.clone(), "content"),
                (comments.clone(), "message"),
                (comments, "text"),
                (activity.clone(), "body"),
                (activity.clone(), "content"),
                (activity.clone(), "message"),
                (activity, "text"),
            ]
        );
    }

    #[test]
    fn payload_is_public_with_candidate_field() {
        let candidate = CommentCandidate {
            path: "ticketing/tickets/1/comments".into(),
            field: "message",
        };
        assert_eq!(
            candidate.payload("help"),
            json!({ "public": true, "message": "help" })
        );
    }

    #[tokio::test]
    async fn probing_stops_at_first_accepted_candidate() {
        let crm = FakeCrm::new(|call| {
            let body = call.body.as_ref().unwrap();
            if call.path.ends_with("/comments") && body.get("content").is_some() {
                Ok(json!({ "id": 1 }))
            } else {
                Err("422 Unprocessable Entity".into())
            }
        });

        let attempts = attach_comment(&crm, "5", "printer on fire").await;

        let attached = attempts.attached.unwrap();
        assert_eq!(attached.path, "ticketing/tickets/5/comments");
        assert_eq!(attached.field, "content");
        assert_eq!(attempts.failures.len(), 1);
        assert_eq!(crm.calls().len(), 2);
    }

    #[tokio::test]
    async fn falls_through_to_activity_endpoint() {
        let crm = FakeCrm::new(|call| {
            if call.path.ends_with("/activity") && call.body.as_ref().unwrap().get("text").is_some() {
                Ok(Value::Null)
            } else {
                Err("404 Not Found".into())
            }
        });

        let attempts = attach_comment(&crm, "5", "printer on fire").await;

        assert_eq!(attempts.attached.unwrap().field, "text");
        assert_eq!(attempts.failures.len(), 7);
        assert_eq!(crm.calls().len(), 8);
    }

    #[tokio::test]
    async fn all_failures_are_absorbed() {
        let crm = FakeCrm::new(|_| Err("500 Internal Server Error".into()));

        let attempts = attach_comment(&crm, "5", "printer on fire").await;

        assert!(attempts.attached.is_none());
        assert_eq!(attempts.failures.len(), 8);
        assert!(crm.calls().iter().all(|c| c.method == "POST"));
    }
}
