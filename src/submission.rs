use serde::Deserialize;
use tracing::{error, info};

use crate::config::PortalConfig;
use crate::error::SubmissionError;
use crate::models::client::{fetch_clients, find_by_account_number};
use crate::models::comment::attach_comment;
use crate::models::crm::CrmHandle;
use crate::models::ticket::{CreateTicketRequest, created_ticket_id};

pub const MAX_CONCERN_CHARS: usize = 1000;

/// Body of `POST /public`. Missing fields are treated as empty.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct SubmissionForm {
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub concern: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

#[derive(Debug)]
pub struct SubmissionOutcome {
    pub kind: MessageKind,
    pub message: String,
    /// Values to put back into the form.
    pub form: SubmissionForm,
    /// Steps executed, only filled in debug mode.
    pub trace: Vec<String>,
}

/// Running record of what a submission did, kept only in debug mode.
struct DebugTrace {
    enabled: bool,
    steps: Vec<String>,
}

impl DebugTrace {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            steps: Vec::new(),
        }
    }

    fn step(&mut self, step: impl FnOnce() -> String) {
        if self.enabled {
            self.steps.push(step());
        }
    }
}

pub struct SubmissionService {
    crm: CrmHandle,
    debug: bool,
}

impl SubmissionService {
    pub fn new(crm: CrmHandle, config: &PortalConfig) -> Self {
        Self {
            crm,
            debug: config.debug,
        }
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    #[tracing::instrument(skip_all, fields(client_id, ticket_id))]
    pub async fn submit(&self, form: &SubmissionForm) -> SubmissionOutcome {
        let account_number = form.account_number.trim();
        let concern = form.concern.trim();
        let mut trace = DebugTrace::new(self.debug);

        match self.process(account_number, concern, &mut trace).await {
            Ok(ticket_id) => SubmissionOutcome {
                kind: MessageKind::Success,
                message: format!(
                    "Your support ticket has been submitted successfully! Ticket ID: #{}",
                    ticket_id
                ),
                form: SubmissionForm::default(),
                trace: trace.steps,
            },
            Err(err) => {
                match &err {
                    SubmissionError::Remote(cause) => error!("submission failed: {:#}", cause),
                    SubmissionError::CrmUnavailable(_) | SubmissionError::TicketNotCreated(_) => {
                        error!("submission failed: {}", err)
                    }
                    _ => info!("submission rejected: {}", err),
                }
                SubmissionOutcome {
                    kind: MessageKind::Error,
                    message: err.user_message(self.debug),
                    form: SubmissionForm {
                        account_number: account_number.to_string(),
                        concern: concern.to_string(),
                    },
                    trace: trace.steps,
                }
            }
        }
    }

    async fn process(
        &self,
        account_number: &str,
        concern: &str,
        trace: &mut DebugTrace,
    ) -> Result<String, SubmissionError> {
        let crm = self
            .crm
            .client()
            .map_err(|reason| SubmissionError::CrmUnavailable(reason.to_string()))?;
        validate(account_number, concern)?;

        trace.step(|| "Fetching clients...".to_string());
        let clients = fetch_clients(crm).await.map_err(SubmissionError::Remote)?;
        trace.step(|| format!("Got {} clients.", clients.len()));

        let client = find_by_account_number(&clients, account_number)
            .ok_or(SubmissionError::ClientNotFound)?;
        tracing::Span::current().record("client_id", client.id);
        trace.step(|| {
            format!(
                "Found client ID: {} ({}).",
                client.id,
                client.display_name(account_number)
            )
        });

        let request = CreateTicketRequest::for_concern(client.id, concern);
        trace.step(|| {
            format!(
                "Creating ticket with: {}...",
                serde_json::to_string(&request).unwrap_or_default()
            )
        });
        let response = request.submit(crm).await.map_err(SubmissionError::Remote)?;

        let Some(ticket_id) = created_ticket_id(&response) else {
            return Err(SubmissionError::TicketNotCreated(response));
        };
        tracing::Span::current().record("ticket_id", ticket_id.as_str());
        info!("Created ticket #{} for client {}", ticket_id, client.id);
        trace.step(|| format!("Ticket #{} created! Adding comment...", ticket_id));

        let attempts = attach_comment(crm, &ticket_id, concern).await;
        for (candidate, _) in &attempts.failures {
            trace.step(|| format!("{}/{} failed.", candidate.path, candidate.field));
        }
        if let Some(candidate) = &attempts.attached {
            trace.step(|| format!("Comment added via {} ({}).", candidate.path, candidate.field));
        }

        Ok(ticket_id)
    }
}

/// Input checks, in the order their messages take precedence.
pub fn validate(account_number: &str, concern: &str) -> Result<(), SubmissionError> {
    if account_number.is_empty() {
        return Err(SubmissionError::MissingAccountNumber);
    }
    if concern.is_empty() {
        return Err(SubmissionError::MissingConcern);
    }
    if concern.chars().count() > MAX_CONCERN_CHARS {
        return Err(SubmissionError::ConcernTooLong {
            max: MAX_CONCERN_CHARS,
        });
    }
    Ok(())
}
