use std::cmp::Reverse;

use tracing::{info, warn};

use crate::models::crm::CrmHandle;
use crate::models::ticket::{Ticket, fetch_tickets};

pub const RECENT_TICKET_LIMIT: usize = 50;

const CREATED_FORMAT: &str = "%b %-d, %Y %-I:%M %p";

/// Counts over the whole fetched collection. A status outside 0..=3 is only
/// part of `total`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TicketSummary {
    pub total: usize,
    pub open: usize,
    pub pending: usize,
    pub solved: usize,
    pub closed: usize,
}

impl TicketSummary {
    pub fn from_tickets(tickets: &[Ticket]) -> Self {
        let mut summary = TicketSummary {
            total: tickets.len(),
            ..Default::default()
        };
        for ticket in tickets {
            match ticket.status_code() {
                0 => summary.open += 1,
                1 => summary.pending += 1,
                2 => summary.solved += 1,
                3 => summary.closed += 1,
                _ => {}
            }
        }
        summary
    }
}

#[derive(Debug, Default)]
pub struct Dashboard {
    pub summary: TicketSummary,
    pub recent: Vec<Ticket>,
}

impl Dashboard {
    pub fn from_tickets(mut tickets: Vec<Ticket>) -> Self {
        let summary = TicketSummary::from_tickets(&tickets);
        sort_newest_first(&mut tickets);
        tickets.truncate(RECENT_TICKET_LIMIT);
        Self {
            summary,
            recent: tickets,
        }
    }
}

/// Stable sort by creation time, newest first. Missing or unparseable dates
/// rank as the epoch.
pub fn sort_newest_first(tickets: &mut [Ticket]) {
    tickets.sort_by_key(|ticket| {
        Reverse(ticket.created_at().map(|dt| dt.timestamp()).unwrap_or(0))
    });
}

pub fn format_created(ticket: &Ticket) -> String {
    match ticket.created_at() {
        Some(created) => created.format(CREATED_FORMAT).to_string(),
        None => "N/A".to_string(),
    }
}

/// Fetch failures degrade to an empty dashboard.
#[tracing::instrument(skip(crm))]
pub async fn load_dashboard(crm: &CrmHandle) -> Dashboard {
    let client = match crm.client() {
        Ok(client) => client,
        Err(reason) => {
            warn!(%reason, "CRM unavailable, showing empty ticket list");
            return Dashboard::default();
        }
    };

    match fetch_tickets(client).await {
        Ok(tickets) => {
            info!("Fetched {} tickets from {}", tickets.len(), client.name());
            Dashboard::from_tickets(tickets)
        }
        Err(error) => {
            warn!("failed to fetch tickets, showing empty list: {:#}", error);
            Dashboard::default()
        }
    }
}
