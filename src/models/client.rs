use anyhow::Context;
use serde::Deserialize;

use super::crm::{CrmClient, decode};

pub const CLIENTS_PATH: &str = "clients";

/// A CRM client (customer account). `user_ident` is the account number
/// printed on the customer's billing statement.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub user_ident: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
}

impl Client {
    pub fn display_name(&self, account_number: &str) -> String {
        let first = self.first_name.as_deref().unwrap_or_default();
        let last = self.last_name.as_deref().unwrap_or_default();
        if !first.is_empty() || !last.is_empty() {
            return format!("{} {}", first, last).trim().to_string();
        }
        match self.company_name.as_deref() {
            Some(company) if !company.is_empty() => company.to_string(),
            _ => format!("Account #{}", account_number),
        }
    }
}

pub async fn fetch_clients(crm: &dyn CrmClient) -> anyhow::Result<Vec<Client>> {
    let payload = crm
        .get(CLIENTS_PATH)
        .await
        .context("failed to GET clients")?;
    decode(payload)
}

/// First client, in CRM order, whose account number matches exactly.
pub fn find_by_account_number<'a>(clients: &'a [Client], account_number: &str) -> Option<&'a Client> {
    clients
        .iter()
        .find(|client| client.user_ident.as_deref() == Some(account_number))
}
