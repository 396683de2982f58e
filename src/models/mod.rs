pub mod client;
pub mod comment;
pub mod crm;
pub mod ticket;
pub mod ucrm_api;
