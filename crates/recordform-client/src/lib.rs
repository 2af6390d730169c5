//! # recordform-client - The Kit
//!
//! Async access to the clinical-records REST layer and to layout metadata.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use recordform_client::{EntityClient, ListQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), recordform_client::Error> {
//!     let client = EntityClient::new("https://clinic.example");
//!
//!     // First page of patients named like "ada"
//!     let query = ListQuery::default().search("ada");
//!     let patients = client.get_records("patient", &query).await?;
//!     println!("{}", patients);
//!
//!     // One patient, projected to two columns
//!     let fields = vec!["FirstName".to_string(), "Dob".to_string()];
//!     let patient = client.get_record_by_id("patient", "123", &fields).await?;
//!     println!("{}", patient);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Surface
//!
//! ```text
//! ┌─────────────────────┐          HTTP           ┌─────────────────────┐
//! │   recordform app    │ ◄───────────────────►   │   Records API       │
//! │                     │  GET    /api/{entity}   │                     │
//! │  ┌───────────────┐  │  GET    /api/{e}/{id}   │                     │
//! │  │ EntityClient  │  │  POST   /api/{entity}   │                     │
//! │  │ LayoutSource  │  │  PUT    /api/{e}/{id}   │                     │
//! │  └───────────────┘  │  PATCH  /api/{e}/{id}   │                     │
//! └─────────────────────┘  DELETE /api/{e}/{id}   └─────────────────────┘
//! ```

mod client;
mod error;
mod layout;
pub mod model;
mod query;

pub use client::{DEFAULT_TIMEOUT, EntityClient};
pub use error::Error;
pub use layout::{FileLayoutSource, HttpLayoutSource, LayoutSource, Layouts};
pub use query::{ListQuery, SortOrder};
