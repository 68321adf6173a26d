pub mod admin;
pub mod api;
pub mod config;
pub mod dashboard;
pub mod dispatcher;
pub mod error;
pub mod listing;
pub mod session;
pub mod ticker;
pub mod trips;
pub mod view;

pub use admin::StatsPoller;
pub use api::{ApiClient, LoginOutcome, Upload};
pub use config::Config;
pub use dashboard::Dashboard;
pub use dispatcher::{ActionDispatcher, Intent, Outcome, Reload};
pub use error::{ClientError, ClientResult};
pub use listing::{ListingFetcher, Listings, TripLists};
pub use session::{FileSessionStore, MemorySessionStore, SessionManager, SessionStore, StoredSession};
pub use ticker::CountdownTicker;
pub use trips::MyTrips;
pub use view::CardView;
