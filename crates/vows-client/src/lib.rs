//! Client side of the wedding site: the HTTP API, the per-browser liked set,
//! live feed subscriptions and the state the RSVP and guestbook forms move
//! through.

pub mod api;
pub mod error;
pub mod feed;
pub mod form;
pub mod guestbook;
pub mod guests;
pub mod photo;

pub use api::ApiClient;
pub use error::ClientError;
pub use feed::FeedHandle;
pub use form::{FormMachine, FormState};
pub use guestbook::{Guestbook, LikeRemote, LikedSet};
pub use guests::GuestListView;
