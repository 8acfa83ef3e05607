pub mod connections;
pub mod events;
pub mod join;
pub mod ws;

pub use connections::{ConnectionResponse, CreateConnectionByEmailRequest, CreateConnectionRequest};
pub use events::{EventResponse, EventState};
pub use join::{JoinAsGuestRequest, JoinAsUserRequest, ParticipantResponse};
pub use ws::{WsCloseCode, WsServerMessage};
