//! Shared wire objects for the Icebreak event-networking backend.
//!
//! Request and response bodies plus the WebSocket frame types, used by the
//! server and by client applications.

pub mod objects;
