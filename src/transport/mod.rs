pub mod outbound;
pub mod ws_session;
