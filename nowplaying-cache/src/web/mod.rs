//! Web layer for the now-playing cache.
//!
//! Readers fetch payloads by station ID or short name. The now-playing worker
//! pushes payloads with `PUT /api/nowplaying/{id}` and requests early
//! refreshes with `POST /api/nowplaying/{id}/force-update`. There is no
//! authorization, so the write routes belong on a private network.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, JsonNowPlayingCache};
