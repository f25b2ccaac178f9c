//! Personal-color preview: a background-removal relay, the season swatch
//! tables, the pick tally and the client-side session state machine.

pub mod client;
pub mod compose;
pub mod config;
pub mod palette;
pub mod relay;
pub mod removal;
pub mod session;
pub mod tally;

pub use palette::{Season, Swatch};
pub use session::Session;
pub use tally::Selection;
