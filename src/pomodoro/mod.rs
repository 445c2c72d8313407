pub mod controller;
pub mod events;
pub mod phase;
pub mod session;

pub use controller::SessionController;
pub use events::{CueAction, EventReceiver, EventSender, SessionEvent, create_event_channel};
pub use phase::{Phase, PhaseColor, PhaseDisplay, format_time};
pub use session::{Session, SessionSnapshot};
