pub mod event;
pub mod identity;

pub use event::{
    parse_event_date, CreateEventInput, Event, EventChanges, EventFilter, EventPatch, NewEvent,
    Participant,
};
pub use identity::Identity;
