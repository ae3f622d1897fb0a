//! Services used by the turn handlers.

mod classifier;
mod extraction;
mod itinerary;
mod session_locks;

pub use classifier::IntentClassifier;
pub use extraction::{Extraction, ExtractionAdapter, ExtractionSource};
pub use itinerary::ItineraryTrigger;
pub use session_locks::SessionLocks;
