mod engine;
mod host;
pub mod manual;
mod observer;
mod side;

pub use engine::{ClockEngine, ClockSnapshot};
pub use host::{Scheduler, SystemTime, TimeSource, TimerId};
pub use manual::{ManualScheduler, ManualTime};
pub use observer::{ClockEvent, ClockObserver, EventLog};
pub use side::Side;
