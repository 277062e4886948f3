//! Aula parent-portal integration: HTTP client, login-session cache, and
//! the five portal tools.

pub mod client;
pub mod session;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_portal;

pub use client::{AulaClient, AulaSession, CalendarEvent, ChildProfile, ChildSummary, MessageThread};
pub use session::SessionCache;
pub use tools::{
    DEFAULT_CALENDAR_DAYS, FetchBasicDataTool, FetchCalendarTool, FetchDailyOverviewTool,
    FetchMessagesTool, SetActiveChildTool,
};
