//! Download control state: per-entry scheduling and reconciliation.
//!
//! One `.dcs` file per (provider, anime ID) tracks when the entry was last
//! downloaded, when it is due again, and the last known metadata record.
//! The accessor owns the files, the scheduler partitions entries into due
//! and not due, and the updater reconciles freshly converted records back
//! into the store.

pub mod accessor;
pub mod entry;
pub mod scheduler;
pub mod updater;
pub mod week_of_year;

pub use accessor::{DownloadControlStateAccessor, DownloadControlStateAccessorImpl};
pub use entry::{DownloadControlStateEntry, MAX_WEEKS_BETWEEN_DOWNLOADS};
pub use scheduler::DownloadControlStateScheduler;
pub use updater::DownloadControlStateUpdater;
pub use week_of_year::WeekOfYear;
