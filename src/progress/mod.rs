pub mod results;
pub mod stream;
pub mod view;

pub use results::{TaskResultFetcher, TaskResultSource};
pub use stream::{ConnectionState, ProgressStreamClient, StreamConnection, StreamOutcome};
pub use view::{ConnectionIndicator, ProgressViewModel};
