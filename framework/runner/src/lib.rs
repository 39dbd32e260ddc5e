mod cli;
mod config;
mod init;
mod poller;
mod report;
mod run;
mod session;
mod shutdown;
mod source;

pub mod prelude {
    pub use crate::cli::MonitorCli;
    pub use crate::config::{ConfigError, SessionConfig, DEFAULT_POLL_INTERVAL};
    pub use crate::init::init;
    pub use crate::report::{
        format_gigabytes, format_value, JsonlReporter, Report, Reporters, TableReporter,
    };
    pub use crate::run::run;
    pub use crate::session::TargetSession;
    pub use crate::source::{
        HttpSnapshotSource, HttpSourceConfig, ReplaySnapshotSource, SnapshotSource, SourceError,
    };
}
