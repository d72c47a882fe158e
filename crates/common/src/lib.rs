pub mod settings;

#[cfg(feature = "ssr")]
pub mod token;

use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, ops::Range};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::Logger;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}

impl AuthenticatedUser {
    pub fn new(id: i64, username: String, is_admin: bool) -> Self {
        Self {
            id,
            username,
            is_admin,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub sorting: VecDeque<(String, SortOrder)>,
    pub range: Option<Range<usize>>,
    pub filter: Option<String>,
}

impl QueryParams {
    /// Parses a comma separated ordering such as `-created_at,id`.
    /// A leading `-` sorts the column in descending order.
    pub fn with_ordering(mut self, ordering: &str) -> Self {
        for field in ordering.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            let entry = match field.strip_prefix('-') {
                Some(column) => (column.to_string(), SortOrder::Descending),
                None => (field.to_string(), SortOrder::Ascending),
            };
            self.sorting.push_back(entry);
        }
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.trim().is_empty());
        self
    }

    /// Returns `None` when `offset + limit` does not fit in a `usize`.
    pub fn with_page(mut self, offset: Option<usize>, limit: Option<usize>) -> Option<Self> {
        if let Some(limit) = limit {
            let start = offset.unwrap_or(0);
            self.range = Some(start..start.checked_add(limit)?);
        }
        Some(self)
    }
}

/// Installs the global tracing subscriber. The returned guard must be held for
/// as long as file logging should keep flushing.
pub fn init_logging(logger: &Logger) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logger.level.as_str()));

    let stdout = fmt::layer().with_target(true).with_level(true);

    match &logger.directory {
        Some(directory) => {
            let file_appender = tracing_appender::rolling::daily(directory, "annotator.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file = fmt::layer().with_ansi(false).with_writer(non_blocking);

            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .with(file)
                .try_init()
                .ok();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout)
                .try_init()
                .ok();
            None
        }
    }
}
