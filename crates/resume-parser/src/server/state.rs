//! Application state for the resume parser server

use std::sync::Arc;

use crate::config::ResumeParserConfig;
use crate::parser::ResumeParser;
use crate::storage::ResumeDb;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ResumeParserConfig,
    parser: ResumeParser,
    /// Absent when storage failed to open
    db: Option<ResumeDb>,
}

impl AppState {
    pub fn new(config: ResumeParserConfig, parser: ResumeParser, db: Option<ResumeDb>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, parser, db }),
        }
    }

    pub fn config(&self) -> &ResumeParserConfig {
        &self.inner.config
    }

    pub fn parser(&self) -> &ResumeParser {
        &self.inner.parser
    }

    pub fn db(&self) -> Option<&ResumeDb> {
        self.inner.db.as_ref()
    }
}
