use std::fmt;

use hoopsync_adapters::AdapterError;
use hoopsync_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{entity} {id}: {source}")]
    Entity {
        entity: &'static str,
        id: String,
        #[source]
        source: Box<SyncError>,
    },
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
    #[error("task panicked: {0}")]
    TaskPanicked(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Attach the entity a failure belongs to, e.g. `game 0021400001`.
    pub fn for_entity(entity: &'static str, id: impl ToString, err: impl Into<SyncError>) -> Self {
        Self::Entity {
            entity,
            id: id.to_string(),
            source: Box::new(err.into()),
        }
    }
}

/// Every failure collected from one fan-out, in completion order.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<SyncError>,
}

impl AggregateError {
    pub fn new(errors: Vec<SyncError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[SyncError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<SyncError> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} task(s) failed", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}
