//! Uniform response envelope for catalog reads.

use serde::{Deserialize, Serialize};

use crate::source::{RowRecord, SourceError};

pub const DETAILS_FROM_SOURCE: &str = "data obtained directly from source";
pub const DETAILS_FROM_CACHE: &str = "data obtained from cache";

/// `{status, details, data}` returned by both the cache and the source path.
///
/// Only `data` is ever cached; `status` and `details` are rebuilt per read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
  pub status: u16,
  pub details: String,
  pub data: Vec<RowRecord>,
}

impl ResponseEnvelope {
  pub fn from_source(data: Vec<RowRecord>) -> Self {
    Self {
      status: 200,
      details: DETAILS_FROM_SOURCE.to_string(),
      data,
    }
  }

  pub fn from_cache(data: Vec<RowRecord>) -> Self {
    Self {
      status: 200,
      details: DETAILS_FROM_CACHE.to_string(),
      data,
    }
  }

  /// Error envelope carrying the failure's status and message.
  pub fn from_error(err: &SourceError) -> Self {
    Self {
      status: err.status_code(),
      details: err.to_string(),
      data: Vec::new(),
    }
  }
}
