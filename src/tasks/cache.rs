//! Caching implementations for catalog types.

use crate::cache::Cacheable;
use crate::source::RowRecord;

impl Cacheable for Vec<RowRecord> {
  fn entity_type() -> &'static str {
    "row_records"
  }

  // The source never yields an empty catalog, so an empty entry is damage.
  fn is_vacant(&self) -> bool {
    self.is_empty()
  }
}
