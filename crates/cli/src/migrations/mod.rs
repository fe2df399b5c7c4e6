//! Migration units of the blog schema
//!
//! New units are generated by `inkpost make-migration` and must be added to
//! `all()` by hand; registration order does not matter.

use inkpost_db::Migration;
use std::sync::Arc;

mod m20250322_123456;

/// Every migration unit compiled into this binary
pub fn all() -> Vec<Arc<dyn Migration>> {
    vec![Arc::new(m20250322_123456::M20250322123456)]
}
