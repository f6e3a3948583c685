//! Project-specific utilities live here.

use time::OffsetDateTime;

/// Current UTC instant; every store timestamp goes through here.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Calendar year used as the upper bound for `publishedYear`.
pub fn current_year() -> i32 {
    now().year()
}
