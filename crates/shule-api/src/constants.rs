/// Versioned API path prefix.
pub const API_PREFIX: &str = "/api/v1";

/// Header carrying the caller's school selection when they belong to more
/// than one school.
pub const SCHOOL_HINT_HEADER: &str = "x-school-id";
