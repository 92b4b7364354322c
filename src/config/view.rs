//! Per-view settings fixed at route registration.

/// Settings for one registered resource view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewConfig {
    /// Name of the detail route path parameter (`/users/:id`).
    pub id_param: String,
    /// Page size used when `pageSize` is not given.
    pub default_page_size: u64,
    /// Upper bound applied to `pageSize`.
    pub max_page_size: u64,
}

pub const DEFAULT_ID_PARAM: &str = "id";
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 1000;

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            id_param: DEFAULT_ID_PARAM.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl ViewConfig {
    pub fn with_id_param(mut self, id_param: impl Into<String>) -> Self {
        self.id_param = id_param.into();
        self
    }

    pub fn with_page_size(mut self, default_page_size: u64) -> Self {
        self.default_page_size = default_page_size.clamp(1, self.max_page_size);
        self
    }
}
