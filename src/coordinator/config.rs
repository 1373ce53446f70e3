use serde::Deserialize;

/// Retry limits of the coordinators.
///
/// Each limit counts retries after the first attempt, so an operation is
/// submitted at most `1 + limit` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub max_put_retries: u32,
    pub max_remove_retries: u32,
    pub max_confirm_retries: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_put_retries: 3,
            max_remove_retries: 3,
            max_confirm_retries: 3,
        }
    }
}

impl CoordinatorConfig {
    pub fn with_put_retries(mut self, retries: u32) -> Self {
        self.max_put_retries = retries;
        self
    }

    pub fn with_remove_retries(mut self, retries: u32) -> Self {
        self.max_remove_retries = retries;
        self
    }

    pub fn with_confirm_retries(mut self, retries: u32) -> Self {
        self.max_confirm_retries = retries;
        self
    }
}
