//! Feed configuration and responsive page sizing

use serde::{Deserialize, Serialize};

use crate::{FeedError, FeedResult};

/// Grid column count used from `min_width_px` upward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub min_width_px: u32,
    pub columns: usize,
}

/// Configuration for the coin feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Grid rows fetched per page
    pub rows_per_page: usize,

    /// Columns assumed while the viewport width is unknown
    pub default_columns: usize,

    /// Width breakpoints, ascending
    pub breakpoints: Vec<Breakpoint>,

    /// Distance below the viewport at which the sentinel counts as visible
    pub lookahead_margin_px: f64,

    /// Share of the sentinel that must be inside the margin
    pub visibility_threshold: f64,

    /// Newest coins first
    pub sort_desc: bool,

    /// Keep the full id list for the session
    pub id_cache_enabled: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            rows_per_page: 4,
            default_columns: 5,
            breakpoints: vec![
                Breakpoint { min_width_px: 0, columns: 2 },
                Breakpoint { min_width_px: 480, columns: 3 },
                Breakpoint { min_width_px: 768, columns: 4 },
                Breakpoint { min_width_px: 992, columns: 5 },
            ],
            lookahead_margin_px: 100.0,
            visibility_threshold: 0.1,
            sort_desc: true,
            id_cache_enabled: true,
        }
    }
}

impl FeedConfig {
    /// Grid columns for a viewport `width_px` wide
    pub fn columns_for_width(&self, width_px: u32) -> usize {
        self.breakpoints
            .iter()
            .rev()
            .find(|bp| bp.min_width_px <= width_px)
            .map(|bp| bp.columns)
            .unwrap_or(self.default_columns)
    }

    /// Items per page for a grid with `columns` columns
    ///
    /// An unknown column count uses `default_columns` so the first page is
    /// never under-fetched.
    pub fn page_size_for(&self, columns: Option<usize>) -> usize {
        columns.unwrap_or(self.default_columns).max(1) * self.rows_per_page
    }

    pub fn page_size_for_width(&self, width_px: Option<u32>) -> usize {
        self.page_size_for(width_px.map(|w| self.columns_for_width(w)))
    }

    /// Validate the configuration
    pub fn validate(&self) -> FeedResult<()> {
        if self.rows_per_page == 0 {
            return Err(FeedError::InvalidConfig(
                "rows_per_page must be greater than 0".to_string(),
            ));
        }

        if self.default_columns == 0 {
            return Err(FeedError::InvalidConfig(
                "default_columns must be greater than 0".to_string(),
            ));
        }

        if self.breakpoints.iter().any(|bp| bp.columns == 0) {
            return Err(FeedError::InvalidConfig(
                "breakpoint columns must be greater than 0".to_string(),
            ));
        }

        if self
            .breakpoints
            .windows(2)
            .any(|pair| pair[0].min_width_px >= pair[1].min_width_px)
        {
            return Err(FeedError::InvalidConfig(
                "breakpoints must be in ascending width order".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(FeedError::InvalidConfig(format!(
                "visibility_threshold must be within [0, 1], got {}",
                self.visibility_threshold
            )));
        }

        if self.lookahead_margin_px < 0.0 {
            return Err(FeedError::InvalidConfig(
                "lookahead_margin_px must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}
