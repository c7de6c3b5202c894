//! View pipeline: filter → normalize → smooth, plus the performance summary.
//!
//! The view is built from the window-filtered table; the summary is always
//! computed from the unfiltered table so every lookback sees full history.

use crate::config::ViewConfig;
use crate::domain::{PriceTable, TimeIndex};
use crate::performance::{compute_performance, PerformanceRecord};
use crate::transform::{
    filter_window, normalize_to_instrument, normalize_to_reference_point, smooth, TransformError,
};

/// Apply `config` to `table` in the fixed stage order.
pub fn build_view<T: TimeIndex>(
    table: &PriceTable<T>,
    config: &ViewConfig,
) -> Result<PriceTable<T>, TransformError> {
    let mut view = filter_window(table, &config.window);

    if let Some(policy) = config.reference_point() {
        view = normalize_to_reference_point(&view, policy);
    }
    if let Some(reference) = &config.reference_instrument {
        view = normalize_to_instrument(&view, reference)?;
    }
    if let Some(window) = config.smoothing_window {
        view = smooth(&view, window)?;
    }

    tracing::debug!(
        window = %config.window,
        rows = view.len(),
        columns = view.width(),
        "built price view"
    );

    Ok(match &config.instruments {
        Some(selected) => view.select(selected),
        None => view,
    })
}

/// Everything the display layer needs for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard<T> {
    pub view: PriceTable<T>,
    pub performance: PerformanceRecord<T>,
}

impl<T: TimeIndex> Dashboard<T> {
    /// No instruments selected; the display shows a notice instead.
    pub fn is_empty_selection(&self) -> bool {
        self.view.instruments().is_empty()
    }
}

/// The price view plus trailing performance over `windows` for the
/// displayed instruments.
pub fn build_dashboard<T, S>(
    table: &PriceTable<T>,
    config: &ViewConfig,
    windows: &[S],
) -> Result<Dashboard<T>, TransformError>
where
    T: TimeIndex,
    S: AsRef<str>,
{
    let view = build_view(table, config)?;
    let source = match &config.instruments {
        Some(selected) => table.select(selected),
        None => table.clone(),
    };
    let performance = compute_performance(&source, windows);
    Ok(Dashboard { view, performance })
}
