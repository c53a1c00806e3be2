use std::sync::Arc;

use crate::analyze::AnalyzeClient;
use crate::config::Config;
use crate::domain::ChartStyle;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyze_client: Arc<AnalyzeClient>,
}

impl AppState {
    pub fn new(config: Config, analyze_client: AnalyzeClient) -> Self {
        Self {
            config: Arc::new(config),
            analyze_client: Arc::new(analyze_client),
        }
    }

    /// Chart style for this deployment
    #[must_use]
    pub fn chart_style(&self) -> ChartStyle {
        ChartStyle::with_label_format(self.config.chart_label_format.clone())
    }
}
