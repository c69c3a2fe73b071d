/// Sidebar navigation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Database,
    Analysis,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Database => "SQL Database",
            Tab::Analysis => "Swing Analysis",
        }
    }
}

/// Target of the delete confirmation modal.
#[derive(Debug, Clone)]
pub struct PendingDelete {
    pub id: String,
    pub name: String,
}

/// Form state and outcome of the analysis panel. `in_flight` drives the
/// loading skeleton; at most one of `result`/`error` is set afterwards.
#[derive(Debug, Default)]
pub struct AnalysisPanel {
    pub notes: String,
    pub incident_id: String,
    pub in_flight: bool,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl AnalysisPanel {
    pub fn can_submit(&self) -> bool {
        !self.in_flight && !self.notes.trim().is_empty()
    }

    pub fn begin(&mut self) {
        self.in_flight = true;
        self.result = None;
        self.error = None;
    }

    pub fn finish(&mut self, outcome: Result<String, String>) {
        self.in_flight = false;
        match outcome {
            Ok(analysis) => self.result = Some(analysis),
            Err(message) => self.error = Some(message),
        }
    }
}

/// Everything the UI keeps between frames that is not registry data.
#[derive(Debug, Default)]
pub struct ViewState {
    pub tab: Tab,
    pub pending_delete: Option<PendingDelete>,
    /// How many directly dropped files were skipped as non-PDF.
    pub rejected_notice: Option<usize>,
    pub analysis: AnalysisPanel,
}
