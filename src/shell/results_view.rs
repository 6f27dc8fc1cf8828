use serde_json::Value;

/// Presentation mode for the result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultView {
    #[default]
    Cards,
    Table,
}

/// View state for the results page: cards/table toggle plus a bounded
/// preview of the record set. Rendering itself is out of scope; the CLI
/// and any embedder consume the selection.
#[derive(Debug, Clone)]
pub struct ResultsView {
    pub view: ResultView,
    preview_limit: usize,
}

impl Default for ResultsView {
    fn default() -> Self {
        Self {
            view: ResultView::Cards,
            preview_limit: 20,
        }
    }
}

impl ResultsView {
    pub fn toggle(&mut self) {
        self.view = match self.view {
            ResultView::Cards => ResultView::Table,
            ResultView::Table => ResultView::Cards,
        };
    }

    /// First `preview_limit` records of the set.
    pub fn preview<'a>(&self, records: &'a [Value]) -> &'a [Value] {
        &records[..records.len().min(self.preview_limit)]
    }

    /// Column headers derived from the first record's keys.
    pub fn headers(records: &[Value]) -> Vec<String> {
        records
            .first()
            .and_then(Value::as_object)
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count_label(total: u64) -> String {
        format!("{total} leads found")
    }
}
