//! Output rendering: the same `comfy-table`/CSV/JSON trio the original CLI
//! renders its tables with, pared down to the one view type this crate
//! actually projects.

use comfy_table::{Cell, Table};

use crate::query::ProjectView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Renders a collection of rows in whichever format the caller asked for.
pub trait TableDisplay {
    fn to_table(&self) -> Table;
    fn to_csv(&self) -> Result<String, csv::Error>;

    fn render(&self, format: OutputFormat) -> Result<String, RenderError>
    where
        Self: serde::Serialize,
    {
        match format {
            OutputFormat::Table => Ok(self.to_table().to_string()),
            OutputFormat::Csv => Ok(self.to_csv()?),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("csv rendering failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("json rendering failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl TableDisplay for Vec<ProjectView> {
    fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Name", "Tempo", "Key", "Time Sig", "Plugins", "Samples"]);
        for view in self {
            table.add_row(vec![
                Cell::new(&view.project.name),
                Cell::new(
                    view.project
                        .tempo
                        .map(|t| format!("{t:.1}"))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::new(view.project.key.clone().unwrap_or_else(|| "-".to_string())),
                Cell::new(
                    view.project
                        .time_signature
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::new(view.plugins.len()),
                Cell::new(view.samples.len()),
            ]);
        }
        table
    }

    fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["name", "tempo", "key", "time_signature", "plugins", "samples"])?;
        for view in self {
            writer.write_record(&[
                view.project.name.clone(),
                view.project.tempo.map(|t| t.to_string()).unwrap_or_default(),
                view.project.key.clone().unwrap_or_default(),
                view.project
                    .time_signature
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                view.plugins.len().to_string(),
                view.samples.len().to_string(),
            ])?;
        }
        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
