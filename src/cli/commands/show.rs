//! `live-catalog show <identifier>`: a single project's full detail,
//! including its joined plugins and samples.

use crate::cli::output::{OutputFormat, TableDisplay};
use crate::db::Catalog;
use crate::error::CatalogEngineError;
use crate::query::project_view;

pub fn run(catalog: &Catalog, identifier: i64, format: OutputFormat) -> Result<String, CatalogEngineError> {
    match project_view(catalog, identifier)? {
        Some(view) => match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&view)
                .map_err(|e| CatalogEngineError::Config(e.to_string()))?),
            OutputFormat::Csv => Ok(vec![view]
                .to_csv()
                .map_err(|e| CatalogEngineError::Config(e.to_string()))?),
            OutputFormat::Table => Ok(format!(
                "{}\n  tempo: {:?}\n  key: {:?}\n  time signature: {:?}\n  plugins: {}\n  samples: {}",
                view.project.name,
                view.project.tempo,
                view.project.key,
                view.project.time_signature,
                view.plugins.len(),
                view.samples.len(),
            )),
        },
        None => Ok(format!("no project with identifier {identifier}")),
    }
}
