//! `live-catalog list`: every catalogued project, rendered as a table,
//! CSV, or JSON depending on `--format`.

use crate::cli::output::{OutputFormat, TableDisplay};
use crate::db::Catalog;
use crate::error::CatalogEngineError;
use crate::query::list_views;

pub fn run(catalog: &Catalog, format: OutputFormat) -> Result<String, CatalogEngineError> {
    let views = list_views(catalog)?;
    views
        .render(format)
        .map_err(|e| CatalogEngineError::Config(e.to_string()))
}
