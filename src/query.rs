//! Query projection (C10): a plain, serializable view over a catalogued
//! project plus its joined plugins and samples — the same shape the
//! original HTTP endpoint returned, reused here as a local function the
//! CLI renders instead of serving over a socket.

use serde::Serialize;
use uuid::Uuid;

use crate::db::Catalog;
use crate::error::CatalogError;
use crate::project::Project;

#[derive(Debug, Serialize)]
pub struct PluginRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct SampleRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub plugins: Vec<PluginRef>,
    pub samples: Vec<SampleRef>,
}

/// Joins a single project with its plugins and samples.
pub fn project_view(catalog: &Catalog, identifier: i64) -> Result<Option<ProjectView>, CatalogError> {
    let Some(project) = catalog.get_project(identifier)? else {
        return Ok(None);
    };
    Ok(Some(build_view(catalog, project)?))
}

/// Every catalogued project, each joined with its plugins and samples.
pub fn list_views(catalog: &Catalog) -> Result<Vec<ProjectView>, CatalogError> {
    catalog
        .list_projects()?
        .into_iter()
        .map(|project| build_view(catalog, project))
        .collect()
}

fn build_view(catalog: &Catalog, project: Project) -> Result<ProjectView, CatalogError> {
    let plugins = catalog
        .plugins_for_project(project.identifier)?
        .into_iter()
        .map(|p| PluginRef {
            id: p.id,
            name: p.name,
        })
        .collect();
    let samples = catalog
        .samples_for_project(project.identifier)?
        .into_iter()
        .map(|s| SampleRef {
            id: s.id,
            name: s.name,
        })
        .collect();
    Ok(ProjectView {
        project,
        plugins,
        samples,
    })
}
