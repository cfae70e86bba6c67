//! Project record providers.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ChatResult;
use crate::types::ProjectRecord;

/// Supplies the project record a conversation is about.
///
/// `Ok(None)` means there is no such project, which is a valid input to the
/// context builder.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectProvider: Send + Sync {
    async fn project(&self, project_id: &str) -> ChatResult<Option<ProjectRecord>>;
}

/// Serves one record regardless of the requested id
#[derive(Debug, Clone, Default)]
pub struct FixedProject {
    record: Option<ProjectRecord>,
}

impl FixedProject {
    pub fn new(record: ProjectRecord) -> Self {
        Self {
            record: Some(record),
        }
    }

    /// Provider that never has a project
    pub fn none() -> Self {
        Self { record: None }
    }
}

#[async_trait]
impl ProjectProvider for FixedProject {
    async fn project(&self, _project_id: &str) -> ChatResult<Option<ProjectRecord>> {
        Ok(self.record.clone())
    }
}

/// Projects loaded from a JSON file holding one record or an array of them
#[derive(Debug, Clone, Default)]
pub struct JsonProjects {
    records: Vec<ProjectRecord>,
}

impl JsonProjects {
    /// Load records from a file
    pub fn load(path: &Path) -> ChatResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse records from JSON text
    pub fn parse(content: &str) -> ChatResult<Self> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        let records = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            vec![serde_json::from_value(value)?]
        };
        Ok(Self { records })
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    /// Id of the first record, used when the caller names none
    pub fn default_id(&self) -> Option<&str> {
        self.records.first().and_then(|r| r.id.as_deref())
    }
}

#[async_trait]
impl ProjectProvider for JsonProjects {
    async fn project(&self, project_id: &str) -> ChatResult<Option<ProjectRecord>> {
        if let [only] = self.records.as_slice() {
            if only.id.is_none() {
                return Ok(Some(only.clone()));
            }
        }
        Ok(self
            .records
            .iter()
            .find(|r| r.id.as_deref() == Some(project_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fixed_project() {
        let provider = FixedProject::new(ProjectRecord::titled("Atlas"));
        let record = provider.project("anything").await.unwrap().unwrap();
        assert_eq!(record.title, "Atlas");

        assert!(FixedProject::none().project("x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_projects_array() {
        let provider = JsonProjects::parse(
            r#"[{"id":"p1","title":"Atlas"},{"id":"p2","title":"Beacon","tagNames":["iot"]}]"#,
        )
        .unwrap();

        assert_eq!(provider.default_id(), Some("p1"));
        let beacon = provider.project("p2").await.unwrap().unwrap();
        assert_eq!(beacon.title, "Beacon");
        assert!(provider.project("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_json_single_record_without_id() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("project.json");
        std::fs::write(&path, r#"{"title":"Solo","creatorName":"Kim"}"#).unwrap();

        let provider = JsonProjects::load(&path).unwrap();
        assert_eq!(provider.records().len(), 1);
        let record = provider.project("whatever").await.unwrap().unwrap();
        assert_eq!(record.creator_name.as_deref(), Some("Kim"));
    }

    #[test]
    fn test_json_projects_invalid() {
        assert!(JsonProjects::parse("[1, 2]").is_err());
    }
}
