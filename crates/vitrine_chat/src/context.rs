//! Project context injected into every assistant request.

use crate::types::ProjectRecord;

/// Returned when there is no project record
pub const NO_PROJECT_CONTEXT: &str = "No project information available.";

pub const UNTITLED_PLACEHOLDER: &str = "Untitled project";
pub const NO_DESCRIPTION_PLACEHOLDER: &str = "No description provided";
pub const UNKNOWN_CREATOR_PLACEHOLDER: &str = "Unknown creator";
pub const NO_TAGS_PLACEHOLDER: &str = "No tags";

const TAG_DELIMITER: &str = ", ";

/// Render a project record as the flattened context text.
///
/// Total and deterministic: missing or blank fields fall back to fixed
/// placeholders.
pub fn build_context(project: Option<&ProjectRecord>) -> String {
    let Some(project) = project else {
        return NO_PROJECT_CONTEXT.to_string();
    };

    let title = non_blank(Some(project.title.as_str())).unwrap_or(UNTITLED_PLACEHOLDER);
    let description =
        non_blank(project.description.as_deref()).unwrap_or(NO_DESCRIPTION_PLACEHOLDER);
    let creator =
        non_blank(project.creator_name.as_deref()).unwrap_or(UNKNOWN_CREATOR_PLACEHOLDER);

    let tags: Vec<&str> = project
        .tag_names
        .iter()
        .flatten()
        .filter_map(|t| non_blank(Some(t.as_str())))
        .collect();
    let tags = if tags.is_empty() {
        NO_TAGS_PLACEHOLDER.to_string()
    } else {
        tags.join(TAG_DELIMITER)
    };

    [
        format!("Project title: {}", title),
        format!("Description: {}", description),
        format!("Creator: {}", creator),
        format!("Tags: {}", tags),
    ]
    .join("\n")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
