use crate::error::{Error, Result};

const MAX_NAMESPACE_NAME_LEN: usize = 64;
const MAX_PROJECT_NAME_LEN: usize = 100;

/// Gitea's limit on repository names, prefix included.
const MAX_REPOSITORY_NAME_LEN: usize = 100;

fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

fn validate_name(name: &str, entity: &str, max_len: usize) -> Result<()> {
    if name.len() > max_len {
        return Err(Error::InvalidRequest(format!(
            "{entity} name cannot exceed {max_len} characters"
        )));
    }
    if name.starts_with('.') {
        return Err(Error::InvalidRequest(format!(
            "{entity} name cannot start with a period"
        )));
    }
    if !name.chars().all(is_valid_name_char) {
        return Err(Error::InvalidRequest(format!(
            "{entity} name can only contain alphanumeric characters, hyphens, underscores, and periods"
        )));
    }
    Ok(())
}

/// A project is required and becomes part of repository and token names.
pub fn validate_project(project: &str) -> Result<()> {
    if project.is_empty() {
        return Err(Error::InvalidRequest(
            "project name cannot be empty".to_string(),
        ));
    }
    validate_name(project, "Project", MAX_PROJECT_NAME_LEN)
}

/// Checks the derived repository name, which carries the configured prefix.
pub fn validate_repository_name(name: &str) -> Result<()> {
    if name.len() > MAX_REPOSITORY_NAME_LEN {
        return Err(Error::InvalidRequest(format!(
            "repository name {name:?} exceeds {MAX_REPOSITORY_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// An empty namespace is allowed and resolves to the default one.
pub fn validate_namespace(namespace: &str) -> Result<()> {
    validate_name(namespace, "Namespace", MAX_NAMESPACE_NAME_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_project() {
        assert!(validate_project("some-keptn-project").is_ok());
        assert!(validate_project("v1.2_test").is_ok());
        assert!(matches!(validate_project(""), Err(Error::InvalidRequest(_))));
        assert!(matches!(validate_project("a/b"), Err(Error::InvalidRequest(_))));
        assert!(matches!(validate_project(".."), Err(Error::InvalidRequest(_))));
        assert!(matches!(
            validate_project(&"x".repeat(MAX_PROJECT_NAME_LEN + 1)),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_repository_name() {
        assert!(validate_repository_name(&"x".repeat(MAX_REPOSITORY_NAME_LEN)).is_ok());
        assert!(matches!(
            validate_repository_name(&"x".repeat(MAX_REPOSITORY_NAME_LEN + 1)),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_namespace() {
        assert!(validate_namespace("").is_ok());
        assert!(validate_namespace("team-a").is_ok());
        assert!(matches!(
            validate_namespace("team a"),
            Err(Error::InvalidRequest(_))
        ));
    }
}
