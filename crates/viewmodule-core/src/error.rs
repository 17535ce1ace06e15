use thiserror::Error;

use crate::property::PropertyName;

pub type Result<T> = std::result::Result<T, GraphError>;

/// Construction-time failures. A view-model whose graph fails to build must
/// not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("cyclic dependency: {}", format_path(path))]
    CyclicDependency { path: Vec<PropertyName> },

    #[error("property `{property}` is declared more than once")]
    DuplicateProperty { property: PropertyName },

    #[error("`{dependent}` depends on undeclared property `{missing}`")]
    UnknownProperty {
        dependent: PropertyName,
        missing: PropertyName,
    },

    #[error("command depends on undeclared property `{property}`")]
    UnknownCommandDependency { property: PropertyName },
}

impl GraphError {
    /// The cycle, if this is a [`GraphError::CyclicDependency`].
    #[must_use]
    pub fn cycle(&self) -> Option<&[PropertyName]> {
        match self {
            Self::CyclicDependency { path } => Some(path),
            _ => None,
        }
    }
}

fn format_path(path: &[PropertyName]) -> String {
    path.iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
