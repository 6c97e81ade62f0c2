//! 错误类型

use crate::element::{ElementId, ElementKind};
use thiserror::Error;

/// 元素图操作错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("element {0} not found")]
    NotFound(ElementId),

    #[error("element {element} depends on missing element {dependency}")]
    MissingDependency {
        element: ElementId,
        dependency: ElementId,
    },

    #[error("element {0} depends on itself")]
    SelfDependency(ElementId),

    #[error("dependency list of element {0} does not match its definition")]
    DependencyMismatch(ElementId),

    #[error("element id {0} already exists")]
    DuplicateId(ElementId),

    #[error("element {0} is not a free point")]
    NotFree(ElementId),
}

/// 单个元素重算失败的原因
///
/// 对外接口把它折叠成 `None`，只在日志中保留细节。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComputeError {
    #[error("dependency {0} cannot be resolved")]
    MissingDependency(ElementId),

    #[error("element {id} should be a {expected}, found {found}")]
    WrongKind {
        id: ElementId,
        expected: ElementKind,
        found: ElementKind,
    },

    #[error("degenerate configuration: {0}")]
    Degenerate(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FunctionError {
    #[error("cannot parse expression: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
