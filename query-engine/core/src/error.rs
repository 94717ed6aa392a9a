use serde::Serialize;
use thiserror::Error;

pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    #[error("{0}")]
    QueryParserError(String),

    #[error("Unknown field '{field}' in select on type '{tpe}'")]
    UnknownField { field: String, tpe: String },

    #[error("Unknown type '{0}'")]
    UnknownType(String),

    #[error("{0}")]
    ElaborationError(String),

    #[error("Introspection is disabled")]
    IntrospectionDisabled,

    #[error("No root mapping for field '{0}'")]
    MissingRootMapping(String),

    #[error("No field mapping for field '{field}' of type '{tpe}'")]
    MissingFieldMapping { field: String, tpe: String },

    #[error("Cursor attribute '{attribute}' of type '{tpe}' is not available")]
    MissingAttribute { attribute: String, tpe: String },

    #[error("Expected a single result for field '{field}', found {found}")]
    UniqueViolation { field: String, found: usize },

    #[error("{0}")]
    InterpreterError(String),

    #[error("Error in connector: {0}")]
    ConnectorError(String),
}

impl CoreError {
    pub fn kind(&self) -> ProblemKind {
        match self {
            CoreError::QueryParserError(_)
            | CoreError::UnknownField { .. }
            | CoreError::UnknownType(_)
            | CoreError::ElaborationError(_)
            | CoreError::IntrospectionDisabled => ProblemKind::Compile,
            CoreError::ConnectorError(_) => ProblemKind::Connector,
            _ => ProblemKind::Runtime,
        }
    }

    pub fn elaboration(message: impl Into<String>) -> Self {
        CoreError::ElaborationError(message.into())
    }

    pub fn interpreter(message: impl Into<String>) -> Self {
        CoreError::InterpreterError(message.into())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemKind {
    Compile,
    Runtime,
    Connector,
}

/// A user facing error, reported in the `errors` member of a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Problem {
    pub message: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,

    #[serde(skip)]
    pub kind: ProblemKind,
}

impl Problem {
    pub fn new(message: impl Into<String>, kind: ProblemKind) -> Self {
        Problem {
            message: message.into(),
            path: Vec::new(),
            kind,
        }
    }

    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = path;
        self
    }
}

impl From<CoreError> for Problem {
    fn from(err: CoreError) -> Self {
        Problem::new(err.to_string(), err.kind())
    }
}

/// The result of a computation which accumulates problems and may still carry
/// a (partial) value alongside them.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: Option<T>,
    pub problems: Vec<Problem>,
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Outcome {
            value: Some(value),
            problems: Vec::new(),
        }
    }

    pub fn failure(problem: impl Into<Problem>) -> Self {
        Outcome {
            value: None,
            problems: vec![problem.into()],
        }
    }

    /// A value with problems attached to it.
    pub fn partial(value: T, problems: Vec<Problem>) -> Self {
        Outcome {
            value: Some(value),
            problems,
        }
    }

    pub fn is_success(&self) -> bool {
        self.value.is_some() && self.problems.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: self.value.map(f),
            problems: self.problems,
        }
    }

    /// Sequences a dependent computation. Problems of `self` come first. No
    /// value means the computation is not run.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self.value {
            Some(value) => {
                let mut next = f(value);
                let mut problems = self.problems;
                problems.append(&mut next.problems);

                Outcome {
                    value: next.value,
                    problems,
                }
            }
            None => Outcome {
                value: None,
                problems: self.problems,
            },
        }
    }

    /// Combines two independent outcomes, keeping the problems of both.
    pub fn zip<U>(self, other: Outcome<U>) -> Outcome<(T, U)> {
        let mut problems = self.problems;
        problems.extend(other.problems);

        Outcome {
            value: self.value.zip(other.value),
            problems,
        }
    }

    pub fn push_problem(&mut self, problem: impl Into<Problem>) {
        self.problems.push(problem.into());
    }

    pub fn into_result(self) -> Result<T, Vec<Problem>> {
        match self.value {
            Some(value) if self.problems.is_empty() => Ok(value),
            _ => Err(self.problems),
        }
    }
}

impl<T> From<CoreResult<T>> for Outcome<T> {
    fn from(result: CoreResult<T>) -> Self {
        match result {
            Ok(value) => Outcome::success(value),
            Err(err) => Outcome::failure(err),
        }
    }
}

/// Collects independent outcomes. The value is present only if every member
/// produced one.
impl<T> FromIterator<Outcome<T>> for Outcome<Vec<T>> {
    fn from_iter<I: IntoIterator<Item = Outcome<T>>>(iter: I) -> Self {
        let mut values = Some(Vec::new());
        let mut problems = Vec::new();

        for outcome in iter {
            problems.extend(outcome.problems);

            match (values.as_mut(), outcome.value) {
                (Some(values), Some(value)) => values.push(value),
                _ => values = None,
            }
        }

        Outcome { value: values, problems }
    }
}
