use crate::{Outcome, Problem};
use serde_json::Value as Json;

/// A GraphQL response document: `{ "data": ..., "errors": [...] }`.
#[derive(Debug, serde::Serialize, Default, PartialEq)]
pub struct GQLResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Json>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<Problem>,
}

impl GQLResponse {
    pub fn data(&self) -> Option<&Json> {
        self.data.as_ref()
    }

    pub fn errors(&self) -> &[Problem] {
        &self.errors
    }

    pub fn insert_error(&mut self, error: impl Into<Problem>) {
        self.errors.push(error.into());
    }

    pub fn into_json(self) -> Json {
        serde_json::to_value(self).unwrap_or(Json::Null)
    }
}

impl From<Outcome<Json>> for GQLResponse {
    fn from(outcome: Outcome<Json>) -> Self {
        GQLResponse {
            data: outcome.value,
            errors: outcome.problems,
        }
    }
}

impl From<Problem> for GQLResponse {
    fn from(problem: Problem) -> Self {
        let mut response = GQLResponse::default();
        response.insert_error(problem);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CoreError, ProblemKind};
    use serde_json::json;

    #[test]
    fn partial_responses_carry_data_and_errors() {
        let problem = Problem::new("boom", ProblemKind::Runtime).with_path(vec!["country".into()]);
        let response = GQLResponse::from(Outcome::partial(json!({ "country": null }), vec![problem]));

        assert_eq!(
            response.into_json(),
            json!({
                "data": { "country": null },
                "errors": [{ "message": "boom", "path": ["country"] }],
            })
        );
    }

    #[test]
    fn failed_compiles_have_no_data_member() {
        let response = GQLResponse::from(Problem::from(CoreError::IntrospectionDisabled));

        assert_eq!(
            response.into_json(),
            json!({ "errors": [{ "message": "Introspection is disabled" }] })
        );
    }
}
