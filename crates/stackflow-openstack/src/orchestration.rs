//! Heat stack outputs

use crate::session::{Session, join_url, service};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use stackflow_core::Outcome;

#[derive(Debug, Deserialize)]
struct StackBody {
    stack: Stack,
}

#[derive(Debug, Deserialize)]
struct Stack {
    #[serde(default)]
    outputs: Option<Vec<StackOutput>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackOutput {
    pub output_key: String,
    #[serde(default)]
    pub output_value: Value,
}

/// Outputs of a stack as `output_key -> output_value`
///
/// `stack` may be a name or an id; Heat redirects a bare name to
/// `/stacks/{name}/{id}` and the redirect is followed.
pub async fn get_stack_outputs(session: &Session, stack: &str) -> crate::Result<Map<String, Value>> {
    let base_url = session.endpoint(service::ORCHESTRATION)?;
    let url = join_url(&base_url, &["stacks", stack])?;
    let request = session.request(Method::GET, url.as_str());

    let body: Option<StackBody> = session
        .send_json_optional(request, "Could not get stack")
        .await?;
    let body = body.ok_or_else(|| {
        crate::OpenStackError::NotFound(format!("Stack {} not found.", stack))
    })?;

    Ok(body
        .stack
        .outputs
        .unwrap_or_default()
        .into_iter()
        .map(|output| (output.output_key, output.output_value))
        .collect())
}

/// Read-only; never reports a change
///
/// Facts: `stack_outputs`.
pub async fn stack_outputs(session: &Session, stack: &str) -> stackflow_core::Result<Outcome> {
    let outputs = get_stack_outputs(session, stack).await?;
    Ok(Outcome::success(false).with_fact("stack_outputs", Value::Object(outputs)))
}
