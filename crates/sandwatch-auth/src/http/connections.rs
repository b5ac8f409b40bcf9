/*
[INPUT]:  Provider name and optional task label
[OUTPUT]: Raw JSON returned by the social-connection endpoints
[POS]:    HTTP layer - playground profile endpoints (bearer auth when available)
[UPDATE]: When adding new connection providers or query parameters
*/

// ### Connection Endpoints

use reqwest::Method;

use crate::http::{Result, SandwatchClient};
use crate::types::ConnectionProvider;

impl SandwatchClient {
    /// Start linking a social account
    ///
    /// GET /connections/{provider}?task={task}
    pub async fn connect_account(
        &self,
        provider: ConnectionProvider,
        task: Option<&str>,
    ) -> Result<serde_json::Value> {
        let endpoint = format!("connections/{}", provider.as_str());
        let mut builder = self.request(Method::GET, &endpoint)?;
        if let Some(task) = task {
            builder = builder.query(&[("task", task)]);
        }
        self.send_json(builder).await
    }
}
