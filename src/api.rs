use crate::error::ApiError;
use crate::filter::FilterValues;
use crate::models::{Action, Curiosity, Note, RecordKind, Records, Summary, Todo};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Thin client over the planner REST API. One instance is shared for the
/// whole session.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct NotesBody {
    #[serde(default)]
    notes: Vec<Note>,
}

#[derive(Deserialize)]
struct TodosBody {
    #[serde(default)]
    todos: Vec<Todo>,
}

#[derive(Deserialize)]
struct ActionsBody {
    #[serde(default)]
    actions: Vec<Action>,
}

#[derive(Deserialize)]
struct CuriositiesBody {
    #[serde(default)]
    curiosities: Vec<Curiosity>,
}

#[derive(Deserialize)]
struct DetailBody {
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct NotebooksBody {
    #[serde(default)]
    notebooks: Vec<String>,
}

#[derive(Deserialize)]
struct NotebookBody {
    #[serde(default)]
    notebook: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ApiClient {
        ApiClient {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        kind: RecordKind,
        filter: &FilterValues,
        limit: usize,
    ) -> Result<T, ApiError> {
        let url = format!("{}/api/{}/", self.base_url, kind.path());
        let params = filter.query_params(kind, limit);
        debug!(%url, ?params, "fetching {}", kind.path());

        let res = self.http.get(&url).query(&params).send().await?;
        read_body(res).await
    }

    pub async fn fetch_notes(&self, filter: &FilterValues, limit: usize) -> Result<Vec<Note>, ApiError> {
        let body: NotesBody = self.get_list(RecordKind::Notes, filter, limit).await?;
        Ok(body.notes)
    }

    /// The flat todo list; see [`crate::tree::build_forest`] for the hierarchy.
    pub async fn fetch_todos(&self, filter: &FilterValues, limit: usize) -> Result<Vec<Todo>, ApiError> {
        let body: TodosBody = self.get_list(RecordKind::Todos, filter, limit).await?;
        Ok(body.todos)
    }

    pub async fn fetch_actions(&self, filter: &FilterValues, limit: usize) -> Result<Vec<Action>, ApiError> {
        let body: ActionsBody = self.get_list(RecordKind::Actions, filter, limit).await?;
        Ok(body.actions)
    }

    pub async fn fetch_curiosities(
        &self,
        filter: &FilterValues,
        limit: usize,
    ) -> Result<Vec<Curiosity>, ApiError> {
        let body: CuriositiesBody = self.get_list(RecordKind::Curiosities, filter, limit).await?;
        Ok(body.curiosities)
    }

    pub async fn fetch_records(
        &self,
        kind: RecordKind,
        filter: &FilterValues,
        limit: usize,
    ) -> Result<Records, ApiError> {
        Ok(match kind {
            RecordKind::Notes => Records::Notes(self.fetch_notes(filter, limit).await?),
            RecordKind::Todos => Records::Todos(self.fetch_todos(filter, limit).await?),
            RecordKind::Actions => Records::Actions(self.fetch_actions(filter, limit).await?),
            RecordKind::Curiosities => {
                Records::Curiosities(self.fetch_curiosities(filter, limit).await?)
            }
        })
    }

    /// The `data` object of a single record, as the backend renders it.
    pub async fn fetch_detail(&self, kind: RecordKind, id: u64) -> Result<Value, ApiError> {
        let url = format!("{}/api/{}/{}", self.base_url, kind.path(), id);
        debug!(%url, "fetching detail");

        let res = self.http.get(&url).send().await?;
        let body: DetailBody = read_body(res).await?;
        Ok(body.data.unwrap_or_else(|| json!({})))
    }

    pub async fn create_note(&self, note_text: &str) -> Result<Note, ApiError> {
        let url = format!("{}/api/notes/", self.base_url);
        debug!(%url, len = note_text.len(), "creating note");

        let res = self
            .http
            .post(&url)
            .json(&json!({ "data": { "note": note_text } }))
            .send()
            .await?;
        read_body(res).await
    }

    pub async fn submit_query(&self, prompt: &str) -> Result<Summary, ApiError> {
        let url = format!("{}/api/summaries/query", self.base_url);
        debug!(%url, "submitting query");

        let res = self.http.get(&url).query(&[("prompt", prompt)]).send().await?;
        read_body(res).await
    }

    pub async fn list_notebooks(&self) -> Result<Vec<String>, ApiError> {
        let url = format!("{}/api/notebooks/", self.base_url);
        let res = self.http.get(&url).send().await?;
        let body: NotebooksBody = read_body(res).await?;
        Ok(body.notebooks)
    }

    pub async fn active_notebook(&self) -> Result<String, ApiError> {
        let url = format!("{}/api/notebooks/active", self.base_url);
        let res = self.http.get(&url).send().await?;
        let body: NotebookBody = read_body(res).await?;
        Ok(body.notebook.unwrap_or_else(|| "default".to_string()))
    }

    pub async fn set_active_notebook(&self, notebook: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/notebooks/active", self.base_url);
        self.post_notebook(&url, notebook).await
    }

    pub async fn create_notebook(&self, notebook: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/notebooks/", self.base_url);
        self.post_notebook(&url, notebook).await
    }

    async fn post_notebook(&self, url: &str, notebook: &str) -> Result<String, ApiError> {
        debug!(%url, notebook, "posting notebook");
        let res = self
            .http
            .post(url)
            .json(&json!({ "notebook": notebook }))
            .send()
            .await?;
        let body: NotebookBody = read_body(res).await?;
        Ok(body.notebook.unwrap_or_else(|| notebook.to_string()))
    }
}

async fn read_body<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
    let status = res.status().as_u16();
    let bytes = res.bytes().await?;
    decode_body(status, &bytes)
}

/// Applies the backend's envelope rules: any `error` field is a failure,
/// whatever the status code.
pub fn decode_body<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ApiError> {
    let success = (200..300).contains(&status);
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) if !success => return Err(ApiError::Status { status }),
        Err(err) => return Err(err.into()),
    };

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        warn!(status, error = message, "backend reported an error");
        return Err(ApiError::Server {
            status,
            message: message.to_string(),
        });
    }
    if !success {
        return Err(ApiError::Status { status });
    }

    Ok(serde_json::from_value(value)?)
}
