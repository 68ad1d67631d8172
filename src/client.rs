use crate::catalog::{
    self, Operation, DELETE_RELATIONAL_TABLE_DATA, INSERT_UPDATE_RELATIONAL_TABLE,
};
use crate::config::Config;
use crate::dispatch::build_request;
use crate::errors::{ApiError, ResultExt};
use crate::transport::{OAuthTransport, Transport};
use crate::value::{Args, Value};
use crate::xml::{parse_response, ApiResponse};

/// Client for the Silverpop / IBM Marketing Cloud XML API.
///
/// Every operation goes through [`SilverpopClient::invoke`]: the catalog
/// record drives argument validation and request building, the transport
/// delivers the document, and the response is normalized into an
/// [`ApiResponse`]. Remote rejections come back as [`ApiError::Fault`].
pub struct SilverpopClient<T: Transport = OAuthTransport> {
    transport: T,
}

impl SilverpopClient<OAuthTransport> {
    /// Creates a client backed by [`OAuthTransport`].
    ///
    /// # Arguments
    ///
    /// * `config` - OAuth credentials, pod number or base URL, and timeout.
    ///
    /// # Returns
    ///
    /// * `Result<Self, ApiError>` - The client, or `ApiError::Transport` if the
    ///   HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Ok(Self::with_transport(OAuthTransport::new(config)?))
    }
}

impl<T: Transport> SilverpopClient<T> {
    /// Creates a client over any [`Transport`], e.g. a test double.
    ///
    /// # Arguments
    ///
    /// * `transport` - Delivers request documents and returns response bodies.
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds, sends and normalizes one operation.
    ///
    /// Argument errors are raised before anything is sent.
    ///
    /// # Arguments
    ///
    /// * `op` - The catalog record describing the command.
    /// * `args` - Caller arguments; unset optionals take the record's defaults.
    ///
    /// # Returns
    ///
    /// * `Result<ApiResponse, ApiError>` - The normalized `RESULT`, or
    ///   `ApiError::Fault` when the service answers `SUCCESS=false`.
    pub async fn invoke(&self, op: &Operation, args: Args) -> Result<ApiResponse, ApiError> {
        let xml = build_request(op, &args)?;
        tracing::info!("Invoking {} ({})", op.name, op.command);
        tracing::debug!("{} request: {}", op.command, xml);

        let body = match self.transport.post(&xml).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("{} request failed: {}", op.command, e);
                return Err::<ApiResponse, _>(e).context(format!("{} request failed", op.command));
            }
        };

        match parse_response(&body) {
            Ok(response) => Ok(response),
            Err(ApiError::Fault(fault)) => {
                tracing::warn!("{} rejected: {}", op.command, fault);
                Err(ApiError::Fault(fault))
            }
            Err(e) => {
                tracing::error!("Failed to parse {} response: {}", op.command, e);
                Err::<ApiResponse, _>(e)
                    .with_context(|| format!("parsing {} response", op.command))
            }
        }
    }

    /// Looks up an operation by name (or command) and invokes it.
    ///
    /// # Arguments
    ///
    /// * `name` - Catalog name (`get_lists`) or command (`GetLists`).
    /// * `args` - Caller arguments.
    ///
    /// # Returns
    ///
    /// * `Result<ApiResponse, ApiError>` - As [`SilverpopClient::invoke`], or
    ///   `ApiError::UnknownOperation` if no record matches.
    pub async fn call(&self, name: &str, args: Args) -> Result<ApiResponse, ApiError> {
        let op = catalog::lookup(name)
            .ok_or_else(|| ApiError::UnknownOperation(name.to_string()))?;
        self.invoke(op, args).await
    }

    /// Inserts or updates rows of a relational table.
    ///
    /// # Arguments
    ///
    /// * `table_id` - The relational table ID.
    /// * `rows` - One map per row; each entry becomes a `COLUMN name="..."`.
    ///
    /// # Returns
    ///
    /// * `Result<ApiResponse, ApiError>` - The normalized response.
    pub async fn insert_update_relational_table(
        &self,
        table_id: impl Into<Value>,
        rows: Vec<Value>,
    ) -> Result<ApiResponse, ApiError> {
        let args = Args::new().set("table_id", table_id).set("rows", rows);
        self.invoke(&INSERT_UPDATE_RELATIONAL_TABLE, args).await
    }

    /// Deletes relational table rows matched by their key columns.
    ///
    /// # Arguments
    ///
    /// * `table_id` - The relational table ID.
    /// * `rows` - One map of key column values per row to delete.
    ///
    /// # Returns
    ///
    /// * `Result<ApiResponse, ApiError>` - The normalized response.
    pub async fn delete_relational_table_data(
        &self,
        table_id: impl Into<Value>,
        rows: Vec<Value>,
    ) -> Result<ApiResponse, ApiError> {
        let args = Args::new().set("table_id", table_id).set("rows", rows);
        self.invoke(&DELETE_RELATIONAL_TABLE_DATA, args).await
    }
}
