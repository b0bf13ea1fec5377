//! Vector store inspection (admin, read-only).

use std::fmt;

use super::{load_failed, Outcome};
use crate::client::ResourceClient;
use crate::models::{User, VectorStoreResponse};
use crate::routing::Route;

#[derive(Debug)]
pub struct VectorStoreView {
    data: VectorStoreResponse,
}

impl VectorStoreView {
    /// Non-admins are sent home before any call; the server would refuse them anyway.
    pub async fn load(client: &ResourceClient, user: &User) -> Outcome<Self> {
        if !user.is_admin() {
            return Outcome::Redirect(Route::Home);
        }
        match client.vector_store().await {
            Ok(data) => Outcome::Ready(Self { data }),
            Err(e) => load_failed(&e, client.credentials(), &Route::VectorStore),
        }
    }

    pub fn data(&self) -> &VectorStoreResponse {
        &self.data
    }
}

impl fmt::Display for VectorStoreView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Collection: {}", self.data.collection_name)?;
        writeln!(f, "Total embeddings: {}", self.data.total_embeddings)?;
        writeln!(f)?;
        if self.data.recent.is_empty() {
            return writeln!(f, "No embeddings yet.");
        }
        writeln!(f, "Recent chunks")?;
        for chunk in &self.data.recent {
            if chunk.metadata.is_empty() {
                writeln!(f, "- {}", chunk.id)?;
            } else {
                let metadata = serde_json::Value::Object(chunk.metadata.clone());
                writeln!(f, "- {} | {}", chunk.id, metadata)?;
            }
            let preview = if chunk.document_preview.is_empty() {
                "(empty)"
            } else {
                chunk.document_preview.as_str()
            };
            writeln!(f, "  {}", preview)?;
        }
        Ok(())
    }
}
