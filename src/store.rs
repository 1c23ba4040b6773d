//! Durable request storage on sled

use std::sync::Arc;

use sled::Db;

use crate::error::ApprovalError;
use crate::request::Request;

/// Requests are stored CBOR-encoded under their id. Updates go through
/// `compare_and_swap` against the bytes the caller read, so two simultaneous
/// actions on the same request cannot both get past the same state guard.
pub struct RequestStore {
    db: Arc<Db>,
}

impl RequestStore {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Persist a freshly submitted request. Refuses to overwrite an existing
    /// id.
    pub fn insert_new(&self, request: &Request) -> anyhow::Result<()> {
        let encoded = minicbor::to_vec(request)?;
        self.db
            .compare_and_swap(request.request_id.as_bytes(), None::<&[u8]>, Some(encoded))?
            .map_err(|_| anyhow::anyhow!("request id {} already exists", request.request_id))?;
        self.db.flush()?;
        Ok(())
    }

    pub fn load(&self, request_id: &str) -> anyhow::Result<Request> {
        self.load_raw(request_id).map(|(request, _)| request)
    }

    /// Load a request together with its stored encoding, for a later
    /// `replace`.
    pub fn load_raw(&self, request_id: &str) -> anyhow::Result<(Request, Vec<u8>)> {
        let bytes = self
            .db
            .get(request_id.as_bytes())?
            .ok_or_else(|| ApprovalError::NotFound(request_id.to_string()))?;
        let request = minicbor::decode(&bytes[..])?;
        Ok((request, bytes.to_vec()))
    }

    /// Swap the stored record for `request`, provided it still holds `prev`.
    /// A lost race surfaces as `ConcurrentUpdate`; the caller re-reads and
    /// re-applies its guard if it wants to retry.
    pub fn replace(&self, prev: &[u8], request: &Request) -> anyhow::Result<()> {
        let encoded = minicbor::to_vec(request)?;
        self.db
            .compare_and_swap(request.request_id.as_bytes(), Some(prev), Some(encoded))?
            .map_err(|_| ApprovalError::ConcurrentUpdate(request.request_id.clone()))?;
        self.db.flush()?;
        Ok(())
    }
}
