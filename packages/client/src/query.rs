//! Server-side filtering of one class.
//!
//! A [`Query`] carries a filter document and paging options. Running it
//! through [`Client::find`](crate::Client::find) fills either `results` or,
//! for a count query, only `size`.

use serde_json::Value;

use crate::error::Result;
use crate::protocol::{self, keys, ApiRequest};
use crate::query_builder::QueryBuilder;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    class_name: String,
    path: String,
    filter: Option<Value>,
    limit: u32,
    skip: u32,
    keys: Option<String>,
    order: Option<String>,
    include: Option<String>,
    count: bool,
    results: Vec<Record>,
    size: usize,
}

impl Query {
    pub fn new(class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        let path = protocol::class_path(&class_name);
        Self {
            class_name,
            path,
            filter: None,
            limit: 0,
            skip: 0,
            keys: None,
            order: None,
            include: None,
            count: false,
            results: Vec::new(),
            size: 0,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Resource path the query is sent to.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_where(&mut self, builder: &QueryBuilder) -> &mut Self {
        self.filter = Some(builder.build_json());
        self
    }

    pub fn set_where_json(&mut self, filter: Value) -> &mut Self {
        self.filter = Some(filter);
        self
    }

    pub fn clear_where(&mut self) -> &mut Self {
        self.filter = None;
        self
    }

    pub fn where_json(&self) -> Option<&Value> {
        self.filter.as_ref()
    }

    /// Maximum number of results; 0 leaves it to the server.
    pub fn set_limit(&mut self, limit: u32) -> &mut Self {
        self.limit = limit;
        self
    }

    pub fn set_skip(&mut self, skip: u32) -> &mut Self {
        self.skip = skip;
        self
    }

    /// Restrict returned fields to a comma-separated list.
    pub fn set_keys(&mut self, keys: impl Into<String>) -> &mut Self {
        let keys = keys.into();
        self.keys = (!keys.is_empty()).then_some(keys);
        self
    }

    /// Sort order such as `-score,name`.
    pub fn set_order(&mut self, order: impl Into<String>) -> &mut Self {
        let order = order.into();
        self.order = (!order.is_empty()).then_some(order);
        self
    }

    /// Pointer fields to expand in each result, comma-separated.
    pub fn set_include(&mut self, include: impl Into<String>) -> &mut Self {
        let include = include.into();
        self.include = (!include.is_empty()).then_some(include);
        self
    }

    /// Ask only for the number of matches.
    pub fn set_count(&mut self, count: bool) -> &mut Self {
        self.count = count;
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn skip(&self) -> u32 {
        self.skip
    }

    pub fn is_count(&self) -> bool {
        self.count
    }

    pub fn results(&self) -> &[Record] {
        &self.results
    }

    pub fn result(&self, index: usize) -> Option<&Record> {
        self.results.get(index)
    }

    /// Hand the materialized records to the caller, leaving the query empty.
    pub fn take_results(&mut self) -> Vec<Record> {
        self.size = 0;
        std::mem::take(&mut self.results)
    }

    /// Number of matches from the last `find`.
    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn to_request(&self) -> ApiRequest {
        let mut request = ApiRequest::get(self.path.as_str());
        if let Some(filter) = &self.filter {
            request = request.param("where", filter.to_string());
        }
        if self.limit > 0 {
            request = request.param("limit", self.limit.to_string());
        }
        if self.skip > 0 {
            request = request.param("skip", self.skip.to_string());
        }
        if let Some(keys) = &self.keys {
            request = request.param("keys", keys.as_str());
        }
        if let Some(order) = &self.order {
            request = request.param("order", order.as_str());
        }
        if let Some(include) = &self.include {
            request = request.param("include", include.as_str());
        }
        if self.count {
            request = request.param(keys::COUNT, "1");
        }
        request
    }

    pub(crate) fn apply_response(&mut self, response: &Value) -> Result<()> {
        if self.count {
            let size: u64 = serde_json::from_value(
                response.get(keys::COUNT).cloned().unwrap_or(Value::Null),
            )?;
            self.results.clear();
            self.size = size as usize;
            return Ok(());
        }

        let documents: Vec<Value> = serde_json::from_value(
            response.get(keys::RESULTS).cloned().unwrap_or(Value::Null),
        )?;
        self.results = documents
            .iter()
            .map(|document| Record::from_class_and_data(self.class_name.as_str(), document))
            .collect();
        self.size = self.results.len();
        log::debug!("{} results for {}", self.size, self.class_name);
        Ok(())
    }
}
