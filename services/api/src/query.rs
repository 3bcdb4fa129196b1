//! Request-to-query compilation and paged execution
//!
//! Every list endpoint funnels through this module: the flat query-string
//! map of the request is compiled into a document-store query (filter,
//! projection, sort, pagination, optional reference expansion), executed,
//! and wrapped in the uniform paged envelope.
//!
//! Comparison filters arrive in bracket syntax (`tuition[lte]=10000`,
//! `careers[in]=Business,Other`). Recognized operator tokens are rewritten
//! into the store's `$`-sigil convention during a structured walk of the
//! parsed map; anything else stays a literal equality constraint.

use std::collections::HashMap;

use common::error::StoreResult;
use common::filter::SortKey;
use common::store::{FindOptions, MemoryStore, project};
use serde::Serialize;
use serde_json::{Map, Value};

/// Default page when the request names none (or a non-positive one)
pub const DEFAULT_PAGE: u64 = 1;

/// Default page size
pub const DEFAULT_LIMIT: u64 = 25;

/// Hard cap on the requested page size
pub const MAX_LIMIT: u64 = 100;

/// Query-string keys that steer the query rather than filter it
const CONTROL_KEYS: [&str; 4] = ["select", "sort", "page", "limit"];

/// Operator tokens rewritten into the store's comparison syntax
const COMPARISON_OPERATORS: [&str; 5] = ["gt", "gte", "lt", "lte", "in"];

/// Caller-supplied reference-expansion directive
///
/// Routes decide what gets expanded; the query string never does.
#[derive(Debug, Clone)]
pub struct Populate {
    /// Document field holding the referenced id
    pub field: String,
    /// Collection the reference points into
    pub collection: String,
    /// Sub-fields of the referenced document to include
    pub select: Vec<String>,
}

impl Populate {
    /// Expand `field` into the named collection, keeping `select` fields
    pub fn new(field: &str, collection: &str, select: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            collection: collection.to_string(),
            select: select.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Compiled form of a list request
#[derive(Debug, Clone)]
pub struct QuerySpec {
    /// Store filter in `$`-operator syntax
    pub filter: Value,
    /// Fields to return per document; empty means all
    pub projection: Vec<String>,
    /// Ordered sort keys
    pub sort: Vec<SortKey>,
    /// 1-based page number
    pub page: u64,
    /// Page size
    pub limit: u64,
    /// Optional reference expansion, supplied by the route
    pub populate: Option<Populate>,
}

impl QuerySpec {
    /// Attach a reference-expansion directive
    pub fn with_populate(mut self, populate: Populate) -> Self {
        self.populate = Some(populate);
        self
    }
}

/// One page of query results
#[derive(Debug)]
pub struct PageResult {
    pub items: Vec<Value>,
    pub total_count: u64,
    pub page: u64,
    pub limit: u64,
}

impl PageResult {
    /// Whether a later page exists
    pub fn has_next(&self) -> bool {
        self.page * self.limit < self.total_count
    }

    /// Whether an earlier page exists
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Pointer to an adjacent page
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PageLink {
    pub page: u64,
    pub limit: u64,
}

/// Adjacent-page pointers for the list envelope
#[derive(Debug, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

/// Uniform envelope returned by every list endpoint
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<Value>,
}

impl From<PageResult> for ListResponse {
    fn from(result: PageResult) -> Self {
        let next = result.has_next().then(|| PageLink {
            page: result.page + 1,
            limit: result.limit,
        });
        let prev = result.has_prev().then(|| PageLink {
            page: result.page - 1,
            limit: result.limit,
        });

        Self {
            success: true,
            count: result.items.len(),
            pagination: Pagination { next, prev },
            data: result.items,
        }
    }
}

/// Compile a raw query-string map into a QuerySpec
pub fn compile(raw: &HashMap<String, String>) -> QuerySpec {
    QuerySpec {
        filter: compile_filter(raw),
        projection: parse_projection(raw.get("select")),
        sort: parse_sort(raw.get("sort")),
        page: parse_positive(raw.get("page"), DEFAULT_PAGE),
        limit: parse_positive(raw.get("limit"), DEFAULT_LIMIT).min(MAX_LIMIT),
        populate: None,
    }
}

/// Execute a compiled query against a collection, producing one page
///
/// The total count reflects the filter only, never the pagination window
/// or the projection. Store failures propagate unchanged.
pub async fn execute(
    store: &MemoryStore,
    collection: &str,
    spec: &QuerySpec,
) -> StoreResult<PageResult> {
    let total_count = store.count(collection, &spec.filter).await?;

    let options = FindOptions {
        projection: spec.projection.clone(),
        sort: spec.sort.clone(),
        skip: ((spec.page - 1) * spec.limit) as usize,
        limit: Some(spec.limit as usize),
    };
    let mut items = store.find(collection, &spec.filter, &options).await?;

    if let Some(populate) = &spec.populate {
        for item in &mut items {
            expand_reference(store, populate, item).await?;
        }
    }

    Ok(PageResult {
        items,
        total_count,
        page: spec.page,
        limit: spec.limit,
    })
}

/// Expand a single document's reference field in place
///
/// The id value is replaced with the selected sub-fields of the referenced
/// document; a dangling reference becomes null.
pub async fn expand_reference(
    store: &MemoryStore,
    populate: &Populate,
    document: &mut Value,
) -> StoreResult<()> {
    let Some(fields) = document.as_object_mut() else {
        return Ok(());
    };
    let Some(reference) = fields
        .get(&populate.field)
        .and_then(Value::as_str)
        .map(String::from)
    else {
        return Ok(());
    };

    let expanded = match store.find_by_id(&populate.collection, &reference).await? {
        Some(referenced) => project(referenced, &populate.select),
        None => Value::Null,
    };
    fields.insert(populate.field.clone(), expanded);
    Ok(())
}

fn compile_filter(raw: &HashMap<String, String>) -> Value {
    let mut filter = Map::new();

    for (key, value) in raw {
        if CONTROL_KEYS.contains(&key.as_str()) {
            continue;
        }

        match split_bracket_key(key) {
            Some((field, token)) => {
                let entry = filter
                    .entry(field.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(conditions) = entry {
                    let (operator, operand) = rewrite_operator(token, value);
                    conditions.insert(operator, operand);
                }
            }
            None => {
                filter.insert(key.clone(), coerce_scalar(value));
            }
        }
    }

    Value::Object(filter)
}

/// Split `field[token]` keys; plain keys return None
fn split_bracket_key(key: &str) -> Option<(&str, &str)> {
    let (field, token) = key.strip_suffix(']')?.split_once('[')?;
    if field.is_empty() || token.is_empty() {
        return None;
    }
    Some((field, token))
}

/// Rewrite a recognized operator token into `$` syntax
///
/// Unrecognized tokens pass through unchanged as literal nested equality.
fn rewrite_operator(token: &str, value: &str) -> (String, Value) {
    if !COMPARISON_OPERATORS.contains(&token) {
        return (token.to_string(), coerce_scalar(value));
    }

    let operand = if token == "in" {
        Value::Array(
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(coerce_scalar)
                .collect(),
        )
    } else {
        coerce_scalar(value)
    };

    (format!("${token}"), operand)
}

/// Interpret a query-string scalar as a typed JSON value
fn coerce_scalar(raw: &str) -> Value {
    if let Ok(integer) = raw.parse::<i64>() {
        return Value::from(integer);
    }
    if let Ok(float) = raw.parse::<f64>() {
        return Value::from(float);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    }
}

fn parse_projection(raw: Option<&String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_sort(raw: Option<&String>) -> Vec<SortKey> {
    let default_sort = || vec![SortKey::descending("created_at")];

    let Some(raw) = raw else {
        return default_sort();
    };

    let keys: Vec<SortKey> = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "-")
        .map(|part| match part.strip_prefix('-') {
            Some(field) => SortKey::descending(field),
            None => SortKey::ascending(part),
        })
        .collect();

    if keys.is_empty() { default_sort() } else { keys }
}

fn parse_positive(raw: Option<&String>, default: u64) -> u64 {
    raw.and_then(|value| value.parse::<u64>().ok())
        .filter(|parsed| *parsed > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::filter::Direction;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn control_keys_never_reach_the_filter() {
        let spec = compile(&params(&[
            ("select", "name"),
            ("sort", "name"),
            ("page", "2"),
            ("limit", "5"),
            ("housing", "true"),
        ]));

        let filter = spec.filter.as_object().unwrap();
        assert_eq!(filter.len(), 1);
        assert!(filter.contains_key("housing"));
        for control in CONTROL_KEYS {
            assert!(!filter.contains_key(control));
        }
    }

    #[test]
    fn comparison_tokens_rewrite_to_sigil_operators() {
        let spec = compile(&params(&[("age[gt]", "18")]));
        assert_eq!(spec.filter["age"], json!({"$gt": 18}));
    }

    #[test]
    fn multiple_operators_on_one_field_merge() {
        let spec = compile(&params(&[
            ("average_cost[gte]", "1000"),
            ("average_cost[lte]", "10000"),
        ]));
        assert_eq!(
            spec.filter["average_cost"],
            json!({"$gte": 1000, "$lte": 10000})
        );
    }

    #[test]
    fn in_operator_splits_comma_separated_operands() {
        let spec = compile(&params(&[("careers[in]", "Business, Other")]));
        assert_eq!(spec.filter["careers"], json!({"$in": ["Business", "Other"]}));
    }

    #[test]
    fn unrecognized_bracket_token_stays_literal() {
        let spec = compile(&params(&[("meta[kind]", "x")]));
        assert_eq!(spec.filter["meta"], json!({"kind": "x"}));
    }

    #[test]
    fn scalar_values_coerce_to_their_natural_types() {
        let spec = compile(&params(&[
            ("housing", "true"),
            ("tuition", "9000"),
            ("rating", "4.5"),
            ("name", "Devworks"),
        ]));
        assert_eq!(spec.filter["housing"], json!(true));
        assert_eq!(spec.filter["tuition"], json!(9000));
        assert_eq!(spec.filter["rating"], json!(4.5));
        assert_eq!(spec.filter["name"], json!("Devworks"));
    }

    #[test]
    fn projection_parses_comma_separated_trimmed_fields() {
        let spec = compile(&params(&[("select", "name, description,,tuition ")]));
        assert_eq!(spec.projection, vec!["name", "description", "tuition"]);
    }

    #[test]
    fn sort_parses_directions_and_defaults_to_created_at_descending() {
        let spec = compile(&params(&[("sort", "name,-tuition")]));
        assert_eq!(spec.sort.len(), 2);
        assert_eq!(spec.sort[0].field, "name");
        assert_eq!(spec.sort[0].direction, Direction::Ascending);
        assert_eq!(spec.sort[1].field, "tuition");
        assert_eq!(spec.sort[1].direction, Direction::Descending);

        let default = compile(&params(&[]));
        assert_eq!(default.sort, vec![SortKey::descending("created_at")]);
    }

    #[test]
    fn page_and_limit_fall_back_to_defaults() {
        let defaults = compile(&params(&[]));
        assert_eq!(defaults.page, DEFAULT_PAGE);
        assert_eq!(defaults.limit, DEFAULT_LIMIT);

        let garbage = compile(&params(&[("page", "abc"), ("limit", "-3")]));
        assert_eq!(garbage.page, DEFAULT_PAGE);
        assert_eq!(garbage.limit, DEFAULT_LIMIT);

        let zero = compile(&params(&[("page", "0"), ("limit", "0")]));
        assert_eq!(zero.page, DEFAULT_PAGE);
        assert_eq!(zero.limit, DEFAULT_LIMIT);
    }

    #[test]
    fn limit_is_capped() {
        let spec = compile(&params(&[("limit", "5000")]));
        assert_eq!(spec.limit, MAX_LIMIT);
    }

    async fn seeded_store(count: usize) -> MemoryStore {
        let store = MemoryStore::new();
        store.register_collection("bootcamps").await;
        for n in 0..count {
            store
                .insert(
                    "bootcamps",
                    json!({"name": format!("b{n:02}"), "average_cost": n}),
                )
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn execute_windows_a_middle_page() {
        let store = seeded_store(25).await;
        let spec = compile(&params(&[("page", "2"), ("limit", "10"), ("sort", "name")]));

        let result = execute(&store, "bootcamps", &spec).await.unwrap();

        assert_eq!(result.items.len(), 10);
        assert_eq!(result.total_count, 25);
        assert!(result.has_next());
        assert!(result.has_prev());
        assert_eq!(result.items[0]["name"], "b10");
    }

    #[tokio::test]
    async fn execute_exact_fit_has_no_next_page() {
        let store = seeded_store(25).await;
        let spec = compile(&params(&[("page", "1"), ("limit", "25")]));

        let result = execute(&store, "bootcamps", &spec).await.unwrap();

        assert_eq!(result.items.len(), 25);
        assert!(!result.has_next());
        assert!(!result.has_prev());
    }

    #[tokio::test]
    async fn total_count_tracks_the_filter_not_the_window() {
        let store = seeded_store(20).await;
        let spec = compile(&params(&[
            ("average_cost[gte]", "10"),
            ("limit", "3"),
            ("select", "name"),
        ]));

        let result = execute(&store, "bootcamps", &spec).await.unwrap();

        assert_eq!(result.items.len(), 3);
        assert_eq!(result.total_count, 10);
        // Projection applies to items only.
        assert!(result.items[0].get("average_cost").is_none());
    }

    #[tokio::test]
    async fn envelope_carries_adjacent_page_links() {
        let store = seeded_store(25).await;
        let spec = compile(&params(&[("page", "2"), ("limit", "10")]));

        let response: ListResponse = execute(&store, "bootcamps", &spec).await.unwrap().into();

        assert!(response.success);
        assert_eq!(response.count, 10);
        assert_eq!(response.pagination.next, Some(PageLink { page: 3, limit: 10 }));
        assert_eq!(response.pagination.prev, Some(PageLink { page: 1, limit: 10 }));
    }

    #[tokio::test]
    async fn envelope_omits_absent_page_links() {
        let store = seeded_store(5).await;
        let spec = compile(&params(&[]));

        let response: ListResponse = execute(&store, "bootcamps", &spec).await.unwrap().into();
        let serialized = serde_json::to_value(&response).unwrap();

        assert_eq!(serialized["pagination"], json!({}));
    }

    #[tokio::test]
    async fn populate_expands_references_and_nulls_dangling_ones() {
        let store = MemoryStore::new();
        store.register_collection("bootcamps").await;
        store.register_collection("courses").await;

        let bootcamp = store
            .insert(
                "bootcamps",
                json!({"name": "Devworks", "description": "d", "phone": "123"}),
            )
            .await
            .unwrap();
        let bootcamp_id = bootcamp["id"].as_str().unwrap();

        store
            .insert(
                "courses",
                json!({"title": "linked", "bootcamp_id": bootcamp_id}),
            )
            .await
            .unwrap();
        store
            .insert(
                "courses",
                json!({"title": "dangling", "bootcamp_id": "missing"}),
            )
            .await
            .unwrap();

        let spec = compile(&params(&[("sort", "title")]))
            .with_populate(Populate::new("bootcamp_id", "bootcamps", &["name", "description"]));
        let result = execute(&store, "courses", &spec).await.unwrap();

        let dangling = &result.items[0];
        assert!(dangling["bootcamp_id"].is_null());

        let linked = &result.items[1];
        assert_eq!(linked["bootcamp_id"]["name"], "Devworks");
        assert_eq!(linked["bootcamp_id"]["description"], "d");
        // Only the selected sub-fields (plus id) come through.
        assert!(linked["bootcamp_id"].get("phone").is_none());
    }
}
