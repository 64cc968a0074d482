//! Validates query parameters, routes to a registered index by
//! dimensionality, runs the kNN search, and formats the response.

use std::sync::Arc;

use sfc_index::{Point, Point2, Registry};

use crate::error::RequestError;
use crate::format::{self, Format};
use crate::http::WebRequest;

const DEFAULT_NO: usize = 1;
const DEFAULT_FMT: &str = "json";

pub struct Work {
    registry: Arc<Registry>,
    fields: Vec<String>,
}

impl Work {
    pub fn new(registry: Arc<Registry>, fields: Vec<String>) -> Self {
        Self { registry, fields }
    }

    pub fn dispatch(&self, req: &WebRequest) -> Result<(String, &'static str), RequestError> {
        let index = req.query_param("index").ok_or(RequestError::MissingParam("index"))?;
        let x = parse_param(req, "x")?;
        let y = parse_param(req, "y")?;
        let z = match req.query_param("z") {
            Some(v) => Some(v.parse::<i64>().map_err(|_| RequestError::InvalidParam("z"))?),
            None => None,
        };
        let no: usize = match req.query_param("no") {
            Some(v) => v.parse().map_err(|_| RequestError::InvalidParam("no"))?,
            None => DEFAULT_NO,
        };
        let fmt = Format::parse(req.query_param("fmt").unwrap_or(DEFAULT_FMT))?;

        let rows = match z {
            Some(zc) => {
                let data = self
                    .registry
                    .get_3d(index)
                    .ok_or_else(|| RequestError::UnknownIndex(index.to_string()))?;
                data.get_nn(&Point::<3>::new([x, y, zc]), no, 0.0)?
            }
            None => {
                let data = self
                    .registry
                    .get_2d(index)
                    .ok_or_else(|| RequestError::UnknownIndex(index.to_string()))?;
                data.get_nn(&Point2::new([x, y]), no, 0.0)?
            }
        };

        Ok(format::render(fmt, &self.fields, rows)?)
    }
}

fn parse_param(req: &WebRequest, name: &'static str) -> Result<i64, RequestError> {
    req.query_param(name)
        .ok_or(RequestError::MissingParam(name))?
        .parse()
        .map_err(|_| RequestError::InvalidParam(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfc_index::PointData;
    use std::collections::HashMap;

    fn request(query: &[(&str, &str)]) -> WebRequest {
        WebRequest {
            method: "GET".to_string(),
            path: vec![],
            query: query.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            headers: HashMap::new(),
            body: vec![],
        }
    }

    fn sample_registry() -> Arc<Registry> {
        let mut pd: PointData<2> = PointData::new();
        for (x, y) in [(0, 0), (10, 10), (5, 5)] {
            pd.add(Point2::new([x, y]), vec![format!("{x}-{y}")]).unwrap();
        }
        pd.lock().unwrap();
        let mut reg = Registry::new();
        reg.insert_2d("foo", pd).unwrap();
        Arc::new(reg)
    }

    #[test]
    fn end_to_end_scenario_returns_exact_match_first() {
        let work = Work::new(sample_registry(), vec!["label".to_string()]);
        let req = request(&[("index", "foo"), ("x", "5"), ("y", "5"), ("no", "2"), ("fmt", "json")]);
        let (body, content_type) = work.dispatch(&req).unwrap();
        assert_eq!(content_type, "application/json");
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["result"][0]["dist"], 0);
        assert_eq!(parsed["result"][0]["fields"]["label"], "5-5");
    }

    #[test]
    fn missing_index_param_is_rejected() {
        let work = Work::new(sample_registry(), vec!["label".to_string()]);
        let req = request(&[("x", "5"), ("y", "5")]);
        assert!(matches!(work.dispatch(&req), Err(RequestError::MissingParam("index"))));
    }

    #[test]
    fn unknown_index_yields_unknown_index_error() {
        let work = Work::new(sample_registry(), vec!["label".to_string()]);
        let req = request(&[("index", "bar"), ("x", "0"), ("y", "0")]);
        assert!(matches!(work.dispatch(&req), Err(RequestError::UnknownIndex(_))));
    }

    #[test]
    fn unreadable_coordinate_is_invalid_param() {
        let work = Work::new(sample_registry(), vec!["label".to_string()]);
        let req = request(&[("index", "foo"), ("x", "nope"), ("y", "0")]);
        assert!(matches!(work.dispatch(&req), Err(RequestError::InvalidParam("x"))));
    }
}
