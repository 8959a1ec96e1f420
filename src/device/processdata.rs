//! Process-data request and response bodies (`/api/v1/processdata`).
//!
//! Values are returned as the device reports them; unit conversion and
//! channel mapping belong to the caller.

use serde::{Deserialize, Serialize};

/// One module and the process-data ids to read from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleQuery {
    #[serde(rename = "moduleid")]
    pub module_id: String,
    #[serde(rename = "processdataids")]
    pub processdata_ids: Vec<String>,
}

impl ModuleQuery {
    pub fn new(module_id: impl Into<String>, ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            module_id: module_id.into(),
            processdata_ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse `devices:local/Dc_P,Home_P`.
    ///
    /// Module ids contain `:`, so the last `/` separates module and ids.
    pub fn parse(selector: &str) -> Option<Self> {
        let (module, ids) = selector.rsplit_once('/')?;
        let module = module.trim();
        let ids: Vec<String> = ids
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(String::from)
            .collect();

        if module.is_empty() || ids.is_empty() {
            return None;
        }
        Some(Self {
            module_id: module.to_string(),
            processdata_ids: ids,
        })
    }
}

/// Values returned for one module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleValues {
    #[serde(rename = "moduleid")]
    pub module_id: String,
    #[serde(rename = "processdata")]
    pub values: Vec<ProcessValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessValue {
    pub id: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_selector_with_colon_module() {
        let query = ModuleQuery::parse("devices:local/Dc_P, Home_P").unwrap();
        assert_eq!(query.module_id, "devices:local");
        assert_eq!(query.processdata_ids, vec!["Dc_P", "Home_P"]);
    }

    #[test]
    fn parse_selector_rejects_incomplete() {
        assert!(ModuleQuery::parse("devices:local").is_none());
        assert!(ModuleQuery::parse("devices:local/").is_none());
        assert!(ModuleQuery::parse("/Dc_P").is_none());
        assert!(ModuleQuery::parse("devices:local/ , ").is_none());
    }

    #[test]
    fn request_body_shape() {
        let body = vec![ModuleQuery::new("devices:local:pv1", ["P", "U"])];
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!([{"moduleid": "devices:local:pv1", "processdataids": ["P", "U"]}])
        );
    }

    #[test]
    fn response_body_shape() {
        let json = r#"[{"moduleid":"devices:local","processdata":[
            {"id":"Dc_P","unit":"W","value":1532.5},
            {"id":"Home_P","value":410}
        ]}]"#;
        let modules: Vec<ModuleValues> = serde_json::from_str(json).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].values[0].unit.as_deref(), Some("W"));
        assert_eq!(modules[0].values[1].value, 410.0);
        assert_eq!(modules[0].values[1].unit, None);
    }
}
