use crate::core::format::display_value;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Values available to status message templates.
///
/// `{param}`, `{count}` and `{error}` are filled directly. `{meta.<field>}`
/// reads a wrapper metadata field and falls back to the parameter when the
/// field is absent. Unknown placeholders are left as written.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateVars<'a> {
    pub param: Option<&'a str>,
    pub count: Option<usize>,
    pub error: Option<&'a str>,
    pub metadata: Option<&'a Map<String, Value>>,
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{([A-Za-z_][A-Za-z0-9_.]*)\}").expect("placeholder pattern is valid")
    })
}

pub fn fill(template: &str, vars: &TemplateVars<'_>) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            let value = match name {
                "param" => vars.param.map(str::to_string),
                "count" => vars.count.map(|c| c.to_string()),
                "error" => vars.error.map(str::to_string),
                _ => name.strip_prefix("meta.").map(|field| {
                    vars.metadata
                        .and_then(|meta| meta.get(field))
                        .filter(|v| !v.is_null())
                        .map(|v| display_value(Some(v)))
                        .unwrap_or_else(|| vars.param.unwrap_or_default().to_string())
                }),
            };
            value.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_basic_placeholders() {
        let vars = TemplateVars {
            param: Some("Laptop"),
            count: Some(12),
            ..Default::default()
        };
        assert_eq!(
            fill("Se encontraron {count} registros de precios para: {param}", &vars),
            "Se encontraron 12 registros de precios para: Laptop"
        );
    }

    #[test]
    fn test_meta_falls_back_to_param() {
        let mut meta = Map::new();
        meta.insert("numero_documento".to_string(), json!("CC1001"));
        let with_meta = TemplateVars {
            param: Some("cc1001"),
            metadata: Some(&meta),
            ..Default::default()
        };
        assert_eq!(
            fill("Reporte para documento: {meta.numero_documento}", &with_meta),
            "Reporte para documento: CC1001"
        );

        let without_meta = TemplateVars {
            param: Some("cc1001"),
            ..Default::default()
        };
        assert_eq!(
            fill("Reporte para documento: {meta.numero_documento}", &without_meta),
            "Reporte para documento: cc1001"
        );
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let vars = TemplateVars::default();
        assert_eq!(fill("{count} of {other}", &vars), "{count} of {other}");
        assert_eq!(fill("no placeholders", &vars), "no placeholders");
    }
}
