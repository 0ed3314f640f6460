use crate::core::controller::HEALTH_ACTION;
use crate::core::format::{ColumnFormat, ColumnFormats, Locale};
use crate::core::paginator::DEFAULT_PAGE_SIZE;
use crate::utils::error::{Result, ViewerError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_INITIAL_STATUS: &str = "Seleccione una operación para comenzar";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub viewer: ViewerSection,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerSection {
    pub proxy_base: String,
    pub page_size: Option<usize>,
    pub timeout_seconds: Option<u64>,
    pub locale: Option<String>,
    pub initial_status: Option<String>,
    pub no_results_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_path")]
    pub path: String,
    #[serde(default = "default_health_loading")]
    pub loading: String,
    #[serde(default = "default_health_success")]
    pub success: String,
    #[serde(default = "default_health_error")]
    pub error: String,
}

fn default_health_path() -> String {
    "health".to_string()
}

fn default_health_loading() -> String {
    "Verificando estado de la API...".to_string()
}

fn default_health_success() -> String {
    "API funcionando correctamente".to_string()
}

fn default_health_error() -> String {
    "Error al verificar estado de la API: {error}".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: default_health_path(),
            loading: default_health_loading(),
            success: default_health_success(),
            error: default_health_error(),
        }
    }
}

/// How an action obtains its single path parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ParameterSpec {
    #[default]
    None,
    /// Free text, trimmed and percent-encoded into the path.
    Text { field: String },
    /// One identifier from a fixed set (e.g. a table name).
    Choice { field: String, options: Vec<String> },
}

impl ParameterSpec {
    pub fn field(&self) -> Option<&str> {
        match self {
            ParameterSpec::None => None,
            ParameterSpec::Text { field } | ParameterSpec::Choice { field, .. } => Some(field),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointMessages {
    #[serde(default = "default_loading")]
    pub loading: String,
    #[serde(default = "default_success")]
    pub success: String,
    #[serde(default = "default_empty")]
    pub empty: String,
    #[serde(default = "default_error")]
    pub error: String,
}

fn default_loading() -> String {
    "Cargando datos...".to_string()
}

fn default_success() -> String {
    "Se encontraron {count} registros".to_string()
}

fn default_empty() -> String {
    "No se encontraron datos".to_string()
}

fn default_error() -> String {
    "Error al consultar datos: {error}".to_string()
}

impl Default for EndpointMessages {
    fn default() -> Self {
        Self {
            loading: default_loading(),
            success: default_success(),
            empty: default_empty(),
            error: default_error(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub label: Option<String>,
    /// Literal segment(s) after the proxy base, e.g. `factura_db/historial_precio`.
    pub path: String,
    #[serde(default)]
    pub parameter: ParameterSpec,
    /// Wrapper fields known to hold the rows, checked in order.
    #[serde(default)]
    pub array_fields: Vec<String>,
    /// Fixed column order; when absent columns come from the first row.
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub formats: HashMap<String, ColumnFormat>,
    /// Legacy name-based formatting (`fecha` -> date, `precio` -> currency)
    /// for columns missing from `formats`.
    #[serde(default)]
    pub infer_formats: bool,
    #[serde(default)]
    pub messages: EndpointMessages,
    #[serde(default)]
    pub status_fallbacks: HashMap<String, String>,
}

impl EndpointConfig {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            path: path.into(),
            parameter: ParameterSpec::None,
            array_fields: Vec::new(),
            columns: None,
            formats: HashMap::new(),
            infer_formats: false,
            messages: EndpointMessages::default(),
            status_fallbacks: HashMap::new(),
        }
    }

    pub fn column_formats(&self) -> ColumnFormats {
        ColumnFormats::new(self.formats.clone(), self.infer_formats)
    }

    /// `<base>/<path>[/<parameter>]`, the parameter percent-encoded as a
    /// single path segment.
    pub fn request_url(&self, base: &Url, parameter: Option<&str>) -> Result<Url> {
        build_url(base, &self.path, parameter)
    }
}

pub fn build_url(base: &Url, path: &str, parameter: Option<&str>) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().map_err(|_| ViewerError::ConfigError {
            message: format!("proxy base '{}' cannot carry a path", base),
        })?;
        segments.pop_if_empty();
        segments.extend(path.split('/').filter(|s| !s.is_empty()));
        if let Some(parameter) = parameter {
            validation::validate_path_segment("parameter", parameter)?;
            segments.push(parameter);
        }
    }
    Ok(url)
}

impl ViewerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ViewerError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ViewerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PROXY_BASE})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ViewerError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn proxy_base(&self) -> Result<Url> {
        validation::validate_url("viewer.proxy_base", &self.viewer.proxy_base)?;
        Url::parse(&self.viewer.proxy_base).map_err(|e| ViewerError::InvalidConfigValueError {
            field: "viewer.proxy_base".to_string(),
            value: self.viewer.proxy_base.clone(),
            reason: e.to_string(),
        })
    }

    pub fn page_size(&self) -> usize {
        self.viewer.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.viewer.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn locale(&self) -> Result<Locale> {
        self.viewer
            .locale
            .as_deref()
            .map(str::parse)
            .unwrap_or(Ok(Locale::default()))
    }

    pub fn initial_status(&self) -> &str {
        self.viewer
            .initial_status
            .as_deref()
            .unwrap_or(DEFAULT_INITIAL_STATUS)
    }

    pub fn endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

impl Validate for ViewerConfig {
    fn validate(&self) -> Result<()> {
        self.proxy_base()?;

        if let Some(page_size) = self.viewer.page_size {
            validation::validate_positive_number("viewer.page_size", page_size, 1)?;
        }
        if let Some(timeout) = self.viewer.timeout_seconds {
            validation::validate_positive_number("viewer.timeout_seconds", timeout, 1u64)?;
        }
        self.locale()?;

        validation::validate_unique_names(
            "endpoints.name",
            self.endpoints.iter().map(|e| e.name.as_str()),
        )?;

        for endpoint in &self.endpoints {
            if endpoint.name == HEALTH_ACTION {
                return Err(ViewerError::InvalidConfigValueError {
                    field: "endpoints.name".to_string(),
                    value: endpoint.name.clone(),
                    reason: "Reserved for the built-in health check".to_string(),
                });
            }
            endpoint.validate()?;
        }
        Ok(())
    }
}

impl Validate for EndpointConfig {
    fn validate(&self) -> Result<()> {
        let field = format!("endpoints.{}", self.name);
        if self.name.trim().is_empty() {
            return Err(ViewerError::MissingConfigError {
                field: "endpoints.name".to_string(),
            });
        }
        if self.path.trim_matches('/').is_empty() {
            return Err(ViewerError::MissingConfigError {
                field: format!("{}.path", field),
            });
        }
        if let ParameterSpec::Choice { options, .. } = &self.parameter {
            if options.is_empty() {
                return Err(ViewerError::InvalidConfigValueError {
                    field: format!("{}.parameter.options", field),
                    value: "[]".to_string(),
                    reason: "A choice parameter needs at least one option".to_string(),
                });
            }
        }
        for code in self.status_fallbacks.keys() {
            if code.parse::<u16>().map(|c| !(100..600).contains(&c)).unwrap_or(true) {
                return Err(ViewerError::InvalidConfigValueError {
                    field: format!("{}.status_fallbacks", field),
                    value: code.clone(),
                    reason: "Keys must be HTTP status codes".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[viewer]
proxy_base = "http://localhost:5000/api"
page_size = 50
locale = "es-ES"

[[endpoints]]
name = "historial_precio"
path = "factura_db/historial_precio"
parameter = { kind = "text", field = "nombreProducto" }
infer_formats = true

[endpoints.formats]
fecha_compra = "date"

[endpoints.messages]
success = "Se encontraron {count} registros de precios para: {param}"

[endpoints.status_fallbacks]
404 = "Producto no encontrado"

[[endpoints]]
name = "tabla_productos"
path = "factura_db/tabla_productos"
parameter = { kind = "choice", field = "tablaProducto", options = ["producto", "factura"] }
"#;

    #[test]
    fn test_parse_sample() {
        let config = ViewerConfig::from_toml_str(SAMPLE).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size(), 50);
        assert_eq!(config.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECONDS));
        assert_eq!(config.health.path, "health");
        assert_eq!(config.initial_status(), DEFAULT_INITIAL_STATUS);

        let historial = config.endpoint("historial_precio").unwrap();
        assert_eq!(
            historial.parameter,
            ParameterSpec::Text {
                field: "nombreProducto".to_string()
            }
        );
        assert_eq!(historial.formats.get("fecha_compra"), Some(&ColumnFormat::Date));
        assert_eq!(historial.column_formats().format_for("precio_unitario"), ColumnFormat::Currency);
        assert_eq!(historial.messages.empty, default_empty());
        assert_eq!(historial.status_fallbacks.get("404").map(String::as_str), Some("Producto no encontrado"));

        let tabla = config.endpoint("tabla_productos").unwrap();
        assert_eq!(tabla.parameter.field(), Some("tablaProducto"));
    }

    #[test]
    fn test_request_url_encodes_parameter() {
        let base = Url::parse("http://localhost:5000/api").unwrap();
        let endpoint = EndpointConfig::new("pais", "obtenerPaisesEstadosCiudades");
        let url = endpoint.request_url(&base, Some("República Dominicana")).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/obtenerPaisesEstadosCiudades/Rep%C3%BAblica%20Dominicana"
        );

        let url = endpoint.request_url(&base, Some("a/b?c")).unwrap();
        assert_eq!(url.path(), "/api/obtenerPaisesEstadosCiudades/a%2Fb%3Fc");

        let err = endpoint.request_url(&base, Some("..")).unwrap_err();
        assert!(matches!(err, ViewerError::ValidationError { .. }));
        assert!(endpoint.request_url(&base, Some(".")).is_err());
        let url = endpoint.request_url(&base, Some("a..b")).unwrap();
        assert_eq!(url.path(), "/api/obtenerPaisesEstadosCiudades/a..b");

        let trailing = Url::parse("http://localhost:5000/api/").unwrap();
        let health = build_url(&trailing, "health", None).unwrap();
        assert_eq!(health.as_str(), "http://localhost:5000/api/health");
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("PROXY_VIEWER_TEST_BASE", "http://proxy.internal:5000/api");
        let config = ViewerConfig::from_toml_str(
            "[viewer]\nproxy_base = \"${PROXY_VIEWER_TEST_BASE}\"\n",
        )
        .unwrap();
        assert_eq!(config.viewer.proxy_base, "http://proxy.internal:5000/api");
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn test_validation_failures() {
        let bad_base = ViewerConfig::from_toml_str("[viewer]\nproxy_base = \"/api\"\n").unwrap();
        assert!(bad_base.validate().is_err());

        let zero_page = ViewerConfig::from_toml_str(
            "[viewer]\nproxy_base = \"http://localhost/api\"\npage_size = 0\n",
        )
        .unwrap();
        assert!(zero_page.validate().is_err());

        let bad_locale = ViewerConfig::from_toml_str(
            "[viewer]\nproxy_base = \"http://localhost/api\"\nlocale = \"xx\"\n",
        )
        .unwrap();
        assert!(bad_locale.validate().is_err());

        let duplicate = ViewerConfig::from_toml_str(
            r#"
[viewer]
proxy_base = "http://localhost/api"
[[endpoints]]
name = "a"
path = "x"
[[endpoints]]
name = "a"
path = "y"
"#,
        )
        .unwrap();
        assert!(duplicate.validate().is_err());

        let empty_choice = ViewerConfig::from_toml_str(
            r#"
[viewer]
proxy_base = "http://localhost/api"
[[endpoints]]
name = "t"
path = "tablas"
parameter = { kind = "choice", field = "tabla", options = [] }
"#,
        )
        .unwrap();
        assert!(empty_choice.validate().is_err());

        let shadows_health = ViewerConfig::from_toml_str(
            r#"
[viewer]
proxy_base = "http://localhost/api"
[[endpoints]]
name = "health"
path = "estado"
"#,
        )
        .unwrap();
        assert!(matches!(
            shadows_health.validate(),
            Err(ViewerError::InvalidConfigValueError { ref value, .. }) if value == "health"
        ));

        let huge_timeout = ViewerConfig::from_toml_str(
            "[viewer]\nproxy_base = \"http://localhost/api\"\ntimeout_seconds = 4294967296\n",
        )
        .unwrap();
        assert!(huge_timeout.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ViewerConfig::from_toml_str("[viewer\nproxy_base = 1").unwrap_err();
        assert!(matches!(err, ViewerError::ConfigError { .. }));
    }
}
