use anyhow::Result;
use httpmock::prelude::*;
use proxy_viewer::core::surface::BodyRow;
use proxy_viewer::domain::model::Severity;
use proxy_viewer::{ActionOutcome, ReqwestTransport, ViewController, ViewPhase, ViewerConfig, HEALTH_ACTION};
use std::time::Duration;

fn config_for(server: &MockServer) -> Result<ViewerConfig> {
    let content = format!(
        r#"
[viewer]
proxy_base = "{}"

[[endpoints]]
name = "mundo_por_pais"
path = "obtenerPaisesEstadosCiudades"
parameter = {{ kind = "text", field = "countryName" }}

[endpoints.messages]
success = "Se encontraron {{count}} registros para el pais: {{param}}"
empty = "No se encontraron datos para el pais: {{param}}"
error = "Error al filtrar por pais: {{error}}"

[[endpoints]]
name = "historial_precio"
path = "factura_db/historial_precio"
parameter = {{ kind = "text", field = "nombreProducto" }}

[endpoints.formats]
fecha_compra = "date"
precio_unitario = "currency"

[[endpoints]]
name = "reporte_experiencia"
path = "hoja_vida/reporte_tiempo_experiencia"
parameter = {{ kind = "text", field = "numeroDocumento" }}
array_fields = ["reporte_experiencia"]

[endpoints.messages]
success = "Reporte generado exitosamente para documento: {{meta.numero_documento}}"
error = "Error al obtener reporte: {{error}}"

[endpoints.status_fallbacks]
404 = "No se encontró la persona con el documento proporcionado"
"#,
        server.url("/api")
    );
    Ok(ViewerConfig::from_toml_str(&content)?)
}

fn controller_for(server: &MockServer) -> Result<ViewController<ReqwestTransport>> {
    let config = config_for(server)?;
    let transport = ReqwestTransport::new(Duration::from_secs(5))?;
    Ok(ViewController::new(transport, &config)?)
}

fn cities(n: usize) -> serde_json::Value {
    serde_json::Value::Array(
        (1..=n)
            .map(|i| serde_json::json!({"country": "Chile", "state": "Region", "city": format!("Ciudad {}", i)}))
            .collect(),
    )
}

/// 250 筆資料：第一頁 1-100，第三頁 201-250，換頁不重新請求
#[tokio::test]
async fn test_250_rows_paginate_without_refetch() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/api/obtenerPaisesEstadosCiudades/Chile");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(cities(250));
    });

    let controller = controller_for(&server)?;
    let outcome = controller.submit("mundo_por_pais", Some("Chile")).await;
    assert_eq!(outcome, ActionOutcome::Success { rows: 250, total_pages: 3 });

    let surface = controller.snapshot();
    assert_eq!(surface.status.severity, Severity::Success);
    assert_eq!(surface.status.text, "Se encontraron 250 registros para el pais: Chile");
    let rows: Vec<&[String]> = surface.table.data_rows().collect();
    assert_eq!(rows.len(), 100);
    assert_eq!(rows[0][2], "Ciudad 1");
    assert_eq!(rows[99][2], "Ciudad 100");
    let controls = surface.table.pagination.clone().expect("pagination controls");
    assert!(!controls.previous_enabled);
    assert!(controls.next_enabled);
    assert_eq!(controls.range_text(), "Mostrando 1 - 100 de 250 resultados");

    let view = controller.go_to_page(3)?;
    assert_eq!(view.start_index(), 200);
    assert_eq!(view.end_index(), 250);

    let surface = controller.snapshot();
    let rows: Vec<&[String]> = surface.table.data_rows().collect();
    assert_eq!(rows.len(), 50);
    assert_eq!(rows[0][2], "Ciudad 201");
    assert_eq!(rows[49][2], "Ciudad 250");
    let controls = surface.table.pagination.clone().expect("pagination controls");
    assert!(controls.previous_enabled);
    assert!(!controls.next_enabled);
    assert_eq!(controls.page_text(), "Pagina 3 de 3");

    controller.go_to_page(2)?;
    controller.go_to_page(1)?;
    api_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_not_found_uses_error_field() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/obtenerPaisesEstadosCiudades/Atlantis");
        then.status(404)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"error": "not found"}));
    });

    let controller = controller_for(&server)?;
    let outcome = controller.submit("mundo_por_pais", Some("Atlantis")).await;
    assert_eq!(outcome, ActionOutcome::Failed { message: "not found".to_string() });

    let surface = controller.snapshot();
    assert_eq!(surface.status.severity, Severity::Error);
    assert_eq!(surface.status.text, "Error al filtrar por pais: not found");
    assert!(surface.controls_enabled);
    assert_eq!(controller.phase(), ViewPhase::Error);
    Ok(())
}

#[tokio::test]
async fn test_server_error_with_unparsable_body() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/obtenerPaisesEstadosCiudades/Peru");
        then.status(500)
            .header("Content-Type", "text/html")
            .body("<html><body>Traceback</body></html>");
    });

    let controller = controller_for(&server)?;
    let outcome = controller.submit("mundo_por_pais", Some("Peru")).await;
    assert_eq!(
        outcome,
        ActionOutcome::Failed {
            message: "Error 500: Internal Server Error".to_string()
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_reported_as_decode_failure() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/obtenerPaisesEstadosCiudades/Chile");
        then.status(200)
            .header("Content-Type", "application/json")
            .body("[{\"country\": ");
    });

    let controller = controller_for(&server)?;
    match controller.submit("mundo_por_pais", Some("Chile")).await {
        ActionOutcome::Failed { message } => assert!(message.starts_with("invalid JSON body")),
        other => panic!("expected decode failure, got {:?}", other),
    }
    assert_eq!(controller.status().severity, Severity::Error);
    Ok(())
}

#[tokio::test]
async fn test_empty_array_sets_empty_status() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/obtenerPaisesEstadosCiudades/Narnia");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!([]));
    });

    let controller = controller_for(&server)?;
    assert_eq!(controller.submit("mundo_por_pais", Some("Narnia")).await, ActionOutcome::Empty);

    let surface = controller.snapshot();
    assert_eq!(surface.status.severity, Severity::Empty);
    assert_eq!(surface.status.text, "No se encontraron datos para el pais: Narnia");
    assert_eq!(
        surface.table.body,
        vec![BodyRow::Placeholder {
            colspan: 1,
            message: "No hay resultados para mostrar".to_string()
        }]
    );
    Ok(())
}

/// 包裝物件：陣列欄位成為資料列，其餘欄位只作為訊息參數
#[tokio::test]
async fn test_wrapper_payload_uses_metadata_in_status() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/hoja_vida/reporte_tiempo_experiencia/CC1001");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(
                r#"{"numero_documento": "CC1001", "reporte_experiencia": [
                    {"ocupacion": "SERVIDOR PÚBLICO", "anios": 2, "meses": 5, "total_meses": 29, "descripcion": "2 años y 5 meses"},
                    {"ocupacion": "TOTAL TIEMPO EXPERIENCIA", "anios": 0, "meses": 0, "total_meses": 0, "descripcion": "0 años y 0 meses"}
                ]}"#,
            );
    });

    let controller = controller_for(&server)?;
    let outcome = controller.submit("reporte_experiencia", Some("CC1001")).await;
    assert_eq!(outcome, ActionOutcome::Success { rows: 2, total_pages: 1 });

    let surface = controller.snapshot();
    assert_eq!(surface.status.text, "Reporte generado exitosamente para documento: CC1001");
    let labels: Vec<&str> = surface.table.head.iter().map(|h| h.label.as_str()).collect();
    assert_eq!(labels, vec!["Ocupacion", "Anios", "Meses", "Total meses", "Descripcion"]);
    let rows: Vec<&[String]> = surface.table.data_rows().collect();
    assert_eq!(rows[1][1], "0");
    assert!(!labels.contains(&"Numero documento"));

    let result_set = controller.result_set().expect("result set");
    assert_eq!(result_set.metadata.get("numero_documento"), Some(&serde_json::json!("CC1001")));
    Ok(())
}

#[tokio::test]
async fn test_status_fallback_for_bare_404() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/hoja_vida/reporte_tiempo_experiencia/XX0");
        then.status(404).body("Not Found");
    });

    let controller = controller_for(&server)?;
    controller.submit("reporte_experiencia", Some("XX0")).await;
    assert_eq!(
        controller.status().text,
        "Error al obtener reporte: No se encontró la persona con el documento proporcionado"
    );
    Ok(())
}

#[tokio::test]
async fn test_dates_and_prices_are_formatted() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/factura_db/historial_precio/Lapiz");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(
                r#"[
                    {"producto": "Lapiz", "fecha_compra": "Mon, 15 Jan 2024 00:00:00 GMT", "precio_unitario": "1234.50"},
                    {"producto": "Lapiz", "fecha_compra": "sin fecha", "precio_unitario": 98765.4}
                ]"#,
            );
    });

    let controller = controller_for(&server)?;
    controller.submit("historial_precio", Some("Lapiz")).await;

    let surface = controller.snapshot();
    let rows: Vec<&[String]> = surface.table.data_rows().collect();
    assert_eq!(rows[0], &["Lapiz".to_string(), "15/1/2024".to_string(), "$1234,50".to_string()]);
    assert_eq!(rows[1], &["Lapiz".to_string(), "sin fecha".to_string(), "$98.765,40".to_string()]);
    Ok(())
}

#[tokio::test]
async fn test_health_check_clears_table() -> Result<()> {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/obtenerPaisesEstadosCiudades/Chile");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(cities(3));
    });
    let health_mock = server.mock(|when, then| {
        when.method(GET).path("/api/health");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"status": "ok"}));
    });

    let controller = controller_for(&server)?;
    controller.submit("mundo_por_pais", Some("Chile")).await;
    assert!(controller.snapshot().table.has_headers());

    assert_eq!(controller.submit(HEALTH_ACTION, None).await, ActionOutcome::HealthOk);
    health_mock.assert();

    let surface = controller.snapshot();
    assert_eq!(surface.status.text, "API funcionando correctamente");
    assert!(!surface.table.has_headers());
    assert!(surface.table.is_placeholder());
    Ok(())
}

#[tokio::test]
async fn test_unreachable_proxy_is_an_error_status() -> Result<()> {
    let config = ViewerConfig::from_toml_str(
        "[viewer]\nproxy_base = \"http://127.0.0.1:1/api\"\n",
    )?;
    let controller = ViewController::new(ReqwestTransport::new(Duration::from_secs(2))?, &config)?;

    match controller.submit(HEALTH_ACTION, None).await {
        ActionOutcome::Failed { message } => assert!(!message.is_empty()),
        other => panic!("expected failure, got {:?}", other),
    }
    let surface = controller.snapshot();
    assert_eq!(surface.status.severity, Severity::Error);
    assert!(surface.status.text.starts_with("Error al verificar estado de la API: "));
    assert!(surface.controls_enabled);
    Ok(())
}
