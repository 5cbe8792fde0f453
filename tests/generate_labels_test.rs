use label_etl::adapters::pdf::{extract_pages, load_document};
use label_etl::core::normalize::builtin_schemas;
use label_etl::{EtlEngine, JobConfig, LabelError, LabelPipeline, LocalStorage};
use std::path::Path;
use tempfile::TempDir;

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn output_in(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_str().unwrap().to_string()
}

#[tokio::test]
async fn primary_export_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(
        &temp_dir,
        "orders.csv",
        "Order ID,Seller SKU,Package ID,Tracking ID,Quantity
1001,SKU-1,PK-1,JT-0001,1
1001,SKU-2,PK-1,JT-0001,1
1001,SKU-3,PK-1,JT-0001,1
1001,SKU-4,PK-1,JT-0001,1
1001,SKU-5,PK-1,JT-0001,1
1001,SKU-1,PK-1,JT-0001,2
1002,SKU-1,PK-2,JT-0002,4
1003,SKU-9,PK-3,JT-0003,abc
1004,SKU-9,PK-4,JT-0004,0
,,,,
",
    );
    let output = output_in(&temp_dir, "out/labels.pdf");

    let pipeline = LabelPipeline::new(LocalStorage::default(), input, output.as_str());
    let report = EtlEngine::new_with_monitoring(pipeline, false)
        .run()
        .await
        .unwrap();

    // Order 1001 has five distinct SKUs, one more than a label holds
    assert_eq!(report.unique_orders, 2);
    assert_eq!(report.label_pages, 3);
    assert_eq!(report.summary_pages, 1);
    assert_eq!(report.total_units, 11);
    assert_eq!(report.distinct_skus, 5);

    let stats = &report.normalization;
    assert_eq!(stats.total_rows, 9);
    assert_eq!(stats.valid_rows, 7);
    assert_eq!(stats.dropped_rows, 2);
    assert_eq!(stats.drop_reasons.len(), 2);
    assert!(stats.drop_reasons[0].starts_with("row 9:"));

    assert!(Path::new(&output).exists());
    let bytes = std::fs::read(&output).unwrap();
    let pages = extract_pages(&load_document(&output, &bytes).unwrap());
    assert_eq!(pages.len(), 4);

    // Overflow page repeats the header and footers number pages across the run
    assert!(pages[0].normalized_text.contains("JT0001"));
    assert!(pages[1].normalized_text.contains("JT0001"));
    assert!(pages[1].normalized_text.contains("2primary"));
    assert!(pages[2].normalized_text.contains("JT0002"));
    assert!(pages[2].normalized_text.contains("3primary"));
    assert!(pages[3].raw_text.contains("SKU del Vendedor"));
}

#[tokio::test]
async fn secondary_export_counts_each_row_once() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(
        &temp_dir,
        "ventas.csv",
        "Ventas exportadas,,,
Número de pedido,SKU del vendedor,Paquete del vendedor,Número de guía
P-1,CAM-01,PQ-1,GU-77
P-1,CAM-01,PQ-1,GU-77
P-1,,PQ-1,GU-77
P-2,PANT-02,,
",
    );
    let output = output_in(&temp_dir, "labels.pdf");

    let pipeline = LabelPipeline::new(LocalStorage::default(), input, output.as_str());
    let report = EtlEngine::new(pipeline).run().await.unwrap();

    assert_eq!(report.normalization.detected_format.as_deref(), Some("secondary"));
    assert_eq!(report.normalization.valid_rows, 3);
    assert_eq!(report.normalization.dropped_rows, 1);
    assert_eq!(report.total_units, 3);
    assert_eq!(report.label_pages, 2);

    let bytes = std::fs::read(&output).unwrap();
    let pages = extract_pages(&load_document(&output, &bytes).unwrap());
    assert!(pages[0].raw_text.contains("(x2)"));
    assert!(pages[1].raw_text.contains("N/A"));
}

#[tokio::test]
async fn unrecognized_export_leaves_no_output() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir, "other.csv", "Customer,Total\nAna,10\n");
    let output = output_in(&temp_dir, "labels.pdf");

    let pipeline = LabelPipeline::new(LocalStorage::default(), input, output.as_str());
    let err = EtlEngine::new(pipeline).run().await.unwrap_err();

    match err {
        LabelError::FormatNotRecognized { attempted } => {
            let tags: Vec<&str> = attempted.iter().map(|a| a.tag.as_str()).collect();
            assert_eq!(tags, vec!["primary", "secondary"]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!Path::new(&output).exists());
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}

#[tokio::test]
async fn job_config_schema_is_detected() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(
        &temp_dir,
        "wholesale.csv",
        "Pedido,Artículo,Cajas\nW-1,BOX-1,3\nW-1,BOX-2,2\n",
    );
    let output = output_in(&temp_dir, "labels.pdf");

    let job = JobConfig::from_toml_str(
        r#"
[[schemas]]
tag = "wholesale"
order_column = "Pedido"
sku_column = "Artículo"
quantity_column = "Cajas"
"#,
    )
    .unwrap();
    assert_eq!(job.schemas().len(), builtin_schemas().len() + 1);

    let pipeline = LabelPipeline::new(LocalStorage::default(), input, output.as_str())
        .with_schemas(job.schemas());
    let report = EtlEngine::new(pipeline).run().await.unwrap();

    assert_eq!(report.normalization.detected_format.as_deref(), Some("wholesale"));
    assert_eq!(report.total_units, 5);
    assert_eq!(report.label_pages, 1);
}
