use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["knaps-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
    assert_eq!(cli.timeout_secs, 30);
}

#[test]
fn parses_template_with_output() {
    let cli = Cli::try_parse_from(["knaps-cli", "template", "--output", "products.csv"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Template { output: Some(ref p) }) if p == Path::new("products.csv")
    ));
}

#[test]
fn parses_import_dry_run() {
    let cli = Cli::try_parse_from(["knaps-cli", "import", "rows.csv", "--dry-run"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Import { ref file, dry_run: true }) if file == Path::new("rows.csv")
    ));
}

#[test]
fn import_requires_a_file() {
    assert!(Cli::try_parse_from(["knaps-cli", "import"]).is_err());
}

#[test]
fn parses_analytics_filters_and_global_server() {
    let cli = Cli::try_parse_from([
        "knaps-cli",
        "analytics",
        "--month",
        "2024-03",
        "--product-id",
        "7",
        "--server",
        "http://knaps.internal:8080",
    ])
    .expect("expected valid cli args");
    assert_eq!(cli.server, "http://knaps.internal:8080");
    assert!(matches!(
        cli.command,
        Some(Commands::Analytics {
            month: Some(ref m),
            product_id: Some(7),
            overall: false,
        }) if m == "2024-03"
    ));
}

#[test]
fn overall_conflicts_with_product_id() {
    assert!(Cli::try_parse_from([
        "knaps-cli",
        "analytics",
        "--overall",
        "--product-id",
        "7"
    ])
    .is_err());
}

#[test]
fn dry_run_flags_invalid_and_repeated_rows() {
    let csv = "distributor_name,brand_name,product_code,product_name,category_name,trade,rrp\n\
               Acme,Vista,TV-100,Television,Televisions,500,899\n\
               Acme,Vista,TV-100,Television,Televisions,500,899\n\
               Acme,Vista,TV-200,Television,Televisions,abc,899\n";
    let summary = validate_locally(csv).expect("summary");
    assert_eq!(summary.success, 1);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.failed[0].row, 2);
    assert_eq!(summary.failed[0].error, "Product code already exists");
    assert_eq!(summary.failed[1].row, 3);
    assert_eq!(summary.failed[1].details[0].path, "trade");
}
