use std::fs;

use clap::Parser;
use helios_badgerfish_cli::{CliConfig, EXIT_CONFIGURATION, exit_code, run};
use serde_json::{Value, json};
use tempfile::tempdir;

fn parse(args: &[&str]) -> CliConfig {
    CliConfig::try_parse_from(std::iter::once("bfx").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_xml_file_to_json_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("in.xml");
    let output = dir.path().join("out.json");
    fs::write(
        &input,
        r#"<?xml version="1.0"?><root id="1"><child>a</child><child>b</child></root>"#,
    )?;

    let cli = parse(&[
        "--from",
        "xml",
        "--to",
        "application/json",
        input.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ]);
    run(&cli)?;

    let tree: Value = serde_json::from_slice(&fs::read(&output)?)?;
    assert_eq!(
        tree,
        json!({"root": {"@id": "1", "child": [{"$": "a"}, {"$": "b"}]}})
    );
    Ok(())
}

#[test]
fn test_json_file_to_xml_with_options_file() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let options = dir.path().join("options.json");
    let input = dir.path().join("in.json");
    let output = dir.path().join("out.xml");
    fs::write(&options, r##"{"textKey": "#text", "omitXmlDeclaration": true}"##)?;
    fs::write(&input, r##"{"note": {"-lang": "en", "#text": "hi"}}"##)?;

    let cli = parse(&[
        "--from",
        "json",
        "--to",
        "xml",
        "--config",
        options.to_str().unwrap(),
        "--attribute-prefix",
        "-",
        input.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]);
    run(&cli)?;

    assert_eq!(fs::read_to_string(&output)?, r#"<note lang="en">hi</note>"#);
    Ok(())
}

#[test]
fn test_invalid_options_file_exits_with_configuration_code() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let options = dir.path().join("options.json");
    let input = dir.path().join("in.xml");
    fs::write(&options, r#"{"encoding": "ISO-8859-1"}"#)?;
    fs::write(&input, "<r/>")?;

    let cli = parse(&["--config", options.to_str().unwrap(), input.to_str().unwrap()]);
    let err = run(&cli).unwrap_err();
    assert_eq!(exit_code(&err), EXIT_CONFIGURATION);
    Ok(())
}

#[test]
fn test_malformed_input_is_not_a_configuration_error() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let input = dir.path().join("in.xml");
    let output = dir.path().join("out.json");
    fs::write(&input, "<r><a></r>")?;

    let cli = parse(&[input.to_str().unwrap(), "-o", output.to_str().unwrap()]);
    let err = run(&cli).unwrap_err();
    assert_eq!(exit_code(&err), 1);
    assert!(!output.exists());
    Ok(())
}
