//! Command-line configuration for `bfx`.
//!
//! Every option can be given as a flag or through an environment variable.
//! Convention options can also come from a JSON file (`--config`) using the
//! camelCase names of [`BadgerFishConfig`]; flags override file values.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BFX_FROM` | xml | Input format (media type or alias) |
//! | `BFX_TO` | json | Output format (media type or alias) |
//! | `BFX_CONFIG` | | JSON options file |
//! | `BFX_ATTRIBUTE_PREFIX` | @ | Attribute key prefix |
//! | `BFX_TEXT_KEY` | $ | Text content key |
//! | `BFX_CDATA_KEY` | # | CDATA content key |
//! | `BFX_NAMESPACE_SEPARATOR` | : | Prefix separator in keys |
//! | `BFX_NULL_AS_EMPTY_ELEMENT` | false | Map null to an empty element |
//! | `BFX_ENCODING` | UTF-8 | Declared output encoding |
//! | `BFX_XML_VERSION` | 1.0 | Declared XML version |
//! | `BFX_OMIT_XML_DECLARATION` | false | Skip the XML declaration |
//! | `BFX_AUTO_EMPTY_ELEMENTS` | false | Write empty elements as `<a/>` |
//! | `BFX_ROOT_ELEMENT` | | Wrap or unwrap this root element |
//! | `BFX_INDENT` | | Indent XML output by this many spaces |
//! | `BFX_PRETTY` | false | Pretty-print JSON output |
//! | `BFX_LOG_LEVEL` | warn | Log level |
//!
//! # Example
//!
//! ```rust
//! use clap::Parser;
//! use helios_badgerfish_cli::CliConfig;
//!
//! let cli = CliConfig::parse_from(["bfx", "--from", "xml", "--to", "json", "--text-key", "#text"]);
//! let config = cli.badgerfish_config().unwrap();
//! assert_eq!(config.text_key, "#text");
//! ```

use std::path::PathBuf;

use clap::Parser;
use helios_badgerfish::{BadgerFishConfig, NullPolicy};

/// Command-line configuration for `bfx`.
#[derive(Debug, Clone, Parser)]
#[command(name = "bfx")]
#[command(about = "Convert between XML and BadgerFish JSON")]
pub struct CliConfig {
    /// Input format: a media type or an alias such as `xml` or `json`.
    #[arg(long, env = "BFX_FROM", default_value = "xml")]
    pub from: String,

    /// Output format: a media type or an alias such as `xml` or `json`.
    #[arg(long, env = "BFX_TO", default_value = "json")]
    pub to: String,

    /// Input file (stdin when omitted).
    pub input: Option<PathBuf>,

    /// Output file (stdout when omitted).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file with convention options.
    #[arg(short, long, env = "BFX_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "BFX_ATTRIBUTE_PREFIX")]
    pub attribute_prefix: Option<String>,

    #[arg(long, env = "BFX_TEXT_KEY")]
    pub text_key: Option<String>,

    #[arg(long, env = "BFX_CDATA_KEY")]
    pub cdata_key: Option<String>,

    #[arg(long, env = "BFX_NAMESPACE_SEPARATOR")]
    pub namespace_separator: Option<String>,

    /// Namespace binding, repeatable.
    #[arg(long = "namespace", value_name = "PREFIX=URI", value_parser = parse_binding)]
    pub namespaces: Vec<(String, String)>,

    /// Map null values to empty elements and empty elements to null.
    #[arg(long, env = "BFX_NULL_AS_EMPTY_ELEMENT")]
    pub null_as_empty_element: bool,

    #[arg(long, env = "BFX_ENCODING")]
    pub encoding: Option<String>,

    #[arg(long, env = "BFX_XML_VERSION")]
    pub xml_version: Option<String>,

    #[arg(long, env = "BFX_OMIT_XML_DECLARATION")]
    pub omit_xml_declaration: bool,

    #[arg(long, env = "BFX_AUTO_EMPTY_ELEMENTS")]
    pub auto_empty_elements: bool,

    /// Root element name added on encode and removed on decode.
    #[arg(long, env = "BFX_ROOT_ELEMENT")]
    pub root_element: Option<String>,

    /// Indent XML output by this many spaces.
    #[arg(long, env = "BFX_INDENT")]
    pub indent: Option<usize>,

    /// Pretty-print JSON output.
    #[arg(long, env = "BFX_PRETTY")]
    pub pretty: bool,

    #[arg(long, env = "BFX_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl CliConfig {
    /// Builds the conversion options: defaults, then the options file, then flags.
    pub fn badgerfish_config(&self) -> anyhow::Result<BadgerFishConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::Error::new(e).context(format!("reading {}", path.display()))
                })?;
                BadgerFishConfig::from_json_str(&json)?
            }
            None => BadgerFishConfig::default(),
        };

        if let Some(prefix) = &self.attribute_prefix {
            config.attribute_prefix = prefix.clone();
        }
        if let Some(key) = &self.text_key {
            config.text_key = key.clone();
        }
        if let Some(key) = &self.cdata_key {
            config.cdata_key = key.clone();
        }
        if let Some(separator) = &self.namespace_separator {
            config.namespace_separator = separator.clone();
        }
        for (prefix, uri) in &self.namespaces {
            config.namespaces.insert(prefix.clone(), uri.clone());
        }
        if self.null_as_empty_element {
            config.null_policy = NullPolicy::EmptyElement;
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = encoding.clone();
        }
        if let Some(version) = &self.xml_version {
            config.xml_version = version.clone();
        }
        config.omit_xml_declaration |= self.omit_xml_declaration;
        config.auto_empty_elements |= self.auto_empty_elements;
        if let Some(root) = &self.root_element {
            config.root_element = Some(root.clone());
        }
        if let Some(width) = self.indent {
            config.indent = Some(width);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_binding(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(prefix, uri)| (prefix.to_string(), uri.to_string()))
        .ok_or_else(|| format!("expected PREFIX=URI, found '{}'", value))
}

#[cfg(test)]
mod tests {
    use helios_badgerfish::BadgerFishError;

    use super::*;

    #[test]
    fn test_defaults() {
        let cli = CliConfig::try_parse_from(["bfx"]).unwrap();
        assert_eq!(cli.from, "xml");
        assert_eq!(cli.to, "json");
        assert!(cli.input.is_none());
        let config = cli.badgerfish_config().unwrap();
        assert_eq!(config.attribute_prefix, "@");
        assert_eq!(config.null_policy, NullPolicy::Ignore);
    }

    #[test]
    fn test_flags_map_to_options() {
        let cli = CliConfig::try_parse_from([
            "bfx",
            "--from",
            "json",
            "--to",
            "application/xml",
            "--attribute-prefix",
            "-",
            "--namespace",
            "atom=http://www.w3.org/2005/Atom",
            "--namespace",
            "x=urn:x",
            "--null-as-empty-element",
            "--omit-xml-declaration",
            "--indent",
            "2",
            "in.json",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("in.json")));

        let config = cli.badgerfish_config().unwrap();
        assert_eq!(config.attribute_prefix, "-");
        assert_eq!(config.resolve_uri("x"), Some("urn:x"));
        assert_eq!(config.resolve_prefix("http://www.w3.org/2005/Atom"), Some("atom"));
        assert_eq!(config.null_policy, NullPolicy::EmptyElement);
        assert!(config.omit_xml_declaration);
        assert_eq!(config.indent, Some(2));
    }

    #[test]
    fn test_malformed_binding_is_rejected() {
        assert!(CliConfig::try_parse_from(["bfx", "--namespace", "atom"]).is_err());
    }

    #[test]
    fn test_invalid_options_are_configuration_errors() {
        let cli = CliConfig::try_parse_from(["bfx", "--text-key", "@text"]).unwrap();
        let err = cli.badgerfish_config().unwrap_err();
        let err = err.downcast_ref::<BadgerFishError>().unwrap();
        assert!(err.is_configuration());
    }
}
