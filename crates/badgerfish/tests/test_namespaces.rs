use helios_badgerfish::{
    BadgerFishConfig, NamespaceScope, PrefixResolver, Result, TreeReader, XmlEvent,
    XmlStreamReader, decode, encode,
};
use serde_json::json;

fn bare() -> BadgerFishConfig {
    BadgerFishConfig::builder()
        .omit_xml_declaration(true)
        .build()
        .unwrap()
}

#[test]
fn test_declared_prefixes_round_trip() -> Result<()> {
    let config = bare();
    let xml = r#"<a:feed xmlns:a="http://www.w3.org/2005/Atom" xmlns="urn:default"><a:title>t</a:title><plain a:rel="self"></plain></a:feed>"#;
    let tree = decode(xml, &config)?;
    assert_eq!(
        tree,
        json!({
            "a:feed": {
                "@xmlns": {"a": "http://www.w3.org/2005/Atom", "$": "urn:default"},
                "a:title": {"$": "t"},
                "plain": {"@a:rel": "self"}
            }
        })
    );
    assert_eq!(encode(&tree, &config)?, xml);
    Ok(())
}

#[test]
fn test_configured_binding_declares_prefix() -> Result<()> {
    let config = BadgerFishConfig::builder()
        .namespace("atom", "http://www.w3.org/2005/Atom")
        .omit_xml_declaration(true)
        .build()?;
    let tree = json!({"atom:feed": {"atom:entry": [{"atom:id": "1"}, {"atom:id": "2"}]}});
    let xml = encode(&tree, &config)?;
    assert_eq!(
        xml,
        r#"<atom:feed xmlns:atom="http://www.w3.org/2005/Atom"><atom:entry><atom:id>1</atom:id></atom:entry><atom:entry><atom:id>2</atom:id></atom:entry></atom:feed>"#
    );
    Ok(())
}

#[test]
fn test_configured_prefix_replaces_tree_prefix() -> Result<()> {
    let config = BadgerFishConfig::builder()
        .namespace("atom", "http://www.w3.org/2005/Atom")
        .omit_xml_declaration(true)
        .build()?;
    let tree = json!({"x:feed": {"@xmlns": {"x": "http://www.w3.org/2005/Atom"}, "x:id": "1"}});
    assert_eq!(
        encode(&tree, &config)?,
        r#"<atom:feed xmlns:atom="http://www.w3.org/2005/Atom"><atom:id>1</atom:id></atom:feed>"#
    );
    Ok(())
}

#[test]
fn test_shadowed_prefix_is_renamed_consistently() -> Result<()> {
    let config = bare();
    let tree = json!({
        "p:root": {
            "@xmlns": {"p": "urn:one"},
            "p:inner": [
                {"@xmlns": {"p": "urn:two"}, "p:leaf": "a"},
                {"@xmlns": {"p": "urn:two"}, "p:leaf": "b"}
            ],
            "p:after": "c"
        }
    });
    let xml = encode(&tree, &config)?;
    assert_eq!(
        xml,
        concat!(
            r#"<p:root xmlns:p="urn:one">"#,
            r#"<p1:inner xmlns:p1="urn:two"><p1:leaf>a</p1:leaf></p1:inner>"#,
            r#"<p1:inner xmlns:p1="urn:two"><p1:leaf>b</p1:leaf></p1:inner>"#,
            r#"<p:after>c</p:after>"#,
            r#"</p:root>"#
        )
    );
    Ok(())
}

#[test]
fn test_prefix_queries_are_stable() -> Result<()> {
    let config = BadgerFishConfig::default();
    let tree = json!({
        "p:r": {
            "@xmlns": {"p": "urn:one"},
            "p:c": {"@xmlns": {"p": "urn:two"}, "@p:id": "1"}
        }
    });
    let mut reader = TreeReader::new(&tree, &config);
    reader.next()?;
    reader.next()?;
    assert_eq!(reader.event(), XmlEvent::StartElement);

    let first = reader.name()?.clone();
    for _ in 0..3 {
        assert_eq!(reader.name()?, &first);
        assert_eq!(reader.attribute_name(0)?.prefix, first.prefix);
        assert_eq!(reader.namespace_prefix(0)?, first.prefix);
    }
    assert_eq!(first.prefix, "p1");
    assert_eq!(first.namespace_uri, "urn:two");
    Ok(())
}

#[test]
fn test_resolver_is_order_dependent_and_deterministic() {
    let config = BadgerFishConfig::default();
    let scope = NamespaceScope::new();

    let mut first = PrefixResolver::new(&config);
    let mut second = PrefixResolver::new(&config);
    for resolver in [&mut first, &mut second] {
        assert_eq!(resolver.resolve("n", "urn:a", &scope), "n");
        assert_eq!(resolver.resolve("n", "urn:b", &scope), "n1");
        assert_eq!(resolver.resolve("n", "urn:a", &scope), "n");
        assert_eq!(resolver.resolve("n", "urn:b", &scope), "n1");
    }
}

#[test]
fn test_configured_prefix_never_clashes_with_declared_one() -> Result<()> {
    let config = BadgerFishConfig::builder()
        .omit_xml_declaration(true)
        .namespace("atom", "urn:X")
        .build()?;
    let tree = json!({
        "atom:feed": {"@xmlns": {"atom": "urn:Y", "a": "urn:X"}, "@a:attr": "1"}
    });
    let xml = encode(&tree, &config)?;
    assert_eq!(
        xml,
        r#"<atom:feed xmlns:atom="urn:Y" xmlns:a="urn:X" a:attr="1"></atom:feed>"#
    );
    assert_eq!(decode(&xml, &config)?, tree);
    Ok(())
}

#[test]
fn test_xml_prefix_is_never_declared() -> Result<()> {
    let config = bare();
    let tree = json!({"r": {"@xml:lang": "en"}});
    assert_eq!(encode(&tree, &config)?, r#"<r xml:lang="en"></r>"#);
    assert_eq!(decode(r#"<r xml:lang="en"/>"#, &config)?, tree);
    Ok(())
}

#[test]
fn test_default_namespace_is_inherited() -> Result<()> {
    let config = bare();
    let tree = json!({"r": {"@xmlns": {"$": "urn:d"}, "c": {"d": {}}}});
    let xml = encode(&tree, &config)?;
    assert_eq!(xml, r#"<r xmlns="urn:d"><c><d></d></c></r>"#);
    assert_eq!(decode(&xml, &config)?, tree);
    Ok(())
}
