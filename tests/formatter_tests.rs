//! Custom formatters and the resolution cache.

use serde::{Deserialize, Serialize};
use serde_tomlet::formatter::{
    deserialize_field, deserialize_optional_field, serialize_field, TomlFormatter,
};
use serde_tomlet::{
    parse_document, Error, Node, NullHandling, Resolver, Result, TomlOptions, TomlStyle,
    TomlWriter,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Version {
    major: u32,
    minor: u32,
    patch: u32,
}

/// Writes a version as a `"major.minor.patch"` string.
struct VersionFormatter;

impl TomlFormatter<Version> for VersionFormatter {
    fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<Version> {
        let text = node.try_get_string().ok_or_else(|| node.mismatch("string"))?;
        let parts: Vec<u32> = text
            .split('.')
            .map(|p| p.parse().map_err(|_| Error::custom(format!("bad version {:?}", text))))
            .collect::<Result<_>>()?;
        match parts.as_slice() {
            [major, minor, patch] => Ok(Version {
                major: *major,
                minor: *minor,
                patch: *patch,
            }),
            _ => Err(Error::custom(format!("bad version {:?}", text))),
        }
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &Version, _options: &TomlOptions) -> Result<()> {
        writer.write_str(&format!("{}.{}.{}", value.major, value.minor, value.patch))
    }
}

#[derive(Debug, PartialEq)]
struct Package {
    name: String,
    version: Version,
    license: Option<String>,
}

struct PackageFormatter;

impl TomlFormatter<Package> for PackageFormatter {
    fn deserialize(&self, node: Node<'_>, options: &TomlOptions) -> Result<Package> {
        let resolver = options.resolver();
        let strings = resolver.resolve::<String>()?;
        Ok(Package {
            name: deserialize_field(node, "name", &*strings, options)?,
            version: deserialize_field(node, "version", &*resolver.resolve::<Version>()?, options)?,
            license: deserialize_optional_field(node, "license", &*strings, options)?,
        })
    }

    fn serialize(&self, writer: &mut TomlWriter, value: &Package, options: &TomlOptions) -> Result<()> {
        let resolver = options.resolver();
        let strings = resolver.resolve::<String>()?;
        writer.begin_table()?;
        serialize_field(writer, "name", Some(&value.name), &*strings, options, None)?;
        serialize_field(
            writer,
            "version",
            Some(&value.version),
            &*resolver.resolve::<Version>()?,
            options,
            None,
        )?;
        serialize_field(writer, "license", value.license.as_ref(), &*strings, options, None)?;
        writer.end_table()
    }
}

fn resolver() -> Arc<Resolver> {
    let resolver = Resolver::new();
    resolver.register::<Version, _>(VersionFormatter);
    resolver.register::<Package, _>(PackageFormatter);
    Arc::new(resolver)
}

fn package() -> Package {
    Package {
        name: "tomlet".to_string(),
        version: Version {
            major: 0,
            minor: 1,
            patch: 0,
        },
        license: None,
    }
}

#[test]
fn test_record_formatter_round_trip() {
    let resolver = resolver();
    let options = TomlOptions::new().with_resolver(Arc::clone(&resolver));

    let text = resolver.to_string(&package(), &options).unwrap();
    assert_eq!(text, "name = \"tomlet\"\nversion = \"0.1.0\"\n");

    let back: Package = resolver.from_str(&text, &options).unwrap();
    assert_eq!(back, package());

    let licensed: Package = resolver
        .from_str(
            "name = \"x\"\nversion = \"1.2.3\"\nlicense = \"MIT\"\n",
            &options,
        )
        .unwrap();
    assert_eq!(licensed.license.as_deref(), Some("MIT"));
}

#[test]
fn test_record_formatter_null_policy() {
    let resolver = resolver();
    let options = TomlOptions::new()
        .with_resolver(Arc::clone(&resolver))
        .with_null_handling(NullHandling::Error);
    let err = resolver.to_string(&package(), &options).unwrap_err();
    assert!(matches!(err, Error::NullValue(key) if key == "license"));
}

#[test]
fn test_field_level_null_override() {
    let options = TomlOptions::new().with_null_handling(NullHandling::Error);
    let strings = Resolver::global().resolve::<String>().unwrap();
    let mut writer = TomlWriter::new(&options);
    writer.begin_table().unwrap();
    serialize_field::<String>(
        &mut writer,
        "optional",
        None,
        &*strings,
        &options,
        Some(NullHandling::Ignore),
    )
    .unwrap();
    serialize_field(&mut writer, "kept", Some(&"yes".to_string()), &*strings, &options, None)
        .unwrap();
    writer.end_table().unwrap();
    assert_eq!(writer.into_string().unwrap(), "kept = \"yes\"\n");
}

#[test]
fn test_missing_and_mistyped_fields() {
    let resolver = resolver();
    let options = TomlOptions::new().with_resolver(Arc::clone(&resolver));

    let err = resolver
        .from_str::<Package>("name = \"x\"\n", &options)
        .unwrap_err();
    assert!(matches!(err, Error::MissingField(field) if field == "version"));

    let err = resolver
        .from_str::<Package>("name = 1\nversion = \"1.0.0\"\n", &options)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::TypeMismatch {
            expected: "string",
            found: "integer"
        }
    ));
}

#[test]
fn test_containers_built_from_custom_element() {
    let resolver = resolver();
    let options = TomlOptions::new().with_resolver(Arc::clone(&resolver));

    let deps = resolver
        .resolve_map::<BTreeMap<String, Version>, String, Version>()
        .unwrap();
    let doc = parse_document(b"serde = \"1.0.200\"\nchrono = \"0.4.38\"\n").unwrap();
    let read = deps.deserialize(doc.root(), &options).unwrap();
    assert_eq!(read["chrono"].minor, 4);

    let text = resolver.to_string(&read, &options).unwrap();
    assert_eq!(text, "chrono = \"0.4.38\"\nserde = \"1.0.200\"\n");

    let list = resolver.resolve_sequence::<Vec<Version>, Version>().unwrap();
    let doc = parse_document(b"v = [ \"1.0.0\", \"2.0.0\" ]\n").unwrap();
    let versions = list
        .deserialize(doc.root().get_child("v").unwrap(), &options)
        .unwrap();
    assert_eq!(versions.len(), 2);
    assert!(versions[0] < versions[1]);
}

#[test]
fn test_map_with_non_string_keys() {
    let resolver = Resolver::new();
    let options = TomlOptions::new();
    let ports = resolver
        .resolve_map::<BTreeMap<u16, String>, u16, String>()
        .unwrap();

    let mut map = BTreeMap::new();
    map.insert(80, "http".to_string());
    map.insert(443, "https".to_string());
    let text = resolver.to_string(&map, &options).unwrap();
    assert_eq!(text, "80 = \"http\"\n443 = \"https\"\n");

    let doc = parse_document(text.as_bytes()).unwrap();
    assert_eq!(ports.deserialize(doc.root(), &options).unwrap(), map);

    let bad = parse_document(b"http = \"x\"\n").unwrap();
    assert!(ports.deserialize(bad.root(), &options).is_err());
}

#[test]
fn test_nested_containers() {
    let resolver = Resolver::new();
    let options = TomlOptions::new().with_style(TomlStyle::HEADERS);
    resolver.resolve_sequence::<Vec<i64>, i64>().unwrap();
    let nested = resolver
        .resolve_map::<HashMap<String, Vec<i64>>, String, Vec<i64>>()
        .unwrap();

    let doc = parse_document(b"a = [ 1, 2 ]\nb = [ ]\n").unwrap();
    let read = nested.deserialize(doc.root(), &options).unwrap();
    assert_eq!(read["a"], vec![1, 2]);
    assert!(read["b"].is_empty());
}

#[test]
fn test_serde_bridge_in_custom_resolver() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Limits {
        cpu: u32,
        memory: String,
    }

    let resolver = Resolver::new();
    let options = TomlOptions::new();
    assert!(!resolver.is_registered::<Limits>());
    resolver.resolve_or_serde::<Limits>();
    assert!(resolver.is_registered::<Limits>());

    let limits = Limits {
        cpu: 4,
        memory: "2Gi".to_string(),
    };
    let text = resolver.to_string(&limits, &options).unwrap();
    assert_eq!(text, "cpu = 4\nmemory = \"2Gi\"\n");
    assert_eq!(resolver.from_str::<Limits>(&text, &options).unwrap(), limits);

    let all = resolver
        .resolve_sequence::<Vec<Limits>, Limits>()
        .unwrap();
    let doc = parse_document(b"l = [ {cpu = 1, memory = \"1Gi\"} ]\n").unwrap();
    let read = all
        .deserialize(doc.root().get_child("l").unwrap(), &options)
        .unwrap();
    assert_eq!(read[0].cpu, 1);
}

#[test]
fn test_unregistered_type_is_reported() {
    struct Opaque;
    let resolver = Resolver::empty();
    let err = resolver.resolve::<Opaque>().err().unwrap();
    assert!(err.to_string().contains("Opaque"));
    assert!(resolver.resolve::<String>().is_err());
    assert!(resolver.resolve_sequence::<Vec<String>, String>().is_err());
}

#[test]
fn test_replacing_a_formatter() {
    struct Shouting;
    impl TomlFormatter<String> for Shouting {
        fn deserialize(&self, node: Node<'_>, _options: &TomlOptions) -> Result<String> {
            node.try_get_string()
                .map(str::to_lowercase)
                .ok_or_else(|| node.mismatch("string"))
        }

        fn serialize(&self, writer: &mut TomlWriter, value: &String, _options: &TomlOptions) -> Result<()> {
            writer.write_str(&value.to_uppercase())
        }
    }

    let resolver = Arc::new(Resolver::new());
    resolver.register::<String, _>(Shouting);
    let options = TomlOptions::new().with_resolver(Arc::clone(&resolver));
    let words = resolver
        .resolve_map::<BTreeMap<String, String>, String, String>()
        .unwrap();

    let mut map = BTreeMap::new();
    map.insert("greeting".to_string(), "hello".to_string());
    let text = resolver.to_string(&map, &options).unwrap();
    assert_eq!(text, "greeting = \"HELLO\"\n");

    let doc = parse_document(text.as_bytes()).unwrap();
    assert_eq!(words.deserialize(doc.root(), &options).unwrap(), map);
}

#[test]
fn test_concurrent_registration_and_resolution() {
    let resolver = resolver();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let resolver = Arc::clone(&resolver);
            thread::spawn(move || {
                let options = TomlOptions::new().with_resolver(Arc::clone(&resolver));
                if i % 2 == 0 {
                    resolver.resolve_or_serde::<Vec<u8>>();
                }
                let versions = resolver.resolve_sequence::<Vec<Version>, Version>().unwrap();
                let doc = parse_document(b"v = [ \"3.2.1\" ]\n").unwrap();
                versions
                    .deserialize(doc.root().get_child("v").unwrap(), &options)
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(
            handle.join().unwrap(),
            vec![Version {
                major: 3,
                minor: 2,
                patch: 1
            }]
        );
    }
}
