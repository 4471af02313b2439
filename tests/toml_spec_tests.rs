//! Conformance tests against the TOML 1.0 examples.

use serde_tomlet::{
    parse, parse_document, Error, ParseErrorKind, TomlMap, TomlOptions, TomlStyle, TomlValue,
    TomlWriter,
};

const EXAMPLE: &str = r#"# This is a TOML document

title = "TOML Example"

[owner]
name = "Tom Preston-Werner"
dob = 1979-05-27T07:32:00-08:00

[database]
enabled = true
ports = [ 8000, 8001, 8002 ]
data = [ ["delta", "phi"], [3.14] ]
temp_targets = { cpu = 79.5, case = 72.0 }

[servers]

[servers.alpha]
ip = "10.0.0.1"
role = "frontend"

[servers.beta]
ip = "10.0.0.2"
role = "backend"
"#;

fn write(map: &TomlMap, style: TomlStyle) -> String {
    let options = TomlOptions::new().with_style(style);
    let mut writer = TomlWriter::new(&options);
    writer.write_value(&TomlValue::Table(map.clone())).unwrap();
    writer.into_string().unwrap()
}

fn kind(input: &str) -> ParseErrorKind {
    match parse(input) {
        Err(Error::Parse { kind, .. }) => kind,
        other => panic!("expected a parse error for {:?}, got {:?}", input, other),
    }
}

fn is_redefinition(kind: &ParseErrorKind) -> bool {
    matches!(
        kind,
        ParseErrorKind::TableRedefinition(_) | ParseErrorKind::DuplicateKey(_)
    )
}

#[test]
fn test_example_document() {
    let doc = parse(EXAMPLE).unwrap();
    assert_eq!(
        doc.get("title").and_then(TomlValue::as_str),
        Some("TOML Example")
    );

    let dob = doc.get("owner").and_then(|o| o.get("dob")).unwrap();
    assert_eq!(dob.type_name(), "offset date-time");
    assert_eq!(dob.to_string(), "1979-05-27T07:32:00-08:00");

    let database = doc.get("database").unwrap();
    assert!(database.is_table() && !database.is_inline_table());
    assert!(database.get("temp_targets").unwrap().is_inline_table());
    assert_eq!(
        database.get("data").map(|d| d.to_string()).as_deref(),
        Some("[ [ \"delta\", \"phi\" ], [ 3.14 ] ]")
    );

    let beta = doc
        .get("servers")
        .and_then(|s| s.get("beta"))
        .and_then(|b| b.get("role"));
    assert_eq!(beta.and_then(TomlValue::as_str), Some("backend"));
}

#[test]
fn test_example_document_written_with_headers() {
    let doc = parse(EXAMPLE).unwrap();
    let written = write(&doc, TomlStyle::HEADERS);
    assert_eq!(
        written,
        "title = \"TOML Example\"\n\
         [owner]\n\
         name = \"Tom Preston-Werner\"\n\
         dob = 1979-05-27T07:32:00-08:00\n\
         \n\
         [database]\n\
         enabled = true\n\
         ports = [ 8000, 8001, 8002 ]\n\
         data = [ [ \"delta\", \"phi\" ], [ 3.14 ] ]\n\
         temp_targets = {cpu = 79.5, case = 72.0}\n\
         \n\
         [servers.alpha]\n\
         ip = \"10.0.0.1\"\n\
         role = \"frontend\"\n\
         \n\
         [servers.beta]\n\
         ip = \"10.0.0.2\"\n\
         role = \"backend\"\n\
         \n"
    );

    let reparsed = parse(&written).unwrap();
    assert_eq!(reparsed, doc);
    assert_eq!(write(&reparsed, TomlStyle::HEADERS), written);
}

#[test]
fn test_keys() {
    let doc = parse(concat!(
        "key = \"value\"\n",
        "bare_key = \"value\"\n",
        "bare-key = \"value\"\n",
        "1234 = \"value\"\n",
        "\"127.0.0.1\" = \"value\"\n",
        "\"character encoding\" = \"value\"\n",
        "'key2' = \"value\"\n",
        "'quoted \"value\"' = \"value\"\n",
        "physical.color = \"orange\"\n",
        "site.\"google.com\" = true\n",
        "fruit. flavor = \"banana\"\n",
        "3.14159 = \"pi\"\n",
    ))
    .unwrap();
    assert!(doc.contains_key("1234"));
    assert!(doc.contains_key("127.0.0.1"));
    assert!(doc.contains_key("quoted \"value\""));
    assert_eq!(
        doc.get("site").and_then(|s| s.get("google.com")),
        Some(&TomlValue::Boolean(true))
    );
    assert_eq!(
        doc.get("fruit").and_then(|f| f.get("flavor")).and_then(TomlValue::as_str),
        Some("banana")
    );
    assert_eq!(
        doc.get("3").and_then(|t| t.get("14159")).and_then(TomlValue::as_str),
        Some("pi")
    );
}

#[test]
fn test_empty_quoted_key() {
    let doc = parse("\"\" = \"blank\"\n").unwrap();
    assert_eq!(doc.get("").and_then(TomlValue::as_str), Some("blank"));
}

#[test]
fn test_strings() {
    let doc = parse(concat!(
        "str1 = \"I'm a string. \\\"You can quote me\\\". Name\\tJos\\u00E9\\nLocation\\tSF.\"\n",
        "str2 = \"\"\"\nRoses are red\nViolets are blue\"\"\"\n",
        "str3 = \"\"\"\\\n       The quick brown \\\n       fox jumps over \\\n       the lazy dog.\\\n       \"\"\"\n",
        "winpath = 'C:\\Users\\nodejs\\templates'\n",
        "regex = '<\\i\\c*\\s*>'\n",
        "lines = '''\nThe first newline is\ntrimmed in raw strings.\n'''\n",
        "quot15 = '''Here are fifteen quotation marks: \"\"\"\"\"\"\"\"\"\"\"\"\"\"\"'''\n",
    ))
    .unwrap();
    let get = |key: &str| doc.get(key).and_then(TomlValue::as_str).unwrap().to_string();
    assert_eq!(
        get("str1"),
        "I'm a string. \"You can quote me\". Name\tJos\u{e9}\nLocation\tSF."
    );
    assert_eq!(get("str2"), "Roses are red\nViolets are blue");
    assert_eq!(get("str3"), "The quick brown fox jumps over the lazy dog.");
    assert_eq!(get("winpath"), "C:\\Users\\nodejs\\templates");
    assert_eq!(get("regex"), "<\\i\\c*\\s*>");
    assert_eq!(get("lines"), "The first newline is\ntrimmed in raw strings.\n");
    assert_eq!(
        get("quot15"),
        "Here are fifteen quotation marks: \"\"\"\"\"\"\"\"\"\"\"\"\"\"\""
    );
}

#[test]
fn test_numbers() {
    let doc = parse(concat!(
        "int1 = +99\n",
        "int2 = 42\n",
        "int3 = 0\n",
        "int4 = -17\n",
        "int5 = 1_000\n",
        "int6 = 5_349_221\n",
        "hex1 = 0xDEADBEEF\n",
        "hex3 = 0xdead_beef\n",
        "oct1 = 0o01234567\n",
        "bin1 = 0b11010110\n",
        "flt1 = +1.0\n",
        "flt2 = 3.1415\n",
        "flt3 = -0.01\n",
        "flt4 = 5e+22\n",
        "flt5 = 1e06\n",
        "flt6 = -2E-2\n",
        "flt7 = 6.626e-34\n",
        "flt8 = 224_617.445_991_228\n",
        "sf1 = inf\n",
        "sf2 = +inf\n",
        "sf3 = -inf\n",
        "sf4 = nan\n",
        "sf5 = +nan\n",
        "sf6 = -nan\n",
    ))
    .unwrap();
    let int = |key: &str| doc.get(key).and_then(TomlValue::as_integer).unwrap();
    let float = |key: &str| match doc.get(key) {
        Some(TomlValue::Float(f)) => *f,
        other => panic!("{} is not a float: {:?}", key, other),
    };
    assert_eq!(int("int1"), 99);
    assert_eq!(int("int3"), 0);
    assert_eq!(int("int6"), 5_349_221);
    assert_eq!(int("hex1"), 0xDEAD_BEEF);
    assert_eq!(int("hex3"), 0xDEAD_BEEF);
    assert_eq!(int("oct1"), 0o01234567);
    assert_eq!(int("bin1"), 214);
    assert_eq!(float("flt1"), 1.0);
    assert_eq!(float("flt4"), 5e22);
    assert_eq!(float("flt6"), -0.02);
    assert_eq!(float("flt8"), 224_617.445_991_228);
    assert_eq!(float("sf2"), f64::INFINITY);
    assert_eq!(float("sf3"), f64::NEG_INFINITY);
    assert!(float("sf4").is_nan() && float("sf5").is_nan() && float("sf6").is_nan());
}

#[test]
fn test_invalid_numbers() {
    for input in [
        "a = +0x10\n",
        "a = 0_1\n",
        "a = .7\n",
        "a = 7.\n",
        "a = 3.e+20\n",
        "a = 1_.5\n",
        "a = 1e_5\n",
    ] {
        assert!(parse(input).is_err(), "{:?} should not parse", input);
    }
}

#[test]
fn test_date_times() {
    let doc = parse(concat!(
        "odt1 = 1979-05-27T07:32:00Z\n",
        "odt2 = 1979-05-27T00:32:00-07:00\n",
        "odt3 = 1979-05-27T00:32:00.999999-07:00\n",
        "odt4 = 1979-05-27 07:32:00Z\n",
        "ldt1 = 1979-05-27T07:32:00\n",
        "ldt2 = 1979-05-27T00:32:00.999999\n",
        "ld1 = 1979-05-27\n",
        "lt1 = 07:32:00\n",
        "lt2 = 00:32:00.999999\n",
        "lt3 = 00:32:00.1234567\n",
        "leap = 23:59:60\n",
        "leap_ldt = 2016-12-31T23:59:60.5\n",
    ))
    .unwrap();
    let text = |key: &str| doc.get(key).unwrap().to_string();
    assert_eq!(text("odt1"), "1979-05-27T07:32:00Z");
    assert_eq!(text("odt2"), "1979-05-27T00:32:00-07:00");
    assert_eq!(text("odt3"), "1979-05-27T00:32:00.999999-07:00");
    assert_eq!(text("odt4"), "1979-05-27T07:32:00Z");
    assert_eq!(text("ldt1"), "1979-05-27T07:32:00");
    assert_eq!(text("ldt2"), "1979-05-27T00:32:00.999999");
    assert_eq!(text("ld1"), "1979-05-27");
    assert_eq!(text("lt1"), "07:32:00");
    assert_eq!(text("lt2"), "00:32:00.999999");
    assert_eq!(text("lt3"), "00:32:00.123456");
    assert_eq!(text("leap"), "23:59:60");
    assert_eq!(text("leap_ldt"), "2016-12-31T23:59:60.5");

    assert_eq!(kind("a = 1979-02-30\n"), ParseErrorKind::InvalidDateTime);
    assert_eq!(kind("a = 24:00:00\n"), ParseErrorKind::InvalidDateTime);
    assert_eq!(kind("a = 23:59:61\n"), ParseErrorKind::InvalidDateTime);
}

#[test]
fn test_arrays() {
    let doc = parse(concat!(
        "integers = [ 1, 2, 3 ]\n",
        "colors = [ \"red\", \"yellow\", \"green\" ]\n",
        "nested_arrays_of_ints = [ [ 1, 2 ], [3, 4, 5] ]\n",
        "nested_mixed_array = [ [ 1, 2 ], [\"a\", \"b\", \"c\"] ]\n",
        "string_array = [ \"all\", 'strings', \"\"\"are the same\"\"\", '''type''' ]\n",
        "numbers = [ 0.1, 0.2, 0.5, 1, 2, 5 ]\n",
        "contributors = [\n  \"Foo Bar <foo@example.com>\",\n  { name = \"Baz Qux\", email = \"bazqux@example.com\" }\n]\n",
        "integers2 = [\n  1, 2, 3,\n]\n",
    ))
    .unwrap();
    assert_eq!(doc.get("numbers").map(TomlValue::node_count), Some(6));
    assert_eq!(doc.get("string_array").map(TomlValue::node_count), Some(4));
    assert_eq!(doc.get("integers2").map(TomlValue::node_count), Some(3));
    let contributors = doc.get("contributors").and_then(TomlValue::as_array).unwrap();
    assert!(contributors[1].is_inline_table());
}

#[test]
fn test_tables() {
    let doc = parse(concat!(
        "[table-1]\nkey1 = \"some string\"\nkey2 = 123\n",
        "[dog.\"tater.man\"]\ntype.name = \"pug\"\n",
        "[ g .  h  . i ]\n",
        "[ j . \"ʞ\" . 'l' ]\n",
    ))
    .unwrap();
    assert_eq!(
        doc.get("dog")
            .and_then(|d| d.get("tater.man"))
            .and_then(|t| t.get("type"))
            .and_then(|t| t.get("name"))
            .and_then(TomlValue::as_str),
        Some("pug")
    );
    assert!(doc.get("g").and_then(|g| g.get("h")).and_then(|h| h.get("i")).is_some());
    assert!(doc.get("j").and_then(|j| j.get("ʞ")).and_then(|k| k.get("l")).is_some());
}

#[test]
fn test_dotted_key_tables_extended() {
    let doc = parse(concat!(
        "fruit.apple.color = \"red\"\n",
        "fruit.apple.taste.sweet = true\n",
        "[fruit.apple.texture]\n",
        "smooth = true\n",
    ))
    .unwrap();
    let apple = doc.get("fruit").and_then(|f| f.get("apple")).unwrap();
    assert_eq!(apple.node_count(), 3);
    assert_eq!(
        apple.get("texture").and_then(|t| t.get("smooth")),
        Some(&TomlValue::Boolean(true))
    );
}

#[test]
fn test_array_of_tables() {
    let doc = parse(concat!(
        "[[fruits]]\nname = \"apple\"\n\n",
        "[fruits.physical]\ncolor = \"red\"\nshape = \"round\"\n\n",
        "[[fruits.varieties]]\nname = \"red delicious\"\n\n",
        "[[fruits.varieties]]\nname = \"granny smith\"\n\n",
        "[[fruits]]\nname = \"banana\"\n\n",
        "[[fruits.varieties]]\nname = \"plantain\"\n",
    ))
    .unwrap();
    let fruits = doc.get("fruits").and_then(TomlValue::as_array).unwrap();
    assert_eq!(fruits.len(), 2);
    assert_eq!(fruits[0].get("varieties").map(TomlValue::node_count), Some(2));
    assert_eq!(fruits[1].get("varieties").map(TomlValue::node_count), Some(1));
    assert!(fruits[1].get("physical").is_none());

    // Only the document's own sequences become `[[...]]` blocks.
    let written = write(&doc, TomlStyle::HEADERS);
    assert_eq!(
        written,
        concat!(
            "[[fruits]]\nname = \"apple\"\n",
            "varieties = [ {name = \"red delicious\"}, {name = \"granny smith\"} ]\n\n",
            "[fruits.physical]\ncolor = \"red\"\nshape = \"round\"\n\n",
            "[[fruits]]\nname = \"banana\"\nvarieties = [ {name = \"plantain\"} ]\n\n",
        )
    );
    let reparsed = parse(&written).unwrap();
    let fruits = reparsed.get("fruits").and_then(TomlValue::as_array).unwrap();
    let varieties = fruits[0].get("varieties").and_then(TomlValue::as_array).unwrap();
    assert_eq!(varieties[1].get("name").and_then(TomlValue::as_str), Some("granny smith"));
}

#[test]
fn test_redefinitions_rejected() {
    let invalid = [
        "[fruit]\napple = \"red\"\n[fruit]\norange = \"orange\"\n",
        "[fruit]\napple = \"red\"\n[fruit.apple]\ntexture = \"smooth\"\n",
        "[product]\ntype = { name = \"Nail\" }\ntype.edible = false\n",
        "[product]\ntype.name = \"Nail\"\ntype = { edible = false }\n",
        "fruits = []\n[[fruits]]\n",
        "[[fruits]]\nname = \"apple\"\n[[fruits.varieties]]\nname = \"red delicious\"\n[fruits.varieties]\nname = \"granny smith\"\n",
        "[fruit.physical]\ncolor = \"red\"\n[[fruit]]\n",
        "name = \"Tom\"\nname = \"Pradyun\"\n",
        "spelling = \"favorite\"\n\"spelling\" = \"favourite\"\n",
        "fruit.apple = 1\nfruit.apple.smooth = true\n",
    ];
    for input in invalid {
        let kind = kind(input);
        assert!(is_redefinition(&kind), "{:?} gave {:?}", input, kind);
    }
}

#[test]
fn test_duplicate_and_dotted_redefinition_kinds() {
    assert_eq!(
        kind("a = 1\na = 2"),
        ParseErrorKind::DuplicateKey("a".to_string())
    );
    assert!(matches!(
        kind("a.b = 1\n[a]\nb = 2"),
        ParseErrorKind::TableRedefinition(_)
    ));
}

#[test]
fn test_inline_tables_are_closed() {
    let doc = parse("point = { x = 1, y = 2 }\nanimal = { type.name = \"pug\" }\n").unwrap();
    assert!(doc.get("point").unwrap().is_inline_table());
    assert_eq!(
        doc.get("animal")
            .and_then(|a| a.get("type"))
            .and_then(|t| t.get("name"))
            .and_then(TomlValue::as_str),
        Some("pug")
    );
    assert!(parse("a = { b = 1,\n c = 2 }\n").is_err());
    assert!(parse("a = { b = 1 }\n[a.c]\n").is_err());
}

#[test]
fn test_comments_and_whitespace() {
    let doc = parse("\u{feff}# header comment\n  key = \"value\"  # trailing\n\t\nother = 1\n")
        .unwrap();
    assert_eq!(doc.len(), 2);
    assert!(parse("a = 1 # bell \u{7}\n").is_err());
}

#[test]
fn test_error_display_has_position() {
    let err = parse_document(b"ok = 1\nbad = \"unterminated\n").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("line 2"), "{}", message);
    assert_eq!(err.parse_kind(), Some(&ParseErrorKind::UnterminatedString));
}

#[test]
fn test_standalone_values() {
    let value: TomlValue = "{ a = 1, b = [ true ] }".parse().unwrap();
    assert!(value.is_inline_table());
    assert_eq!(value.to_string(), "{a = 1, b = [ true ]}");

    let date: TomlValue = "1979-05-27T07:32:00.5+01:30".parse().unwrap();
    assert_eq!(date.to_string(), "1979-05-27T07:32:00.5+01:30");
}
