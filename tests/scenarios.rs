//! End-to-end parse scenarios.
//!
//! Each test parses a small document through the public entry points and
//! checks the shape and content of the resulting tree.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use xmldom::builder::TreeBuilder;
use xmldom::parser::{parse_buffer, parse_file, parse_str_with_options, ParseOptions};
use xmldom::serial::print;
use xmldom::{Attribute, Document, ErrorKind, NodeId};

fn child_names(doc: &Document, id: NodeId) -> Vec<&str> {
    doc.children(id).map(|c| doc.node_name(c)).collect()
}

// ---------------------------------------------------------------------------
// Basic shapes
// ---------------------------------------------------------------------------

#[test]
fn test_nested_elements_and_attribute() {
    let doc = parse_buffer(br#"<a x="1"><b>hi</b><c/></a>"#).unwrap();
    let a = doc.root().unwrap();

    assert_eq!(doc.node_name(a), "a");
    assert_eq!(doc.find_attr(a, "x"), Some("1"));
    assert_eq!(child_names(&doc, a), vec!["b", "c"]);

    let b = doc.first_child(a).unwrap();
    let c = doc.next_sibling(b).unwrap();
    assert_eq!(doc.content(b), "hi");
    assert_eq!(doc.content(c), "");
    assert_eq!(doc.parent(b), Some(a));
    assert_eq!(doc.parent(c), Some(a));
    assert_eq!(doc.parent(a), None);
    assert!(doc.is_complete());
}

#[test]
fn test_first_cdata_section_wins() {
    let doc = parse_buffer(b"<a>pre<![CDATA[one]]>mid<![CDATA[two]]>post</a>").unwrap();
    let a = doc.root().unwrap();
    assert_eq!(doc.raw_text(a), "preonemidtwopost");
    assert_eq!(doc.content(a), "one");
}

#[test]
fn test_cdata_keeps_surrounding_whitespace() {
    let doc = parse_buffer(b"<a><![CDATA[  spaced  ]]></a>").unwrap();
    assert_eq!(doc.content(doc.root().unwrap()), "  spaced  ");
}

#[test]
fn test_whitespace_trimmed_from_content() {
    let doc = parse_buffer(b"<a>\n\t  hello world \r\n</a>").unwrap();
    let a = doc.root().unwrap();
    assert_eq!(doc.content(a), "hello world");
    // Raw text keeps everything, with the line end normalized.
    assert_eq!(doc.raw_text(a), "\n\t  hello world \n");
}

#[test]
fn test_whitespace_only_content_is_empty() {
    let doc = parse_buffer(b"<a>  \n  <b/>  </a>").unwrap();
    let a = doc.root().unwrap();
    assert_eq!(doc.content(a), "");
    assert_eq!(print(&doc, false), "<a><b/></a>");
}

#[test]
fn test_text_after_child_goes_to_parent() {
    let doc = parse_buffer(b"<a>x<b>y</b>z</a>").unwrap();
    let a = doc.root().unwrap();
    let b = doc.first_child(a).unwrap();
    assert_eq!(doc.raw_text(a), "xz");
    assert_eq!(doc.content(b), "y");
}

#[test]
fn test_entities_are_decoded() {
    let doc = parse_buffer(br#"<a t="&lt;&amp;&gt;">&quot;&apos; &#65;&#x42;</a>"#).unwrap();
    let a = doc.root().unwrap();
    assert_eq!(doc.find_attr(a, "t"), Some("<&>"));
    assert_eq!(doc.content(a), "\"' AB");
}

// ---------------------------------------------------------------------------
// Malformed input
// ---------------------------------------------------------------------------

#[test]
fn test_mismatched_end_tag_fails() {
    let err = parse_buffer(b"<a><b></a>").unwrap_err();
    assert_eq!(err.kind, ErrorKind::WellFormedness);
    let location = err.location.unwrap();
    assert_eq!(location.line, 1);
}

#[test]
fn test_malformed_inputs_fail() {
    let cases: &[&[u8]] = &[
        b"",
        b"   ",
        b"<a>",
        b"<a></a><b></b>",
        b"text<a/>",
        b"<a x=1/>",
        b"<a x=\"1\" x=\"2\"/>",
        b"<a>&bogus;</a>",
        b"<a><![CDATA[open</a>",
        b"<a>]]></a>",
        b"<1a/>",
        b"<a>\xff</a>",
    ];
    for input in cases {
        let err = parse_buffer(input).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::WellFormedness,
            "input {:?}",
            String::from_utf8_lossy(input)
        );
    }
}

#[test]
fn test_limits_fail_with_limit_exceeded() {
    let opts = ParseOptions::default().max_depth(2);
    let err = parse_str_with_options("<a><b><c/></b></a>", &opts).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitExceeded);

    let opts = ParseOptions::default().max_attributes(1);
    let err = parse_str_with_options(r#"<a x="1" y="2"/>"#, &opts).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitExceeded);

    let opts = ParseOptions::default().max_text_length(4);
    let err = parse_str_with_options("<a>12345</a>", &opts).unwrap_err();
    assert_eq!(err.kind, ErrorKind::LimitExceeded);
}

// ---------------------------------------------------------------------------
// Prolog and misc markup
// ---------------------------------------------------------------------------

#[test]
fn test_prolog_comments_and_pis_are_skipped() {
    let xml = "\u{feff}<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
               <!DOCTYPE a>\n\
               <!-- leading -->\n\
               <a><?pi data?><!-- inside -->text</a>\n\
               <!-- trailing -->\n";
    let doc = Document::parse_str(xml).unwrap();
    let a = doc.root().unwrap();
    assert_eq!(doc.node_count(), 1);
    assert_eq!(doc.content(a), "text");
}

#[test]
fn test_unsupported_encoding_rejected() {
    let err = parse_buffer(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a/>").unwrap_err();
    assert_eq!(err.kind, ErrorKind::WellFormedness);
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[test]
fn test_lookup_is_case_insensitive() {
    let doc = parse_buffer(br#"<Root Kind="x"><Item ID="7"/></Root>"#).unwrap();
    let root = doc.root().unwrap();

    assert_eq!(doc.find_node(root, "ROOT"), Some(root));
    let item = doc.find_node(root, "item").unwrap();
    assert_eq!(doc.find_attr(item, "id"), Some("7"));
    assert_eq!(doc.attributes(root).find("KIND"), Some("x"));
    assert_eq!(doc.find_node(root, "missing"), None);
    assert_eq!(doc.find_attr(item, "missing"), None);
}

#[test]
fn test_find_node_is_depth_first() {
    let doc = parse_buffer(b"<r><a><t>1</t></a><t>2</t></r>").unwrap();
    let r = doc.root().unwrap();
    let t = doc.find_node(r, "t").unwrap();
    assert_eq!(doc.content(t), "1");

    let second = doc.children(r).nth(1).unwrap();
    assert_eq!(doc.find_node(second, "t"), Some(second));
}

#[test]
fn test_projects_listing() {
    let xml = r#"<projects>
        <project name="Expat">
            <author>Clark Cooper</author>
            <website>http://expat.sourceforge.net/</website>
        </project>
        <project name="Expat-dom">
            <author>Sergey Kolotsey</author>
            <website>http://example.com</website>
        </project>
    </projects>"#;
    let doc = Document::parse_str(xml).unwrap();
    let projects = doc.find_node(doc.root().unwrap(), "projects").unwrap();

    let listing: Vec<String> = doc
        .children(projects)
        .filter(|&p| doc.node_name(p).eq_ignore_ascii_case("project"))
        .filter_map(|p| {
            let name = doc.find_attr(p, "name")?;
            let author = doc.find_node(p, "author")?;
            Some(format!("Project {name}, author {}", doc.content(author)))
        })
        .collect();

    assert_eq!(
        listing,
        vec![
            "Project Expat, author Clark Cooper",
            "Project Expat-dom, author Sergey Kolotsey",
        ]
    );
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[test]
fn test_parse_file_roundtrip() {
    let path = std::env::temp_dir().join(format!("xmldom-scenario-{}.xml", std::process::id()));
    std::fs::write(&path, "<list><item n=\"1\"/><item n=\"2\"/></list>").unwrap();
    let result = parse_file(&path);
    std::fs::remove_file(&path).unwrap();

    let doc = result.unwrap();
    let list = doc.root().unwrap();
    assert_eq!(doc.children(list).count(), 2);
}

#[test]
fn test_parse_file_missing_is_io_error() {
    let err = parse_file("/definitely/not/here.xml").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Io);
}

// ---------------------------------------------------------------------------
// Driving the builder directly
// ---------------------------------------------------------------------------

#[test]
fn test_builder_matches_parser() {
    let mut builder = TreeBuilder::new();
    builder
        .start_element("a", vec![Attribute::new("x", "1")])
        .unwrap();
    builder.start_element("b", Vec::new()).unwrap();
    builder.characters("hi").unwrap();
    builder.end_element("b");
    builder.start_element("c", Vec::new()).unwrap();
    builder.end_element("c");
    builder.end_element("a");
    let built = builder.finish().unwrap();

    let parsed = parse_buffer(br#"<a x="1"><b>hi</b><c/></a>"#).unwrap();
    assert_eq!(print(&built, false), print(&parsed, false));
}
