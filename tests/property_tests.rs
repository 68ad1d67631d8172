/// Property-based tests using proptest
/// Tests invariants of substitution, serialization and parsing for all inputs
use proptest::prelude::*;
use rust_silverpop_api::catalog::{RequestShape, ADD_RECIPIENT, EXPORT_LIST};
use rust_silverpop_api::definition::{substitute, Entry, Template};
use rust_silverpop_api::value::{Args, Value};
use rust_silverpop_api::xml::{encode_rows, map_to_xml, parse_response, XmlElement};

fn definition_of(shape: RequestShape) -> &'static [Entry] {
    match shape {
        RequestShape::Definition(definition) => definition,
        RequestShape::Relational { .. } => panic!("expected a definition-backed operation"),
    }
}

// Property: substitution keeps exactly the supplied entries, in declaration order
proptest! {
    #[test]
    fn substitution_preserves_declaration_order(
        values in proptest::collection::vec(proptest::option::of("[a-z]{1,8}"), 11)
    ) {
        let definition = definition_of(EXPORT_LIST.shape);
        prop_assume!(definition.len() == values.len());

        let mut args = Args::new();
        let mut expected = Vec::new();
        // Bind in reverse so argument order cannot leak into the result.
        for ((tag, template), value) in definition.iter().zip(&values).rev() {
            if let (Some(value), Template::Placeholder(label)) = (value, template) {
                args.insert(*label, value.as_str());
                expected.push(tag.to_string());
            }
        }
        expected.reverse();

        let tree = substitute(definition, &args);
        let tags: Vec<String> = tree.into_iter().map(|(tag, _)| tag).collect();
        prop_assert_eq!(tags, expected);
    }

    #[test]
    fn empty_nested_entries_are_pruned(ids in proptest::collection::vec(1i64..100_000, 0..5)) {
        let definition = definition_of(ADD_RECIPIENT.shape);
        let args = Args::new()
            .set("list_id", 1)
            .set("contact_lists", Value::List(ids.iter().copied().map(Value::from).collect()));

        let tree = substitute(definition, &args);
        let has_contact_lists = tree.iter().any(|(tag, _)| tag == "CONTACT_LISTS");
        prop_assert_eq!(has_contact_lists, !ids.is_empty());
        prop_assert!(tree.iter().all(|(tag, _)| tag != "SYNC_FIELDS"));
    }
}

// Property: a list value expands to one sibling element per item
proptest! {
    #[test]
    fn list_expands_to_sibling_elements(items in proptest::collection::vec("[a-z0-9]{1,6}", 1..8)) {
        let list = Value::List(items.iter().map(Value::from).collect());
        let xml = map_to_xml(&[("ITEM".to_string(), list)], None).unwrap();

        prop_assert_eq!(xml.matches("<ITEM>").count(), items.len());
        for item in &items {
            let expected = format!("<ITEM>{}</ITEM>", item);
            prop_assert!(xml.contains(&expected));
        }
    }

    #[test]
    fn relational_rows_are_encoded_in_order(
        rows in proptest::collection::vec(
            proptest::collection::vec(("[a-z_]{1,8}", "[a-zA-Z0-9@.]{0,8}"), 1..4),
            0..5,
        )
    ) {
        let xml = encode_rows("InsertUpdateRelationalTable", "COLUMN", "1", &rows).unwrap();
        prop_assert_eq!(xml.matches("<ROW>").count(), rows.len());

        let document = XmlElement::parse(&xml).unwrap();
        let rows_element = document.find("ROWS").unwrap();
        for (row, element) in rows.iter().zip(&rows_element.children) {
            let names: Vec<&str> = element
                .children
                .iter()
                .filter_map(|column| column.attribute("name"))
                .collect();
            let expected: Vec<&str> = row.iter().map(|(name, _)| name.as_str()).collect();
            prop_assert_eq!(names, expected);
        }
    }
}

// Property: parsing arbitrary input never panics
proptest! {
    #[test]
    fn element_parsing_never_panics(input in "\\PC*") {
        let _ = XmlElement::parse(&input);
    }

    #[test]
    fn response_parsing_never_panics(input in "\\PC*") {
        let _ = parse_response(&input);
    }

    #[test]
    fn response_parsing_never_panics_on_xml_like_input(
        input in "<(RESULT|Envelope|Body|Fault|SUCCESS)>[a-zA-Z<>/ ]{0,40}"
    ) {
        let _ = parse_response(&input);
    }
}
