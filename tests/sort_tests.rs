mod common;

use common::fixtures::{ACCENTS, INVENTORY, TIES};
use common::{TestResult, context, elements, evaluate, init_logger, names};
use std::cmp::Ordering;
use std::sync::Arc;
use xylem::xpath31::collation::{Collation, CollationKey, UCA_URI};
use xylem::xslt::NodeSorter;
use xylem::{
    CaseOrder, CollationRegistry, DataSourceNode, EvaluationContext, Focus, Group, SortError,
    SortKeySpec,
    XPath31Error, XdmItem, XmlDocument, sort_groups, sort_nodes,
};

fn uca(query: &str) -> String {
    format!("{UCA_URI}?{query}")
}

#[test]
fn test_default_collation_is_codepoint() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);

    let sorted = sort_nodes(elements(&doc, "item"), &[SortKeySpec::new("@name")], &ctx)?;
    assert_eq!(names(&sorted), ["Apple", "Pear", "apple", "kale", "leek", "pear"]);
    Ok(())
}

#[test]
fn test_primary_strength_ties_fall_back_to_document_order() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);
    let keys = [SortKeySpec::new("@name").collation(uca("strength=primary"))];

    let sorted = sort_nodes(elements(&doc, "item"), &keys, &ctx)?;
    assert_eq!(names(&sorted), ["Apple", "apple", "kale", "leek", "pear", "Pear"]);
    Ok(())
}

#[test]
fn test_tertiary_strength_and_case_first() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);

    let lower = [SortKeySpec::new("@name").collation(uca("strength=tertiary"))];
    let sorted = sort_nodes(elements(&doc, "item"), &lower, &ctx)?;
    assert_eq!(names(&sorted), ["apple", "Apple", "kale", "leek", "pear", "Pear"]);

    let upper = [SortKeySpec::new("@name").collation(uca("strength=tertiary;caseFirst=upper"))];
    let sorted = sort_nodes(elements(&doc, "item"), &upper, &ctx)?;
    assert_eq!(names(&sorted), ["Apple", "apple", "kale", "leek", "Pear", "pear"]);
    Ok(())
}

#[test]
fn test_accents_weigh_at_secondary_strength() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(ACCENTS)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);
    let nodes = elements(&doc, "item");

    let primary = [SortKeySpec::new("@name").collation(uca("strength=primary"))];
    let sorted = sort_nodes(nodes.clone(), &primary, &ctx)?;
    assert_eq!(names(&sorted), ["resume", "Résumé", "résumé", "Resume"]);

    let secondary = [SortKeySpec::new("@name").collation(uca("strength=secondary"))];
    let sorted = sort_nodes(nodes.clone(), &secondary, &ctx)?;
    assert_eq!(names(&sorted), ["resume", "Resume", "Résumé", "résumé"]);

    let tertiary = [SortKeySpec::new("@name").collation(uca("strength=tertiary"))];
    let sorted = sort_nodes(nodes, &tertiary, &ctx)?;
    assert_eq!(names(&sorted), ["resume", "Resume", "résumé", "Résumé"]);
    Ok(())
}

#[test]
fn test_case_order_flips_fixed_upper_lower_pairs() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);
    let tertiary = uca("strength=tertiary");

    let upper = [SortKeySpec::new("@name")
        .collation(&tertiary)
        .case_order(CaseOrder::UpperFirst)];
    let sorted = sort_nodes(elements(&doc, "item"), &upper, &ctx)?;
    assert_eq!(names(&sorted), ["Apple", "apple", "kale", "leek", "Pear", "pear"]);

    let lower = [SortKeySpec::new("@name")
        .collation(&tertiary)
        .case_order(CaseOrder::LowerFirst)];
    let sorted = sort_nodes(elements(&doc, "item"), &lower, &ctx)?;
    assert_eq!(names(&sorted), ["apple", "Apple", "kale", "leek", "pear", "Pear"]);

    // Descending reverses the case decision as well.
    let descending = [SortKeySpec::new("@name")
        .collation(&tertiary)
        .case_order(CaseOrder::UpperFirst)
        .descending()];
    let sorted = sort_nodes(elements(&doc, "item"), &descending, &ctx)?;
    assert_eq!(names(&sorted), ["pear", "Pear", "leek", "kale", "apple", "Apple"]);
    Ok(())
}

#[test]
fn test_numeric_keys_put_nan_first_ascending_and_last_descending() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);

    let ascending = [SortKeySpec::new("@price").number()];
    let sorted = sort_nodes(elements(&doc, "item"), &ascending, &ctx)?;
    assert_eq!(names(&sorted), ["leek", "apple", "pear", "Pear", "kale", "Apple"]);

    let descending = [SortKeySpec::new("@price").number().descending()];
    let sorted = sort_nodes(elements(&doc, "item"), &descending, &ctx)?;
    assert_eq!(names(&sorted), ["Apple", "kale", "pear", "Pear", "apple", "leek"]);
    Ok(())
}

#[test]
fn test_later_keys_break_ties_of_earlier_keys() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);
    let keys = [
        SortKeySpec::new("@kind"),
        SortKeySpec::new("@price").number().descending(),
    ];

    let sorted = sort_nodes(elements(&doc, "item"), &keys, &ctx)?;
    assert_eq!(names(&sorted), ["Apple", "pear", "Pear", "apple", "kale", "leek"]);
    Ok(())
}

#[test]
fn test_sort_is_stable_without_document_order() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(TIES)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);
    let keys = [SortKeySpec::new("@rank").number()];
    let reversed: Vec<_> = elements(&doc, "item").into_iter().rev().collect();

    let sorted = NodeSorter::new(&keys, &ctx)?
        .without_document_order()
        .sort_nodes(reversed.clone())?;
    assert_eq!(names(&sorted), ["fourth", "third", "second", "first"]);

    let sorted = sort_nodes(reversed, &keys, &ctx)?;
    assert_eq!(names(&sorted), ["fourth", "first", "second", "third"]);
    Ok(())
}

#[test]
fn test_comparator_is_a_total_order() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);
    let key_sets = [
        vec![
            SortKeySpec::new("@name").collation(uca("strength=primary")),
            SortKeySpec::new("@price").number(),
        ],
        vec![SortKeySpec::new("@name").case_order(CaseOrder::LowerFirst)],
        vec![SortKeySpec::new("@name").case_order(CaseOrder::UpperFirst).descending()],
    ];
    let nodes = elements(&doc, "item");

    for keys in &key_sets {
        let sorter = NodeSorter::new(keys, &ctx)?.without_document_order();
        let records = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                sorter.record(&Focus::new(XdmItem::Node(*node), i + 1, nodes.len()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for a in &records {
            assert_eq!(sorter.compare(a, a, 0), Ordering::Equal);
            for b in &records {
                assert_eq!(sorter.compare(a, b, 0), sorter.compare(b, a, 0).reverse());
                for c in &records {
                    if sorter.compare(a, b, 0).is_le() && sorter.compare(b, c, 0).is_le() {
                        assert!(sorter.compare(a, c, 0).is_le());
                    }
                }
            }
        }
    }
    Ok(())
}

#[test]
fn test_groups_sort_by_their_first_member() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(r#"<r><item name="banana"/><item name="apple"/></r>"#)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);
    let nodes = elements(&doc, "item");
    let groups = vec![Group::new("k1", vec![nodes[0]]), Group::new("k2", vec![nodes[1]])];

    let sorted = sort_groups(groups, &[SortKeySpec::new("@name")], &ctx)?;
    let keys: Vec<_> = sorted.iter().map(|g| g.key).collect();
    assert_eq!(keys, ["k2", "k1"]);
    Ok(())
}

#[test]
fn test_groups_see_current_group_and_position() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);
    let nodes = elements(&doc, "item");
    let (fruit, vegetables): (Vec<_>, Vec<_>) = nodes.into_iter().partition(|n| {
        n.attribute("kind").map(|a| a.string_value()).as_deref() == Some("fruit")
    });
    let groups = vec![Group::new("fruit", fruit), Group::new("vegetable", vegetables)];

    let by_size = [SortKeySpec::new("count(current-group())").number()];
    let sorted = sort_groups(groups.clone(), &by_size, &ctx)?;
    assert_eq!(sorted[0].key, "vegetable");
    assert_eq!(names(&sorted[0].members), ["leek", "kale"]);

    let by_position = [SortKeySpec::new("position()").number().descending()];
    let sorted = sort_groups(groups, &by_position, &ctx)?;
    let keys: Vec<_> = sorted.iter().map(|g| g.key).collect();
    assert_eq!(keys, ["vegetable", "fruit"]);
    Ok(())
}

#[test]
fn test_lang_selects_a_language_collation() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);

    let keys = [SortKeySpec::new("@name").lang("en")];
    let sorted = sort_nodes(elements(&doc, "item"), &keys, &ctx)?;
    assert_eq!(names(&sorted), ["apple", "Apple", "kale", "leek", "pear", "Pear"]);
    Ok(())
}

/// Descending code point order.
#[derive(Debug)]
struct ReverseCodepoint(String);

impl Collation for ReverseCodepoint {
    fn uri(&self) -> &str {
        &self.0
    }

    fn key(&self, s: &str) -> CollationKey {
        CollationKey::from_weights(s.chars().map(|c| u32::MAX - u32::from(c)).collect())
    }
}

#[test]
fn test_lang_uses_a_registered_tailoring() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let mut registry = CollationRegistry::new();
    registry.register(Arc::new(ReverseCodepoint(uca("lang=xx"))));
    let ctx = context(&evaluator).with_collations(Arc::new(registry));

    let keys = [SortKeySpec::new("@name").lang("xx")];
    let sorted = sort_nodes(elements(&doc, "item"), &keys, &ctx)?;
    assert_eq!(names(&sorted), ["pear", "leek", "kale", "apple", "Pear", "Apple"]);

    let keys = [SortKeySpec::new("@name").lang("en")];
    let sorted = sort_nodes(elements(&doc, "item"), &keys, &ctx)?;
    assert_eq!(names(&sorted), ["apple", "Apple", "kale", "leek", "pear", "Pear"]);
    Ok(())
}

#[test]
fn test_failures_are_reported() -> TestResult {
    init_logger();
    let doc = XmlDocument::parse(INVENTORY)?;
    let evaluator = evaluate;
    let ctx = context(&evaluator);

    let keys = [SortKeySpec::new("@name"), SortKeySpec::new("string-length(@name)")];
    let err = sort_nodes(elements(&doc, "item"), &keys, &ctx).unwrap_err();
    assert!(matches!(err, SortError::KeyEvaluation { key_index: 1, .. }));

    let keys = [SortKeySpec::new("@name").collation("urn:example:unknown")];
    let err = sort_nodes(elements(&doc, "item"), &keys, &ctx).unwrap_err();
    assert!(matches!(err, SortError::XPath(XPath31Error::Collation(_))));

    let unevaluated = EvaluationContext::new();
    let err = sort_nodes(elements(&doc, "item"), &[SortKeySpec::new("@name")], &unevaluated);
    assert!(matches!(err, Err(SortError::KeyEvaluation { key_index: 0, .. })));
    Ok(())
}
