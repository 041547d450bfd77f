//! `xsl:sort` over nodes and groups.
//!
//! Every key of every item is evaluated once, before any comparison, with the
//! item as context item and its 1-based input position as context position.
//! The comparison itself then cannot fail. Items that tie on all keys are
//! ordered by their anchor node in document order, unless that fallback is
//! switched off, in which case the stable sort keeps their input order.

use std::cmp::Ordering;
use std::sync::Arc;

use log::{debug, trace};
use xylem_datasource::DataSourceNode;
use xylem_xpath31::collation::{Collation, CollationKey};
use xylem_xpath31::{EvaluationContext, Focus, XdmItem, merge_sort_by};

use crate::error::SortError;
use crate::sort_key::{CaseOrder, SortDataType, SortKeySpec};

/// A group produced by `xsl:for-each-group`: its grouping key and members in
/// population order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group<K, N> {
    pub key: K,
    pub members: Vec<N>,
}

impl<K, N> Group<K, N> {
    pub fn new(key: K, members: Vec<N>) -> Self {
        Self { key, members }
    }
}

/// The evaluated value of one sort key for one item.
#[derive(Debug, Clone)]
enum KeyValue {
    Number(f64),
    Text {
        key: CollationKey,
        /// Key of the lowercased string; only built when the sort key has a
        /// case-order.
        folded: Option<CollationKey>,
        raw: String,
    },
}

/// The cached sort keys of one item.
#[derive(Debug, Clone)]
pub struct SortRecord<N> {
    anchor: Option<N>,
    keys: Vec<KeyValue>,
}

pub struct NodeSorter<'s, 'c, N> {
    keys: &'s [SortKeySpec],
    collations: Vec<Arc<dyn Collation>>,
    ctx: &'s EvaluationContext<'c, N>,
    document_order: bool,
}

impl<'s, 'c, 'a, N: DataSourceNode<'a>> NodeSorter<'s, 'c, N> {
    /// Resolves the collation of every key up front; an unknown collation
    /// URI fails here rather than halfway through a sort.
    pub fn new(
        keys: &'s [SortKeySpec],
        ctx: &'s EvaluationContext<'c, N>,
    ) -> Result<Self, SortError> {
        let collations = keys
            .iter()
            .map(|key| match (&key.collation, &key.lang) {
                (Some(uri), _) => ctx.collation(Some(uri)),
                (None, Some(lang)) => Ok(ctx.collations().for_lang(lang)),
                (None, None) => ctx.collation(None),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            keys,
            collations,
            ctx,
            document_order: true,
        })
    }

    /// Leaves full ties in input order instead of document order.
    pub fn without_document_order(mut self) -> Self {
        self.document_order = false;
        self
    }

    /// Evaluates every key for one item.
    pub fn record(&self, focus: &Focus<'_, N>) -> Result<SortRecord<N>, SortError> {
        let anchor = match &focus.item {
            Some(XdmItem::Node(node)) => Some(*node),
            _ => None,
        };
        let keys = self
            .keys
            .iter()
            .enumerate()
            .map(|(key_index, sort_key)| self.evaluate_key(key_index, sort_key, focus))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SortRecord { anchor, keys })
    }

    fn evaluate_key(
        &self,
        key_index: usize,
        sort_key: &SortKeySpec,
        focus: &Focus<'_, N>,
    ) -> Result<KeyValue, SortError> {
        let value = self
            .ctx
            .evaluate(&sort_key.select, focus)
            .map_err(|e| SortError::KeyEvaluation {
                key_index,
                message: e.to_string(),
            })?;
        let first = value.atomize().into_iter().next();
        Ok(match sort_key.data_type {
            SortDataType::Number => KeyValue::Number(first.map_or(f64::NAN, |a| a.to_double())),
            SortDataType::Text => {
                let raw = first.map(|a| a.to_string_value()).unwrap_or_default();
                let collation = &self.collations[key_index];
                KeyValue::Text {
                    key: collation.key(&raw),
                    folded: sort_key.case_order.map(|_| collation.key(&raw.to_lowercase())),
                    raw,
                }
            }
        })
    }

    /// Compares two records from `key_index` onwards.
    pub fn compare(&self, a: &SortRecord<N>, b: &SortRecord<N>, key_index: usize) -> Ordering {
        let Some(sort_key) = self.keys.get(key_index) else {
            return self.compare_anchors(a, b);
        };
        let ordering = match (&a.keys[key_index], &b.keys[key_index]) {
            (KeyValue::Number(x), KeyValue::Number(y)) => {
                compare_numbers(*x, *y, sort_key.is_descending())
            }
            (
                KeyValue::Text {
                    key: key_a,
                    folded: folded_a,
                    raw: raw_a,
                },
                KeyValue::Text {
                    key: key_b,
                    folded: folded_b,
                    raw: raw_b,
                },
            ) => {
                // With a case-order, case only breaks ties between strings
                // that are equal once lowercased.
                let ordering = match sort_key.case_order {
                    Some(case_order) => folded_a
                        .cmp(folded_b)
                        .then_with(|| compare_case(raw_a, raw_b, case_order))
                        .then_with(|| key_a.cmp(key_b)),
                    None => key_a.cmp(key_b),
                };
                if sort_key.is_descending() {
                    ordering.reverse()
                } else {
                    ordering
                }
            }
            _ => Ordering::Equal,
        };
        match ordering {
            Ordering::Equal => self.compare(a, b, key_index + 1),
            decided => decided,
        }
    }

    fn compare_anchors(&self, a: &SortRecord<N>, b: &SortRecord<N>) -> Ordering {
        if !self.document_order {
            return Ordering::Equal;
        }
        // Records without a node sort after those with one.
        match (&a.anchor, &b.anchor) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// Sorts groups by their keys. The focus of each evaluation is the
    /// group's first member, with the group as current group. Groups must
    /// not be empty.
    pub fn sort_groups<K>(&self, groups: Vec<Group<K, N>>) -> Result<Vec<Group<K, N>>, SortError> {
        let size = groups.len();
        debug!("Sorting {} groups by {} key(s)", size, self.keys.len());
        let records = groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let first = group
                    .members
                    .first()
                    .ok_or(SortError::EmptyGroup { position: i + 1 })?;
                let focus = Focus::new(XdmItem::Node(*first), i + 1, size)
                    .with_group(&group.members);
                self.record(&focus)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.reorder(groups, &records))
    }

    pub fn sort_nodes(&self, nodes: Vec<N>) -> Result<Vec<N>, SortError> {
        let size = nodes.len();
        debug!("Sorting {} nodes by {} key(s)", size, self.keys.len());
        let records = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| self.record(&Focus::new(XdmItem::Node(*node), i + 1, size)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.reorder(nodes, &records))
    }

    fn reorder<T>(&self, items: Vec<T>, records: &[SortRecord<N>]) -> Vec<T> {
        if self.keys.is_empty() && !self.document_order {
            return items;
        }
        let mut order: Vec<usize> = (0..items.len()).collect();
        merge_sort_by(&mut order, |&i, &j| self.compare(&records[i], &records[j], 0));
        trace!("Sort permutation: {:?}", order);

        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        order.into_iter().filter_map(|i| slots[i].take()).collect()
    }
}

/// NaN equals NaN and sorts before every number; `descending` is applied per
/// branch so NaN ends up last in descending order.
fn compare_numbers(a: f64, b: f64, descending: bool) -> Ordering {
    let (less, greater) = if descending {
        (Ordering::Greater, Ordering::Less)
    } else {
        (Ordering::Less, Ordering::Greater)
    };
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => less,
        (false, true) => greater,
        (false, false) if a < b => less,
        (false, false) if a > b => greater,
        (false, false) => Ordering::Equal,
    }
}

/// Character by character, the preferred case sorts before the other and
/// characters of the same case sort by code point.
fn compare_case(a: &str, b: &str, case_order: CaseOrder) -> Ordering {
    let rank = |c: char| {
        let preferred = match case_order {
            CaseOrder::UpperFirst => c.is_uppercase(),
            CaseOrder::LowerFirst => !c.is_uppercase(),
        };
        (!preferred, c)
    };
    a.chars().map(rank).cmp(b.chars().map(rank))
}

/// Sorts groups with document-order fallback on the first member.
pub fn sort_groups<'a, K, N: DataSourceNode<'a>>(
    groups: Vec<Group<K, N>>,
    keys: &[SortKeySpec],
    ctx: &EvaluationContext<'_, N>,
) -> Result<Vec<Group<K, N>>, SortError> {
    NodeSorter::new(keys, ctx)?.sort_groups(groups)
}

pub fn sort_nodes<'a, N: DataSourceNode<'a>>(
    nodes: Vec<N>,
    keys: &[SortKeySpec],
    ctx: &EvaluationContext<'_, N>,
) -> Result<Vec<N>, SortError> {
    NodeSorter::new(keys, ctx)?.sort_nodes(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use xylem_datasource::{MockNode, MockTree};
    use xylem_xpath31::collation::UCA_URI;
    use xylem_xpath31::{Evaluator, Expression, XPath31Error, XdmValue};

    /// Understands `@name`, `.` and `position()`.
    fn eval<'t>(
        expr: &Expression,
        focus: &Focus<'_, MockNode<'t>>,
    ) -> Result<XdmValue<MockNode<'t>>, XPath31Error> {
        let node = match &focus.item {
            Some(XdmItem::Node(node)) => *node,
            _ => return Ok(XdmValue::empty()),
        };
        match expr.source() {
            "." => Ok(XdmValue::from_string(node.string_value())),
            "position()" => Ok(XdmValue::from_integer(focus.position as i64)),
            "count(current-group())" => {
                Ok(XdmValue::from_integer(focus.current_group.len() as i64))
            }
            source => match source.strip_prefix('@') {
                Some(name) => Ok(node
                    .attribute(name)
                    .map(XdmValue::from_node)
                    .unwrap_or_default()),
                None => Err(XPath31Error::dynamic_error(format!("unsupported: {source}"))),
            },
        }
    }

    fn context<'c, 't>(
        evaluator: &'c dyn Evaluator<MockNode<'t>>,
    ) -> EvaluationContext<'c, MockNode<'t>> {
        EvaluationContext::new().with_evaluator(evaluator)
    }

    fn items(tree: &mut MockTree, rows: &[(&str, &str)]) -> Vec<usize> {
        let root = tree.root_id();
        rows.iter()
            .map(|(name, price)| {
                let id = tree.add_element(root, "item");
                tree.add_attribute(id, "name", name);
                tree.add_attribute(id, "price", price);
                id
            })
            .collect()
    }

    fn names(nodes: &[MockNode<'_>]) -> Vec<String> {
        nodes
            .iter()
            .map(|n| n.attribute("name").map(|a| a.string_value()).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_sorts_by_text_then_number() {
        let mut tree = MockTree::new();
        let ids = items(
            &mut tree,
            &[("pear", "3"), ("apple", "10"), ("pear", "1"), ("apple", "2")],
        );
        let nodes: Vec<_> = ids.iter().map(|&id| tree.node(id)).collect();
        let evaluator = eval;
        let ctx = context(&evaluator);
        let keys = [SortKeySpec::new("@name"), SortKeySpec::new("@price").number()];

        let sorted = sort_nodes(nodes.clone(), &keys, &ctx).unwrap();
        assert_eq!(sorted, vec![nodes[3], nodes[1], nodes[2], nodes[0]]);
    }

    #[test]
    fn test_numbers_put_nan_first_and_last_when_descending() {
        let mut tree = MockTree::new();
        let ids = items(&mut tree, &[("a", "5"), ("b", "n/a"), ("c", "-1"), ("d", "NaN")]);
        let nodes: Vec<_> = ids.iter().map(|&id| tree.node(id)).collect();
        let evaluator = eval;
        let ctx = context(&evaluator);

        let ascending = sort_nodes(nodes.clone(), &[SortKeySpec::new("@price").number()], &ctx);
        assert_eq!(names(&ascending.unwrap()), ["b", "d", "c", "a"]);

        let descending = [SortKeySpec::new("@price").number().descending()];
        let sorted = sort_nodes(nodes, &descending, &ctx).unwrap();
        assert_eq!(names(&sorted), ["a", "c", "b", "d"]);
    }

    #[test]
    fn test_ties_fall_back_to_document_order() {
        let mut tree = MockTree::new();
        let ids = items(&mut tree, &[("x", "1"), ("y", "1"), ("z", "1")]);
        let nodes: Vec<_> = ids.iter().rev().map(|&id| tree.node(id)).collect();
        let evaluator = eval;
        let ctx = context(&evaluator);
        let keys = [SortKeySpec::new("@price")];

        let sorted = sort_nodes(nodes.clone(), &keys, &ctx).unwrap();
        assert_eq!(names(&sorted), ["x", "y", "z"]);

        let stable = NodeSorter::new(&keys, &ctx)
            .unwrap()
            .without_document_order()
            .sort_nodes(nodes)
            .unwrap();
        assert_eq!(names(&stable), ["z", "y", "x"]);
    }

    #[test]
    fn test_case_order_decides_between_case_variants() {
        let mut tree = MockTree::new();
        let ids = items(&mut tree, &[("b", "0"), ("B", "0"), ("a", "0"), ("A", "0")]);
        let nodes: Vec<_> = ids.iter().map(|&id| tree.node(id)).collect();
        let evaluator = eval;
        let ctx = context(&evaluator);
        let uca = format!("{UCA_URI}?strength=tertiary");

        let upper = [SortKeySpec::new("@name").collation(&uca).case_order(CaseOrder::UpperFirst)];
        let sorted = sort_nodes(nodes.clone(), &upper, &ctx).unwrap();
        assert_eq!(names(&sorted), ["A", "a", "B", "b"]);

        let lower = [SortKeySpec::new("@name").collation(&uca).case_order(CaseOrder::LowerFirst)];
        let sorted = sort_nodes(nodes, &lower, &ctx).unwrap();
        assert_eq!(names(&sorted), ["a", "A", "b", "B"]);
    }

    #[test]
    fn test_groups_sort_by_key_of_first_member() {
        let mut tree = MockTree::new();
        let ids = items(&mut tree, &[("banana", "1"), ("apple", "2"), ("apple", "3")]);
        let groups = vec![
            Group::new("k1", vec![tree.node(ids[0])]),
            Group::new("k2", vec![tree.node(ids[1]), tree.node(ids[2])]),
        ];
        let evaluator = eval;
        let ctx = context(&evaluator);

        let sorted = sort_groups(groups, &[SortKeySpec::new("@name")], &ctx).unwrap();
        let keys: Vec<_> = sorted.iter().map(|g| g.key).collect();
        assert_eq!(keys, ["k2", "k1"]);

        let groups = vec![
            Group::new("one", vec![tree.node(ids[0])]),
            Group::new("two", vec![tree.node(ids[1]), tree.node(ids[2])]),
        ];
        let by_size = [SortKeySpec::new("count(current-group())").number().descending()];
        let sorted = sort_groups(groups, &by_size, &ctx).unwrap();
        assert_eq!(sorted[0].key, "two");
    }

    #[test]
    fn test_empty_groups_are_rejected() {
        let mut tree = MockTree::new();
        let ids = items(&mut tree, &[("a", "1")]);
        let groups = vec![Group::new("full", vec![tree.node(ids[0])]), Group::new("empty", vec![])];
        let evaluator = eval;
        let ctx = context(&evaluator);

        let err = sort_groups(groups, &[SortKeySpec::new("@name")], &ctx).unwrap_err();
        assert_eq!(err, SortError::EmptyGroup { position: 2 });
    }

    #[test]
    fn test_case_order_is_consistent_under_codepoint_collation() {
        let mut tree = MockTree::new();
        let ids = items(&mut tree, &[("A", "0"), ("B", "0"), ("a", "0")]);
        let evaluator = eval;
        let ctx = context(&evaluator);
        let permutations = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

        for (case_order, expected) in [
            (CaseOrder::LowerFirst, ["a", "A", "B"]),
            (CaseOrder::UpperFirst, ["A", "a", "B"]),
        ] {
            let keys = [SortKeySpec::new("@name").case_order(case_order)];
            for permutation in permutations {
                let nodes: Vec<_> = permutation.iter().map(|&i| tree.node(ids[i])).collect();
                let sorted = NodeSorter::new(&keys, &ctx)
                    .unwrap()
                    .without_document_order()
                    .sort_nodes(nodes)
                    .unwrap();
                assert_eq!(names(&sorted), expected, "{case_order:?} from {permutation:?}");
            }
        }
    }

    #[test]
    fn test_records_without_a_node_sort_last() {
        let mut tree = MockTree::new();
        let ids = items(&mut tree, &[("a", "1")]);
        let ctx = EvaluationContext::<MockNode<'_>>::new();
        let sorter = NodeSorter::new(&[], &ctx).unwrap();

        let node = sorter.record(&Focus::new(XdmItem::Node(tree.node(ids[0])), 1, 2)).unwrap();
        let bare = sorter.record(&Focus::empty()).unwrap();
        assert_eq!(sorter.compare(&node, &bare, 0), Ordering::Less);
        assert_eq!(sorter.compare(&bare, &node, 0), Ordering::Greater);
        assert_eq!(sorter.compare(&bare, &bare, 0), Ordering::Equal);
    }

    #[test]
    fn test_compare_case_orders_by_preferred_case_then_code_point() {
        assert_eq!(compare_case("Ab", "ab", CaseOrder::UpperFirst), Ordering::Less);
        assert_eq!(compare_case("Ab", "ab", CaseOrder::LowerFirst), Ordering::Greater);
        assert_eq!(compare_case("aB", "ab", CaseOrder::LowerFirst), Ordering::Greater);
        assert_eq!(compare_case("ab", "ab", CaseOrder::UpperFirst), Ordering::Equal);
        assert_eq!(compare_case("a", "ab", CaseOrder::UpperFirst), Ordering::Less);
    }

    #[test]
    fn test_key_evaluation_failure_aborts_the_sort() {
        let mut tree = MockTree::new();
        let ids = items(&mut tree, &[("a", "1"), ("b", "2")]);
        let nodes: Vec<_> = ids.iter().map(|&id| tree.node(id)).collect();
        let evaluator = eval;
        let ctx = context(&evaluator);
        let keys = [SortKeySpec::new("@name"), SortKeySpec::new("string-length(.)")];

        let err = sort_nodes(nodes, &keys, &ctx).unwrap_err();
        assert!(matches!(err, SortError::KeyEvaluation { key_index: 1, .. }));
    }

    #[test]
    fn test_unknown_collation_fails_before_sorting() {
        let ctx = EvaluationContext::<MockNode<'_>>::new();
        let keys = [SortKeySpec::new(".").collation("urn:no-such-collation")];
        let err = sort_nodes(Vec::new(), &keys, &ctx).unwrap_err();
        assert!(matches!(err, SortError::XPath(XPath31Error::Collation(_))));
    }

    #[test]
    fn test_focus_position_is_input_index() {
        let mut tree = MockTree::new();
        let ids = items(&mut tree, &[("a", "0"), ("b", "0"), ("c", "0")]);
        let nodes: Vec<_> = ids.iter().map(|&id| tree.node(id)).collect();
        let evaluator = eval;
        let ctx = context(&evaluator);
        let keys = [SortKeySpec::new("position()").number().descending()];

        let sorted = sort_nodes(nodes, &keys, &ctx).unwrap();
        assert_eq!(names(&sorted), ["c", "b", "a"]);
    }

    #[test]
    fn test_compare_numbers_branches() {
        assert_eq!(compare_numbers(1.0, 2.0, false), Ordering::Less);
        assert_eq!(compare_numbers(1.0, 2.0, true), Ordering::Greater);
        assert_eq!(compare_numbers(f64::NAN, f64::NAN, true), Ordering::Equal);
        assert_eq!(compare_numbers(f64::NAN, -1e300, false), Ordering::Less);
        assert_eq!(compare_numbers(0.0, -0.0, false), Ordering::Equal);
    }
}
