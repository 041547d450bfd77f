use super::{AtomicValue, XdmArray, XdmFunction, XdmMap};
use std::fmt;
use xylem_datasource::DataSourceNode;

#[derive(Debug, Clone)]
pub enum XdmItem<N> {
    Node(N),
    Atomic(AtomicValue),
    Map(XdmMap<N>),
    Array(XdmArray<N>),
    Function(XdmFunction<N>),
}

impl<N> XdmItem<N> {
    pub fn as_atomic(&self) -> Option<&AtomicValue> {
        match self {
            XdmItem::Atomic(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&XdmArray<N>> {
        match self {
            XdmItem::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            XdmItem::Node(_) => "node()",
            XdmItem::Atomic(a) => a.type_name(),
            XdmItem::Map(_) => "map(*)",
            XdmItem::Array(_) => "array(*)",
            XdmItem::Function(_) => "function(*)",
        }
    }
}

impl<N: PartialEq> PartialEq for XdmItem<N> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (XdmItem::Node(a), XdmItem::Node(b)) => a == b,
            (XdmItem::Atomic(a), XdmItem::Atomic(b)) => a == b,
            (XdmItem::Map(a), XdmItem::Map(b)) => a == b,
            (XdmItem::Array(a), XdmItem::Array(b)) => a == b,
            (XdmItem::Function(a), XdmItem::Function(b)) => a == b,
            _ => false,
        }
    }
}

/// A flat sequence of items. Sequences never nest: every constructor takes
/// items, and [`concat`](Self::concat) splices.
#[derive(Debug, Clone)]
pub struct XdmValue<N> {
    items: Vec<XdmItem<N>>,
}

impl<N> XdmValue<N> {
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_item(item: XdmItem<N>) -> Self {
        Self { items: vec![item] }
    }

    pub fn from_items(items: Vec<XdmItem<N>>) -> Self {
        Self { items }
    }

    pub fn from_atomic(value: AtomicValue) -> Self {
        Self::from_item(XdmItem::Atomic(value))
    }

    pub fn from_atomics(values: impl IntoIterator<Item = AtomicValue>) -> Self {
        Self::from_items(values.into_iter().map(XdmItem::Atomic).collect())
    }

    pub fn from_node(node: N) -> Self {
        Self::from_item(XdmItem::Node(node))
    }

    pub fn from_map(map: XdmMap<N>) -> Self {
        Self::from_item(XdmItem::Map(map))
    }

    pub fn from_array(array: XdmArray<N>) -> Self {
        Self::from_item(XdmItem::Array(array))
    }

    pub fn from_function(func: XdmFunction<N>) -> Self {
        Self::from_item(XdmItem::Function(func))
    }

    pub fn from_bool(b: bool) -> Self {
        Self::from_atomic(AtomicValue::Boolean(b))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self::from_atomic(AtomicValue::String(s.into()))
    }

    pub fn from_integer(i: i64) -> Self {
        Self::from_atomic(AtomicValue::Integer(i))
    }

    pub fn from_double(d: f64) -> Self {
        Self::from_atomic(AtomicValue::Double(d))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn items(&self) -> &[XdmItem<N>] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, XdmItem<N>> {
        self.items.iter()
    }

    pub fn first(&self) -> Option<&XdmItem<N>> {
        self.items.first()
    }

    /// The only item, if the sequence has exactly one.
    pub fn single(&self) -> Option<&XdmItem<N>> {
        match self.items.as_slice() {
            [item] => Some(item),
            _ => None,
        }
    }

    pub fn into_single(self) -> Result<XdmItem<N>, Self> {
        if self.items.len() == 1 {
            let mut items = self.items;
            items.pop().ok_or_else(Self::empty)
        } else {
            Err(self)
        }
    }

    pub fn push(&mut self, item: XdmItem<N>) {
        self.items.push(item);
    }

    pub fn extend(&mut self, other: XdmValue<N>) {
        self.items.extend(other.items);
    }

    pub fn concat(mut self, other: XdmValue<N>) -> Self {
        self.extend(other);
        self
    }
}

impl<'a, N: DataSourceNode<'a>> XdmValue<N> {
    /// `fn:data`: nodes become untyped atomics of their string value and
    /// arrays are atomized member by member. Maps and functions have no
    /// typed value and are dropped.
    pub fn atomize(&self) -> Vec<AtomicValue> {
        let mut out = Vec::with_capacity(self.items.len());
        atomize_items(&self.items, &mut out);
        out
    }
}

fn atomize_items<'a, N: DataSourceNode<'a>>(items: &[XdmItem<N>], out: &mut Vec<AtomicValue>) {
    for item in items {
        match item {
            XdmItem::Atomic(a) => out.push(a.clone()),
            XdmItem::Node(n) => out.push(AtomicValue::UntypedAtomic(n.string_value())),
            XdmItem::Array(arr) => {
                for member in arr.members() {
                    atomize_items(member.items(), out);
                }
            }
            XdmItem::Map(_) | XdmItem::Function(_) => {}
        }
    }
}

impl<N> Default for XdmValue<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<N> FromIterator<XdmItem<N>> for XdmValue<N> {
    fn from_iter<I: IntoIterator<Item = XdmItem<N>>>(iter: I) -> Self {
        Self::from_items(iter.into_iter().collect())
    }
}

impl<N> IntoIterator for XdmValue<N> {
    type Item = XdmItem<N>;
    type IntoIter = std::vec::IntoIter<XdmItem<N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<N: PartialEq> PartialEq for XdmValue<N> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<N: fmt::Debug> fmt::Display for XdmValue<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.items.as_slice() {
            [] => write!(f, "()"),
            [single] => fmt_item(single, f),
            items => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    fmt_item(item, f)?;
                }
                write!(f, ")")
            }
        }
    }
}

fn fmt_item<N: fmt::Debug>(item: &XdmItem<N>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match item {
        XdmItem::Atomic(AtomicValue::String(s)) => write!(f, "\"{s}\""),
        XdmItem::Atomic(a) => write!(f, "{a}"),
        XdmItem::Map(m) => write!(f, "{m}"),
        XdmItem::Array(a) => write!(f, "{a}"),
        XdmItem::Function(func) => write!(f, "{func:?}"),
        XdmItem::Node(n) => write!(f, "{n:?}"),
    }
}

impl<N> From<AtomicValue> for XdmValue<N> {
    fn from(v: AtomicValue) -> Self {
        Self::from_atomic(v)
    }
}

impl<N> From<bool> for XdmValue<N> {
    fn from(b: bool) -> Self {
        Self::from_bool(b)
    }
}

impl<N> From<i64> for XdmValue<N> {
    fn from(i: i64) -> Self {
        Self::from_integer(i)
    }
}

impl<N> From<f64> for XdmValue<N> {
    fn from(d: f64) -> Self {
        Self::from_double(d)
    }
}

impl<N> From<&str> for XdmValue<N> {
    fn from(s: &str) -> Self {
        Self::from_string(s)
    }
}

impl<N> From<XdmArray<N>> for XdmValue<N> {
    fn from(a: XdmArray<N>) -> Self {
        Self::from_array(a)
    }
}

impl<N> From<XdmMap<N>> for XdmValue<N> {
    fn from(m: XdmMap<N>) -> Self {
        Self::from_map(m)
    }
}
