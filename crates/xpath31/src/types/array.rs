//! XDM arrays.
//!
//! Positions are 1-based at this API boundary and validated against the
//! current size before every positional operation. Methods named `*_in_place`
//! mutate the receiver; `with_*` / `without_*` and [`subarray`](XdmArray::subarray)
//! leave it untouched and return a fresh array.

use super::{XdmItem, XdmValue};
use crate::error::XPath31Error;
use std::fmt;

#[derive(Debug, Clone)]
pub struct XdmArray<N> {
    members: Vec<XdmValue<N>>,
}

impl<N> XdmArray<N> {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn from_members(members: Vec<XdmValue<N>>) -> Self {
        Self { members }
    }

    /// One single-item member per item.
    pub fn from_items(items: impl IntoIterator<Item = XdmItem<N>>) -> Self {
        Self::from_members(items.into_iter().map(XdmValue::from_item).collect())
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[XdmValue<N>] {
        &self.members
    }

    /// Concatenates the members of `arrays` in order.
    pub fn join(arrays: impl IntoIterator<Item = XdmArray<N>>) -> Self {
        let mut members = Vec::new();
        for array in arrays {
            members.extend(array.members);
        }
        Self::from_members(members)
    }

    pub fn into_members(self) -> Vec<XdmValue<N>> {
        self.members
    }

    pub fn iter(&self) -> std::slice::Iter<'_, XdmValue<N>> {
        self.members.iter()
    }

    fn index_of(&self, position: i64) -> Result<usize, XPath31Error> {
        if position < 1 || position as u64 > self.members.len() as u64 {
            return Err(XPath31Error::ArrayIndexOutOfBounds {
                index: position,
                size: self.members.len(),
            });
        }
        Ok(position as usize - 1)
    }

    pub fn get(&self, position: i64) -> Result<&XdmValue<N>, XPath31Error> {
        let index = self.index_of(position)?;
        Ok(&self.members[index])
    }

    pub fn push(&mut self, member: XdmValue<N>) {
        self.members.push(member);
    }

    /// Replaces the member at `position` without copying the array.
    pub fn put_in_place(&mut self, position: i64, member: XdmValue<N>) -> Result<(), XPath31Error> {
        let index = self.index_of(position)?;
        self.members[index] = member;
        Ok(())
    }

    pub fn reverse_in_place(&mut self) {
        self.members.reverse();
    }
}

impl<N: Clone> XdmArray<N> {
    pub fn with_appended(&self, member: XdmValue<N>) -> Self {
        let mut members = Vec::with_capacity(self.members.len() + 1);
        members.extend(self.members.iter().cloned());
        members.push(member);
        Self::from_members(members)
    }

    /// `position` may be `size + 1`, which appends.
    pub fn with_inserted(&self, position: i64, member: XdmValue<N>) -> Result<Self, XPath31Error> {
        if position < 1 || position as u64 > self.members.len() as u64 + 1 {
            return Err(XPath31Error::ArrayIndexOutOfBounds {
                index: position,
                size: self.members.len(),
            });
        }
        let mut members = self.members.clone();
        members.insert(position as usize - 1, member);
        Ok(Self::from_members(members))
    }

    /// Drops every listed position. Duplicates are allowed and the order of
    /// `positions` does not matter.
    pub fn without_positions(&self, positions: &[i64]) -> Result<Self, XPath31Error> {
        let mut drop = vec![false; self.members.len()];
        for &position in positions {
            drop[self.index_of(position)?] = true;
        }
        let members = self
            .members
            .iter()
            .zip(drop)
            .filter(|(_, dropped)| !dropped)
            .map(|(member, _)| member.clone())
            .collect();
        Ok(Self::from_members(members))
    }

    /// Members `start ..= start + length - 1`, or from `start` to the end.
    /// `start` must lie in `1..=size`.
    pub fn subarray(&self, start: i64, length: Option<i64>) -> Result<Self, XPath31Error> {
        let size = self.members.len() as i64;
        let out_of_bounds = |index| XPath31Error::ArrayIndexOutOfBounds {
            index,
            size: self.members.len(),
        };
        if start < 1 || start > size {
            return Err(out_of_bounds(start));
        }
        let length = match length {
            Some(length) if length < 0 => {
                return Err(XPath31Error::NegativeLength {
                    function: "array:subarray".to_string(),
                    length,
                });
            }
            Some(length) => length,
            None => size - start + 1,
        };
        let end = start
            .checked_add(length)
            .map(|end| end - 1)
            .filter(|&end| end <= size)
            .ok_or_else(|| out_of_bounds(start.saturating_add(length).saturating_sub(1)))?;
        Ok(Self::from_members(
            self.members[(start - 1) as usize..end as usize].to_vec(),
        ))
    }

    /// Recursively expands nested arrays into `out`.
    pub fn flatten_into(&self, out: &mut Vec<XdmItem<N>>) {
        for member in &self.members {
            flatten_items(member.items(), out);
        }
    }
}

pub(crate) fn flatten_items<N: Clone>(items: &[XdmItem<N>], out: &mut Vec<XdmItem<N>>) {
    for item in items {
        match item {
            XdmItem::Array(array) => array.flatten_into(out),
            other => out.push(other.clone()),
        }
    }
}

impl<N> Default for XdmArray<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N: PartialEq> PartialEq for XdmArray<N> {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl<N: fmt::Debug> fmt::Display for XdmArray<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, member) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{member}")?;
        }
        write!(f, "]")
    }
}
