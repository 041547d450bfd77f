use xylem_xpath31::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDataType {
    #[default]
    Text,
    Number,
}

/// `case-order` of `xsl:sort`; only consulted for strings that differ in
/// case alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOrder {
    UpperFirst,
    LowerFirst,
}

/// One `xsl:sort` element.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKeySpec {
    pub select: Expression,
    pub data_type: SortDataType,
    pub order: SortOrder,
    pub case_order: Option<CaseOrder>,
    /// Collation URI; wins over `lang` when both are set.
    pub collation: Option<String>,
    pub lang: Option<String>,
}

impl SortKeySpec {
    pub fn new(select: impl Into<Expression>) -> Self {
        Self {
            select: select.into(),
            data_type: SortDataType::Text,
            order: SortOrder::Ascending,
            case_order: None,
            collation: None,
            lang: None,
        }
    }

    pub fn number(mut self) -> Self {
        self.data_type = SortDataType::Number;
        self
    }

    pub fn descending(mut self) -> Self {
        self.order = SortOrder::Descending;
        self
    }

    pub fn case_order(mut self, case_order: CaseOrder) -> Self {
        self.case_order = Some(case_order);
        self
    }

    pub fn collation(mut self, uri: impl Into<String>) -> Self {
        self.collation = Some(uri.into());
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn is_descending(&self) -> bool {
        self.order == SortOrder::Descending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_to_ascending_text() {
        let key = SortKeySpec::new("@name");
        assert_eq!(key.select.source(), "@name");
        assert_eq!(key.data_type, SortDataType::Text);
        assert!(!key.is_descending());
        assert!(key.case_order.is_none());

        let key = key.number().descending().case_order(CaseOrder::LowerFirst).lang("de");
        assert_eq!(key.data_type, SortDataType::Number);
        assert!(key.is_descending());
        assert_eq!(key.case_order, Some(CaseOrder::LowerFirst));
        assert_eq!(key.lang.as_deref(), Some("de"));
    }
}
