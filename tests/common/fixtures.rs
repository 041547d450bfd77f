/// Fruit rows with mixed-case names, duplicate keys and unparsable prices.
pub const INVENTORY: &str = r#"<inventory>
    <item name="pear" price="3" kind="fruit"/>
    <item name="Apple" price="10" kind="fruit"/>
    <item name="leek" price="n/a" kind="vegetable"/>
    <item name="apple" price="2" kind="fruit"/>
    <item name="kale" price="4" kind="vegetable"/>
    <item name="Pear" price="3" kind="fruit"/>
</inventory>"#;

/// Rows whose sort keys tie completely.
pub const TIES: &str = r#"<rows>
    <item name="first" rank="1"/>
    <item name="second" rank="1"/>
    <item name="third" rank="1"/>
    <item name="fourth" rank="0"/>
</rows>"#;

/// Names that differ in accent and case only.
pub const ACCENTS: &str = r#"<names>
    <item name="resume"/>
    <item name="Résumé"/>
    <item name="résumé"/>
    <item name="Resume"/>
</names>"#;

pub const ORDER_JSON: &str = r#"{
    "id": "A-17",
    "lines": [
        {"sku": "p-1", "qty": 2, "price": 9.5},
        {"sku": "p-2", "qty": 1, "price": 120}
    ],
    "paid": false,
    "note": null
}"#;
