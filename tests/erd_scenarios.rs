use ddlerd::ast::KeyKind;
use ddlerd::erd::{Cardinality, ErdLink, Optionality};
use ddlerd::{build_graph, parse, to_editable_rows, CharsetCollationMap, ErdGraph};
use rstest::rstest;

const CUSTOMERS: &str = "CREATE TABLE `customers` (
  `id` int(11) NOT NULL AUTO_INCREMENT,
  `email` varchar(255) NOT NULL,
  PRIMARY KEY (`id`),
  UNIQUE KEY `uq_email` (`email`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

const ORDERS: &str = "CREATE TABLE `orders` (
  `id` int(11) NOT NULL AUTO_INCREMENT,
  `customer_id` int(11) NOT NULL,
  PRIMARY KEY (`id`),
  KEY `fk_orders_customer` (`customer_id`),
  CONSTRAINT `fk_orders_customer` FOREIGN KEY (`customer_id`) REFERENCES `customers` (`id`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

fn shop(ddls: &[&str]) -> ErdGraph {
    build_graph([("shop", ddls.iter().map(|d| parse(d)).collect::<Vec<_>>())])
}

#[test]
fn orders_customers_end_to_end() {
    let graph = shop(&[ORDERS, CUSTOMERS]);

    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.links.len(), 1);

    let link = &graph.links[0];
    let orders = graph.node("shop.orders").unwrap();
    let customers = graph.node("shop.customers").unwrap();
    assert_eq!(link.source, orders.id);
    assert_eq!(link.target, customers.id);
    assert_eq!(link.relationship_data.kind.to_string(), "mandatory..N:mandatory..1");
    assert_eq!(link.relationship_data.name, "fk_orders_customer");
    assert!(!link.is_part_of_composite_key);
    assert_eq!(link.highlight_color, customers.highlight_color);
}

#[test]
fn composite_foreign_key_yields_one_link_per_column() {
    let parent = "CREATE TABLE `parent` (
  `d1` int NOT NULL,
  `d2` int NOT NULL,
  PRIMARY KEY (`d1`,`d2`)
)";
    let child = "CREATE TABLE `child` (
  `c1` int NOT NULL,
  `c2` int NOT NULL,
  CONSTRAINT `fk_pair` FOREIGN KEY (`c1`, `c2`) REFERENCES `parent` (`d1`, `d2`) ON DELETE CASCADE
)";
    let graph = shop(&[parent, child]);

    assert_eq!(graph.links.len(), 2);
    let first = &graph.links[0];
    let second = &graph.links[1];
    assert!(!first.is_part_of_composite_key);
    assert!(second.is_part_of_composite_key);
    assert_eq!(first.relationship_data.name, "fk_pair");
    assert_eq!(second.relationship_data.name, "fk_pair");
    let attrs = |link: &ErdLink| {
        let data = &link.relationship_data;
        (data.source_attr.clone(), data.target_attr.clone())
    };
    assert_eq!(attrs(first), ("c1".to_string(), "d1".to_string()));
    assert_eq!(attrs(second), ("c2".to_string(), "d2".to_string()));
    assert_eq!(first.relationship_data.kind, second.relationship_data.kind);
    assert_eq!(first.relationship_data.kind.target.cardinality, Cardinality::One);
    assert_ne!(first.id, second.id);
}

#[test]
fn mandatory_source_optional_target() {
    let parent = "CREATE TABLE `parent` (
  `code` varchar(8) DEFAULT NULL,
  UNIQUE KEY `uq_code` (`code`)
)";
    let child = "CREATE TABLE `child` (
  `parent_code` varchar(8) NOT NULL,
  CONSTRAINT `fk_code` FOREIGN KEY (`parent_code`) REFERENCES `parent` (`code`)
)";
    let graph = shop(&[parent, child]);
    let kind = graph.links[0].relationship_data.kind;

    assert_eq!(kind.source.optionality, Optionality::Mandatory);
    assert_eq!(kind.target.optionality, Optionality::Optional);
    assert_eq!(kind.to_string(), "mandatory..N:optional..1");
}

#[test]
fn missing_target_is_skipped() {
    let graph = shop(&[ORDERS]);

    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.links.is_empty());
}

#[test]
fn target_in_other_schema_requires_qualified_reference() {
    let graph = build_graph([
        ("crm", vec![parse(CUSTOMERS)]),
        ("shop", vec![parse(ORDERS)]),
    ]);

    // ORDERS references `customers` without a schema, i.e. shop.customers
    assert!(graph.links.is_empty());
}

#[rstest]
#[case("`id`", Cardinality::One)]
#[case("`email`", Cardinality::One)]
#[case("`nickname`", Cardinality::Many)]
#[case("`id`, `email`", Cardinality::Many)]
fn source_cardinality_follows_key_coverage(#[case] local: &str, #[case] expected: Cardinality) {
    let users = format!(
        "CREATE TABLE `users` (
  `id` int NOT NULL,
  `email` varchar(64) NOT NULL,
  `nickname` varchar(64) NOT NULL,
  PRIMARY KEY (`id`),
  UNIQUE KEY `uq_email` (`email`),
  CONSTRAINT `fk_self` FOREIGN KEY ({local}) REFERENCES `targets` ({remote})
)",
        local = local,
        remote = local.replace("nickname", "id").replace("email", "id"),
    );
    let targets = "CREATE TABLE `targets` (\n  `id` int NOT NULL,\n  PRIMARY KEY (`id`)\n)";
    let graph = shop(&[users.as_str(), targets]);

    assert!(!graph.links.is_empty());
    assert_eq!(graph.links[0].relationship_data.kind.source.cardinality, expected);
}

#[test]
fn column_count_matches_source_lines() {
    let ddl = "CREATE TABLE `wide` (
  `a` int(11) DEFAULT NULL,
  `b` varchar(10) DEFAULT NULL,
  `c` text,
  `d` datetime NOT NULL,
  `e` decimal(8,3) unsigned DEFAULT NULL
) ENGINE=InnoDB";
    let table = parse(ddl);

    assert_eq!(table.columns.len(), 5);
    assert_eq!(
        table.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["a", "b", "c", "d", "e"]
    );
    assert!(table.keys(KeyKind::Primary).is_empty());
}

#[test]
fn editable_rows_reflect_not_null_and_unsigned() {
    let ddl = "CREATE TABLE `t` (
  `plain` int(11) DEFAULT NULL,
  `flagged` int(11) unsigned NOT NULL,
  `other` varchar(5) DEFAULT NULL
)";
    let editable = to_editable_rows("db", &parse(ddl), &CharsetCollationMap::new());

    let flagged = &editable.rows[1];
    assert_eq!(flagged.name, "flagged");
    assert!(flagged.not_null && flagged.unsigned);
    for row in [&editable.rows[0], &editable.rows[2]] {
        assert!(!row.not_null && !row.unsigned);
    }
}

#[test]
fn repeated_builds_are_structurally_equal() {
    let a = shop(&[ORDERS, CUSTOMERS]);
    let b = shop(&[ORDERS, CUSTOMERS]);

    let names = |g: &ErdGraph| {
        g.nodes
            .iter()
            .map(|n| n.qualified_name.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(&a), names(&b));
    assert_eq!(a.links[0].relationship_data, b.links[0].relationship_data);
}
