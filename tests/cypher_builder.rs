#![allow(missing_docs)]

use cypher_builder::query::{
    functions, BuilderOptions, ClauseKind, Connection, CypherBuilder, EdgePattern, NodePattern,
    Operator, Order, OrderByBuilder, PatternClause, PatternRenderer, Predicate, PredicateBuilder,
    RawExpression, ReturnBuilder,
};
use cypher_builder::types::{BuilderError, CollisionPolicy, ErrorKind, Value};

#[test]
fn where_leaf_round_trip() {
    let mut builder = PredicateBuilder::new();
    builder
        .r#where(Predicate::gt("age", 25))
        .unwrap()
        .terminate()
        .unwrap();
    assert_eq!(builder.cypher(), "WHERE age > $age");
    assert_eq!(builder.params().len(), 1);
    assert_eq!(builder.params().get("age"), Some(&Value::Int(25)));
}

#[test]
fn match_with_forward_relationship() {
    let mut pattern = PatternRenderer::new();
    pattern
        .initialize(NodePattern::new().tag("p").label("Person"))
        .unwrap()
        .connect(
            Connection::new()
                .edge(EdgePattern::forward().label("OWNS"))
                .node(NodePattern::new().tag("h").label("House")),
        )
        .unwrap()
        .terminate()
        .unwrap();
    let mut clause = PatternClause::matching();
    clause.add_pattern(&pattern).unwrap().terminate().unwrap();
    assert_eq!(clause.cypher(), "MATCH (p:Person)-[:OWNS]->(h:House)");
    assert!(clause.params().is_empty());
}

#[test]
fn null_checks_joined_with_and() {
    let mut builder = PredicateBuilder::new();
    builder
        .r#where(Predicate::is_null("a"))
        .unwrap()
        .and(Predicate::is_null("b"))
        .unwrap()
        .terminate()
        .unwrap();
    assert_eq!(builder.cypher(), "WHERE a IS NULL AND b IS NULL");
    assert!(builder.params().is_empty());
}

#[test]
fn or_before_where_is_a_precondition_violation() {
    let mut predicates = PredicateBuilder::new();
    let err = predicates.or(Predicate::is_null("a")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let mut builder = CypherBuilder::new();
    builder.r#match(NodePattern::new().tag("a")).unwrap();
    let err = builder.or("a.x = 1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert_eq!(
        err,
        BuilderError::precondition("or", "WHERE", Some(ClauseKind::Match))
    );
}

#[test]
fn distinct_twice_is_a_lifecycle_violation() {
    let mut projection = ReturnBuilder::new();
    projection.distinct().unwrap();
    assert_eq!(
        projection.distinct().unwrap_err().kind(),
        ErrorKind::Lifecycle
    );

    let mut builder = CypherBuilder::new();
    builder.r#return("p").unwrap().distinct().unwrap();
    assert_eq!(builder.distinct().unwrap_err(), BuilderError::DistinctTwice);
}

#[test]
fn order_by_overwrites_direction_in_place() {
    let mut ordering = OrderByBuilder::new();
    ordering
        .add_ordering("name", Some(Order::Asc))
        .unwrap()
        .add_ordering("name", Some(Order::Desc))
        .unwrap()
        .terminate()
        .unwrap();
    assert_eq!(ordering.cypher(), "ORDER BY name DESC");
}

#[test]
fn full_statement_through_orchestrator() {
    let mut builder = CypherBuilder::new();
    builder
        .r#match(
            NodePattern::new()
                .tag("p")
                .label("Person")
                .aliased("name", "Alice", "owner_name"),
        )
        .unwrap()
        .connect(
            Connection::new()
                .edge(EdgePattern::forward().tag("o").label("OWNS").field("since", 2010))
                .node(NodePattern::new().tag("h").labels(["House", "Flat"])),
        )
        .unwrap()
        .r#where(Predicate::in_list("h.city", ["Paris", "Lyon"]))
        .unwrap()
        .and(Predicate::starts_with("h.street", "Rue").negate())
        .unwrap()
        .xor(RawExpression::new("h.rooms > $min_rooms").param("min_rooms", 3))
        .unwrap()
        .order_by("h.price", Order::Asc)
        .unwrap()
        .order_by("h.rooms", None)
        .unwrap()
        .r#return("p.name")
        .unwrap()
        .r#return(("h", "home"))
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(
        builder.cypher(),
        "MATCH (p:Person {name: $owner_name})-[o:OWNS {since: $since}]->(h:House|Flat)\n\
         WHERE h.city IN $h_city AND NOT h.street STARTS WITH $h_street XOR h.rooms > $min_rooms\n\
         ORDER BY h.price ASC, h.rooms\n\
         RETURN p.name, h AS home;"
    );
    let params = builder.params();
    assert_eq!(
        params.iter().map(|(name, _)| name).collect::<Vec<_>>(),
        vec!["owner_name", "since", "h_city", "h_street", "min_rooms"]
    );
    assert_eq!(
        params.get("h_city"),
        Some(&Value::List(vec![Value::from("Paris"), Value::from("Lyon")]))
    );
}

#[test]
fn nested_group_renders_parenthesized() {
    let mut inner = PredicateBuilder::new();
    inner
        .r#where(Predicate::lt("p.age", 18))
        .unwrap()
        .or(Predicate::ge("p.age", 65).alias("senior"))
        .unwrap();

    let mut builder = CypherBuilder::new();
    builder
        .r#match(NodePattern::new().tag("p"))
        .unwrap()
        .r#where(Predicate::eq("p.active", true))
        .unwrap()
        .and(inner)
        .unwrap()
        .r#return(functions::element_id("p").unwrap())
        .unwrap()
        .done()
        .unwrap();

    assert_eq!(
        builder.cypher(),
        "MATCH (p)\nWHERE p.active = $p_active AND (p.age < $p_age OR p.age >= $senior)\nRETURN elementId(p);"
    );
    assert_eq!(builder.params().len(), 3);
}

#[test]
fn operator_value_mismatches_are_rejected() {
    let mut builder = PredicateBuilder::new();
    let err = builder
        .r#where(Predicate::compare("p.name", Operator::GreaterThan, "Bob"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueMismatch);

    let err = builder
        .r#where(Predicate::is_null("p.name").value(1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueMismatch);

    let err = builder
        .r#where(Predicate::in_list("p.id", Vec::<i64>::new()).value(3))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueMismatch);

    assert_eq!(builder.cypher(), "");
}

#[test]
fn operators_parse_case_insensitively() {
    assert_eq!("starts with".parse::<Operator>().unwrap(), Operator::StartsWith);
    assert_eq!("is  not null".parse::<Operator>().unwrap(), Operator::IsNotNull);
    assert!(matches!(
        "<>".parse::<Operator>(),
        Err(BuilderError::InvalidOperator { .. })
    ));
}

#[test]
fn fields_with_same_key_across_patterns_collide() {
    let mut builder = CypherBuilder::new();
    builder
        .r#match(NodePattern::new().tag("a").field("name", "Ada"))
        .unwrap()
        .r#match(NodePattern::new().tag("b").field("name", "Grace"))
        .unwrap();
    let err = builder.r#return("a").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParameterCollision);
    assert_eq!(builder.r#return("a").unwrap_err(), err);
    assert_eq!(builder.done().unwrap_err(), err);
    assert_eq!(builder.active_clause(), Some(ClauseKind::Match));
    assert!(!builder.is_finalized());
}

#[test]
fn failed_where_flush_can_be_retried() {
    let mut builder = CypherBuilder::new();
    builder
        .r#match(NodePattern::new().tag("p").field("name", "Alice"))
        .unwrap()
        .r#where(Predicate::eq("name", "Bob"))
        .unwrap();
    let first = builder.done().unwrap_err();
    let second = builder.done().unwrap_err();
    assert_eq!(
        first,
        BuilderError::ParameterCollision {
            name: "name".into()
        }
    );
    assert_eq!(second, first);
    builder.and(Predicate::is_not_null("p.age")).unwrap();
    assert_eq!(builder.done().unwrap_err(), first);
    assert_eq!(builder.cypher(), "MATCH (p {name: $name})");
}

#[test]
fn aliased_fields_avoid_collisions() {
    let mut builder = CypherBuilder::new();
    builder
        .r#match(NodePattern::new().tag("a").aliased("name", "Ada", "a_name"))
        .unwrap()
        .r#match(NodePattern::new().tag("b").aliased("name", "Grace", "b_name"))
        .unwrap()
        .r#return("a")
        .unwrap()
        .done()
        .unwrap();
    assert_eq!(
        builder.cypher(),
        "MATCH (a {name: $a_name}),\n(b {name: $b_name})\nRETURN a;"
    );
}

#[test]
fn equal_values_under_same_name_merge_silently() {
    let mut builder = CypherBuilder::new();
    builder
        .r#match(NodePattern::new().tag("a").field("name", "Ada"))
        .unwrap()
        .r#where(Predicate::eq("name", "Ada"))
        .unwrap()
        .r#return("a")
        .unwrap()
        .done()
        .unwrap();
    assert_eq!(builder.params().len(), 1);
}

#[test]
fn overwrite_policy_keeps_last_value() {
    let mut builder = CypherBuilder::with_options(
        BuilderOptions::default().collision_policy(CollisionPolicy::Overwrite),
    );
    builder
        .r#match(NodePattern::new().tag("a").field("name", "Ada"))
        .unwrap()
        .r#match(NodePattern::new().tag("b").field("name", "Grace"))
        .unwrap()
        .r#return("b")
        .unwrap()
        .done()
        .unwrap();
    assert_eq!(builder.params().get("name"), Some(&Value::from("Grace")));
}

#[test]
fn create_then_return() {
    let query = {
        let mut builder = CypherBuilder::new();
        builder
            .create(NodePattern::new().tag("n").label("Tag").field("name", "rust"))
            .unwrap()
            .connect(
                Connection::new()
                    .edge(EdgePattern::backward().label("TAGGED"))
                    .node(NodePattern::new().tag("post")),
            )
            .unwrap()
            .r#return("n")
            .unwrap();
        builder.build().unwrap()
    };
    assert_eq!(
        query.text,
        "CREATE (n:Tag {name: $name})<-[:TAGGED]-(post)\nRETURN n;"
    );
    let json = serde_json::to_value(&query).unwrap();
    assert_eq!(json["params"]["name"], "rust");
}

#[test]
fn finalized_builder_rejects_everything() {
    let mut builder = CypherBuilder::new();
    builder.r#return("1").unwrap().done().unwrap();
    let before = builder.cypher();
    for err in [
        builder.r#match(NodePattern::new()).unwrap_err(),
        builder.r#where("true").unwrap_err(),
        builder.order_by("x", None).unwrap_err(),
        builder.done().unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::Finalized);
    }
    assert_eq!(builder.cypher(), before);
}

#[test]
fn empty_clauses_cannot_be_flushed() {
    let mut builder = CypherBuilder::new();
    builder.r#match(NodePattern::new().tag("p")).unwrap();
    let err = builder.r#where(PredicateBuilder::new()).unwrap_err();
    assert_eq!(err, BuilderError::EmptyPredicateGroup);
    assert_eq!(err.kind(), ErrorKind::EmptyTerminal);
}
