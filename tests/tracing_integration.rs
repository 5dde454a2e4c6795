//! Resolution under an installed tracing subscriber.

use filtra::prelude::*;
use serde_json::json;

#[test]
fn test_resolution_with_filter_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        filtra::logging::set_filter_logging(true);

        let schema = Schema::new([ModelDef::new("Event")
            .fields(["id", "kind", "at"])
            .restrict("kind", ["$in"])])
        .unwrap();
        let engine =
            FilterEngine::new(Resolver::with_defaults(), schema, Dialect::SQLite).unwrap();

        let filters = FilterExpr::from(json!({
            "kind": {"$in": ["click", "view"]},
            "at": {"$between": ["2024-01-01", "2024-12-31"]},
        }));
        let query = engine.filter("Event", &filters).unwrap();

        filtra::logging::set_filter_logging(false);
        assert_eq!(
            query.to_where_sql().0,
            "events.kind IN (?, ?) AND events.at BETWEEN ? AND ?"
        );
    });
}
