use super::{Article, FetchArticlesQuery, FetchedArticles, Symbol};

#[test]
fn article_uses_snake_case_keys() {
    let article = Article::new("AAPL", "2023-06-01", "Apple ships a thing");
    let json = serde_json::to_value(&article).unwrap();

    assert_eq!(json["symbol"], "AAPL");
    assert_eq!(json["created_at"], "2023-06-01");
    assert_eq!(json["headline"], "Apple ships a thing");
}

#[test]
fn camel_case_created_at_is_accepted() {
    let article: Article = serde_json::from_str(r#"{"symbol":"GOOG","createdAt":"t2","headline":"B"}"#).unwrap();

    assert_eq!(article, Article::new("GOOG", "t2", "B"));
}

#[test]
fn absent_fields_are_empty() {
    let article: Article = serde_json::from_str(r#"{"symbol":"TSLA"}"#).unwrap();

    assert_eq!(article.symbol, Symbol::new("TSLA".to_string()));
    assert!(article.created_at.is_empty());
    assert!(article.headline.is_empty());
}

#[test]
fn created_at_is_not_validated() {
    let article: Article = serde_json::from_str(r#"{"symbol":"X","created_at":"yesterday-ish","headline":""}"#).unwrap();

    assert_eq!(article.created_at, "yesterday-ish");
}

#[test]
fn fetched_articles_is_a_plain_array() {
    let fetched = FetchedArticles(vec![Article::new("AAPL", "t1", "A")]);

    assert_eq!(
        serde_json::to_string(&fetched).unwrap(),
        r#"[{"symbol":"AAPL","created_at":"t1","headline":"A"}]"#
    );
}

#[test]
fn symbol_comparison_is_case_sensitive() {
    let upper: Symbol = "AAPL".parse().unwrap();
    let lower: Symbol = "aapl".parse().unwrap();

    assert_ne!(upper, lower);
    assert_eq!(upper.to_string(), "AAPL");
}

#[test]
fn query_keeps_raw_size() {
    let query: FetchArticlesQuery = serde_json::from_str(r#"{"id":"AAPL","size":"ten"}"#).unwrap();

    assert_eq!(query.id.as_str(), "AAPL");
    assert_eq!(query.size.as_deref(), Some("ten"));

    let query: FetchArticlesQuery = serde_json::from_str("{}").unwrap();
    assert_eq!(query.id, Symbol::default());
    assert_eq!(query.size, None);
}
