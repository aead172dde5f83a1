use actix_web::{get, post, Responder};
use actix_web::web::{Bytes, Data, Query};
use log::{error, info};
use stock_news_endpoint_model::{Article, ArticleSavedNotice, FetchArticlesError, FetchArticlesQuery, FetchArticlesResult, FetchedArticles, SaveArticleError, SaveArticleResult};
use crate::service::persistence::StoreError;
use crate::service::rest::exposed_representation_format::EndpointRepresentationCompiler;
use crate::service::rest::inner_no_leak::UnhandledError;
use crate::service::rest::{ComposeInternalError, FetchDefaults};
use crate::service::worker::{ArticleService, ServiceError};

#[post("/save-articles")]
pub async fn save(data: Bytes, service: Data<ArticleService>) -> impl Responder {
    EndpointRepresentationCompiler::from_value(save0(&data, &service).await).into_plain_text()
}

async fn save0(data: &[u8], service: &ArticleService) -> ComposeInternalError<SaveArticleResult> {
    let article: Article = match serde_json::from_slice(data) {
        Ok(article) => article,
        Err(e) => return Ok(Err(SaveArticleError::MalformedBody(e.to_string()))),
    };

    let symbol = article.symbol.clone();
    match service.save(article).await {
        Ok(()) => {
            info!("saved an article for {symbol}");
            Ok(Ok(ArticleSavedNotice { symbol }))
        }
        Err(e) => match classify(e) {
            Classified::Unavailable => Ok(Err(SaveArticleError::StorageUnavailable)),
            Classified::ShuttingDown => Ok(Err(SaveArticleError::ShuttingDown)),
            Classified::Internal(e) => Err(e),
        },
    }
}

#[get("/articles")]
pub async fn fetch(query: Query<FetchArticlesQuery>, service: Data<ArticleService>, defaults: Data<FetchDefaults>) -> impl Responder {
    match fetch0(query.into_inner(), &service, defaults.size).await {
        Ok(Ok(found)) => EndpointRepresentationCompiler::from_value(found).into_json(),
        Ok(Err(e)) => EndpointRepresentationCompiler::from_value(e).into_plain_text().map_into_boxed_body(),
        Err(e) => EndpointRepresentationCompiler::from_value(e).into_plain_text().map_into_boxed_body(),
    }
}

async fn fetch0(query: FetchArticlesQuery, service: &ArticleService, default_size: i64) -> ComposeInternalError<FetchArticlesResult> {
    let FetchArticlesQuery { id, size } = query;

    let size = match size.as_deref() {
        None | Some("") => default_size,
        Some(raw) => match raw.parse::<i64>() {
            Ok(size) => size,
            Err(_) => return Ok(Err(FetchArticlesError::InvalidSize(raw.to_string()))),
        },
    };

    match service.fetch(id, size).await {
        Ok(found) => Ok(Ok(FetchedArticles(found))),
        Err(e) => match classify(e) {
            Classified::Unavailable => Ok(Err(FetchArticlesError::StorageUnavailable)),
            Classified::ShuttingDown => Ok(Err(FetchArticlesError::ShuttingDown)),
            Classified::Internal(e) => Err(e),
        },
    }
}

enum Classified {
    Unavailable,
    ShuttingDown,
    Internal(UnhandledError),
}

fn classify(e: ServiceError) -> Classified {
    match e {
        ServiceError::Store(StoreError::Unavailable(io)) => {
            error!("storage unavailable: {io}");
            Classified::Unavailable
        }
        ServiceError::ShuttingDown => Classified::ShuttingDown,
        other => {
            error!("{other:?}");
            Classified::Internal(UnhandledError::new(other))
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};
    use actix_web::web::Data;
    use actix_web::App;
    use stock_news_endpoint_model::Article;
    use crate::service::persistence::CollectionStore;
    use crate::service::rest::{configure, FetchDefaults};
    use crate::service::worker::{self, WorkerConfig};

    fn seed() -> Vec<Article> {
        vec![
            Article::new("AAPL", "t1", "A"),
            Article::new("GOOG", "t2", "B"),
            Article::new("AAPL", "t3", "C"),
        ]
    }

    #[actix_web::test]
    async fn fetch_scenarios() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        CollectionStore::init(&path, &seed()).unwrap();
        let (service, workers) = worker::start(CollectionStore::new(&path), WorkerConfig::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service.clone()))
                .app_data(Data::new(FetchDefaults { size: 10 }))
                .configure(configure)
        ).await;

        let got: Vec<Article> = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/v1/articles?id=AAPL&size=1").to_request()).await;
        assert_eq!(got, vec![Article::new("AAPL", "t1", "A")]);

        let got: Vec<Article> = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/v1/articles?id=AAPL&size=10").to_request()).await;
        assert_eq!(got, vec![Article::new("AAPL", "t1", "A"), Article::new("AAPL", "t3", "C")]);

        let got: Vec<Article> = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/v1/articles?id=MSFT&size=5").to_request()).await;
        assert!(got.is_empty());

        // absent size falls back to the default
        let got: Vec<Article> = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/v1/articles?id=AAPL").to_request()).await;
        assert_eq!(got.len(), 2);

        let got: Vec<Article> = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/v1/articles?id=AAPL&size=0").to_request()).await;
        assert!(got.is_empty());

        let res = test::call_service(&app, TestRequest::get().uri("/api/v1/articles?id=AAPL&size=ten").to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        drop(app);
        service.close();
        workers.drain().await;
    }

    #[actix_web::test]
    async fn save_is_visible_to_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        CollectionStore::init(&path, &seed()).unwrap();
        let (service, workers) = worker::start(CollectionStore::new(&path), WorkerConfig::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service.clone()))
                .app_data(Data::new(FetchDefaults { size: 10 }))
                .configure(configure)
        ).await;

        let res = test::call_service(
            &app,
            TestRequest::post()
                .uri("/api/v1/save-articles")
                .set_payload(r#"{"symbol":"MSFT","created_at":"t4","headline":"D"}"#)
                .to_request()
        ).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let got: Vec<Article> = test::call_and_read_body_json(&app, TestRequest::get().uri("/api/v1/articles?id=MSFT&size=1").to_request()).await;
        assert_eq!(got, vec![Article::new("MSFT", "t4", "D")]);
        assert_eq!(CollectionStore::new(&path).load_all().unwrap().len(), 4);

        let res = test::call_service(
            &app,
            TestRequest::post().uri("/api/v1/save-articles").set_payload("{not json").to_request()
        ).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(CollectionStore::new(&path).load_all().unwrap().len(), 4);

        drop(app);
        service.close();
        workers.drain().await;
    }

    #[actix_web::test]
    async fn missing_collection_is_service_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        let (service, workers) = worker::start(CollectionStore::new(&path), WorkerConfig::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service.clone()))
                .app_data(Data::new(FetchDefaults { size: 10 }))
                .configure(configure)
        ).await;

        let res = test::call_service(&app, TestRequest::get().uri("/api/v1/articles?id=AAPL&size=1").to_request()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        let res = test::call_service(
            &app,
            TestRequest::post().uri("/api/v1/save-articles").set_payload(r#"{"symbol":"AAPL"}"#).to_request()
        ).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        CollectionStore::init(&path, &[]).unwrap();
        let res = test::call_service(&app, TestRequest::get().uri("/api/v1/articles?id=AAPL&size=1").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);

        drop(app);
        service.close();
        workers.drain().await;
    }

    #[actix_web::test]
    async fn corrupt_collection_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        std::fs::write(&path, b"][").unwrap();
        let (service, workers) = worker::start(CollectionStore::new(&path), WorkerConfig::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service.clone()))
                .app_data(Data::new(FetchDefaults { size: 10 }))
                .configure(configure)
        ).await;

        let res = test::call_service(&app, TestRequest::get().uri("/api/v1/articles?id=AAPL&size=1").to_request()).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        drop(app);
        service.close();
        workers.drain().await;
    }

    #[actix_web::test]
    async fn closed_service_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        CollectionStore::init(&path, &seed()).unwrap();
        let (service, workers) = worker::start(CollectionStore::new(&path), WorkerConfig::default());
        let app = test::init_service(
            App::new()
                .app_data(Data::new(service.clone()))
                .app_data(Data::new(FetchDefaults { size: 10 }))
                .configure(configure)
        ).await;

        service.close();
        workers.drain().await;

        let res = test::call_service(&app, TestRequest::get().uri("/api/v1/articles?id=AAPL&size=1").to_request()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let res = test::call_service(
            &app,
            TestRequest::post().uri("/api/v1/save-articles").set_payload(r#"{"symbol":"AAPL"}"#).to_request()
        ).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(CollectionStore::new(&path).load_all().unwrap().len(), 3);
    }
}
