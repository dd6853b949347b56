use desk_server::{App, ExceptionPipeline, HttpServer, Router};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

type Running = (String, desk_server::ShutdownHandle, std::thread::JoinHandle<()>);

fn start() -> Running {
    let (release, released) = mpsc::channel::<()>();
    let release = Mutex::new(release);
    let released = Mutex::new(released);

    let router = Router::new()
        .route("GET", "/wait", move |_| {
            let released = released
                .lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?
                .recv_timeout(Duration::from_secs(3));
            released?;
            Ok(json!({"released": true}).into())
        })
        .route("POST", "/release", move |_| {
            release
                .lock()
                .map_err(|_| anyhow::anyhow!("poisoned"))?
                .send(())?;
            Ok(Value::Null.into())
        })
        .route("GET", "/health", |_| Ok(json!({"status": "ok"}).into()))
        .route("POST", "/tasks", |req| Ok(req.body.clone().unwrap_or(Value::Null).into()))
        .route("GET", "/boom", |_| Err(anyhow::anyhow!("disk full")));
    let app = Arc::new(App::new(router, ExceptionPipeline::new(false)));

    let server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), app).unwrap();
    let base = format!("http://{}", server.local_addr().unwrap());
    let shutdown = server.shutdown_handle();
    let thread = std::thread::spawn(move || server.run());
    (base, shutdown, thread)
}

#[tokio::test]
async fn serves_enveloped_responses() {
    let (base, shutdown, thread) = start();
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"success": true, "message": "Success", "data": {"status": "ok"}})
    );

    let response = client.get(format!("{base}/missing")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let response = client.get(format!("{base}/boom")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Server error");
    assert_eq!(body["info"]["error_code"], 500_005);

    shutdown.shutdown();
    thread.join().unwrap();
}

#[tokio::test]
async fn request_bodies_are_parsed() {
    let (base, shutdown, thread) = start();
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/tasks"))
        .body(r#"{"title": "Inventory"}"#)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"], json!({"title": "Inventory"}));

    let response = client
        .post(format!("{base}/tasks"))
        .body("title=Inventory")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["info"]["error_code"], 400_001);

    shutdown.shutdown();
    thread.join().unwrap();
}

#[tokio::test]
async fn slow_requests_do_not_block_others() {
    let (base, shutdown, thread) = start();
    let client = reqwest::Client::new();

    let waiting = tokio::spawn({
        let client = client.clone();
        let url = format!("{base}/wait");
        async move { client.get(url).send().await }
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let health = client.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(health.status().as_u16(), 200);
    let release = client.post(format!("{base}/release")).send().await.unwrap();
    assert_eq!(release.status().as_u16(), 200);

    let waited = waiting.await.unwrap().unwrap();
    assert_eq!(waited.status().as_u16(), 200);
    let body: Value = waited.json().await.unwrap();
    assert_eq!(body["data"], json!({"released": true}));

    shutdown.shutdown();
    thread.join().unwrap();
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let (base, shutdown, thread) = start();
    let limit = usize::try_from(desk_server::server::MAX_BODY_BYTES).unwrap();

    let response = reqwest::Client::new()
        .post(format!("{base}/tasks"))
        .body(vec![b' '; limit + 1])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["info"]["error_code"], desk_server::server::BODY_TOO_LARGE_CODE);

    shutdown.shutdown();
    thread.join().unwrap();
}
