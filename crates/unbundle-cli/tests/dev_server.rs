//! Integration tests for `unbundle dev` over real HTTP.

use std::fs;
use std::net::TcpListener;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "index.html",
        r#"<html><body><div id="app"></div><script type="module" src="/src/main.js"></script></body></html>"#,
    );
    write(
        root,
        "src/main.js",
        "import { createApp } from 'vue'\nimport App from './App.vue'\ncreateApp(App).mount('#app')\n",
    );
    write(
        root,
        "src/App.vue",
        "<template><h1>{{ msg }}</h1></template>\n<script>\nexport default { data() { return { msg: 'hi' } } }\n</script>\n",
    );
    write(
        root,
        "node_modules/vue/package.json",
        r#"{ "name": "vue", "module": "index.mjs" }"#,
    );
    write(root, "node_modules/vue/index.mjs", "export const version = '3'\n");
    dir
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

/// Kills the server when the test ends, pass or fail.
struct Server {
    child: Child,
    base: String,
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn start(root: &Path) -> Server {
    start_with(root, &[]).await
}

async fn start_with(root: &Path, extra: &[&str]) -> Server {
    let port = free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_unbundle"))
        .arg("--cwd")
        .arg(root)
        .args(["dev", "--host", "127.0.0.1", "--port", &port.to_string()])
        .args(extra)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn unbundle");
    let server = Server {
        child,
        base: format!("http://127.0.0.1:{port}"),
    };

    for _ in 0..100 {
        if reqwest::get(&server.base).await.is_ok() {
            return server;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("dev server did not start on port {port}");
}

#[tokio::test]
async fn test_dev_server_serves_modules() {
    let dir = project();
    let server = start(dir.path()).await;

    let index = reqwest::get(format!("{}/", server.base)).await.unwrap();
    assert_eq!(index.status(), 200);
    assert_eq!(index.headers()["content-type"], "text/html");
    assert_eq!(index.headers()["cache-control"], "no-cache");
    let body = index.text().await.unwrap();
    assert!(body.contains("window.process = {env: {NODE_ENV: 'dev'}}"));

    let main = reqwest::get(format!("{}/src/main.js", server.base))
        .await
        .unwrap();
    assert_eq!(main.status(), 200);
    assert_eq!(main.headers()["content-type"], "application/javascript");
    let body = main.text().await.unwrap();
    assert!(body.contains("from '/@modules/vue'"));
    assert!(body.contains("from './App.vue'"));

    let package = reqwest::get(format!("{}/@modules/vue", server.base))
        .await
        .unwrap();
    assert_eq!(package.status(), 200);
    assert_eq!(package.text().await.unwrap(), "export const version = '3'\n");
}

#[tokio::test]
async fn test_dev_server_component_phases() {
    let dir = project();
    let server = start(dir.path()).await;

    let script = reqwest::get(format!("{}/src/App.vue", server.base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(script.contains("/src/App.vue?type=template"));
    assert!(script.contains("export default __script"));

    let template = reqwest::get(format!("{}/src/App.vue?type=template", server.base))
        .await
        .unwrap();
    assert_eq!(template.status(), 200);
    let body = template.text().await.unwrap();
    assert!(body.contains("export function render"));
    assert!(body.contains("_ctx.msg"));
}

#[tokio::test]
async fn test_dev_server_errors() {
    let dir = project();
    let server = start(dir.path()).await;

    let unrouted = reqwest::get(format!("{}/favicon.ico", server.base))
        .await
        .unwrap();
    assert_eq!(unrouted.status(), 404);
    assert_eq!(unrouted.headers()["content-type"], "text/plain");
    assert!(unrouted.text().await.unwrap().starts_with("UNROUTED_REQUEST"));

    let missing = reqwest::get(format!("{}/src/missing.js", server.base))
        .await
        .unwrap();
    assert_eq!(missing.status(), 500);
    assert!(missing.text().await.unwrap().starts_with("FILE_NOT_FOUND"));

    let package = reqwest::get(format!("{}/@modules/left-pad", server.base))
        .await
        .unwrap();
    assert_eq!(package.status(), 500);
    assert!(package.text().await.unwrap().starts_with("PACKAGE_NOT_FOUND"));
}

#[tokio::test]
async fn test_dev_server_cors_with_timeout_flag() {
    let dir = project();
    let server = start_with(dir.path(), &["--timeout", "5"]).await;

    let response = reqwest::Client::new()
        .get(format!("{}/src/main.js", server.base))
        .header("Origin", "http://example.test")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
