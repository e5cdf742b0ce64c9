use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use agrimove_api::{ApiRouter, ApiState};
use agrimove_auth::{Authenticator, InMemoryCredentialStore, PasswordHasher, TokenManager};
use agrimove_core::{NewUser, TransportLedger};
use agrimove_ledger::InMemoryLedger;

pub const TEST_USERNAME: &str = "farmer1";
pub const TEST_PASSWORD: &str = "password";
const TEST_ITERATIONS: u32 = 1_000;

pub struct TestServer {
    pub addr: SocketAddr,
    pub authenticator: Arc<Authenticator>,
    pub ledger: Arc<InMemoryLedger>,
    client: reqwest::Client,
    _handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Self {
        let secret = TokenManager::generate_secret().expect("secret");
        let authenticator = Arc::new(Authenticator::new(
            Arc::new(InMemoryCredentialStore::new()),
            PasswordHasher::new(TEST_ITERATIONS).expect("hasher"),
            TokenManager::new(&secret),
        ));
        authenticator
            .register(NewUser {
                username: TEST_USERNAME.to_string(),
                password: TEST_PASSWORD.to_string(),
                confirm_password: TEST_PASSWORD.to_string(),
                full_name: Some("John Farmer".to_string()),
                email: Some("farmer1@example.com".to_string()),
            })
            .await
            .expect("seed user");

        let ledger = Arc::new(InMemoryLedger::new());
        let ledger_handle: Arc<dyn TransportLedger> = ledger.clone();
        let state = Arc::new(ApiState::new(authenticator.clone(), ledger_handle));

        let router = ApiRouter::new(state).build_rest_router();

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });

        TestServer {
            addr,
            authenticator,
            ledger,
            client: reqwest::Client::new(),
            _handle: handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("request")
    }

    /// Logs in as the seeded user and returns the access token.
    pub async fn token(&self) -> String {
        let resp = self.login(TEST_USERNAME, TEST_PASSWORD).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.expect("json");
        body["access_token"]
            .as_str()
            .expect("access_token")
            .to_string()
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("request")
    }

    pub async fn post_json<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
        token: Option<&str>,
    ) -> reqwest::Response {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("request")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("request")
    }

    pub async fn get_with_header(&self, path: &str, authorization: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("Authorization", authorization)
            .send()
            .await
            .expect("request")
    }
}
