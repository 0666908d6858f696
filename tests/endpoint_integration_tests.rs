//! Endpoint smoke tests against a running deployment.
//!
//! Run the API (and a seeded database) first, then:
//!
//!   BASE_URL=http://localhost:3000 cargo run -p endpoint-integration-tests
//!
//! Walks the public surface end to end: register, login, read-model
//! listings, booking, and the double-booking rejection.

use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

/// Test client that carries the bearer token between calls.
pub struct ApiTestClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ApiTestClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            auth_token: None,
        }
    }

    pub async fn get(&self, path: &str) -> Result<Response, Box<dyn std::error::Error>> {
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(ref token) = self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        Ok(request.send().await?)
    }

    pub async fn post(
        &self,
        path: &str,
        body: Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(ref token) = self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }
        Ok(request.send().await?)
    }

    /// Register a throwaway patient and log in as them.
    pub async fn register_and_login(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        let username = format!("smoke-{}", &Uuid::new_v4().to_string()[..8]);

        let response = self
            .post(
                "/auth/register",
                json!({
                    "username": username,
                    "email": format!("{}@example.test", username),
                    "password": "smoke-test-password",
                    "confirm_password": "smoke-test-password",
                    "full_name": "Smoke Test Patient",
                    "phone": "555-0100"
                }),
            )
            .await?;
        assert_status(response.status(), StatusCode::OK, "register")?;

        let response = self
            .post(
                "/auth/login",
                json!({
                    "username": username,
                    "password": "smoke-test-password"
                }),
            )
            .await?;
        assert_status(response.status(), StatusCode::OK, "login")?;

        let body: Value = response.json().await?;
        let token = body["token"]
            .as_str()
            .ok_or("login response carried no token")?
            .to_string();
        self.auth_token = Some(token);
        println!("✅ Registered and logged in as {}", username);
        Ok(username)
    }
}

fn assert_status(
    actual: StatusCode,
    expected: StatusCode,
    label: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if actual != expected {
        return Err(format!("{}: expected {}, got {}", label, expected, actual).into());
    }
    Ok(())
}

async fn run_suite() -> Result<(), Box<dyn std::error::Error>> {
    let mut client = ApiTestClient::new();

    // Liveness
    let response = client.get("/").await?;
    assert_status(response.status(), StatusCode::OK, "health")?;
    println!("✅ API is up");

    // Unauthenticated access is rejected with 401, not 403
    let response = client.get("/appointments/upcoming").await?;
    assert_status(response.status(), StatusCode::UNAUTHORIZED, "unauthenticated")?;
    println!("✅ Unauthenticated requests are rejected");

    client.register_and_login().await?;

    // Token round-trip
    let response = client.get("/auth/validate").await?;
    assert_status(response.status(), StatusCode::OK, "validate")?;

    // Read models
    let response = client.get("/departments").await?;
    assert_status(response.status(), StatusCode::OK, "departments")?;

    let response = client.get("/doctors").await?;
    assert_status(response.status(), StatusCode::OK, "doctors")?;
    let body: Value = response.json().await?;
    println!("✅ Read models reachable ({} active doctors)", body["total"]);

    // A patient cannot reach admin surfaces
    let response = client.get("/admin/stats").await?;
    assert_status(response.status(), StatusCode::FORBIDDEN, "admin gate")?;
    println!("✅ Role gate holds for admin routes");

    // Booking plus the double-booking rejection, when a doctor exists
    let doctors = body["doctors"].as_array().cloned().unwrap_or_default();
    if let Some(doctor_id) = doctors.first().and_then(|d| d["id"].as_str()) {
        let slot = json!({
            "doctor_id": doctor_id,
            "appointment_date": "2030-01-15",
            "appointment_time": "10:00",
            "reason": "smoke test"
        });

        let response = client.post("/appointments", slot.clone()).await?;
        let first_status = response.status();
        if first_status == StatusCode::OK {
            let response = client.post("/appointments", slot).await?;
            assert_status(response.status(), StatusCode::CONFLICT, "double booking")?;
            println!("✅ Double booking rejected with 409");
        } else {
            // Slot already held by a previous run
            assert_status(first_status, StatusCode::CONFLICT, "booking")?;
            println!("✅ Slot already taken; conflict reported");
        }
    } else {
        println!("⚠️ No active doctors seeded; skipping booking checks");
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    match run_suite().await {
        Ok(()) => println!("\nAll endpoint smoke tests passed"),
        Err(e) => {
            eprintln!("\nEndpoint smoke tests failed: {}", e);
            std::process::exit(1);
        }
    }
}
